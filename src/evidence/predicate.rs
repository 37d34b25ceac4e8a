use regex::Regex;
use serde::Serialize;

use crate::error::CatalogError;

/// Tri-state predicate outcome. `Indeterminate` only arises when the
/// artifact could not be read, and counts as false wherever it is folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Holds,
    Fails,
    Indeterminate,
}

impl Outcome {
    pub fn is_true(self) -> bool {
        self == Outcome::Holds
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value { Outcome::Holds } else { Outcome::Fails }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Contains(String),
    Absent(String),
    Pattern(Regex),
    SpanContains {
        open: String,
        close: String,
        needle: String,
    },
    SpanExcludes {
        open: String,
        close: String,
        needle: String,
    },
    SpanExcludesPattern {
        open: String,
        close: String,
        regex: Regex,
    },
}

/// A named text-presence test against a whole artifact.
#[derive(Debug, Clone)]
pub struct Predicate {
    label: String,
    matcher: Matcher,
}

impl Predicate {
    pub fn contains(label: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::with(label, Matcher::Contains(needle.into()))
    }

    pub fn absent(label: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::with(label, Matcher::Absent(needle.into()))
    }

    pub fn matches(label: impl Into<String>, pattern: &str) -> Result<Self, CatalogError> {
        let label = label.into();
        let regex = Regex::new(pattern).map_err(|source| CatalogError::Pattern {
            label: label.clone(),
            source,
        })?;
        Ok(Self::with(label, Matcher::Pattern(regex)))
    }

    /// Holds when `needle` occurs between the first `open` and the first
    /// `close` after it.
    pub fn span_contains(
        label: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
        needle: impl Into<String>,
    ) -> Self {
        Self::with(
            label,
            Matcher::SpanContains {
                open: open.into(),
                close: close.into(),
                needle: needle.into(),
            },
        )
    }

    /// Holds when the span exists and `needle` does not occur inside it.
    pub fn span_excludes(
        label: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
        needle: impl Into<String>,
    ) -> Self {
        Self::with(
            label,
            Matcher::SpanExcludes {
                open: open.into(),
                close: close.into(),
                needle: needle.into(),
            },
        )
    }

    /// Holds when the span exists and `token` does not occur inside it as a
    /// whole word, so `mutedRef` or `setUnmuted` do not count as `muted`.
    pub fn span_excludes_token(
        label: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
        token: &str,
    ) -> Result<Self, CatalogError> {
        let label = label.into();
        let pattern = format!(r"\b{}\b", regex::escape(token));
        let regex = Regex::new(&pattern).map_err(|source| CatalogError::Pattern {
            label: label.clone(),
            source,
        })?;
        Ok(Self::with(
            label,
            Matcher::SpanExcludesPattern {
                open: open.into(),
                close: close.into(),
                regex,
            },
        ))
    }

    fn with(label: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            label: label.into(),
            matcher,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn evaluate(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Contains(needle) => text.contains(needle.as_str()),
            Matcher::Absent(needle) => !text.contains(needle.as_str()),
            Matcher::Pattern(regex) => regex.is_match(text),
            Matcher::SpanContains {
                open,
                close,
                needle,
            } => extract_span(text, open, close).is_some_and(|span| span.contains(needle.as_str())),
            // A missing delimiter is a failed predicate, not a vacuous pass.
            Matcher::SpanExcludes {
                open,
                close,
                needle,
            } => extract_span(text, open, close).is_some_and(|span| !span.contains(needle.as_str())),
            Matcher::SpanExcludesPattern { open, close, regex } => {
                extract_span(text, open, close).is_some_and(|span| !regex.is_match(span))
            }
        }
    }
}

/// The text from the first `open` through the first `close` after it,
/// delimiters included.
pub fn extract_span<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)?;
    let after_open = start + open.len();
    let end = after_open + text[after_open..].find(close)? + close.len();
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREVIEW: &str = r#"
const [state, setState] = useState({ muted: false, volume: 1 });
return (
  <video
    ref={videoRef}
    src={src}
    playsInline
  ></video>
);
"#;

    #[test]
    fn extract_span_includes_delimiters() {
        let span = extract_span("a <video src=x></video> b", "<video", "</video>").unwrap();
        assert_eq!(span, "<video src=x></video>");
    }

    #[test]
    fn extract_span_needs_both_delimiters() {
        assert_eq!(extract_span("<video src=x>", "<video", "</video>"), None);
        assert_eq!(extract_span("</video>", "<video", "</video>"), None);
        assert_eq!(extract_span("</video> <video", "<video", "</video>"), None);
    }

    #[test]
    fn contains_and_absent_are_whole_document() {
        assert!(Predicate::contains("state", "muted: false").evaluate(PREVIEW));
        assert!(!Predicate::absent("state", "muted: false").evaluate(PREVIEW));
        assert!(Predicate::absent("autoplay", "autoPlay").evaluate(PREVIEW));
    }

    #[test]
    fn span_excludes_ignores_text_outside_span() {
        let predicate = Predicate::span_excludes("no muted attr", "<video", "</video>", "muted");
        assert!(predicate.evaluate(PREVIEW));

        let muted = PREVIEW.replace("playsInline", "playsInline muted");
        assert!(!predicate.evaluate(&muted));
    }

    #[test]
    fn span_excludes_token_matches_whole_words_only() {
        let predicate =
            Predicate::span_excludes_token("no muted attr", "<video", "</video>", "muted").unwrap();
        assert!(predicate.evaluate("<video ref={mutedRef} onPlay={() => setUnmuted(true)}></video>"));
        assert!(!predicate.evaluate("<video src={src} muted></video>"));
        assert!(!predicate.evaluate("<video muted={true} src={src}></video>"));
    }

    #[test]
    fn span_predicates_fail_without_span() {
        let text = "muted: false";
        assert!(!Predicate::span_excludes("x", "<video", "</video>", "muted").evaluate(text));
        assert!(
            !Predicate::span_excludes_token("x", "<video", "</video>", "muted")
                .unwrap()
                .evaluate(text)
        );
        assert!(!Predicate::span_contains("x", "<video", "</video>", "src").evaluate(text));
    }

    #[test]
    fn span_contains_finds_needle() {
        let predicate = Predicate::span_contains("src bound", "<video", "</video>", "src={src}");
        assert!(predicate.evaluate(PREVIEW));
    }

    #[test]
    fn pattern_matches_regex() {
        let predicate = Predicate::matches("volume", r"volume:\s*1").unwrap();
        assert!(predicate.evaluate(PREVIEW));
        assert_eq!(predicate.label(), "volume");
    }

    #[test]
    fn invalid_pattern_is_a_catalog_error() {
        let err = Predicate::matches("broken", "(unclosed").unwrap_err();
        assert!(matches!(err, CatalogError::Pattern { ref label, .. } if label == "broken"));
    }

    #[test]
    fn only_holds_is_true() {
        assert!(Outcome::Holds.is_true());
        assert!(!Outcome::Fails.is_true());
        assert!(!Outcome::Indeterminate.is_true());
        assert_eq!(Outcome::from(true), Outcome::Holds);
    }
}
