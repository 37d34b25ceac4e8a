use log::{debug, warn};
use serde_json::{Map, Value};

use crate::http::client::Transport;
use crate::http::request::{CheckRequest, join_url};
use crate::http::response::HttpResponse;
use crate::report::Reporter;

use super::{CheckResult, Scoreboard};

/// Executes checks one at a time and keeps the session's scoreboard.
///
/// Every failure mode (transport error, unexpected status, undecodable body)
/// comes back as a failed [`CheckResult`]; nothing is propagated.
pub struct CheckRunner<T> {
    transport: T,
    base_url: String,
    reporter: Reporter,
    scoreboard: Scoreboard,
}

impl<T: Transport> CheckRunner<T> {
    pub fn new(transport: T, base_url: impl Into<String>, reporter: Reporter) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            reporter,
            scoreboard: Scoreboard::default(),
        }
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn run_check(&mut self, request: CheckRequest) -> CheckResult {
        self.scoreboard.record_attempt();
        let url = join_url(&self.base_url, &request.endpoint);
        self.reporter.check_started(&request.name, &url);

        let outcome = request
            .prepare(url.clone())
            .and_then(|prepared| self.transport.send(prepared));
        let result = match outcome {
            Ok(response) => evaluate(&request, url, response),
            Err(err) => {
                warn!("check `{}` failed: {err}", request.name);
                CheckResult {
                    name: request.name.clone(),
                    method: request.method,
                    url,
                    expected_status: request.expected_status,
                    observed_status: None,
                    passed: false,
                    payload: None,
                    error: Some(err.to_string()),
                    raw_body: None,
                    duration_ms: None,
                }
            }
        };

        if result.passed {
            self.scoreboard.record_pass();
        }
        debug!(
            "scoreboard after `{}`: {}/{}",
            result.name,
            self.scoreboard.passed(),
            self.scoreboard.total()
        );
        self.reporter.check_finished(&result);
        result
    }
}

fn evaluate(request: &CheckRequest, url: String, response: HttpResponse) -> CheckResult {
    let HttpResponse {
        status,
        duration_ms,
        body,
    } = response;

    let (passed, payload, error) = if status != request.expected_status {
        (
            false,
            None,
            Some(format!("expected status {}, got {status}", request.expected_status)),
        )
    } else {
        match decode_payload(&body) {
            Ok(payload) => (true, Some(payload), None),
            Err(err) => (false, None, Some(format!("undecodable response body: {err}"))),
        }
    };

    CheckResult {
        name: request.name.clone(),
        method: request.method,
        url,
        expected_status: request.expected_status,
        observed_status: Some(status),
        passed,
        payload,
        error,
        raw_body: Some(body),
        duration_ms: Some(duration_ms),
    }
}

/// Empty bodies decode to an empty mapping.
fn decode_payload(body: &str) -> Result<Value, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::config::OutputFormat;
    use crate::error::TransportError;
    use crate::http::method::HttpMethod;
    use crate::http::request::PreparedRequest;

    /// Replays canned responses in order and records what was sent.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<(u16, String), String>>>,
        pub(crate) sent: RefCell<Vec<PreparedRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn reply(self, status: u16, body: &str) -> Self {
            self.replies.borrow_mut().push_back(Ok((status, body.to_string())));
            self
        }

        pub(crate) fn refuse(self, reason: &str) -> Self {
            self.replies.borrow_mut().push_back(Err(reason.to_string()));
            self
        }
    }

    impl Transport for &ScriptedTransport {
        fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.clone();
            self.sent.borrow_mut().push(request);
            match self.replies.borrow_mut().pop_front() {
                Some(Ok((status, body))) => Ok(HttpResponse {
                    status,
                    duration_ms: 1,
                    body,
                }),
                Some(Err(reason)) => Err(TransportError::InvalidRequest { url, reason }),
                None => Err(TransportError::InvalidRequest {
                    url,
                    reason: "no scripted reply".to_string(),
                }),
            }
        }
    }

    fn runner(transport: &ScriptedTransport) -> CheckRunner<&ScriptedTransport> {
        CheckRunner::new(transport, "http://host/", Reporter::new(OutputFormat::Json))
    }

    fn root() -> CheckRequest {
        CheckRequest::new("Root API Endpoint", HttpMethod::Get, "api", 200)
    }

    #[test]
    fn matching_status_passes_with_payload() {
        let transport = ScriptedTransport::default().reply(200, r#"{"message":"Hello World"}"#);
        let mut runner = runner(&transport);

        let (passed, payload) = runner.run_check(root()).into_outcome();

        assert!(passed);
        assert_eq!(payload, json!({"message": "Hello World"}));
        assert_eq!(runner.scoreboard().total(), 1);
        assert_eq!(runner.scoreboard().passed(), 1);
        assert_eq!(transport.sent.borrow()[0].url, "http://host/api");
    }

    #[test]
    fn status_mismatch_fails_with_empty_payload() {
        let transport = ScriptedTransport::default().reply(500, "Internal Server Error");
        let mut runner = runner(&transport);

        let result = runner.run_check(root());

        assert!(!result.passed);
        assert_eq!(result.observed_status, Some(500));
        assert_eq!(result.raw_body.as_deref(), Some("Internal Server Error"));
        assert_eq!(result.into_outcome().1, json!({}));
        assert_eq!(runner.scoreboard().total(), 1);
        assert_eq!(runner.scoreboard().passed(), 0);
    }

    #[test]
    fn transport_failure_is_a_failed_check() {
        let transport = ScriptedTransport::default().refuse("connection refused");
        let mut runner = runner(&transport);

        let result = runner.run_check(root());

        assert!(!result.passed);
        assert_eq!(result.observed_status, None);
        assert!(result.error.unwrap().contains("connection refused"));
        assert_eq!(runner.scoreboard().total(), 1);
    }

    #[test]
    fn undecodable_body_fails_without_counting_a_pass() {
        let transport = ScriptedTransport::default().reply(200, "<html>oops</html>");
        let mut runner = runner(&transport);

        let result = runner.run_check(root());

        assert!(!result.passed);
        assert_eq!(result.observed_status, Some(200));
        assert_eq!(runner.scoreboard().passed(), 0);
    }

    #[test]
    fn empty_body_passes_as_empty_mapping() {
        let transport = ScriptedTransport::default().reply(200, "");
        let mut runner = runner(&transport);

        let (passed, payload) = runner.run_check(root()).into_outcome();
        assert!(passed);
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn every_call_counts_exactly_once() {
        let transport = ScriptedTransport::default()
            .reply(200, "{}")
            .reply(404, "{}")
            .refuse("timeout")
            .reply(200, "not json")
            .reply(200, "[]");
        let mut runner = runner(&transport);

        for expected_total in 1..=5 {
            runner.run_check(root());
            let scoreboard = runner.scoreboard();
            assert_eq!(scoreboard.total(), expected_total);
            assert!(scoreboard.passed() <= scoreboard.total());
        }
        assert_eq!(runner.scoreboard().passed(), 2);
    }

    #[test]
    fn invalid_request_never_reaches_transport() {
        let transport = ScriptedTransport::default();
        let mut runner = runner(&transport);
        let request = CheckRequest::new("Upload", HttpMethod::Post, "api/media/upload", 200)
            .with_body(json!("not an object"))
            .with_file(crate::http::request::FilePart {
                field: "file".into(),
                file_name: "a.mp4".into(),
                mime: "video/mp4".into(),
                bytes: Vec::new(),
            });

        let result = runner.run_check(request);
        assert!(!result.passed);
        assert!(transport.sent.borrow().is_empty());
        assert_eq!(runner.scoreboard().total(), 1);
    }
}
