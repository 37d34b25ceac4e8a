use log::debug;
use serde_json::Value;

use crate::error::TransportError;

use super::method::HttpMethod;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A file sent as one part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// One request/expectation pair, as handed to the check runner.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub name: String,
    pub method: HttpMethod,
    pub endpoint: String,
    pub expected_status: u16,
    pub body: Option<Value>,
    pub files: Vec<FilePart>,
}

impl CheckRequest {
    pub fn new(
        name: impl Into<String>,
        method: HttpMethod,
        endpoint: impl Into<String>,
        expected_status: u16,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            endpoint: endpoint.into(),
            expected_status,
            body: None,
            files: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Lower the check into the exact request the transport will send.
    ///
    /// Bodies are only attached to POST and PUT. When files are present the
    /// request becomes multipart: top-level body fields turn into text fields
    /// and no JSON content type is set.
    pub fn prepare(&self, url: String) -> Result<PreparedRequest, TransportError> {
        let mut headers = Vec::new();
        let body = if !self.files.is_empty() {
            if !self.method.accepts_body() {
                return Err(TransportError::InvalidRequest {
                    url,
                    reason: format!("{} cannot carry file parts", self.method),
                });
            }
            let fields = match &self.body {
                Some(body) => form_fields(body).ok_or_else(|| TransportError::InvalidRequest {
                    url: url.clone(),
                    reason: "multipart body must be a JSON object".to_string(),
                })?,
                None => Vec::new(),
            };
            RequestBody::Multipart {
                fields,
                files: self.files.clone(),
            }
        } else {
            if self.method != HttpMethod::Get {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
            }
            match &self.body {
                Some(body) if self.method.accepts_body() => {
                    let bytes = serde_json::to_vec(body).map_err(|e| TransportError::InvalidRequest {
                        url: url.clone(),
                        reason: format!("body is not serializable: {e}"),
                    })?;
                    RequestBody::Json(bytes)
                }
                Some(_) => {
                    debug!("dropping body for {} `{}`", self.method, self.name);
                    RequestBody::Empty
                }
                None => RequestBody::Empty,
            }
        };

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Json(Vec<u8>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl PreparedRequest {
    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Join the base URL and an endpoint with exactly one slash between them.
pub fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn form_fields(body: &Value) -> Option<Vec<(String, String)>> {
    let object = body.as_object()?;
    let fields = object
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video_part() -> FilePart {
        FilePart {
            field: "file".into(),
            file_name: "clip.mp4".into(),
            mime: "video/mp4".into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn join_url_uses_single_separator() {
        assert_eq!(join_url("http://host/", "/api"), "http://host/api");
        assert_eq!(join_url("http://host", "api/status"), "http://host/api/status");
    }

    #[test]
    fn get_has_no_content_type() {
        let request = CheckRequest::new("Root", HttpMethod::Get, "api", 200);
        let prepared = request.prepare("http://host/api".into()).unwrap();
        assert_eq!(prepared.header("content-type"), None);
        assert_eq!(prepared.body, RequestBody::Empty);
    }

    #[test]
    fn post_serializes_json_body() {
        let request = CheckRequest::new("Create", HttpMethod::Post, "api/status", 200)
            .with_body(json!({"client_name": "abc"}));
        let prepared = request.prepare("http://host/api/status".into()).unwrap();

        assert_eq!(prepared.header("Content-Type"), Some(JSON_CONTENT_TYPE));
        match prepared.body {
            RequestBody::Json(bytes) => {
                let decoded: Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(decoded, json!({"client_name": "abc"}));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn delete_sets_content_type_without_body() {
        let request = CheckRequest::new("Remove", HttpMethod::Delete, "api/status/1", 200)
            .with_body(json!({"ignored": true}));
        let prepared = request.prepare("http://host/api/status/1".into()).unwrap();
        assert_eq!(prepared.header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(prepared.body, RequestBody::Empty);
    }

    #[test]
    fn files_switch_to_multipart() {
        let request = CheckRequest::new("Upload", HttpMethod::Post, "api/media/upload", 200)
            .with_body(json!({"title": "clip", "duration": 3}))
            .with_file(video_part());
        let prepared = request.prepare("http://host/api/media/upload".into()).unwrap();

        assert_eq!(prepared.header("content-type"), None);
        match prepared.body {
            RequestBody::Multipart { fields, files } => {
                assert!(fields.contains(&("title".to_string(), "clip".to_string())));
                assert!(fields.contains(&("duration".to_string(), "3".to_string())));
                assert_eq!(files, vec![video_part()]);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn multipart_rejects_non_object_body() {
        let request = CheckRequest::new("Upload", HttpMethod::Post, "api/media/upload", 200)
            .with_body(json!(["not", "fields"]))
            .with_file(video_part());
        assert!(matches!(
            request.prepare("http://host".into()),
            Err(TransportError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn get_cannot_carry_files() {
        let request = CheckRequest::new("Bad", HttpMethod::Get, "api", 200).with_file(video_part());
        assert!(request.prepare("http://host/api".into()).is_err());
    }
}
