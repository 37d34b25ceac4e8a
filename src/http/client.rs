use std::time::Instant;

use log::debug;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderName, HeaderValue};

use crate::error::TransportError;

use super::request::{FilePart, PreparedRequest, RequestBody};
use super::response::HttpResponse;

/// Performs one blocking HTTP exchange per call.
pub trait Transport {
    fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport. Uses the client's default timeout and never
/// retries.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build().map_err(TransportError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut req_builder = self.client.request(method.into(), &url);
        req_builder = apply_headers(req_builder, &headers, &url)?;
        req_builder = match body {
            RequestBody::Empty => req_builder,
            RequestBody::Json(bytes) => req_builder.body(bytes),
            RequestBody::Multipart { fields, files } => {
                req_builder.multipart(build_form(fields, files, &url)?)
            }
        };

        debug!("sending {method} {url}");
        let started = Instant::now();
        let response = req_builder.send().map_err(|source| TransportError::Send {
            url: url.clone(),
            source,
        })?;
        let elapsed = started.elapsed().as_millis();

        let status = response.status().as_u16();
        let bytes = response.bytes().map_err(|source| TransportError::ReadBody {
            url: url.clone(),
            source,
        })?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!("{method} {url} -> {status} ({} bytes, {elapsed} ms)", bytes.len());

        Ok(HttpResponse {
            status,
            duration_ms: elapsed,
            body,
        })
    }
}

fn apply_headers(
    mut req_builder: RequestBuilder,
    headers: &[(String, String)],
    url: &str,
) -> Result<RequestBuilder, TransportError> {
    for (key, value) in headers {
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            TransportError::InvalidRequest {
                url: url.to_string(),
                reason: format!("invalid header key `{key}`: {e}"),
            }
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidRequest {
            url: url.to_string(),
            reason: format!("invalid header value `{value}`: {e}"),
        })?;
        req_builder = req_builder.header(header_name, header_value);
    }

    Ok(req_builder)
}

fn build_form(
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
    url: &str,
) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for (key, value) in fields {
        form = form.text(key, value);
    }
    for file in files {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)
            .map_err(|e| TransportError::InvalidRequest {
                url: url.to_string(),
                reason: format!("invalid MIME type `{}`: {e}", file.mime),
            })?;
        form = form.part(file.field, part);
    }
    Ok(form)
}
