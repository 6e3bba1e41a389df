use std::collections::BTreeMap;
use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::config::Config;
use crate::http_request::Request;

/// Outcome of pinging a saved request. Rendered, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub status_code: u16,
    pub status: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(serialize_with = "as_millis")]
    pub response_time: Duration,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

pub struct ExecutionContext {
    pub client: reqwest::blocking::Client,
    default_headers: BTreeMap<String, String>,
    response_limit: Option<usize>,
}

impl ExecutionContext {
    pub fn new(config: &Config) -> Result<ExecutionContext> {
        let redirect = if config.follow_redirect {
            Policy::default()
        } else {
            Policy::none()
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout_duration()?)
            .redirect(redirect)
            .build()
            .context("failed to build http client")?;
        Ok(ExecutionContext {
            client,
            default_headers: config.default_headers.clone(),
            response_limit: config.response_limit(),
        })
    }
}

impl Request {
    pub fn reqwest_method(&self) -> Result<reqwest::Method> {
        reqwest::Method::from_bytes(self.method.as_bytes())
            .map_err(|_| anyhow!("{} is a unknown http method", self.method))
    }

    pub fn uri(&self) -> Result<reqwest::Url> {
        self.url
            .parse::<reqwest::Url>()
            .map_err(|e| anyhow!("{:?} @ '{}'", e, self.url))
    }

    /// `defaults` first, then the request's own headers on top.
    pub fn header_map(&self, defaults: &BTreeMap<String, String>) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (key, value) in defaults.iter().chain(self.headers.iter()) {
            let name = HeaderName::try_from(key.as_str())
                .with_context(|| format!("invalid header name '{}'", key))?;
            let value = HeaderValue::try_from(value.as_str())
                .with_context(|| format!("invalid value for header '{}'", key))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

pub fn execute_http_request(request: &Request, context: &ExecutionContext) -> Result<Response> {
    let method = request.reqwest_method()?;
    let uri = request.uri()?;
    info!("{} {}", method, uri);

    let mut req = context
        .client
        .request(method, uri)
        .headers(request.header_map(&context.default_headers)?);
    if !request.body.is_empty() {
        req = req.body(request.body.clone());
    }

    let timestamp = Utc::now();
    let started = Instant::now();
    let res = req
        .send()
        .with_context(|| format!("request '{}' failed", request.name))?;

    let status = res.status();
    let headers = res
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    let (body, truncated) =
        read_limited(res, context.response_limit).context("failed to read response body")?;
    let response_time = started.elapsed();
    debug!(status = status.as_u16(), bytes = body.len(), truncated, "response received");

    Ok(Response {
        status_code: status.as_u16(),
        status: status.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
        truncated,
        response_time,
        timestamp,
        request_id: request.id.clone(),
    })
}

/// Reads at most `limit` bytes of `reader`; the flag is set when more were
/// available.
fn read_limited<R: Read>(mut reader: R, limit: Option<usize>) -> std::io::Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    match limit {
        Some(limit) => {
            reader.take(limit as u64 + 1).read_to_end(&mut body)?;
            let truncated = body.len() > limit;
            body.truncate(limit);
            Ok((body, truncated))
        }
        None => {
            reader.read_to_end(&mut body)?;
            Ok((body, false))
        }
    }
}

/// Renders as pretty JSON for `output_format: json`, otherwise as a
/// status line, headers and body.
pub fn render_response(response: &Response, output_format: &str) -> Result<String> {
    if output_format.eq_ignore_ascii_case("json") {
        return serde_json::to_string_pretty(response).context("failed to encode response");
    }

    let status_line = format!("{} ({} ms)", response.status, response.response_time.as_millis());
    let status_line = if response.is_success() {
        status_line.green().bold()
    } else {
        status_line.red().bold()
    };
    let headers = response
        .headers
        .iter()
        .map(|(k, v)| format!("{}: {}", k.cyan(), v))
        .collect::<Vec<String>>()
        .join("\n");

    let mut out = format!("{}\n{}\n\n{}", status_line, headers, response.body);
    if response.truncated {
        out.push_str(&format!("\n{}", "... (truncated)".dimmed()));
    }
    Ok(out)
}
