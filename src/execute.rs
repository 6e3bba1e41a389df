use anyhow::{Context, Result};

use crate::config::Config;
use crate::errors::GurlzError;
use crate::http_request::{normalize_method, parse_headers, Request};
use crate::http_request_executor::{execute_http_request, ExecutionContext, Response};
use crate::storage::StorageManager;

/// Changes requested by `gurlz edit`; `None` leaves a field alone.
#[derive(Debug, Default, Clone)]
pub struct RequestEdit {
    pub name: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Vec<String>>,
    pub body: Option<String>,
}

/// Saves a new request. Without an explicit method the configured default
/// is used.
pub fn add_request(
    storage: &StorageManager,
    name: &str,
    url: &str,
    method: Option<&str>,
    headers: &[String],
    body: &str,
) -> Result<Request> {
    // the config is only read once the input is known to be valid
    let mut request = Request::new(name, url, method.unwrap_or("GET"), headers, body)?;
    if method.is_none() {
        let config = storage.load_config().context("failed to load config")?;
        request.method = normalize_method(&config.default_method)?;
    }

    let mut store = storage.load_requests().context("failed to load requests")?;
    store.add_request(request.clone())?;
    storage
        .save_requests(&store)
        .context("failed to save request")?;
    Ok(request)
}

pub fn list_requests(storage: &StorageManager) -> Result<Vec<Request>> {
    let store = storage.load_requests().context("failed to load requests")?;
    Ok(store.requests().to_vec())
}

pub fn show_request(storage: &StorageManager, name: &str) -> Result<Request> {
    let store = storage.load_requests().context("failed to load requests")?;
    let request = store
        .find_by_name(name)
        .cloned()
        .ok_or_else(|| GurlzError::NotFound(name.to_string()))?;
    Ok(request)
}

pub fn edit_request(storage: &StorageManager, name: &str, edit: RequestEdit) -> Result<Request> {
    let headers = edit.headers.as_deref().map(parse_headers).transpose()?;

    let mut store = storage.load_requests().context("failed to load requests")?;
    let updated = store
        .update_by_name(name, |req| {
            if let Some(new_name) = edit.name {
                req.name = new_name;
            }
            if let Some(url) = edit.url {
                req.url = url;
            }
            if let Some(method) = edit.method {
                req.method = method;
            }
            if let Some(headers) = headers {
                req.headers = headers;
            }
            if let Some(body) = edit.body {
                req.body = body;
            }
        })?
        .clone();
    storage
        .save_requests(&store)
        .context("failed to save request")?;
    Ok(updated)
}

pub fn remove_request(storage: &StorageManager, name: &str) -> Result<Request> {
    let mut store = storage.load_requests().context("failed to load requests")?;
    let removed = store.remove_by_name(name)?;
    storage
        .save_requests(&store)
        .context("failed to save requests")?;
    Ok(removed)
}

pub fn ping_request(storage: &StorageManager, name: &str) -> Result<(Response, Config)> {
    let config = storage.load_config().context("failed to load config")?;
    let request = show_request(storage, name)?;
    let context = ExecutionContext::new(&config)?;
    let response = execute_http_request(&request, &context)?;
    Ok((response, config))
}

pub fn format_added(request: &Request) -> String {
    let mut out = format!(
        "✅ Added request '{}' -> {} {}",
        request.name, request.method, request.url
    );
    if !request.headers.is_empty() {
        out.push_str(&format!("\n   Headers: {}", request.headers.len()));
    }
    if !request.body.is_empty() {
        out.push_str(&format!("\n   Body: {} bytes", request.body_len()));
    }
    out
}

pub fn format_list(requests: &[Request]) -> String {
    if requests.is_empty() {
        return "No saved requests. Use `gurlz add <NAME> <URL>` to create one.".to_string();
    }
    let width = requests.iter().map(|it| it.name.len()).max().unwrap_or(0);
    let method_width = requests.iter().map(|it| it.method.len()).max().unwrap_or(0);
    requests
        .iter()
        .map(|it| format!("{:width$}  {:mw$}  {}", it.name, it.method, it.url, mw = method_width))
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn format_details(request: &Request) -> String {
    let mut out = format!(
        "Name:    {}\nID:      {}\nMethod:  {}\nURL:     {}\nCreated: {}\nUpdated: {}",
        request.name,
        request.id,
        request.method,
        request.url,
        request.created_at.to_rfc3339(),
        request.updated_at.to_rfc3339()
    );
    if !request.headers.is_empty() {
        out.push_str("\nHeaders:");
        for (key, value) in &request.headers {
            out.push_str(&format!("\n  {}: {}", key, value));
        }
    }
    if !request.body.is_empty() {
        out.push_str(&format!("\nBody:\n{}", request.body));
    }
    out
}
