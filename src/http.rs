use crate::catalog::HttpMethod;
use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderMap;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

pub struct HttpClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

/// Rendered response body plus the status it came with.
pub struct Outcome {
    pub output: String,
    pub status: u16,
    pub ok: bool,
}

impl HttpClient {
    pub fn new(base_url: String, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ims-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
        raw: bool,
        pretty: bool,
    ) -> Result<Outcome> {
        let url = self.url_for(path);
        debug!(%method, %url, query = query.len(), has_body = body.is_some(), "sending request");

        let mut req = self.client.request(to_reqwest(method), url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req = apply_query(req, query);
        if let Some(value) = body {
            req = req.json(&value);
        }

        let resp = req.send().context("send request")?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let text = resp.text().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read response body");
            String::new()
        });
        debug!(status = status.as_u16(), bytes = text.len(), "received response");
        let body_value = parse_body_value(&text);

        let output = if raw {
            json!({
                "status": status.as_u16(),
                "headers": headers_to_json(&headers),
                "body": body_value,
            })
        } else {
            body_value
        };

        let rendered = if pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };

        Ok(Outcome {
            output: rendered,
            status: status.as_u16(),
            ok: status.is_success(),
        })
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn apply_query(req: RequestBuilder, query: &[(String, String)]) -> RequestBuilder {
    if query.is_empty() {
        return req;
    }
    req.query(&query)
}

fn parse_body_value(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (key, value) in headers.iter() {
        let val = match value.to_str() {
            Ok(text) => text.to_string(),
            Err(_) => {
                warn!(header = %key, "non-UTF-8 header value replaced lossily");
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            }
        };
        map.insert(key.to_string(), Value::String(val));
    }
    Value::Object(map)
}
