use anyhow::{anyhow, Context};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

/// Thin JSON client for the admin API
pub struct AdminClient {
    http: reqwest::Client,
    base: Url,
}

impl AdminClient {
    pub fn new(server: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(server).with_context(|| format!("Invalid server URL: {}", server))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self { http, base })
    }

    pub fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid request path: {}", path))
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> anyhow::Result<Value> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> anyhow::Result<Value> {
        self.send(Method::PUT, path, body).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> anyhow::Result<Value> {
        let url = self.url(path)?;
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).with_context(|| format!("Server returned non-JSON body ({})", status))?
        };

        if !status.is_success() {
            return Err(failure(status, &value));
        }
        Ok(value)
    }
}

/// Error from an `{ error, details? }` body
fn failure(status: StatusCode, body: &Value) -> anyhow::Error {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Request failed");
    match body.get("details") {
        Some(Value::String(details)) => anyhow!("{}: {} ({})", message, details, status),
        Some(details) => anyhow!("{} ({}): {}", message, status, details),
        None => anyhow!("{} ({})", message, status),
    }
}

pub fn tenant_path(tenant: &str, resource: &str) -> String {
    format!("/api/rcm/{}/{}", tenant, resource)
}
