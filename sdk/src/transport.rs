use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SdkError};

#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl HttpTransport {
    pub(crate) fn new(
        base_url: &str,
        timeout: Duration,
        headers: Vec<(String, String)>,
    ) -> Result<Self> {
        if timeout.is_zero() {
            return Err(SdkError::InvalidOption(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: normalize_base_url(base_url)?,
            headers,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg(test)]
    pub(crate) fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let payload = self.execute("GET", path, None)?;
        deserialize_json("GET", path, payload)
    }

    pub(crate) fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let payload = self.execute("DELETE", path, None)?;
        deserialize_json("DELETE", path, payload)
    }

    pub(crate) fn send_json<B, T>(&self, method: &str, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body_payload =
            serde_json::to_string(body).map_err(|source| SdkError::InvalidJson {
                method: method.to_string(),
                path: path.to_string(),
                body: String::new(),
                source,
            })?;
        let payload = self.execute(method, path, Some(body_payload))?;
        deserialize_json(method, path, payload)
    }

    fn execute(&self, method: &str, path: &str, body_payload: Option<String>) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");
        for (name, value) in &self.headers {
            request = request.set(name, value);
        }

        let outcome = match body_payload {
            Some(payload) => request
                .set("Content-Type", "application/json")
                .send_string(&payload),
            None => request.call(),
        };

        match outcome {
            Ok(response) => response
                .into_string()
                .map_err(|source| transport_error(method, path, Box::new(source))),
            Err(ureq::Error::Status(status, response)) => Err(SdkError::Http {
                status,
                method: method.to_string(),
                path: path.to_string(),
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => {
                Err(transport_error(method, path, Box::new(transport)))
            }
        }
    }
}

pub(crate) fn deserialize_json<T: DeserializeOwned>(
    method: &str,
    path: &str,
    payload: String,
) -> Result<T> {
    serde_json::from_str::<T>(&payload).map_err(|source| SdkError::InvalidJson {
        method: method.to_string(),
        path: path.to_string(),
        body: payload,
        source,
    })
}

fn transport_error(
    method: &str,
    path: &str,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> SdkError {
    SdkError::Transport {
        method: method.to_string(),
        path: path.to_string(),
        source,
    }
}

pub(crate) fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(SdkError::InvalidOption(
            "base URL must not be empty".to_string(),
        ));
    }

    let remainder = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            SdkError::InvalidOption("base URL must start with http:// or https://".to_string())
        })?;

    let authority = remainder.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(SdkError::InvalidOption(
            "base URL authority cannot be empty".to_string(),
        ));
    }
    if let Some((host, port)) = authority.rsplit_once(':') {
        if host.is_empty() {
            return Err(SdkError::InvalidOption(
                "base URL host cannot be empty".to_string(),
            ));
        }
        port.parse::<u16>()
            .map_err(|_| SdkError::InvalidOption("invalid base URL port".to_string()))?;
    }

    Ok(trimmed.to_string())
}

pub(crate) fn escape_segment(value: impl AsRef<str>) -> String {
    let mut output = String::new();
    for byte in value.as_ref().as_bytes() {
        if byte.is_ascii_alphanumeric() || matches!(*byte, b'-' | b'_' | b'.' | b'~') {
            output.push(char::from(*byte));
        } else {
            output.push('%');
            output.push_str(&format!("{:02X}", byte));
        }
    }
    output
}
