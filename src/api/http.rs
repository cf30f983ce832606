//! HTTP plumbing shared by every entity service.
//!
//! All requests carry the bearer token and JSON content type, and all
//! responses funnel through one envelope decoder so success/error shapes are
//! normalized in a single place.

use color_eyre::{eyre::eyre, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;

/// Shared request client for the CRM backend.
#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  base: String,
  token: Option<String>,
  user_id: Option<u64>,
}

impl HttpClient {
  /// Build a client for the given API base URL with an optional session.
  pub fn new(base_url: &str, token: Option<String>, user_id: Option<u64>) -> Result<Self> {
    // Validate early so a typo in the config fails at startup, not mid-call.
    let parsed = Url::parse(base_url).map_err(|e| eyre!("Invalid API URL {}: {}", base_url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base: parsed.to_string().trim_end_matches('/').to_string(),
      token,
      user_id,
    })
  }

  /// Id of the logged-in user, for `created_by`/`updated_by` injection.
  pub fn current_user_id(&self) -> Result<u64, ApiError> {
    self.user_id.ok_or(ApiError::Auth {
      status: 401,
      message: "User not authenticated".to_string(),
    })
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.request::<T, ()>(Method::GET, path, &[], None).await
  }

  pub async fn get_query<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiError> {
    self.request::<T, ()>(Method::GET, path, query, None).await
  }

  pub async fn post<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    self.request(Method::POST, path, &[], Some(body)).await
  }

  /// POST with no body, for action endpoints like lead conversion.
  pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
    self
      .request::<Option<Value>, ()>(Method::POST, path, &[], None)
      .await?;
    Ok(())
  }

  pub async fn put<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    self.request(Method::PUT, path, &[], Some(body)).await
  }

  pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
    self
      .request::<Option<Value>, ()>(Method::DELETE, path, &[], None)
      .await?;
    Ok(())
  }

  async fn request<T: DeserializeOwned, B: Serialize>(
    &self,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&B>,
  ) -> Result<T, ApiError> {
    let url = format!("{}/{}", self.base, path.trim_start_matches('/'));

    let mut req = self
      .http
      .request(method, &url)
      .header("Content-Type", "application/json");
    if let Some(token) = &self.token {
      req = req.bearer_auth(token);
    }
    if !query.is_empty() {
      req = req.query(query);
    }
    if let Some(body) = body {
      let json = serde_json::to_vec(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
      req = req.body(json);
    }

    let response = req
      .send()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
      .text()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;

    decode_body(status, &text)
  }
}

/// Success envelope: `{ success: true, data: <payload>, count? }`.
/// Error envelope: `{ success: false, error: string | { message }, message? }`.
#[derive(serde::Deserialize)]
struct Envelope {
  success: bool,
  #[serde(default)]
  data: Option<Value>,
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  error: Option<ErrorField>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorField {
  Text(String),
  Object { message: String },
}

impl ErrorField {
  fn into_message(self) -> String {
    match self {
      ErrorField::Text(s) => s,
      ErrorField::Object { message } => message,
    }
  }
}

/// Decode a raw HTTP response into the typed payload or an [`ApiError`].
///
/// Non-2xx statuses and `success: false` bodies both map to errors carrying
/// the best-effort message the backend provided; bodies that are not valid
/// JSON degrade to a generic malformed-response error.
pub fn decode_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
  if !(200..300).contains(&status) {
    let message = serde_json::from_str::<Envelope>(body)
      .ok()
      .and_then(extract_message)
      .unwrap_or_else(|| format!("HTTP {}", status));
    return Err(ApiError::from_status(status, message));
  }

  let envelope: Envelope = serde_json::from_str(body)
    .map_err(|_| ApiError::Malformed(format!("HTTP {}: invalid response body", status)))?;

  if !envelope.success {
    let message = extract_message(envelope).unwrap_or_else(|| "Request failed".to_string());
    return Err(ApiError::Client { status, message });
  }

  let data = envelope.data.unwrap_or(Value::Null);
  serde_json::from_value(data)
    .map_err(|_| ApiError::Malformed(format!("HTTP {}: unexpected payload shape", status)))
}

fn extract_message(envelope: Envelope) -> Option<String> {
  envelope
    .error
    .map(ErrorField::into_message)
    .or(envelope.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_decode_success_envelope() {
    let body = r#"{"success": true, "data": [1, 2, 3], "count": 3}"#;
    let data: Vec<u32> = decode_body(200, body).unwrap();
    assert_eq!(data, vec![1, 2, 3]);
  }

  #[test]
  fn test_decode_error_object_message() {
    let body = r#"{"success": false, "error": {"message": "Lead not found"}}"#;
    let err = decode_body::<Value>(404, body).unwrap_err();
    assert_eq!(
      err,
      ApiError::Client {
        status: 404,
        message: "Lead not found".to_string()
      }
    );
  }

  #[test]
  fn test_decode_error_string_message() {
    let body = r#"{"success": false, "error": "Invalid credentials"}"#;
    let err = decode_body::<Value>(401, body).unwrap_err();
    assert_eq!(
      err,
      ApiError::Auth {
        status: 401,
        message: "Invalid credentials".to_string()
      }
    );
  }

  #[test]
  fn test_decode_success_false_with_2xx_status() {
    let body = r#"{"success": false, "message": "Validation failed"}"#;
    let err = decode_body::<Value>(200, body).unwrap_err();
    assert_eq!(
      err,
      ApiError::Client {
        status: 200,
        message: "Validation failed".to_string()
      }
    );
  }

  #[test]
  fn test_decode_non_json_body_degrades() {
    let err = decode_body::<Value>(200, "<html>oops</html>").unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
  }

  #[test]
  fn test_decode_non_json_error_body_uses_status() {
    let err = decode_body::<Value>(502, "<html>bad gateway</html>").unwrap_err();
    assert_eq!(
      err,
      ApiError::Server {
        status: 502,
        message: "HTTP 502".to_string()
      }
    );
  }

  #[test]
  fn test_decode_unit_payload_absent_data() {
    let body = r#"{"success": true}"#;
    let data: Option<Value> = decode_body(200, body).unwrap();
    assert!(data.is_none());
  }
}
