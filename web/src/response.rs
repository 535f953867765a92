use crate::error::HandlerError;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::collections::HashMap;

/// An HTTP response produced by a view, hook or error handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
  status: StatusCode,
  headers: HeaderMap,
  body: String,
}

impl Response {
  pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
    Self {
      status,
      headers: HeaderMap::new(),
      body: body.into(),
    }
  }

  pub fn ok(body: impl Into<String>) -> Self {
    Self::new(StatusCode::OK, body)
  }

  pub fn internal_server_error() -> Self {
    Self::new(
      StatusCode::INTERNAL_SERVER_ERROR,
      "The server encountered an internal error and was unable to complete your request.",
    )
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  pub fn set_status(&mut self, status: StatusCode) {
    self.status = status;
  }

  pub fn body(&self) -> &str {
    &self.body
  }

  pub fn set_body(&mut self, body: impl Into<String>) {
    self.body = body.into();
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  pub fn headers_mut(&mut self) -> &mut HeaderMap {
    &mut self.headers
  }

  /// Returns the response with `name` set to `value`.
  ///
  /// Invalid header names or values are ignored.
  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    if let (Ok(name), Ok(value)) = (
      HeaderName::from_bytes(name.as_bytes()),
      HeaderValue::from_str(value),
    ) {
      self.headers.insert(name, value);
    }
    self
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(name).and_then(|v| v.to_str().ok())
  }
}

/// Converts a view's return value into a [`Response`].
pub trait Responder {
  fn respond(self) -> Result<Response, HandlerError>;
}

impl Responder for Response {
  fn respond(self) -> Result<Response, HandlerError> {
    Ok(self)
  }
}

impl Responder for String {
  fn respond(self) -> Result<Response, HandlerError> {
    Ok(Response::ok(self))
  }
}

impl Responder for &'static str {
  fn respond(self) -> Result<Response, HandlerError> {
    Ok(Response::ok(self))
  }
}

impl Responder for (StatusCode, String) {
  fn respond(self) -> Result<Response, HandlerError> {
    Ok(Response::new(self.0, self.1))
  }
}

impl Responder for (StatusCode, &'static str) {
  fn respond(self) -> Result<Response, HandlerError> {
    Ok(Response::new(self.0, self.1))
  }
}

impl<T, E> Responder for Result<T, E>
where
  T: Responder,
  E: Into<HandlerError>,
{
  fn respond(self) -> Result<Response, HandlerError> {
    self.map_err(Into::into)?.respond()
  }
}

/// Converts a hook's return value into an optional [`Response`].
///
/// Before hooks short-circuit the request when they produce a response; after
/// hooks replace the current response with it.
pub trait MaybeResponse {
  fn maybe_respond(self) -> Result<Option<Response>, HandlerError>;
}

impl MaybeResponse for () {
  fn maybe_respond(self) -> Result<Option<Response>, HandlerError> {
    Ok(None)
  }
}

impl MaybeResponse for Response {
  fn maybe_respond(self) -> Result<Option<Response>, HandlerError> {
    Ok(Some(self))
  }
}

impl<R: Responder> MaybeResponse for Option<R> {
  fn maybe_respond(self) -> Result<Option<Response>, HandlerError> {
    self.map(Responder::respond).transpose()
  }
}

impl<T, E> MaybeResponse for Result<T, E>
where
  T: MaybeResponse,
  E: Into<HandlerError>,
{
  fn maybe_respond(self) -> Result<Option<Response>, HandlerError> {
    self.map_err(Into::into)?.maybe_respond()
  }
}

/// Converts a context processor's return value into template variables.
pub trait TemplateValues {
  fn into_values(self) -> Result<HashMap<String, String>, HandlerError>;
}

impl TemplateValues for HashMap<String, String> {
  fn into_values(self) -> Result<HashMap<String, String>, HandlerError> {
    Ok(self)
  }
}

impl<K: Into<String>, V: Into<String>> TemplateValues for Vec<(K, V)> {
  fn into_values(self) -> Result<HashMap<String, String>, HandlerError> {
    Ok(self.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

impl<T, E> TemplateValues for Result<T, E>
where
  T: TemplateValues,
  E: Into<HandlerError>,
{
  fn into_values(self) -> Result<HashMap<String, String>, HandlerError> {
    self.map_err(Into::into)?.into_values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_option_and_unit_hook_results() {
    assert_eq!(().maybe_respond().unwrap(), None);
    assert_eq!(None::<Response>.maybe_respond().unwrap(), None);
    let response = Some("short").maybe_respond().unwrap().unwrap();
    assert_eq!(response.body(), "short");
  }

  #[test]
  fn test_error_results_become_handler_errors() {
    let result: Result<String, std::io::Error> =
      Err(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    let err = result.respond().unwrap_err();
    assert!(err.is::<std::io::Error>());
  }

  #[test]
  fn test_with_header() {
    let response = Response::ok("x").with_header("x-request-id", "7");
    assert_eq!(response.header("x-request-id"), Some("7"));
  }
}
