//! HTTP response checks.
//!
//! Absence of diagnostics is the success signal: a response yields exactly
//! one error diagnostic when the transport failed or the status is >= 400,
//! and nothing otherwise.

use std::fmt;

use crate::framework;
use crate::sdk;

/// The parts of an HTTP response the checks need.
pub trait HttpResponse {
    /// Numeric status code.
    fn status_code(&self) -> u16;

    /// Response body as text.
    fn body_text(&self) -> &str;

    /// Returns true for statuses >= 400.
    fn is_error(&self) -> bool {
        self.status_code() >= 400
    }
}

fn failure_detail<R: HttpResponse + ?Sized>(response: &R) -> String {
    let body = response.body_text();
    if body.is_empty() {
        format!("HTTP status {}", response.status_code())
    } else {
        body.to_string()
    }
}

/// Legacy check: an error entry iff the call failed.
pub fn check_error<R, E>(result: Result<&R, &E>, summary: &str) -> sdk::Diagnostics
where
    R: HttpResponse + ?Sized,
    E: fmt::Display + ?Sized,
{
    match result {
        Err(err) => sdk::Diagnostics::error(summary, err.to_string()),
        Ok(response) if response.is_error() => {
            sdk::Diagnostics::error(summary, failure_detail(response))
        }
        Ok(_) => sdk::Diagnostics::new(),
    }
}

/// Framework check: an error entry iff the call failed.
pub fn check_http_error<R, E>(result: Result<&R, &E>, summary: &str) -> framework::Diagnostics
where
    R: HttpResponse + ?Sized,
    E: fmt::Display + ?Sized,
{
    match result {
        Err(err) => framework::Diagnostic::error(summary, err.to_string()).into(),
        Ok(response) => check_http_status(response, summary),
    }
}

/// Framework check for a response that was already received.
pub fn check_http_status<R>(response: &R, summary: &str) -> framework::Diagnostics
where
    R: HttpResponse + ?Sized,
{
    if response.is_error() {
        framework::Diagnostic::error(summary, failure_detail(response)).into()
    } else {
        framework::Diagnostics::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(u16, &'static str);

    impl HttpResponse for Canned {
        fn status_code(&self) -> u16 {
            self.0
        }

        fn body_text(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn test_success_yields_nothing() {
        let ok = Canned(200, "{}");
        let diags = check_http_error::<_, String>(Ok(&ok), "Unable to put script");
        assert!(diags.is_empty());
        assert!(check_error::<_, String>(Ok(&ok), "Unable to put script").is_empty());
    }

    #[test]
    fn test_error_status_carries_body() {
        let bad = Canned(400, r#"{"error":"illegal_argument_exception"}"#);
        let diags = check_http_error::<_, String>(Ok(&bad), "Unable to put script");

        assert_eq!(diags.error_count(), 1);
        let detail = diags.errors().next().map(|d| d.detail.clone());
        assert_eq!(detail.as_deref(), Some(r#"{"error":"illegal_argument_exception"}"#));
    }

    #[test]
    fn test_empty_body_mentions_status() {
        let bad = Canned(503, "");
        let diags = check_http_status(&bad, "Unable to reach cluster");
        let detail = diags.errors().next().map(|d| d.detail.clone());
        assert_eq!(detail.as_deref(), Some("HTTP status 503"));
    }

    #[test]
    fn test_transport_error() {
        let err = "connection refused".to_string();
        let diags = check_error::<Canned, _>(Err(&err), "Unable to read job");
        assert!(diags.has_error());
        assert_eq!(diags.iter().next().map(|d| d.detail.as_str()), Some("connection refused"));
    }
}
