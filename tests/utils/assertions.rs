//! Test assertion helpers - fluent API for verifying responses
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::http::StatusCode;
use serde_json::Value;

use sessiongate::middleware::REQUEST_ID_HEADER;

use super::actions::TestResponse;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct ResponseAssertion<'a> {
    response: &'a TestResponse,
}

impl<'a> ResponseAssertion<'a> {
    pub fn of(response: &'a TestResponse) -> Self {
        Self { response }
    }

    pub fn has_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.response.body)
        );
        self
    }

    /// Assert the body is exactly `{"error": "<expected>"}`
    pub fn has_error(self, expected: &str) -> Self {
        assert_eq!(self.response.json(), serde_json::json!({ "error": expected }));
        self
    }

    pub fn has_request_id(self) -> Self {
        let id = self
            .response
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        assert!(
            id.is_some_and(|id| uuid::Uuid::parse_str(id).is_ok()),
            "missing or malformed request id: {:?}",
            id
        );
        self
    }

    pub fn sets_session_cookie(self) -> Self {
        assert!(
            self.response.session_token().is_some(),
            "expected a session cookie"
        );
        self
    }

    pub fn sets_no_cookie(self) -> Self {
        assert!(self.response.session_token().is_none(), "unexpected session cookie");
        self
    }

    /// Returns the `data` member of a success envelope
    pub fn data(self) -> Value {
        self.response.json()["data"].clone()
    }

    pub fn metadata(self) -> Value {
        self.response.json()["metadata"].clone()
    }
}
