//! Page and action envelopes shared by the handlers.
//!
//! Read handlers never fail: a query error is logged and the page renders
//! its defaults with an `error` banner instead.

use serde::Serialize;
use std::fmt::Display;

use crate::extractors::session::{SessionContext, Viewer};

/// A rendered page: the caller, the page's view model and an optional banner.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub viewer: Viewer,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Page<T> {
    pub fn new(session: &SessionContext, data: T) -> Self {
        Self {
            viewer: session.viewer(),
            data,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

impl<T: Default> Page<T> {
    /// Page from a query result, falling back to defaults plus a banner.
    pub fn load<E: Display>(session: &SessionContext, result: Result<T, E>, what: &str) -> Self {
        let (data, error) = degrade(result, what);
        Self::new(session, data).with_error(error)
    }
}

/// Result of a mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
            redirect: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }
}

/// Splits a query result into a value and a banner message.
pub fn degrade<T: Default, E: Display>(result: Result<T, E>, what: &str) -> (T, Option<String>) {
    match result {
        Ok(value) => (value, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load {}", what);
            (T::default(), Some(banner(what)))
        }
    }
}

pub fn banner(what: &str) -> String {
    format!("Unable to load {}. Please try again later.", what)
}
