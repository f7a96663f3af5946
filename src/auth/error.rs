// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller identification errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Rejection for requests without a usable caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `X-Principal` header present
    MissingPrincipal,
    /// `X-Principal` is not a valid principal
    InvalidPrincipal(String),
    /// `X-Sponsor` is present but not a valid principal
    InvalidSponsor(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingPrincipal => "missing_principal",
            AuthError::InvalidPrincipal(_) => "invalid_principal",
            AuthError::InvalidSponsor(_) => "invalid_sponsor",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingPrincipal => write!(f, "X-Principal header is required"),
            AuthError::InvalidPrincipal(msg) => write!(f, "Invalid X-Principal header: {msg}"),
            AuthError::InvalidSponsor(msg) => write!(f, "Invalid X-Sponsor header: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
