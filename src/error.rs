// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chain::ClockError;
use crate::ledger::LedgerError;
use crate::service::ServiceError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
    /// Numeric ledger error code, 0 for transport-level failures.
    pub code: u32,
}

/// JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
    pub code: u32,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
            code: 0,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotManager
            | LedgerError::UnauthorizedSponsorOperator
            | LedgerError::UnauthorizedFeeCollector => StatusCode::FORBIDDEN,
            LedgerError::InsufficientFunds { .. }
            | LedgerError::InsufficientFundsForFee { .. }
            | LedgerError::InsufficientFeeBalance { .. } => StatusCode::CONFLICT,
            LedgerError::ExternalTransferFailed(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
            error_code: err.error_code(),
            code: err.code(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Ledger(err) => err.into(),
            ServiceError::Clock(err) => {
                let error_code = match err {
                    ClockError::NotManual => "clock_not_manual",
                    ClockError::ZeroAdvance | ClockError::ZeroInterval => "invalid_advance",
                    ClockError::Overflow => "height_overflow",
                };
                Self::new(StatusCode::BAD_REQUEST, error_code, err.to_string())
            }
            ServiceError::Degraded => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "storage_degraded",
                err.to_string(),
            ),
            // storage details stay in the logs
            ServiceError::Storage(_) => Self::internal("ledger storage failure"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code.to_string(),
            code: self.code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TokenError;
    use axum::body::to_bytes;

    #[test]
    fn ledger_errors_map_to_status() {
        let cases = [
            (LedgerError::PreconditionFailed("zero"), StatusCode::BAD_REQUEST),
            (LedgerError::NotManager, StatusCode::FORBIDDEN),
            (LedgerError::UnauthorizedSponsorOperator, StatusCode::FORBIDDEN),
            (
                LedgerError::InsufficientFunds {
                    requested: 2,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::ExternalTransferFailed(TokenError::SenderIsRecipient),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn degraded_service_is_unavailable() {
        let err = ApiError::from(ServiceError::Degraded);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code, "storage_degraded");
    }

    #[tokio::test]
    async fn into_response_carries_ledger_code() {
        let response = ApiError::from(LedgerError::InsufficientFundsForFee { amount: 9, fee: 10 })
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "insufficient_funds_for_fee");
        assert_eq!(body["code"], 4002);
        assert_eq!(body["error"], "amount 9 does not cover fee 10");
    }

    #[tokio::test]
    async fn transport_errors_have_zero_code() {
        let response = ApiError::bad_request("bad data").into_response();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"error":"bad data","error_code":"bad_request","code":0}"#
        );
    }
}
