use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tally_core::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid x-owner-id header")]
    Unauthorized,

    #[error("You recently entered this transaction. Please enter a new one.")]
    RecentInput,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RecentInput => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(e) => match e {
                LedgerError::InputInvalid(_) => StatusCode::BAD_REQUEST,
                LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::DuplicateExact(_)
                | LedgerError::DuplicateSimilar(_)
                | LedgerError::PersistenceConflict => StatusCode::CONFLICT,
                LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable code for the conflict responses.
    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::RecentInput => Some("RECENT_INPUT"),
            ApiError::Ledger(LedgerError::DuplicateExact(_) | LedgerError::PersistenceConflict) => {
                Some("DUPLICATE_TRANSACTION")
            }
            ApiError::Ledger(LedgerError::DuplicateSimilar(_)) => Some("SIMILAR_TRANSACTION"),
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if let ApiError::Ledger(LedgerError::Store(detail)) = &self {
            tracing::error!(error = %detail, "ledger store failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if let Some(code) = self.code() {
            body["code"] = json!(code);
        }
        if let ApiError::Ledger(e) = &self {
            if let Some(id) = e.duplicate_of() {
                body["duplicateId"] = json!(id.to_string());
            }
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::TransactionId;

    async fn body_of(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn exact_duplicate_is_conflict_with_id() {
        let id = TransactionId::generate();
        let (status, body) = body_of(LedgerError::DuplicateExact(id).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_TRANSACTION");
        assert_eq!(body["duplicateId"], id.to_string());
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn similar_duplicate_has_its_own_code() {
        let id = TransactionId::generate();
        let (status, body) = body_of(LedgerError::DuplicateSimilar(id).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "SIMILAR_TRANSACTION");
        assert_eq!(body["duplicateId"], id.to_string());
    }

    #[tokio::test]
    async fn persistence_conflict_reads_as_exact_duplicate() {
        let (status, body) = body_of(LedgerError::PersistenceConflict.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_TRANSACTION");
        assert!(body.get("duplicateId").is_none());
    }

    #[tokio::test]
    async fn store_failure_hides_detail() {
        let (status, body) = body_of(LedgerError::Store("disk I/O error".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::RecentInput.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::RecentInput.code(), Some("RECENT_INPUT"));
        assert_eq!(
            ApiError::from(LedgerError::InputInvalid("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LedgerError::NotFound(TransactionId::generate())).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
