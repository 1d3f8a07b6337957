use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No prizes available")]
    NoPrizesAvailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Draw failed: {0}")]
    DrawFailed(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(DbErr),

    #[error("Connection pool exhausted: {0}")]
    ConnectionExhaustion(DbErr),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) => AppError::ConnectionExhaustion(err),
            other => AppError::PersistenceFailure(other),
        }
    }
}

impl AppError {
    /// 对外暴露的错误码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoPrizesAvailable => "NO_PRIZES_AVAILABLE",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::DrawFailed(_) => "DRAW_FAILED",
            AppError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            AppError::ConnectionExhaustion(_) => "CONNECTION_EXHAUSTION",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoPrizesAvailable | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ConnectionExhaustion(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::NoPrizesAvailable => {
                log::warn!("Draw rejected: no prizes available");
                "No prizes available".to_string()
            }
            AppError::InvalidInput(msg) => {
                log::warn!("Invalid input: {msg}");
                msg.clone()
            }
            AppError::DrawFailed(msg) => {
                log::error!("Draw failed: {msg}");
                "Draw failed".to_string()
            }
            AppError::PersistenceFailure(err) => {
                log::error!("Persistence failure: {err}");
                "Persistence failure".to_string()
            }
            AppError::ConnectionExhaustion(err) => {
                log::error!("Connection pool exhausted: {err}");
                "Service busy, try again later".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnAcquireErr;

    #[test]
    fn test_business_errors_are_bad_request() {
        assert_eq!(
            AppError::NoPrizesAvailable.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidInput("name".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_db_errors_are_classified() {
        let err: AppError = DbErr::ConnectionAcquire(ConnAcquireErr::Timeout).into();
        assert!(matches!(err, AppError::ConnectionExhaustion(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: AppError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, AppError::PersistenceFailure(_)));
        assert_eq!(err.code(), "PERSISTENCE_FAILURE");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
