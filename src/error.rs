use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid token format")]
    InvalidTokenFormat,
}

impl Error {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::Conflict(_) => "conflict",
            Error::Validation(_) => "validation_error",
            Error::InvalidState(_) => "invalid_state",
            Error::Unauthorized(_) | Error::InvalidTokenFormat => "unauthorized",
            _ => "server_error",
        }
    }
}

// Constraint failures raised by SQLite keep their domain meaning.
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        let constraint = match &err {
            rusqlite::Error::SqliteFailure(failure, detail)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = detail
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string());
                Some((failure.extended_code, detail))
            }
            _ => None,
        };

        match constraint {
            Some((ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY, detail)) => {
                Error::Conflict(detail)
            }
            Some((ffi::SQLITE_CONSTRAINT_FOREIGNKEY | ffi::SQLITE_CONSTRAINT_CHECK, detail)) => {
                Error::Validation(detail)
            }
            _ => Error::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotFound("x".into()).code(), "not_found");
        assert_eq!(Error::Conflict("x".into()).code(), "conflict");
        assert_eq!(Error::Unauthorized("x".into()).code(), "unauthorized");
        assert_eq!(Error::InvalidTokenFormat.code(), "unauthorized");
        assert_eq!(Error::TokenLookupCollision.code(), "server_error");
        assert_eq!(Error::Config("x".into()).code(), "server_error");
    }
}
