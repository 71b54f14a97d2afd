use rocket::http::Status;
use rocket::response::Responder;
use serde::Serialize;
use shared::{uri::UriError, validation::ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Projection lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to connect to relay: {0}")]
    Connect(tokio_tungstenite::tungstenite::Error),
    #[error("Relay stream error: {0}")]
    Stream(tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepoError {
    #[error("Repository write rejected: {0}")]
    Rejected(String),
    #[error("Repository unreachable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),
    #[error("Poll not found")]
    PollNotFound,
    #[error(transparent)]
    InvalidUri(#[from] UriError),
    #[error(transparent)]
    Repository(#[from] RepoError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, Serialize)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid record URI")]
    InvalidUri,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match self {
            ApiError::NotFound => Status::NotFound,
            ApiError::InvalidUri => Status::BadRequest,
            ApiError::Internal(_) => Status::InternalServerError,
        };

        rocket::Response::build_from(self.to_string().respond_to(req)?)
            .status(status)
            .ok()
    }
}
