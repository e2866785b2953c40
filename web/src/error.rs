use std::convert::From;

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use db::{DbError, Entity};

/// Error type for the API.
///
/// Every variant renders a fixed message. Details of internal failures are
/// logged when the error is created and never reach the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Libro no encontrado")]
    BookNotFound,

    #[error("Capítulo no encontrado")]
    ChapterNotFound,

    #[error("Versículo no encontrado")]
    VerseNotFound,

    #[error("Recurso no encontrado")]
    RouteNotFound,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Error interno del servidor")]
    Internal,
}

/// Error body, rendered as `{"error": "..."}`.
#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct ErrorData {
    pub error: String,
}

impl ErrorData {
    pub fn from_error(e: &Error) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { entity } => match entity {
                Entity::Book => Error::BookNotFound,
                Entity::Chapter => Error::ChapterNotFound,
                Entity::Verse => Error::VerseNotFound,
            },
            e => {
                error!("{}", e);
                Error::Internal
            }
        }
    }
}

impl From<BlockingError> for Error {
    fn from(e: BlockingError) -> Self {
        error!("Blocking task failed: {}", e);
        Error::Internal
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::BookNotFound
            | Error::ChapterNotFound
            | Error::VerseNotFound
            | Error::RouteNotFound => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorData::from_error(self))
    }
}
