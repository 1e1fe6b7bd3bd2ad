use crate::models::{BookStatus, RequestStatus};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Errors surfaced by library operations. Every variant is terminal for
/// the triggering call; the message is shown to the end user verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    BookNotFound,
    RequestNotFound(u32),
    DuplicateRequest,
    InvalidTransition(RequestStatus),
    LimitExceeded(usize),
    InvalidCredentials,
    InvalidState(BookStatus),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::BookNotFound => {
                write!(f, "Book not found. Please check the Book ID or Book Name.")
            }
            LibraryError::RequestNotFound(id) => write!(f, "Request {id} not found"),
            LibraryError::DuplicateRequest => {
                write!(f, "You already have an active request for this book")
            }
            LibraryError::InvalidTransition(status) => {
                write!(f, "Request is already {status}")
            }
            LibraryError::LimitExceeded(max) => {
                write!(f, "Active request limit reached ({max} books)")
            }
            LibraryError::InvalidCredentials => write!(f, "Invalid credentials"),
            LibraryError::InvalidState(_) => write!(f, "Book is not available for issue"),
        }
    }
}

impl std::error::Error for LibraryError {}

impl ResponseError for LibraryError {
    fn status_code(&self) -> StatusCode {
        match self {
            LibraryError::BookNotFound | LibraryError::RequestNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LibraryError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LibraryError::DuplicateRequest
            | LibraryError::InvalidTransition(_)
            | LibraryError::LimitExceeded(_)
            | LibraryError::InvalidState(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
