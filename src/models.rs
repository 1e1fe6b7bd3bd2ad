use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Reserved,
    Issued,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookStatus::Available => write!(f, "available"),
            BookStatus::Reserved => write!(f, "reserved"),
            BookStatus::Issued => write!(f, "issued"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: u32,
    pub tag_id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub bin_id: u32,
    pub status: BookStatus,
    pub holder: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Denormalized display fields carried on a request so the UI can render
/// it without a catalog lookup. Refreshed on every ledger read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub id: u32,
    pub tag_id: String,
    pub title: String,
    pub author: String,
}

impl From<&Book> for BookSnapshot {
    fn from(book: &Book) -> Self {
        BookSnapshot {
            id: book.id,
            tag_id: book.tag_id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Approved => write!(f, "approved"),
            RequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u32,
    pub student_id: u32,
    pub book_id: u32,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub book: Option<BookSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub field_of_study: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User record as handed back to callers, with the password stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub field_of_study: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role,
            field_of_study: self.field_of_study.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueReceipt {
    pub book: Book,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub student_id: u32,
    pub book_ids: Vec<u32>,
    pub generated_at: DateTime<Utc>,
    pub books: Vec<BookSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotState {
    Idle,
    Moving,
    Retrieving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinState {
    Available,
    Retrieving,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bin {
    pub id: u32,
    pub location: String,
    pub status: BinState,
    pub books_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotStatus {
    pub status: RobotState,
    pub current_bin: Option<u32>,
    pub target_bin: Option<u32>,
    pub battery_level: u8,
    pub last_activity: DateTime<Utc>,
    pub bins: Vec<Bin>,
}
