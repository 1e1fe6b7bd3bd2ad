use crate::error::LibraryError;
use crate::models::{Role, Session, User};
use base64::Engine;
use chrono::Utc;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub field_of_study: Option<String>,
}

/// Registered users. Records are immutable once created and never
/// deleted. Email uniqueness is not enforced (see DESIGN.md).
#[derive(Debug, Default)]
pub struct Identity {
    users: Vec<User>,
    next_id: u32,
}

impl Identity {
    pub fn new() -> Self {
        Identity {
            users: Vec::new(),
            next_id: 1,
        }
    }

    pub fn seeded(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|user| user.id + 1).max().unwrap_or(1);
        Identity { users, next_id }
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<Session, LibraryError> {
        let user = self
            .users
            .iter()
            .find(|user| user.email == email && user.password == password)
            .ok_or(LibraryError::InvalidCredentials)?;
        Ok(Session {
            user: user.view(),
            token: issue_token(),
        })
    }

    pub fn register(&mut self, fields: NewUser) -> Session {
        let user = User {
            id: self.next_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            password: fields.password,
            role: fields.role,
            field_of_study: fields.field_of_study,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.users.push(user.clone());
        Session {
            user: user.view(),
            token: issue_token(),
        }
    }
}

fn issue_token() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill(&mut buf);
    base64::engine::general_purpose::STANDARD.encode(buf)
}
