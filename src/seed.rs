use crate::models::{Book, BookStatus, Role, User};
use chrono::Utc;

/// Starter catalog so a fresh instance is browsable immediately.
pub fn books() -> Vec<Book> {
    let entries = [
        ("NFC-001", "The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 1),
        ("NFC-002", "To Kill a Mockingbird", "Harper Lee", "Fiction", 1),
        ("NFC-003", "1984", "George Orwell", "Fiction", 2),
        ("NFC-004", "Pride and Prejudice", "Jane Austen", "Fiction", 2),
        ("NFC-005", "The Catcher in the Rye", "J.D. Salinger", "Fiction", 3),
        ("NFC-006", "Clean Code", "Robert C. Martin", "Computer Science", 4),
        (
            "NFC-007",
            "Introduction to Algorithms",
            "Thomas H. Cormen",
            "Computer Science",
            4,
        ),
        ("NFC-008", "A Brief History of Time", "Stephen Hawking", "Physics", 5),
    ];
    entries
        .iter()
        .enumerate()
        .map(|(index, (tag_id, title, author, genre, bin_id))| Book {
            id: index as u32 + 1,
            tag_id: tag_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            bin_id: *bin_id,
            status: BookStatus::Available,
            holder: None,
            created_at: Utc::now(),
        })
        .collect()
}

pub fn users() -> Vec<User> {
    let now = Utc::now();
    vec![
        User {
            id: 1,
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@student.edu".into(),
            password: "password123".into(),
            role: Role::Student,
            field_of_study: Some("Computer Science".into()),
            created_at: now,
        },
        User {
            id: 2,
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            email: "jane.smith@student.edu".into(),
            password: "password123".into(),
            role: Role::Student,
            field_of_study: Some("Physics".into()),
            created_at: now,
        },
        User {
            id: 3,
            first_name: "Ada".into(),
            last_name: "Admin".into(),
            email: "admin@library.edu".into(),
            password: "admin123".into(),
            role: Role::Admin,
            field_of_study: None,
            created_at: now,
        },
    ]
}
