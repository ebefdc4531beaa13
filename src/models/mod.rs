//! Data models for the Local Library

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod user;

use chrono::NaiveDate;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use book_instance::{BookInstance, BookInstanceStatus};
pub use genre::Genre;
pub use user::{Principal, Role, User};

/// Medium-length display form, e.g. "Oct 19, 2026"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
