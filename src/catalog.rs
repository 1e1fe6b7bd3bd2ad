use crate::error::LibraryError;
use crate::models::{Book, BookSnapshot, BookStatus};
use chrono::Utc;
use std::collections::BTreeMap;

/// In-memory book catalog. Owns every `Book` record; other components
/// mutate book state only through `set_status`.
#[derive(Debug, Default)]
pub struct Catalog {
    books: Vec<Book>,
    next_id: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            books: Vec::new(),
            next_id: 1,
        }
    }

    pub fn seeded(books: Vec<Book>) -> Self {
        let next_id = books.iter().map(|book| book.id + 1).max().unwrap_or(1);
        Catalog { books, next_id }
    }

    /// Case-insensitive substring match over title, author and tag id.
    /// An empty filter returns the whole catalog in insertion order.
    pub fn list(&self, filter: &str) -> Vec<Book> {
        if filter.is_empty() {
            return self.books.clone();
        }
        let needle = filter.to_lowercase();
        self.books
            .iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
                    || book.tag_id.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    /// Resolves a book by tag id, numeric id, or exact case-insensitive
    /// title. First match in catalog order wins.
    pub fn resolve(&self, identifier: &str) -> Option<&Book> {
        let numeric: Option<u32> = identifier.trim().parse().ok();
        self.books.iter().find(|book| {
            book.tag_id == identifier
                || numeric == Some(book.id)
                || book.title.eq_ignore_ascii_case(identifier)
        })
    }

    pub fn add(&mut self, title: &str, author: &str, tag_id: &str, bin_id: u32) -> Book {
        let book = Book {
            id: self.next_id,
            tag_id: tag_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre: String::new(),
            bin_id,
            status: BookStatus::Available,
            holder: None,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.books.push(book.clone());
        book
    }

    pub fn set_status(
        &mut self,
        book_id: u32,
        status: BookStatus,
        holder: Option<u32>,
    ) -> Result<Book, LibraryError> {
        let book = self
            .books
            .iter_mut()
            .find(|book| book.id == book_id)
            .ok_or(LibraryError::BookNotFound)?;
        book.status = status;
        book.holder = holder;
        Ok(book.clone())
    }

    /// Up to three available books per genre, in catalog order.
    pub fn top_by_genre(&self) -> BTreeMap<String, Vec<Book>> {
        let mut map: BTreeMap<String, Vec<Book>> = BTreeMap::new();
        for book in &self.books {
            if book.status != BookStatus::Available || book.genre.is_empty() {
                continue;
            }
            let entry = map.entry(book.genre.clone()).or_default();
            if entry.len() < 3 {
                entry.push(book.clone());
            }
        }
        map
    }

    /// Up to six available books matching a field of study.
    pub fn recommend(&self, field_of_study: &str) -> Vec<BookSnapshot> {
        self.books
            .iter()
            .filter(|book| book.genre == field_of_study && book.status == BookStatus::Available)
            .take(6)
            .map(BookSnapshot::from)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::Catalog;
    use crate::models::BookStatus;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add("The Great Gatsby", "F. Scott Fitzgerald", "NFC-001", 1);
        catalog.add("1984", "George Orwell", "NFC-003", 2);
        catalog.add("The Catcher in the Rye", "J.D. Salinger", "NFC-005", 3);
        catalog
    }

    #[test]
    fn test_list_filters_all_fields_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.list("").len(), 3);
        assert_eq!(catalog.list("gatsby").len(), 1);
        assert_eq!(catalog.list("ORWELL").len(), 1);
        assert_eq!(catalog.list("nfc-00").len(), 3);
        assert_eq!(catalog.list("no such book").len(), 0);
    }

    #[test]
    fn test_add_assigns_sequential_ids_and_forces_available() {
        let mut catalog = catalog();
        let book = catalog.add("Dune", "Frank Herbert", "NFC-009", 4);
        assert_eq!(book.id, 4);
        assert_eq!(book.status, BookStatus::Available);
        assert_eq!(book.holder, None);
    }

    #[test]
    fn test_resolve_by_tag_id_numeric_id_or_title() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("NFC-003").map(|b| b.id), Some(2));
        assert_eq!(catalog.resolve("3").map(|b| b.id), Some(3));
        assert_eq!(catalog.resolve("the catcher in the rye").map(|b| b.id), Some(3));
        assert!(catalog.resolve("NFC-999").is_none());
    }

    #[test]
    fn test_resolve_prefers_first_match_in_catalog_order() {
        let mut catalog = Catalog::new();
        catalog.add("1", "Somebody", "NFC-010", 1);
        // "1" resolves the first book by title before the numeric id of
        // any later book.
        catalog.add("Other", "Somebody", "1", 1);
        assert_eq!(catalog.resolve("1").map(|b| b.id), Some(1));
    }
}
