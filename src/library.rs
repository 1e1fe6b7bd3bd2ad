use crate::catalog::Catalog;
use crate::error::LibraryError;
use crate::identity::{Identity, NewUser};
use crate::ledger::Ledger;
use crate::models::{
    Book, BookSnapshot, BookStatus, IssueReceipt, Recommendation, Request, RequestStatus, Session,
};
use crate::storage::Storage;
use crate::{robot, seed};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Admin decision on a pending request. Moving a request back to pending
/// is not a thing, so it is unrepresentable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

struct State {
    catalog: Catalog,
    ledger: Ledger,
    identity: Identity,
}

/// Facade over the catalog, request ledger and identity store. One mutex
/// guards the whole state so no two operations ever interleave
/// mid-mutation; every method runs to completion under the lock.
pub struct Library {
    state: Mutex<State>,
}

impl Library {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Library {
            state: Mutex::new(State {
                catalog: Catalog::new(),
                ledger: Ledger::new(storage),
                identity: Identity::new(),
            }),
        }
    }

    /// A library pre-populated with the starter catalog and users.
    pub fn seeded(storage: Box<dyn Storage>) -> Self {
        Library {
            state: Mutex::new(State {
                catalog: Catalog::seeded(seed::books()),
                ledger: Ledger::new(storage),
                identity: Identity::seeded(seed::users()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session, LibraryError> {
        self.state().identity.authenticate(email, password)
    }

    pub fn register(&self, fields: NewUser) -> Session {
        self.state().identity.register(fields)
    }

    pub fn list_books(&self, filter: &str) -> Vec<Book> {
        self.state().catalog.list(filter)
    }

    pub fn get_book(&self, id: u32) -> Result<Book, LibraryError> {
        self.state()
            .catalog
            .get(id)
            .cloned()
            .ok_or(LibraryError::BookNotFound)
    }

    pub fn add_book(&self, title: &str, author: &str, tag_id: &str, bin_id: u32) -> Book {
        self.state().catalog.add(title, author, tag_id, bin_id)
    }

    pub fn list_requests(
        &self,
        student_id: Option<u32>,
        status: Option<RequestStatus>,
    ) -> Vec<Request> {
        let state = self.state();
        state.ledger.list(&state.catalog, student_id, status)
    }

    pub fn create_request(&self, student_id: u32, book_id: u32) -> Result<Request, LibraryError> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.ledger.create(&state.catalog, student_id, book_id)
    }

    /// Approves or rejects a pending request and reconciles the book in
    /// the same critical section, so callers never observe one side of
    /// the transition without the other.
    pub fn set_request_status(
        &self,
        request_id: u32,
        decision: Decision,
    ) -> Result<Request, LibraryError> {
        let mut guard = self.state();
        let state = &mut *guard;

        let (student_id, book_id, status) = {
            let request = state
                .ledger
                .get(request_id)
                .ok_or(LibraryError::RequestNotFound(request_id))?;
            (request.student_id, request.book_id, request.status)
        };
        if status != RequestStatus::Pending {
            return Err(LibraryError::InvalidTransition(status));
        }
        // Make sure the book resolves before mutating either side.
        state.catalog.get(book_id).ok_or(LibraryError::BookNotFound)?;

        let now = chrono::Utc::now();
        let request = match decision {
            Decision::Approved => {
                let request = state
                    .ledger
                    .set_status(request_id, RequestStatus::Approved, now)?;
                state
                    .catalog
                    .set_status(book_id, BookStatus::Issued, Some(student_id))?;
                request
            }
            Decision::Rejected => {
                let request = state
                    .ledger
                    .set_status(request_id, RequestStatus::Rejected, now)?;
                state.catalog.set_status(book_id, BookStatus::Available, None)?;
                request
            }
        };
        Ok(request)
    }

    /// Issues a book at the kiosk, bypassing the request flow. The
    /// identifier may be a tag id, a numeric id, or an exact title.
    pub fn direct_issue(
        &self,
        identifier: &str,
        student_id: u32,
    ) -> Result<IssueReceipt, LibraryError> {
        let mut guard = self.state();
        let state = &mut *guard;

        let (book_id, was_available, snapshot) = {
            let book = state
                .catalog
                .resolve(identifier)
                .ok_or(LibraryError::BookNotFound)?;
            if book.status == BookStatus::Issued {
                return Err(LibraryError::InvalidState(book.status));
            }
            (
                book.id,
                book.status == BookStatus::Available,
                BookSnapshot::from(book),
            )
        };
        // A walk-up issue of a shelved book still leaves a trail in the
        // student's request history.
        if was_available {
            state
                .ledger
                .track_direct_issue(student_id, book_id, snapshot);
        }
        let book = state
            .catalog
            .set_status(book_id, BookStatus::Issued, Some(student_id))?;
        Ok(IssueReceipt {
            book,
            due_date: chrono::Utc::now() + chrono::Duration::days(LOAN_PERIOD_DAYS),
        })
    }

    /// Returns a book at the kiosk. The returner is not checked against
    /// the current holder; the kiosk is trusted (see DESIGN.md).
    pub fn direct_return(&self, identifier: &str) -> Result<Book, LibraryError> {
        let mut guard = self.state();
        let state = &mut *guard;
        let book_id = state
            .catalog
            .resolve(identifier)
            .ok_or(LibraryError::BookNotFound)?
            .id;
        state
            .catalog
            .set_status(book_id, BookStatus::Available, None)
    }

    pub fn top_books_by_genre(&self) -> BTreeMap<String, Vec<Book>> {
        self.state().catalog.top_by_genre()
    }

    pub fn recommendations(
        &self,
        student_id: u32,
        field_of_study: Option<&str>,
    ) -> Option<Recommendation> {
        let state = self.state();
        let books = field_of_study
            .map(|field| state.catalog.recommend(field))
            .unwrap_or_default();
        if books.is_empty() {
            return None;
        }
        Some(Recommendation {
            student_id,
            book_ids: books.iter().map(|book| book.id).collect(),
            generated_at: chrono::Utc::now(),
            books,
        })
    }

    pub fn robot_status(&self) -> crate::models::RobotStatus {
        robot::status()
    }
}

#[cfg(test)]
mod test {
    use super::{Decision, Library};
    use crate::error::LibraryError;
    use crate::ledger::MAX_ACTIVE_REQUESTS;
    use crate::models::{BookStatus, RequestStatus};
    use crate::storage::MemoryStorage;
    use chrono::Utc;

    fn library() -> Library {
        Library::seeded(Box::new(MemoryStorage::new()))
    }

    fn assert_holder_iff_issued(library: &Library) {
        for book in library.list_books("") {
            assert_eq!(
                book.holder.is_some(),
                book.status == BookStatus::Issued,
                "book {} violates the holder/status invariant",
                book.id
            );
        }
    }

    #[test]
    fn test_holder_set_iff_issued_across_operations() {
        let library = library();
        assert_holder_iff_issued(&library);

        let request = library.create_request(1, 1).unwrap();
        assert_holder_iff_issued(&library);

        library
            .set_request_status(request.id, Decision::Approved)
            .unwrap();
        assert_holder_iff_issued(&library);

        library.direct_issue("NFC-002", 2).unwrap();
        assert_holder_iff_issued(&library);

        library.direct_return("NFC-001").unwrap();
        library.direct_return("NFC-002").unwrap();
        assert_holder_iff_issued(&library);
    }

    #[test]
    fn test_approve_updates_request_and_book_together() {
        let library = library();
        let request = library.create_request(1, 3).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.approved_at, None);

        let approved = library
            .set_request_status(request.id, Decision::Approved)
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert!(approved.approved_at.is_some());

        let book = library.get_book(3).unwrap();
        assert_eq!(book.status, BookStatus::Issued);
        assert_eq!(book.holder, Some(1));
    }

    #[test]
    fn test_reject_leaves_book_available_and_allows_rerequest() {
        let library = library();
        let request = library.create_request(1, 3).unwrap();
        library
            .set_request_status(request.id, Decision::Rejected)
            .unwrap();

        let book = library.get_book(3).unwrap();
        assert_eq!(book.status, BookStatus::Available);
        assert_eq!(book.holder, None);

        // A rejected request does not block a fresh one.
        library.create_request(1, 3).unwrap();
    }

    #[test]
    fn test_approved_unreturned_request_blocks_rerequest() {
        let library = library();
        let request = library.create_request(1, 3).unwrap();
        library
            .set_request_status(request.id, Decision::Approved)
            .unwrap();

        // The book is out with the student, so the pair still holds an
        // active request.
        let err = library.create_request(1, 3).unwrap_err();
        assert_eq!(err, LibraryError::DuplicateRequest);

        // Once the book is back on the shelf the pair is free again.
        library.direct_return("NFC-003").unwrap();
        library.create_request(1, 3).unwrap();
    }

    #[test]
    fn test_decided_request_cannot_be_decided_again() {
        let library = library();
        let request = library.create_request(1, 1).unwrap();
        library
            .set_request_status(request.id, Decision::Approved)
            .unwrap();
        let err = library
            .set_request_status(request.id, Decision::Rejected)
            .unwrap_err();
        assert_eq!(err, LibraryError::InvalidTransition(RequestStatus::Approved));

        let err = library.set_request_status(999, Decision::Approved).unwrap_err();
        assert_eq!(err, LibraryError::RequestNotFound(999));
    }

    #[test]
    fn test_direct_issue_of_available_book_creates_tracking_request() {
        let library = library();
        let receipt = library.direct_issue("NFC-003", 7).unwrap();
        assert_eq!(receipt.book.status, BookStatus::Issued);
        assert_eq!(receipt.book.holder, Some(7));
        assert!(receipt.due_date > Utc::now() + chrono::Duration::days(13));

        let history = library.list_requests(Some(7), Some(RequestStatus::Approved));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].book_id, receipt.book.id);
        assert!(history[0].approved_at.is_some());

        let book = library.direct_return("NFC-003").unwrap();
        assert_eq!(book.status, BookStatus::Available);
        assert_eq!(book.holder, None);
    }

    #[test]
    fn test_direct_issue_auto_approves_existing_pending_request() {
        let library = library();
        let request = library.create_request(1, 3).unwrap();
        library.direct_issue("NFC-003", 1).unwrap();

        let requests = library.list_requests(Some(1), None);
        assert_eq!(requests.len(), 1, "no second request is fabricated");
        assert_eq!(requests[0].id, request.id);
        assert_eq!(requests[0].status, RequestStatus::Approved);
    }

    #[test]
    fn test_direct_issue_refuses_issued_book_and_unknown_identifier() {
        let library = library();
        library.direct_issue("NFC-001", 1).unwrap();
        let err = library.direct_issue("NFC-001", 2).unwrap_err();
        assert_eq!(err, LibraryError::InvalidState(BookStatus::Issued));

        let err = library.direct_issue("NFC-999", 1).unwrap_err();
        assert_eq!(err, LibraryError::BookNotFound);
    }

    #[test]
    fn test_direct_return_does_not_check_the_holder() {
        let library = library();
        library.direct_issue("NFC-001", 1).unwrap();
        // Anyone can drop a book into the return slot.
        let book = library.direct_return("The Great Gatsby").unwrap();
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn test_limit_recovers_only_after_a_request_is_resolved_away() {
        let library = library();
        let first = library.create_request(1, 1).unwrap();
        for book_id in 2..=MAX_ACTIVE_REQUESTS as u32 {
            library.create_request(1, book_id).unwrap();
        }
        let err = library.create_request(1, 6).unwrap_err();
        assert_eq!(err, LibraryError::LimitExceeded(MAX_ACTIVE_REQUESTS));

        // Approval keeps the request active while the book is out.
        library.set_request_status(first.id, Decision::Approved).unwrap();
        let err = library.create_request(1, 6).unwrap_err();
        assert_eq!(err, LibraryError::LimitExceeded(MAX_ACTIVE_REQUESTS));

        // Once the book comes back the slot frees up.
        library.direct_return("NFC-001").unwrap();
        library.create_request(1, 6).unwrap();
    }

    #[test]
    fn test_added_book_is_requestable() {
        let library = library();
        let book = library.add_book("Dune", "Frank Herbert", "NFC-100", 6);
        assert_eq!(book.status, BookStatus::Available);
        let request = library.create_request(2, book.id).unwrap();
        assert_eq!(request.book.as_ref().unwrap().tag_id, "NFC-100");

        let err = library.create_request(2, 9999).unwrap_err();
        assert_eq!(err, LibraryError::BookNotFound);
    }

    #[test]
    fn test_recommendations_follow_field_of_study() {
        let library = library();
        let rec = library.recommendations(1, Some("Computer Science")).unwrap();
        assert_eq!(rec.student_id, 1);
        assert_eq!(rec.book_ids.len(), 2);
        assert!(library.recommendations(1, None).is_none());
        assert!(library.recommendations(1, Some("Botany")).is_none());

        // Issued books drop out of the recommendation pool.
        library.direct_issue("NFC-006", 1).unwrap();
        library.direct_issue("NFC-007", 2).unwrap();
        assert!(library.recommendations(1, Some("Computer Science")).is_none());
    }

    #[test]
    fn test_top_books_by_genre_caps_at_three_available() {
        let library = library();
        let top = library.top_books_by_genre();
        assert_eq!(top["Fiction"].len(), 3);
        assert_eq!(top["Physics"].len(), 1);

        library.direct_issue("NFC-008", 1).unwrap();
        let top = library.top_books_by_genre();
        assert!(!top.contains_key("Physics"));
    }
}
