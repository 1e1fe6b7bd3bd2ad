use crate::catalog::Catalog;
use crate::error::LibraryError;
use crate::models::{BookSnapshot, BookStatus, Request, RequestStatus};
use crate::storage::Storage;
use chrono::{DateTime, Utc};

pub const REQUESTS_KEY: &str = "libra_requests";

/// Most requests a student may have active at once. A request is active
/// while pending, or while approved and its book is not yet back on the
/// shelf.
pub const MAX_ACTIVE_REQUESTS: usize = 5;

/// Book-request ledger. Owns every `Request` record and mirrors the full
/// collection into the scoped key-value store after each mutation.
pub struct Ledger {
    requests: Vec<Request>,
    next_id: u32,
    storage: Box<dyn Storage>,
}

impl Ledger {
    /// Loads the persisted collection, dropping any record that fails
    /// shape validation. If anything was dropped the cleaned set is
    /// rewritten, so a corrupted store heals itself on the next boot.
    pub fn new(storage: Box<dyn Storage>) -> Self {
        let mut ledger = Ledger {
            requests: Vec::new(),
            next_id: 1,
            storage,
        };
        ledger.load();
        ledger
    }

    fn load(&mut self) {
        let Some(raw) = self.storage.get(REQUESTS_KEY) else {
            return;
        };
        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(err) => {
                log::warn!("request store is not a valid collection, discarding: {err}");
                self.storage.remove(REQUESTS_KEY);
                return;
            }
        };
        let total = values.len();
        self.requests = values
            .into_iter()
            .filter(has_required_shape)
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        if self.requests.len() < total {
            log::warn!(
                "dropped {} malformed request record(s) from the store",
                total - self.requests.len()
            );
            self.persist();
        }
        self.next_id = self
            .requests
            .iter()
            .map(|request| request.id + 1)
            .max()
            .unwrap_or(1);
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.requests) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(REQUESTS_KEY, &raw) {
                    log::warn!("failed to persist request ledger: {err:#}");
                }
            }
            Err(err) => log::warn!("failed to serialize request ledger: {err}"),
        }
    }

    /// Lists requests, optionally narrowed to one student and one status.
    /// Each returned record carries a book snapshot refreshed against the
    /// current catalog; freshness belongs to this read path.
    pub fn list(
        &self,
        catalog: &Catalog,
        student_id: Option<u32>,
        status: Option<RequestStatus>,
    ) -> Vec<Request> {
        self.requests
            .iter()
            .filter(|request| student_id.map_or(true, |id| request.student_id == id))
            .filter(|request| status.map_or(true, |status| request.status == status))
            .map(|request| {
                let mut request = request.clone();
                if let Some(book) = catalog.get(request.book_id) {
                    request.book = Some(BookSnapshot::from(book));
                }
                request
            })
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<&Request> {
        self.requests.iter().find(|request| request.id == id)
    }

    /// Requests still consuming the student's quota: pending, or approved
    /// while the book has not come back to `available`.
    pub fn active_count(&self, catalog: &Catalog, student_id: u32) -> usize {
        self.requests
            .iter()
            .filter(|request| request.student_id == student_id)
            .filter(|request| is_active(request, catalog))
            .count()
    }

    pub fn create(
        &mut self,
        catalog: &Catalog,
        student_id: u32,
        book_id: u32,
    ) -> Result<Request, LibraryError> {
        let book = catalog.get(book_id).ok_or(LibraryError::BookNotFound)?;

        let blocking = self
            .requests
            .iter()
            .filter(|request| request.student_id == student_id && request.book_id == book_id)
            .any(|request| is_active(request, catalog));
        if blocking {
            return Err(LibraryError::DuplicateRequest);
        }
        if self.active_count(catalog, student_id) >= MAX_ACTIVE_REQUESTS {
            return Err(LibraryError::LimitExceeded(MAX_ACTIVE_REQUESTS));
        }

        let request = Request {
            id: self.next_id,
            student_id,
            book_id,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            approved_at: None,
            book: Some(BookSnapshot::from(book)),
        };
        self.next_id += 1;
        self.requests.push(request.clone());
        self.persist();
        Ok(request)
    }

    /// Moves a pending request to `approved` or `rejected`. The catalog
    /// side of the transition is the caller's responsibility.
    pub fn set_status(
        &mut self,
        id: u32,
        new_status: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Request, LibraryError> {
        let request = self
            .requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or(LibraryError::RequestNotFound(id))?;
        if request.status != RequestStatus::Pending {
            return Err(LibraryError::InvalidTransition(request.status));
        }
        request.status = new_status;
        if new_status == RequestStatus::Approved {
            request.approved_at = Some(now);
        }
        let request = request.clone();
        self.persist();
        Ok(request)
    }

    /// Bookkeeping for a direct issue of an available book: auto-approve
    /// the student's pending request for it if one exists, otherwise
    /// fabricate an approved request so the issue shows in their history.
    pub fn track_direct_issue(&mut self, student_id: u32, book_id: u32, snapshot: BookSnapshot) {
        let now = Utc::now();
        let pending = self.requests.iter_mut().find(|request| {
            request.student_id == student_id
                && request.book_id == book_id
                && request.status == RequestStatus::Pending
        });
        match pending {
            Some(request) => {
                request.status = RequestStatus::Approved;
                request.approved_at = Some(now);
            }
            None => {
                let request = Request {
                    id: self.next_id,
                    student_id,
                    book_id,
                    status: RequestStatus::Approved,
                    requested_at: now,
                    approved_at: Some(now),
                    book: Some(snapshot),
                };
                self.next_id += 1;
                self.requests.push(request);
            }
        }
        self.persist();
    }
}

fn has_required_shape(value: &serde_json::Value) -> bool {
    ["id", "book_id", "student_id", "status"]
        .iter()
        .all(|key| value.get(key).map_or(false, |field| !field.is_null()))
}

fn is_active(request: &Request, catalog: &Catalog) -> bool {
    match request.status {
        RequestStatus::Pending => true,
        RequestStatus::Approved => catalog
            .get(request.book_id)
            .map_or(false, |book| book.status != BookStatus::Available),
        RequestStatus::Rejected => false,
    }
}
