//! Client-held pagination over a server search endpoint.
//!
//! [`Cursor`] is a sans-IO state machine. Every navigation returns a
//! [`PageRequest`] ticket; the caller performs the fetch however it likes and
//! hands the result back through [`Cursor::complete`]. Each ticket carries the
//! generation it was issued under, and the generation moves on with every new
//! request, so a response that arrives after a newer request was issued is
//! dropped instead of overwriting what the user is looking at. Nothing is
//! cancelled; late results are ignored.
//!
//! ```text
//! Idle(page 0) --request--> Loading(page n) --complete(ok)--> Loaded(page n)
//!                                ^    \--complete(err)--> back to last Loaded
//!            reset keys changed  |
//!            (page 0, data cleared)
//! ```
//!
//! A result whose total no longer reaches the requested page moves the cursor
//! to the new last page ([`Completion::Shrunk`]) instead of showing a page
//! past the end.
//!
//! For synchronous sources, [`PageSource`] and [`Cursor::drive`] run a fetch
//! and feed the result back in one call.

use serde::Serialize;
use tracing::debug;

/// One page of results as returned by a search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    /// Matching rows across all pages.
    pub total_count: u64,
}

/// A fetch the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<K> {
    pub generation: u64,
    /// Zero-based page number.
    pub page: u64,
    /// Reset keys the request was issued under.
    pub keys: K,
}

/// What [`Cursor::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result became the visible page.
    Applied,
    /// A newer request was issued since; the result was discarded.
    Stale,
    /// The fetch failed; the last good page stays visible.
    Failed,
    /// The result set shrank below the requested page. The cursor moved to
    /// the new last page with no rows; [`Cursor::reload`] fetches it.
    Shrunk,
}

/// Coarse state, for rendering spinners and the like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    Loading { page: u64 },
    Loaded { page: u64 },
}

#[derive(Debug, Clone)]
struct Loaded<T> {
    page: u64,
    data: Vec<T>,
    total_pages: u64,
}

/// Pagination state for one list view.
#[derive(Debug, Clone)]
pub struct Cursor<K, T, E> {
    page_size: u64,
    keys: K,
    generation: u64,
    page: u64,
    in_flight: Option<u64>,
    loaded: Option<Loaded<T>>,
    last_error: Option<E>,
}

impl<K: Clone + PartialEq, T, E> Cursor<K, T, E> {
    /// New idle cursor on page 0. A zero page size is treated as 1.
    pub fn new(page_size: u64, keys: K) -> Self {
        Self {
            page_size: page_size.max(1),
            keys,
            generation: 0,
            page: 0,
            in_flight: None,
            loaded: None,
            last_error: None,
        }
    }

    /// Re-request the current page.
    pub fn reload(&mut self) -> PageRequest<K> {
        self.issue(self.page)
    }

    /// Replace the reset keys.
    ///
    /// A change drops the visible page, moves to page 0 and issues a request;
    /// anything still in flight for the old keys becomes stale. Setting equal
    /// keys is a no-op.
    pub fn set_keys(&mut self, keys: K) -> Option<PageRequest<K>> {
        if keys == self.keys {
            return None;
        }
        self.keys = keys;
        self.loaded = None;
        self.last_error = None;
        Some(self.issue(0))
    }

    /// Navigate to `page`, clamped into the known page range.
    ///
    /// Returns `None` when the clamped target is the page already shown.
    pub fn go_to(&mut self, page: i64) -> Option<PageRequest<K>> {
        let target = u64::try_from(page).unwrap_or(0).min(self.last_page());
        if target == self.page && (self.in_flight.is_some() || self.loaded.is_some()) {
            return None;
        }
        Some(self.issue(target))
    }

    pub fn next(&mut self) -> Option<PageRequest<K>> {
        self.go_to(self.signed_page().saturating_add(1))
    }

    pub fn prev(&mut self) -> Option<PageRequest<K>> {
        self.go_to(self.signed_page().saturating_sub(1))
    }

    /// Feed back the result of a request.
    pub fn complete(&mut self, request: &PageRequest<K>, result: Result<Page<T>, E>) -> Completion {
        if request.generation != self.generation {
            debug!(
                stale = request.generation,
                current = self.generation,
                page = request.page,
                "dropping stale page response"
            );
            return Completion::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let total_pages = page.total_count.div_ceil(self.page_size);
                let last_page = total_pages.saturating_sub(1);
                if request.page > last_page {
                    debug!(requested = request.page, last_page, "result set shrank under the cursor");
                    self.page = last_page;
                    self.loaded = Some(Loaded {
                        page: last_page,
                        data: Vec::new(),
                        total_pages,
                    });
                    self.last_error = None;
                    return Completion::Shrunk;
                }
                self.page = request.page;
                self.loaded = Some(Loaded {
                    page: request.page,
                    data: page.results,
                    total_pages,
                });
                self.last_error = None;
                Completion::Applied
            }
            Err(error) => {
                self.page = self.loaded.as_ref().map_or(0, |loaded| loaded.page);
                self.last_error = Some(error);
                Completion::Failed
            }
        }
    }

    /// Fetch `request` from `source` and apply the result.
    ///
    /// A [`Completion::Shrunk`] result is followed up with a fetch of the new
    /// last page, so this never returns `Shrunk`.
    pub fn drive<S>(&mut self, source: &mut S, request: &PageRequest<K>) -> Completion
    where
        S: PageSource<K, Item = T, Error = E>,
    {
        let mut result = source.fetch(&request.keys, request.page, self.page_size);
        let mut completion = self.complete(request, result);
        // Each follow-up targets a strictly lower page, so this ends.
        while completion == Completion::Shrunk {
            let follow_up = self.reload();
            result = source.fetch(&follow_up.keys, follow_up.page, self.page_size);
            completion = self.complete(&follow_up, result);
        }
        completion
    }

    #[must_use]
    pub fn state(&self) -> CursorState {
        match (self.in_flight, &self.loaded) {
            (Some(page), _) => CursorState::Loading { page },
            (None, Some(loaded)) => CursorState::Loaded { page: loaded.page },
            (None, None) => CursorState::Idle,
        }
    }

    /// Rows of the page on screen.
    #[must_use]
    pub fn visible_data(&self) -> &[T] {
        self.loaded.as_ref().map_or(&[], |loaded| loaded.data.as_slice())
    }

    /// `ceil(total_count / page_size)` of the last applied page, 0 before any.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.loaded.as_ref().map_or(0, |loaded| loaded.total_pages)
    }

    /// Zero-based index of the current (or requested) page.
    #[must_use]
    pub const fn page_index(&self) -> u64 {
        self.page
    }

    /// One-based page number for display.
    #[must_use]
    pub const fn display_page(&self) -> u64 {
        self.page.saturating_add(1)
    }

    #[must_use]
    pub const fn prev_disabled(&self) -> bool {
        self.page == 0
    }

    #[must_use]
    pub fn next_disabled(&self) -> bool {
        self.page.saturating_add(1) >= self.total_pages()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Error of the most recent failed fetch, cleared by the next success.
    #[must_use]
    pub const fn last_error(&self) -> Option<&E> {
        self.last_error.as_ref()
    }

    /// Move the last fetch error out, leaving none recorded.
    pub const fn take_error(&mut self) -> Option<E> {
        self.last_error.take()
    }

    #[must_use]
    pub const fn keys(&self) -> &K {
        &self.keys
    }

    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    fn last_page(&self) -> u64 {
        self.total_pages().saturating_sub(1)
    }

    fn signed_page(&self) -> i64 {
        i64::try_from(self.page).unwrap_or(i64::MAX)
    }

    fn issue(&mut self, page: u64) -> PageRequest<K> {
        self.generation = self.generation.wrapping_add(1);
        self.page = page;
        self.in_flight = Some(page);
        PageRequest {
            generation: self.generation,
            page,
            keys: self.keys.clone(),
        }
    }
}

/// A search endpoint that answers synchronously.
pub trait PageSource<K> {
    type Item;
    type Error;

    /// Fetch zero-based `page` of `page_size` rows for `keys`.
    ///
    /// # Errors
    ///
    /// Whatever the backing store reports; the cursor keeps it as
    /// [`Cursor::last_error`].
    fn fetch(&mut self, keys: &K, page: u64, page_size: u64) -> Result<Page<Self::Item>, Self::Error>;
}
