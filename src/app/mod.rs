//! View controller.
//!
//! [`NotesApp`] owns the page number, the raw search text and the modal flag.
//! User actions arrive as explicit method calls (`on_search_change`,
//! `on_page_change`, `on_create`, `on_delete`); settled fetches arrive through
//! [`NotesApp::on_query_settled`]. The controller never renders anything
//! itself: [`NotesApp::view`] returns a [`NotesView`] and notifications are
//! queued for the caller to drain.

mod view;

pub use view::*;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::{ClientError, NotesApi};
use crate::clock::Clock;
use crate::debounce::Debouncer;
use crate::models::{FieldError, Note, NoteDraft, NotesPage};
use crate::query::{KeyPrefix, QueryCache, QueryEntry, QueryKey, QueryStatus};

pub struct NotesApp {
    api: Arc<dyn NotesApi>,
    cache: QueryCache,
    clock: Arc<dyn Clock>,
    state: ViewState,
    search: Debouncer<String>,
    settled_search: String,
    /// Last page shown, kept on screen while a new key loads.
    placeholder: Option<NotesPage>,
    /// The current key is showing a successful empty result.
    showing_empty: bool,
    form_errors: Vec<FieldError>,
    notifications: VecDeque<Notification>,
}

impl NotesApp {
    pub fn new(
        api: Arc<dyn NotesApi>,
        cache: QueryCache,
        clock: Arc<dyn Clock>,
        debounce: Duration,
    ) -> Self {
        Self {
            api,
            cache,
            clock,
            state: ViewState::default(),
            search: Debouncer::new(debounce),
            settled_search: String::new(),
            placeholder: None,
            showing_empty: false,
            form_errors: Vec::new(),
            notifications: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The search term the listing is keyed on. Lags the search box by the debounce interval.
    pub fn settled_search(&self) -> &str {
        &self.settled_search
    }

    pub fn current_key(&self) -> QueryKey {
        QueryKey::new(self.state.page, self.settled_search.clone())
    }

    /// Observe the current key, fetching it if needed.
    pub fn refresh(&mut self) -> QueryEntry {
        let entry = self.cache.observe(&self.current_key());
        if let Some(data) = entry.data.as_ref().filter(|_| entry.is_success()) {
            self.placeholder = Some(data.clone());
        }
        entry
    }

    // ============================================================
    // Search and paging
    // ============================================================

    /// The search box changed. The page resets to 1 straight away; the
    /// listing follows once the input settles.
    pub fn on_search_change(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.state.raw_search = value.clone();
        self.search.push(value, self.clock.now());

        if self.state.page != 1 {
            self.state.page = 1;
            self.refresh();
        }
    }

    /// Publish a settled search term if the debounce interval has passed.
    /// Returns true when the listing key changed.
    pub fn on_tick(&mut self) -> bool {
        match self.search.poll(self.clock.now()) {
            Some(settled) => self.apply_settled_search(settled),
            None => false,
        }
    }

    /// Settle the pending search term now, skipping the rest of the interval.
    pub fn flush_search(&mut self) -> bool {
        match self.search.flush() {
            Some(settled) => self.apply_settled_search(settled),
            None => false,
        }
    }

    /// When the pending search term will settle.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    pub fn on_page_change(&mut self, page: u32) {
        let page = page.max(1);
        if page != self.state.page {
            self.state.page = page;
            self.refresh();
        }
    }

    fn apply_settled_search(&mut self, settled: String) -> bool {
        if settled == self.settled_search {
            return false;
        }
        tracing::debug!(search = %settled, "Search settled");
        self.settled_search = settled;
        self.refresh();
        true
    }

    // ============================================================
    // Query results
    // ============================================================

    /// A fetch settled. Results for keys other than the current one stay in
    /// the cache but do not touch the view.
    pub fn on_query_settled(&mut self, key: &QueryKey) {
        if *key != self.current_key() {
            tracing::debug!(%key, "Ignoring result for superseded key");
            return;
        }

        let entry = self.cache.get(key);
        if entry.is_stale {
            // Invalidated while in flight.
            self.cache.observe(key);
        }

        match entry.status {
            QueryStatus::Success => {
                if let Some(page) = entry.data {
                    if page.is_empty() {
                        if !self.showing_empty {
                            self.notify(Notification::Info(NO_NOTES.to_string()));
                        }
                        self.showing_empty = true;
                    } else {
                        self.showing_empty = false;
                    }
                    self.placeholder = Some(page);
                }
            }
            QueryStatus::Error => self.showing_empty = false,
            QueryStatus::Idle | QueryStatus::Loading => {}
        }
    }

    // ============================================================
    // Modal and mutations
    // ============================================================

    pub fn open_modal(&mut self) {
        self.state.is_modal_open = true;
        self.form_errors.clear();
    }

    pub fn close_modal(&mut self) {
        self.state.is_modal_open = false;
        self.form_errors.clear();
    }

    /// Submit the create form. Invalid drafts never reach the network.
    pub async fn on_create(&mut self, draft: NoteDraft) -> Option<Note> {
        if let Err(e) = draft.validate() {
            tracing::debug!("Rejected note draft: {}", e);
            self.form_errors = e.errors;
            return None;
        }
        self.form_errors.clear();

        match self.api.create_note(&draft).await {
            Ok(note) => {
                tracing::info!(id = %note.id, "Note created");
                self.state.is_modal_open = false;
                self.after_mutation(CREATE_SUCCESS);
                Some(note)
            }
            Err(e) => {
                tracing::warn!("Failed to create note: {}", e);
                if e.is_client_error() {
                    self.form_errors = vec![FieldError::new("form", rejection_message(&e))];
                }
                self.notify(Notification::Error(CREATE_FAILED.to_string()));
                None
            }
        }
    }

    pub async fn on_delete(&mut self, id: &str) -> Option<Note> {
        match self.api.delete_note(id).await {
            Ok(note) => {
                tracing::info!(id = %note.id, "Note deleted");
                self.after_mutation(DELETE_SUCCESS);
                Some(note)
            }
            Err(e) => {
                tracing::warn!(id, "Failed to delete note: {}", e);
                self.notify(Notification::Error(DELETE_FAILED.to_string()));
                None
            }
        }
    }

    fn after_mutation(&mut self, message: &str) {
        self.cache.invalidate(&KeyPrefix::All);
        self.notify(Notification::Success(message.to_string()));
        self.refresh();
    }

    // ============================================================
    // Output
    // ============================================================

    fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn view(&self) -> NotesView {
        let entry = self.cache.get(&self.current_key());

        let (shown, is_placeholder) = match entry.data.as_ref() {
            Some(data) => (Some(data), false),
            None if entry.is_loading() => (self.placeholder.as_ref(), self.placeholder.is_some()),
            None => (None, false),
        };

        let is_empty = entry.is_success() && entry.data.as_ref().is_some_and(|d| d.is_empty());
        let total_pages = shown.map(|p| p.total_pages).unwrap_or(0);

        NotesView {
            search: self.state.raw_search.clone(),
            page: self.state.page,
            notes: shown.map(|p| p.notes.clone()).unwrap_or_default(),
            total_pages,
            show_paginator: total_pages > 1 && !is_empty,
            is_loading: entry.is_loading() && shown.is_none(),
            is_refreshing: entry.is_fetching,
            is_placeholder,
            error: entry.is_error().then_some(LOAD_ERROR),
            is_empty,
            is_modal_open: self.state.is_modal_open,
            form_errors: self.form_errors.clone(),
        }
    }
}

/// Short description of a 4xx rejection for the form.
fn rejection_message(e: &ClientError) -> String {
    match e {
        ClientError::Http { status, body } if body.trim().is_empty() => {
            format!("Rejected by server ({})", status)
        }
        ClientError::Http { body, .. } => {
            // The API answers with either plain text or `{"message": "..."}`.
            serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| body.clone())
        }
        ClientError::Transport(_) | ClientError::Decode(_) => e.to_string(),
    }
}
