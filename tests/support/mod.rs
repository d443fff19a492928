//! Shared test doubles: an in-memory `NotesApi` and a controller harness.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use notehub::app::NotesApp;
use notehub::client::{ClientError, NotesApi};
use notehub::clock::ManualClock;
use notehub::models::{Note, NoteDraft, NoteTag, NotesPage};
use notehub::query::{QueryCache, QueryKey, QueryOptions};

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const GC_TIME: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        page: u32,
        per_page: u32,
        search: Option<String>,
    },
    Create(NoteDraft),
    Delete(String),
}

/// In-memory NoteHub. Every call is recorded; list calls can be held at a
/// gate until the test releases them.
#[derive(Default)]
pub struct FakeApi {
    notes: Mutex<Vec<Note>>,
    next_id: Mutex<u32>,
    calls: Mutex<Vec<Call>>,
    list_failures: Mutex<VecDeque<ClientError>>,
    create_failures: Mutex<VecDeque<ClientError>>,
    gates: Mutex<HashMap<(u32, String), oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `count` notes with ids "1".."count" and titles "Note 1".."Note count".
    pub fn with_notes(count: usize) -> Arc<Self> {
        let api = Self::new();
        for i in 1..=count {
            let tag = NoteTag::ALL[(i - 1) % NoteTag::ALL.len()];
            api.add_note(&format!("Note {}", i), &format!("Content {}", i), tag);
        }
        api
    }

    pub fn add_note(&self, title: &str, content: &str, tag: NoteTag) -> Note {
        let mut next_id = self.next_id.lock();
        *next_id += 1;
        let note = Note {
            id: next_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tag,
            created_at: None,
            updated_at: None,
        };
        self.notes.lock().push(note.clone());
        note
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn list_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .collect()
    }

    pub fn list_count(&self) -> usize {
        self.list_calls().len()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count()
    }

    pub fn fail_next_list(&self, error: ClientError) {
        self.list_failures.lock().push_back(error);
    }

    pub fn fail_next_create(&self, error: ClientError) {
        self.create_failures.lock().push_back(error);
    }

    /// Hold the next list call for `(page, search)` until the sender fires.
    pub fn hold(&self, page: u32, search: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert((page, search.to_string()), rx);
        tx
    }
}

pub fn http_error(status: u16, body: &str) -> ClientError {
    ClientError::Http {
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl NotesApi for FakeApi {
    async fn list_notes(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<NotesPage, ClientError> {
        let search = search.map(str::to_string);
        self.calls.lock().push(Call::List {
            page,
            per_page,
            search: search.clone(),
        });

        let gate = self
            .gates
            .lock()
            .remove(&(page, search.clone().unwrap_or_default()));
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let failure = self.list_failures.lock().pop_front();
        if let Some(e) = failure {
            return Err(e);
        }

        let needle = search.unwrap_or_default().to_lowercase();
        let matching: Vec<Note> = self
            .notes
            .lock()
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle) || n.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        let total = matching.len() as u32;
        let total_pages = total.div_ceil(per_page);
        let notes = matching
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect();

        Ok(NotesPage {
            notes,
            total_pages,
            total_notes: Some(total),
            page: Some(page),
            per_page: Some(per_page),
        })
    }

    async fn create_note(&self, draft: &NoteDraft) -> Result<Note, ClientError> {
        self.calls.lock().push(Call::Create(draft.clone()));
        let failure = self.create_failures.lock().pop_front();
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(self.add_note(&draft.title, &draft.content, draft.tag))
    }

    async fn delete_note(&self, id: &str) -> Result<Note, ClientError> {
        self.calls.lock().push(Call::Delete(id.to_string()));
        let mut notes = self.notes.lock();
        match notes.iter().position(|n| n.id == id) {
            Some(index) => Ok(notes.remove(index)),
            None => Err(http_error(404, "Note not found")),
        }
    }
}

pub fn options(stale_time: Duration) -> QueryOptions {
    QueryOptions {
        per_page: 12,
        retry: 1,
        stale_time,
        gc_time: GC_TIME,
    }
}

/// A cache over a fake API with a manual clock, plus its event stream.
pub fn cache(
    api: &Arc<FakeApi>,
    options: QueryOptions,
) -> (QueryCache, Arc<ManualClock>, mpsc::UnboundedReceiver<QueryKey>) {
    let clock = Arc::new(ManualClock::new());
    let cache = QueryCache::new(api.clone(), clock.clone(), options);
    let events = cache.subscribe();
    (cache, clock, events)
}

/// Wait for the next fetch to settle.
pub async fn next_settled(events: &mut mpsc::UnboundedReceiver<QueryKey>) -> QueryKey {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for a fetch to settle")
        .expect("cache event channel closed")
}

/// Let spawned fetch tasks run up to their next suspension point.
pub async fn run_pending() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub clock: Arc<ManualClock>,
    pub cache: QueryCache,
    pub events: mpsc::UnboundedReceiver<QueryKey>,
    pub app: NotesApp,
}

impl Harness {
    pub fn new(api: Arc<FakeApi>, options: QueryOptions) -> Self {
        let (cache, clock, events) = cache(&api, options);
        let app = NotesApp::new(api.clone(), cache.clone(), clock.clone(), DEBOUNCE);
        Self {
            api,
            clock,
            cache,
            events,
            app,
        }
    }

    /// Wait for the next fetch to settle and hand it to the controller.
    pub async fn settle(&mut self) -> QueryKey {
        let key = next_settled(&mut self.events).await;
        self.app.on_query_settled(&key);
        key
    }
}
