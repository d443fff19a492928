//! Terminal client for the NoteHub notes API.
//!
//! Lists, paginates, searches, creates and deletes notes. The pieces, leaf first:
//!
//! - [`models`]: notes, tags, drafts and draft validation
//! - [`client`]: the HTTP wrapper around the three REST operations
//! - [`debounce`]: settles the search box before it reaches the listing key
//! - [`query`]: keyed listing cache with de-duplication and invalidation
//! - [`app`]: the view controller tying user actions to the cache
//! - [`render`] and [`shell`]: the terminal front end

pub mod app;
pub mod client;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod models;
pub mod query;
pub mod render;
pub mod shell;
