//! Domain models for the NoteHub client.
//!
//! - [`Note`]: a server-owned note, identified by a server-assigned id.
//! - [`NoteTag`]: the fixed set of categories a note can carry.
//! - [`NotesPage`]: one page of a listing, replaced wholesale on every fetch.
//! - [`NoteDraft`]: the create payload, checked locally by [`NoteDraft::validate`].

mod draft;
mod note;

pub use draft::*;
pub use note::*;
