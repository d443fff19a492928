use crate::models::{FieldError, Note};

pub const LOAD_ERROR: &str = "Error loading notes. Check your token.";
pub const NO_NOTES: &str = "No notes found.";
pub const CREATE_SUCCESS: &str = "Note created successfully!";
pub const CREATE_FAILED: &str = "Failed to create note. Please try again.";
pub const DELETE_SUCCESS: &str = "Note deleted successfully!";
pub const DELETE_FAILED: &str = "Failed to delete note.";

/// State owned by the view controller. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// 1-based page number.
    pub page: u32,
    /// Search box contents, updated on every edit.
    pub raw_search: String,
    pub is_modal_open: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: 1,
            raw_search: String::new(),
            is_modal_open: false,
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
    Info(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) | Self::Info(m) => m,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotesView {
    pub search: String,
    pub page: u32,
    pub notes: Vec<Note>,
    pub total_pages: u32,
    pub show_paginator: bool,
    /// Nothing to show yet for the current key.
    pub is_loading: bool,
    /// A fetch for the current key is running.
    pub is_refreshing: bool,
    /// `notes` belong to a previous key while the current one loads.
    pub is_placeholder: bool,
    pub error: Option<&'static str>,
    /// The current key loaded successfully with zero notes.
    pub is_empty: bool,
    pub is_modal_open: bool,
    pub form_errors: Vec<FieldError>,
}
