use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NoteTag;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 50;
pub const CONTENT_MAX_CHARS: usize = 500;

/// Input for creating a note. Sent as the `POST /notes` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tag: NoteTag,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tag: NoteTag) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tag,
        }
    }

    /// Check the draft against the form rules. Runs before any request is made.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        let title_len = self.title.chars().count();
        // Only an empty title is missing; whitespace counts toward the length.
        if self.title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title_len < TITLE_MIN_CHARS {
            errors.push(FieldError::new(
                "title",
                format!("Title must be at least {} characters", TITLE_MIN_CHARS),
            ));
        } else if title_len > TITLE_MAX_CHARS {
            errors.push(FieldError::new(
                "title",
                format!("Title cannot exceed {} characters", TITLE_MAX_CHARS),
            ));
        }

        if self.content.chars().count() > CONTENT_MAX_CHARS {
            errors.push(FieldError::new(
                "content",
                format!("Content cannot exceed {} characters", CONTENT_MAX_CHARS),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Client-side form rejection. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Message for a given field, if it was rejected.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a tag typed by the user into a form field value.
pub fn parse_tag_field(input: &str) -> Result<NoteTag, ValidationError> {
    if input.trim().is_empty() {
        return Ok(NoteTag::default());
    }
    NoteTag::parse(input).ok_or_else(|| {
        let names: Vec<&str> = NoteTag::ALL.iter().map(|t| t.as_str()).collect();
        ValidationError::single("tag", format!("Tag must be one of {}", names.join(", ")))
    })
}
