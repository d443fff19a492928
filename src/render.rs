//! Plain-text rendering of the notes view.

use crate::app::{Notification, NotesView};
use crate::models::{Note, NoteTag, NotesPage};

/// Pages shown around the current one.
const PAGE_RANGE: u32 = 5;
/// Pages always shown at each end.
const PAGE_MARGIN: u32 = 1;

const RULE: &str = "────────────────────────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Gap,
}

/// Page numbers to offer for `current` out of `total`, with gaps for skipped runs.
pub fn page_items(current: u32, total: u32) -> Vec<PageItem> {
    if total <= PAGE_RANGE + 2 * PAGE_MARGIN {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let half = PAGE_RANGE / 2;
    let mut start = current.saturating_sub(half).max(1);
    let mut end = start + PAGE_RANGE - 1;
    if end > total {
        end = total;
        start = total + 1 - PAGE_RANGE;
    }

    let mut items = Vec::new();
    let mut last = 0;
    for page in 1..=total {
        let in_margin = page <= PAGE_MARGIN || page > total - PAGE_MARGIN;
        let in_range = (start..=end).contains(&page);
        if in_margin || in_range {
            if page > last + 1 {
                items.push(PageItem::Gap);
            }
            items.push(PageItem::Page(page));
            last = page;
        }
    }
    items
}

/// One-line paginator, e.g. `← 1 … 4 5 [6] 7 8 … 20 →`.
pub fn render_paginator(current: u32, total: u32) -> String {
    let mut parts = vec!["←".to_string()];
    for item in page_items(current, total) {
        parts.push(match item {
            PageItem::Page(p) if p == current => format!("[{}]", p),
            PageItem::Page(p) => p.to_string(),
            PageItem::Gap => "…".to_string(),
        });
    }
    parts.push("→".to_string());
    parts.join(" ")
}

pub fn render_note(note: &Note) -> String {
    let mut out = format!("• {}  [{}]  #{}\n", note.title, note.tag, note.id);
    for line in note.content.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn render_notes(out: &mut String, notes: &[Note]) {
    for note in notes {
        out.push_str(&render_note(note));
    }
}

/// Render a full frame of the interactive view.
pub fn render_view(view: &NotesView) -> String {
    let mut out = String::new();

    let search = if view.search.is_empty() {
        "(all notes)"
    } else {
        view.search.as_str()
    };
    out.push_str(&format!("Search: {}    [new] Create note +\n", search));
    out.push_str(RULE);
    out.push('\n');

    if view.is_loading {
        out.push_str("Loading notes...\n");
    }
    if let Some(error) = view.error {
        out.push_str(error);
        out.push('\n');
    }
    if view.is_placeholder {
        out.push_str("(updating...)\n");
    }

    render_notes(&mut out, &view.notes);

    if view.is_empty {
        out.push_str("No notes found.\n");
    }
    if view.show_paginator {
        out.push_str(&render_paginator(view.page, view.total_pages));
        out.push('\n');
    }

    if view.is_modal_open {
        out.push_str(RULE);
        out.push('\n');
        out.push_str("Create note (type `cancel` to close)\n");
        for error in &view.form_errors {
            out.push_str(&format!("  ! {}: {}\n", error.field, error.message));
        }
    }

    out
}

/// Render a single page for the one-shot `list` command.
pub fn render_page(page: &NotesPage, current: u32) -> String {
    if page.is_empty() {
        return "No notes found.\n".to_string();
    }

    let mut out = String::new();
    render_notes(&mut out, &page.notes);
    if page.total_pages > 1 {
        out.push_str(&format!("Page {} of {}\n", current, page.total_pages));
    }
    out
}

pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification {
        Notification::Success(_) => "✓",
        Notification::Error(_) => "✗",
        Notification::Info(_) => "i",
    };
    format!("{} {}", marker, notification.message())
}

pub fn tag_choices() -> String {
    NoteTag::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

pub const HELP: &str = "\
Commands:
  /TEXT | search TEXT   search notes (empty clears)
  page N | next | prev  change page
  new                   open the create form
  delete ID             delete a note
  refresh               reload the current page
  help                  show this help
  quit                  exit
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldError;

    fn note(id: &str, title: &str, content: &str, tag: NoteTag) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tag,
            created_at: None,
            updated_at: None,
        }
    }

    fn pages(items: &[PageItem]) -> String {
        items
            .iter()
            .map(|i| match i {
                PageItem::Page(p) => p.to_string(),
                PageItem::Gap => "…".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn small_page_counts_list_every_page() {
        assert_eq!(pages(&page_items(2, 3)), "1 2 3");
        assert_eq!(pages(&page_items(1, 7)), "1 2 3 4 5 6 7");
    }

    #[test]
    fn large_page_counts_collapse_with_gaps() {
        assert_eq!(pages(&page_items(10, 20)), "1 … 8 9 10 11 12 … 20");
        assert_eq!(pages(&page_items(1, 20)), "1 2 3 4 5 … 20");
        assert_eq!(pages(&page_items(20, 20)), "1 … 16 17 18 19 20");
    }

    #[test]
    fn paginator_marks_current_page() {
        assert_eq!(render_paginator(2, 3), "← 1 [2] 3 →");
    }

    #[test]
    fn renders_note_card() {
        let out = render_note(&note("42", "Standup", "9:00\nroom B", NoteTag::Meeting));
        assert_eq!(out, "• Standup  [Meeting]  #42\n  9:00\n  room B\n");
    }

    #[test]
    fn empty_view_shows_message_without_paginator() {
        let view = NotesView {
            page: 1,
            is_empty: true,
            ..NotesView::default()
        };
        let out = render_view(&view);
        assert!(out.contains("No notes found."));
        assert!(!out.contains('←'));
    }

    #[test]
    fn error_view_shows_token_hint() {
        let view = NotesView {
            page: 1,
            error: Some(crate::app::LOAD_ERROR),
            ..NotesView::default()
        };
        assert!(render_view(&view).contains("Error loading notes. Check your token."));
    }

    #[test]
    fn modal_lists_form_errors() {
        let view = NotesView {
            page: 1,
            is_modal_open: true,
            form_errors: vec![FieldError::new("title", "Title is required")],
            ..NotesView::default()
        };
        assert!(render_view(&view).contains("! title: Title is required"));
    }

    #[test]
    fn page_listing_reports_position() {
        let page = NotesPage {
            notes: vec![note("1", "Milk", "", NoteTag::Shopping)],
            total_pages: 3,
            ..NotesPage::default()
        };
        assert_eq!(render_page(&page, 2), "• Milk  [Shopping]  #1\nPage 2 of 3\n");
    }

    #[test]
    fn notifications_are_prefixed_by_kind() {
        assert_eq!(
            render_notification(&Notification::Success("Saved".into())),
            "✓ Saved"
        );
        assert_eq!(
            render_notification(&Notification::Error("Nope".into())),
            "✗ Nope"
        );
    }
}
