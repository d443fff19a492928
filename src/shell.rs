//! Interactive terminal loop.
//!
//! Three event sources drive the controller: input lines, settled fetches
//! from the cache, and the search debounce deadline. They are handled one at
//! a time on a single task.

use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::app::NotesApp;
use crate::models::{parse_tag_field, NoteDraft};
use crate::query::QueryKey;
use crate::render;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Page(u32),
    Next,
    Prev,
    New,
    Delete(String),
    Refresh,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if let Some(text) = line.strip_prefix('/') {
            return Self::Search(text.trim().to_string());
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word.to_ascii_lowercase().as_str() {
            "search" | "s" => Self::Search(rest.to_string()),
            "page" | "p" => match rest.parse() {
                Ok(n) => Self::Page(n),
                Err(_) => Self::Unknown(line.to_string()),
            },
            "next" | "n" => Self::Next,
            "prev" => Self::Prev,
            "new" | "create" => Self::New,
            "delete" | "rm" if !rest.is_empty() => Self::Delete(rest.to_string()),
            "refresh" | "r" => Self::Refresh,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Where the create form is while the modal is open.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FormStep {
    Title,
    Content { title: String },
    Tag { title: String, content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    app: NotesApp,
    events: mpsc::UnboundedReceiver<QueryKey>,
    out: W,
    form: Option<FormStep>,
}

impl<W: Write> Shell<W> {
    pub fn new(app: NotesApp, events: mpsc::UnboundedReceiver<QueryKey>, out: W) -> Self {
        Self {
            app,
            events,
            out,
            form: None,
        }
    }

    pub fn app(&self) -> &NotesApp {
        &self.app
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until `quit` or end of input. At end of input the pending search
    /// settles and running fetches finish before returning.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        self.app.refresh();
        self.redraw()?;

        loop {
            let deadline = self.app.next_deadline();
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        self.finish().await?;
                        break;
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                }
                Some(key) = self.events.recv() => {
                    self.app.on_query_settled(&key);
                    if key == self.app.current_key() {
                        self.redraw()?;
                    }
                }
                _ = sleep_until(deadline) => {
                    if self.app.on_tick() {
                        self.redraw()?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Input ended without `quit`: publish the pending search and wait for
    /// running fetches so the last frame shows their results.
    async fn finish(&mut self) -> Result<()> {
        self.app.flush_search();
        loop {
            while let Ok(key) = self.events.try_recv() {
                self.app.on_query_settled(&key);
            }
            if self.app.cache().in_flight_count() == 0 {
                break;
            }
            match self.events.recv().await {
                Some(key) => self.app.on_query_settled(&key),
                None => break,
            }
        }
        self.redraw()
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if let Some(step) = self.form.take() {
            self.handle_form_input(step, line).await?;
            return Ok(Flow::Continue);
        }

        match Command::parse(line) {
            Command::Search(text) => {
                self.app.on_search_change(text);
                self.redraw()?;
            }
            Command::Page(n) => {
                let n = match self.app.view().total_pages {
                    0 => n,
                    total => n.min(total),
                };
                self.app.on_page_change(n);
                self.redraw()?;
            }
            Command::Next => {
                let view = self.app.view();
                if view.page < view.total_pages {
                    self.app.on_page_change(view.page + 1);
                }
                self.redraw()?;
            }
            Command::Prev => {
                let page = self.app.state().page;
                self.app.on_page_change(page.saturating_sub(1));
                self.redraw()?;
            }
            Command::New => {
                self.app.open_modal();
                self.form = Some(FormStep::Title);
                self.redraw()?;
                self.prompt(&FormStep::Title)?;
            }
            Command::Delete(id) => {
                self.app.on_delete(&id).await;
                self.redraw()?;
            }
            Command::Refresh => {
                self.app.refresh();
                self.redraw()?;
            }
            Command::Help => {
                write!(self.out, "{}", render::HELP)?;
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(text) => {
                writeln!(self.out, "Unknown command: {} (type `help`)", text)?;
            }
            Command::Empty => {}
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    async fn handle_form_input(&mut self, step: FormStep, line: &str) -> Result<()> {
        let input = line.trim_end_matches('\r').to_string();
        if input.trim().eq_ignore_ascii_case("cancel") {
            self.app.close_modal();
            return self.redraw();
        }

        let next = match step {
            FormStep::Title => Some(FormStep::Content { title: input }),
            FormStep::Content { title } => Some(FormStep::Tag {
                title,
                content: input,
            }),
            FormStep::Tag { title, content } => match parse_tag_field(&input) {
                Err(e) => {
                    writeln!(self.out, "  ! {}", e)?;
                    Some(FormStep::Tag { title, content })
                }
                Ok(tag) => {
                    self.app
                        .on_create(NoteDraft::new(title, content, tag))
                        .await;
                    self.redraw()?;
                    // Rejected drafts keep the modal open for another attempt.
                    self.app.state().is_modal_open.then_some(FormStep::Title)
                }
            },
        };

        if let Some(step) = &next {
            self.prompt(step)?;
        }
        self.form = next;
        Ok(())
    }

    fn prompt(&mut self, step: &FormStep) -> Result<()> {
        match step {
            FormStep::Title => write!(self.out, "Title: ")?,
            FormStep::Content { .. } => write!(self.out, "Content: ")?,
            FormStep::Tag { .. } => write!(self.out, "Tag ({}) [Todo]: ", render::tag_choices())?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        for notification in self.app.drain_notifications() {
            writeln!(self.out, "{}", render::render_notification(&notification))?;
        }
        write!(self.out, "{}", render::render_view(&self.app.view()))?;
        self.out.flush()?;
        Ok(())
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_forms() {
        assert_eq!(Command::parse("/meeting"), Command::Search("meeting".into()));
        assert_eq!(
            Command::parse("search team sync"),
            Command::Search("team sync".into())
        );
        assert_eq!(Command::parse("search"), Command::Search(String::new()));
        assert_eq!(Command::parse("/"), Command::Search(String::new()));
    }

    #[test]
    fn parses_paging() {
        assert_eq!(Command::parse("page 3"), Command::Page(3));
        assert_eq!(Command::parse("next"), Command::Next);
        assert_eq!(Command::parse("prev"), Command::Prev);
        assert_eq!(
            Command::parse("page three"),
            Command::Unknown("page three".into())
        );
    }

    #[test]
    fn parses_mutations_and_control() {
        assert_eq!(Command::parse("new"), Command::New);
        assert_eq!(Command::parse("delete 42"), Command::Delete("42".into()));
        assert_eq!(Command::parse("delete"), Command::Unknown("delete".into()));
        assert_eq!(Command::parse("  QUIT "), Command::Quit);
        assert_eq!(Command::parse(""), Command::Empty);
    }
}
