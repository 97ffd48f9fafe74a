//! Terminal implementations of the catalog UI capabilities.

use std::{
    io::{self, BufRead, Write},
    sync::Mutex,
};

use client_core::{CatalogRenderer, CatalogView, ConfirmPrompt, FormView};
use tracing::debug;

/// Writes the catalog view as plain text.
pub struct TerminalRenderer {
    out: Mutex<Box<dyn Write + Send>>,
    show_form: bool,
    banner: Mutex<Option<String>>,
}

impl TerminalRenderer {
    pub fn stdout(show_form: bool) -> Self {
        Self::new(Box::new(io::stdout()), show_form)
    }

    pub fn new(out: Box<dyn Write + Send>, show_form: bool) -> Self {
        Self {
            out: Mutex::new(out),
            show_form,
            banner: Mutex::new(None),
        }
    }

    /// Error message currently on the banner, if it has not expired yet.
    pub fn current_error(&self) -> Option<String> {
        self.banner.lock().ok().and_then(|banner| banner.clone())
    }

    fn write_lines(&self, lines: &[String]) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }
}

impl CatalogRenderer for TerminalRenderer {
    fn render_list(&self, view: &CatalogView) {
        let lines = match view {
            CatalogView::Empty { placeholder } => vec![format!("  {placeholder}")],
            CatalogView::Cards(cards) => cards
                .iter()
                .map(|card| format!("  [{}] {}  {}", card.id, card.title, card.price_label))
                .collect(),
        };
        self.write_lines(&lines);
    }

    fn set_count(&self, text: &str) {
        self.write_lines(&[text.to_string()]);
    }

    fn set_loading(&self, loading: bool) {
        if loading {
            self.write_lines(&["Loading...".to_string()]);
        }
    }

    fn show_error(&self, message: &str) {
        if let Ok(mut banner) = self.banner.lock() {
            *banner = Some(message.to_string());
        }
        self.write_lines(&[format!("! {message}")]);
    }

    fn hide_error(&self) {
        if let Ok(mut banner) = self.banner.lock() {
            *banner = None;
        }
        debug!("error banner dismissed");
    }

    fn render_form(&self, form: &FormView) {
        if !self.show_form {
            return;
        }
        let mut line = format!(
            "form: name={:?} price={:?} [{}]",
            form.name, form.price, form.submit_label
        );
        if form.cancel_visible {
            line.push_str(" [Cancel]");
        }
        self.write_lines(&[line]);
    }
}

type ReadLine = Box<dyn FnMut(&mut String) -> io::Result<usize> + Send>;

/// Asks on the terminal and waits for a `y`/`n` answer.
pub struct LinePrompt {
    read_line: Mutex<ReadLine>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl LinePrompt {
    /// Reads answers through the process-wide stdin buffer, so lines the
    /// shell has not consumed yet are not lost.
    pub fn stdin() -> Self {
        Self {
            read_line: Mutex::new(Box::new(|buf: &mut String| io::stdin().read_line(buf))),
            out: Mutex::new(Box::new(io::stdout())),
        }
    }

    pub fn from_reader<R>(mut input: R, out: Box<dyn Write + Send>) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self {
            read_line: Mutex::new(Box::new(move |buf: &mut String| input.read_line(buf))),
            out: Mutex::new(out),
        }
    }
}

impl ConfirmPrompt for LinePrompt {
    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut out) = self.out.lock() {
            let _ = write!(out, "{message} [y/N] ");
            let _ = out.flush();
        }
        let mut answer = String::new();
        let Ok(mut guard) = self.read_line.lock() else {
            return false;
        };
        let read_line = &mut *guard;
        match read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
