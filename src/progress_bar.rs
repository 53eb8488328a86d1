//! Spinner shown while a backend request is in flight

use std::time::{Duration, Instant};

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    /// What is being waited on and since when
    active: Option<(&'static str, Instant)>,
    frame: usize,
}

impl BusyIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the spinner for `label`. Restarting with the same label keeps the
    /// original start time.
    pub fn start(&mut self, label: &'static str) {
        if self.label() == Some(label) {
            return;
        }
        self.active = Some((label, Instant::now()));
        self.frame = 0;
    }

    pub fn stop(&mut self) {
        self.active = None;
        self.frame = 0;
    }

    pub fn tick(&mut self) {
        if self.active.is_some() {
            self.frame = (self.frame + 1) % SPINNER.len();
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn label(&self) -> Option<&'static str> {
        self.active.map(|(label, _)| label)
    }

    /// e.g. `⠙ Translating... (3s)`, empty when idle
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.active {
            Some((label, since)) => format!(
                "{} {label}... ({})",
                SPINNER[self.frame],
                format_elapsed(since.elapsed())
            ),
            None => String::new(),
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match secs {
        0..=59 => format!("{secs}s"),
        _ => format!("{}m {}s", secs / 60, secs % 60),
    }
}
