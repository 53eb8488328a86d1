//! Interactive translator page
//!
//! # Architecture
//! - Event loop: terminal input, backend completions and the render tick are
//!   multiplexed with `tokio::select!`
//! - Requests run on spawned tasks and report back over a channel with the
//!   ticket they were issued, so the [`Controller`] is only touched here
//! - Drawing lives in [`render`]

mod render;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal as RatatuiTerminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::api::{Backend, ExecutionResult, TranslationResult};
use crate::colors::Palette;
use crate::config::Config;
use crate::controller::{Controller, ExecutionTicket, Outcome, TranslationTicket};
use crate::error::{ClientError, ClientResult};
use crate::keybindings::{Action, KeybindingManager};
use crate::progress_bar::BusyIndicator;
use crate::watermark::WatermarkDecoration;

/// Redraw rate; the page only animates the spinner
const TARGET_FPS: u64 = 30;

/// Notification display duration in seconds
const NOTIFICATION_DURATION_SECS: u64 = 2;

/// How often the watermark staleness check runs, in frames
const WATERMARK_CHECK_FRAMES: u64 = TARGET_FPS * 30;

/// Which widget receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Query,
    History,
    WorkingDirPrompt,
}

/// A finished backend call on its way back to the event loop
enum Completion {
    Translation(TranslationTicket, ClientResult<TranslationResult>),
    Execution(ExecutionTicket, ClientResult<ExecutionResult>),
}

pub struct App {
    config: Config,
    controller: Controller,
    backend: Arc<dyn Backend>,
    keybindings: KeybindingManager,
    palette: Palette,
    busy: BusyIndicator,
    watermark: Option<WatermarkDecoration>,
    focus: Focus,
    show_history: bool,
    history_selected: usize,
    working_dir_input: String,
    notification_message: Option<String>,
    notification_frames: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    should_quit: bool,
    dirty: bool,
    frame_count: u64,
}

impl App {
    #[must_use]
    pub fn new(config: Config, controller: Controller, backend: Arc<dyn Backend>) -> Self {
        info!(
            "Starting translator page: variant={}, backend={}, history limit={}",
            config.backend.variant.label(),
            config.backend.base_url,
            controller.history().limit()
        );

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let watermark = config
            .watermark
            .enabled
            .then(|| WatermarkDecoration::new(config.watermark.footer.clone()));

        Self {
            keybindings: KeybindingManager::from_config(&config.keybindings),
            working_dir_input: config
                .execution
                .working_dir_for(config.backend.variant),
            config,
            controller,
            backend,
            palette: Palette::default_dark(),
            busy: BusyIndicator::new(),
            watermark,
            focus: Focus::Query,
            show_history: true,
            history_selected: 0,
            notification_message: None,
            notification_frames: 0,
            completions_tx,
            completions_rx,
            should_quit: false,
            dirty: true,
            frame_count: 0,
        }
    }

    /// Run the page until the user quits
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up, drawn to, or restored
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context(
            "Failed to enable raw mode. Ensure you're running in a proper terminal emulator.",
        )?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, crossterm::event::EnableBracketedPaste, Show)
            .context("Failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal =
            RatatuiTerminal::new(backend).context("Failed to create terminal backend")?;

        let result = self.event_loop(&mut terminal).await;

        // Restore the terminal even when the loop failed
        execute!(
            terminal.backend_mut(),
            crossterm::event::DisableBracketedPaste,
            LeaveAlternateScreen,
            Show
        )?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        info!("Translator page closed");
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut RatatuiTerminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let frame_duration = Duration::from_micros(1_000_000 / TARGET_FPS);
        let mut render_interval = interval(frame_duration);
        render_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        while !self.should_quit {
            tokio::select! {
                Ok(Ok(has_event)) = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(5))) => {
                    if has_event {
                        match event::read() {
                            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                                self.handle_key_event(key);
                                self.dirty = true;
                            }
                            Ok(Event::Paste(text)) => {
                                self.handle_paste(&text);
                                self.dirty = true;
                            }
                            Ok(Event::Resize(..)) => self.dirty = true,
                            Ok(_) => {}
                            Err(e) => warn!("Failed to read terminal event: {}", e),
                        }
                    }
                }

                Some(completion) = self.completions_rx.recv() => {
                    self.apply_completion(completion);
                    self.dirty = true;
                }

                _ = render_interval.tick() => {
                    self.on_tick();
                    if self.dirty {
                        terminal.draw(|f| self.render(f))?;
                        self.dirty = false;
                    }
                }
            }
        }

        Ok(())
    }

    fn on_tick(&mut self) {
        self.frame_count += 1;

        if self.busy.is_visible() {
            self.busy.tick();
            self.dirty = true;
        }

        if self.notification_frames > 0 {
            self.notification_frames -= 1;
            if self.notification_frames == 0 {
                self.notification_message = None;
                self.dirty = true;
            }
        }

        if self.frame_count % WATERMARK_CHECK_FRAMES == 1 {
            if let Some(watermark) = self.watermark.as_mut() {
                watermark.refresh(Utc::now());
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if let Some(action) = self.keybindings.get_action(key.code, key.modifiers) {
            self.handle_action(action);
            return;
        }

        match self.focus {
            Focus::WorkingDirPrompt => self.handle_prompt_key(key),
            Focus::History => self.handle_history_key(key),
            Focus::Query => self.handle_query_key(key),
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => {
                debug!("Quit signal received");
                self.should_quit = true;
            }
            Action::Execute => self.open_working_dir_prompt(),
            Action::Copy => {
                let text = if self.focus == Focus::History {
                    self.selected_entry_id()
                        .and_then(|id| self.controller.history().get(&id))
                        .map(|e| e.command.clone())
                } else {
                    self.controller.current_command().map(str::to_owned)
                };
                match text {
                    Some(text) => match copy_to_clipboard(&text) {
                        Ok(()) => self.show_notification("Copied to clipboard!".to_string()),
                        Err(e) => {
                            warn!("Failed to copy to clipboard: {:#}", e);
                            self.show_notification(format!("Copy failed: {e}"));
                        }
                    },
                    None => self.show_notification("No command to copy.".to_string()),
                }
            }
            Action::Favorite => match self.controller.favorite_current() {
                Ok(true) => self.show_notification("Saved to favorites".to_string()),
                Ok(false) => self.show_notification("Command is not in history".to_string()),
                Err(e) => self.show_notification(e.to_string()),
            },
            Action::ToggleHistory => {
                self.show_history = !self.show_history;
                if !self.show_history && self.focus == Focus::History {
                    self.focus = Focus::Query;
                }
            }
            Action::ClearHistory => {
                self.controller.clear_history();
                self.history_selected = 0;
                if self.focus == Focus::History {
                    self.focus = Focus::Query;
                }
                self.show_notification("History cleared".to_string());
            }
            Action::Clear => {
                self.controller.clear();
                self.focus = Focus::Query;
                self.sync_progress();
            }
        }
    }

    fn handle_query_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.submit(),
            (KeyCode::Tab, _) if self.show_history && !self.controller.history().is_empty() => {
                self.focus = Focus::History;
            }
            (KeyCode::Esc, _) => self.controller.dismiss_messages(),
            (KeyCode::Backspace, _) => {
                self.controller.input_mut().pop();
            }
            (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.controller.input_mut().push(c);
            }
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        let len = self.controller.history().len();
        match key.code {
            KeyCode::Up => self.history_selected = self.history_selected.saturating_sub(1),
            KeyCode::Down => {
                if self.history_selected + 1 < len {
                    self.history_selected += 1;
                }
            }
            KeyCode::Enter => {
                let Some(id) = self.selected_entry_id() else {
                    return;
                };
                self.focus = Focus::Query;
                if self.controller.reuse(&id) == Some(true) {
                    self.submit();
                }
            }
            KeyCode::Tab | KeyCode::Esc => self.focus = Focus::Query,
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let dir = self.working_dir_input.clone();
                self.focus = Focus::Query;
                self.execute(&dir);
            }
            KeyCode::Esc => self.focus = Focus::Query,
            KeyCode::Backspace => {
                self.working_dir_input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.working_dir_input.push(c);
            }
            _ => {}
        }
    }

    fn handle_paste(&mut self, text: &str) {
        let line = text.lines().next().unwrap_or_default();
        match self.focus {
            Focus::WorkingDirPrompt => self.working_dir_input.push_str(line),
            Focus::Query | Focus::History => {
                self.focus = Focus::Query;
                self.controller.input_mut().push_str(line);
            }
        }
    }

    fn open_working_dir_prompt(&mut self) {
        if self.controller.current_command().is_none() {
            // Surfaces "No command" or the credentials message
            let _ = self.controller.begin_execution("");
            return;
        }
        self.focus = Focus::WorkingDirPrompt;
    }

    fn submit(&mut self) {
        let ticket = match self.controller.begin_translation() {
            Ok(ticket) => ticket,
            Err(ClientError::Busy) => {
                self.show_notification("Translation already in progress".to_string());
                return;
            }
            Err(_) => return,
        };

        let backend = Arc::clone(&self.backend);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = backend.translate(&ticket.query).await;
            // Receiver only disappears on shutdown
            let _ = tx.send(Completion::Translation(ticket, result));
        });
        self.sync_progress();
    }

    fn execute(&mut self, working_dir: &str) {
        let ticket = match self.controller.begin_execution(working_dir) {
            Ok(ticket) => ticket,
            Err(ClientError::Busy) => {
                self.show_notification("Execution already in progress".to_string());
                return;
            }
            Err(_) => return,
        };

        let backend = Arc::clone(&self.backend);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = backend
                .execute(&ticket.command, ticket.working_dir.as_deref())
                .await;
            let _ = tx.send(Completion::Execution(ticket, result));
        });
        self.sync_progress();
    }

    fn apply_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Translation(ticket, result) => {
                if self.controller.complete_translation(&ticket, result) == Outcome::Applied {
                    self.history_selected = 0;
                }
            }
            Completion::Execution(ticket, result) => {
                let outcome = self.controller.complete_execution(&ticket, result);
                if outcome != Outcome::Stale {
                    if let Some(view) = self.controller.execution_view() {
                        self.show_notification(format!(
                            "Command finished: {} (exit {})",
                            view.status.label(),
                            view.exit_code
                        ));
                    }
                }
            }
        }
        self.sync_progress();
    }

    fn sync_progress(&mut self) {
        let label = if self.controller.is_translating() {
            Some("Translating")
        } else if self.controller.is_executing() {
            Some("Executing")
        } else {
            None
        };

        match label {
            Some(label) => self.busy.start(label),
            None => self.busy.stop(),
        }
    }

    /// History entry ids in display order
    fn display_order(&self) -> Vec<String> {
        self.controller
            .history()
            .grouped_by_day()
            .iter()
            .flat_map(|g| g.entries.iter().map(|e| e.id.clone()))
            .collect()
    }

    fn selected_entry_id(&self) -> Option<String> {
        self.display_order().into_iter().nth(self.history_selected)
    }

    /// Show notification message
    pub fn show_notification(&mut self, message: String) {
        self.notification_message = Some(message);
        self.notification_frames = NOTIFICATION_DURATION_SECS * TARGET_FPS;
        self.dirty = true;
    }
}

/// Copy text to the system clipboard
fn copy_to_clipboard(text: &str) -> Result<()> {
    use arboard::Clipboard;

    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to set clipboard text")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Breakdown;
    use crate::history::HistoryStore;
    use async_trait::async_trait;

    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn translate(&self, query: &str) -> ClientResult<TranslationResult> {
            Ok(TranslationResult {
                command: format!("echo {query}"),
                explanation: String::new(),
                breakdown: Breakdown::Unavailable,
                simulation: None,
                safety_warning: None,
                risk_level: Some(0),
                watermark: None,
            })
        }

        async fn execute(
            &self,
            _command: &str,
            _working_dir: Option<&str>,
        ) -> ClientResult<ExecutionResult> {
            Err(ClientError::Decode("not used".to_string()))
        }
    }

    fn app() -> App {
        let controller = Controller::new(HistoryStore::in_memory(10), false);
        App::new(Config::default(), controller, Arc::new(EchoBackend))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_typing_and_submit_round_trip() {
        let mut app = app();
        for c in "hi".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Enter));
        assert!(app.busy.is_visible());

        let completion = app.completions_rx.recv().await.unwrap();
        app.apply_completion(completion);

        assert!(!app.busy.is_visible());
        assert_eq!(app.controller.current_command(), Some("echo hi"));
        assert_eq!(app.controller.history().len(), 1);
    }

    #[test]
    fn test_execute_without_command_shows_error() {
        let mut app = app();
        app.handle_action(Action::Execute);
        assert_eq!(app.focus, Focus::Query);
        assert_eq!(app.controller.error(), Some("No command to execute."));
    }

    #[test]
    fn test_blank_submit_sets_validation() {
        let mut app = app();
        app.handle_key_event(key(KeyCode::Enter));
        assert!(!app.busy.is_visible());
        assert!(app.controller.validation().is_some());
    }

    #[tokio::test]
    async fn test_clear_history_returns_focus_to_query() {
        let mut app = app();
        app.controller.set_input("hi");
        app.handle_key_event(key(KeyCode::Enter));
        let completion = app.completions_rx.recv().await.unwrap();
        app.apply_completion(completion);

        app.handle_key_event(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::History);

        app.handle_action(Action::ClearHistory);
        assert!(app.controller.history().is_empty());
        assert_eq!(app.focus, Focus::Query);

        app.handle_key_event(key(KeyCode::Char('x')));
        assert_eq!(app.controller.input(), "hix");
    }

    #[test]
    fn test_toggle_history_returns_focus() {
        let mut app = app();
        app.focus = Focus::History;
        app.handle_action(Action::ToggleHistory);
        assert!(!app.show_history);
        assert_eq!(app.focus, Focus::Query);
    }
}
