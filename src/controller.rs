//! UI state of the translator page.
//!
//! The controller owns everything the page shows. Network calls are split
//! into `begin_*` (validate, hand out a ticket) and `complete_*` (apply the
//! result) so the event loop can run requests on background tasks while only
//! ever mutating state from one place.

use tracing::{debug, info};

use crate::api::{Backend, ExecutionResult, TranslationResult};
use crate::error::{ClientError, ClientResult};
use crate::history::HistoryStore;
use crate::view::{ExecutionView, TranslationView};

/// Handle for an in-flight translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTicket {
    pub id: u64,
    pub query: String,
}

/// Handle for an in-flight execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTicket {
    pub id: u64,
    pub command: String,
    pub working_dir: Option<String>,
}

/// What happened to a completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    /// Superseded by a newer request or a cleared page; dropped
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionPanel {
    Hidden,
    Running,
    Finished(ExecutionResult),
    Failed(String),
}

impl ExecutionPanel {
    #[must_use]
    pub fn view(&self) -> Option<ExecutionView> {
        match self {
            Self::Hidden => None,
            Self::Running => Some(ExecutionView::running()),
            Self::Finished(result) => Some(ExecutionView::completed(result)),
            Self::Failed(message) => Some(ExecutionView::failed(message)),
        }
    }
}

pub struct Controller {
    input: String,
    validation: Option<String>,
    error: Option<String>,
    current: Option<TranslationResult>,
    execution: ExecutionPanel,
    history: HistoryStore,
    resubmit_on_reuse: bool,
    next_id: u64,
    pending_translation: Option<u64>,
    pending_execution: Option<u64>,
}

impl Controller {
    #[must_use]
    pub fn new(history: HistoryStore, resubmit_on_reuse: bool) -> Self {
        Self {
            input: String::new(),
            validation: None,
            error: None,
            current: None,
            execution: ExecutionPanel::Hidden,
            history,
            resubmit_on_reuse,
            next_id: 1,
            pending_translation: None,
            pending_execution: None,
        }
    }

    fn issue_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Validate the query and mark a translation as in flight
    ///
    /// # Errors
    /// [`ClientError::EmptyQuery`] for a blank query (the validation message is
    /// set) and [`ClientError::Busy`] while another translation is pending.
    pub fn begin_translation(&mut self) -> ClientResult<TranslationTicket> {
        let query = self.input.trim().to_string();
        if query.is_empty() {
            self.validation = Some(ClientError::EmptyQuery.to_string());
            return Err(ClientError::EmptyQuery);
        }
        if self.pending_translation.is_some() {
            return Err(ClientError::Busy);
        }

        self.validation = None;
        self.error = None;
        let id = self.issue_id();
        self.pending_translation = Some(id);
        debug!("Translation #{} started: {:?}", id, query);

        Ok(TranslationTicket { id, query })
    }

    /// Apply a finished translation
    pub fn complete_translation(
        &mut self,
        ticket: &TranslationTicket,
        result: ClientResult<TranslationResult>,
    ) -> Outcome {
        if self.pending_translation != Some(ticket.id) {
            debug!("Dropping stale translation #{}", ticket.id);
            return Outcome::Stale;
        }
        self.pending_translation = None;

        match result {
            Ok(translation) => {
                if translation.requires_credentials() {
                    info!("Backend requires API credentials; not recording history");
                } else {
                    self.history.record(
                        &ticket.query,
                        translation.command.trim(),
                        translation.risk_level.unwrap_or(0),
                    );
                }
                // Any execution belonged to the previous command
                self.execution = ExecutionPanel::Hidden;
                self.pending_execution = None;
                self.current = Some(translation);
                Outcome::Applied
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Outcome::Failed
            }
        }
    }

    /// Check the current command can be run and mark an execution in flight.
    /// A blank `working_dir` is sent as `null`.
    ///
    /// # Errors
    /// [`ClientError::NoCommand`], [`ClientError::CredentialsRequired`] or
    /// [`ClientError::Busy`]; the first two also set the page error.
    pub fn begin_execution(&mut self, working_dir: &str) -> ClientResult<ExecutionTicket> {
        let command = match &self.current {
            None => {
                self.error = Some(ClientError::NoCommand.to_string());
                return Err(ClientError::NoCommand);
            }
            Some(current) if current.requires_credentials() => {
                self.error = Some(ClientError::CredentialsRequired.to_string());
                return Err(ClientError::CredentialsRequired);
            }
            Some(current) => current.command.trim().to_string(),
        };
        if self.pending_execution.is_some() {
            return Err(ClientError::Busy);
        }

        let working_dir = Some(working_dir.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_owned);
        let id = self.issue_id();
        self.pending_execution = Some(id);
        self.execution = ExecutionPanel::Running;
        debug!("Execution #{} started: {:?} in {:?}", id, command, working_dir);

        Ok(ExecutionTicket {
            id,
            command,
            working_dir,
        })
    }

    /// Apply a finished execution. Results for a command that is no longer
    /// current are dropped.
    pub fn complete_execution(
        &mut self,
        ticket: &ExecutionTicket,
        result: ClientResult<ExecutionResult>,
    ) -> Outcome {
        let still_current = self
            .current
            .as_ref()
            .is_some_and(|c| c.command.trim() == ticket.command);
        if self.pending_execution != Some(ticket.id) || !still_current {
            debug!("Dropping stale execution #{}", ticket.id);
            return Outcome::Stale;
        }
        self.pending_execution = None;

        match result {
            Ok(execution) => {
                self.execution = ExecutionPanel::Finished(execution);
                Outcome::Applied
            }
            Err(e) => {
                self.execution = ExecutionPanel::Failed(e.to_string());
                Outcome::Failed
            }
        }
    }

    /// Translate the current input and wait for the answer
    ///
    /// # Errors
    /// Only the local errors of [`begin_translation`](Self::begin_translation);
    /// backend failures are reported through [`error`](Self::error).
    pub async fn submit(&mut self, backend: &dyn Backend) -> ClientResult<Outcome> {
        let ticket = self.begin_translation()?;
        let result = backend.translate(&ticket.query).await;
        Ok(self.complete_translation(&ticket, result))
    }

    /// Run the current command and wait for the answer
    ///
    /// # Errors
    /// Only the local errors of [`begin_execution`](Self::begin_execution).
    pub async fn execute(
        &mut self,
        backend: &dyn Backend,
        working_dir: &str,
    ) -> ClientResult<Outcome> {
        let ticket = self.begin_execution(working_dir)?;
        let result = backend
            .execute(&ticket.command, ticket.working_dir.as_deref())
            .await;
        Ok(self.complete_execution(&ticket, result))
    }

    /// Empty the input and reset the result panels. In-flight requests are
    /// abandoned.
    pub fn clear(&mut self) {
        self.input.clear();
        self.validation = None;
        self.error = None;
        self.current = None;
        self.execution = ExecutionPanel::Hidden;
        self.pending_translation = None;
        self.pending_execution = None;
    }

    /// Flag the current command as a favorite in history
    ///
    /// # Errors
    /// [`ClientError::NoCommand`] when nothing has been translated.
    pub fn favorite_current(&mut self) -> ClientResult<bool> {
        let command = self
            .current_command()
            .ok_or(ClientError::NoCommand)?
            .to_string();
        Ok(self.history.mark_favorite(&command))
    }

    /// Put a history entry's query back into the input. Returns whether the
    /// caller should resubmit, or `None` if the entry is gone.
    pub fn reuse(&mut self, entry_id: &str) -> Option<bool> {
        let query = self.history.reuse(entry_id)?.to_string();
        self.input = query;
        self.validation = None;
        Some(self.resubmit_on_reuse)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Command text suitable for copying, excluding the credentials sentinel
    #[must_use]
    pub fn current_command(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|c| !c.requires_credentials())
            .map(|c| c.command.trim())
    }

    #[must_use]
    pub fn current(&self) -> Option<&TranslationResult> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn translation_view(&self) -> Option<TranslationView> {
        self.current.as_ref().map(TranslationView::new)
    }

    #[must_use]
    pub fn execution_view(&self) -> Option<ExecutionView> {
        self.execution.view()
    }

    #[must_use]
    pub fn execution(&self) -> &ExecutionPanel {
        &self.execution
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    #[must_use]
    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_messages(&mut self) {
        self.validation = None;
        self.error = None;
    }

    #[must_use]
    pub fn is_translating(&self) -> bool {
        self.pending_translation.is_some()
    }

    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.pending_execution.is_some()
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}
