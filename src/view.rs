//! Display-ready values derived from backend results.
//!
//! Both the TUI and the one-shot CLI render from these, so every placeholder
//! and precedence rule lives here once.

use crate::api::{Breakdown, ExecutionResult, TranslationResult};

pub const CREDENTIALS_REQUIRED_TEXT: &str = "API Key Required";
pub const NO_EXPLANATION: &str = "No explanation available.";
pub const NO_BREAKDOWN: &str = "No breakdown available";
pub const NO_OUTPUT: &str = "Command executed with no output";
pub const EMPTY_HISTORY: &str = "No command history yet";
pub const EXIT_CODE_UNKNOWN: &str = "N/A";

/// Width of the rule between the execution header and body
const HEADER_RULE_WIDTH: usize = 50;

/// Visual severity class, one per risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Safe,
    Info,
    Warning,
    Danger,
}

impl Severity {
    /// 0..=3 map to safe/info/warning/danger; anything else is a warning
    #[must_use]
    pub fn from_risk_level(level: Option<i64>) -> Self {
        match level {
            Some(0) => Self::Safe,
            Some(1) => Self::Info,
            Some(3) => Self::Danger,
            _ => Self::Warning,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    #[must_use]
    pub fn icon(self) -> char {
        match self {
            Self::Safe => '✔',
            Self::Info => 'ℹ',
            Self::Warning => '!',
            Self::Danger => '⚠',
        }
    }
}

/// What goes in the command slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandView {
    Command(String),
    CredentialsRequired,
}

impl CommandView {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Command(c) => c,
            Self::CredentialsRequired => CREDENTIALS_REQUIRED_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyView {
    pub text: String,
    pub severity: Severity,
}

/// Everything shown for one translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationView {
    pub command: CommandView,
    pub explanation: String,
    pub breakdown: Result<Vec<(String, String)>, &'static str>,
    pub safety: Option<SafetyView>,
    pub simulation: Option<String>,
    pub risk: Option<(i64, Severity)>,
    pub signature: Option<String>,
}

impl TranslationView {
    #[must_use]
    pub fn new(result: &TranslationResult) -> Self {
        let credentials = result.requires_credentials();

        let command = if credentials {
            CommandView::CredentialsRequired
        } else {
            CommandView::Command(result.command.trim().to_string())
        };

        let explanation = if result.explanation.trim().is_empty() {
            NO_EXPLANATION.to_string()
        } else {
            result.explanation.clone()
        };

        let breakdown = match &result.breakdown {
            Breakdown::Structured(rows) => Ok(rows.clone()),
            Breakdown::Unavailable => Err(NO_BREAKDOWN),
        };

        let safety = result.safety_warning.as_ref().map(|text| SafetyView {
            text: text.clone(),
            severity: if credentials {
                Severity::Danger
            } else {
                Severity::from_risk_level(result.risk_level)
            },
        });

        Self {
            command,
            explanation,
            breakdown,
            safety,
            simulation: result.simulation.clone(),
            risk: result
                .risk_level
                .map(|level| (level, Severity::from_risk_level(Some(level)))),
            signature: result.watermark.clone(),
        }
    }
}

/// Status badge of the execution panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    CompletedWithErrors,
    CompletedSuccessfully,
    Error,
    Completed,
    Failed,
}

impl ExecutionStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::CompletedWithErrors => "Completed with errors",
            Self::CompletedSuccessfully => "Completed successfully",
            Self::Error => "Error",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    #[must_use]
    pub fn severity(self) -> Option<Severity> {
        match self {
            Self::Running => Some(Severity::Info),
            Self::CompletedWithErrors => Some(Severity::Warning),
            Self::CompletedSuccessfully => Some(Severity::Safe),
            Self::Error | Self::Failed => Some(Severity::Danger),
            Self::Completed => None,
        }
    }
}

/// Styling for the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStyle {
    Success,
    Failure,
    Neutral,
}

impl ExitStyle {
    #[must_use]
    pub fn for_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Success,
            Some(c) if c > 0 => Self::Failure,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionView {
    pub status: ExecutionStatus,
    pub header: Vec<String>,
    pub body: String,
    /// The body is a placeholder rather than command output
    pub body_is_placeholder: bool,
    pub exit_code: String,
    pub exit_style: ExitStyle,
    pub duration: Option<String>,
}

impl ExecutionView {
    #[must_use]
    pub fn running() -> Self {
        Self {
            status: ExecutionStatus::Running,
            header: Vec::new(),
            body: "Executing command...".to_string(),
            body_is_placeholder: true,
            exit_code: EXIT_CODE_UNKNOWN.to_string(),
            exit_style: ExitStyle::Neutral,
            duration: None,
        }
    }

    #[must_use]
    pub fn failed(message: &str) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            header: Vec::new(),
            body: format!("Error: {message}"),
            body_is_placeholder: false,
            exit_code: EXIT_CODE_UNKNOWN.to_string(),
            exit_style: ExitStyle::Neutral,
            duration: None,
        }
    }

    /// Output precedence: stderr, then stdout, then the error field, then a
    /// "no output" placeholder
    #[must_use]
    pub fn completed(result: &ExecutionResult) -> Self {
        let (status, body, body_is_placeholder) = if !result.stderr.trim().is_empty() {
            (ExecutionStatus::CompletedWithErrors, result.stderr.clone(), false)
        } else if !result.stdout.is_empty() {
            (ExecutionStatus::CompletedSuccessfully, result.stdout.clone(), false)
        } else if let Some(error) = &result.error {
            (ExecutionStatus::Error, error.clone(), false)
        } else {
            (ExecutionStatus::Completed, NO_OUTPUT.to_string(), true)
        };

        let mut header = Vec::new();
        if let Some(info) = &result.system_info {
            header.push(format!("System: {info}"));
        }
        if !result.working_dir.is_empty() {
            header.push(format!("Working Directory: {}", result.working_dir));
        }
        if !header.is_empty() {
            header.push(String::new());
            header.push("-".repeat(HEADER_RULE_WIDTH));
        }

        let exit_code = match (result.exit_code, &result.exit_meaning) {
            (Some(code), Some(meaning)) => format!("{code} ({meaning})"),
            (Some(code), None) => code.to_string(),
            (None, _) => EXIT_CODE_UNKNOWN.to_string(),
        };

        Self {
            status,
            header,
            body,
            body_is_placeholder,
            exit_code,
            exit_style: ExitStyle::for_code(result.exit_code),
            duration: result.execution_time.map(|secs| format!("{secs:.2}s")),
        }
    }
}
