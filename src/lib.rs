//! nlcmd - natural language to shell command translator client
//!
//! Sends plain-English requests to a translator backend, shows the resulting
//! command with its explanation and risk, optionally runs it remotely, and
//! keeps a bounded history of past translations.
//!
//! # Modules
//!
//! - [`config`]: Configuration management and serialization
//! - [`api`]: Backend trait, HTTP client and response decoding
//! - [`controller`]: Page state for query submission and execution
//! - [`view`]: Display models for translations and execution output
//! - [`history`]: Bounded, persisted command history
//! - [`watermark`]: Cosmetic page watermark
//! - [`tui`]: Interactive terminal page
//! - [`cli`]: One-shot commands
//! - [`keybindings`]: Keyboard shortcut handling
//! - [`colors`]: 24-bit true color palette
//! - [`progress_bar`]: Busy indicator for in-flight requests

pub mod api;
pub mod cli;
pub mod colors;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod keybindings;
pub mod progress_bar;
pub mod tui;
pub mod view;
pub mod watermark;
