use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::config::KeyBindings;

/// Maps key combinations to page actions
#[derive(Debug, Clone)]
pub struct KeybindingManager {
    bindings: HashMap<KeyBinding, Action>,
}

/// Key binding definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub modifiers: Vec<String>,
}

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Open the working directory prompt for the current command
    Execute,
    /// Copy the current command (or selected history entry) to the clipboard
    Copy,
    /// Mark the current command as favorite
    Favorite,
    ToggleHistory,
    ClearHistory,
    /// Clear query and results
    Clear,
    Quit,
}

impl KeybindingManager {
    /// Create new keybinding manager with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&KeyBindings::default())
    }

    /// Build from the `keybindings` config section. Unparseable combos are
    /// logged and skipped.
    #[must_use]
    pub fn from_config(config: &KeyBindings) -> Self {
        let mut manager = Self {
            bindings: HashMap::new(),
        };

        let configured = [
            (&config.execute, Action::Execute),
            (&config.copy, Action::Copy),
            (&config.favorite, Action::Favorite),
            (&config.toggle_history, Action::ToggleHistory),
            (&config.clear_history, Action::ClearHistory),
            (&config.clear, Action::Clear),
        ];
        for (combo, action) in configured {
            if let Err(e) = manager.add_binding_from_string(combo, action) {
                warn!("Ignoring keybinding {:?} for {:?}: {}", combo, action, e);
            }
        }

        // Quit is fixed so a bad config can never trap the user
        manager.add_binding("c", &["Ctrl"], Action::Quit);
        manager.add_binding("d", &["Ctrl"], Action::Quit);
        manager
    }

    /// Add a keybinding
    pub fn add_binding(&mut self, key: &str, modifiers: &[&str], action: Action) {
        let binding = KeyBinding {
            key: key.to_string(),
            modifiers: modifiers
                .iter()
                .map(std::string::ToString::to_string)
                .collect(),
        };
        self.bindings.insert(binding, action);
    }

    /// Parse and add a keybinding from a config string like "Ctrl+E" or
    /// "Ctrl+Shift+X"
    ///
    /// # Errors
    /// Returns an error if the combo string is empty or malformed
    pub fn add_binding_from_string(&mut self, combo: &str, action: Action) -> Result<(), String> {
        if combo.trim().is_empty() {
            return Err("Empty key combination".to_string());
        }

        let parts: Vec<&str> = combo.split('+').map(str::trim).collect();

        // Last part is the key, everything before is modifiers
        let key = match parts.last() {
            Some(k) if !k.is_empty() => *k,
            _ => return Err("Invalid key combination format".to_string()),
        };
        let modifiers = &parts[..parts.len().saturating_sub(1)];

        // Modifier order must match get_action: Ctrl, Shift, Alt
        let mut normalized_mods: Vec<&str> = Vec::with_capacity(3);
        for wanted in ["Ctrl", "Shift", "Alt"] {
            let present = modifiers.iter().any(|m| {
                matches!(
                    (m.to_lowercase().as_str(), wanted),
                    ("ctrl" | "control", "Ctrl") | ("shift", "Shift") | ("alt", "Alt")
                )
            });
            if present {
                normalized_mods.push(wanted);
            }
        }

        let key_lower = key.to_lowercase();
        let normalized_key = match key_lower.as_str() {
            "tab" => "Tab".to_string(),
            "enter" | "return" => "Enter".to_string(),
            "esc" | "escape" => "Esc".to_string(),
            "up" => "Up".to_string(),
            "down" => "Down".to_string(),
            "left" => "Left".to_string(),
            "right" => "Right".to_string(),
            "delete" | "del" => "Delete".to_string(),
            "space" => " ".to_string(),
            k if k.chars().count() == 1 => k.to_string(),
            _ => return Err(format!("Unknown key: {key}")),
        };

        self.add_binding(&normalized_key, &normalized_mods, action);
        Ok(())
    }

    /// Get action for key event
    ///
    /// Character keys are lowercased so Ctrl+Shift+X (reported as 'X') matches
    /// a binding written as ctrl+shift+x.
    #[must_use]
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        let key_str = match code {
            KeyCode::Char(c) => c.to_lowercase().to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            _ => return None,
        };

        let mut mod_vec = Vec::new();
        if modifiers.contains(KeyModifiers::CONTROL) {
            mod_vec.push("Ctrl".to_string());
        }
        if modifiers.contains(KeyModifiers::SHIFT) {
            mod_vec.push("Shift".to_string());
        }
        if modifiers.contains(KeyModifiers::ALT) {
            mod_vec.push("Alt".to_string());
        }

        let binding = KeyBinding {
            key: key_str,
            modifiers: mod_vec,
        };

        self.bindings.get(&binding).copied()
    }
}

impl Default for KeybindingManager {
    fn default() -> Self {
        Self::new()
    }
}
