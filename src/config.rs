//! Editor configuration
//!
//! Configuration is loaded by an external collaborator and consumed here at
//! action-build time. Validation is separate from parsing: an invalid field
//! falls back to its default and surfaces as a status message rather than
//! aborting the editor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SYNTAX_LANGUAGE: &str = "plaintext";
pub const DEFAULT_TAB_SIZE: usize = 4;
pub const DEFAULT_LINE_WRAP: &str = "character";

const LINE_WRAP_MODES: &[&str] = &["character", "word"];
const MENU_COMMAND_MODES: &[&str] = &["silent", "terminal", "insert", "insertChoice", "fileLocations"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub syntax_language: String,
    pub tab_size: usize,
    pub line_wrap: String,
    pub menu_commands: Vec<MenuCommandConfig>,
    pub styles: HashMap<String, StyleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            syntax_language: String::from(DEFAULT_SYNTAX_LANGUAGE),
            tab_size: DEFAULT_TAB_SIZE,
            line_wrap: String::from(DEFAULT_LINE_WRAP),
            menu_commands: Vec::new(),
            styles: HashMap::new(),
        }
    }
}

/// A user-defined menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MenuCommandConfig {
    pub name: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_cmd: Option<String>,
}

impl Default for MenuCommandConfig {
    fn default() -> Self {
        MenuCommandConfig {
            name: String::new(),
            mode: String::from("silent"),
            shell_cmd: None,
        }
    }
}

/// Display styling for a named UI element or token role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub background_color: String,
}

impl Config {
    /// Check every field, reporting all violations.
    pub fn validation_errors(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.tab_size == 0 {
            errors.push(ConfigError::TabSizeZero);
        }
        if !LINE_WRAP_MODES.contains(&self.line_wrap.as_str()) {
            errors.push(ConfigError::InvalidLineWrap);
        }
        for menu_command in &self.menu_commands {
            if !MENU_COMMAND_MODES.contains(&menu_command.mode.as_str()) {
                errors.push(ConfigError::InvalidMenuMode {
                    name: menu_command.name.clone(),
                });
            }
        }
        errors
    }

    /// Check every field, failing on the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.validation_errors().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Replace invalid fields with their defaults, returning what was
    /// rejected so the editor can surface it.
    pub fn normalize(&mut self) -> Vec<ConfigError> {
        let errors = self.validation_errors();
        for error in &errors {
            match error {
                ConfigError::TabSizeZero => self.tab_size = DEFAULT_TAB_SIZE,
                ConfigError::InvalidLineWrap => {
                    self.line_wrap = String::from(DEFAULT_LINE_WRAP);
                }
                ConfigError::InvalidMenuMode { name } => {
                    let name = name.clone();
                    self.menu_commands.retain(|c| c.name != name);
                }
            }
        }
        errors
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
