//! Platform color-scheme signal

use std::env;

/// Environment variable read by [`EnvScheme`]
pub const COLOR_SCHEME_VAR: &str = "ARTICULATE_COLOR_SCHEME";

/// Answers "does the platform prefer dark mode?"
///
/// `None` means the platform gives no answer.
pub trait ColorSchemeSource {
    fn prefers_dark(&self) -> Option<bool>;
}

/// A fixed answer, typically from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedScheme(pub Option<bool>);

impl ColorSchemeSource for FixedScheme {
    fn prefers_dark(&self) -> Option<bool> {
        self.0
    }
}

/// Reads `dark` or `light` from an environment variable
#[derive(Debug, Clone)]
pub struct EnvScheme {
    var: String,
}

impl EnvScheme {
    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
        }
    }
}

impl Default for EnvScheme {
    fn default() -> Self {
        Self::new(COLOR_SCHEME_VAR)
    }
}

impl ColorSchemeSource for EnvScheme {
    fn prefers_dark(&self) -> Option<bool> {
        let value = env::var(&self.var).ok()?;
        parse_scheme(&value)
    }
}

fn parse_scheme(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "dark" => Some(true),
        "light" => Some(false),
        _ => None,
    }
}
