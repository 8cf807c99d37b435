//! Document-level style marker
//!
//! The `<html>` element of every rendered page carries the marker: the
//! `dark` class while dark mode is active and a `data-theme` attribute
//! naming the mode.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::RwLock;

use super::ThemeMode;

const DARK_CLASS: &str = "dark";

/// Snapshot of the root element's theme attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMarker {
    pub classes: BTreeSet<String>,
    pub data_theme: String,
}

impl DocumentMarker {
    /// Value for the `class` attribute
    pub fn class_attr(&self) -> String {
        self.classes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// The root element whose marker follows the theme
#[derive(Debug, Default)]
pub struct DocumentRoot {
    marker: RwLock<DocumentMarker>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the marker for `mode`
    pub fn apply(&self, mode: ThemeMode) {
        let mut marker = self.marker.write().unwrap_or_else(|e| e.into_inner());
        match mode {
            ThemeMode::Dark => marker.classes.insert(DARK_CLASS.to_string()),
            ThemeMode::Light => marker.classes.remove(DARK_CLASS),
        };
        marker.data_theme = mode.as_str().to_string();
    }

    pub fn marker(&self) -> DocumentMarker {
        self.marker
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
