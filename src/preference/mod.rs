//! Light/dark theme preference
//!
//! One [`ThemePreference`] exists per running session. It is constructed
//! explicitly, shared by `Arc`, and publishes every change through a
//! `tokio::sync::watch` channel so dependent views can follow along.
//!
//! Each state change, including the initial one, commits two side effects
//! together: the document marker is applied and the mode is persisted.
//! Persistence is best effort; failures are logged and never surface.

mod document;
mod platform;
mod storage;

pub use document::{DocumentMarker, DocumentRoot};
pub use platform::{ColorSchemeSource, EnvScheme, FixedScheme, COLOR_SCHEME_VAR};
pub use storage::{DisabledStorage, FileStorage, MemoryStorage, PreferenceStorage, StorageError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use tokio::sync::watch;

/// Storage key of the persisted mode
pub const STORAGE_KEY: &str = "theme";

/// Display mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for strings other than `light` and `dark`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid theme mode: {0:?}")]
pub struct InvalidThemeMode(pub String);

impl FromStr for ThemeMode {
    type Err = InvalidThemeMode;

    /// Exact match; persisted values are written by us
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(InvalidThemeMode(other.to_string())),
        }
    }
}

/// Session-wide theme state
pub struct ThemePreference {
    mode: Mutex<ThemeMode>,
    key: String,
    storage: Box<dyn PreferenceStorage>,
    document: DocumentRoot,
    changes: watch::Sender<ThemeMode>,
}

impl ThemePreference {
    /// Initialize from storage, then the platform signal, then `light`
    pub fn initialize(
        storage: Box<dyn PreferenceStorage>,
        platform: &dyn ColorSchemeSource,
    ) -> Self {
        Self::with_key(STORAGE_KEY, storage, platform)
    }

    /// Like [`ThemePreference::initialize`] with a custom storage key
    pub fn with_key(
        key: &str,
        storage: Box<dyn PreferenceStorage>,
        platform: &dyn ColorSchemeSource,
    ) -> Self {
        let mode = resolve_initial(key, storage.as_ref(), platform);
        let (changes, _) = watch::channel(mode);

        let preference = Self {
            mode: Mutex::new(mode),
            key: key.to_string(),
            storage,
            document: DocumentRoot::new(),
            changes,
        };
        preference.commit(mode);
        tracing::debug!("Theme initialized to {}", mode);
        preference
    }

    /// The current mode
    pub fn current(&self) -> ThemeMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flip between light and dark, returning the new mode
    pub fn toggle(&self) -> ThemeMode {
        let mut mode = self.mode.lock().unwrap_or_else(|e| e.into_inner());
        let next = mode.toggled();
        *mode = next;
        self.commit(next);
        self.changes.send_replace(next);
        tracing::info!("Theme switched to {}", next);
        next
    }

    /// Receiver that observes every change
    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.changes.subscribe()
    }

    /// Snapshot of the document marker
    pub fn marker(&self) -> DocumentMarker {
        self.document.marker()
    }

    /// Apply the marker and persist, as one step
    fn commit(&self, mode: ThemeMode) {
        self.document.apply(mode);
        if let Err(e) = self.storage.write(&self.key, mode.as_str()) {
            tracing::warn!("Could not persist theme preference: {}", e);
        }
    }
}

impl fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemePreference")
            .field("mode", &self.current())
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

fn resolve_initial(
    key: &str,
    storage: &dyn PreferenceStorage,
    platform: &dyn ColorSchemeSource,
) -> ThemeMode {
    match storage.read(key) {
        Ok(Some(value)) => match value.parse() {
            Ok(mode) => return mode,
            Err(e) => tracing::debug!("Ignoring persisted theme: {}", e),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!("Theme storage unavailable, using platform preference: {}", e),
    }

    platform
        .prefers_dark()
        .map(ThemeMode::from_prefers_dark)
        .unwrap_or_default()
}
