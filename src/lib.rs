//! articulate: the ArticulatePost blog/magazine site
//!
//! An in-memory post collection with a read-only query layer, a light/dark
//! theme preference, and server-rendered pages that can be served live or
//! exported as a static site.

pub mod commands;
pub mod config;
pub mod content;
pub mod forms;
pub mod generator;
pub mod helpers;
pub mod pages;
pub mod preference;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use config::{ContentSourceKind, PlatformKind, StorageKind};
use content::{ContentStore, MarkdownSource, PostSource, SyntheticSource};
use preference::{
    ColorSchemeSource, DisabledStorage, EnvScheme, FileStorage, FixedScheme, MemoryStorage,
    PreferenceStorage, ThemePreference,
};

/// The main site application
#[derive(Debug, Clone)]
pub struct Articulate {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Articulate {
    /// Create a new site instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site instance with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// Build the post collection from the configured source
    pub fn load_store(&self) -> Result<ContentStore> {
        let content = &self.config.content;
        let source: Box<dyn PostSource> = match content.source {
            ContentSourceKind::Synthetic => {
                let seed = content.seed.unwrap_or_else(rand::random);
                tracing::info!("Synthetic content seed: {}", seed);
                Box::new(SyntheticSource::new(
                    seed,
                    content.post_count,
                    content.author_count,
                ))
            }
            ContentSourceKind::Markdown => Box::new(MarkdownSource::new(&self.source_dir)),
        };

        ContentStore::load(source.as_ref())
    }

    /// Start the session theme from the configured storage and platform
    pub fn theme_preference(&self) -> ThemePreference {
        let settings = &self.config.preference;

        let storage: Box<dyn PreferenceStorage> = match settings.storage {
            StorageKind::File => Box::new(FileStorage::new(self.base_dir.join(&settings.path))),
            StorageKind::Memory => Box::new(MemoryStorage::new()),
            StorageKind::Disabled => Box::new(DisabledStorage),
        };

        let platform: Box<dyn ColorSchemeSource> = match settings.platform {
            PlatformKind::Auto => Box::new(EnvScheme::default()),
            PlatformKind::Dark => Box::new(FixedScheme(Some(true))),
            PlatformKind::Light => Box::new(FixedScheme(Some(false))),
            PlatformKind::None => Box::new(FixedScheme(None)),
        };

        ThemePreference::initialize(storage, platform.as_ref())
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
