//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,

    // Pagination
    pub per_page: usize,

    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub sidebar: SidebarConfig,
    #[serde(default)]
    pub preference: PreferenceConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "ArticulatePost".to_string(),
            subtitle: "Ideas worth reading".to_string(),
            description: "Thoughtful articles on technology, lifestyle, AI, travel and business."
                .to_string(),
            author: "ArticulatePost Team".to_string(),
            language: "en".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),

            per_page: 6,

            content: ContentConfig::default(),
            sidebar: SidebarConfig::default(),
            preference: PreferenceConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Where posts come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSourceKind {
    /// Seeded lorem-ipsum fixture
    Synthetic,
    /// Markdown files under `source/_posts`
    Markdown,
}

/// Content source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub source: ContentSourceKind,
    /// Seed for the synthetic fixture; `None` picks a fresh one per run
    pub seed: Option<u64>,
    pub post_count: usize,
    pub author_count: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source: ContentSourceKind::Synthetic,
            seed: None,
            post_count: 20,
            author_count: 5,
        }
    }
}

/// Sidebar widget sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    pub popular: usize,
    pub recent: usize,
    pub related: usize,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            popular: 5,
            recent: 5,
            related: 3,
        }
    }
}

/// Backing store for the theme preference slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    File,
    Memory,
    Disabled,
}

/// Platform color-scheme signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Read `ARTICULATE_COLOR_SCHEME` from the environment
    Auto,
    Dark,
    Light,
    /// No platform signal available
    None,
}

/// Theme preference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceConfig {
    pub storage: StorageKind,
    /// Preference file, relative to the site directory
    pub path: String,
    pub platform: PlatformKind,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::File,
            path: ".articulate/preferences.json".to_string(),
            platform: PlatformKind::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "ArticulatePost");
        assert_eq!(config.per_page, 6);
        assert_eq!(config.content.source, ContentSourceKind::Synthetic);
        assert_eq!(config.content.post_count, 20);
        assert_eq!(config.sidebar.related, 3);
        assert_eq!(config.preference.storage, StorageKind::File);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Magazine
per_page: 4
content:
  source: markdown
  seed: 42
preference:
  storage: disabled
  platform: dark
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Magazine");
        assert_eq!(config.per_page, 4);
        assert_eq!(config.content.source, ContentSourceKind::Markdown);
        assert_eq!(config.content.seed, Some(42));
        // untouched fields keep their defaults
        assert_eq!(config.content.post_count, 20);
        assert_eq!(config.preference.storage, StorageKind::Disabled);
        assert_eq!(config.preference.platform, PlatformKind::Dark);
        assert_eq!(config.preference.path, ".articulate/preferences.json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From Disk\nsidebar:\n  popular: 3\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From Disk");
        assert_eq!(config.sidebar.popular, 3);
        assert_eq!(config.sidebar.recent, 5);
    }
}
