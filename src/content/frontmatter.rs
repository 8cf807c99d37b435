//! Front-matter parsing for markdown posts

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept either `tags: foo` or `tags: [foo, bar]`
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

fn default_published() -> bool {
    true
}

/// Front-matter of a markdown post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    /// List form; the first entry is used when `category` is absent
    #[serde(deserialize_with = "string_or_vec")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    pub cover: Option<String>,
    pub author: Option<String>,
    pub author_avatar: Option<String>,
    pub author_bio: Option<String>,
    pub reading_time: Option<u32>,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl FrontMatter {
    /// Split content into front-matter and body
    ///
    /// Content without a recognizable front-matter block is returned whole
    /// with default front-matter.
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start();

        if let Some(rest) = content.strip_prefix("---") {
            return Ok(Self::parse_yaml(content, rest));
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok((Self::unset(), content))
    }

    /// Default front-matter with posts published
    fn unset() -> Self {
        Self {
            published: true,
            ..Default::default()
        }
    }

    fn parse_yaml<'a>(content: &'a str, rest: &'a str) -> (Self, &'a str) {
        let rest = rest.trim_start_matches(['\n', '\r']);
        let Some(end) = rest.find("\n---") else {
            return (Self::unset(), content);
        };

        let yaml = &rest[..end];
        let body = rest[end + 4..].trim_start_matches(['\n', '\r']);

        if yaml.trim().is_empty() {
            return (Self::unset(), body);
        }

        // a `---` horizontal rule followed by prose is not front-matter
        if !yaml.lines().any(looks_like_yaml_key) {
            return (Self::unset(), content);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml) {
            Ok(fm) => (fm, body),
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, treating as content: {}", e);
                (Self::unset(), content)
            }
        }
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        let (json, body) = if let Some(rest) = content.strip_prefix(";;;") {
            let end = rest
                .find(";;;")
                .ok_or_else(|| anyhow!("Unterminated JSON front-matter"))?;
            (&rest[..end], &rest[end + 3..])
        } else {
            let end = matching_brace(content).ok_or_else(|| anyhow!("Invalid JSON front-matter"))?;
            (&content[..end], &content[end..])
        };

        let fm: FrontMatter = serde_json::from_str(json)
            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
        Ok((fm, body.trim_start_matches(['\n', '\r'])))
    }

    /// The category name, from `category` or the first of `categories`
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_deref()
            .or_else(|| self.categories.first().map(String::as_str))
    }

    /// Parse the date string into a DateTime
    pub fn parse_date(&self) -> Option<DateTime<Local>> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// `key: value` with a plain identifier key, not a URL scheme
fn looks_like_yaml_key(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return false;
    }
    let Some((key, value)) = line.split_once(':') else {
        return false;
    };
    let plain_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    plain_key && !matches!(key, "http" | "https" | "ftp") && (value.is_empty() || value.starts_with(' '))
}

/// Byte offset just past the brace closing the opening `{`
fn matching_brace(content: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in content.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a date string in the common front-matter formats
fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&d.and_hms_opt(0, 0, 0)?).earliest();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
category: Technology
tags:
  - rust
  - web
cover: /images/hello.jpg
author: Ada Writer
reading_time: 4
---

This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.category_name(), Some("Technology"));
        assert_eq!(fm.tags, vec!["rust", "web"]);
        assert_eq!(fm.cover.as_deref(), Some("/images/hello.jpg"));
        assert_eq!(fm.author.as_deref(), Some("Ada Writer"));
        assert_eq!(fm.reading_time, Some(4));
        assert!(fm.published);
        assert!(body.starts_with("This is the content."));
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Test Post", "tags": ["a", "b"], "published": false}

This is content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert!(!fm.published);
        assert!(body.contains("This is content."));
    }

    #[test]
    fn test_single_string_lists_and_categories_fallback() {
        let content = "---\ntitle: One\ntags: Notes\ncategories: Travel\n---\nBody\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["Notes"]);
        assert_eq!(fm.category_name(), Some("Travel"));
    }

    #[test]
    fn test_no_frontmatter_is_published() {
        let (fm, body) = FrontMatter::parse("Just text.").unwrap();
        assert!(fm.title.is_none());
        assert!(fm.published);
        assert_eq!(body, "Just text.");
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = "\n---\n\nCheck https://example.com and more prose\n\n---\nMore.\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert!(body.contains("https://example.com"));
    }

    #[test]
    fn test_parse_date() {
        let fm = FrontMatter {
            date: Some("2024-01-15 10:30:00".to_string()),
            ..Default::default()
        };
        let dt = fm.parse_date().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");

        let fm = FrontMatter {
            date: Some("2024/02/03".to_string()),
            ..Default::default()
        };
        assert_eq!(
            fm.parse_date().unwrap().format("%Y-%m-%d").to_string(),
            "2024-02-03"
        );

        let fm = FrontMatter {
            date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(fm.parse_date().is_none());
    }
}
