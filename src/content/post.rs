//! Post, author and comment models

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Fixed set of post categories, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technology,
    Lifestyle,
    #[serde(rename = "AI")]
    Ai,
    Travel,
    Business,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 5] = [
        Category::Technology,
        Category::Lifestyle,
        Category::Ai,
        Category::Travel,
        Category::Business,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Lifestyle => "Lifestyle",
            Category::Ai => "AI",
            Category::Travel => "Travel",
            Category::Business => "Business",
        }
    }

    /// Lowercase URL segment (`/category/<slug>`)
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Lifestyle => "lifestyle",
            Category::Ai => "ai",
            Category::Travel => "travel",
            Category::Business => "business",
        }
    }

    /// Case-insensitive name comparison
    pub fn matches(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = super::ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.matches(s.trim()))
            .ok_or_else(|| super::ContentError::UnknownCategory(s.to_string()))
    }
}

/// A post author, shared by every post they wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub bio: String,
}

/// The id/name/avatar triple embedded in comments and replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

/// A reply to a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author: CommentAuthor,
    pub content: String,
    pub date: DateTime<Local>,
    /// Baseline like count; viewer likes are tracked outside the record
    pub likes: u32,
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: CommentAuthor,
    pub content: String,
    pub date: DateTime<Local>,
    /// Baseline like count; viewer likes are tracked outside the record
    pub likes: u32,
    /// Replies in the order they were written
    pub replies: Vec<Reply>,
}

impl Comment {
    /// Find one of this comment's replies
    pub fn reply(&self, id: &str) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == id)
    }
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier, also the URL segment
    pub id: String,

    pub title: String,

    pub excerpt: String,

    /// Rendered HTML body
    pub content: String,

    /// Cover image URL
    pub image_url: String,

    pub category: Category,

    pub author: Arc<Author>,

    /// Publication date
    pub published: DateTime<Local>,

    /// Estimated reading time in minutes
    pub reading_time: u32,

    /// Comments in the order they were written
    pub comments: Vec<Comment>,

    /// Distinct tags, in the order they were assigned
    pub tags: Vec<String>,
}

impl Post {
    /// URL path of the post page
    pub fn path(&self) -> String {
        format!("post/{}/", self.id)
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Find a comment by id
    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Find a reply anywhere in the thread
    pub fn reply(&self, id: &str) -> Option<&Reply> {
        self.comments.iter().find_map(|c| c.reply(id))
    }

    /// Whether the keyword (already lowercased) occurs in the searchable fields
    pub(crate) fn contains_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.excerpt.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}
