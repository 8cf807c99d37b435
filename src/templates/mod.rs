//! Built-in magazine templates using the Tera template engine
//!
//! Every template is embedded in the binary. Views are plain serializable
//! structs assembled by [`crate::pages`].

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers::{self, ShareLink};

/// Template renderer with the embedded magazine theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all magazine templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Values reaching templates are either trusted content HTML or
        // escaped by the page builder
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("magazine/layout.html")),
            ("home.html", include_str!("magazine/home.html")),
            ("post.html", include_str!("magazine/post.html")),
            ("post_missing.html", include_str!("magazine/post_missing.html")),
            ("listing.html", include_str!("magazine/listing.html")),
            ("about.html", include_str!("magazine/about.html")),
            ("contact.html", include_str!("magazine/contact.html")),
            ("not_found.html", include_str!("magazine/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("magazine/partials/header.html"),
            ),
            (
                "partials/footer.html",
                include_str!("magazine/partials/footer.html"),
            ),
            (
                "partials/sidebar.html",
                include_str!("magazine/partials/sidebar.html"),
            ),
            ("macros.html", include_str!("magazine/macros.html")),
            (
                "partials/comments.html",
                include_str!("magazine/partials/comments.html"),
            ),
            (
                "partials/notice.html",
                include_str!("magazine/partials/notice.html"),
            ),
            (
                "partials/theme_script.html",
                include_str!("magazine/partials/theme_script.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: cut to `length` characters and append the omission
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}{}", truncated, omission)))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub root: String,
}

/// Theme marker and toggle state for the `<html>` element
#[derive(Debug, Clone, Serialize)]
pub struct ThemeData {
    pub mode: String,
    pub class_attr: String,
    pub data_theme: String,
    /// Label of the toggle button, naming the mode it switches to
    pub toggle_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticeView {
    pub code: String,
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLink {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

/// Post summary used by cards, the hero and sidebar lists
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: String,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub image_url: String,
    pub category: String,
    pub category_url: String,
    pub author_name: String,
    pub author_avatar: String,
    pub date_long: String,
    pub date_short: String,
    pub month_day: String,
    pub date_iso: String,
    pub reading_time: u32,
    pub comment_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub card: PostCard,
    pub content: String,
    pub author_bio: String,
    pub full_url: String,
    pub tags: Vec<TagLink>,
    pub share: Vec<ShareLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    pub id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub content: String,
    pub date: String,
    pub ago: String,
    pub likes: u32,
    pub liked: bool,
    pub like_action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub content: String,
    pub date: String,
    pub ago: String,
    pub likes: u32,
    pub liked: bool,
    pub like_action: String,
    pub reply_action: String,
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarData {
    pub categories: String,
    pub popular: Vec<PostCard>,
    pub recent: Vec<PostCard>,
}
