//! Markdown post source - loads posts from `source/_posts`

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::{Author, Category, FrontMatter, MarkdownRenderer, Post, PostSource};
use crate::helpers::{strip_html, truncate};

const WORDS_PER_MINUTE: usize = 200;
const EXCERPT_LENGTH: usize = 200;

/// Loads posts from markdown files with front-matter
pub struct MarkdownSource {
    posts_dir: PathBuf,
    renderer: MarkdownRenderer,
}

impl MarkdownSource {
    /// Source reading `<source_dir>/_posts`
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            posts_dir: source_dir.as_ref().join("_posts"),
            renderer: MarkdownRenderer::new(),
        }
    }

    fn load_post(
        &self,
        path: &Path,
        authors: &mut HashMap<String, Arc<Author>>,
    ) -> Result<Option<Post>> {
        let raw = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&raw)?;

        if !fm.published {
            tracing::debug!("Skipping unpublished post {:?}", path);
            return Ok(None);
        }

        let category: Category = fm
            .category_name()
            .context("missing category")?
            .parse()?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = fm.id.clone().unwrap_or_else(|| slug::slugify(&stem));
        let title = fm.title.clone().unwrap_or_else(|| stem.clone());

        let (marked_excerpt, body) = MarkdownRenderer::split_excerpt(body);
        let content = self.renderer.render(&body)?;
        let plain = strip_html(&content);

        let excerpt = match (&fm.excerpt, marked_excerpt) {
            (Some(excerpt), _) => excerpt.clone(),
            (None, Some(marked)) => strip_html(&self.renderer.render(&marked)?).trim().to_string(),
            (None, None) => truncate(plain.trim(), EXCERPT_LENGTH, None),
        };

        let reading_time = fm
            .reading_time
            .filter(|&minutes| minutes > 0)
            .unwrap_or_else(|| estimate_reading_time(&plain));

        let published = fm.parse_date().unwrap_or_else(|| file_mtime(path));
        let author = shared_author(&fm, authors);

        let mut tags: Vec<String> = Vec::with_capacity(fm.tags.len());
        for tag in fm.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Ok(Some(Post {
            id,
            title,
            excerpt,
            content,
            image_url: fm.cover.unwrap_or_default(),
            category,
            author,
            published,
            reading_time,
            comments: Vec::new(),
            tags,
        }))
    }
}

impl PostSource for MarkdownSource {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn load(&self) -> Result<Vec<Post>> {
        if !self.posts_dir.exists() {
            tracing::warn!("Posts directory {:?} does not exist", self.posts_dir);
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();
        let mut authors = HashMap::new();
        let mut seen = HashSet::new();

        for entry in WalkDir::new(&self.posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }
            match self.load_post(path, &mut authors) {
                Ok(Some(post)) => {
                    if !seen.insert(post.id.clone()) {
                        tracing::warn!("Skipping {:?}: duplicate post id {}", path, post.id);
                        continue;
                    }
                    posts.push(post);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load post {:?}: {}", path, e),
            }
        }

        Ok(posts)
    }
}

/// One `Arc<Author>` per distinct author name
fn shared_author(fm: &FrontMatter, authors: &mut HashMap<String, Arc<Author>>) -> Arc<Author> {
    let name = fm.author.clone().unwrap_or_else(|| "Anonymous".to_string());
    let entry = authors.entry(name.clone()).or_insert_with(|| {
        Arc::new(Author {
            id: slug::slugify(&name),
            name,
            avatar: fm.author_avatar.clone().unwrap_or_default(),
            bio: fm.author_bio.clone().unwrap_or_default(),
        })
    });
    Arc::clone(entry)
}

/// Minutes at 200 words per minute, at least one
fn estimate_reading_time(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn file_mtime(path: &Path) -> DateTime<Local> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now())
}

fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "md" || ext == "markdown")
        .unwrap_or(false)
}
