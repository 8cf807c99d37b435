//! Read-only queries over the post collection

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Author, Category, ContentError, Post, PostSource};

/// The immutable post collection and its queries
///
/// Built once at start-up; every query is a pure function of the
/// collection and its arguments.
#[derive(Debug, Clone)]
pub struct ContentStore {
    posts: Vec<Post>,
    by_id: HashMap<String, usize>,
}

impl ContentStore {
    /// Build a store, checking id uniqueness and reading times
    pub fn new(posts: Vec<Post>) -> Result<Self, ContentError> {
        let mut by_id = HashMap::with_capacity(posts.len());

        for (index, post) in posts.iter().enumerate() {
            if post.reading_time == 0 {
                return Err(ContentError::ZeroReadingTime(post.id.clone()));
            }
            if by_id.insert(post.id.clone(), index).is_some() {
                return Err(ContentError::DuplicateId(post.id.clone()));
            }
        }

        Ok(Self { posts, by_id })
    }

    /// Load the collection from a source
    pub fn load(source: &dyn PostSource) -> anyhow::Result<Self> {
        let posts = source.load()?;
        tracing::info!("Loaded {} posts from {} source", posts.len(), source.name());
        Ok(Self::new(posts)?)
    }

    /// All posts in generation order
    pub fn get_all(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Exact id lookup
    pub fn get_by_id(&self, id: &str) -> Option<&Post> {
        self.by_id.get(id).map(|&index| &self.posts[index])
    }

    /// Posts whose category name equals `category`, ignoring case
    pub fn get_by_category(&self, category: &str) -> Vec<&Post> {
        if category.is_empty() {
            return Vec::new();
        }
        self.posts
            .iter()
            .filter(|p| p.category.matches(category))
            .collect()
    }

    /// Posts carrying `tag`, ignoring case
    pub fn get_by_tag(&self, tag: &str) -> Vec<&Post> {
        if tag.is_empty() {
            return Vec::new();
        }
        let tag = tag.to_lowercase();
        self.posts
            .iter()
            .filter(|p| p.tags.iter().any(|t| t.to_lowercase() == tag))
            .collect()
    }

    /// Case-insensitive substring search over title, excerpt, content and tags
    ///
    /// An empty keyword matches nothing.
    pub fn search(&self, keyword: &str) -> Vec<&Post> {
        if keyword.is_empty() {
            return Vec::new();
        }
        let needle = keyword.to_lowercase();
        self.posts
            .iter()
            .filter(|p| p.contains_lowercase(&needle))
            .collect()
    }

    /// Most-commented posts first
    pub fn get_popular(&self, limit: usize) -> Vec<&Post> {
        let mut ranked: Vec<&Post> = self.posts.iter().collect();
        // stable: equal counts keep collection order
        ranked.sort_by(|a, b| b.comments.len().cmp(&a.comments.len()));
        ranked.truncate(limit);
        ranked
    }

    /// Newest posts first
    pub fn get_recent(&self, limit: usize) -> Vec<&Post> {
        let mut ranked: Vec<&Post> = self.posts.iter().collect();
        ranked.sort_by(|a, b| b.published.cmp(&a.published));
        ranked.truncate(limit);
        ranked
    }

    /// The single most-commented post
    pub fn trending(&self) -> Option<&Post> {
        self.get_popular(1).into_iter().next()
    }

    /// The first `count` posts in generation order
    pub fn featured(&self, count: usize) -> Vec<&Post> {
        self.posts.iter().take(count).collect()
    }

    /// Other posts in the same category as `post`
    pub fn related(&self, post: &Post, limit: usize) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|p| p.category == post.category && p.id != post.id)
            .take(limit)
            .collect()
    }

    /// Post count for every category, in display order
    pub fn category_counts(&self) -> IndexMap<Category, usize> {
        let mut counts: IndexMap<Category, usize> =
            Category::ALL.iter().map(|&c| (c, 0)).collect();
        for post in &self.posts {
            *counts.entry(post.category).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct tags with post counts, sorted by name
    pub fn tags(&self) -> BTreeMap<String, usize> {
        let mut tags = BTreeMap::new();
        for post in &self.posts {
            for tag in &post.tags {
                *tags.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        tags
    }

    /// Distinct authors in order of first appearance
    pub fn authors(&self) -> Vec<&Author> {
        let mut seen = HashSet::new();
        self.posts
            .iter()
            .map(|p| p.author.as_ref())
            .filter(|a| seen.insert(a.id.clone()))
            .collect()
    }
}

/// One page of a result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub current: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into 1-based pages of `per_page`
///
/// Page 0 is read as page 1. `per_page == 0` puts everything on one page.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Paginated<T> {
    let total_items = items.len();
    let current = page.max(1);

    if per_page == 0 {
        let items = if current == 1 { items } else { Vec::new() };
        return Paginated {
            items,
            current,
            total_pages: 1,
            total_items,
        };
    }

    let total_pages = total_items.div_ceil(per_page).max(1);
    let items = items
        .into_iter()
        .skip((current - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Paginated {
        items,
        current,
        total_pages,
        total_items,
    }
}
