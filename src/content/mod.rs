//! Content module - post models, content sources and the query store

pub mod fixture;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
mod store;

pub use fixture::SyntheticSource;
pub use frontmatter::FrontMatter;
pub use loader::MarkdownSource;
pub use markdown::MarkdownRenderer;
pub use post::{Author, Category, Comment, CommentAuthor, Post, Reply};
pub use store::{paginate, ContentStore, Paginated};

use thiserror::Error;

/// Errors raised while building the post collection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("duplicate post id: {0}")]
    DuplicateId(String),
    #[error("post {0} has a reading time of zero minutes")]
    ZeroReadingTime(String),
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),
}

/// Produces the post collection once at start-up
pub trait PostSource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Produce every post, in generation order
    fn load(&self) -> anyhow::Result<Vec<Post>>;
}
