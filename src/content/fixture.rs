//! Seeded synthetic posts
//!
//! Stands in for a real data source: lorem-ipsum posts with authors,
//! comments and replies, reproducible for a given seed and anchor time.

use chrono::{DateTime, Duration, Local};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use super::{Author, Category, Comment, CommentAuthor, Post, PostSource, Reply};

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur",
    "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui",
    "officia", "deserunt", "mollit", "anim", "id", "est", "laborum", "vero", "accusamus",
    "tempora", "soluta", "nobis", "eligendi", "optio", "cumque", "nihil", "impedit", "quo",
    "minus", "maxime", "placeat", "facere", "possimus", "omnis", "voluptas", "assumenda",
    "repellendus", "temporibus", "autem", "quibusdam", "officiis", "debitis", "rerum",
    "necessitatibus", "saepe", "eveniet", "voluptates", "repudiandae", "recusandae", "itaque",
    "earum", "hic", "tenetur", "sapiente", "delectus",
];

const FIRST_NAMES: &[&str] = &[
    "Olivia", "Liam", "Amara", "Noah", "Sofia", "Mateo", "Hana", "Lucas", "Priya", "Elijah",
    "Zara", "Kenji", "Maya", "Diego", "Ingrid", "Omar", "Chloe", "Rafael", "Leila", "Tobias",
];

const LAST_NAMES: &[&str] = &[
    "Bennett", "Okafor", "Lindqvist", "Moreau", "Tanaka", "Alvarez", "Novak", "Haddad",
    "Fischer", "Kowalski", "Reyes", "Nakamura", "Brennan", "Sato", "Ivanova", "Mendes",
    "Gallagher", "Chen", "Duarte", "Walsh",
];

const TAG_WORDS: &[&str] = &[
    "innovation", "design", "productivity", "wellness", "startups", "cloud", "remote",
    "culture", "strategy", "coffee", "mountains", "future", "ethics", "data", "leadership",
    "minimalism", "photography", "growth", "security", "habits", "beaches", "automation",
    "finance", "community", "creativity",
];

/// Synthetic post source
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    post_count: usize,
    author_count: usize,
    anchor: DateTime<Local>,
}

impl SyntheticSource {
    /// Posts dated relative to now
    pub fn new(seed: u64, post_count: usize, author_count: usize) -> Self {
        Self::with_anchor(seed, post_count, author_count, Local::now())
    }

    /// Posts dated relative to a fixed instant
    pub fn with_anchor(
        seed: u64,
        post_count: usize,
        author_count: usize,
        anchor: DateTime<Local>,
    ) -> Self {
        Self {
            seed,
            post_count,
            author_count: author_count.max(1),
            anchor,
        }
    }

    /// Generate the whole collection
    pub fn generate(&self) -> Vec<Post> {
        let mut gen = Generator {
            rng: StdRng::seed_from_u64(self.seed),
            anchor: self.anchor,
        };

        let authors: Vec<Arc<Author>> = (0..self.author_count)
            .map(|i| Arc::new(gen.author(i)))
            .collect();

        (0..self.post_count)
            .map(|i| gen.post(i, &authors))
            .collect()
    }
}

impl PostSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn load(&self) -> anyhow::Result<Vec<Post>> {
        tracing::debug!(
            "Generating {} synthetic posts (seed {})",
            self.post_count,
            self.seed
        );
        Ok(self.generate())
    }
}

struct Generator {
    rng: StdRng,
    anchor: DateTime<Local>,
}

impl Generator {
    fn uuid(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.gen();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    fn pick<'a>(&mut self, words: &'a [&'a str]) -> &'a str {
        words.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn full_name(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        format!("{} {}", first, last)
    }

    /// A capitalized sentence of 4 to 10 words
    fn sentence(&mut self) -> String {
        let count = self.rng.gen_range(4..=10);
        let words: Vec<&str> = (0..count).map(|_| self.pick(LOREM)).collect();
        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get(..1) {
            let upper = first.to_uppercase();
            sentence.replace_range(..1, &upper);
        }
        sentence.push('.');
        sentence
    }

    /// 3 to 6 sentences
    fn paragraph(&mut self) -> String {
        self.sentences(3, 6)
    }

    fn sentences(&mut self, min: usize, max: usize) -> String {
        let count = self.rng.gen_range(min..=max);
        (0..count)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn paragraphs(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| self.paragraph())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// An instant within the last `days` days of the anchor
    fn recent(&mut self, days: i64) -> DateTime<Local> {
        let seconds = self.rng.gen_range(1..=days * 24 * 60 * 60);
        self.anchor - Duration::seconds(seconds)
    }

    fn avatar(&mut self) -> String {
        let n = self.rng.gen_range(1..=70);
        format!("https://i.pravatar.cc/150?img={}", n)
    }

    fn commenter(&mut self) -> CommentAuthor {
        CommentAuthor {
            id: self.uuid(),
            name: self.full_name(),
            avatar: self.avatar(),
        }
    }

    fn author(&mut self, index: usize) -> Author {
        Author {
            id: self.uuid(),
            name: self.full_name(),
            avatar: format!("https://i.pravatar.cc/150?img={}", index + 1),
            bio: self.paragraphs(2),
        }
    }

    fn reply(&mut self) -> Reply {
        Reply {
            id: self.uuid(),
            author: self.commenter(),
            content: self.paragraph(),
            date: self.recent(10),
            likes: self.rng.gen_range(0..=50),
        }
    }

    fn comment(&mut self) -> Comment {
        let id = self.uuid();
        let author = self.commenter();
        let content = self.paragraph();
        let date = self.recent(30);
        let likes = self.rng.gen_range(0..=100);
        let reply_count = self.rng.gen_range(0..=5);
        let replies = (0..reply_count).map(|_| self.reply()).collect();

        Comment {
            id,
            author,
            content,
            date,
            likes,
            replies,
        }
    }

    fn content(&mut self) -> String {
        let mut html = String::new();

        let seed = self.rng.gen_range(1..=1000);
        html.push_str(&format!(
            r#"<img src="https://picsum.photos/seed/content-{}/640/480" alt="Featured image" class="featured" />"#,
            seed
        ));
        html.push_str(&format!("<p>{}</p>", self.paragraphs(2)));

        html.push_str(&format!("<h2>{}</h2>", self.sentence()));
        html.push_str(&format!("<p>{}</p>", self.paragraphs(2)));

        html.push_str(&format!("<blockquote>{}</blockquote>", self.sentence()));
        html.push_str(&format!("<p>{}</p>", self.paragraphs(1)));

        html.push_str(&format!("<h3>{}</h3>", self.sentence()));
        html.push_str(&format!("<p>{}</p>", self.paragraphs(2)));

        html.push_str("<ul>");
        for _ in 0..4 {
            html.push_str(&format!("<li>{}</li>", self.sentence()));
        }
        html.push_str("</ul>");
        html.push_str(&format!("<p>{}</p>", self.paragraphs(2)));

        html.push_str("<h3>Conclusion</h3>");
        html.push_str(&format!("<p>{}</p>", self.paragraphs(1)));

        html
    }

    fn tags(&mut self) -> Vec<String> {
        let count = self.rng.gen_range(2..=5);
        let mut tags: Vec<String> = Vec::with_capacity(count);
        for _ in 0..count {
            let tag = self.pick(TAG_WORDS).to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    fn post(&mut self, index: usize, authors: &[Arc<Author>]) -> Post {
        let category = *Category::ALL
            .choose(&mut self.rng)
            .unwrap_or(&Category::Technology);
        let tags = self.tags();
        let id = self.uuid();
        let title = self.sentence();
        let excerpt = self.paragraph();
        let content = self.content();
        let author = Arc::clone(&authors[self.rng.gen_range(0..authors.len())]);
        let published = self.recent(60);
        let reading_time = self.rng.gen_range(3..=15);
        let comment_count = self.rng.gen_range(0..=8);
        let comments = (0..comment_count).map(|_| self.comment()).collect();

        Post {
            id,
            title,
            excerpt,
            content,
            image_url: format!("https://picsum.photos/seed/{}/1200/800", index + 1),
            category,
            author,
            published,
            reading_time,
            comments,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStore;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn anchor() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_same_seed_same_posts() {
        let a = SyntheticSource::with_anchor(7, 20, 5, anchor()).generate();
        let b = SyntheticSource::with_anchor(7, 20, 5, anchor()).generate();
        assert_eq!(a, b);

        let c = SyntheticSource::with_anchor(8, 20, 5, anchor()).generate();
        assert_ne!(a, c);
    }

    #[test]
    fn test_generated_posts_respect_invariants() {
        let posts = SyntheticSource::with_anchor(42, 20, 5, anchor()).generate();
        assert_eq!(posts.len(), 20);

        let ids: HashSet<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 20);

        let window = Duration::days(60);
        for post in &posts {
            assert!((3..=15).contains(&post.reading_time));
            assert!(post.comments.len() <= 8);
            assert!((1..=5).contains(&post.tags.len()));
            assert!(post.published <= anchor() && post.published >= anchor() - window);
            assert!(post.content.contains("<h3>Conclusion</h3>"));
            assert!(post.title.ends_with('.'));
            for comment in &post.comments {
                assert!(comment.likes <= 100);
                assert!(comment.replies.len() <= 5);
                assert!(comment.replies.iter().all(|r| r.likes <= 50));
            }
        }

        assert!(ContentStore::new(posts).is_ok());
    }

    #[test]
    fn test_authors_are_shared() {
        let posts = SyntheticSource::with_anchor(3, 20, 2, anchor()).generate();
        let distinct: HashSet<_> = posts.iter().map(|p| Arc::as_ptr(&p.author)).collect();
        assert!(distinct.len() <= 2);
    }

    #[test]
    fn test_cover_images_follow_post_index() {
        let posts = SyntheticSource::with_anchor(1, 3, 1, anchor()).generate();
        assert_eq!(posts[0].image_url, "https://picsum.photos/seed/1/1200/800");
        assert_eq!(posts[2].image_url, "https://picsum.photos/seed/3/1200/800");
    }
}
