//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::content::{ContentStore, Post};
use crate::helpers::clamp_limit;
use crate::Articulate;

/// List site content by type
pub fn run(site: &Articulate, content_type: &str, limit: Option<i64>) -> Result<()> {
    let store = site.load_store()?;
    print!("{}", render(&store, content_type, limit)?);
    Ok(())
}

/// The listing as printed by `run`
pub fn render(store: &ContentStore, content_type: &str, limit: Option<i64>) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            let posts: Vec<&Post> = store.get_all().iter().collect();
            let posts = match limit {
                Some(_) => posts.into_iter().take(clamp_limit(limit, 0)).collect(),
                None => posts,
            };
            writeln!(out, "Posts ({}):", posts.len())?;
            write_posts(&mut out, &posts)?;
        }
        "popular" => {
            let posts = store.get_popular(clamp_limit(limit, 5));
            writeln!(out, "Popular ({}):", posts.len())?;
            for post in posts {
                writeln!(
                    out,
                    "  {} comments - {} [{}]",
                    post.comment_count(),
                    post.title,
                    post.id
                )?;
            }
        }
        "recent" => {
            let posts = store.get_recent(clamp_limit(limit, 5));
            writeln!(out, "Recent ({}):", posts.len())?;
            write_posts(&mut out, &posts)?;
        }
        "category" | "categories" => {
            let counts = store.category_counts();
            writeln!(out, "Categories ({}):", counts.len())?;
            for (category, count) in counts {
                writeln!(out, "  {} ({})", category, count)?;
            }
        }
        "tag" | "tags" => {
            let mut tags: Vec<_> = store.tags().into_iter().collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            writeln!(out, "Tags ({}):", tags.len())?;
            for (tag, count) in tags {
                writeln!(out, "  {} ({})", tag, count)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, category, tag, popular, recent",
                content_type
            );
        }
    }

    Ok(out)
}

fn write_posts(out: &mut String, posts: &[&Post]) -> std::fmt::Result {
    for post in posts {
        writeln!(
            out,
            "  {} - {} [{}] ({})",
            post.published.format("%Y-%m-%d"),
            post.title,
            post.id,
            post.category
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::post;
    use crate::content::Category;
    use chrono::{Local, TimeZone};

    fn store() -> ContentStore {
        let day = Local.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        ContentStore::new(vec![
            post("a", Category::Ai, 3, day),
            post("b", Category::Lifestyle, 7, day + chrono::Duration::days(1)),
            post("c", Category::Ai, 7, day + chrono::Duration::days(2)),
        ])
        .unwrap()
    }

    #[test]
    fn test_list_popular() {
        let out = render(&store(), "popular", Some(2)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Popular (2):");
        assert!(lines[1].ends_with("[b]"));
        assert!(lines[2].ends_with("[c]"));
    }

    #[test]
    fn test_list_negative_limit_is_empty() {
        let out = render(&store(), "recent", Some(-1)).unwrap();
        assert_eq!(out, "Recent (0):\n");
    }

    #[test]
    fn test_list_categories_includes_empty_ones() {
        let out = render(&store(), "category", None).unwrap();
        assert!(out.starts_with("Categories (5):"));
        assert!(out.contains("  AI (2)"));
        assert!(out.contains("  Business (0)"));
    }

    #[test]
    fn test_list_unknown_type() {
        assert!(render(&store(), "page", None).is_err());
    }
}
