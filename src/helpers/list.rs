//! List helper functions for category lists and pagination

use indexmap::IndexMap;

use super::url::url_for;
use crate::config::SiteConfig;
use crate::content::Category;

/// Generate a list of categories with their post counts as HTML
pub fn list_categories(
    config: &SiteConfig,
    counts: &IndexMap<Category, usize>,
    show_count: bool,
    class: Option<&str>,
) -> String {
    if counts.is_empty() {
        return String::new();
    }

    let class = class.unwrap_or("category-list");
    let mut html = format!(r#"<ul class="{}">"#, class);

    for (category, count) in counts {
        let url = url_for(config, &format!("category/{}/", category.slug()));

        html.push_str(&format!(
            r#"<li class="{}-item"><a class="{}-link" href="{}">{}</a>"#,
            class, class, url, category
        ));

        if show_count {
            html.push_str(&format!(
                r#"<span class="{}-count">{}</span>"#,
                class, count
            ));
        }

        html.push_str("</li>");
    }

    html.push_str("</ul>");
    html
}

/// Generate a paginator
///
/// Page 1 lives at `base_url`, later pages at `{base_url}page/{n}/`.
/// `query` (like `?category=ai`) is appended to every link.
pub fn paginator(
    current: usize,
    total: usize,
    base_url: &str,
    query: &str,
    mid_size: usize,
) -> String {
    if total <= 1 {
        return String::new();
    }

    let page_url = |page: usize| {
        if page == 1 {
            format!("{}{}", base_url, query)
        } else {
            format!("{}page/{}/{}", base_url, page, query)
        }
    };

    let mut html = r#"<nav class="pagination">"#.to_string();

    if current > 1 {
        html.push_str(&format!(
            r#"<a class="pagination-prev" href="{}">Previous</a>"#,
            page_url(current - 1)
        ));
    } else {
        html.push_str(r#"<span class="pagination-prev disabled">Previous</span>"#);
    }

    html.push_str(r#"<span class="pagination-numbers">"#);

    let start = current.saturating_sub(mid_size).max(1);
    let end = (current + mid_size).min(total);

    if start > 1 {
        html.push_str(&format!(
            r#"<a class="pagination-number" href="{}">1</a>"#,
            page_url(1)
        ));
        if start > 2 {
            html.push_str(r#"<span class="pagination-ellipsis">…</span>"#);
        }
    }

    for page in start..=end {
        if page == current {
            html.push_str(&format!(
                r#"<span class="pagination-number current">{}</span>"#,
                page
            ));
        } else {
            html.push_str(&format!(
                r#"<a class="pagination-number" href="{}">{}</a>"#,
                page_url(page),
                page
            ));
        }
    }

    if end < total {
        if end < total - 1 {
            html.push_str(r#"<span class="pagination-ellipsis">…</span>"#);
        }
        html.push_str(&format!(
            r#"<a class="pagination-number" href="{}">{}</a>"#,
            page_url(total),
            total
        ));
    }

    html.push_str("</span>");

    if current < total {
        html.push_str(&format!(
            r#"<a class="pagination-next" href="{}">Next</a>"#,
            page_url(current + 1)
        ));
    } else {
        html.push_str(r#"<span class="pagination-next disabled">Next</span>"#);
    }

    html.push_str("</nav>");
    html
}

/// Resolve a requested list size, falling back to `default`
///
/// Negative sizes mean "nothing" rather than an error.
pub fn clamp_limit(limit: Option<i64>, default: usize) -> usize {
    match limit {
        Some(n) if n < 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_categories_keeps_order_and_counts() {
        let mut counts = IndexMap::new();
        counts.insert(Category::Technology, 4);
        counts.insert(Category::Ai, 0);

        let html = list_categories(&SiteConfig::default(), &counts, true, None);
        let tech = html.find("Technology").unwrap();
        let ai = html.find(">AI<").unwrap();
        assert!(tech < ai);
        assert!(html.contains(r#"href="/category/ai/""#));
        assert!(html.contains(r#"<span class="category-list-count">4</span>"#));
    }

    #[test]
    fn test_paginator_single_page_is_empty() {
        assert_eq!(paginator(1, 1, "/", "", 2), "");
    }

    #[test]
    fn test_paginator_links() {
        let html = paginator(2, 5, "/", "?category=ai", 1);
        assert!(html.contains(r#"class="pagination-prev" href="/?category=ai""#));
        assert!(html.contains(r#"<span class="pagination-number current">2</span>"#));
        assert!(html.contains(r#"href="/page/3/?category=ai">3</a>"#));
        assert!(html.contains(r#"href="/page/5/?category=ai">5</a>"#));
        assert!(html.contains(r#"class="pagination-next" href="/page/3/?category=ai""#));
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 5), 5);
        assert_eq!(clamp_limit(Some(3), 5), 3);
        assert_eq!(clamp_limit(Some(0), 5), 0);
        assert_eq!(clamp_limit(Some(-2), 5), 0);
    }
}
