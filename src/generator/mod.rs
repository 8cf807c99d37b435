//! Generator module - writes the static site using the shared page renderer

use anyhow::Result;
use chrono::Local;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::{Category, ContentStore, Post};
use crate::helpers::{date_xml, full_url_for, strip_html, url_for};
use crate::pages::{PageRenderer, Viewer};
use crate::preference::ThemePreference;
use crate::Articulate;

/// Posts included in the Atom feed
const FEED_SIZE: usize = 20;

/// Static site generator
pub struct Generator {
    site: Articulate,
    renderer: PageRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Articulate) -> Result<Self> {
        // one clock for the whole run keeps pages consistent with each other
        let renderer = PageRenderer::new(site.config.clone())?.pin_clock(Local::now());

        Ok(Self {
            site: site.clone(),
            renderer,
        })
    }

    /// Replace the page renderer
    pub fn with_renderer(mut self, renderer: PageRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Generate the entire site
    pub fn generate(&self, store: &ContentStore, theme: &ThemePreference) -> Result<()> {
        fs::create_dir_all(&self.site.public_dir)?;
        let viewer = Viewer::new(theme);

        self.generate_index_pages(store, &viewer)?;
        self.generate_post_pages(store, &viewer)?;
        self.generate_category_pages(store, &viewer)?;
        self.generate_tag_pages(store, &viewer)?;

        self.write_route("about/", &self.renderer.about(store, &viewer)?)?;
        self.write_route("contact/", &self.renderer.contact(store, &viewer)?)?;
        fs::write(
            self.site.public_dir.join("404.html"),
            self.renderer.not_found(store, &viewer)?,
        )?;

        self.generate_atom_feed(store)?;
        self.generate_search_index(store)?;

        Ok(())
    }

    /// Generate the paginated home page
    fn generate_index_pages(&self, store: &ContentStore, viewer: &Viewer) -> Result<()> {
        let per_page = self.site.config.per_page;
        let total_pages = if per_page == 0 {
            1
        } else {
            store.len().div_ceil(per_page).max(1)
        };

        for page_num in 1..=total_pages {
            let html = self.renderer.home(store, None, page_num, viewer)?;
            let route = if page_num == 1 {
                String::new()
            } else {
                format!("page/{}/", page_num)
            };
            self.write_route(&route, &html)?;
        }

        Ok(())
    }

    fn generate_post_pages(&self, store: &ContentStore, viewer: &Viewer) -> Result<()> {
        for post in store.get_all() {
            let html = self.renderer.post(store, post, viewer)?;
            self.write_route(&post.path(), &html)?;
        }
        Ok(())
    }

    fn generate_category_pages(&self, store: &ContentStore, viewer: &Viewer) -> Result<()> {
        for category in Category::ALL {
            let html = self.renderer.category(store, category.slug(), viewer)?;
            self.write_route(&format!("category/{}/", category.slug()), &html)?;
        }
        Ok(())
    }

    fn generate_tag_pages(&self, store: &ContentStore, viewer: &Viewer) -> Result<()> {
        // tag links are lowercase, so differently cased tags share a page
        let tags: BTreeSet<String> = store.tags().keys().map(|t| t.to_lowercase()).collect();

        for tag in tags {
            if !is_safe_segment(&tag) {
                tracing::warn!("Skipping tag page for {:?}", tag);
                continue;
            }
            let html = self.renderer.tag(store, &tag, viewer)?;
            self.write_route(&format!("tag/{}/", tag), &html)?;
        }
        Ok(())
    }

    fn generate_atom_feed(&self, store: &ContentStore) -> Result<()> {
        let output_path = self.site.public_dir.join("atom.xml");
        fs::write(&output_path, atom_feed(&self.site.config, store))?;
        tracing::info!("Generated atom.xml");
        Ok(())
    }

    fn generate_search_index(&self, store: &ContentStore) -> Result<()> {
        let output_path = self.site.public_dir.join("search.json");
        let json = serde_json::to_string_pretty(&search_index(&self.site.config, store))?;
        fs::write(&output_path, json)?;
        tracing::info!("Generated search.json");
        Ok(())
    }

    /// Write `html` to `<route>/index.html` under the public directory
    fn write_route(&self, route: &str, html: &str) -> Result<()> {
        let output_path = self.output_path(route);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    fn output_path(&self, route: &str) -> PathBuf {
        // Strip leading slash from path to avoid creating absolute paths
        let clean = route.trim_matches('/');
        if clean.is_empty() {
            self.site.public_dir.join("index.html")
        } else {
            self.site.public_dir.join(clean).join("index.html")
        }
    }
}

/// Atom feed of the most recent posts
pub fn atom_feed(config: &SiteConfig, store: &ContentStore) -> String {
    let recent = store.get_recent(FEED_SIZE);
    let home = full_url_for(config, "");

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    feed.push('\n');
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    if !config.subtitle.is_empty() {
        feed.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&config.subtitle)
        ));
    }
    feed.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\"/>\n",
        full_url_for(config, "atom.xml")
    ));
    feed.push_str(&format!("  <link href=\"{}\"/>\n", home));
    if let Some(newest) = recent.first() {
        feed.push_str(&format!(
            "  <updated>{}</updated>\n",
            date_xml(&newest.published)
        ));
    }
    feed.push_str(&format!("  <id>{}</id>\n", home));
    feed.push_str(&format!(
        "  <author><name>{}</name></author>\n",
        escape_xml(&config.author)
    ));

    let base_url = config.url.trim_end_matches('/');
    for post in recent {
        let link = full_url_for(config, &post.path());
        feed.push_str("  <entry>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
        feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
        feed.push_str(&format!("    <id>{}</id>\n", link));
        feed.push_str(&format!(
            "    <published>{}</published>\n",
            date_xml(&post.published)
        ));
        feed.push_str(&format!(
            "    <updated>{}</updated>\n",
            date_xml(&post.published)
        ));
        feed.push_str(&format!(
            "    <author><name>{}</name></author>\n",
            escape_xml(&post.author.name)
        ));
        feed.push_str(&format!(
            "    <category term=\"{}\"/>\n",
            escape_xml(post.category.name())
        ));
        feed.push_str(&format!(
            "    <summary>{}</summary>\n",
            escape_xml(&post.excerpt)
        ));
        let content = convert_relative_urls_to_absolute(&post.content, base_url);
        feed.push_str(&format!(
            "    <content type=\"html\"><![CDATA[{}]]></content>\n",
            strip_invalid_xml_chars(&content)
        ));
        feed.push_str("  </entry>\n");
    }

    feed.push_str("</feed>\n");
    feed
}

/// Search index for client-side search
pub fn search_index(config: &SiteConfig, store: &ContentStore) -> Vec<serde_json::Value> {
    store
        .get_all()
        .iter()
        .map(|post| search_entry(config, post))
        .collect()
}

fn search_entry(config: &SiteConfig, post: &Post) -> serde_json::Value {
    serde_json::json!({
        "id": post.id,
        "title": post.title,
        "excerpt": strip_html(&post.excerpt),
        "category": post.category.name(),
        "tags": post.tags,
        "url": url_for(config, &post.path()),
    })
}

/// A single directory name that stays inside the output tree
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Convert root-relative URLs in HTML content to absolute URLs
fn convert_relative_urls_to_absolute(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}

/// Strip characters XML 1.0 does not allow
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SyntheticSource;
    use crate::preference::{FixedScheme, MemoryStorage};
    use chrono::TimeZone;

    fn anchor() -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn store() -> ContentStore {
        ContentStore::new(SyntheticSource::with_anchor(42, 8, 3, anchor()).generate()).unwrap()
    }

    fn theme() -> ThemePreference {
        ThemePreference::initialize(Box::new(MemoryStorage::new()), &FixedScheme(None))
    }

    fn generate_into(dir: &std::path::Path, store: &ContentStore) -> Articulate {
        let config = SiteConfig {
            per_page: 3,
            ..SiteConfig::default()
        };
        let site = Articulate::with_config(dir, config.clone());
        let renderer = PageRenderer::new(config).unwrap().pin_clock(anchor());
        Generator::new(&site)
            .unwrap()
            .with_renderer(renderer)
            .generate(store, &theme())
            .unwrap();
        site
    }

    #[test]
    fn test_generate_writes_every_route() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let site = generate_into(dir.path(), &store);
        let public = &site.public_dir;

        assert!(public.join("index.html").exists());
        // 8 posts at 3 per page
        assert!(public.join("page/2/index.html").exists());
        assert!(public.join("page/3/index.html").exists());
        assert!(!public.join("page/4/index.html").exists());

        for post in store.get_all() {
            assert!(public.join(post.path()).join("index.html").exists());
        }
        for category in Category::ALL {
            assert!(public
                .join(format!("category/{}/index.html", category.slug()))
                .exists());
        }
        for tag in store.tags().keys() {
            assert!(public
                .join(format!("tag/{}/index.html", tag.to_lowercase()))
                .exists());
        }
        assert!(public.join("about/index.html").exists());
        assert!(public.join("contact/index.html").exists());
        assert!(public.join("404.html").exists());
        assert!(public.join("atom.xml").exists());
    }

    #[test]
    fn test_search_index_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let site = generate_into(dir.path(), &store);

        let json = fs::read_to_string(site.public_dir.join("search.json")).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), store.len());

        let first = &store.get_all()[0];
        assert_eq!(entries[0]["id"], first.id.as_str());
        assert_eq!(entries[0]["category"], first.category.name());
        assert_eq!(entries[0]["url"], format!("/post/{}/", first.id));
        assert_eq!(entries[0]["tags"].as_array().unwrap().len(), first.tags.len());
    }

    #[test]
    fn test_atom_feed_lists_recent_posts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let site = generate_into(dir.path(), &store);

        let feed = fs::read_to_string(site.public_dir.join("atom.xml")).unwrap();
        assert_eq!(feed.matches("<entry>").count(), store.len());
        let newest = store.get_recent(1)[0];
        let first_entry = feed.find("<entry>").unwrap();
        let newest_link = feed
            .find(&format!("http://localhost:4000/post/{}/", newest.id))
            .unwrap();
        assert!(newest_link > first_entry);
        assert!(feed.contains("<title>ArticulatePost</title>"));
    }

    #[test]
    fn test_output_is_deterministic_for_a_seed() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = generate_into(first.path(), &store());
        let b = generate_into(second.path(), &store());

        for route in ["index.html", "page/2/index.html", "search.json", "atom.xml"] {
            assert_eq!(
                fs::read_to_string(a.public_dir.join(route)).unwrap(),
                fs::read_to_string(b.public_dir.join(route)).unwrap(),
                "{} differs",
                route
            );
        }
    }

    #[test]
    fn test_helpers() {
        assert_eq!(escape_xml("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(
            convert_relative_urls_to_absolute(r#"<img src="/x.png">"#, "https://e.com"),
            r#"<img src="https://e.com/x.png">"#
        );
        assert_eq!(strip_invalid_xml_chars("a\u{0001}b"), "ab");
        assert!(is_safe_segment("rust"));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
    }
}
