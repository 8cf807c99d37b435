//! Page rendering shared by the server and the static generator
//!
//! [`PageRenderer`] turns store queries into template views. What differs
//! between visitors (theme marker, pending notice, liked comments, whether
//! forms can be posted) travels in a [`Viewer`].

use anyhow::Result;
use chrono::{DateTime, Datelike, Local};
use serde::Serialize;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{paginate, Category, Comment, ContentStore, Post, Reply};
use crate::forms::{LikeLedger, Notice};
use crate::helpers::{
    date_xml, encode_component, full_url_for, html_escape, list_categories, long_date,
    meta_generator, month_day, open_graph, paginator, relative_to, share_links, short_date,
    strip_html, truncate, url_for,
};
use crate::preference::{DocumentMarker, ThemeMode, ThemePreference};
use crate::templates::{
    CategoryLink, CommentView, ConfigData, NoticeView, PostCard, PostDetail, ReplyView,
    SidebarData, TagLink, TemplateRenderer, ThemeData,
};

/// Subjects offered by the contact form
pub const CONTACT_SUBJECTS: [&str; 5] = [
    "General Inquiry",
    "Feedback",
    "Partnership",
    "Advertising",
    "Support",
];

/// Per-request view state
#[derive(Debug, Clone)]
pub struct Viewer<'a> {
    pub mode: ThemeMode,
    pub marker: DocumentMarker,
    pub notice: Option<Notice>,
    pub likes: Option<&'a LikeLedger>,
    /// Pages are served by the live server and may post forms
    pub live: bool,
}

impl<'a> Viewer<'a> {
    /// A static viewer following the session theme
    pub fn new(theme: &ThemePreference) -> Self {
        Self {
            mode: theme.current(),
            marker: theme.marker(),
            notice: None,
            likes: None,
            live: false,
        }
    }

    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    pub fn with_notice(mut self, notice: Option<Notice>) -> Self {
        self.notice = notice;
        self
    }

    pub fn with_likes(mut self, likes: &'a LikeLedger) -> Self {
        self.likes = Some(likes);
        self
    }
}

/// Link targets shared by every page
#[derive(Debug, Clone, Serialize)]
struct SiteUrls {
    home: String,
    about: String,
    contact: String,
    search: String,
    subscribe: String,
    theme_toggle: String,
    theme_socket: String,
    feed: String,
}

/// Author shown on the about page
#[derive(Debug, Clone, Serialize)]
struct TeamMember {
    name: String,
    avatar: String,
    bio: String,
}

/// Renders every page of the site
pub struct PageRenderer {
    templates: TemplateRenderer,
    config: SiteConfig,
    clock: Option<DateTime<Local>>,
}

impl PageRenderer {
    pub fn new(config: SiteConfig) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            config,
            clock: None,
        })
    }

    /// Render every page against a fixed `now`
    pub fn pin_clock(mut self, now: DateTime<Local>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Local> {
        self.clock.unwrap_or_else(Local::now)
    }

    /// Home page: trending hero, category chips and the paginated grid
    pub fn home(
        &self,
        store: &ContentStore,
        category: Option<&str>,
        page: usize,
        viewer: &Viewer,
    ) -> Result<String> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let page = page.max(1);

        let posts: Vec<&Post> = match category {
            Some(name) => store.get_by_category(name),
            None => store.get_all().iter().collect(),
        };
        let paged = paginate(posts, page, self.config.per_page);

        let query = category
            .map(|c| format!("?category={}", encode_component(c)))
            .unwrap_or_default();
        let path = if page == 1 {
            String::new()
        } else {
            format!("page/{}/", page)
        };
        let current_url = format!("{}{}", url_for(&self.config, &path), query);

        let mut context =
            self.base_context(store, viewer, &current_url, "", &self.config.description);
        context.insert("nav_categories", &self.category_links(store, category));
        context.insert("active_category", &category.map(html_escape));

        // the hero only leads the first page
        let (trending, featured): (Option<PostCard>, Vec<PostCard>) = if page == 1 {
            (
                store.trending().map(|p| self.card(p)),
                store
                    .featured(3)
                    .into_iter()
                    .skip(1)
                    .map(|p| self.card(p))
                    .collect(),
            )
        } else {
            (None, Vec::new())
        };
        context.insert("trending", &trending);
        context.insert("featured", &featured);

        let cards: Vec<PostCard> = paged.items.iter().map(|p| self.card(p)).collect();
        context.insert("posts", &cards);
        context.insert(
            "pagination",
            &paginator(
                paged.current,
                paged.total_pages,
                &url_for(&self.config, ""),
                &query,
                2,
            ),
        );

        self.templates.render("home.html", &context)
    }

    /// Single post reader view
    pub fn post(&self, store: &ContentStore, post: &Post, viewer: &Viewer) -> Result<String> {
        let current_url = url_for(&self.config, &post.path());
        let full_url = full_url_for(&self.config, &post.path());

        let mut context =
            self.base_context(store, viewer, &current_url, &post.title, &post.excerpt);
        context.insert(
            "open_graph",
            &open_graph(
                &post.title,
                &post.excerpt,
                &full_url,
                Some(&post.image_url),
                &self.config.title,
            ),
        );

        let detail = PostDetail {
            card: self.card(post),
            content: post.content.clone(),
            author_bio: post.author.bio.clone(),
            tags: post
                .tags
                .iter()
                .map(|tag| TagLink {
                    name: tag.clone(),
                    url: self.tag_url(tag),
                })
                .collect(),
            share: share_links(&full_url, &post.title),
            full_url,
        };
        context.insert("post", &detail);

        let related: Vec<PostCard> = store
            .related(post, self.config.sidebar.related)
            .into_iter()
            .map(|p| self.card(p))
            .collect();
        context.insert("related", &related);

        let comments: Vec<CommentView> = post
            .comments
            .iter()
            .map(|c| self.comment_view(post, c, viewer))
            .collect();
        context.insert("comments", &comments);
        context.insert(
            "comment_action",
            &url_for(&self.config, &format!("post/{}/comments", post.id)),
        );

        self.templates.render("post.html", &context)
    }

    /// Shown for an unknown post id
    pub fn post_missing(&self, store: &ContentStore, viewer: &Viewer) -> Result<String> {
        let context = self.base_context(
            store,
            viewer,
            &url_for(&self.config, ""),
            "Post Not Found",
            "The post you're looking for doesn't exist or has been removed.",
        );
        self.templates.render("post_missing.html", &context)
    }

    /// Posts of one category; unknown names list nothing
    pub fn category(&self, store: &ContentStore, name: &str, viewer: &Viewer) -> Result<String> {
        let heading = match name.parse::<Category>() {
            Ok(category) => category.name().to_string(),
            Err(_) => capitalize(name),
        };
        let posts = store.get_by_category(name);
        let current_url = url_for(&self.config, &format!("category/{}/", encode_component(name)));

        let mut context = self.base_context(store, viewer, &current_url, &heading, "");
        context.insert("heading", &html_escape(&heading));
        context.insert(
            "summary",
            &format!(
                "Explore our collection of articles and insights about {}.",
                html_escape(&heading.to_lowercase())
            ),
        );
        context.insert("empty_title", "No posts found");
        context.insert(
            "empty_message",
            "We couldn't find any posts in this category. Please check back later or explore other categories.",
        );
        self.insert_cards(&mut context, &posts);

        self.templates.render("listing.html", &context)
    }

    /// Posts carrying one tag
    pub fn tag(&self, store: &ContentStore, tag: &str, viewer: &Viewer) -> Result<String> {
        let posts = store.get_by_tag(tag);
        let current_url = self.tag_url(tag);
        let title = format!("Tagged \"{}\"", tag);

        let mut context = self.base_context(store, viewer, &current_url, &title, "");
        context.insert("heading", &format!("#{}", html_escape(tag)));
        context.insert(
            "summary",
            &format!(
                "{} {} tagged with <span class=\"tag\">{}</span>",
                posts.len(),
                if posts.len() == 1 { "post" } else { "posts" },
                html_escape(tag)
            ),
        );
        context.insert("empty_title", "No posts found");
        context.insert(
            "empty_message",
            "We couldn't find any posts with this tag. Please explore other topics.",
        );
        self.insert_cards(&mut context, &posts);

        self.templates.render("listing.html", &context)
    }

    /// Search results for a keyword
    pub fn search(&self, store: &ContentStore, query: &str, viewer: &Viewer) -> Result<String> {
        let posts = store.search(query);
        let current_url = format!(
            "{}?q={}",
            url_for(&self.config, "search"),
            encode_component(query)
        );

        let mut context = self.base_context(store, viewer, &current_url, "Search Results", "");
        context.insert("search_query", &html_escape(query));
        context.insert("heading", "Search Results");
        context.insert(
            "summary",
            &format!(
                "{} {} found for <span class=\"query\">\"{}\"</span>",
                posts.len(),
                if posts.len() == 1 { "result" } else { "results" },
                html_escape(query)
            ),
        );
        context.insert("empty_title", "No results found");
        context.insert(
            "empty_message",
            "We couldn't find any posts matching your search. Please try with different keywords.",
        );
        self.insert_cards(&mut context, &posts);

        self.templates.render("listing.html", &context)
    }

    pub fn about(&self, store: &ContentStore, viewer: &Viewer) -> Result<String> {
        let mut context = self.base_context(
            store,
            viewer,
            &url_for(&self.config, "about/"),
            "About Us",
            &self.config.description,
        );

        let team: Vec<TeamMember> = store
            .authors()
            .into_iter()
            .map(|a| TeamMember {
                name: a.name.clone(),
                avatar: a.avatar.clone(),
                bio: a.bio.clone(),
            })
            .collect();
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();

        context.insert("authors", &team);
        context.insert("category_names", &names.join(", "));
        context.insert("post_count", &store.len());

        self.templates.render("about.html", &context)
    }

    pub fn contact(&self, store: &ContentStore, viewer: &Viewer) -> Result<String> {
        let mut context = self.base_context(
            store,
            viewer,
            &url_for(&self.config, "contact/"),
            "Contact Us",
            "Have questions or feedback? Get in touch with our team.",
        );
        context.insert("subjects", &CONTACT_SUBJECTS);
        self.templates.render("contact.html", &context)
    }

    pub fn not_found(&self, store: &ContentStore, viewer: &Viewer) -> Result<String> {
        let context = self.base_context(
            store,
            viewer,
            &url_for(&self.config, ""),
            "Page Not Found",
            "",
        );
        self.templates.render("not_found.html", &context)
    }

    fn base_context(
        &self,
        store: &ContentStore,
        viewer: &Viewer,
        current_url: &str,
        page_title: &str,
        description: &str,
    ) -> Context {
        let mut context = Context::new();
        let config = &self.config;

        context.insert(
            "config",
            &ConfigData {
                title: config.title.clone(),
                subtitle: config.subtitle.clone(),
                description: config.description.clone(),
                author: config.author.clone(),
                language: config.language.clone(),
                url: config.url.clone(),
                root: config.root.clone(),
            },
        );
        context.insert(
            "theme",
            &ThemeData {
                mode: viewer.mode.as_str().to_string(),
                class_attr: viewer.marker.class_attr(),
                data_theme: viewer.marker.data_theme.clone(),
                toggle_label: match viewer.mode.toggled() {
                    ThemeMode::Light => "Light".to_string(),
                    ThemeMode::Dark => "Dark".to_string(),
                },
            },
        );
        context.insert(
            "notice",
            &viewer.notice.map(|n| NoticeView {
                code: n.code().to_string(),
                title: n.title().to_string(),
                description: n.description().to_string(),
                destructive: n.is_destructive(),
            }),
        );
        context.insert(
            "urls",
            &SiteUrls {
                home: url_for(config, ""),
                about: url_for(config, "about/"),
                contact: url_for(config, "contact/"),
                search: url_for(config, "search"),
                subscribe: url_for(config, "subscribe"),
                theme_toggle: url_for(config, "theme/toggle"),
                theme_socket: url_for(config, "__theme"),
                feed: url_for(config, "atom.xml"),
            },
        );
        context.insert("nav_categories", &self.category_links(store, None));
        context.insert("sidebar", &self.sidebar(store));
        context.insert("current_url", current_url);
        context.insert("page_title", &html_escape(page_title));
        let description = if description.is_empty() {
            config.description.as_str()
        } else {
            description
        };
        context.insert(
            "meta_description",
            &html_escape(&truncate(&strip_html(description), 160, None)),
        );
        context.insert("open_graph", "");
        context.insert("generator", &meta_generator());
        context.insert("live", &viewer.live);
        context.insert("year", &self.now().year());
        context
    }

    fn sidebar(&self, store: &ContentStore) -> SidebarData {
        let sidebar = &self.config.sidebar;
        SidebarData {
            categories: list_categories(&self.config, &store.category_counts(), true, None),
            popular: store
                .get_popular(sidebar.popular)
                .into_iter()
                .map(|p| self.card(p))
                .collect(),
            recent: store
                .get_recent(sidebar.recent)
                .into_iter()
                .map(|p| self.card(p))
                .collect(),
        }
    }

    fn category_links(&self, store: &ContentStore, active: Option<&str>) -> Vec<CategoryLink> {
        store
            .category_counts()
            .into_iter()
            .map(|(category, count)| CategoryLink {
                name: category.name().to_string(),
                slug: category.slug().to_string(),
                url: self.category_url(category),
                count,
                active: active.is_some_and(|name| category.matches(name)),
            })
            .collect()
    }

    fn insert_cards(&self, context: &mut Context, posts: &[&Post]) {
        let cards: Vec<PostCard> = posts.iter().map(|p| self.card(p)).collect();
        context.insert("posts", &cards);
    }

    fn card(&self, post: &Post) -> PostCard {
        PostCard {
            id: post.id.clone(),
            url: url_for(&self.config, &post.path()),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            image_url: post.image_url.clone(),
            category: post.category.name().to_string(),
            category_url: self.category_url(post.category),
            author_name: post.author.name.clone(),
            author_avatar: post.author.avatar.clone(),
            date_long: long_date(&post.published),
            date_short: short_date(&post.published),
            month_day: month_day(&post.published),
            date_iso: date_xml(&post.published),
            reading_time: post.reading_time,
            comment_count: post.comment_count(),
        }
    }

    fn comment_view(&self, post: &Post, comment: &Comment, viewer: &Viewer) -> CommentView {
        let liked = viewer.likes.is_some_and(|l| l.comment_liked(&comment.id));
        let likes = viewer
            .likes
            .map_or(comment.likes, |l| l.comment_likes(&comment.id, comment.likes));
        CommentView {
            id: comment.id.clone(),
            author_name: comment.author.name.clone(),
            author_avatar: comment.author.avatar.clone(),
            content: comment.content.clone(),
            date: short_date(&comment.date),
            ago: relative_to(&comment.date, &self.now()),
            likes,
            liked,
            like_action: url_for(
                &self.config,
                &format!("post/{}/comments/{}/like", post.id, comment.id),
            ),
            reply_action: url_for(
                &self.config,
                &format!("post/{}/comments/{}/replies", post.id, comment.id),
            ),
            replies: comment
                .replies
                .iter()
                .map(|r| self.reply_view(post, r, viewer))
                .collect(),
        }
    }

    fn reply_view(&self, post: &Post, reply: &Reply, viewer: &Viewer) -> ReplyView {
        let liked = viewer.likes.is_some_and(|l| l.reply_liked(&reply.id));
        let likes = viewer
            .likes
            .map_or(reply.likes, |l| l.reply_likes(&reply.id, reply.likes));
        ReplyView {
            id: reply.id.clone(),
            author_name: reply.author.name.clone(),
            author_avatar: reply.author.avatar.clone(),
            content: reply.content.clone(),
            date: short_date(&reply.date),
            ago: relative_to(&reply.date, &self.now()),
            likes,
            liked,
            like_action: url_for(
                &self.config,
                &format!("post/{}/replies/{}/like", post.id, reply.id),
            ),
        }
    }

    fn category_url(&self, category: Category) -> String {
        url_for(&self.config, &format!("category/{}/", category.slug()))
    }

    fn tag_url(&self, tag: &str) -> String {
        url_for(
            &self.config,
            &format!("tag/{}/", encode_component(&tag.to_lowercase())),
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::{comment, post};
    use crate::preference::{FixedScheme, MemoryStorage};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap()
    }

    fn store() -> ContentStore {
        let base = Local.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let mut first = post("first", Category::Technology, 2, base);
        first.title = "Rust in production".to_string();
        first.tags = vec!["Rust".to_string()];
        let mut second = post("second", Category::Technology, 0, base + Duration::days(1));
        second.title = "Second look".to_string();
        let third = post("third", Category::Travel, 5, base + Duration::days(2));
        ContentStore::new(vec![first, second, third]).unwrap()
    }

    fn renderer() -> PageRenderer {
        PageRenderer::new(SiteConfig::default()).unwrap().pin_clock(now())
    }

    fn dark_theme() -> ThemePreference {
        ThemePreference::initialize(Box::new(MemoryStorage::new()), &FixedScheme(Some(true)))
    }

    #[test]
    fn test_home_marks_document_and_lists_posts() {
        let theme = dark_theme();
        let html = renderer()
            .home(&store(), None, 1, &Viewer::new(&theme))
            .unwrap();

        assert!(html.contains(r#"<html lang="en" class="dark" data-theme="dark">"#));
        assert!(html.contains("Rust in production"));
        assert!(html.contains("January 5, 2025"));
        // no forms without the live server
        assert!(!html.contains(r#"action="/theme/toggle""#));
        assert!(html.contains(&format!("&copy; {}", now().year())));
    }

    #[test]
    fn test_home_category_filter() {
        let theme = dark_theme();
        let html = renderer()
            .home(&store(), Some("travel"), 1, &Viewer::new(&theme).live())
            .unwrap();

        assert!(html.contains(r#"class="chip active" href="/?category=travel">Travel</a>"#));
        assert!(html.contains(r#"name="redirect" value="/?category=travel""#));
        assert!(html.contains(r#"action="/theme/toggle""#));
    }

    #[test]
    fn test_post_page_sections() {
        let theme = dark_theme();
        let store = store();
        let post = store.get_by_id("first").unwrap();
        let html = renderer().post(&store, post, &Viewer::new(&theme)).unwrap();

        assert!(html.contains("<p>Body of first</p>"));
        assert!(html.contains("Comments (2)"));
        assert!(html.contains("Related Posts"));
        assert!(html.contains(r#"href="/post/second/""#));
        assert!(html.contains(r#"href="/tag/rust/""#));
        assert!(html.contains("https://www.facebook.com/sharer/sharer.php?u=http%3A%2F%2Flocalhost%3A4000%2Fpost%2Ffirst%2F"));
        assert!(html.contains(r#"property="og:title" content="Rust in production""#));
    }

    #[test]
    fn test_post_page_shows_session_likes() {
        let theme = dark_theme();
        let base = Local.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let mut liked = post("liked", Category::Ai, 0, base);
        liked.comments.push(comment("c-1", base, 41));
        let store = ContentStore::new(vec![liked]).unwrap();

        let mut ledger = LikeLedger::new();
        ledger.toggle_comment("c-1");
        let viewer = Viewer::new(&theme).live().with_likes(&ledger);
        let html = renderer()
            .post(&store, store.get_by_id("liked").unwrap(), &viewer)
            .unwrap();

        assert!(html.contains(r#"class="liked">&#9829; 42</button>"#));
        assert!(html.contains(r#"action="/post/liked/comments/c-1/like""#));
        // the store keeps its baseline
        assert_eq!(store.get_by_id("liked").unwrap().comments[0].likes, 41);
    }

    #[test]
    fn test_post_page_like_counts_come_from_ledger() {
        let theme = dark_theme();
        let base = Local.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let mut liked = post("busy", Category::Ai, 0, base);
        let mut top = comment("c-max", base, u32::MAX);
        top.replies.push(Reply {
            id: "r-1".to_string(),
            author: top.author.clone(),
            content: "Same here".to_string(),
            date: base,
            likes: 6,
        });
        liked.comments.push(top);
        let store = ContentStore::new(vec![liked]).unwrap();

        let mut ledger = LikeLedger::new();
        ledger.toggle_comment("c-max");
        ledger.toggle_reply("r-1");
        let viewer = Viewer::new(&theme).live().with_likes(&ledger);
        let html = renderer()
            .post(&store, store.get_by_id("busy").unwrap(), &viewer)
            .unwrap();

        assert!(html.contains(&format!(r#"class="liked">&#9829; {}</button>"#, u32::MAX)));
        assert!(html.contains(r#"class="liked">&#9829; 7</button>"#));
    }

    #[test]
    fn test_search_summary_escapes_query() {
        let theme = dark_theme();
        let html = renderer()
            .search(&store(), "<b>rust</b>", &Viewer::new(&theme))
            .unwrap();
        assert!(html.contains("0 results found for"));
        assert!(html.contains("&lt;b&gt;rust&lt;/b&gt;"));
        assert!(!html.contains("<b>rust</b>"));

        let html = renderer()
            .search(&store(), "rust", &Viewer::new(&theme))
            .unwrap();
        assert!(html.contains(r#"1 result found for <span class="query">"rust"</span>"#));
    }

    #[test]
    fn test_category_page_unknown_category_is_empty() {
        let theme = dark_theme();
        let html = renderer()
            .category(&store(), "gardening", &Viewer::new(&theme))
            .unwrap();
        assert!(html.contains("<h1>Gardening</h1>"));
        assert!(html.contains("No posts found"));
    }

    #[test]
    fn test_notice_rendered() {
        let theme = dark_theme();
        let viewer = Viewer::new(&theme).with_notice(Some(Notice::InvalidEmail));
        let html = renderer().contact(&store(), &viewer).unwrap();
        assert!(html.contains(r#"class="notice destructive""#));
        assert!(html.contains("Please enter a valid email address."));
    }

    #[test]
    fn test_missing_and_not_found_pages() {
        let theme = dark_theme();
        let renderer = renderer();
        let store = store();
        let viewer = Viewer::new(&theme);
        assert!(renderer
            .post_missing(&store, &viewer)
            .unwrap()
            .contains("Post Not Found"));
        assert!(renderer
            .not_found(&store, &viewer)
            .unwrap()
            .contains("Oops! Page not found"));
        assert!(renderer.about(&store, &viewer).unwrap().contains("Ada Writer"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("travel"), "Travel");
        assert_eq!(capitalize(""), "");
    }
}
