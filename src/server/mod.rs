//! Live server: rendered pages, form acknowledgements, JSON API and the
//! theme websocket

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Form, Path, Query, State, WebSocketUpgrade,
    },
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::content::{ContentStore, Post};
use crate::forms::{
    comment_notice, contact_notice, reply_notice, safe_redirect, subscribe_notice, with_notice,
    ContactForm, LikeLedger, MessageForm, Notice, RedirectForm, SubscribeForm,
};
use crate::generator::{atom_feed, search_index};
use crate::helpers::{clamp_limit, url_for};
use crate::pages::{PageRenderer, Viewer};
use crate::preference::{DocumentMarker, ThemeMode, ThemePreference};
use crate::Articulate;

/// Server state
pub struct ServerState {
    pages: PageRenderer,
    store: Arc<ContentStore>,
    theme: Arc<ThemePreference>,
    likes: Mutex<LikeLedger>,
}

impl ServerState {
    pub fn new(site: &Articulate, store: ContentStore, theme: ThemePreference) -> Result<Self> {
        Ok(Self {
            pages: PageRenderer::new(site.config.clone())?,
            store: Arc::new(store),
            theme: Arc::new(theme),
            likes: Mutex::new(LikeLedger::new()),
        })
    }

    /// Render a page for this session
    fn page<F>(&self, status: StatusCode, notice: Option<Notice>, render: F) -> Response
    where
        F: FnOnce(&PageRenderer, &ContentStore, &Viewer) -> Result<String>,
    {
        let likes = self.likes.lock().unwrap_or_else(|e| e.into_inner());
        let viewer = Viewer::new(&self.theme)
            .live()
            .with_notice(notice)
            .with_likes(&likes);

        match render(&self.pages, &self.store, &viewer) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Render failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Render error").into_response()
            }
        }
    }

    fn not_found(&self) -> Response {
        self.page(StatusCode::NOT_FOUND, None, |pages, store, viewer| {
            pages.not_found(store, viewer)
        })
    }

    fn post_url(&self, post: &Post) -> String {
        url_for(self.pages.config(), &post.path())
    }
}

type SharedState = Arc<ServerState>;

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        // Pages
        .route("/", get(home_page))
        .route("/page/:page", get(home_paged))
        .route("/page/:page/", get(home_paged))
        .route("/post/:id", get(post_page))
        .route("/post/:id/", get(post_page))
        .route("/category/:category", get(category_page))
        .route("/category/:category/", get(category_page))
        .route("/tag/:tag", get(tag_page))
        .route("/tag/:tag/", get(tag_page))
        .route("/search", get(search_page))
        .route("/search/", get(search_page))
        .route("/about", get(about_page))
        .route("/about/", get(about_page))
        .route("/contact", get(contact_page).post(contact_submit))
        .route("/contact/", get(contact_page).post(contact_submit))
        .route("/atom.xml", get(feed))
        .route("/search.json", get(search_json))
        // Form actions
        .route("/theme/toggle", post(theme_toggle))
        .route("/subscribe", post(subscribe))
        .route("/post/:id/comments", post(comment_submit))
        .route("/post/:id/comments/:comment_id/replies", post(reply_submit))
        .route("/post/:id/comments/:comment_id/like", post(comment_like))
        .route("/post/:id/replies/:reply_id/like", post(reply_like))
        // Theme changes
        .route("/__theme", get(theme_socket_handler))
        // JSON API
        .route("/api/posts", get(api_posts))
        .route("/api/posts/popular", get(api_popular))
        .route("/api/posts/recent", get(api_recent))
        .route("/api/posts/:id", get(api_post))
        .route("/api/categories", get(api_categories))
        .route("/api/categories/:category", get(api_category))
        .route("/api/search", get(api_search))
        .route("/api/theme", get(api_theme))
        .route("/api/theme/toggle", post(api_theme_toggle))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Articulate, ip: &str, port: u16, open: bool) -> Result<()> {
    let store = site.load_store()?;
    tracing::info!("Loaded {} posts", store.len());

    let theme = site.theme_preference();
    let state = Arc::new(ServerState::new(site, store, theme)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    fn notice(&self) -> Option<Notice> {
        self.notice.as_deref().and_then(Notice::from_code)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub category: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

async fn home_page(State(state): State<SharedState>, Query(query): Query<HomeQuery>) -> Response {
    render_home(&state, 1, query)
}

async fn home_paged(
    State(state): State<SharedState>,
    Path(page): Path<String>,
    Query(query): Query<HomeQuery>,
) -> Response {
    match page.parse::<usize>() {
        Ok(page) => render_home(&state, page, query),
        Err(_) => state.not_found(),
    }
}

fn render_home(state: &ServerState, page: usize, query: HomeQuery) -> Response {
    let notice = query.notice.as_deref().and_then(Notice::from_code);
    let category = query.category.as_deref();

    let total = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(name) => state.store.get_by_category(name).len(),
        None => state.store.len(),
    };
    let per_page = state.pages.config().per_page;
    let total_pages = if per_page == 0 {
        1
    } else {
        total.div_ceil(per_page).max(1)
    };
    if page == 0 || page > total_pages {
        return state.not_found();
    }

    state.page(StatusCode::OK, notice, |pages, store, viewer| {
        pages.home(store, category, page, viewer)
    })
}

async fn post_page(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let store = Arc::clone(&state.store);
    match store.get_by_id(&id) {
        Some(post) => state.page(StatusCode::OK, query.notice(), |pages, store, viewer| {
            pages.post(store, post, viewer)
        }),
        None => state.page(StatusCode::NOT_FOUND, None, |pages, store, viewer| {
            pages.post_missing(store, viewer)
        }),
    }
}

async fn category_page(
    State(state): State<SharedState>,
    Path(category): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    state.page(StatusCode::OK, query.notice(), |pages, store, viewer| {
        pages.category(store, &category, viewer)
    })
}

async fn tag_page(
    State(state): State<SharedState>,
    Path(tag): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    state.page(StatusCode::OK, query.notice(), |pages, store, viewer| {
        pages.tag(store, &tag, viewer)
    })
}

async fn search_page(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let notice = query.notice.as_deref().and_then(Notice::from_code);
    let keyword = query.q.as_deref().unwrap_or("").trim();
    state.page(StatusCode::OK, notice, |pages, store, viewer| {
        pages.search(store, keyword, viewer)
    })
}

async fn about_page(
    State(state): State<SharedState>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    state.page(StatusCode::OK, query.notice(), |pages, store, viewer| {
        pages.about(store, viewer)
    })
}

async fn contact_page(
    State(state): State<SharedState>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    state.page(StatusCode::OK, query.notice(), |pages, store, viewer| {
        pages.contact(store, viewer)
    })
}

async fn feed(State(state): State<SharedState>) -> Response {
    let xml = atom_feed(state.pages.config(), &state.store);
    ([(header::CONTENT_TYPE, "application/atom+xml")], xml).into_response()
}

async fn search_json(State(state): State<SharedState>) -> Response {
    Json(search_index(state.pages.config(), &state.store)).into_response()
}

async fn theme_toggle(
    State(state): State<SharedState>,
    Form(form): Form<RedirectForm>,
) -> Redirect {
    state.theme.toggle();
    Redirect::to(safe_redirect(form.redirect.as_deref()))
}

async fn subscribe(Form(form): Form<SubscribeForm>) -> Redirect {
    let notice = subscribe_notice(&form);
    tracing::info!("Newsletter sign-up: {}", notice.code());
    let target = safe_redirect(form.redirect.as_deref());
    Redirect::to(&with_notice(target, notice))
}

async fn contact_submit(Form(form): Form<ContactForm>) -> Redirect {
    let notice = contact_notice(&form);
    tracing::info!("Contact message: {}", notice.code());
    Redirect::to(&with_notice("/contact/", notice))
}

async fn comment_submit(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Form(form): Form<MessageForm>,
) -> Response {
    let Some(post) = state.store.get_by_id(&id) else {
        return state.not_found();
    };
    let notice = comment_notice(&form);
    Redirect::to(&with_notice(&state.post_url(post), notice)).into_response()
}

async fn reply_submit(
    State(state): State<SharedState>,
    Path((id, comment_id)): Path<(String, String)>,
    Form(form): Form<MessageForm>,
) -> Response {
    let Some(post) = state
        .store
        .get_by_id(&id)
        .filter(|p| p.comment(&comment_id).is_some())
    else {
        return state.not_found();
    };
    let notice = reply_notice(&form);
    Redirect::to(&with_notice(&state.post_url(post), notice)).into_response()
}

async fn comment_like(
    State(state): State<SharedState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Response {
    let Some(post) = state
        .store
        .get_by_id(&id)
        .filter(|p| p.comment(&comment_id).is_some())
    else {
        return state.not_found();
    };

    let liked = {
        let mut likes = state.likes.lock().unwrap_or_else(|e| e.into_inner());
        likes.toggle_comment(&comment_id)
    };
    like_redirect(&state.post_url(post), liked.then_some(Notice::CommentLiked))
}

async fn reply_like(
    State(state): State<SharedState>,
    Path((id, reply_id)): Path<(String, String)>,
) -> Response {
    let Some(post) = state
        .store
        .get_by_id(&id)
        .filter(|p| p.reply(&reply_id).is_some())
    else {
        return state.not_found();
    };

    let liked = {
        let mut likes = state.likes.lock().unwrap_or_else(|e| e.into_inner());
        likes.toggle_reply(&reply_id)
    };
    like_redirect(&state.post_url(post), liked.then_some(Notice::ReplyLiked))
}

/// Taking a like back is silent
fn like_redirect(post_url: &str, notice: Option<Notice>) -> Response {
    match notice {
        Some(notice) => Redirect::to(&with_notice(post_url, notice)).into_response(),
        None => Redirect::to(post_url).into_response(),
    }
}

/// WebSocket handler for theme changes
async fn theme_socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let changes = state.theme.subscribe();
    ws.on_upgrade(move |socket| handle_theme_socket(socket, changes))
}

/// Push the mode to the page on every toggle
async fn handle_theme_socket(mut socket: WebSocket, mut changes: watch::Receiver<ThemeMode>) {
    tracing::debug!("Theme client connected");

    loop {
        tokio::select! {
            result = changes.changed() => {
                if result.is_err() {
                    break;
                }
                let mode = *changes.borrow_and_update();
                if socket.send(Message::Text(mode.to_string())).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Theme client disconnected");
}

async fn api_posts(State(state): State<SharedState>) -> Response {
    Json(state.store.get_all()).into_response()
}

async fn api_post(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.store.get_by_id(&id) {
        Some(post) => Json(post).into_response(),
        None => api_not_found("post not found"),
    }
}

async fn api_popular(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let limit = clamp_limit(query.limit, state.pages.config().sidebar.popular);
    Json(state.store.get_popular(limit)).into_response()
}

async fn api_recent(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let limit = clamp_limit(query.limit, state.pages.config().sidebar.recent);
    Json(state.store.get_recent(limit)).into_response()
}

async fn api_categories(State(state): State<SharedState>) -> Response {
    Json(state.store.category_counts()).into_response()
}

async fn api_category(
    State(state): State<SharedState>,
    Path(category): Path<String>,
) -> Response {
    Json(state.store.get_by_category(&category)).into_response()
}

async fn api_search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let keyword = query.q.as_deref().unwrap_or("").trim();
    Json(state.store.search(keyword)).into_response()
}

/// Theme state as reported by the API
#[derive(Debug, Serialize)]
struct ThemeState {
    mode: ThemeMode,
    marker: DocumentMarker,
}

async fn api_theme(State(state): State<SharedState>) -> Json<ThemeState> {
    Json(ThemeState {
        mode: state.theme.current(),
        marker: state.theme.marker(),
    })
}

async fn api_theme_toggle(State(state): State<SharedState>) -> Json<ThemeState> {
    let mode = state.theme.toggle();
    Json(ThemeState {
        mode,
        marker: state.theme.marker(),
    })
}

fn api_not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Unknown paths get the 404 page
async fn fallback_handler(State(state): State<SharedState>, uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    state.not_found()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::testing::{comment, post};
    use crate::content::{Category, Reply};
    use crate::preference::{FixedScheme, MemoryStorage};
    use chrono::{Duration, Local, TimeZone};

    fn store() -> ContentStore {
        let base = Local.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let mut first = post("first", Category::Technology, 1, base);
        let mut c = comment("first-c9", base + Duration::hours(3), 4);
        c.replies.push(Reply {
            id: "first-r1".to_string(),
            author: c.author.clone(),
            content: "Agreed".to_string(),
            date: base + Duration::hours(4),
            likes: 2,
        });
        first.comments.push(c);
        let second = post("second", Category::Travel, 3, base + Duration::days(1));
        let third = post("third", Category::Travel, 0, base + Duration::days(2));
        ContentStore::new(vec![first, second, third]).unwrap()
    }

    fn state() -> SharedState {
        let dir = std::env::temp_dir();
        let site = Articulate::with_config(dir, SiteConfig::default());
        let theme =
            ThemePreference::initialize(Box::new(MemoryStorage::new()), &FixedScheme(None));
        Arc::new(ServerState::new(&site, store(), theme).unwrap())
    }

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_page_and_missing_post() {
        let state = state();

        let response = post_page(
            State(state.clone()),
            Path("first".to_string()),
            Query(NoticeQuery::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.contains("Post first"));

        let response = post_page(
            State(state),
            Path("nope".to_string()),
            Query(NoticeQuery::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body(response).await.contains("Post Not Found"));
    }

    #[tokio::test]
    async fn test_home_page_out_of_range_is_404() {
        let state = state();
        let response = home_paged(
            State(state),
            Path("9".to_string()),
            Query(HomeQuery::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_home_page_not_a_number_is_404() {
        let state = state();
        let response = home_paged(
            State(state),
            Path("abc".to_string()),
            Query(HomeQuery::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body(response).await.contains("Oops! Page not found"));
    }

    #[tokio::test]
    async fn test_theme_toggle_redirects_back() {
        let state = state();
        let form = RedirectForm {
            redirect: Some("/post/first/".to_string()),
        };

        let response = theme_toggle(State(state.clone()), Form(form))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/post/first/");
        assert_eq!(state.theme.current(), ThemeMode::Dark);

        let page = home_page(State(state), Query(HomeQuery::default())).await;
        assert!(body(page).await.contains(r#"class="dark" data-theme="dark""#));
    }

    #[tokio::test]
    async fn test_theme_toggle_rejects_offsite_redirect() {
        let form = RedirectForm {
            redirect: Some("//evil.test/".to_string()),
        };
        let response = theme_toggle(State(state()), Form(form))
            .await
            .into_response();
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_comment_submit_notices() {
        let state = state();

        let empty = MessageForm {
            content: "   ".to_string(),
        };
        let response = comment_submit(State(state.clone()), Path("first".to_string()), Form(empty))
            .await;
        assert_eq!(location(&response), "/post/first/?notice=empty-comment");

        let filled = MessageForm {
            content: "Nice".to_string(),
        };
        let response =
            comment_submit(State(state.clone()), Path("first".to_string()), Form(filled)).await;
        assert_eq!(location(&response), "/post/first/?notice=comment-submitted");

        // acknowledgement only
        assert_eq!(state.store.get_by_id("first").unwrap().comments.len(), 2);
    }

    #[tokio::test]
    async fn test_comment_like_toggles_session_ledger() {
        let state = state();
        let path = || Path(("first".to_string(), "first-c9".to_string()));

        let response = comment_like(State(state.clone()), path()).await;
        assert_eq!(location(&response), "/post/first/?notice=comment-liked");
        let page = post_page(
            State(state.clone()),
            Path("first".to_string()),
            Query(NoticeQuery::default()),
        )
        .await;
        assert!(body(page).await.contains("&#9829; 5</button>"));

        // second press takes the like back without a notice
        let response = comment_like(State(state.clone()), path()).await;
        assert_eq!(location(&response), "/post/first/");
        assert_eq!(
            state
                .store
                .get_by_id("first")
                .unwrap()
                .comment("first-c9")
                .unwrap()
                .likes,
            4
        );
    }

    #[tokio::test]
    async fn test_reply_routes_require_existing_targets() {
        let state = state();

        let response = reply_like(
            State(state.clone()),
            Path(("first".to_string(), "first-r1".to_string())),
        )
        .await;
        assert_eq!(location(&response), "/post/first/?notice=reply-liked");

        let response = reply_like(
            State(state.clone()),
            Path(("second".to_string(), "first-r1".to_string())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let form = MessageForm {
            content: "Me too".to_string(),
        };
        let response = reply_submit(
            State(state),
            Path(("first".to_string(), "first-c9".to_string())),
            Form(form),
        )
        .await;
        assert_eq!(location(&response), "/post/first/?notice=reply-submitted");
    }

    #[tokio::test]
    async fn test_subscribe_and_contact_notices() {
        let form = SubscribeForm {
            email: "reader.example.com".to_string(),
            redirect: Some("/about/".to_string()),
        };
        let response = subscribe(Form(form)).await.into_response();
        assert_eq!(location(&response), "/about/?notice=invalid-email");

        let form = ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "General Inquiry".to_string(),
            message: "Hello".to_string(),
        };
        let response = contact_submit(Form(form)).await.into_response();
        assert_eq!(location(&response), "/contact/?notice=message-sent");
    }

    #[tokio::test]
    async fn test_api_popular_and_limits() {
        let state = state();

        let response = api_popular(
            State(state.clone()),
            Query(LimitQuery { limit: Some(2) }),
        )
        .await;
        let posts: Vec<serde_json::Value> = serde_json::from_str(&body(response).await).unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["second", "first"]);

        let response = api_recent(State(state), Query(LimitQuery { limit: Some(-3) })).await;
        assert_eq!(body(response).await, "[]");
    }

    #[tokio::test]
    async fn test_api_post_missing() {
        let response = api_post(State(state()), Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body(response).await.contains("post not found"));
    }

    #[tokio::test]
    async fn test_api_search_trims_keyword() {
        let query = SearchQuery {
            q: Some("  body of third ".to_string()),
            notice: None,
        };
        let response = api_search(State(state()), Query(query)).await;
        let posts: Vec<serde_json::Value> = serde_json::from_str(&body(response).await).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["id"], "third");
    }

    #[tokio::test]
    async fn test_api_theme_toggle_notifies_subscribers() {
        let state = state();
        let mut changes = state.theme.subscribe();

        let Json(theme) = api_theme_toggle(State(state.clone())).await;
        assert_eq!(theme.mode, ThemeMode::Dark);
        assert!(theme.marker.has_class("dark"));

        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow(), ThemeMode::Dark);

        let Json(theme) = api_theme(State(state)).await;
        assert_eq!(theme.mode, ThemeMode::Dark);
    }
}
