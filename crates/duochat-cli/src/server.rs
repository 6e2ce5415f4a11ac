//! Web UI — login, chat view, send, delete, logout.
//!
//! Every request is one synchronous cycle against the message store. Sessions
//! live in a token table keyed by the `duochat_session` cookie; a session is
//! discarded on logout or once it outlives `server.sessionTtlMinutes`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Form, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use duochat_core::config::Config;
use duochat_core::render::{render_chat_page, render_login_page, Notice, NoticeLevel};
use duochat_core::session::parse_ai_command;
use duochat_core::utils::capitalize_first;
use duochat_core::{ChatSession, Credentials, DeleteOutcome, MessageStore, StoreError};
use duochat_providers::{ask_ai, ReplyProvider};

const SESSION_COOKIE: &str = "duochat_session";

// ─────────────────────────────────────────────
// State
// ─────────────────────────────────────────────

/// Shared server state.
pub struct AppState {
    app_name: String,
    store: MessageStore,
    credentials: Credentials,
    provider: Option<Arc<dyn ReplyProvider>>,
    assistant_name: String,
    session_ttl: chrono::Duration,
    /// Token → logged-in session.
    sessions: RwLock<HashMap<String, ChatSession>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: MessageStore,
        provider: Option<Arc<dyn ReplyProvider>>,
    ) -> Self {
        AppState {
            app_name: config.display.app_name.clone(),
            store,
            credentials: config.credentials(),
            provider,
            assistant_name: config.ai.assistant_name.clone(),
            session_ttl: config.server.session_ttl(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the request's cookie to a live session, evicting expired ones.
    async fn session_for(&self, headers: &HeaderMap) -> Option<ChatSession> {
        let token = session_token(headers)?;

        let session = self.sessions.read().await.get(token).cloned()?;
        if session.is_expired(self.session_ttl, Utc::now()) {
            info!(user = %session.user, "session expired");
            self.sessions.write().await.remove(token);
            return None;
        }
        Some(session)
    }

    /// Store `session` under a fresh token, dropping every expired entry first.
    async fn open_session(&self, session: ChatSession, now: DateTime<Utc>) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.session_ttl, now));
        if sessions.len() < before {
            debug!(evicted = before - sessions.len(), "evicted expired sessions");
        }
        info!(user = %session.user, "logged in");
        sessions.insert(token.clone(), session);
        token
    }
}

type SharedState = Arc<AppState>;

/// Build the router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/send", post(send))
        .route("/delete", post(delete))
        .route("/logout", post(logout))
        .with_state(state)
}

/// Start the web UI and serve until Ctrl+C.
pub async fn run(config: &Config) -> Result<()> {
    let store = crate::build_store(config)?;
    let provider = crate::build_provider(config);
    if config.users.len() < 2 {
        warn!("fewer than two users configured; nobody will have a chat partner");
    }

    let state = Arc::new(AppState::new(config, store, provider));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!();
    println!("  💬 {} listening on http://{}", config.display.app_name, addr);
    println!();

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("web server failed")?;

    info!("server stopped");
    Ok(())
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// A store failure surfaced as a 500 page.
struct AppError(StoreError);

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "store operation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Something went wrong</h1><p>{}</p><p><a href=\"/\">Back</a></p>",
                duochat_core::render::escape_html(&self.0.to_string())
            )),
        )
            .into_response()
    }
}

type AppResult<T> = std::result::Result<T, AppError>;

// ─────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct NoticeQuery {
    notice: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SendForm {
    #[serde(default)]
    text: String,
}

/// `GET /` — login page, or one full view cycle for a logged-in user.
async fn index(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> AppResult<Response> {
    let notice = query.notice.as_deref().and_then(notice_for);

    let Some(session) = state.session_for(&headers).await else {
        return Ok(Html(render_login_page(&state.app_name, notice.as_ref())).into_response());
    };

    let view = session.refresh(&state.store)?;
    let notices: Vec<Notice> = notice.into_iter().collect();
    Ok(Html(render_chat_page(&state.app_name, &view, &notices)).into_response())
}

/// `POST /login` — check credentials and open a session.
async fn login(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    match state.credentials.verify(form.username.trim(), &form.password) {
        Ok(session) => {
            let token = state.open_session(session, Utc::now()).await;
            let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
            ([(header::SET_COOKIE, cookie)], Redirect::to("/?notice=welcome")).into_response()
        }
        Err(e) => {
            let notice = Notice::new(NoticeLevel::Error, capitalize_first(&e.to_string()));
            (
                StatusCode::UNAUTHORIZED,
                Html(render_login_page(&state.app_name, Some(&notice))),
            )
                .into_response()
        }
    }
}

/// `POST /send` — append a message, or route `/ai` prompts to the provider.
async fn send(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<SendForm>,
) -> AppResult<Redirect> {
    let Some(session) = state.session_for(&headers).await else {
        return Ok(Redirect::to("/"));
    };

    if let Some(prompt) = parse_ai_command(form.text.trim()) {
        let Some(provider) = &state.provider else {
            return Ok(Redirect::to("/?notice=ai_disabled"));
        };
        ask_ai(
            &session,
            &state.store,
            provider.as_ref(),
            prompt,
            &state.assistant_name,
        )
        .await?;
        return Ok(Redirect::to("/"));
    }

    session.send(&state.store, &form.text)?;
    Ok(Redirect::to("/"))
}

/// `POST /delete` — remove the whole conversation.
async fn delete(State(state): State<SharedState>, headers: HeaderMap) -> AppResult<Redirect> {
    let Some(session) = state.session_for(&headers).await else {
        return Ok(Redirect::to("/"));
    };

    let target = match session.delete(&state.store)? {
        DeleteOutcome::Deleted => "/?notice=deleted",
        DeleteOutcome::NothingToDelete => "/?notice=nothing",
    };
    Ok(Redirect::to(target))
}

/// `POST /logout` — drop the session and clear the cookie.
async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Some(session) = state.sessions.write().await.remove(token) {
            info!(user = %session.user, "logged out");
        }
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

/// Extract the session token from the `Cookie` header.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Map a `?notice=` code to a banner.
fn notice_for(code: &str) -> Option<Notice> {
    let notice = match code {
        "welcome" => Notice::new(NoticeLevel::Success, "Login successful!"),
        "deleted" => Notice::new(NoticeLevel::Success, DeleteOutcome::Deleted.notice()),
        "nothing" => Notice::new(NoticeLevel::Warning, DeleteOutcome::NothingToDelete.notice()),
        "ai_disabled" => Notice::new(NoticeLevel::Warning, "AI replies are not configured."),
        _ => return None,
    };
    Some(notice)
}


// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use reqwest::redirect::Policy;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(ai_base: Option<String>) -> Config {
        let mut config = Config::default();
        config.users.insert("alice".to_string(), "s3cret".to_string());
        config.users.insert("bob".to_string(), "hunter2".to_string());
        if let Some(base) = ai_base {
            config.ai.api_key = "gsk-test".to_string();
            config.ai.api_base = Some(base);
        }
        config
    }

    /// Serve on an ephemeral port; returns the base URL.
    async fn spawn_server(config: Config) -> (String, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(Some(dir.path().to_path_buf()), config.display.tz()).unwrap();
        let provider = crate::build_provider(&config);
        let state = Arc::new(AppState::new(&config, store, provider));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        (format!("http://{addr}"), dir)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap()
    }

    async fn login_as(base: &str, user: &str, password: &str) -> String {
        let resp = client()
            .post(format!("{base}/login"))
            .form(&[("username", user), ("password", password)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        let set_cookie = resp.headers()[reqwest::header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn get_page(base: &str, cookie: &str) -> String {
        client()
            .get(format!("{base}/"))
            .header(reqwest::header::COOKIE, cookie)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    async fn post_form(base: &str, route: &str, cookie: &str, form: &[(&str, &str)]) -> reqwest::Response {
        client()
            .post(format!("{base}{route}"))
            .header(reqwest::header::COOKIE, cookie)
            .form(form)
            .send()
            .await
            .unwrap()
    }

    #[test]
    fn test_session_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; duochat_session=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc-123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("duochat_session="));
        assert_eq!(session_token(&empty), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_login_evicts_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(None);
        config.server.session_ttl_minutes = 0;
        let store = MessageStore::new(Some(dir.path().to_path_buf()), config.display.tz()).unwrap();
        let state = AppState::new(&config, store, None);

        let start = Utc::now();
        for i in 0..50 {
            let now = start + chrono::Duration::seconds(i);
            let mut session = ChatSession::new("alice", "bob");
            session.created_at = now;
            state.open_session(session, now).await;
        }
        assert_eq!(state.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_login_keeps_live_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(None);
        let store = MessageStore::new(Some(dir.path().to_path_buf()), config.display.tz()).unwrap();
        let state = AppState::new(&config, store, None);

        let now = Utc::now();
        state.open_session(ChatSession::new("alice", "bob"), now).await;
        state.open_session(ChatSession::new("bob", "alice"), now).await;
        assert_eq!(state.sessions.read().await.len(), 2);
    }

    #[test]
    fn test_notice_codes() {
        assert_eq!(notice_for("deleted").unwrap().text, "Chat deleted!");
        assert_eq!(notice_for("nothing").unwrap().level, NoticeLevel::Warning);
        assert!(notice_for("bogus").is_none());
    }

    #[tokio::test]
    async fn test_anonymous_gets_login_page() {
        let (base, _dir) = spawn_server(test_config(None)).await;
        let resp = client().get(format!("{base}/")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.text().await.unwrap().contains("Login to MyChatPro"));
    }

    #[tokio::test]
    async fn test_bad_login_is_rejected() {
        let (base, _dir) = spawn_server(test_config(None)).await;
        let resp = client()
            .post(format!("{base}/login"))
            .form(&[("username", "alice"), ("password", "wrong")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert!(resp.text().await.unwrap().contains("Invalid username or password"));
    }

    #[tokio::test]
    async fn test_send_and_read_receipts() {
        let (base, _dir) = spawn_server(test_config(None)).await;
        let alice = login_as(&base, "alice", "s3cret").await;
        let bob = login_as(&base, "bob", "hunter2").await;

        let resp = post_form(&base, "/send", &alice, &[("text", "hello bob")]).await;
        assert_eq!(resp.status(), 303);

        let page = get_page(&base, &alice).await;
        assert!(page.contains("hello bob"));
        assert!(page.contains("<span style='color:gray;'>✔</span>"));

        let page = get_page(&base, &bob).await;
        assert!(page.contains("hello bob"));
        assert!(page.contains("Chatting with: <b>alice</b>"));

        let page = get_page(&base, &alice).await;
        assert!(page.contains("✔✔"));
    }

    #[tokio::test]
    async fn test_delete_chat() {
        let (base, _dir) = spawn_server(test_config(None)).await;
        let alice = login_as(&base, "alice", "s3cret").await;
        post_form(&base, "/send", &alice, &[("text", "bye")]).await;

        let resp = post_form(&base, "/delete", &alice, &[]).await;
        assert_eq!(resp.headers()[reqwest::header::LOCATION], "/?notice=deleted");

        let resp = post_form(&base, "/delete", &alice, &[]).await;
        assert_eq!(resp.headers()[reqwest::header::LOCATION], "/?notice=nothing");
    }

    #[tokio::test]
    async fn test_logout_discards_session() {
        let (base, _dir) = spawn_server(test_config(None)).await;
        let alice = login_as(&base, "alice", "s3cret").await;

        let resp = post_form(&base, "/logout", &alice, &[]).await;
        assert_eq!(resp.status(), 303);

        let page = get_page(&base, &alice).await;
        assert!(page.contains("Login to MyChatPro"));
    }

    #[tokio::test]
    async fn test_ai_disabled_without_key() {
        let (base, _dir) = spawn_server(test_config(None)).await;
        let alice = login_as(&base, "alice", "s3cret").await;
        let resp = post_form(&base, "/send", &alice, &[("text", "/ai hi")]).await;
        assert_eq!(resp.headers()[reqwest::header::LOCATION], "/?notice=ai_disabled");
    }

    #[tokio::test]
    async fn test_ai_reply_is_appended() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Because it was shellfish."}}]
            })))
            .mount(&mock_server)
            .await;

        let (base, _dir) = spawn_server(test_config(Some(mock_server.uri()))).await;
        let alice = login_as(&base, "alice", "s3cret").await;
        post_form(&base, "/send", &alice, &[("text", "/ai tell me a crab joke")]).await;

        let page = get_page(&base, &alice).await;
        assert!(page.contains("/ai tell me a crab joke"));
        assert!(page.contains("Because it was shellfish."));
        assert!(page.contains("<b style=\"color:#2D2D2D;\">Assistant</b>"));
    }
}
