//! Shared harness: the full router over in-memory stores.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use portal::auth::PasswordVerifier;
use portal::db::memory::{MemoryJobQueue, MemorySessionStore, MemoryUserRepository};
use portal::db::SessionStore;
use portal::models::SessionData;
use portal::{create_app, AppState, Config, CookieSigner, Mailer};
use std::io;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const WEB_URL: &str = "https://app.example.com";

pub struct TestApp {
    pub app: axum::Router,
    pub config: Arc<Config>,
    pub users: Arc<MemoryUserRepository>,
    pub jobs: Arc<MemoryJobQueue>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "APP_ENV" => Some("test".to_string()),
        "WEB_URL" => Some(WEB_URL.to_string()),
        "SESSION_KEY" => Some("test-session-key-min-32-chars!!!!".to_string()),
        _ => None,
    })
    .expect("test config")
}

impl TestApp {
    pub fn new() -> Self {
        let config = Arc::new(test_config());
        let users = Arc::new(MemoryUserRepository::new());
        let jobs = Arc::new(MemoryJobQueue::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let state = AppState {
            config: config.clone(),
            users: users.clone(),
            sessions: sessions.clone(),
            credentials: Arc::new(PasswordVerifier::new(users.clone())),
            mailer: Mailer::new(jobs.clone(), &config),
            signer: CookieSigner::new(&config.session.key),
        };
        Self {
            app: create_app(state),
            config,
            users,
            jobs,
            sessions,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.unwrap()
    }

    /// POST a JSON body asking for a JSON answer.
    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// POST an urlencoded form the way a browser does.
    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    /// Server-side session behind a `portal.sid=<id>.<sig>` cookie.
    pub async fn session(&self, cookie: &str) -> Option<SessionData> {
        let signed = cookie.strip_prefix("portal.sid=")?;
        let (id, _) = signed.rsplit_once('.')?;
        self.sessions.load(id).await.unwrap()
    }

    /// Store `data` under a new session id and return its signed cookie.
    pub async fn plant_session(&self, id: &str, data: SessionData) -> String {
        self.sessions
            .store(id, &data, self.config.session.ttl)
            .await
            .unwrap();
        let signed = CookieSigner::new(&self.config.session.key).sign(id).unwrap();
        format!("portal.sid={}", signed)
    }

    /// Raw reset token from the most recent reset-password email job.
    pub async fn last_reset_token(&self) -> Option<String> {
        let jobs = self.jobs.jobs().await;
        let job = jobs
            .iter()
            .rev()
            .find(|j| j.data["template"] == "reset-password")?;
        let link = job.data["locals"]["link"].as_str()?;
        link.rsplit('/').next().map(str::to_string)
    }
}

/// `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("portal.sid="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Formatted tracing output of the current thread, for asserting on log events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
