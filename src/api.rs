//! HTTP API server for the dashboard
//!
//! Routes page, asset, auth, and app CRUD requests. Handlers validate input,
//! orchestrate upload storage and validation, and keep the upload directory
//! consistent with the `image_url` column (old files are removed when an
//! image is replaced or its app deleted).

use crate::config::Config;
use crate::db::{AppFields, Database};
use crate::error::{error_response, ApiError};
use crate::multipart::{self, MultipartForm};
use crate::pages;
use crate::session::{AdminCredentials, LoginRateLimiter, SessionStore};
use crate::uploads::{content_type_for, UploadStore};
use anyhow::{Context, Result};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE, SET_COOKIE};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Slack on top of the image byte ceiling for the other form fields
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Ceiling for JSON request bodies (login)
const MAX_JSON_BODY_BYTES: usize = 16 * 1024;

/// Login request body
#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Dashboard API server
pub struct ApiServer {
    bind_addr: SocketAddr,
    db: Arc<Database>,
    uploads: UploadStore,
    sessions: SessionStore,
    credentials: AdminCredentials,
    login_limiter: LoginRateLimiter,
    max_image_size: u32,
    max_image_bytes: usize,
    shutdown_rx: watch::Receiver<bool>,
}

impl ApiServer {
    /// Create the server from validated configuration
    pub fn new(
        config: &Config,
        db: Arc<Database>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let bind_addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid bind address {}:{}",
                    config.server.bind, config.server.port
                )
            })?;

        let uploads = UploadStore::new(
            config.storage.upload_dir.clone(),
            config.uploads.max_image_size,
        )?;

        let credentials = AdminCredentials::new(
            config.auth.admin_email.clone().unwrap_or_default(),
            config.auth.admin_password.clone().unwrap_or_default(),
        );

        Ok(Self {
            bind_addr,
            db,
            uploads,
            sessions: SessionStore::new(config.auth.cookie_secure),
            credentials,
            login_limiter: LoginRateLimiter::default(),
            max_image_size: config.uploads.max_image_size,
            max_image_bytes: config.uploads.max_image_bytes,
            shutdown_rx,
        })
    }

    /// Run the accept loop until shutdown is signalled
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "homelinks listening");

        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let server = Arc::clone(&self);
                            tokio::spawn(async move {
                                if let Err(e) = server.serve_connection(stream, addr).await {
                                    debug!(addr = %addr, error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("API server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: tokio::net::TcpStream,
        addr: SocketAddr,
    ) -> Result<()> {
        let io = TokioIo::new(stream);
        let service = service_fn(move |req| {
            let server = Arc::clone(&self);
            async move { server.handle_request(req, addr).await }
        });

        AutoBuilder::new(TokioExecutor::new())
            .serve_connection(io, service)
            .await
            .map_err(|e| anyhow::anyhow!("Connection error: {}", e))?;

        Ok(())
    }

    async fn handle_request(
        self: Arc<Self>,
        req: Request<Incoming>,
        client: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let path = req.uri().path().to_string();
        let method = req.method().clone();

        debug!(%method, %path, "request");

        let result = self.route(req, client).await;

        Ok(result.unwrap_or_else(|err| {
            if let ApiError::Internal(ref e) = err {
                error!(%method, %path, error = ?e, "Request failed");
            }
            error_response(&err)
        }))
    }

    async fn route(
        self: Arc<Self>,
        req: Request<Incoming>,
        client: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, ApiError> {
        let path = req.uri().path().to_string();
        let method = req.method().clone();
        let authenticated = self.authenticated_email(&req).is_some();

        // Unauthenticated surface: health, login flow, static assets
        match (&method, path.as_str()) {
            (&Method::GET, "/health") => return self.health(),
            (&Method::GET, "/login.html") => return Ok(pages::serve_login()),
            (&Method::GET, "/assets/style.css") => return Ok(pages::serve_css()),
            (&Method::GET, "/assets/app.js") => return Ok(pages::serve_js()),
            (&Method::GET, "/assets/login.js") => return Ok(pages::serve_login_js()),
            (&Method::GET, "/api/session") => return self.session_info(&req),
            (&Method::POST, "/api/login") => return self.login(req, client).await,
            (&Method::POST, "/api/logout") => return self.logout(&req),
            _ => {}
        }

        // Page routes redirect anonymous visitors to the login page
        if method == Method::GET && (path == "/" || path == "/index.html") {
            return Ok(if authenticated {
                pages::serve_index()
            } else {
                pages::redirect_to_login()
            });
        }
        if method == Method::GET && path.starts_with("/uploads/") {
            if !authenticated {
                return Ok(pages::redirect_to_login());
            }
            let filename = path.strip_prefix("/uploads/").unwrap_or("");
            return self.serve_upload(filename);
        }

        // Everything below is the authenticated JSON API
        if !authenticated {
            return Err(ApiError::Unauthorized);
        }

        match (method, path.as_str()) {
            (Method::GET, "/api/apps") => self.list_apps(),
            (Method::GET, "/api/apps/categories") => self.list_categories(),
            (Method::POST, "/api/apps") => self.create_app(req).await,
            (Method::PATCH, path) if favorite_route_id(path).is_some() => {
                let id = parse_app_id(favorite_route_id(path))?;
                self.toggle_favorite(id)
            }
            (Method::PUT, path) if path.starts_with("/api/apps/") => {
                let id = parse_app_id(path.strip_prefix("/api/apps/"))?;
                self.update_app(id, req).await
            }
            (Method::DELETE, path) if path.starts_with("/api/apps/") => {
                let id = parse_app_id(path.strip_prefix("/api/apps/"))?;
                self.delete_app(id)
            }
            _ => Err(ApiError::NotFound("Not found".to_string())),
        }
    }

    // ==================== Auth ====================

    fn authenticated_email(&self, req: &Request<Incoming>) -> Option<String> {
        let cookie_header = req.headers().get(COOKIE)?.to_str().ok()?;
        let id = self.sessions.id_from_cookie_header(cookie_header)?;
        Some(self.sessions.get(&id)?.email)
    }

    fn session_info(&self, req: &Request<Incoming>) -> Result<Response<Full<Bytes>>, ApiError> {
        let body = match self.authenticated_email(req) {
            Some(email) => serde_json::json!({ "authenticated": true, "email": email }),
            None => serde_json::json!({ "authenticated": false }),
        };
        Ok(json_response(StatusCode::OK, body.to_string()))
    }

    async fn login(
        &self,
        req: Request<Incoming>,
        client: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, ApiError> {
        // Attempts are bounded per client regardless of credential correctness
        if !self.login_limiter.check(&client.ip().to_string()) {
            warn!(client = %client.ip(), "Login rate limit exceeded");
            return Err(ApiError::RateLimited);
        }

        let body = read_body(req, MAX_JSON_BODY_BYTES).await?;
        let login = parse_login(&body)?;

        if !self.credentials.verify(&login.email, &login.password) {
            // One indistinguishable failure for any mismatch
            return Ok(crate::error::json_error(
                StatusCode::UNAUTHORIZED,
                "invalid credentials",
            ));
        }

        let session_id = self.sessions.create(self.credentials.email());
        info!(email = %self.credentials.email(), "Admin logged in");

        let mut response = json_response(StatusCode::OK, r#"{"ok":true}"#);
        set_cookie(&mut response, self.sessions.session_cookie(&session_id))?;
        Ok(response)
    }

    fn logout(&self, req: &Request<Incoming>) -> Result<Response<Full<Bytes>>, ApiError> {
        if let Some(cookie_header) = req.headers().get(COOKIE).and_then(|v| v.to_str().ok()) {
            if let Some(id) = self.sessions.id_from_cookie_header(cookie_header) {
                self.sessions.destroy(&id);
            }
        }

        let mut response = json_response(StatusCode::OK, r#"{"ok":true}"#);
        set_cookie(&mut response, self.sessions.logout_cookie())?;
        Ok(response)
    }

    // ==================== Apps ====================

    fn list_apps(&self) -> Result<Response<Full<Bytes>>, ApiError> {
        let apps = self.db.list_apps().context("Failed to load apps")?;
        Ok(json_response(
            StatusCode::OK,
            serde_json::to_string(&apps).context("Failed to serialize apps")?,
        ))
    }

    fn list_categories(&self) -> Result<Response<Full<Bytes>>, ApiError> {
        let categories = self
            .db
            .list_categories()
            .context("Failed to load categories")?;
        Ok(json_response(
            StatusCode::OK,
            serde_json::to_string(&categories).context("Failed to serialize categories")?,
        ))
    }

    async fn create_app(&self, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, ApiError> {
        let form = self.read_multipart(req).await?;
        let mut fields = validate_fields(&form)?;
        fields.image_url = self.store_validated_image(&form)?;

        let result = self.db.create_app(&fields);
        match result {
            Ok(id) => {
                info!(id, name = %fields.name, "Created app");
                Ok(json_response(
                    StatusCode::CREATED,
                    serde_json::json!({ "id": id }).to_string(),
                ))
            }
            Err(e) => {
                // Keep the upload directory consistent when the insert fails
                if let Some(image_url) = &fields.image_url {
                    self.uploads.remove(image_url);
                }
                Err(ApiError::Internal(e.context("Failed to create app")))
            }
        }
    }

    async fn update_app(
        &self,
        id: i64,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, ApiError> {
        let form = self.read_multipart(req).await?;
        let mut fields = validate_fields(&form)?;
        fields.image_url = self.store_validated_image(&form)?;

        let result = self.apply_update(id, &fields);
        if result.is_err() {
            if let Some(image_url) = &fields.image_url {
                self.uploads.remove(image_url);
            }
        }
        result
    }

    fn apply_update(
        &self,
        id: i64,
        fields: &AppFields,
    ) -> Result<Response<Full<Bytes>>, ApiError> {
        let existing = self
            .db
            .get_app(id)
            .context("Failed to load app")?
            .ok_or_else(|| ApiError::NotFound("app not found".to_string()))?;

        let changed = self
            .db
            .update_app(id, fields)
            .context("Failed to update app")?;
        if changed == 0 {
            return Err(ApiError::NotFound("app not found".to_string()));
        }

        // A replacing upload orphans the old file
        if fields.image_url.is_some() {
            if let Some(old) = &existing.image_url {
                self.uploads.remove(old);
            }
        }

        info!(id, name = %fields.name, "Updated app");
        Ok(json_response(StatusCode::OK, r#"{"ok":true}"#))
    }

    fn delete_app(&self, id: i64) -> Result<Response<Full<Bytes>>, ApiError> {
        let existing = self.db.get_app(id).context("Failed to load app")?;

        let changed = self.db.delete_app(id).context("Failed to delete app")?;
        if changed == 0 {
            return Err(ApiError::NotFound("app not found".to_string()));
        }

        if let Some(image_url) = existing.and_then(|app| app.image_url) {
            self.uploads.remove(&image_url);
        }

        info!(id, "Deleted app");
        Ok(json_response(StatusCode::OK, r#"{"ok":true}"#))
    }

    fn toggle_favorite(&self, id: i64) -> Result<Response<Full<Bytes>>, ApiError> {
        let changed = self
            .db
            .toggle_favorite(id)
            .context("Failed to toggle favorite")?;
        if changed == 0 {
            return Err(ApiError::NotFound("app not found".to_string()));
        }
        Ok(json_response(StatusCode::OK, r#"{"ok":true}"#))
    }

    // ==================== Uploads ====================

    async fn read_multipart(&self, req: Request<Incoming>) -> Result<MultipartForm, ApiError> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| ApiError::Validation("Expected multipart/form-data".to_string()))?;

        let body = read_body(req, self.max_image_bytes + FORM_OVERHEAD_BYTES)
            .await
            .map_err(|err| match err {
                ApiError::Validation(_) => ApiError::Validation(self.image_size_message()),
                other => other,
            })?;

        multipart::parse(&content_type, &body).map_err(ApiError::Validation)
    }

    /// Store the uploaded file (if any) and check its pixel geometry.
    /// Rejection leaves nothing behind in the upload directory.
    fn store_validated_image(&self, form: &MultipartForm) -> Result<Option<String>, ApiError> {
        let Some(file) = &form.file else {
            return Ok(None);
        };

        if file.field_name != "image" {
            return Err(ApiError::Validation(format!(
                "Unexpected file field: {}",
                file.field_name
            )));
        }
        if file.data.len() > self.max_image_bytes {
            return Err(ApiError::Validation(self.image_size_message()));
        }

        let filename = self
            .uploads
            .store(&file.data, &file.filename)
            .context("Failed to store upload")?;

        if !self.uploads.validate(&filename) {
            self.uploads.remove(&self.uploads.url_for(&filename));
            return Err(ApiError::Validation(format!(
                "Image must be max {0}x{0}",
                self.max_image_size
            )));
        }

        Ok(Some(self.uploads.url_for(&filename)))
    }

    fn serve_upload(&self, filename: &str) -> Result<Response<Full<Bytes>>, ApiError> {
        let bytes = self
            .uploads
            .read(filename)
            .context("Failed to read upload")?
            .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type_for(filename))
            .body(Full::new(Bytes::from(bytes)))
            .expect("valid response"))
    }

    fn image_size_message(&self) -> String {
        let bytes = self.max_image_bytes;
        if bytes % (1024 * 1024) == 0 {
            format!("Image must be <= {}MB", bytes / (1024 * 1024))
        } else {
            format!("Image must be <= {}KB", bytes / 1024)
        }
    }

    // ==================== Health ====================

    fn health(&self) -> Result<Response<Full<Bytes>>, ApiError> {
        match self.db.ping() {
            Ok(()) => Ok(json_response(
                StatusCode::OK,
                serde_json::json!({
                    "ok": true,
                    "status": "healthy",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })
                .to_string(),
            )),
            Err(e) => {
                error!(error = %e, "Health check failed");
                Ok(json_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    serde_json::json!({
                        "ok": false,
                        "status": "unhealthy",
                        "error": "Database unavailable",
                    })
                    .to_string(),
                ))
            }
        }
    }
}

// ==================== Validation ====================

/// Check text fields and build the persistence payload (image added later)
fn validate_fields(form: &MultipartForm) -> Result<AppFields, ApiError> {
    let name = form.field("name").map(str::trim).unwrap_or("");
    let url = form.field("url").map(str::trim).unwrap_or("");
    if name.is_empty() || url.is_empty() {
        return Err(ApiError::Validation(
            "name and url are required".to_string(),
        ));
    }

    let url = normalize_url(url)
        .ok_or_else(|| ApiError::Validation("Invalid URL format".to_string()))?;

    let category = optional_field(form, "category");
    if let Some(category) = &category {
        if category.chars().count() > 50 {
            return Err(ApiError::Validation(
                "Category must be 50 characters or less".to_string(),
            ));
        }
    }

    let description = optional_field(form, "description");
    if let Some(description) = &description {
        if description.chars().count() > 500 {
            return Err(ApiError::Validation(
                "Description must be 500 characters or less".to_string(),
            ));
        }
    }

    Ok(AppFields {
        name: name.to_string(),
        url,
        image_url: None,
        category,
        description,
    })
}

fn optional_field(form: &MultipartForm, name: &str) -> Option<String> {
    form.field(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Default a missing scheme to http://, then require an http/https URL
fn normalize_url(input: &str) -> Option<String> {
    let candidate = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };

    let parsed = url::Url::parse(&candidate).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    parsed.host_str()?;

    Some(candidate)
}

/// Parse and check the login body. Missing or empty fields are rejected
/// before any credential comparison happens.
fn parse_login(body: &[u8]) -> Result<LoginRequest, ApiError> {
    let login: LoginRequest = serde_json::from_slice(body)
        .map_err(|_| ApiError::Validation("email and password are required".to_string()))?;

    if login.email.is_empty() || login.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    Ok(login)
}

/// The app id inside a `PATCH /api/apps/:id/favorite` path, if the path has
/// that shape
fn favorite_route_id(path: &str) -> Option<&str> {
    path.strip_prefix("/api/apps/")?.strip_suffix("/favorite")
}

fn parse_app_id(segment: Option<&str>) -> Result<i64, ApiError> {
    segment
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))
}

// ==================== Helpers ====================

async fn read_body<B>(req: Request<B>, limit: usize) -> Result<Bytes, ApiError>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // Reject declared-oversize bodies before reading them
    if let Some(length) = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        if length > limit {
            return Err(ApiError::Validation("Request body too large".to_string()));
        }
    }

    // Limited bounds buffering for chunked bodies with no declared length
    let body = Limited::new(req.into_body(), limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::Validation("Request body too large".to_string())
            } else {
                ApiError::Internal(anyhow::anyhow!("Failed to read request body: {}", e))
            }
        })?
        .to_bytes();

    Ok(body)
}

fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(body.into()))
        .expect("valid response")
}

fn set_cookie(
    response: &mut Response<Full<Bytes>>,
    cookie: String,
) -> Result<(), ApiError> {
    let value = cookie
        .parse()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("Invalid cookie value")))?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_adds_default_scheme() {
        assert_eq!(
            normalize_url("example.com"),
            Some("http://example.com".to_string())
        );
        assert_eq!(
            normalize_url("example.com/path?q=1"),
            Some("http://example.com/path?q=1".to_string())
        );
    }

    #[test]
    fn test_normalize_url_keeps_explicit_scheme() {
        assert_eq!(
            normalize_url("https://example.com"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            normalize_url("http://192.168.1.10:8080"),
            Some("http://192.168.1.10:8080".to_string())
        );
    }

    #[test]
    fn test_normalize_url_rejects_other_schemes() {
        assert_eq!(normalize_url("ftp://example.com"), None);
        assert_eq!(normalize_url("file:///etc/passwd"), None);
    }

    #[test]
    fn test_normalize_url_rejects_garbage() {
        assert_eq!(normalize_url("http://"), None);
        assert_eq!(normalize_url("not a url at all"), None);
    }

    #[test]
    fn test_parse_login_requires_both_fields() {
        let err = parse_login(br#"{"email":"admin@example.com"}"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = parse_login(br#"{"password":"hunter2"}"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = parse_login(br#"{"email":"","password":""}"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        assert!(parse_login(b"not json").is_err());
    }

    #[test]
    fn test_parse_login_accepts_complete_body() {
        let login =
            parse_login(br#"{"email":"admin@example.com","password":"hunter2"}"#).unwrap();
        assert_eq!(login.email, "admin@example.com");
        assert_eq!(login.password, "hunter2");
    }

    #[tokio::test]
    async fn test_invalid_credentials_response_shape() {
        let response = crate::error::json_error(StatusCode::UNAUTHORIZED, "invalid credentials");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"invalid credentials"}"#);
    }

    #[test]
    fn test_favorite_route_id_requires_apps_prefix() {
        assert_eq!(favorite_route_id("/api/apps/7/favorite"), Some("7"));
        assert_eq!(favorite_route_id("/other/favorite"), None);
        assert_eq!(favorite_route_id("/api/apps/7"), None);
    }

    #[tokio::test]
    async fn test_read_body_enforces_limit_without_content_length() {
        let req = Request::builder()
            .body(Full::new(Bytes::from(vec![0u8; 100])))
            .unwrap();
        let err = read_body(req, 10).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .body(Full::new(Bytes::from_static(b"small")))
            .unwrap();
        assert_eq!(read_body(req, 10).await.unwrap().len(), 5);
    }

    #[test]
    fn test_parse_app_id() {
        assert_eq!(parse_app_id(Some("7")).unwrap(), 7);
        assert!(parse_app_id(Some("0")).is_err());
        assert!(parse_app_id(Some("-3")).is_err());
        assert!(parse_app_id(Some("abc")).is_err());
        assert!(parse_app_id(None).is_err());
    }

    fn form_with(fields: &[(&str, &str)]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for (k, v) in fields {
            form.fields.insert(k.to_string(), v.to_string());
        }
        form
    }

    #[test]
    fn test_validate_fields_requires_name_and_url() {
        assert!(validate_fields(&form_with(&[("name", "x")])).is_err());
        assert!(validate_fields(&form_with(&[("url", "example.com")])).is_err());
        assert!(validate_fields(&form_with(&[("name", "  "), ("url", "example.com")])).is_err());
    }

    #[test]
    fn test_validate_fields_trims_and_normalizes() {
        let fields = validate_fields(&form_with(&[
            ("name", "  Jellyfin  "),
            ("url", "media.local"),
            ("category", " Media "),
            ("description", ""),
        ]))
        .unwrap();
        assert_eq!(fields.name, "Jellyfin");
        assert_eq!(fields.url, "http://media.local");
        assert_eq!(fields.category.as_deref(), Some("Media"));
        assert!(fields.description.is_none());
    }

    #[test]
    fn test_validate_fields_length_ceilings() {
        let long_category = "x".repeat(51);
        let err = validate_fields(&form_with(&[
            ("name", "a"),
            ("url", "example.com"),
            ("category", &long_category),
        ]))
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let long_description = "x".repeat(501);
        assert!(validate_fields(&form_with(&[
            ("name", "a"),
            ("url", "example.com"),
            ("description", &long_description),
        ]))
        .is_err());

        // Exactly at the ceiling is fine
        let max_category = "x".repeat(50);
        assert!(validate_fields(&form_with(&[
            ("name", "a"),
            ("url", "example.com"),
            ("category", &max_category),
        ]))
        .is_ok());
    }
}
