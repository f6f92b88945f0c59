use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use shared::constants::ASSET_CACHE_NAME;
use tower::{Layer, ServiceExt};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, info, warn};

use crate::AppState;

/// Application shell, fetched once at install time. `/` is the index page.
pub const SHELL_FILES: &[&str] = &["/", "/index.html", "/app.css", "/manifest.json"];

pub const CACHE_HEADER: &str = "x-asset-cache";

fn get_mime_type(path: &str) -> HeaderValue {
    match path.rsplit('.').next().unwrap_or_default() {
        "js" => HeaderValue::from_static("application/javascript"),
        "html" => HeaderValue::from_static("text/html; charset=utf-8"),
        "css" => HeaderValue::from_static("text/css"),
        "png" => HeaderValue::from_static("image/png"),
        "jpg" | "jpeg" => HeaderValue::from_static("image/jpeg"),
        "svg" => HeaderValue::from_static("image/svg+xml"),
        "wasm" => HeaderValue::from_static("application/wasm"),
        "ico" => HeaderValue::from_static("image/x-icon"),
        "json" => HeaderValue::from_static("application/json"),
        "mp3" => HeaderValue::from_static("audio/mpeg"),
        "txt" => HeaderValue::from_static("text/plain"),
        _ => HeaderValue::from_static("application/octet-stream"),
    }
}

fn file_for(request_path: &str) -> &str {
    match request_path {
        "/" => "index.html",
        path => path.trim_start_matches('/'),
    }
}

#[derive(Clone)]
pub struct CachedAsset {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

/// Versioned in-memory copy of the application shell. Lookups hit memory
/// first and fall through to the static directory.
pub struct AssetCache {
    name: &'static str,
    static_dir: PathBuf,
    entries: HashMap<String, CachedAsset>,
}

impl AssetCache {
    pub async fn install(static_dir: &Path) -> Self {
        let mut entries = HashMap::new();

        for &path in SHELL_FILES {
            let file = static_dir.join(file_for(path));
            match tokio::fs::read(&file).await {
                Ok(data) => {
                    entries.insert(
                        path.to_string(),
                        CachedAsset {
                            content_type: get_mime_type(file_for(path)),
                            body: Bytes::from(data),
                        },
                    );
                }
                Err(e) => warn!("Asset {} not cached ({}): {}", path, file.display(), e),
            }
        }

        info!("📦 Asset cache {} installed with {} files", ASSET_CACHE_NAME, entries.len());
        Self {
            name: ASSET_CACHE_NAME,
            static_dir: static_dir.to_path_buf(),
            entries,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&CachedAsset> {
        self.entries.get(path)
    }

    fn cached_response(&self, asset: &CachedAsset) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, asset.content_type.clone()),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                (header::HeaderName::from_static(CACHE_HEADER), HeaderValue::from_static(self.name)),
            ],
            asset.body.clone(),
        )
            .into_response()
    }
}

/// Router fallback: cached shell files, then whatever the static directory has.
pub async fn serve_asset(State(state): State<AppState>, request: Request<Body>) -> Response {
    let cacheable = request.method() == Method::GET || request.method() == Method::HEAD;
    if cacheable {
        if let Some(asset) = state.assets.get(request.uri().path()) {
            debug!("Cache hit for {}", request.uri().path());
            return state.assets.cached_response(asset);
        }
    }

    let service = SetResponseHeaderLayer::if_not_present(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        .layer(ServeDir::new(state.assets.static_dir()));

    match service.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_install_reads_shell_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>wheel</html>").unwrap();
        std::fs::write(dir.path().join("app.css"), "body{}").unwrap();

        let cache = AssetCache::install(dir.path()).await;
        assert_eq!(cache.name(), "football-wheel-v1");
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("/").unwrap().body, Bytes::from_static(b"<html>wheel</html>"));
        assert_eq!(cache.get("/app.css").unwrap().content_type, "text/css");
        assert!(cache.get("/manifest.json").is_none());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(get_mime_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_mime_type("manifest.json"), "application/json");
        assert_eq!(get_mime_type("whistle.mp3"), "audio/mpeg");
        assert_eq!(get_mime_type("LICENSE"), "application/octet-stream");
    }
}
