//! Static asset serving for the bundled viewer.

use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use std::path::{Component, Path, PathBuf};

use crate::error::FileAccessError;

/// Serve one asset by request path (no leading slash). Directory requests
/// resolve to `index.<ext-of-request-or-html>`; a missing file renders the
/// 404 error page, an unreadable one the 500 page.
pub async fn serve_file(assets: &Path, request_path: &str) -> Response {
    let Some(rel) = sanitize(request_path) else {
        return error_page(StatusCode::NOT_FOUND, &format!("No such file: /{request_path}"));
    };

    let mut target = assets.join(&rel);
    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => {
            // A directory request falls through to its index file, keeping
            // the extension of the request if it carries one.
            let ext = rel
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "html".to_string());
            target = target.join(format!("index.{ext}"));
        }
        Ok(_) => {}
        Err(e) => {
            let err = FileAccessError::new(target, e);
            return error_page(StatusCode::NOT_FOUND, &err.to_string());
        }
    }

    match tokio::fs::read(&target).await {
        Ok(content) => (
            [(header::CONTENT_TYPE, content_type(&target))],
            content,
        )
            .into_response(),
        Err(e) => {
            let err = FileAccessError::new(target, e);
            log::warn!("{err}");
            error_page(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

/// Reject absolute paths and parent traversal.
fn sanitize(request_path: &str) -> Option<PathBuf> {
    let rel = Path::new(request_path);
    if rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Some(rel.to_path_buf())
    } else {
        None
    }
}

/// MIME type by file extension.
pub fn content_type(file: &Path) -> &'static str {
    let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "ico" => "image/x-icon",
        "html" => "text/html",
        "js" => "text/javascript",
        "json" => "application/json",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" => "image/jpeg",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        _ => "text/plain",
    }
}

/// Render the HTML error page with an escaped message.
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>canopy</title></head>\n\
         <body><div>{}</div></body>\n</html>\n",
        html_escape(message)
    );
    (status, Html(body)).into_response()
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_table() {
        assert_eq!(content_type(Path::new("a/index.html")), "text/html");
        assert_eq!(content_type(Path::new("viewer.js")), "text/javascript");
        assert_eq!(content_type(Path::new("style.css")), "text/css");
        assert_eq!(content_type(Path::new("tree.json")), "application/json");
        assert_eq!(content_type(Path::new("noext")), "text/plain");
        assert_eq!(content_type(Path::new("odd.xyz")), "text/plain");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">it's &here"#),
            "&lt;a href=&quot;x&quot;&gt;it&#39;s &amp;here"
        );
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize("../secret").is_none());
        assert!(sanitize("a/../../b").is_none());
        assert!(sanitize("/etc/passwd").is_none());
        assert!(sanitize("ok/nested.js").is_some());
    }

    #[tokio::test]
    async fn test_serves_existing_file_with_mime() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("style.css"), "body {}").unwrap();

        let response = serve_file(tmp.path(), "style.css").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "text/css"
        );
    }

    #[tokio::test]
    async fn test_directory_resolves_to_index_html() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();

        let response = serve_file(tmp.path(), "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "text/html"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_404_error_page() {
        let tmp = TempDir::new().unwrap();
        let response = serve_file(tmp.path(), "nope.js").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "text/html; charset=utf-8"
        );
    }
}
