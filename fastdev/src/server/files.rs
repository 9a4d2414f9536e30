//! Static file and directory responses.

use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, trace};

use super::error::ServeError;

/// MIME types that differ from (or are missing in) the platform table.
///
/// Source kinds that are compiled on request share the MIME type of their
/// compiled output.
const MIME_OVERRIDES: &[(&str, &str)] = &[
    ("ts", "text/javascript"),
    ("tsx", "text/javascript"),
    ("jsx", "text/javascript"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("scss", "text/css"),
    ("sass", "text/css"),
    ("css", "text/css"),
    ("html", "text/html"),
    ("txt", "text/plain"),
    ("svg", "image/svg+xml"),
    ("wasm", "application/wasm"),
    ("json", "application/json"),
    ("xml", "application/xml"),
];

/// MIME type to serve `path` with.
pub fn content_type(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    MIME_OVERRIDES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| mime.to_string())
        .unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

/// Turn a URL path into a location under `root`.
///
/// Returns `None` for paths that try to leave `root` (`..`, absolute or
/// prefixed components).
pub fn resolve_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;
    let relative = decoded.trim_start_matches('/');

    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

/// Serve the file at `path`.
pub async fn serve_file(path: &Path) -> Result<Response, ServeError> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ServeError::NotFound(path.to_path_buf()));
    }

    let contents = tokio::fs::read(path)
        .await
        .map_err(|_| ServeError::NotFound(path.to_path_buf()))?;
    let mime = content_type(path);
    trace!(path = %path.display(), mime = %mime, bytes = contents.len(), "Serving file");

    let mut response = Response::new(Body::from(contents));
    if let Ok(value) = HeaderValue::from_str(&mime) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}

/// Serve the directory at `dir`.
///
/// Serves `index.html` when present, otherwise an HTML listing whose links
/// are absolute URL paths relative to `root`.
pub async fn serve_dir(root: &Path, dir: &Path) -> Result<Response, ServeError> {
    let is_dir = tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ServeError::NotFound(dir.to_path_buf()));
    }

    let index = dir.join("index.html");
    if tokio::fs::metadata(&index)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        return serve_file(&index).await;
    }

    let entries = list_entries(dir)
        .await
        .map_err(|_| ServeError::NotFound(dir.to_path_buf()))?;
    let url_base = url_base(root, dir);
    debug!(dir = %dir.display(), entries = entries.len(), "Generating directory listing");

    Ok((StatusCode::OK, Html(render_listing(&url_base, &entries))).into_response())
}

/// One directory entry in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingEntry {
    name: String,
    is_dir: bool,
}

async fn list_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// URL path of `dir`, always ending in `/`.
fn url_base(root: &Path, dir: &Path) -> String {
    let mut base = String::from("/");
    if let Ok(relative) = dir.strip_prefix(root) {
        for part in relative.components() {
            if let Component::Normal(part) = part {
                base.push_str(&urlencoding::encode(&part.to_string_lossy()));
                base.push('/');
            }
        }
    }
    base
}

fn render_listing(url_base: &str, entries: &[ListingEntry]) -> String {
    let heading = escape_html(&urlencoding::decode(url_base).unwrap_or_default());
    let items: String = entries
        .iter()
        .map(|entry| {
            let suffix = if entry.is_dir { "/" } else { "" };
            format!(
                "\t\t\t<li><a href=\"{}{}{}\">{}{}</a></li>\n",
                url_base,
                urlencoding::encode(&entry.name),
                suffix,
                escape_html(&entry.name),
                suffix,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
	<head>
		<meta charset="utf-8">
		<title>devserver directory: {heading}</title>
	</head>
	<body>
		<h1>Directory listing for: {heading}</h1>
		<hr>
		<ul>
{items}		</ul>
		<hr>
	</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tempfile::TempDir;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_content_type_sources_match_outputs() {
        assert_eq!(content_type(Path::new("app.ts")), "text/javascript");
        assert_eq!(content_type(Path::new("App.TSX")), "text/javascript");
        assert_eq!(content_type(Path::new("theme.scss")), "text/css");
        assert_eq!(content_type(Path::new("module.wasm")), "application/wasm");
    }

    #[test]
    fn test_content_type_fallbacks() {
        assert_eq!(content_type(Path::new("photo.png")), "image/png");
        assert_eq!(content_type(Path::new("Makefile")), "application/octet-stream");
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/srv/site");

        assert_eq!(
            resolve_path(root, "/src/app.ts"),
            Some(PathBuf::from("/srv/site/src/app.ts"))
        );
        assert_eq!(resolve_path(root, "/"), Some(PathBuf::from("/srv/site")));
        assert_eq!(
            resolve_path(root, "/my%20file.txt"),
            Some(PathBuf::from("/srv/site/my file.txt"))
        );
        assert_eq!(resolve_path(root, "/../etc/passwd"), None);
        assert_eq!(resolve_path(root, "/a/%2E%2E/%2E%2E/secret"), None);
    }

    #[tokio::test]
    async fn test_serve_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "console.log(1)").unwrap();

        let response = serve_file(&path).await.unwrap();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/javascript");
        assert_eq!(body_string(response).await, "console.log(1)");
    }

    #[tokio::test]
    async fn test_serve_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = serve_file(&dir.path().join("nope.js")).await;
        assert!(matches!(result, Err(ServeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_serve_dir_prefers_index() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();

        let response = serve_dir(dir.path(), dir.path()).await.unwrap();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(body_string(response).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_serve_dir_listing() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("assets");
        std::fs::create_dir_all(sub.join("img")).unwrap();
        std::fs::write(sub.join("a b.css"), "").unwrap();

        let response = serve_dir(dir.path(), &sub).await.unwrap();
        let html = body_string(response).await;

        assert!(html.contains("Directory listing for: /assets/"));
        assert!(html.contains(r#"<a href="/assets/a%20b.css">a b.css</a>"#));
        assert!(html.contains(r#"<a href="/assets/img/">img/</a>"#));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }
}
