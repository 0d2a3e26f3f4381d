use axum::{
    extract::Path,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use include_dir::{include_dir, Dir};

/// The dashboard page and its assets, embedded at compile time.
static DASHBOARD: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/dashboard");

/// `GET /dashboard`: the HTML shell. It fetches `/api/analytics` and
/// `/health` itself and aggregates in the browser.
pub async fn index() -> Response {
    match DASHBOARD
        .get_file("index.html")
        .and_then(|f| f.contents_utf8())
    {
        Some(html) => Html(html).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /dashboard/{file}`: static assets referenced by the page.
pub async fn asset(Path(file): Path<String>) -> Response {
    let Some(entry) = DASHBOARD.get_file(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type(&file)),
        )],
        entry.contents(),
    )
        .into_response()
}

fn content_type(file: &str) -> &'static str {
    match file.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_page_is_present() {
        assert!(DASHBOARD.get_file("index.html").is_some());
        assert!(DASHBOARD.get_file("app.js").is_some());
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type("app.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type("style.css"), "text/css; charset=utf-8");
        assert_eq!(content_type("blob"), "application/octet-stream");
    }
}
