//! Response header generation.
//!
//! Alert headers tell a client what happened to an entity, pagination
//! headers describe the page returned by a list or search.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri, header};
use plates_persistence::Page;
use tracing::warn;

/// Name of the total count header.
pub const TOTAL_COUNT: &str = "x-total-count";

/// Returns the `X-<app>-alert` header name.
pub fn alert_header(app: &str) -> String {
    format!("X-{}-alert", app)
}

/// Returns the `X-<app>-error` header name.
pub fn error_header(app: &str) -> String {
    format!("X-{}-error", app)
}

/// Returns the `X-<app>-params` header name.
pub fn params_header(app: &str) -> String {
    format!("X-{}-params", app)
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::try_from(name),
        HeaderValue::try_from(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => warn!(header = name, "Skipping invalid response header"),
    }
}

/// Builds entity alert headers.
///
/// `action` is one of `created`, `updated` or `deleted`; the alert value is
/// the message key `<app>.<entity>.<action>` and the params value is `param`,
/// usually the entity id.
pub fn alert_headers(app: &str, action: &str, entity: &str, param: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(
        &mut headers,
        &alert_header(app),
        &format!("{}.{}.{}", app, entity, action),
    );
    insert(&mut headers, &params_header(app), param);
    headers
}

/// Builds failure alert headers for an error key.
pub fn failure_headers(app: &str, error_key: &str, entity: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, &error_header(app), &format!("error.{}", error_key));
    insert(&mut headers, &params_header(app), entity);
    headers
}

/// Builds `X-Total-Count` and `Link` headers for a page.
///
/// Links reuse the request path and query with `page` and `size` replaced,
/// in the order `next`, `prev`, `last`, `first`. `next` and `prev` are
/// present only when such a page exists.
pub fn pagination_headers<T>(base_url: &str, uri: &Uri, page: &Page<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(TOTAL_COUNT),
        HeaderValue::from(page.total),
    );

    let last = page.total_pages().saturating_sub(1);
    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(link(base_url, uri, page.page + 1, page.size, "next"));
    }
    if page.has_previous() {
        links.push(link(base_url, uri, page.page - 1, page.size, "prev"));
    }
    links.push(link(base_url, uri, last, page.size, "last"));
    links.push(link(base_url, uri, 0, page.size, "first"));

    insert(&mut headers, header::LINK.as_str(), &links.join(","));
    headers
}

fn link(base_url: &str, uri: &Uri, page: u64, size: u64, rel: &str) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let existing = uri.query().unwrap_or_default();
    for (key, value) in url::form_urlencoded::parse(existing.as_bytes()) {
        if key != "page" && key != "size" {
            query.append_pair(&key, &value);
        }
    }
    query.append_pair("page", &page.to_string());
    query.append_pair("size", &size.to_string());

    format!(
        "<{}{}?{}>; rel=\"{}\"",
        base_url.trim_end_matches('/'),
        uri.path(),
        query.finish(),
        rel
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use plates_persistence::PageRequest;

    fn page(number: u64, size: u64, total: u64) -> Page<u64> {
        Page::new(Vec::new(), total, &PageRequest::new(number, size))
    }

    fn link_header(headers: &HeaderMap) -> &str {
        headers[header::LINK].to_str().unwrap()
    }

    #[test]
    fn test_alert_headers() {
        let headers = alert_headers("platesApp", "created", "plate", "7");
        assert_eq!(headers["x-platesapp-alert"], "platesApp.plate.created");
        assert_eq!(headers["x-platesapp-params"], "7");
    }

    #[test]
    fn test_failure_headers() {
        let headers = failure_headers("platesApp", "idexists", "plate");
        assert_eq!(headers["x-platesapp-error"], "error.idexists");
        assert_eq!(headers["x-platesapp-params"], "plate");
    }

    #[test]
    fn test_first_page_links() {
        let uri: Uri = "/api/plates?page=0&size=20".parse().unwrap();
        let headers = pagination_headers("http://localhost:8080", &uri, &page(0, 20, 25));

        assert_eq!(headers[TOTAL_COUNT], "25");
        assert_eq!(
            link_header(&headers),
            "<http://localhost:8080/api/plates?page=1&size=20>; rel=\"next\",\
             <http://localhost:8080/api/plates?page=1&size=20>; rel=\"last\",\
             <http://localhost:8080/api/plates?page=0&size=20>; rel=\"first\""
        );
    }

    #[test]
    fn test_middle_page_keeps_other_parameters() {
        let uri: Uri = "/api/_search/plates?query=willow&page=1&size=2&sort=id,desc"
            .parse()
            .unwrap();
        let headers = pagination_headers("http://h/", &uri, &page(1, 2, 6));
        let links = link_header(&headers);

        assert!(links.starts_with(
            "<http://h/api/_search/plates?query=willow&sort=id%2Cdesc&page=2&size=2>; rel=\"next\""
        ));
        assert!(links.contains("page=0&size=2>; rel=\"prev\""));
        assert!(links.contains("page=2&size=2>; rel=\"last\""));
    }

    #[test]
    fn test_empty_result_links() {
        let uri: Uri = "/api/notes".parse().unwrap();
        let headers = pagination_headers("http://h", &uri, &page(0, 20, 0));

        assert_eq!(headers[TOTAL_COUNT], "0");
        assert_eq!(
            link_header(&headers),
            "<http://h/api/notes?page=0&size=20>; rel=\"last\",\
             <http://h/api/notes?page=0&size=20>; rel=\"first\""
        );
    }
}
