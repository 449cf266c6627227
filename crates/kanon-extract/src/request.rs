//! The transport view of an incoming request.
//!
//! [`RequestData`] is what the binder reads: headers, the query string,
//! path parameters resolved by the host router, and the raw body.

use bytes::Bytes;
use http::{header, HeaderMap, Method, Uri};
use indexmap::IndexMap;
use kanon_core::{Cookie, Location};

use crate::accessor::{AccessError, FlatSource};

/// Everything the binder needs from one HTTP request.
///
/// # Example
///
/// ```rust
/// use kanon_extract::RequestData;
/// use http::Method;
///
/// let request = RequestData::builder()
///     .method(Method::POST)
///     .uri("/orgs/7/users?dry_run=true")
///     .header("content-type", "application/json")
///     .path_param("org_id", "7")
///     .body(r#"{"name": "Alice"}"#)
///     .build();
///
/// assert_eq!(request.query_string(), Some("dry_run=true"));
/// assert_eq!(request.path_param("org_id"), Some("7"));
/// assert_eq!(request.content_type(), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestData {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: IndexMap<String, String>,
}

impl RequestData {
    /// Creates request data from its parts.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: IndexMap<String, String>,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> RequestDataBuilder {
        RequestDataBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a path parameter resolved by the router.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Returns every path parameter.
    #[must_use]
    pub fn path_params(&self) -> &IndexMap<String, String> {
        &self.path_params
    }

    /// Parses every cookie of every `Cookie` header, in header order.
    pub fn cookies(&self) -> impl Iterator<Item = Cookie> + '_ {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::parse_header)
    }

    /// Builds the string source for a transport location.
    ///
    /// Header names match case-insensitively. A malformed query string is
    /// an error; unreadable (non-ASCII) header values are skipped.
    pub fn transport_source(&self, location: Location) -> Result<FlatSource, AccessError> {
        Ok(match location {
            Location::Header => {
                let mut source = FlatSource::case_insensitive();
                for (name, value) in &self.headers {
                    if let Ok(value) = value.to_str() {
                        source.push(name.as_str(), value);
                    }
                }
                source
            }
            Location::Cookie => {
                FlatSource::from_pairs(self.cookies().map(|c| (c.name().to_string(), c.value().to_string())))
            }
            Location::Query => {
                let pairs: Vec<(String, String)> =
                    serde_urlencoded::from_str(self.query_string().unwrap_or(""))
                        .map_err(|e| AccessError(format!("malformed query string: {e}")))?;
                FlatSource::from_pairs(pairs)
            }
            Location::Path => FlatSource::from_pairs(
                self.path_params
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            ),
            Location::Body => FlatSource::new(),
        })
    }
}

/// Builder for [`RequestData`].
#[derive(Debug, Default)]
pub struct RequestDataBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: IndexMap<String, String>,
}

impl RequestDataBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method. Defaults to `GET`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI. Unparseable URIs are ignored and the URI stays `/`.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.parse().ok();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Builds the request data.
    #[must_use]
    pub fn build(self) -> RequestData {
        RequestData {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Accessor, PathSegment, Probe, Scalar};
    use std::borrow::Cow;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_builder_defaults() {
        let request = RequestData::builder().build();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.uri().path(), "/");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_cookie_parsing() {
        let request = RequestData::builder()
            .header("cookie", "session=abc; theme=dark")
            .header("cookie", "lang=en")
            .build();
        let names: Vec<_> = request.cookies().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["session", "theme", "lang"]);
    }

    #[test]
    fn test_query_source_decodes_values() {
        let request = RequestData::builder().uri("/search?q=rust+lang&tag=a&tag=b").build();
        let source = request.transport_source(Location::Query).unwrap();
        assert_eq!(
            source.probe(&[key("q")]).unwrap(),
            Probe::Scalar(Scalar::Text(Cow::Borrowed("rust lang")))
        );
        assert_eq!(
            source.probe(&[key("tag"), PathSegment::Index(1)]).unwrap(),
            Probe::Scalar(Scalar::Text(Cow::Borrowed("b")))
        );
    }

    #[test]
    fn test_header_source_is_case_insensitive() {
        let request = RequestData::builder().header("x-request-id", "42").build();
        let source = request.transport_source(Location::Header).unwrap();
        assert!(source.exists(&[key("X-Request-ID")]).unwrap());
    }

    #[test]
    fn test_path_source() {
        let request = RequestData::builder().path_param("org_id", "7").build();
        let source = request.transport_source(Location::Path).unwrap();
        assert!(source.exists(&[key("org_id")]).unwrap());
    }
}
