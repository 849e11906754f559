//! Raw, unvalidated request pieces.

use std::collections::HashMap;

use serde_json::Value;

/// Everything a request supplied, before any coercion.
///
/// Header names are stored lowercased; header and query values keep their
/// arrival order so repeated names can be collected into lists.
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    path: HashMap<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Option<Value>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append every pair of a URL-encoded query string.
    pub fn extend_query_string(&mut self, query: &str) {
        self.query.extend(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }

    /// Append every `name=value` pair of a `Cookie` header value.
    pub fn extend_cookie_header(&mut self, header: &str) {
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"');
            self.cookies.push((name.to_string(), value.to_string()));
        }
    }

    pub fn extend_path(&mut self, params: impl IntoIterator<Item = (String, String)>) {
        self.path.extend(params);
    }

    pub fn push_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
    }

    pub fn set_body(&mut self, body: Option<Value>) {
        self.body = body;
    }

    pub fn path_value(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    /// All values for a query name, in order.
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All values for a header (case-insensitive), in arrival order.
    pub fn header_values(&self, wire_name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(wire_name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Cookie with this exact name; a later duplicate wins.
    pub fn cookie_value(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}
