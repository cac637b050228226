//! Header, cookie and query string parsing.
//!
//! # Responsibilities
//! - Decode query strings into key → ordered values
//! - Parse `Cookie` headers
//! - Parse and generate `Content-Type` values
//!
//! # Design Decisions
//! - Query parsing never fails; undecodable input is decoded lossily
//! - Cookie and content-type parsing fail explicitly and leave the
//!   fallback decision to the calling action

use http::HeaderValue;

use crate::context::{Charset, CharsetError, Cookies, QueryParams};

/// Parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed cookie pair \"{0}\"")]
    MalformedCookie(String),

    #[error("malformed content type \"{0}\"")]
    MalformedContentType(String),

    #[error(transparent)]
    Charset(#[from] CharsetError),
}

/// Decode an `application/x-www-form-urlencoded` query string.
pub fn parse_query(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}

/// Parse a `Cookie` header value: `name=value; name2="value2"`.
pub fn parse_cookie_header(header: &str) -> Result<Cookies, ParseError> {
    let mut cookies = Cookies::new();
    for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(ParseError::MalformedCookie(pair.to_string()));
        };
        let name = name.trim();
        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(ParseError::MalformedCookie(pair.to_string()));
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        cookies.insert(name.to_string(), value.to_string());
    }
    Ok(cookies)
}

/// A parsed `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased `type/subtype`.
    pub mime: String,
    /// Declared `charset` parameter, if any.
    pub charset: Option<String>,
}

impl ContentType {
    pub fn is_json(&self) -> bool {
        self.mime == "application/json" || self.mime.ends_with("+json")
    }

    pub fn is_text(&self) -> bool {
        self.mime.starts_with("text/") || self.mime == "application/x-www-form-urlencoded"
    }

    /// The declared charset, resolved; `None` when none was declared.
    pub fn resolve_charset(&self) -> Result<Option<Charset>, ParseError> {
        self.charset
            .as_deref()
            .map(|name| name.parse::<Charset>().map_err(ParseError::from))
            .transpose()
    }
}

pub fn parse_content_type(value: &str) -> Result<ContentType, ParseError> {
    let mut parts = value.split(';');
    let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

    let valid = mime
        .split_once('/')
        .is_some_and(|(t, s)| !t.is_empty() && !s.is_empty() && !s.contains('/'));
    if !valid {
        return Err(ParseError::MalformedContentType(value.to_string()));
    }

    let charset = parts
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string());

    Ok(ContentType { mime, charset })
}

/// `Content-Type` header for a textual body.
pub fn content_type_header(mime: &str, charset: Charset) -> HeaderValue {
    HeaderValue::from_str(&format!("{mime}; charset={charset}"))
        .unwrap_or_else(|_| HeaderValue::from_static("text/plain"))
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_keeps_repeated_keys_in_order() {
        let query = parse_query("tag=a&tag=b&name=J%C3%BCrgen&empty=");
        assert_eq!(query["tag"], vec!["a", "b"]);
        assert_eq!(query["name"], vec!["Jürgen"]);
        assert_eq!(query["empty"], vec![""]);
    }

    #[test]
    fn test_cookies() {
        let cookies = parse_cookie_header("session=abc123; theme=\"dark\"; ").unwrap();
        assert_eq!(cookies.get("session").map(String::as_str), Some("abc123"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));

        assert!(parse_cookie_header("novalue").is_err());
        assert!(parse_cookie_header("bad name=1").is_err());
    }

    #[test]
    fn test_content_type() {
        let ct = parse_content_type("Application/JSON; charset=\"utf-8\"").unwrap();
        assert!(ct.is_json());
        assert_eq!(ct.resolve_charset(), Ok(Some(Charset::Utf8)));

        let ct = parse_content_type("text/plain").unwrap();
        assert!(ct.is_text());
        assert_eq!(ct.resolve_charset(), Ok(None));

        assert!(parse_content_type("nonsense").is_err());
        assert!(parse_content_type("text/plain; charset=klingon")
            .unwrap()
            .resolve_charset()
            .is_err());
    }

    #[test]
    fn test_content_type_header() {
        assert_eq!(
            content_type_header("text/plain", Charset::Latin1),
            "text/plain; charset=ISO-8859-1"
        );
    }
}
