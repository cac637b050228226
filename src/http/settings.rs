//! Process-wide dispatch settings, passed explicitly to every session.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::config::schema::DispatchConfig;
use crate::config::validation::ValidationError;
use crate::context::Charset;

/// Settings every session and default action reads.
#[derive(Debug, Clone, Default)]
pub struct DispatchSettings {
    /// Include fault detail in 500 bodies.
    pub debug: bool,
    /// Encoding for textual bodies.
    pub charset: Charset,
    /// Headers added to every handled response unless already set.
    pub default_headers: HeaderMap,
}

impl DispatchSettings {
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Resolve the `[dispatch]` config section.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, ValidationError> {
        let charset = config
            .charset
            .parse::<Charset>()
            .map_err(|e| ValidationError::new("dispatch.charset", e.to_string()))?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let field = format!("dispatch.default_headers.{name}");
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ValidationError::new(&field, e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| ValidationError::new(&field, e.to_string()))?;
            default_headers.insert(name, value);
        }

        Ok(Self {
            debug: config.debug,
            charset,
            default_headers,
        })
    }
}
