//! Standard output-phase actions.
//!
//! # Data Flow
//! ```text
//! ResponseContext (from handler)
//!     → DefaultHeaders (configured headers, never overriding)
//!     → FormatBody     (JSON value → UTF-8 bytes; content types)
//!     → EncodeBody     (text → bytes in the configured charset)
//! ```

use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;

use crate::context::{Body, Charset, ResponseContext};
use crate::http::parse::content_type_header;
use crate::http::settings::DispatchSettings;
use crate::pipeline::action::{Action, ActionResult, Flow, Phase};
use crate::pipeline::chain::{Pipeline, PipelineBuilder};
use crate::pipeline::PipelineError;

/// Add configured headers the handler did not set itself.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

impl Action<ResponseContext, ResponseContext> for DefaultHeaders {
    fn name(&self) -> &str {
        "default-headers"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Output)
    }

    fn execute(&self, mut response: ResponseContext) -> ActionResult<ResponseContext, ResponseContext> {
        for (name, value) in &self.headers {
            if !response.headers().contains_key(name) {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
        Ok(Flow::Continue(response))
    }
}

/// Serialize structured bodies and fill in a content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatBody {
    charset: Charset,
}

impl FormatBody {
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }
}

impl Action<ResponseContext, ResponseContext> for FormatBody {
    fn name(&self) -> &str {
        "format-body"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Output)
    }

    fn execute(&self, mut response: ResponseContext) -> ActionResult<ResponseContext, ResponseContext> {
        let content_type = match response.take_body() {
            Body::Json(value) => {
                response.set_body(serde_json::to_vec(&value)?);
                Some(HeaderValue::from_static("application/json"))
            }
            Body::Text(text) => {
                response.set_body(text);
                Some(content_type_header("text/plain", self.charset))
            }
            Body::Bytes(bytes) => {
                response.set_body(bytes);
                Some(HeaderValue::from_static("application/octet-stream"))
            }
            Body::Empty => None,
        };

        if let Some(value) = content_type {
            if !response.headers().contains_key(CONTENT_TYPE) {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
        }
        Ok(Flow::Continue(response))
    }
}

/// Encode text bodies and set `Content-Length` from the encoded size.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeBody {
    charset: Charset,
}

impl EncodeBody {
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }
}

impl Action<ResponseContext, ResponseContext> for EncodeBody {
    fn name(&self) -> &str {
        "encode-body"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Output)
    }

    fn execute(&self, mut response: ResponseContext) -> ActionResult<ResponseContext, ResponseContext> {
        let length = match response.take_body() {
            Body::Text(text) => {
                let bytes = self.charset.encode(&text);
                let length = bytes.len();
                response.set_body(bytes);
                length
            }
            Body::Bytes(bytes) => {
                let length = bytes.len();
                response.set_body(bytes);
                length
            }
            Body::Empty => 0,
            json @ Body::Json(_) => {
                response.set_body(json);
                return Ok(Flow::Continue(response));
            }
        };

        response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(length));
        Ok(Flow::Continue(response))
    }
}

/// The default output pipeline for `settings`.
pub fn output_pipeline(
    settings: &DispatchSettings,
) -> Result<Pipeline<ResponseContext, ResponseContext>, PipelineError> {
    PipelineBuilder::<ResponseContext>::new(Phase::Output)
        .then(DefaultHeaders::new(settings.default_headers.clone()))
        .then(FormatBody::new(settings.charset))
        .then(EncodeBody::new(settings.charset))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::chain::Processed;
    use http::header::SERVER;
    use http::StatusCode;

    fn run(settings: &DispatchSettings, response: ResponseContext) -> ResponseContext {
        match output_pipeline(settings).unwrap().process(response).unwrap() {
            Processed::Completed(response) => response,
            Processed::Rejected(r) => panic!("unexpected rejection: {r:?}"),
        }
    }

    #[test]
    fn test_json_is_serialized() {
        let response = run(
            &DispatchSettings::default(),
            ResponseContext::json(serde_json::json!({"id": 7})),
        );
        assert_eq!(response.body(), &Body::Bytes(br#"{"id":7}"#.to_vec()));
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[CONTENT_LENGTH], "8");
    }

    #[test]
    fn test_text_is_encoded_with_charset() {
        let settings = DispatchSettings::default().charset(Charset::Latin1);
        let response = run(&settings, ResponseContext::ok("café"));
        assert_eq!(response.body(), &Body::Bytes(vec![b'c', b'a', b'f', 0xE9]));
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=ISO-8859-1");
        assert_eq!(response.headers()[CONTENT_LENGTH], "4");
    }

    #[test]
    fn test_handler_headers_win_over_defaults() {
        let settings = DispatchSettings::default()
            .default_header(SERVER, HeaderValue::from_static("dispatch"))
            .default_header(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        let response = run(
            &settings,
            ResponseContext::new(StatusCode::CREATED)
                .with_header(SERVER, HeaderValue::from_static("custom"))
                .with_body("<p>hi</p>"),
        );
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[SERVER], "custom");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn test_empty_body() {
        let response = run(&DispatchSettings::default(), ResponseContext::new(StatusCode::NO_CONTENT));
        assert_eq!(response.body(), &Body::Empty);
        assert!(!response.headers().contains_key(CONTENT_TYPE));
        assert_eq!(response.headers()[CONTENT_LENGTH], "0");
    }
}
