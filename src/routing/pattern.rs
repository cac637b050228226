//! Route pattern compilation.
//!
//! # Responsibilities
//! - Normalize path templates and request paths the same way
//! - Compile `{name}` / `{name:kind}` segments into parameter descriptors
//! - Define structural equality between patterns
//!
//! # Design Decisions
//! - Equality ignores parameter names and kinds: `/u/{id}` == `/u/{name}`
//! - Braces must wrap a whole segment; `a{b}` is rejected, not treated as literal
//! - Patterns are immutable once compiled

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::routing::params::{ParamError, ParamKind, PathParams};

/// Split a path into its non-empty segments.
///
/// Leading, trailing and repeated `/` are ignored, so `"/a//b/"` yields
/// `["a", "b"]`.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form of a path: one leading `/`, no trailing or repeated `/`.
pub fn normalize_path(path: &str) -> String {
    let segments = split_segments(path);
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

/// One compiled segment of a route pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matches only an identical input segment.
    Literal(String),
    /// Matches any non-empty input segment and binds it to `name`.
    Param { name: String, kind: ParamKind },
}

impl Segment {
    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param { .. })
    }

    fn literal(&self) -> Option<&str> {
        match self {
            Segment::Literal(value) => Some(value),
            Segment::Param { .. } => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(value) => f.write_str(value),
            Segment::Param { name, kind: ParamKind::Str } => write!(f, "{{{name}}}"),
            Segment::Param { name, kind } => write!(f, "{{{name}:{kind}}}"),
        }
    }
}

/// Errors raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("parameter \"{0}\" appears more than once")]
    DuplicateParameter(String),

    #[error("segment \"{0}\" has an empty parameter name")]
    EmptyParameterName(String),

    #[error("segment \"{0}\" must either be a literal or a whole {{parameter}}")]
    MalformedSegment(String),

    #[error("segment \"{segment}\": {source}")]
    Kind {
        segment: String,
        #[source]
        source: ParamError,
    },
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a template such as `/users/{id:int}/posts/{postId}`.
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let mut names = HashSet::new();
        let mut segments = Vec::new();

        for raw in split_segments(template) {
            let segment = parse_segment(raw)?;
            if let Segment::Param { name, .. } = &segment {
                if !names.insert(name.clone()) {
                    return Err(PatternError::DuplicateParameter(name.clone()));
                }
            }
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments; `/` has zero.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Declared kind of a parameter.
    pub fn param_kind(&self, name: &str) -> Option<ParamKind> {
        self.segments.iter().find_map(|s| match s {
            Segment::Param { name: n, kind } if n == name => Some(*kind),
            _ => None,
        })
    }

    /// Ordering key used by the method router: literals sort before
    /// parameters at the first position where two patterns differ.
    pub(crate) fn specificity(&self) -> Vec<bool> {
        self.segments.iter().map(Segment::is_param).collect()
    }

    /// Match already-split path segments, extracting parameters.
    pub fn matches(&self, path: &[&str]) -> Option<PathParams> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, input) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(value) => {
                    if value != input {
                        return None;
                    }
                }
                Segment::Param { name, .. } => {
                    if input.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), (*input).to_string());
                }
            }
        }
        Some(params)
    }

    fn shape(&self) -> impl Iterator<Item = Option<&str>> {
        self.segments.iter().map(Segment::literal)
    }
}

fn parse_segment(raw: &str) -> Result<Segment, PatternError> {
    let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
        if raw.contains(['{', '}']) {
            return Err(PatternError::MalformedSegment(raw.to_string()));
        }
        return Ok(Segment::Literal(raw.to_string()));
    };

    if inner.contains(['{', '}']) {
        return Err(PatternError::MalformedSegment(raw.to_string()));
    }

    let (name, kind) = match inner.split_once(':') {
        Some((name, kind)) => {
            let kind = kind.parse::<ParamKind>().map_err(|source| PatternError::Kind {
                segment: raw.to_string(),
                source,
            })?;
            (name, kind)
        }
        None => (inner, ParamKind::Str),
    };

    if name.is_empty() {
        return Err(PatternError::EmptyParameterName(raw.to_string()));
    }

    Ok(Segment::Param {
        name: name.to_string(),
        kind,
    })
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.shape().eq(other.shape())
    }
}

impl Eq for RoutePattern {}

impl Hash for RoutePattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for literal in self.shape() {
            literal.hash(state);
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(template: &str) -> RoutePattern {
        RoutePattern::parse(template).unwrap()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/"), "/a/b");
        assert_eq!(normalize_path("a/b"), "/a/b");
        assert_eq!(normalize_path("/a//b"), "/a/b");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_equivalent_templates_compile_alike() {
        let a = pattern("/a/b/");
        let b = pattern("a/b");
        let c = pattern("/a//b");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.to_string(), "/a/b");
    }

    #[test]
    fn test_equality_ignores_parameter_names() {
        assert_eq!(pattern("/users/{id}"), pattern("/users/{name:int}"));
        assert_ne!(pattern("/users/{id}"), pattern("/users/me"));
        assert_ne!(pattern("/users/{id}"), pattern("/posts/{id}"));
        assert_ne!(pattern("/users/{id}"), pattern("/users/{id}/x"));
    }

    #[test]
    fn test_duplicate_parameter_name() {
        assert_eq!(
            RoutePattern::parse("/a/{id}/b/{id}").unwrap_err(),
            PatternError::DuplicateParameter("id".into())
        );
    }

    #[test]
    fn test_malformed_segments() {
        assert!(matches!(
            RoutePattern::parse("/a{b}"),
            Err(PatternError::MalformedSegment(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/{id"),
            Err(PatternError::MalformedSegment(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/{}"),
            Err(PatternError::EmptyParameterName(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/{id:regex}"),
            Err(PatternError::Kind { .. })
        ));
    }

    #[test]
    fn test_matches_extracts_parameters() {
        let p = pattern("/users/{id}/posts/{postId}");
        let params = p.matches(&split_segments("/users/42/posts/7")).unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("postId").map(String::as_str), Some("7"));

        assert!(p.matches(&split_segments("/users/42")).is_none());
        assert!(p.matches(&split_segments("/users/42/comments/7")).is_none());
    }

    #[test]
    fn test_display_keeps_kinds() {
        assert_eq!(pattern("/u/{id:int}/{name}").to_string(), "/u/{id:int}/{name}");
        assert_eq!(pattern("/").to_string(), "/");
    }
}
