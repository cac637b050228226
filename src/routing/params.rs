//! Path parameter kinds and coercion.
//!
//! Matching never looks at a parameter's kind: `{id:int}` matches `abc`.
//! Coercion happens later, in the input pipeline, where a failure turns
//! into a 400 rejection instead of a 404.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Raw path parameters extracted by a match, keyed by parameter name.
pub type PathParams = HashMap<String, String>;

/// Declared value kind of a `{name:kind}` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamKind {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Uuid,
}

impl ParamKind {
    /// Name used inside templates.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Str => "str",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
            ParamKind::Uuid => "uuid",
        }
    }

    /// Convert a raw segment into a value of this kind.
    pub fn coerce(&self, raw: &str) -> Result<ParamValue, ParamError> {
        let invalid = || ParamError::Invalid {
            value: raw.to_string(),
            kind: *self,
        };
        match self {
            ParamKind::Str => Ok(ParamValue::Str(raw.to_string())),
            ParamKind::Int => raw.parse().map(ParamValue::Int).map_err(|_| invalid()),
            ParamKind::Float => raw.parse().map(ParamValue::Float).map_err(|_| invalid()),
            ParamKind::Bool => raw.parse().map(ParamValue::Bool).map_err(|_| invalid()),
            ParamKind::Uuid => Uuid::parse_str(raw).map(ParamValue::Uuid).map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKind {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "str" | "string" => Ok(ParamKind::Str),
            "int" => Ok(ParamKind::Int),
            "float" => Ok(ParamKind::Float),
            "bool" => Ok(ParamKind::Bool),
            "uuid" => Ok(ParamKind::Uuid),
            other => Err(ParamError::UnknownKind(other.to_string())),
        }
    }
}

/// A coerced path parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Uuid(u) => write!(f, "{u}"),
        }
    }
}

/// Errors from parameter kinds and coercion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown parameter kind \"{0}\"")]
    UnknownKind(String),

    #[error("\"{value}\" is not a valid {kind}")]
    Invalid { value: String, kind: ParamKind },

    #[error("parameter value \"{value}\" has kind {kind}")]
    WrongKind { value: String, kind: ParamKind },
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Str(_) => ParamKind::Str,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Uuid(_) => ParamKind::Uuid,
        }
    }

    fn wrong_kind(&self) -> ParamError {
        ParamError::WrongKind {
            value: self.to_string(),
            kind: self.kind(),
        }
    }
}

impl TryFrom<&ParamValue> for String {
    type Error = ParamError;

    fn try_from(value: &ParamValue) -> Result<Self, Self::Error> {
        match value {
            ParamValue::Str(v) => Ok(v.clone()),
            other => Err(other.wrong_kind()),
        }
    }
}

macro_rules! impl_try_from_param {
    ($ty:ty, $variant:ident) => {
        impl TryFrom<&ParamValue> for $ty {
            type Error = ParamError;

            fn try_from(value: &ParamValue) -> Result<Self, Self::Error> {
                match *value {
                    ParamValue::$variant(v) => Ok(v),
                    ref other => Err(other.wrong_kind()),
                }
            }
        }
    };
}

impl_try_from_param!(i64, Int);
impl_try_from_param!(f64, Float);
impl_try_from_param!(bool, Bool);
impl_try_from_param!(Uuid, Uuid);
