//! Scalar type codec.
//!
//! Scalars are persisted as a string plus a type tag drawn from a closed set.
//! [`encode`] derives the tag from the value's variant, [`decode`] dispatches
//! on the stored tag and rejects anything outside the set.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A scalar attribute value as produced by a simulation run.
///
/// `Null` is an engine-reported absent value. It has no type tag, so it can
/// be held in a mapping but never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl ScalarValue {
    /// Name of the runtime type, matching the tag text for encodable variants.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Null => "null",
        }
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Self::Str(_) => Some(TypeTag::Str),
            Self::Float(_) => Some(TypeTag::Float),
            Self::Int(_) => Some(TypeTag::Int),
            Self::Bool(_) => Some(TypeTag::Bool),
            Self::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ScalarValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Closed set of persisted scalar type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Str,
    Float,
    Int,
    Bool,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "str" => Ok(Self::Str),
            "float" => Ok(Self::Float),
            "int" => Ok(Self::Int),
            "bool" => Ok(Self::Bool),
            _ => Err(CoreError::UnknownTypeTag(s.to_string())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `bool`-tagged strings are turned back into booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolDecoding {
    /// Literal `True`/`False` (and `true`/`false`/`1`/`0`, empty is false).
    #[default]
    Strict,
    /// Any non-empty string is true, including `"False"`. Matches rows
    /// written by older deployments that relied on string truthiness.
    Truthy,
}

/// Encode a scalar into its stored string form and type tag.
pub fn encode(value: &ScalarValue) -> Result<(String, TypeTag), CoreError> {
    let encoded = match value {
        ScalarValue::Str(s) => (s.clone(), TypeTag::Str),
        ScalarValue::Float(n) => (format!("{n:?}"), TypeTag::Float),
        ScalarValue::Int(n) => (n.to_string(), TypeTag::Int),
        ScalarValue::Bool(b) => ((if *b { "True" } else { "False" }).to_string(), TypeTag::Bool),
        ScalarValue::Null => {
            return Err(CoreError::Codec {
                attribute: None,
                type_name: value.type_name(),
            });
        }
    };
    Ok(encoded)
}

/// Decode a stored string under its textual type tag.
pub fn decode(value: &str, tag: &str, bools: BoolDecoding) -> Result<ScalarValue, CoreError> {
    decode_tagged(value, TypeTag::parse(tag)?, bools)
}

pub fn decode_tagged(
    value: &str,
    tag: TypeTag,
    bools: BoolDecoding,
) -> Result<ScalarValue, CoreError> {
    let malformed = || CoreError::MalformedValue {
        tag: tag.as_str(),
        value: value.to_string(),
    };
    match tag {
        TypeTag::Str => Ok(ScalarValue::Str(value.to_string())),
        TypeTag::Float => value
            .trim()
            .parse::<f64>()
            .map(ScalarValue::Float)
            .map_err(|_| malformed()),
        TypeTag::Int => value
            .trim()
            .parse::<i64>()
            .map(ScalarValue::Int)
            .map_err(|_| malformed()),
        TypeTag::Bool => match bools {
            BoolDecoding::Truthy => Ok(ScalarValue::Bool(!value.is_empty())),
            BoolDecoding::Strict => match value {
                "True" | "true" | "1" => Ok(ScalarValue::Bool(true)),
                "False" | "false" | "0" | "" => Ok(ScalarValue::Bool(false)),
                _ => Err(malformed()),
            },
        },
    }
}
