use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("cannot encode {type_name} value for attribute {attribute:?}")]
    Codec {
        attribute: Option<String>,
        type_name: &'static str,
    },

    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(String),

    #[error("unknown representation tag: {0:?}")]
    UnknownRepresentationTag(String),

    #[error("malformed {tag} value: {value:?}")]
    MalformedValue { tag: &'static str, value: String },

    #[error("attribute {attribute:?} defined twice for edge {key}")]
    KeyCollision { key: String, attribute: String },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl CoreError {
    /// Attach the attribute name to a codec failure raised without one.
    pub fn for_attribute(self, name: &str) -> Self {
        match self {
            CoreError::Codec {
                attribute: None,
                type_name,
            } => CoreError::Codec {
                attribute: Some(name.to_string()),
                type_name,
            },
            other => other,
        }
    }
}
