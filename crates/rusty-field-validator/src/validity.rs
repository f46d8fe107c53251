// File: src/validity.rs
// Purpose: Validity state reported by rules and delivered to the change callback

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::warn;

/// Outcome of validating a field
///
/// `Unknown` is the initial state and the result of a rule that returns
/// nothing. `Custom` carries application-defined outcomes such as an error
/// message or a password strength score.
///
/// Serializes as `null`, `true`, `false` or the custom JSON value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum Validity {
    #[default]
    Unknown,
    Valid,
    Invalid,
    Custom(JsonValue),
}

impl Validity {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Validity::Unknown)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Validity::Invalid)
    }

    /// Custom payload, if the rule returned one
    pub fn as_custom(&self) -> Option<&JsonValue> {
        match self {
            Validity::Custom(value) => Some(value),
            _ => None,
        }
    }

    /// Build a custom validity from anything serializable
    ///
    /// Values that serialize to `null` or a boolean collapse into the
    /// matching built-in state. A value that cannot be represented as JSON
    /// is logged and treated as `Unknown`; use [`try_custom`](Self::try_custom)
    /// to handle that case yourself.
    pub fn custom(value: impl Serialize) -> Self {
        Self::try_custom(value).unwrap_or_else(|err| {
            warn!(error = %err, "Custom validity is not representable as JSON");
            Validity::Unknown
        })
    }

    /// Like [`custom`](Self::custom), but surfaces serialization failures
    pub fn try_custom(value: impl Serialize) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Validity::from)
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Unknown => write!(f, "unknown"),
            Validity::Valid => write!(f, "valid"),
            Validity::Invalid => write!(f, "invalid"),
            Validity::Custom(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for Validity {
    fn from(valid: bool) -> Self {
        if valid {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

impl From<()> for Validity {
    fn from(_: ()) -> Self {
        Validity::Unknown
    }
}

impl<T: Into<Validity>> From<Option<T>> for Validity {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Validity::Unknown)
    }
}

impl From<JsonValue> for Validity {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Validity::Unknown,
            JsonValue::Bool(valid) => valid.into(),
            other => Validity::Custom(other),
        }
    }
}

impl From<Validity> for JsonValue {
    fn from(validity: Validity) -> Self {
        match validity {
            Validity::Unknown => JsonValue::Null,
            Validity::Valid => JsonValue::Bool(true),
            Validity::Invalid => JsonValue::Bool(false),
            Validity::Custom(value) => value,
        }
    }
}

impl From<String> for Validity {
    fn from(message: String) -> Self {
        Validity::Custom(JsonValue::String(message))
    }
}

impl From<&str> for Validity {
    fn from(message: &str) -> Self {
        Validity::Custom(JsonValue::String(message.to_string()))
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Validity {
                fn from(value: $ty) -> Self {
                    Validity::from(JsonValue::from(value))
                }
            }
        )*
    };
}

impl_from_number!(u8, u16, u32, u64, i8, i16, i32, i64, f64);
