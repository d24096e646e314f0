//! # Error Types
//!
//! Errors are split by when they can happen:
//!
//! - [`RegistrationError`] - structural misuse of the declarative contract,
//!   raised once while a record type is registered. These are programmer
//!   errors and are meant to stop start-up.
//! - [`BindError`] - a per-request failure (missing value, unparsable value,
//!   constraint violation). Always returned as data and mapped to a 400-class
//!   response by the caller.
//!
//! [`ConvertError`] and [`ValidationError`] are the typed causes carried inside
//! a [`BindError`].

use crate::schema::Position;
use std::fmt;
use std::sync::Arc;

/// Registration-time failure for a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationError {
    /// Name of the record type being registered
    pub type_name: String,
    /// Rust field name that broke the contract (`*` for the whole type)
    pub field: String,
    /// Human readable reason
    pub reason: String,
}

impl RegistrationError {
    pub fn new(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[parambind] {} | {} | {}",
            self.type_name, self.field, self.reason
        )
    }
}

impl std::error::Error for RegistrationError {}

/// A raw wire value could not be turned into the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The value is present but does not parse as the target type
    Invalid {
        target: &'static str,
        value: String,
        reason: String,
    },
    /// The target type cannot be produced from this kind of source
    Unsupported {
        target: &'static str,
        source: &'static str,
    },
    /// A bracket index exceeded the configured maximum
    IndexTooLarge { key: String, index: usize, max: usize },
    /// The structured body could not be decoded into the target type
    Body { target: &'static str, reason: String },
}

impl ConvertError {
    pub fn invalid(target: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        ConvertError::Invalid {
            target,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(target: &'static str, source: &'static str) -> Self {
        ConvertError::Unsupported { target, source }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Invalid {
                target,
                value,
                reason,
            } => write!(f, "converting {:?} to {}: {}", value, target, reason),
            ConvertError::Unsupported { target, source } => {
                write!(f, "unsupported storing {} into type {}", source, target)
            }
            ConvertError::IndexTooLarge { key, index, max } => write!(
                f,
                "index {} of {:?} exceeds the maximum array index {}",
                index, key, max
            ),
            ConvertError::Body { target, reason } => {
                write!(f, "decoding body into {}: {}", target, reason)
            }
        }
    }
}

impl std::error::Error for ConvertError {}

/// Which declarative constraint was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// `nonzero`: the value equals its type's zero value
    NotSet,
    /// `range`: below the lower bound
    TooSmall,
    /// `range`: above the upper bound
    TooBig,
    /// `len`: shorter than the lower bound
    TooShort,
    /// `len`: longer than the upper bound
    TooLong,
    /// `regexp`: the pattern does not match the whole value
    NotMatching,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::NotSet => "not set",
            ViolationKind::TooSmall => "too small",
            ViolationKind::TooBig => "too big",
            ViolationKind::TooShort => "too short",
            ViolationKind::TooLong => "too long",
            ViolationKind::NotMatching => "not matching",
        };
        f.write_str(s)
    }
}

/// A converted value violated one of the field's constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Wire name of the field that failed
    pub field: String,
    pub kind: ViolationKind,
    /// Details such as the bound and the offending value
    pub detail: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.detail)
    }
}

impl std::error::Error for ValidationError {}

/// Cause of a [`BindError`].
#[derive(Debug, Clone, PartialEq)]
pub enum BindErrorKind {
    /// The record type was never registered with the registry in use
    NotRegistered,
    /// A required value is absent from its declared source
    Missing(Position),
    /// A present value could not be converted
    Conversion(ConvertError),
    /// A converted value violated a constraint
    Validation(ValidationError),
    /// The request itself could not be read (body too large, decoder failure)
    Request(String),
}

/// Per-request binding failure.
///
/// When the failing field declares a custom error text (`#[err("...")]` or
/// `<err:...>`), [`Display`](fmt::Display) renders that text instead of the
/// generated reason. [`BindError::param`] always names the failing field.
#[derive(Debug, Clone, PartialEq)]
pub struct BindError {
    api: String,
    param: String,
    kind: BindErrorKind,
    custom: Option<Arc<str>>,
}

impl BindError {
    pub fn new(api: impl Into<String>, param: impl Into<String>, kind: BindErrorKind) -> Self {
        Self {
            api: api.into(),
            param: param.into(),
            kind,
            custom: None,
        }
    }

    pub fn not_registered(type_name: &str) -> Self {
        Self::new(type_name, "*", BindErrorKind::NotRegistered)
    }

    /// Attach a custom message that replaces the generated reason.
    #[must_use]
    pub fn with_custom(mut self, custom: Option<Arc<str>>) -> Self {
        self.custom = custom;
        self
    }

    /// Name of the record type being bound
    pub fn api(&self) -> &str {
        &self.api
    }

    /// Wire name of the failing parameter
    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    /// The custom message declared on the field, if any
    pub fn custom_message(&self) -> Option<&str> {
        self.custom.as_deref()
    }

    /// Violation kind when this is a validation failure
    pub fn violation(&self) -> Option<ViolationKind> {
        match &self.kind {
            BindErrorKind::Validation(v) => Some(v.kind),
            _ => None,
        }
    }

    /// HTTP status the dispatch layer should answer with.
    pub fn status_code(&self) -> u16 {
        400
    }

    fn reason(&self) -> String {
        match &self.kind {
            BindErrorKind::NotRegistered => "type is not registered".to_string(),
            BindErrorKind::Missing(position) => format!("missing {} param", position),
            BindErrorKind::Conversion(err) => err.to_string(),
            BindErrorKind::Validation(err) => err.detail.clone(),
            BindErrorKind::Request(reason) => reason.clone(),
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.custom {
            Some(custom) => f.write_str(custom),
            None => write!(
                f,
                "[parambind] {} | {} | {}",
                self.api,
                self.param,
                self.reason()
            ),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            BindErrorKind::Conversion(err) => Some(err),
            BindErrorKind::Validation(err) => Some(err),
            _ => None,
        }
    }
}
