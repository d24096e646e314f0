//! # Type Converter
//!
//! Turns raw wire values into statically typed Rust values.
//!
//! Every bindable type implements [`FromWire`]. Scalars parse a single raw
//! string; composites (`Vec<T>`, maps, derived records) pull what they need
//! from a [`KeySource`] using the bracket and dotted addressing forms:
//!
//! | Wire key            | Target                         |
//! |---------------------|--------------------------------|
//! | `key=a&key=b`       | `Vec<scalar>` flat list        |
//! | `key[2]=c`          | `Vec<T>` element at index 2    |
//! | `key[]=x`           | `Vec<T>` unindexed element     |
//! | `key[0].name=foo`   | field `name` of element 0      |
//! | `key.name` / `key[name]` | field of a nested record  |
//! | `key[k]=v`          | map entry `k => v`             |
//!
//! [`FieldValue`] is the object-safe face of [`FromWire`] handed out by the
//! derived `field_handles()`, so schema binding can drive every field of a
//! record through one loop.
//!
//! Two named strategies exist side by side ([`Conversion`]): ad-hoc binding
//! is lenient and falls back to zero values, schema binding is strict.

mod composite;
mod scalar;
mod special;

pub use special::{Body, Cookie, RawBytes, UploadedFile};

use crate::error::ConvertError;
use crate::form::KeySource;
use crate::schema::WireKind;
use std::fmt;

/// Conversion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Unparsable scalars become the zero value; out-of-range indices are
    /// skipped. Used by ad-hoc keyed binding.
    Lenient,
    /// Every malformed value is an error. Used by schema binding.
    Strict,
}

impl Conversion {
    pub fn is_strict(self) -> bool {
        self == Conversion::Strict
    }
}

/// Read-only view of a converted value, consumed by the validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Inspect<'a> {
    Number(f64),
    Bool(bool),
    Text(&'a str),
    Bytes(&'a [u8]),
    Seq(Vec<Inspect<'a>>),
    /// An empty `Option`
    Absent,
    /// Values with no constraint semantics beyond zero-ness
    Opaque { zero: bool },
}

impl Inspect<'_> {
    /// Equal to its type's zero value
    pub fn is_zero(&self) -> bool {
        match self {
            Inspect::Number(n) => *n == 0.0,
            Inspect::Bool(b) => !*b,
            Inspect::Text(s) => s.is_empty(),
            Inspect::Bytes(b) => b.is_empty(),
            Inspect::Seq(items) => items.is_empty(),
            Inspect::Absent => true,
            Inspect::Opaque { zero } => *zero,
        }
    }
}

impl fmt::Display for Inspect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inspect::Number(n) => write!(f, "{}", n),
            Inspect::Bool(b) => write!(f, "{}", b),
            Inspect::Text(s) => f.write_str(s),
            Inspect::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Inspect::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Inspect::Absent => f.write_str("<nil>"),
            Inspect::Opaque { .. } => f.write_str("{...}"),
        }
    }
}

/// A Rust type that can be produced from wire values.
pub trait FromWire: Sized + Default + Send + 'static {
    /// Static shape, checked at registration
    fn wire_kind() -> WireKind;

    /// Convert one raw string.
    fn from_raw(_raw: &str, _conv: Conversion) -> Result<Self, ConvertError> {
        Err(ConvertError::unsupported(std::any::type_name::<Self>(), "string"))
    }

    /// Bind the value addressed by `key`. `Ok(None)` means the key is absent.
    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        match src.first_value(key) {
            Some(raw) => Self::from_raw(raw, conv).map(Some),
            None => Ok(None),
        }
    }

    /// Build from an uploaded file (file-typed values only).
    fn from_file(_file: &UploadedFile) -> Option<Self> {
        None
    }

    /// Build from a decoded structured body (body-typed values only).
    fn from_body(_value: serde_json::Value) -> Result<Self, ConvertError> {
        Err(ConvertError::unsupported(std::any::type_name::<Self>(), "body"))
    }

    fn inspect(&self) -> Inspect<'_>;

    /// JSON rendering for documentation examples
    fn example(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Object-safe handle on one bindable field.
///
/// Method names differ from [`FromWire`] so both traits can be in scope for
/// the same type without ambiguity.
pub trait FieldValue: Send {
    /// Bind from `src` under `key`, returning whether a value was present.
    fn bind_keyed(
        &mut self,
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<bool, ConvertError>;

    fn bind_body(&mut self, value: serde_json::Value) -> Result<(), ConvertError>;

    fn view(&self) -> Inspect<'_>;

    fn example_json(&self) -> serde_json::Value;
}

impl<T: FromWire> FieldValue for T {
    fn bind_keyed(
        &mut self,
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<bool, ConvertError> {
        match <T as FromWire>::from_keyed(src, key, conv)? {
            Some(value) => {
                *self = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn bind_body(&mut self, value: serde_json::Value) -> Result<(), ConvertError> {
        *self = <T as FromWire>::from_body(value)?;
        Ok(())
    }

    fn view(&self) -> Inspect<'_> {
        FromWire::inspect(self)
    }

    fn example_json(&self) -> serde_json::Value {
        FromWire::example(self)
    }
}

/// Bind one field of a nested record addressed as `key.wire` or
/// `key[wire]`. Whichever form appears first in the source wins, and within
/// it the first value wins.
///
/// Used by the code `#[derive(Bindable)]` generates.
pub fn bind_record_field<F: FromWire>(
    src: &KeySource<'_>,
    key: &str,
    wire: &str,
    conv: Conversion,
    slot: &mut F,
) -> Result<bool, ConvertError> {
    let dotted = format!("{}.{}", key, wire);
    let bracketed = format!("{}[{}]", key, wire);
    match src.first_present(&[dotted.as_str(), bracketed.as_str()]) {
        Some(sub) => slot.bind_keyed(src, sub, conv),
        None => Ok(false),
    }
}
