use super::{Conversion, FromWire, Inspect};
use crate::error::ConvertError;
use crate::form::KeySource;
use crate::schema::WireKind;
use serde::de::DeserializeOwned;
use std::ops::{Deref, DerefMut};

/// Bytes of the first raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBytes(pub Vec<u8>);

impl Deref for RawBytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromWire for RawBytes {
    fn wire_kind() -> WireKind {
        WireKind::Bytes
    }

    fn from_raw(raw: &str, _conv: Conversion) -> Result<Self, ConvertError> {
        Ok(RawBytes(raw.as_bytes().to_vec()))
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Bytes(&self.0)
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::String(String::from_utf8_lossy(&self.0).into_owned())
    }
}

/// A multipart file part, as handed over by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the part was submitted under
    pub field_name: String,
    /// Client-side file name
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(field_name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content_type: None,
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl FromWire for UploadedFile {
    fn wire_kind() -> WireKind {
        WireKind::File
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        _conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        Ok(src.files(key).first().map(|f| (*f).clone()))
    }

    fn from_file(file: &UploadedFile) -> Option<Self> {
        Some(file.clone())
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Opaque {
            zero: self.file_name.is_empty() && self.data.is_empty(),
        }
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::String(self.file_name.clone())
    }
}

/// A request cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromWire for Cookie {
    fn wire_kind() -> WireKind {
        WireKind::Cookie
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        _conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        Ok(src.cookie(key).cloned())
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Opaque {
            zero: self.name.is_empty() && self.value.is_empty(),
        }
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::String(self.value.clone())
    }
}

/// Whole request body decoded by the registered body decoder and then
/// deserialized into `T`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body<T>(pub T);

impl<T> Body<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Body<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Body<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> FromWire for Body<T>
where
    T: DeserializeOwned + Default + Send + 'static,
{
    fn wire_kind() -> WireKind {
        WireKind::Body(std::any::type_name::<T>())
    }

    fn from_body(value: serde_json::Value) -> Result<Self, ConvertError> {
        serde_json::from_value(value)
            .map(Body)
            .map_err(|e| ConvertError::Body {
                target: std::any::type_name::<T>(),
                reason: e.to_string(),
            })
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Opaque { zero: false }
    }
}
