use crate::tags::TagMap;
use crate::validator::Validator;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Wire source a field's value is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Path,
    Query,
    FormData,
    Body,
    Header,
    Cookie,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Path => "path",
            Position::Query => "query",
            Position::FormData => "formData",
            Position::Body => "body",
            Position::Header => "header",
            Position::Cookie => "cookie",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(Position::Path),
            "query" => Ok(Position::Query),
            "formData" => Ok(Position::FormData),
            "body" => Ok(Position::Body),
            "header" => Ok(Position::Header),
            "cookie" => Ok(Position::Cookie),
            other => Err(format!("invalid position `{}`", other)),
        }
    }
}

/// Primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
}

/// Static shape of a bindable Rust type, reported by
/// [`FromWire::wire_kind`](crate::FromWire::wire_kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WireKind {
    Scalar(ScalarKind),
    /// Raw bytes of the first value
    Bytes,
    Seq(Box<WireKind>),
    Map(Box<WireKind>, Box<WireKind>),
    /// A derived record, by type name
    Record(&'static str),
    /// `Option<T>` / `Box<T>`
    Pointer(Box<WireKind>),
    File,
    Cookie,
    /// Structured body decoded as a whole, by target type name
    Body(&'static str),
}

impl WireKind {
    /// String-like values accept `len` and `regexp`.
    pub fn is_string(&self) -> bool {
        matches!(self, WireKind::Scalar(ScalarKind::String))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            WireKind::Scalar(ScalarKind::Int | ScalarKind::Uint | ScalarKind::Float)
        )
    }

    /// Bound from a flat multi-value list when the exact key is present.
    pub fn is_flat_element(&self) -> bool {
        match self {
            WireKind::Scalar(_) | WireKind::Bytes => true,
            WireKind::Pointer(inner) => inner.is_flat_element(),
            _ => false,
        }
    }

    /// Element kind of a sequence
    pub fn element(&self) -> Option<&WireKind> {
        match self {
            WireKind::Seq(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireKind::Scalar(kind) => write!(f, "{:?}", kind),
            WireKind::Bytes => f.write_str("Bytes"),
            WireKind::Seq(inner) => write!(f, "Vec<{}>", inner),
            WireKind::Map(k, v) => write!(f, "Map<{}, {}>", k, v),
            WireKind::Record(name) => f.write_str(name),
            WireKind::Pointer(inner) => write!(f, "Option<{}>", inner),
            WireKind::File => f.write_str("UploadedFile"),
            WireKind::Cookie => f.write_str("Cookie"),
            WireKind::Body(name) => write!(f, "Body<{}>", name),
        }
    }
}

/// How a record field takes part in binding.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// An annotated leaf field
    Value(WireKind),
    /// `#[param(flatten)]`: the sub-record's fields are spliced in
    Flatten(fn() -> RecordShape),
    /// No annotation, or `#[param("-")]`
    Skipped,
}

/// Static description of one record field, emitted by `#[derive(Bindable)]`.
#[derive(Debug, Clone)]
pub struct FieldShape {
    /// Rust field name
    pub name: &'static str,
    /// Raw tag string from `#[param("...")]`
    pub tag: Option<&'static str>,
    /// Pattern from `#[regexp("...")]`
    pub regexp: Option<&'static str>,
    /// Custom error from `#[err("...")]`
    pub err: Option<&'static str>,
    /// Declared `pub`
    pub exported: bool,
    pub kind: FieldKind,
}

/// Static description of a bindable record.
#[derive(Debug, Clone)]
pub struct RecordShape {
    pub type_name: &'static str,
    pub fields: Vec<FieldShape>,
}

/// Index path from the record root to a leaf field.
pub type FieldPath = SmallVec<[usize; 4]>;

/// Registration-time metadata for one bindable field.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub(crate) api_name: Arc<str>,
    pub(crate) name: String,
    pub(crate) field_name: &'static str,
    pub(crate) position: Position,
    pub(crate) required: bool,
    pub(crate) is_file: bool,
    pub(crate) field_path: FieldPath,
    pub(crate) tags: TagMap,
    pub(crate) custom_error: Option<Arc<str>>,
    pub(crate) validator: Validator,
    pub(crate) kind: WireKind,
    pub(crate) example: Option<serde_json::Value>,
}

impl ParamDescriptor {
    /// Wire-visible name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust field name the descriptor binds into
    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    /// Name of the owning record type
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_file(&self) -> bool {
        self.is_file
    }

    /// Field indices from the record root, flattening embedded records
    pub fn field_path(&self) -> &[usize] {
        &self.field_path
    }

    /// The `desc` tag
    pub fn description(&self) -> Option<&str> {
        self.tags.get(crate::tags::KEY_DESC).map(String::as_str)
    }

    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    pub fn custom_error(&self) -> Option<&str> {
        self.custom_error.as_deref()
    }

    pub fn kind(&self) -> &WireKind {
        &self.kind
    }

    /// Documentation example captured from a registration template
    pub fn example(&self) -> Option<&serde_json::Value> {
        self.example.as_ref()
    }
}
