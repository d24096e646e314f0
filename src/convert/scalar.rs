use super::{Conversion, FromWire, Inspect};
use crate::error::ConvertError;
use crate::schema::{ScalarKind, WireKind};

/// Parse with `FromStr`, falling back to the zero value when lenient.
fn parse_or_zero<T>(raw: &str, conv: Conversion, target: &'static str) -> Result<T, ConvertError>
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) if !conv.is_strict() => Ok(T::default()),
        Err(e) => Err(ConvertError::invalid(target, raw, e)),
    }
}

macro_rules! numeric_from_wire {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl FromWire for $ty {
                fn wire_kind() -> WireKind {
                    WireKind::Scalar($kind)
                }

                fn from_raw(raw: &str, conv: Conversion) -> Result<Self, ConvertError> {
                    parse_or_zero::<$ty>(raw, conv, stringify!($ty))
                }

                fn inspect(&self) -> Inspect<'_> {
                    Inspect::Number(*self as f64)
                }

                fn example(&self) -> serde_json::Value {
                    serde_json::json!(*self)
                }
            }
        )+
    };
}

numeric_from_wire!(ScalarKind::Int => i8, i16, i32, i64, isize);
numeric_from_wire!(ScalarKind::Uint => u8, u16, u32, u64, usize);
numeric_from_wire!(ScalarKind::Float => f32, f64);

impl FromWire for bool {
    fn wire_kind() -> WireKind {
        WireKind::Scalar(ScalarKind::Bool)
    }

    /// `true`, `on` and `1` (case-insensitive) are true, anything else false.
    fn from_raw(raw: &str, _conv: Conversion) -> Result<Self, ConvertError> {
        let raw = raw.trim();
        Ok(raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("on") || raw == "1")
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Bool(*self)
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::Bool(*self)
    }
}

impl FromWire for String {
    fn wire_kind() -> WireKind {
        WireKind::Scalar(ScalarKind::String)
    }

    fn from_raw(raw: &str, _conv: Conversion) -> Result<Self, ConvertError> {
        Ok(raw.to_string())
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Text(self)
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::String(self.clone())
    }
}
