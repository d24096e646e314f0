use super::{Conversion, FromWire, Inspect, UploadedFile};
use crate::error::ConvertError;
use crate::form::KeySource;
use crate::schema::WireKind;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// One `key[...]` occurrence found while scanning a source.
enum Bracket<'a> {
    /// `key[n]` or `key[n]...`, with the sub-key `key[n]`
    Index(usize, &'a str),
    /// `key[]`
    Unindexed(&'a [String]),
    /// `key[name]` or `key[name]...`, with the sub-key `key[name]`
    Named(&'a str, &'a str),
}

/// Classify every key addressing `key[...]`, in source order.
fn scan_brackets<'a>(src: &KeySource<'a>, key: &str) -> Vec<Bracket<'a>> {
    let mut found = Vec::new();
    for (k, vals) in src.entries() {
        let Some(rest) = k.strip_prefix(key).and_then(|r| r.strip_prefix('[')) else {
            continue;
        };
        let Some(close) = rest.find(']') else {
            continue;
        };
        let inner = &rest[..close];
        let suffix = &rest[close + 1..];
        let sub_key = &k[..key.len() + 1 + close + 1];

        if inner.is_empty() {
            if suffix.is_empty() {
                found.push(Bracket::Unindexed(vals));
            }
        } else if inner.bytes().all(|b| b.is_ascii_digit()) {
            // overflow lands above any configured limit
            let index = inner.parse::<usize>().unwrap_or(usize::MAX);
            found.push(Bracket::Index(index, sub_key));
        } else {
            found.push(Bracket::Named(inner, sub_key));
        }
    }
    found
}

/// Assemble a sequence from bracket addressing.
///
/// Explicit indices are written in place (the length is the largest index
/// plus one, gaps hold zero values), unindexed elements are appended after
/// them in source order.
fn bind_indexed<T: FromWire>(
    src: &KeySource<'_>,
    key: &str,
    conv: Conversion,
) -> Result<Option<Vec<T>>, ConvertError> {
    let mut indexed: Vec<(usize, &str)> = Vec::new();
    let mut unindexed: Vec<&str> = Vec::new();
    for bracket in scan_brackets(src, key) {
        match bracket {
            Bracket::Index(index, sub_key) => {
                if index > src.max_array_index() {
                    if conv.is_strict() {
                        return Err(ConvertError::IndexTooLarge {
                            key: sub_key.to_string(),
                            index,
                            max: src.max_array_index(),
                        });
                    }
                    continue;
                }
                if !indexed.iter().any(|(i, _)| *i == index) {
                    indexed.push((index, sub_key));
                }
            }
            Bracket::Unindexed(vals) => unindexed.extend(vals.iter().map(String::as_str)),
            Bracket::Named(..) => {}
        }
    }
    if indexed.is_empty() && unindexed.is_empty() {
        return Ok(None);
    }

    let len = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
    let mut out: Vec<T> = Vec::with_capacity(len + unindexed.len());
    out.resize_with(len, T::default);

    for (index, sub_key) in indexed {
        match T::from_keyed(src, sub_key, conv) {
            Ok(Some(value)) => out[index] = value,
            Ok(None) => {}
            Err(e) if conv.is_strict() => return Err(e),
            Err(_) => {}
        }
    }
    for raw in unindexed {
        match T::from_raw(raw, conv) {
            Ok(value) => out.push(value),
            Err(e) if conv.is_strict() => return Err(e),
            Err(_) => out.push(T::default()),
        }
    }
    Ok(Some(out))
}

impl<T: FromWire> FromWire for Vec<T> {
    fn wire_kind() -> WireKind {
        WireKind::Seq(Box::new(T::wire_kind()))
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        let element = T::wire_kind();

        if element == WireKind::File {
            let files: Vec<T> = src.files(key).into_iter().filter_map(T::from_file).collect();
            return Ok(if files.is_empty() { None } else { Some(files) });
        }

        if element.is_flat_element() {
            let values = src.values(key);
            if !values.is_empty() {
                return values
                    .iter()
                    .map(|raw| T::from_raw(raw, conv))
                    .collect::<Result<Vec<T>, _>>()
                    .map(Some);
            }
        }

        bind_indexed(src, key, conv)
    }

    fn from_file(file: &UploadedFile) -> Option<Self> {
        T::from_file(file).map(|f| vec![f])
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Seq(self.iter().map(FromWire::inspect).collect())
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(FromWire::example).collect())
    }
}

/// Collect `key[mapKey]` entries in first-seen order, one per distinct map key.
fn bind_map_entries<K, V>(
    src: &KeySource<'_>,
    key: &str,
    conv: Conversion,
) -> Result<Option<Vec<(K, V)>>, ConvertError>
where
    K: FromWire,
    V: FromWire,
{
    let mut seen: Vec<&str> = Vec::new();
    let mut entries = Vec::new();
    for bracket in scan_brackets(src, key) {
        let (map_key, sub_key) = match bracket {
            Bracket::Named(name, sub_key) => (name, sub_key),
            Bracket::Index(_, sub_key) => (&sub_key[key.len() + 1..sub_key.len() - 1], sub_key),
            Bracket::Unindexed(_) => continue,
        };
        if seen.contains(&map_key) {
            continue;
        }
        seen.push(map_key);

        let k = K::from_raw(map_key, conv)?;
        match V::from_keyed(src, sub_key, conv) {
            Ok(Some(v)) => entries.push((k, v)),
            Ok(None) => {}
            Err(e) if conv.is_strict() => return Err(e),
            Err(_) => entries.push((k, V::default())),
        }
    }
    Ok(if entries.is_empty() { None } else { Some(entries) })
}

impl<K, V> FromWire for HashMap<K, V>
where
    K: FromWire + Eq + Hash,
    V: FromWire,
{
    fn wire_kind() -> WireKind {
        WireKind::Map(Box::new(K::wire_kind()), Box::new(V::wire_kind()))
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        Ok(bind_map_entries::<K, V>(src, key, conv)?.map(|e| e.into_iter().collect()))
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Opaque {
            zero: self.is_empty(),
        }
    }
}

impl<K, V> FromWire for BTreeMap<K, V>
where
    K: FromWire + Ord,
    V: FromWire,
{
    fn wire_kind() -> WireKind {
        WireKind::Map(Box::new(K::wire_kind()), Box::new(V::wire_kind()))
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        Ok(bind_map_entries::<K, V>(src, key, conv)?.map(|e| e.into_iter().collect()))
    }

    fn inspect(&self) -> Inspect<'_> {
        Inspect::Opaque {
            zero: self.is_empty(),
        }
    }

    fn example(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (FromWire::inspect(k).to_string(), FromWire::example(v)))
                .collect(),
        )
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn wire_kind() -> WireKind {
        WireKind::Pointer(Box::new(T::wire_kind()))
    }

    fn from_raw(raw: &str, conv: Conversion) -> Result<Self, ConvertError> {
        T::from_raw(raw, conv).map(Some)
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        Ok(T::from_keyed(src, key, conv)?.map(Some))
    }

    fn from_file(file: &UploadedFile) -> Option<Self> {
        T::from_file(file).map(Some)
    }

    fn inspect(&self) -> Inspect<'_> {
        match self {
            Some(value) => value.inspect(),
            None => Inspect::Absent,
        }
    }

    fn example(&self) -> serde_json::Value {
        match self {
            Some(value) => value.example(),
            None => serde_json::Value::Null,
        }
    }
}

impl<T: FromWire> FromWire for Box<T> {
    fn wire_kind() -> WireKind {
        WireKind::Pointer(Box::new(T::wire_kind()))
    }

    fn from_raw(raw: &str, conv: Conversion) -> Result<Self, ConvertError> {
        T::from_raw(raw, conv).map(Box::new)
    }

    fn from_keyed(
        src: &KeySource<'_>,
        key: &str,
        conv: Conversion,
    ) -> Result<Option<Self>, ConvertError> {
        Ok(T::from_keyed(src, key, conv)?.map(Box::new))
    }

    fn inspect(&self) -> Inspect<'_> {
        T::inspect(self)
    }

    fn example(&self) -> serde_json::Value {
        T::example(self)
    }
}
