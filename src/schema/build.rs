use super::registry::NameMapper;
use super::types::{FieldKind, FieldPath, FieldShape, ParamDescriptor, Position, RecordShape, WireKind};
use crate::error::RegistrationError;
use crate::tags::{
    canonical_header_key, is_ignored, parse_tags, KEY_ERR, KEY_IN, KEY_LEN, KEY_MAXMB, KEY_NAME,
    KEY_NONZERO, KEY_RANGE, KEY_REGEXP, KEY_REQUIRED,
};
use crate::validator::Validator;
use std::sync::Arc;
use tracing::debug;

/// Result of walking one record shape.
pub(crate) struct BuiltParams {
    pub params: Vec<ParamDescriptor>,
    /// Largest `maxmb` across every field, if any declared one
    pub max_mb: Option<u64>,
}

#[derive(Default)]
struct WalkState {
    has_form_data: bool,
    has_body: bool,
    max_mb: Option<u64>,
}

/// Build the ordered descriptor list for `shape`.
///
/// Flattened sub-records are walked in place, so their fields appear at the
/// parent's position and share one set of position checks with it.
pub(crate) fn build_params(
    shape: &RecordShape,
    api_name: &Arc<str>,
    name_mapper: &NameMapper,
) -> Result<BuiltParams, RegistrationError> {
    let mut params = Vec::new();
    let mut state = WalkState::default();
    walk(
        shape,
        shape.type_name,
        &FieldPath::new(),
        api_name,
        name_mapper,
        &mut state,
        &mut params,
    )?;
    Ok(BuiltParams {
        params,
        max_mb: state.max_mb,
    })
}

fn walk(
    shape: &RecordShape,
    root_name: &str,
    parent: &FieldPath,
    api_name: &Arc<str>,
    name_mapper: &NameMapper,
    state: &mut WalkState,
    out: &mut Vec<ParamDescriptor>,
) -> Result<(), RegistrationError> {
    for (index, field) in shape.fields.iter().enumerate() {
        let mut path = parent.clone();
        path.push(index);

        match &field.kind {
            FieldKind::Skipped => continue,
            FieldKind::Flatten(nested) => {
                let nested = nested();
                walk(&nested, root_name, &path, api_name, name_mapper, state, out)?;
            }
            FieldKind::Value(kind) => {
                let Some(tag) = field.tag else { continue };
                if is_ignored(tag) {
                    continue;
                }
                let descriptor =
                    build_one(field, tag, kind, path, root_name, api_name, name_mapper, state)?;
                debug!(
                    api = %api_name,
                    param = %descriptor.name,
                    position = %descriptor.position,
                    required = descriptor.required,
                    "Param descriptor built"
                );
                out.push(descriptor);
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_one(
    field: &FieldShape,
    tag: &str,
    kind: &WireKind,
    path: FieldPath,
    root_name: &str,
    api_name: &Arc<str>,
    name_mapper: &NameMapper,
    state: &mut WalkState,
) -> Result<ParamDescriptor, RegistrationError> {
    let fail = |reason: &str| RegistrationError::new(root_name, field.name, reason);

    if let WireKind::Pointer(_) = kind {
        return Err(fail("field can not be a pointer"));
    }
    if !field.exported {
        return Err(fail("field can not be a non-pub field"));
    }

    let mut tags = parse_tags(tag);
    if let Some(pattern) = field.regexp {
        tags.insert(KEY_REGEXP.to_string(), pattern.to_string());
    }
    if let Some(err) = field.err {
        tags.insert(KEY_ERR.to_string(), err.to_string());
    }

    let position: Position = tags
        .get(KEY_IN)
        .map(String::as_str)
        .unwrap_or("")
        .parse()
        .map_err(|_| {
            fail("invalid tag `in` value, refer to the following: `path`, `query`, `formData`, `body`, `header` or `cookie`")
        })?;

    let is_file = matches!(kind, WireKind::File)
        || matches!(kind, WireKind::Seq(inner) if **inner == WireKind::File);
    if is_file && position != Position::FormData {
        return Err(fail(&format!(
            "when field type is `{}`, tag `in` value must be `formData`",
            kind
        )));
    }
    if *kind == WireKind::Cookie && position != Position::Cookie {
        return Err(fail(
            "when field type is `Cookie`, tag `in` value must be `cookie`",
        ));
    }
    if matches!(kind, WireKind::Body(_)) != (position == Position::Body) {
        return Err(fail("tag `in(body)` requires a `Body<T>` field and only a `Body<T>` field"));
    }
    if matches!(kind, WireKind::Record(_) | WireKind::Map(..))
        && !matches!(position, Position::Query | Position::FormData)
    {
        return Err(fail(&format!(
            "a `{}` field can only be bound from `query` or `formData`",
            kind
        )));
    }

    match position {
        Position::FormData => {
            if state.has_body {
                return Err(fail(
                    "tags of `in(formData)` and `in(body)` can not exist at the same time",
                ));
            }
            state.has_form_data = true;
        }
        Position::Body => {
            if state.has_form_data {
                return Err(fail(
                    "tags of `in(formData)` and `in(body)` can not exist at the same time",
                ));
            }
            if state.has_body {
                return Err(fail("there should not be more than one tag `in(body)`"));
            }
            state.has_body = true;
        }
        Position::Path => {
            tags.insert(KEY_REQUIRED.to_string(), KEY_REQUIRED.to_string());
        }
        _ => {}
    }

    let element = kind.element().unwrap_or(kind);
    if tags.contains_key(KEY_LEN) && !(element.is_string() || *kind == WireKind::Bytes) {
        return Err(fail("invalid `len` tag for non-string field"));
    }
    if tags.contains_key(KEY_RANGE) && !element.is_numeric() {
        return Err(fail("invalid `range` tag for non-number field"));
    }
    if tags.contains_key(KEY_REGEXP) && !element.is_string() {
        return Err(fail("invalid `regexp` tag for non-string field"));
    }
    if let Some(raw) = tags.get(KEY_MAXMB) {
        match raw.trim().parse::<u64>() {
            Ok(mb) if mb > 0 => {
                state.max_mb = Some(state.max_mb.map_or(mb, |cur| cur.max(mb)));
            }
            _ => return Err(fail("invalid `maxmb` tag, it must be positive integer")),
        }
    }

    let validator = Validator::compile(&tags, field.regexp)
        .map_err(|e| fail(&format!("initial validation failed: {}", e)))?;

    let mut name = match tags.get(KEY_NAME) {
        Some(name) if !name.is_empty() => name.clone(),
        _ => name_mapper(field.name),
    };
    if position == Position::Header {
        name = canonical_header_key(&name);
    }

    let required = tags.contains_key(KEY_REQUIRED)
        || tags.contains_key(KEY_NONZERO)
        || tags.get(KEY_RANGE).is_some_and(|r| !r.is_empty());

    let custom_error = tags.get(KEY_ERR).map(|e| Arc::from(e.as_str()));

    Ok(ParamDescriptor {
        api_name: Arc::clone(api_name),
        name,
        field_name: field.name,
        position,
        required,
        is_file,
        field_path: path,
        tags,
        custom_error,
        validator,
        kind: kind.clone(),
        example: None,
    })
}
