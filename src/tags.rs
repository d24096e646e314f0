//! # Tag Grammar
//!
//! A field's declarative annotation is a whitespace separated list of
//! `<key:value>` or `<key>` tokens, for example:
//!
//! ```text
//! <in:formData> <name:avatar> <required> <len:3:6> <desc:profile picture>
//! ```
//!
//! Only the first `:` of a token separates key from value, so `<len:3:6>`
//! yields `len => "3:6"`. A literal `<` or `>` inside a value is written `\<`
//! or `\>`. Presence-only tokens (`<required>`, `<nonzero>`) map to an empty
//! value. Text outside of `<...>` is ignored.
//!
//! Parsing is pure: [`parse_tags`] never fails, and interpretation of the
//! resulting map (valid positions, constraint arguments) happens at
//! registration time in [`crate::schema`].

use std::collections::HashMap;

/// Source position, one of `path`, `query`, `formData`, `body`, `header`, `cookie`
pub const KEY_IN: &str = "in";
/// Wire name override
pub const KEY_NAME: &str = "name";
/// Presence flag: the value must be supplied
pub const KEY_REQUIRED: &str = "required";
/// Free text description, surfaced through [`crate::ParamDescriptor::description`]
pub const KEY_DESC: &str = "desc";
/// Inclusive length bounds `min:max`
pub const KEY_LEN: &str = "len";
/// Inclusive numeric bounds `min:max`
pub const KEY_RANGE: &str = "range";
/// Presence flag: the value must differ from its zero value
pub const KEY_NONZERO: &str = "nonzero";
/// Full-match pattern
pub const KEY_REGEXP: &str = "regexp";
/// Multipart memory cap in MiB
pub const KEY_MAXMB: &str = "maxmb";
/// Custom error text
pub const KEY_ERR: &str = "err";

/// A tag consisting only of this token excludes the field from binding.
pub const TAG_IGNORE: &str = "-";

/// One mebibyte, the unit of `maxmb`.
pub const MB: u64 = 1 << 20;

/// Parsed constraint map of one field.
pub type TagMap = HashMap<String, String>;

/// Parse an annotation string into its constraint map.
///
/// Later duplicates of a key overwrite earlier ones. An unterminated token at
/// the end of the string is dropped.
pub fn parse_tags(tag: &str) -> TagMap {
    let mut values = TagMap::new();
    let mut rest = tag;

    while let Some(open) = rest.find('<') {
        rest = rest[open + 1..].trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        let mut name: Option<String> = None;
        let mut buf = String::new();
        let mut closed = false;
        let mut consumed = rest.len();
        let mut chars = rest.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            match c {
                ':' if name.is_none() => {
                    name = Some(buf.trim_end_matches(' ').to_string());
                    buf.clear();
                    while let Some((_, ' ')) = chars.peek() {
                        chars.next();
                    }
                }
                '\\' => match chars.peek() {
                    Some(&(_, next @ ('<' | '>'))) => {
                        buf.push(next);
                        chars.next();
                    }
                    Some(&(_, next)) => {
                        buf.push('\\');
                        buf.push(next);
                        chars.next();
                    }
                    None => buf.push('\\'),
                },
                '>' => {
                    let text = buf.trim_end_matches(' ').to_string();
                    match name.take() {
                        Some(key) => values.insert(key, text),
                        None => values.insert(text, String::new()),
                    };
                    closed = true;
                    consumed = idx + 1;
                    break;
                }
                other => buf.push(other),
            }
        }

        if !closed {
            break;
        }
        rest = &rest[consumed..];
    }

    values
}

/// True when the raw annotation marks the field as excluded.
pub fn is_ignored(tag: &str) -> bool {
    tag.trim() == TAG_IGNORE
}

/// Canonical MIME header form: `x-api-key` becomes `X-Api-Key`.
pub fn canonical_header_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Default wire name for a Rust field: the snake-case form of its name.
///
/// Rust field names are already snake case in idiomatic code; this also
/// folds `CamelCase` style names (`UserID` becomes `user_id`).
pub fn to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
