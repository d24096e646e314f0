//! # Constraint Validator
//!
//! A [`Validator`] is compiled once per field at registration from the
//! field's tag map (`range`, `nonzero`, `len`, `regexp`) and then applied to
//! every converted value. Rules always run in the order
//! `range -> nonzero -> len -> regexp`, so one input reports the same first
//! failure on every request. Sequences are validated element by element.
//!
//! Bounds use the `min:max` tuple syntax. Either side may be empty
//! (`:10`, `3:`), and a single number means `n:n`.

use crate::convert::Inspect;
use crate::error::{ValidationError, ViolationKind};
use crate::tags::{TagMap, KEY_LEN, KEY_NONZERO, KEY_RANGE, KEY_REGEXP};
use regex::Regex;

/// Numeric bounds are compared with this tolerance.
const ACCURACY: f64 = 0.000_000_1;

#[derive(Debug, Clone, PartialEq)]
struct Bounds<T> {
    min: Option<T>,
    max: Option<T>,
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    compiled: Regex,
}

/// Compiled constraint set of one field.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    range: Option<Bounds<f64>>,
    nonzero: bool,
    len: Option<Bounds<usize>>,
    regexp: Option<Pattern>,
}

impl Validator {
    /// Compile the constraints present in `tags`.
    ///
    /// `pattern` is the separate pattern annotation; it takes precedence over
    /// a `<regexp:...>` token.
    pub fn compile(tags: &TagMap, pattern: Option<&str>) -> Result<Self, String> {
        let range = match tags.get(KEY_RANGE) {
            Some(tuple) => Some(parse_bounds::<f64>(KEY_RANGE, tuple)?),
            None => None,
        };
        let len = match tags.get(KEY_LEN) {
            Some(tuple) => Some(parse_bounds::<usize>(KEY_LEN, tuple)?),
            None => None,
        };
        let regexp = match pattern.or_else(|| tags.get(KEY_REGEXP).map(String::as_str)) {
            Some(source) => {
                let compiled = Regex::new(&format!("^(?:{})$", source))
                    .map_err(|e| format!("invalid regexp `{}`: {}", source, e))?;
                Some(Pattern {
                    source: source.to_string(),
                    compiled,
                })
            }
            None => None,
        };
        Ok(Self {
            range,
            nonzero: tags.contains_key(KEY_NONZERO),
            len,
            regexp,
        })
    }

    /// No constraint declared
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && !self.nonzero && self.len.is_none() && self.regexp.is_none()
    }

    /// Check `value`, reporting the first violation under `field`.
    pub fn validate(&self, field: &str, value: &Inspect<'_>) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Ok(());
        }
        match value {
            Inspect::Seq(items) => {
                if self.nonzero && items.is_empty() {
                    return Err(violation(field, ViolationKind::NotSet, "not set".into()));
                }
                items.iter().try_for_each(|item| self.validate(field, item))
            }
            single => self.validate_one(field, single),
        }
    }

    fn validate_one(&self, field: &str, value: &Inspect<'_>) -> Result<(), ValidationError> {
        if let (Some(bounds), Inspect::Number(n)) = (&self.range, value) {
            // NaN compares false against both bounds
            if n.is_nan() {
                return Err(violation(
                    field,
                    ViolationKind::TooSmall,
                    format!("not a number: {}", n),
                ));
            }
            if let Some(min) = bounds.min {
                if *n < min && (min - *n) > ACCURACY {
                    return Err(violation(
                        field,
                        ViolationKind::TooSmall,
                        format!("smaller than {}: {}", min, n),
                    ));
                }
            }
            if let Some(max) = bounds.max {
                if *n > max && (*n - max) > ACCURACY {
                    return Err(violation(
                        field,
                        ViolationKind::TooBig,
                        format!("bigger than {}: {}", max, n),
                    ));
                }
            }
        }

        if self.nonzero && value.is_zero() {
            return Err(violation(field, ViolationKind::NotSet, "not set".into()));
        }

        if let Some(bounds) = &self.len {
            let length = match value {
                Inspect::Text(s) => Some(s.chars().count()),
                Inspect::Bytes(b) => Some(b.len()),
                _ => None,
            };
            if let Some(length) = length {
                if let Some(min) = bounds.min {
                    if length < min {
                        return Err(violation(
                            field,
                            ViolationKind::TooShort,
                            format!("shorter than {}: {}", min, value),
                        ));
                    }
                }
                if let Some(max) = bounds.max {
                    if length > max {
                        return Err(violation(
                            field,
                            ViolationKind::TooLong,
                            format!("longer than {}: {}", max, value),
                        ));
                    }
                }
            }
        }

        if let (Some(pattern), Inspect::Text(s)) = (&self.regexp, value) {
            if !pattern.compiled.is_match(s) {
                return Err(violation(
                    field,
                    ViolationKind::NotMatching,
                    format!("not match {}: {}", pattern.source, s),
                ));
            }
        }

        Ok(())
    }
}

fn violation(field: &str, kind: ViolationKind, detail: String) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        kind,
        detail,
    }
}

/// Parse a `min:max` tuple. Empty sides are unbounded; `n` means `n:n`.
fn parse_bounds<T: std::str::FromStr>(key: &str, tuple: &str) -> Result<Bounds<T>, String> {
    let invalid = || format!("invalid {} tuple `{}`", key, tuple);
    let parts: Vec<&str> = tuple.split(':').collect();
    let (a, b) = match parts.as_slice() {
        [a] if !a.trim().is_empty() => (*a, *a),
        [a, b] if !a.trim().is_empty() || !b.trim().is_empty() => (*a, *b),
        _ => return Err(invalid()),
    };
    let side = |s: &str| -> Result<Option<T>, String> {
        let s = s.trim();
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse::<T>().map(Some).map_err(|_| invalid())
        }
    };
    Ok(Bounds {
        min: side(a)?,
        max: side(b)?,
    })
}
