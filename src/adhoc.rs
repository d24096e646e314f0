//! # Ad-hoc Keyed Binding
//!
//! Binds one named, possibly composite, value straight into a caller
//! variable, outside any registered schema:
//!
//! ```rust,ignore
//! let mut ids: Vec<u32> = Vec::new();
//! req.bind_one(&mut ids, "id")?;
//! ```
//!
//! Keys are looked up in the merged set of path parameters, form values and
//! query values, in that priority order; for a scalar the first value wins.
//! Conversion is [`Conversion::Lenient`]: unparsable values become zero
//! values instead of errors, and callers rely on that fallback.

use crate::convert::{Conversion, FromWire, UploadedFile};
use crate::error::{BindError, BindErrorKind};
use crate::form::{FormValues, KeySource};
use crate::request::BindRequest;
use crate::runtime_config::BindConfig;
use std::sync::OnceLock;
use tracing::debug;

/// Lenient single-key binder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdHocBinder {
    config: BindConfig,
}

impl AdHocBinder {
    pub fn new(config: BindConfig) -> Self {
        Self { config }
    }

    /// Merge path parameters, form values and query values, in that order.
    ///
    /// A form that cannot be parsed contributes nothing.
    pub fn key_values(&self, req: &mut BindRequest) -> FormValues {
        self.merge(req).0
    }

    /// Bind the value named `key` into `dest`.
    ///
    /// Returns `Ok(false)` and leaves `dest` untouched when the key is absent.
    pub fn bind_one<T: FromWire>(
        &self,
        req: &mut BindRequest,
        dest: &mut T,
        key: &str,
    ) -> Result<bool, BindError> {
        let cookies = req.cookies().to_vec();
        let (merged, files) = self.merge(req);
        let src = KeySource::new(&merged, self.config.max_array_index)
            .with_files(files)
            .with_cookies(&cookies);
        self.bind_from(&src, dest, key)
    }

    fn merge<'r>(&self, req: &'r mut BindRequest) -> (FormValues, &'r [UploadedFile]) {
        let query = req.query().clone();
        let mut merged: FormValues = req
            .path_params()
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_str()))
            .collect();
        let files: &[UploadedFile] = match req.form_with_files(self.config.default_max_memory) {
            Ok((form, files)) => {
                merged.extend_from(form);
                files
            }
            Err(e) => {
                debug!(error = %e, "Form ignored for keyed binding");
                &[]
            }
        };
        merged.extend_from(&query);
        (merged, files)
    }

    /// Bind `key` from an already assembled source.
    pub fn bind_from<T: FromWire>(
        &self,
        src: &KeySource<'_>,
        dest: &mut T,
        key: &str,
    ) -> Result<bool, BindError> {
        match T::from_keyed(src, key, Conversion::Lenient) {
            Ok(Some(value)) => {
                *dest = value;
                debug!(key = %key, "Keyed value bound");
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(BindError::new(
                std::any::type_name::<T>(),
                key,
                BindErrorKind::Conversion(e),
            )),
        }
    }
}

/// Binder configured from `PARAMBIND_*` variables, read on first use.
fn env_binder() -> AdHocBinder {
    static BINDER: OnceLock<AdHocBinder> = OnceLock::new();
    *BINDER.get_or_init(|| AdHocBinder::new(BindConfig::from_env()))
}

impl BindRequest {
    /// Bind the value named `key` into `dest` with the limits from
    /// [`BindConfig::from_env`], loaded once per process.
    ///
    /// See [`AdHocBinder::bind_one`].
    pub fn bind_one<T: FromWire>(&mut self, dest: &mut T, key: &str) -> Result<bool, BindError> {
        env_binder().bind_one(self, dest, key)
    }
}
