use super::build::build_params;
use super::types::{ParamDescriptor, Position};
use super::Bindable;
use crate::convert::{Conversion, FieldValue};
use crate::error::{BindError, BindErrorKind, RegistrationError};
use crate::form::{FormValues, KeySource};
use crate::request::{path_param, BindRequest, PathParams};
use crate::runtime_config::BindConfig;
use crate::tags::{to_snake, MB};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Maps a Rust field name to its default wire name.
pub type NameMapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Decodes a whole request body into a structured value.
pub type BodyDecoder = Arc<dyn Fn(&[u8]) -> Result<serde_json::Value, String> + Send + Sync>;

/// JSON body decoder (the default).
pub fn json_decoder() -> BodyDecoder {
    Arc::new(|body: &[u8]| serde_json::from_slice(body).map_err(|e| e.to_string()))
}

/// YAML body decoder.
pub fn yaml_decoder() -> BodyDecoder {
    Arc::new(|body: &[u8]| serde_yaml::from_slice(body).map_err(|e| e.to_string()))
}

/// Per-type registration options.
#[derive(Clone)]
pub struct RegisterOptions {
    pub name_mapper: NameMapper,
    pub body_decoder: BodyDecoder,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            name_mapper: Arc::new(to_snake),
            body_decoder: json_decoder(),
        }
    }
}

impl RegisterOptions {
    #[must_use]
    pub fn with_name_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.name_mapper = Arc::new(mapper);
        self
    }

    #[must_use]
    pub fn with_body_decoder(mut self, decoder: BodyDecoder) -> Self {
        self.body_decoder = decoder;
        self
    }
}

impl fmt::Debug for RegisterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterOptions").finish_non_exhaustive()
    }
}

/// Registered binding schema of one record type.
pub struct ParamsApi {
    name: Arc<str>,
    type_id: TypeId,
    params: Vec<ParamDescriptor>,
    body_decoder: BodyDecoder,
    max_memory: AtomicU64,
    max_array_index: usize,
}

impl fmt::Debug for ParamsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsApi")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("max_memory", &self.max_memory())
            .finish_non_exhaustive()
    }
}

/// A fresh record and access to its field handles, for one bind call.
pub struct Receiver<T> {
    value: T,
}

impl<T: Bindable> Receiver<T> {
    /// Field handles aligned with the descriptor list
    pub fn handles(&mut self) -> Vec<&mut dyn FieldValue> {
        self.value.field_handles()
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl ParamsApi {
    /// Record type name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Descriptors in binding order
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Number of bindable fields
    pub fn number(&self) -> usize {
        self.params.len()
    }

    /// Form payload cap in bytes
    pub fn max_memory(&self) -> u64 {
        self.max_memory.load(Ordering::Relaxed)
    }

    pub fn set_max_memory(&self, bytes: u64) {
        self.max_memory.store(bytes, Ordering::Relaxed);
    }

    /// A zeroed record of the registered type.
    pub fn new_receiver<T: Bindable>(&self) -> Result<Receiver<T>, BindError> {
        if TypeId::of::<T>() != self.type_id {
            return Err(BindError::not_registered(std::any::type_name::<T>()));
        }
        Ok(Receiver {
            value: T::default(),
        })
    }

    fn fail(&self, param: &ParamDescriptor, kind: BindErrorKind) -> BindError {
        let err = BindError::new(&*self.name, param.name.as_str(), kind)
            .with_custom(param.custom_error.clone());
        warn!(api = %self.name, param = %param.name, error = %err, "Param bind failed");
        err
    }

    /// Bind every descriptor into its field handle, in order, stopping at the
    /// first failure.
    ///
    /// `fields` must come from `field_handles()` of the registered type.
    pub fn bind_fields(
        &self,
        fields: &mut [&mut dyn FieldValue],
        req: &mut BindRequest,
        path_params: &PathParams,
    ) -> Result<(), BindError> {
        if fields.len() != self.params.len() {
            return Err(BindError::new(
                &*self.name,
                "*",
                BindErrorKind::Request(format!(
                    "expected {} field handles, got {}",
                    self.params.len(),
                    fields.len()
                )),
            ));
        }

        for (param, field) in self.params.iter().zip(fields.iter_mut()) {
            let present = self.extract(param, &mut **field, req, path_params)?;
            if !present {
                if param.required {
                    return Err(self.fail(param, BindErrorKind::Missing(param.position)));
                }
                continue;
            }
            param
                .validator
                .validate(&param.name, &field.view())
                .map_err(|e| self.fail(param, BindErrorKind::Validation(e)))?;
            debug!(api = %self.name, param = %param.name, position = %param.position, "Param bound");
        }
        Ok(())
    }

    /// Pull the raw value(s) for one descriptor and convert them into
    /// `field`. Returns whether the value was present.
    fn extract(
        &self,
        param: &ParamDescriptor,
        field: &mut dyn FieldValue,
        req: &mut BindRequest,
        path_params: &PathParams,
    ) -> Result<bool, BindError> {
        let name = param.name.as_str();
        let convert = |result: Result<bool, _>| {
            result.map_err(|e| self.fail(param, BindErrorKind::Conversion(e)))
        };

        match param.position {
            Position::Path => {
                let Some(raw) = path_param(path_params, name) else {
                    return Err(self.fail(param, BindErrorKind::Missing(Position::Path)));
                };
                let values: FormValues = std::iter::once((name, raw)).collect();
                convert(field.bind_keyed(
                    &KeySource::new(&values, self.max_array_index),
                    name,
                    Conversion::Strict,
                ))
            }
            Position::Query => {
                let values = req.query();
                convert(field.bind_keyed(
                    &KeySource::new(values, self.max_array_index),
                    name,
                    Conversion::Strict,
                ))
            }
            Position::FormData => {
                let max_memory = self.max_memory();
                let (values, files) = req
                    .form_with_files(max_memory)
                    .map_err(|e| self.fail(param, BindErrorKind::Request(e)))?;
                let src = KeySource::new(values, self.max_array_index).with_files(files);
                convert(field.bind_keyed(&src, name, Conversion::Strict))
            }
            Position::Body => match req.take_body() {
                Some(body) if !body.is_empty() => {
                    let value = (self.body_decoder)(&body)
                        .map_err(|e| self.fail(param, BindErrorKind::Request(e)))?;
                    field
                        .bind_body(value)
                        .map_err(|e| self.fail(param, BindErrorKind::Conversion(e)))?;
                    Ok(true)
                }
                _ => Ok(false),
            },
            Position::Header => {
                let raw = req.header_values(name);
                if raw.is_empty() {
                    return Ok(false);
                }
                let values: FormValues = raw.into_iter().map(|v| (name, v)).collect();
                convert(field.bind_keyed(
                    &KeySource::new(&values, self.max_array_index),
                    name,
                    Conversion::Strict,
                ))
            }
            Position::Cookie => {
                let cookies = req.cookies();
                let values: FormValues = cookies
                    .iter()
                    .map(|c| (c.name.as_str(), c.value.as_str()))
                    .collect();
                let src = KeySource::new(&values, self.max_array_index).with_cookies(cookies);
                convert(field.bind_keyed(&src, name, Conversion::Strict))
            }
        }
    }
}

/// Descriptor cache keyed by record type.
///
/// Cheap to clone; clones share the same cache. Registration takes the write
/// lock only to insert, every bind call takes the read lock to look up.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<TypeId, Arc<ParamsApi>>>>,
    config: BindConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(BindConfig::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Registry {
    pub fn new(config: BindConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Register `T` with the default options.
    pub fn register<T: Bindable>(&self) -> Result<Arc<ParamsApi>, RegistrationError> {
        self.register_with::<T>(RegisterOptions::default())
    }

    /// Register `T`, replacing any previous registration of the same type.
    pub fn register_with<T: Bindable>(
        &self,
        options: RegisterOptions,
    ) -> Result<Arc<ParamsApi>, RegistrationError> {
        self.insert(self.build::<T>(options, None)?)
    }

    /// Register `T` and capture each field's value in `template` as its
    /// documentation example.
    pub fn register_template<T: Bindable>(
        &self,
        template: &T,
        options: RegisterOptions,
    ) -> Result<Arc<ParamsApi>, RegistrationError> {
        self.insert(self.build::<T>(options, Some(template))?)
    }

    fn build<T: Bindable>(
        &self,
        options: RegisterOptions,
        template: Option<&T>,
    ) -> Result<ParamsApi, RegistrationError> {
        let shape = T::record_shape();
        let name: Arc<str> = Arc::from(shape.type_name);
        let built = build_params(&shape, &name, &options.name_mapper)?;

        let mut params = built.params;
        if let Some(template) = template {
            for param in &mut params {
                param.example = template
                    .field_ref(&param.field_path)
                    .map(|f| f.example_json())
                    .filter(|v| !v.is_null());
            }
        }

        let max_memory = built
            .max_mb
            .map(|mb| mb.saturating_mul(MB))
            .unwrap_or(self.config.default_max_memory);

        Ok(ParamsApi {
            name,
            type_id: TypeId::of::<T>(),
            params,
            body_decoder: options.body_decoder,
            max_memory: AtomicU64::new(max_memory),
            max_array_index: self.config.max_array_index,
        })
    }

    fn insert(&self, api: ParamsApi) -> Result<Arc<ParamsApi>, RegistrationError> {
        let api = Arc::new(api);
        let replaced = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(api.type_id, Arc::clone(&api))
            .is_some();
        info!(
            api = %api.name,
            params = api.number(),
            max_memory = api.max_memory(),
            replaced = replaced,
            "Params API registered"
        );
        Ok(api)
    }

    /// Schema of `T`, if registered
    pub fn get<T: 'static>(&self) -> Option<Arc<ParamsApi>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .map(Arc::clone)
    }

    /// Schema registered under a record type name
    pub fn get_by_name(&self, name: &str) -> Option<Arc<ParamsApi>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|api| api.name() == name)
            .map(Arc::clone)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bind a brand-new `T` from the request.
    pub fn bind_new<T: Bindable>(
        &self,
        req: &mut BindRequest,
        path_params: &PathParams,
    ) -> Result<T, BindError> {
        let api = self
            .get::<T>()
            .ok_or_else(|| BindError::not_registered(std::any::type_name::<T>()))?;
        let mut receiver = api.new_receiver::<T>()?;
        api.bind_fields(&mut receiver.handles(), req, path_params)?;
        Ok(receiver.into_inner())
    }

    /// Bind into a caller-owned `T`. Fields with no value in the request keep
    /// their current contents.
    pub fn bind_at<T: Bindable>(
        &self,
        dest: &mut T,
        req: &mut BindRequest,
        path_params: &PathParams,
    ) -> Result<(), BindError> {
        let api = self
            .get::<T>()
            .ok_or_else(|| BindError::not_registered(std::any::type_name::<T>()))?;
        api.bind_fields(&mut dest.field_handles(), req, path_params)
    }
}
