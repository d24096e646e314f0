//! # parambind
//!
//! **parambind** binds HTTP request parameters into typed Rust records and
//! validates them, driven entirely by declarative per-field annotations.
//!
//! ## Overview
//!
//! A record declares, per field, where its value comes from (path, query,
//! form, body, header or cookie) and which constraints it must satisfy. The
//! record is registered once at start-up; every request then binds a fresh
//! instance in one pass, or fails with a precise first-failure error.
//!
//! ```rust,ignore
//! use parambind::{Bindable, BindRequest, PathParams, Registry};
//!
//! #[derive(Debug, Default, Bindable)]
//! pub struct CreateUser {
//!     #[param("<in:path> <name:org>")]
//!     pub org: String,
//!     #[param("<in:formData> <required> <len:3:32>")]
//!     #[regexp("[a-z][a-z0-9_]*")]
//!     pub login: String,
//!     #[param("<in:formData> <range:13:130>")]
//!     #[err("age must be between 13 and 130")]
//!     pub age: u8,
//!     #[param("<in:header> <name:x-request-id>")]
//!     pub request_id: String,
//! }
//!
//! let registry = Registry::default();
//! registry.register::<CreateUser>()?;
//!
//! let user: CreateUser = registry.bind_new(&mut request, &path_params)?;
//! ```
//!
//! ## Architecture
//!
//! - **[`tags`]** - annotation grammar (`<key:value>` tokens)
//! - **[`schema`]** - descriptor registry and whole-record binding
//! - **[`convert`]** - wire value conversion (scalars, arrays, maps, records)
//! - **[`validator`]** - `range`, `nonzero`, `len` and `regexp` constraints
//! - **[`request`]** - the request view binders read from
//! - **[`adhoc`]** - lenient single-key binding
//! - **[`error`]** - registration and per-request error types
//! - **[`runtime_config`]** / **[`logging`]** - limits and tracing setup
//!
//! ### Binding Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Registry
//!     participant Api as ParamsApi
//!     participant Req as BindRequest
//!     participant Conv as FromWire
//!     participant Val as Validator
//!
//!     App->>Registry: register::<T>()
//!     Registry->>Registry: T::record_shape() -> descriptors
//!     App->>Registry: bind_new::<T>(req, path_params)
//!     Registry->>Api: new_receiver::<T>()
//!     loop each descriptor
//!         Api->>Req: values for position
//!         Req-->>Api: query / form / header / cookie / body
//!         Api->>Conv: bind_keyed (strict)
//!         Api->>Val: validate
//!     end
//!     Api-->>App: T or BindError
//! ```
//!
//! ## Two Binding Strategies
//!
//! Schema binding ([`Registry::bind_new`]) is strict: a present but
//! malformed value is an error. Ad-hoc binding ([`BindRequest::bind_one`]) is
//! lenient: malformed scalars fall back to their zero value. Both share the
//! same conversion code and differ only in [`Conversion`].
//!
//! ## Concurrency
//!
//! The [`Registry`] is the only shared state. Lookups take a read lock and
//! run in parallel; registration takes the write lock only to insert. All
//! per-request state lives in the request's own [`BindRequest`] and receiver.

extern crate self as parambind;

pub mod adhoc;
pub mod cli;
pub mod convert;
pub mod error;
pub mod form;
pub mod logging;
pub mod request;
pub mod runtime_config;
pub mod schema;
pub mod tags;
pub mod validator;

pub use adhoc::AdHocBinder;
pub use convert::{
    bind_record_field, Body, Conversion, Cookie, FieldValue, FromWire, Inspect, RawBytes,
    UploadedFile,
};
pub use error::{
    BindError, BindErrorKind, ConvertError, RegistrationError, ValidationError, ViolationKind,
};
pub use form::{FormValues, KeySource};
pub use parambind_macros::Bindable;
pub use request::{BindRequest, MultipartForm, PathParams};
pub use runtime_config::BindConfig;
pub use schema::{
    Bindable, FieldKind, FieldShape, ParamDescriptor, ParamsApi, Position, Receiver, RecordShape,
    RegisterOptions, Registry, WireKind,
};

#[doc(hidden)]
pub mod __private {
    pub use crate::convert::bind_record_field;
    pub use serde_json::{Map, Value};
}
