//! # Schema-Driven Binding
//!
//! Registration walks a record's static shape once, checks the declarative
//! contract and stores an ordered descriptor list per type in a [`Registry`].
//! Every request afterwards binds a fresh receiver from those descriptors.
//!
//! ```text
//! #[derive(Bindable)] ──> RecordShape ──> build ──> ParamsApi ──> Registry
//!                                                        │
//!              BindRequest + PathParams ──> bind_new ────┘──> T
//! ```
//!
//! Record types describe themselves through the [`Bindable`] trait, which
//! `#[derive(Bindable)]` implements: the static field table plus index-path
//! accessors, so binding never needs runtime reflection.

mod build;
mod registry;
mod types;

pub use registry::{
    json_decoder, yaml_decoder, BodyDecoder, NameMapper, ParamsApi, Receiver, RegisterOptions,
    Registry,
};
pub use types::{
    FieldKind, FieldPath, FieldShape, ParamDescriptor, Position, RecordShape, ScalarKind,
    WireKind,
};

use crate::convert::{FieldValue, FromWire};

/// A record that can be registered and bound as a whole.
///
/// Implemented by `#[derive(Bindable)]`; writing it by hand is possible but
/// the four methods must agree on field order.
pub trait Bindable: FromWire {
    /// Static field table
    fn record_shape() -> RecordShape;

    /// Field reached by an index path (flattened records add one level).
    fn field_mut(&mut self, path: &[usize]) -> Option<&mut dyn FieldValue>;

    fn field_ref(&self, path: &[usize]) -> Option<&dyn FieldValue>;

    /// Every annotated leaf field, in descriptor order.
    fn field_handles(&mut self) -> Vec<&mut dyn FieldValue>;
}
