#![forbid(unsafe_code)]
//! `__proto__` governance for a prototype-based object model.
//!
//! A [`Realm`] owns the root prototype and its stock `__proto__` accessor.
//! [`activate`] swaps that accessor for a removal, write-only or traced
//! replacement; [`restore`] puts the original back.

pub mod activations;
pub mod object_model;
pub mod proto_guard;
pub mod realm;
pub mod trace_sink;

pub use object_model::{JsValue, ObjectError, ObjectHandle, PropertyDescriptor, PropertyKey};
pub use proto_guard::{
    GuardConfig, GuardError, GuardEvent, GuardMode, TraceMessage, Tracer, activate, restore,
};
pub use realm::Realm;
