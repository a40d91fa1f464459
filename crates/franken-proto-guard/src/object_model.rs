//! Minimal ES object model hosting the governed `__proto__` accessor.
//!
//! Objects live in an arena (`ObjectHeap`) and reference each other through
//! `ObjectHandle`s.  Each ordinary object carries the two internal slots the
//! delegation machinery needs:
//!
//! - `[[Prototype]]`: the delegation link consulted by property lookup
//! - `[[Extensible]]`: whether new own properties (or a new prototype) may be
//!   installed
//!
//! Accessor descriptors point at callable function objects by handle, so two
//! descriptors are equal exactly when they install the same get/set
//! functions.  Invoking those functions needs the native-function table held
//! by [`crate::realm::Realm`]; the heap itself only stores plain data.
//!
//! `BTreeMap`/`BTreeSet` for deterministic ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Serialize/deserialize `BTreeMap<PropertyKey, PropertyDescriptor>` as a
/// sorted sequence of `[key, descriptor]` pairs.
mod properties_as_seq {
    use super::{BTreeMap, PropertyDescriptor, PropertyKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<PropertyKey, PropertyDescriptor>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&PropertyKey, &PropertyDescriptor)> = map.iter().collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<PropertyKey, PropertyDescriptor>, D::Error> {
        let pairs: Vec<(PropertyKey, PropertyDescriptor)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

/// Name of the governed accessor property.
pub const PROTO_KEY: &str = "__proto__";

/// Maximum prototype chain depth to prevent infinite loops.
const MAX_PROTOTYPE_CHAIN_DEPTH: u32 = 1024;

// ---------------------------------------------------------------------------
// PropertyKey
// ---------------------------------------------------------------------------

/// A string property key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyKey(pub String);

impl PropertyKey {
    /// The `__proto__` key.
    pub fn proto() -> Self {
        Self(PROTO_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// ObjectHandle / NativeId
// ---------------------------------------------------------------------------

/// Opaque handle referencing an object on the managed heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the realm's native-function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeId(pub u32);

// ---------------------------------------------------------------------------
// JsValue
// ---------------------------------------------------------------------------

/// Runtime value. Functions are objects with a native slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Object(ObjectHandle),
}

impl JsValue {
    /// Delegation-link view of `[[GetPrototypeOf]]` output.
    pub fn from_prototype(proto: Option<ObjectHandle>) -> Self {
        proto.map_or(Self::Null, Self::Object)
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Object(h) => write!(f, "[object#{}]", h.0),
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// ES property descriptor (§6.2.5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyDescriptor {
    /// Data descriptor: has `value` and `writable`.
    Data {
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    /// Accessor descriptor: `get`/`set` reference callable objects.
    Accessor {
        get: Option<ObjectHandle>,
        set: Option<ObjectHandle>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Create a default data descriptor (writable, enumerable, configurable).
    pub fn data(value: JsValue) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-enumerable, configurable accessor (the shape of built-in accessors).
    pub fn builtin_accessor(get: Option<ObjectHandle>, set: Option<ObjectHandle>) -> Self {
        Self::Accessor {
            get,
            set,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Get the value if this is a data descriptor.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    /// Getter handle, if this is an accessor with a getter.
    pub fn getter(&self) -> Option<ObjectHandle> {
        match self {
            Self::Accessor { get, .. } => *get,
            Self::Data { .. } => None,
        }
    }

    /// Setter handle, if this is an accessor with a setter.
    pub fn setter(&self) -> Option<ObjectHandle> {
        match self {
            Self::Accessor { set, .. } => *set,
            Self::Data { .. } => None,
        }
    }

    /// Make this descriptor non-configurable.
    pub fn set_non_configurable(&mut self) {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => {
                *configurable = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectError
// ---------------------------------------------------------------------------

/// Errors from object model operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ObjectError {
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("object#{0} not found")]
    ObjectNotFound(ObjectHandle),
    #[error("TypeError: object#{0} is not callable")]
    NotCallable(ObjectHandle),
    #[error("TypeError: prototype chain cycle detected")]
    PrototypeCycleDetected,
    #[error("TypeError: prototype chain depth {depth} exceeds max {max}")]
    PrototypeChainTooDeep { depth: u32, max: u32 },
    /// Raised by host code (e.g. a tracer) and propagated unchanged.
    #[error("uncaught: {0}")]
    Thrown(String),
}

impl ObjectError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TypeError(_) => "object_type_error",
            Self::ObjectNotFound(_) => "object_not_found",
            Self::NotCallable(_) => "object_not_callable",
            Self::PrototypeCycleDetected => "object_prototype_cycle",
            Self::PrototypeChainTooDeep { .. } => "object_prototype_chain_too_deep",
            Self::Thrown(_) => "object_thrown",
        }
    }
}

// ---------------------------------------------------------------------------
// OrdinaryObject
// ---------------------------------------------------------------------------

/// An ordinary object with internal slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinaryObject {
    /// `[[Prototype]]` internal slot (None means end of chain).
    pub prototype: Option<ObjectHandle>,
    /// `[[Extensible]]` internal slot.
    pub extensible: bool,
    /// Own properties with descriptors.
    #[serde(with = "properties_as_seq")]
    pub properties: BTreeMap<PropertyKey, PropertyDescriptor>,
    /// Native behavior for function objects.
    pub native: Option<NativeId>,
}

impl Default for OrdinaryObject {
    fn default() -> Self {
        Self {
            prototype: None,
            extensible: true,
            properties: BTreeMap::new(),
            native: None,
        }
    }
}

impl OrdinaryObject {
    pub fn with_prototype(proto: Option<ObjectHandle>) -> Self {
        Self {
            prototype: proto,
            ..Self::default()
        }
    }

    /// `[[GetOwnProperty]](P)`.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// `[[DefineOwnProperty]](P, Desc)` (§9.1.6).
    ///
    /// Returns `false` when the definition is rejected: a new property on a
    /// non-extensible object, or an incompatible change to a
    /// non-configurable one.
    pub fn define_own_property(&mut self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        match self.properties.get(&key) {
            Some(current) if !current.is_configurable() => {
                let compatible = !desc.is_configurable()
                    && desc.is_enumerable() == current.is_enumerable()
                    && match (current, &desc) {
                        (
                            PropertyDescriptor::Data {
                                value: cur_v,
                                writable: cur_w,
                                ..
                            },
                            PropertyDescriptor::Data {
                                value: new_v,
                                writable: new_w,
                                ..
                            },
                        ) => *cur_w || (!new_w && cur_v == new_v),
                        (
                            PropertyDescriptor::Accessor {
                                get: cur_get,
                                set: cur_set,
                                ..
                            },
                            PropertyDescriptor::Accessor {
                                get: new_get,
                                set: new_set,
                                ..
                            },
                        ) => cur_get == new_get && cur_set == new_set,
                        _ => false,
                    };
                if !compatible {
                    return false;
                }
            }
            Some(_) => {}
            None if !self.extensible => return false,
            None => {}
        }
        self.properties.insert(key, desc);
        true
    }

    /// `[[Delete]](P)`. Returns `false` if non-configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.properties.get(key) {
            Some(desc) if !desc.is_configurable() => false,
            Some(_) => {
                self.properties.remove(key);
                true
            }
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectHeap
// ---------------------------------------------------------------------------

/// The object heap: arena of ordinary objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectHeap {
    objects: Vec<OrdinaryObject>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new ordinary object with the given prototype.
    pub fn alloc(&mut self, proto: Option<ObjectHandle>) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(OrdinaryObject::with_prototype(proto));
        handle
    }

    /// Allocate a callable object bound to a native-function slot.
    pub fn alloc_function(&mut self, proto: Option<ObjectHandle>, native: NativeId) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(OrdinaryObject {
            native: Some(native),
            ..OrdinaryObject::with_prototype(proto)
        });
        handle
    }

    pub fn get(&self, handle: ObjectHandle) -> Result<&OrdinaryObject, ObjectError> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut OrdinaryObject, ObjectError> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Walk the prototype chain starting at `handle` (inclusive), calling
    /// `visit` on each object until it returns `Some`.
    fn walk_chain<T>(
        &self,
        handle: ObjectHandle,
        mut visit: impl FnMut(ObjectHandle, &OrdinaryObject) -> Option<T>,
    ) -> Result<Option<T>, ObjectError> {
        let mut current = Some(handle);
        let mut depth: u32 = 0;
        let mut visited = BTreeSet::new();

        while let Some(h) = current {
            if depth > MAX_PROTOTYPE_CHAIN_DEPTH {
                return Err(ObjectError::PrototypeChainTooDeep {
                    depth,
                    max: MAX_PROTOTYPE_CHAIN_DEPTH,
                });
            }
            if !visited.insert(h) {
                return Err(ObjectError::PrototypeCycleDetected);
            }
            let obj = self.get(h)?;
            if let Some(found) = visit(h, obj) {
                return Ok(Some(found));
            }
            current = obj.prototype;
            depth += 1;
        }
        Ok(None)
    }

    /// First descriptor for `key` on the chain, with the object holding it.
    pub fn find_property(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<(ObjectHandle, PropertyDescriptor)>, ObjectError> {
        self.walk_chain(handle, |h, obj| {
            obj.get_own_property(key).map(|desc| (h, desc.clone()))
        })
    }

    /// `[[HasProperty]](O, P)` — walks the prototype chain.
    pub fn has_property(&self, handle: ObjectHandle, key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(self
            .walk_chain(handle, |_, obj| obj.has_own_property(key).then_some(()))?
            .is_some())
    }

    pub fn has_own(&self, handle: ObjectHandle, key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(self.get(handle)?.has_own_property(key))
    }

    /// Is `proto` somewhere on the chain above `handle` (`instanceof` core)?
    pub fn is_prototype_in_chain(
        &self,
        handle: ObjectHandle,
        proto: ObjectHandle,
    ) -> Result<bool, ObjectError> {
        let Some(start) = self.get(handle)?.prototype else {
            return Ok(false);
        };
        Ok(self
            .walk_chain(start, |h, _| (h == proto).then_some(()))?
            .is_some())
    }

    /// `[[GetPrototypeOf]]()`.
    pub fn get_prototype_of(&self, handle: ObjectHandle) -> Result<Option<ObjectHandle>, ObjectError> {
        Ok(self.get(handle)?.prototype)
    }

    /// `[[SetPrototypeOf]](V)` (§9.1.2). `Ok(false)` when refused.
    pub fn set_prototype_of(
        &mut self,
        handle: ObjectHandle,
        proto: Option<ObjectHandle>,
    ) -> Result<bool, ObjectError> {
        let obj = self.get(handle)?;
        if obj.prototype == proto {
            return Ok(true);
        }
        if !obj.extensible {
            return Ok(false);
        }
        if let Some(p) = proto {
            let closes_cycle = self
                .walk_chain(p, |h, _| (h == handle).then_some(()))?
                .is_some();
            if closes_cycle {
                return Ok(false);
            }
        }
        self.get_mut(handle)?.prototype = proto;
        Ok(true)
    }

    pub fn prevent_extensions(&mut self, handle: ObjectHandle) -> Result<(), ObjectError> {
        self.get_mut(handle)?.extensible = false;
        Ok(())
    }

    /// `Object.defineProperty(O, P, Desc)` — `TypeError` when rejected.
    pub fn define_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<(), ObjectError> {
        let obj = self.get_mut(handle)?;
        let name = key.to_string();
        if obj.define_own_property(key, desc) {
            Ok(())
        } else {
            Err(ObjectError::TypeError(format!("cannot redefine property: {name}")))
        }
    }

    /// `[[Delete]](O, P)`.
    pub fn delete_property(&mut self, handle: ObjectHandle, key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(self.get_mut(handle)?.delete(key))
    }

    pub fn get_own_property_descriptor(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        Ok(self.get(handle)?.get_own_property(key).cloned())
    }

    /// Replace (or with `None`, remove) an own property slot without the
    /// configurability checks of `define_property`. Returns the previous
    /// descriptor. Unknown handles are a no-op.
    pub fn swap_own_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        desc: Option<PropertyDescriptor>,
    ) -> Option<PropertyDescriptor> {
        let obj = self.objects.get_mut(handle.0 as usize)?;
        match desc {
            Some(desc) => obj.properties.insert(key, desc),
            None => obj.properties.remove(&key),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
