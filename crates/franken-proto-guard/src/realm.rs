//! Realm: the heap, its intrinsics and the native-function table.
//!
//! A realm owns `%Object.prototype%`, the root prototype every plain object
//! delegates to.  On construction it installs the stock `__proto__` accessor
//! there and captures it once as the [`DescriptorSnapshot`] the guard
//! restores to.  Property access (`get`, `set`, `has_property`) runs
//! accessors through the native-function table, so whatever descriptor the
//! guard has installed is what every object observes.

use std::fmt;
use std::rc::Rc;

use crate::object_model::{
    JsValue, NativeId, ObjectError, ObjectHandle, ObjectHeap, PropertyDescriptor, PropertyKey,
};
use crate::proto_guard::{DescriptorSnapshot, GuardState};
use crate::trace_sink::{StderrTraceSink, TraceSink};

/// Native behavior invoked as `f(realm, this, args)`.
pub type NativeBehavior = Rc<dyn Fn(&mut Realm, JsValue, &[JsValue]) -> Result<JsValue, ObjectError>>;

/// Entry in the realm's native-function table.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    behavior: NativeBehavior,
}

impl NativeFunction {
    fn new<F>(name: impl Into<String>, behavior: F) -> Self
    where
        F: Fn(&mut Realm, JsValue, &[JsValue]) -> Result<JsValue, ObjectError> + 'static,
    {
        Self {
            name: name.into(),
            behavior: Rc::new(behavior),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Well-known intrinsic objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Intrinsics {
    object_prototype: ObjectHandle,
    function_prototype: ObjectHandle,
    array_prototype: ObjectHandle,
}

/// An execution context with its own root prototype.
#[derive(Debug)]
pub struct Realm {
    heap: ObjectHeap,
    natives: Vec<NativeFunction>,
    intrinsics: Intrinsics,
    console: Box<dyn TraceSink>,
    proto_snapshot: DescriptorSnapshot,
    guard: GuardState,
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Realm {
    pub fn new() -> Self {
        Self::with_trace_id("realm")
    }

    /// Create a realm whose guard events carry `trace_id`.
    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        let mut heap = ObjectHeap::new();
        let object_prototype = heap.alloc(None);
        let function_prototype = heap.alloc(Some(object_prototype));
        let array_prototype = heap.alloc(Some(object_prototype));

        let natives = vec![
            NativeFunction::new("get __proto__", proto_getter),
            NativeFunction::new("set __proto__", proto_setter),
        ];
        let getter = heap.alloc_function(Some(function_prototype), NativeId(0));
        let setter = heap.alloc_function(Some(function_prototype), NativeId(1));
        let original = PropertyDescriptor::builtin_accessor(Some(getter), Some(setter));
        heap.swap_own_property(object_prototype, PropertyKey::proto(), Some(original.clone()));

        Self {
            heap,
            natives,
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
                array_prototype,
            },
            console: Box::new(StderrTraceSink),
            proto_snapshot: DescriptorSnapshot::capture(original),
            guard: GuardState::new(trace_id.into()),
        }
    }

    /// Replace the console sink used by the default tracer.
    pub fn set_console(&mut self, sink: Box<dyn TraceSink>) {
        self.console = sink;
    }

    pub(crate) fn console_trace(&mut self, message: &str) {
        self.console.trace(message);
    }

    /// The root prototype (`%Object.prototype%`).
    pub fn object_prototype(&self) -> ObjectHandle {
        self.intrinsics.object_prototype
    }

    pub fn array_prototype(&self) -> ObjectHandle {
        self.intrinsics.array_prototype
    }

    pub fn function_prototype(&self) -> ObjectHandle {
        self.intrinsics.function_prototype
    }

    /// The `__proto__` descriptor as installed before any guard ran.
    pub fn proto_snapshot(&self) -> &DescriptorSnapshot {
        &self.proto_snapshot
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub(crate) fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    pub(crate) fn guard(&self) -> &GuardState {
        &self.guard
    }

    pub(crate) fn guard_mut(&mut self) -> &mut GuardState {
        &mut self.guard
    }

    // -- allocation ---------------------------------------------------------

    /// `{}`: a plain object delegating to the root prototype.
    pub fn new_object(&mut self) -> ObjectHandle {
        self.heap.alloc(Some(self.intrinsics.object_prototype))
    }

    /// Object initializer. A `__proto__: v` entry binds the delegation link
    /// directly when `v` is an object or null (non-objects are ignored); it
    /// never goes through the `__proto__` accessor.
    pub fn object_literal<K>(
        &mut self,
        entries: impl IntoIterator<Item = (K, JsValue)>,
    ) -> Result<ObjectHandle, ObjectError>
    where
        K: Into<PropertyKey>,
    {
        let obj = self.new_object();
        for (key, value) in entries {
            let key = key.into();
            if key == PropertyKey::proto() {
                match value {
                    JsValue::Object(proto) => {
                        self.heap.set_prototype_of(obj, Some(proto))?;
                    }
                    JsValue::Null => {
                        self.heap.set_prototype_of(obj, None)?;
                    }
                    _ => {}
                }
                continue;
            }
            self.heap
                .define_property(obj, key, PropertyDescriptor::data(value))?;
        }
        Ok(obj)
    }

    /// Register a native behavior and wrap it in a function object.
    pub fn create_native_function<F>(&mut self, name: impl Into<String>, behavior: F) -> ObjectHandle
    where
        F: Fn(&mut Realm, JsValue, &[JsValue]) -> Result<JsValue, ObjectError> + 'static,
    {
        let id = NativeId(self.natives.len() as u32);
        self.natives.push(NativeFunction::new(name, behavior));
        self.heap
            .alloc_function(Some(self.intrinsics.function_prototype), id)
    }

    pub fn native_name(&self, function: ObjectHandle) -> Option<&str> {
        let id = self.heap.get(function).ok()?.native?;
        self.natives.get(id.0 as usize).map(|n| n.name.as_str())
    }

    /// `[[Call]](F, this, args)`.
    pub fn call(
        &mut self,
        function: ObjectHandle,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, ObjectError> {
        let behavior = self
            .heap
            .get(function)?
            .native
            .and_then(|id| self.natives.get(id.0 as usize))
            .map(|native| Rc::clone(&native.behavior))
            .ok_or(ObjectError::NotCallable(function))?;
        behavior(self, this, args)
    }

    // -- property access ----------------------------------------------------

    /// `[[Get]](O, P, O)`: data values are returned, accessors invoke their
    /// getter with `obj` as the receiver.
    pub fn get(&mut self, obj: ObjectHandle, key: impl Into<PropertyKey>) -> Result<JsValue, ObjectError> {
        let key = key.into();
        match self.heap.find_property(obj, &key)? {
            Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
            Some((_, PropertyDescriptor::Accessor { get: Some(getter), .. })) => {
                self.call(getter, JsValue::Object(obj), &[])
            }
            Some((_, PropertyDescriptor::Accessor { get: None, .. })) | None => Ok(JsValue::Undefined),
        }
    }

    /// `[[Set]](O, P, V, O)` (OrdinarySet, §9.1.9). Returns `false` when the
    /// assignment is silently refused.
    pub fn set(
        &mut self,
        obj: ObjectHandle,
        key: impl Into<PropertyKey>,
        value: JsValue,
    ) -> Result<bool, ObjectError> {
        let key = key.into();
        match self.heap.find_property(obj, &key)? {
            Some((_, PropertyDescriptor::Accessor { set: Some(setter), .. })) => {
                self.call(setter, JsValue::Object(obj), &[value])?;
                Ok(true)
            }
            Some((_, PropertyDescriptor::Accessor { set: None, .. })) => Ok(false),
            Some((_, desc)) if !desc.is_writable() => Ok(false),
            Some((holder, _)) if holder == obj => {
                let own = self.heap.get_mut(obj)?;
                if let Some(PropertyDescriptor::Data { value: slot, .. }) = own.properties.get_mut(&key) {
                    *slot = value;
                }
                Ok(true)
            }
            _ => Ok(self
                .heap
                .get_mut(obj)?
                .define_own_property(key, PropertyDescriptor::data(value))),
        }
    }

    /// `P in O`.
    pub fn has_property(&self, obj: ObjectHandle, key: impl Into<PropertyKey>) -> Result<bool, ObjectError> {
        self.heap.has_property(obj, &key.into())
    }

    pub fn has_own_property(
        &self,
        obj: ObjectHandle,
        key: impl Into<PropertyKey>,
    ) -> Result<bool, ObjectError> {
        self.heap.has_own(obj, &key.into())
    }

    /// `delete O[P]`. `false` when the property is non-configurable.
    pub fn delete_property(
        &mut self,
        obj: ObjectHandle,
        key: impl Into<PropertyKey>,
    ) -> Result<bool, ObjectError> {
        self.heap.delete_property(obj, &key.into())
    }

    /// `Object.defineProperty`.
    pub fn define_property(
        &mut self,
        obj: ObjectHandle,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> Result<(), ObjectError> {
        self.heap.define_property(obj, key.into(), desc)
    }

    /// `Object.getOwnPropertyDescriptor`.
    pub fn get_own_property_descriptor(
        &self,
        obj: ObjectHandle,
        key: impl Into<PropertyKey>,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        self.heap.get_own_property_descriptor(obj, &key.into())
    }

    /// `Object.getPrototypeOf`.
    pub fn get_prototype_of(&self, obj: ObjectHandle) -> Result<Option<ObjectHandle>, ObjectError> {
        self.heap.get_prototype_of(obj)
    }

    /// `Object.setPrototypeOf`: the internal-slot path, independent of the
    /// `__proto__` accessor. `TypeError` when refused.
    pub fn set_prototype_of(
        &mut self,
        obj: ObjectHandle,
        proto: Option<ObjectHandle>,
    ) -> Result<(), ObjectError> {
        if self.heap.set_prototype_of(obj, proto)? {
            Ok(())
        } else {
            Err(ObjectError::TypeError(format!(
                "cannot set prototype of object#{obj}"
            )))
        }
    }

    pub fn prevent_extensions(&mut self, obj: ObjectHandle) -> Result<(), ObjectError> {
        self.heap.prevent_extensions(obj)
    }

    /// `obj instanceof C` where `prototype` is `C.prototype`.
    pub fn instance_of(&self, obj: ObjectHandle, prototype: ObjectHandle) -> Result<bool, ObjectError> {
        self.heap.is_prototype_in_chain(obj, prototype)
    }
}

// ---------------------------------------------------------------------------
// Stock `__proto__` accessor (Annex B.2.2.1)
// ---------------------------------------------------------------------------

fn proto_getter(realm: &mut Realm, this: JsValue, _args: &[JsValue]) -> Result<JsValue, ObjectError> {
    match this {
        JsValue::Object(obj) => Ok(JsValue::from_prototype(realm.heap.get_prototype_of(obj)?)),
        JsValue::Undefined | JsValue::Null => Err(ObjectError::TypeError(
            "Object.prototype.__proto__ getter called on null or undefined".to_string(),
        )),
        // Primitive wrappers are not modeled.
        _ => Ok(JsValue::Null),
    }
}

fn proto_setter(realm: &mut Realm, this: JsValue, args: &[JsValue]) -> Result<JsValue, ObjectError> {
    let proto = match args.first() {
        Some(JsValue::Object(p)) => Some(*p),
        Some(JsValue::Null) => None,
        _ => {
            return require_object_coercible(&this).map(|()| JsValue::Undefined);
        }
    };
    require_object_coercible(&this)?;
    let JsValue::Object(obj) = this else {
        return Ok(JsValue::Undefined);
    };
    if realm.heap.set_prototype_of(obj, proto)? {
        Ok(JsValue::Undefined)
    } else {
        Err(ObjectError::TypeError(format!(
            "Object.prototype.__proto__ setter failed for object#{obj}"
        )))
    }
}

fn require_object_coercible(this: &JsValue) -> Result<(), ObjectError> {
    match this {
        JsValue::Undefined | JsValue::Null => Err(ObjectError::TypeError(
            "Object.prototype.__proto__ setter called on null or undefined".to_string(),
        )),
        _ => Ok(()),
    }
}
