//! Governor for the root prototype's `__proto__` accessor.
//!
//! Every plain object inherits `__proto__` from `%Object.prototype%`, which
//! lets any code read or rebind an object's delegation link.  The governor
//! swaps that one descriptor for one of three replacements:
//!
//! - **Removal** (default): the property is deleted.  Assignments create an
//!   ordinary own data property instead of rebinding delegation.
//! - **Partial**: write-only.  The stock setter is kept verbatim, the getter
//!   always yields `undefined`.
//! - **Instrumented** (`deprecate`): get and set report to a tracer, then
//!   forward to the stock behavior.  Reports made while a tracer is already
//!   running are suppressed.
//!
//! Each `activate` fully supersedes the previous installation; `restore`
//! reinstalls the captured original.  Object initializers (`{ __proto__: x }`)
//! and `set_prototype_of` bypass the accessor and are never affected.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::object_model::{JsValue, ObjectError, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;

const COMPONENT: &str = "proto_guard";

// ---------------------------------------------------------------------------
// DescriptorSnapshot
// ---------------------------------------------------------------------------

/// The stock `__proto__` descriptor, captured once per realm before any
/// guard touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSnapshot {
    descriptor: PropertyDescriptor,
}

impl DescriptorSnapshot {
    pub(crate) fn capture(descriptor: PropertyDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    pub fn getter(&self) -> Option<ObjectHandle> {
        self.descriptor.getter()
    }

    pub fn setter(&self) -> Option<ObjectHandle> {
        self.descriptor.setter()
    }
}

// ---------------------------------------------------------------------------
// Modes, messages, tracer
// ---------------------------------------------------------------------------

/// Which replacement descriptor is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    Removal,
    Partial,
    Instrumented,
}

impl GuardMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Removal => "removal",
            Self::Partial => "partial",
            Self::Instrumented => "instrumented",
        }
    }
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed message handed to the tracer. Carries no object identity or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMessage {
    Getter,
    Setter,
}

impl TraceMessage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Getter => "__proto__ getter was called",
            Self::Setter => "__proto__ setter was called",
        }
    }
}

impl fmt::Display for TraceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type TraceFn = dyn Fn(&mut Realm, TraceMessage) -> Result<(), ObjectError>;

/// Callback notified on instrumented `__proto__` access.
///
/// The tracer receives the realm, so it may itself touch `__proto__`; those
/// nested accesses are forwarded but not reported again.  An `Err` aborts
/// the access that triggered the report.
#[derive(Clone)]
pub struct Tracer(Rc<TraceFn>);

impl Tracer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Realm, TraceMessage) -> Result<(), ObjectError> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn trace(&self, realm: &mut Realm, message: TraceMessage) -> Result<(), ObjectError> {
        (self.0)(realm, message)
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tracer(..)")
    }
}

// ---------------------------------------------------------------------------
// GuardConfig / GuardError
// ---------------------------------------------------------------------------

/// Options for [`activate`]. `partial` and `deprecate` are mutually
/// exclusive; with neither set the property is removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    pub partial: bool,
    pub deprecate: bool,
    /// Instrumented-mode tracer; `None` writes to the realm console.
    #[serde(skip)]
    pub tracer: Option<Tracer>,
}

impl GuardConfig {
    pub fn partial() -> Self {
        Self {
            partial: true,
            ..Self::default()
        }
    }

    pub fn deprecate() -> Self {
        Self {
            deprecate: true,
            ..Self::default()
        }
    }

    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Parse the boolean options from JSON, e.g. `{"deprecate": true}`.
    pub fn from_json(json: &str) -> Result<Self, GuardError> {
        serde_json::from_str(json).map_err(|err| GuardError::InvalidConfig {
            detail: err.to_string(),
        })
    }

    /// The mode this configuration selects.
    pub fn mode(&self) -> Result<GuardMode, GuardError> {
        match (self.partial, self.deprecate) {
            (true, true) => Err(GuardError::ConflictingModes),
            (true, false) => Ok(GuardMode::Partial),
            (false, true) => Ok(GuardMode::Instrumented),
            (false, false) => Ok(GuardMode::Removal),
        }
    }
}

/// Caller misuse of the governor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("option \"deprecate\" cannot be used with \"partial\"")]
    ConflictingModes,
    #[error("invalid guard config: {detail}")]
    InvalidConfig { detail: String },
}

impl GuardError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConflictingModes => "proto_guard_conflicting_modes",
            Self::InvalidConfig { .. } => "proto_guard_invalid_config",
        }
    }
}

// ---------------------------------------------------------------------------
// GuardEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardEventType {
    Activate,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardEventOutcome {
    Installed,
    Rejected,
    Restored,
}

/// Structured governor audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardEvent {
    pub trace_id: String,
    pub component: String,
    pub event: GuardEventType,
    pub outcome: GuardEventOutcome,
    pub error_code: Option<String>,
    pub from_mode: Option<GuardMode>,
    pub to_mode: Option<GuardMode>,
}

// ---------------------------------------------------------------------------
// Reentrancy counter
// ---------------------------------------------------------------------------

/// Depth of in-flight tracer reports. One per realm.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyCounter(Rc<Cell<u32>>);

impl ReentrancyCounter {
    pub fn depth(&self) -> u32 {
        self.0.get()
    }

    /// Increment now, decrement when the scope drops (including on early
    /// return or unwind).
    pub fn enter(&self) -> ReentrancyScope {
        let previous = self.0.get();
        self.0.set(previous + 1);
        ReentrancyScope {
            counter: Rc::clone(&self.0),
            outermost: previous == 0,
        }
    }
}

#[derive(Debug)]
pub struct ReentrancyScope {
    counter: Rc<Cell<u32>>,
    outermost: bool,
}

impl ReentrancyScope {
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for ReentrancyScope {
    fn drop(&mut self) {
        self.counter.set(self.counter.get().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// GuardState — per-realm governor bookkeeping
// ---------------------------------------------------------------------------

/// Per-realm governor bookkeeping. Replacement accessors are built on first
/// use and reused by every later activation, so reconfiguring never grows
/// the heap.
#[derive(Debug)]
pub(crate) struct GuardState {
    trace_id: String,
    installed: Option<GuardMode>,
    reentrancy: ReentrancyCounter,
    /// Tracer for the instrumented accessors; `None` means the console.
    tracer: Option<Tracer>,
    partial_getter: Option<ObjectHandle>,
    instrumented: Option<(ObjectHandle, ObjectHandle)>,
    events: Vec<GuardEvent>,
}

impl GuardState {
    pub(crate) fn new(trace_id: String) -> Self {
        Self {
            trace_id,
            installed: None,
            reentrancy: ReentrancyCounter::default(),
            tracer: None,
            partial_getter: None,
            instrumented: None,
            events: Vec::new(),
        }
    }

    fn push_event(
        &mut self,
        event: GuardEventType,
        outcome: GuardEventOutcome,
        error_code: Option<&str>,
        to_mode: Option<GuardMode>,
    ) {
        self.events.push(GuardEvent {
            trace_id: self.trace_id.clone(),
            component: COMPONENT.to_string(),
            event,
            outcome,
            error_code: error_code.map(str::to_string),
            from_mode: self.installed,
            to_mode,
        });
    }
}

// ---------------------------------------------------------------------------
// Governor entry points
// ---------------------------------------------------------------------------

/// Install the mode selected by `config`, superseding any earlier one.
///
/// Fails with [`GuardError::ConflictingModes`] when both `partial` and
/// `deprecate` are set; the root prototype is left untouched.
pub fn activate(realm: &mut Realm, config: GuardConfig) -> Result<(), GuardError> {
    let mode = match config.mode() {
        Ok(mode) => mode,
        Err(err) => {
            realm.guard_mut().push_event(
                GuardEventType::Activate,
                GuardEventOutcome::Rejected,
                Some(err.error_code()),
                None,
            );
            return Err(err);
        }
    };
    install_mode(realm, mode, config.tracer);
    Ok(())
}

/// Install `mode` directly. `tracer` is only consulted for
/// [`GuardMode::Instrumented`].
pub fn install_mode(realm: &mut Realm, mode: GuardMode, tracer: Option<Tracer>) {
    let descriptor = match mode {
        GuardMode::Removal => None,
        GuardMode::Partial => Some(partial_descriptor(realm)),
        GuardMode::Instrumented => Some(instrumented_descriptor(realm)),
    };
    swap_root_descriptor(realm, descriptor);
    let guard = realm.guard_mut();
    guard.tracer = match mode {
        GuardMode::Instrumented => tracer,
        GuardMode::Removal | GuardMode::Partial => None,
    };
    guard.push_event(
        GuardEventType::Activate,
        GuardEventOutcome::Installed,
        None,
        Some(mode),
    );
    guard.installed = Some(mode);
}

/// Reinstall the captured stock descriptor. Idempotent.
pub fn restore(realm: &mut Realm) {
    let original = realm.proto_snapshot().descriptor().clone();
    swap_root_descriptor(realm, Some(original));
    let guard = realm.guard_mut();
    guard.push_event(GuardEventType::Restore, GuardEventOutcome::Restored, None, None);
    guard.installed = None;
    guard.tracer = None;
}

impl Realm {
    /// Mode installed by the last `activate`, or `None` after `restore`.
    pub fn guard_mode(&self) -> Option<GuardMode> {
        self.guard().installed
    }

    pub fn guard_events(&self) -> &[GuardEvent] {
        &self.guard().events
    }

    pub fn drain_guard_events(&mut self) -> Vec<GuardEvent> {
        std::mem::take(&mut self.guard_mut().events)
    }

    /// Current reentrancy depth of instrumented reporting.
    pub fn guard_reentrancy_depth(&self) -> u32 {
        self.guard().reentrancy.depth()
    }
}

// ---------------------------------------------------------------------------
// Mode engines
// ---------------------------------------------------------------------------

fn swap_root_descriptor(realm: &mut Realm, descriptor: Option<PropertyDescriptor>) {
    let root = realm.object_prototype();
    realm
        .heap_mut()
        .swap_own_property(root, PropertyKey::proto(), descriptor);
}

/// Stock setter, getter that discloses nothing.
fn partial_descriptor(realm: &mut Realm) -> PropertyDescriptor {
    let getter = match realm.guard().partial_getter {
        Some(getter) => getter,
        None => {
            let getter = realm.create_native_function(
                "get __proto__",
                |_: &mut Realm, _: JsValue, _: &[JsValue]| Ok(JsValue::Undefined),
            );
            realm.guard_mut().partial_getter = Some(getter);
            getter
        }
    };
    PropertyDescriptor::builtin_accessor(Some(getter), realm.proto_snapshot().setter())
}

/// Report, then forward to the stock getter/setter.
fn instrumented_descriptor(realm: &mut Realm) -> PropertyDescriptor {
    if let Some((getter, setter)) = realm.guard().instrumented {
        return PropertyDescriptor::builtin_accessor(Some(getter), Some(setter));
    }
    let original_get = realm.proto_snapshot().getter();
    let original_set = realm.proto_snapshot().setter();

    let getter = realm.create_native_function(
        "get __proto__",
        move |realm: &mut Realm, this: JsValue, _: &[JsValue]| {
            report(realm, TraceMessage::Getter)?;
            forward(realm, original_get, this, &[])
        },
    );
    let setter = realm.create_native_function(
        "set __proto__",
        move |realm: &mut Realm, this: JsValue, args: &[JsValue]| {
            report(realm, TraceMessage::Setter)?;
            forward(realm, original_set, this, args)
        },
    );
    realm.guard_mut().instrumented = Some((getter, setter));
    PropertyDescriptor::builtin_accessor(Some(getter), Some(setter))
}

/// The tracer is looked up per access, so a later `activate` swaps it
/// without rebuilding the accessors.
fn report(realm: &mut Realm, message: TraceMessage) -> Result<(), ObjectError> {
    let scope = realm.guard().reentrancy.enter();
    if scope.is_outermost() {
        let tracer = realm.guard().tracer.clone();
        match tracer {
            Some(tracer) => tracer.trace(realm, message)?,
            None => realm.console_trace(message.as_str()),
        }
    }
    Ok(())
}

fn forward(
    realm: &mut Realm,
    original: Option<ObjectHandle>,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, ObjectError> {
    match original {
        Some(function) => realm.call(function, this, args),
        None => Ok(JsValue::Undefined),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::trace_sink::RecordingTraceSink;

    fn recording_tracer() -> (Tracer, Rc<RefCell<Vec<String>>>) {
        let traces = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&traces);
        let tracer = Tracer::new(move |_, message| {
            sink.borrow_mut().push(message.as_str().to_string());
            Ok(())
        });
        (tracer, traces)
    }

    fn root_proto_descriptor(realm: &Realm) -> Option<PropertyDescriptor> {
        realm
            .get_own_property_descriptor(realm.object_prototype(), "__proto__")
            .unwrap()
    }

    #[test]
    fn config_mode_selection() {
        assert_eq!(GuardConfig::default().mode(), Ok(GuardMode::Removal));
        assert_eq!(GuardConfig::partial().mode(), Ok(GuardMode::Partial));
        assert_eq!(GuardConfig::deprecate().mode(), Ok(GuardMode::Instrumented));
        let both = GuardConfig {
            partial: true,
            deprecate: true,
            tracer: None,
        };
        assert_eq!(both.mode(), Err(GuardError::ConflictingModes));
    }

    #[test]
    fn config_from_json() {
        let config = GuardConfig::from_json(r#"{"deprecate": true}"#).unwrap();
        assert!(config.deprecate);
        assert!(!config.partial);
        assert!(config.tracer.is_none());

        let empty = GuardConfig::from_json("{}").unwrap();
        assert_eq!(empty.mode(), Ok(GuardMode::Removal));

        let err = GuardConfig::from_json(r#"{"partail": true}"#).unwrap_err();
        assert_eq!(err.error_code(), "proto_guard_invalid_config");
    }

    #[test]
    fn error_codes_are_distinct() {
        let a = GuardError::ConflictingModes.error_code();
        let b = GuardError::InvalidConfig {
            detail: String::new(),
        }
        .error_code();
        assert_ne!(a, b);
        assert_eq!(
            GuardError::ConflictingModes.to_string(),
            "option \"deprecate\" cannot be used with \"partial\""
        );
    }

    #[test]
    fn trace_messages_are_fixed() {
        assert_eq!(TraceMessage::Getter.as_str(), "__proto__ getter was called");
        assert_eq!(TraceMessage::Setter.to_string(), "__proto__ setter was called");
    }

    #[test]
    fn reentrancy_scope_restores_depth() {
        let counter = ReentrancyCounter::default();
        {
            let outer = counter.enter();
            assert!(outer.is_outermost());
            {
                let inner = counter.enter();
                assert!(!inner.is_outermost());
                assert_eq!(counter.depth(), 2);
            }
            assert_eq!(counter.depth(), 1);
        }
        assert_eq!(counter.depth(), 0);
    }

    #[test]
    fn removal_deletes_root_descriptor() {
        let mut realm = Realm::new();
        activate(&mut realm, GuardConfig::default()).unwrap();
        assert_eq!(root_proto_descriptor(&realm), None);
        assert_eq!(realm.guard_mode(), Some(GuardMode::Removal));
    }

    #[test]
    fn partial_keeps_stock_setter_verbatim() {
        let mut realm = Realm::new();
        activate(&mut realm, GuardConfig::partial()).unwrap();
        let desc = root_proto_descriptor(&realm).unwrap();
        assert_eq!(desc.setter(), realm.proto_snapshot().setter());
        assert_ne!(desc.getter(), realm.proto_snapshot().getter());
        assert!(!desc.is_enumerable());
        assert!(desc.is_configurable());
    }

    #[test]
    fn conflicting_modes_leave_installation_untouched() {
        let mut realm = Realm::new();
        activate(&mut realm, GuardConfig::partial()).unwrap();
        let before = root_proto_descriptor(&realm);

        let both = GuardConfig {
            partial: true,
            deprecate: true,
            tracer: None,
        };
        assert_eq!(activate(&mut realm, both), Err(GuardError::ConflictingModes));
        assert_eq!(root_proto_descriptor(&realm), before);
        assert_eq!(realm.guard_mode(), Some(GuardMode::Partial));
    }

    #[test]
    fn instrumented_tracer_sees_get_set_get() {
        let mut realm = Realm::new();
        let (tracer, traces) = recording_tracer();
        activate(&mut realm, GuardConfig::deprecate().with_tracer(tracer)).unwrap();

        let obj = realm.new_object();
        let array_proto = realm.array_prototype();
        realm.get(obj, "__proto__").unwrap();
        realm.set(obj, "__proto__", JsValue::Object(array_proto)).unwrap();
        assert_eq!(realm.get(obj, "__proto__").unwrap(), JsValue::Object(array_proto));

        assert_eq!(
            *traces.borrow(),
            vec![
                "__proto__ getter was called",
                "__proto__ setter was called",
                "__proto__ getter was called",
            ]
        );
        assert_eq!(realm.guard_reentrancy_depth(), 0);
    }

    #[test]
    fn instrumented_default_tracer_writes_to_console() {
        let mut realm = Realm::new();
        let console = RecordingTraceSink::new();
        realm.set_console(Box::new(console.clone()));
        activate(&mut realm, GuardConfig::deprecate()).unwrap();

        let obj = realm.new_object();
        realm.get(obj, "__proto__").unwrap();
        assert_eq!(console.lines(), vec!["__proto__ getter was called".to_string()]);
    }

    #[test]
    fn failing_tracer_aborts_access_and_unwinds_counter() {
        let mut realm = Realm::new();
        let tracer = Tracer::new(|_, _| Err(ObjectError::Thrown("fail".to_string())));
        activate(&mut realm, GuardConfig::deprecate().with_tracer(tracer)).unwrap();

        let obj = realm.new_object();
        let array_proto = realm.array_prototype();
        assert_eq!(
            realm.set(obj, "__proto__", JsValue::Object(array_proto)),
            Err(ObjectError::Thrown("fail".to_string()))
        );
        assert_eq!(realm.guard_reentrancy_depth(), 0);
        assert!(!realm.instance_of(obj, array_proto).unwrap());
    }

    #[test]
    fn reactivation_reuses_accessor_objects() {
        let mut realm = Realm::new();
        activate(&mut realm, GuardConfig::deprecate()).unwrap();
        let instrumented = root_proto_descriptor(&realm);
        activate(&mut realm, GuardConfig::partial()).unwrap();
        let partial = root_proto_descriptor(&realm);
        restore(&mut realm);
        let heap_len = realm.heap().len();

        for _ in 0..100 {
            activate(&mut realm, GuardConfig::deprecate()).unwrap();
            assert_eq!(root_proto_descriptor(&realm), instrumented);
            activate(&mut realm, GuardConfig::partial()).unwrap();
            assert_eq!(root_proto_descriptor(&realm), partial);
            restore(&mut realm);
        }
        assert_eq!(realm.heap().len(), heap_len);
    }

    #[test]
    fn reactivation_replaces_tracer() {
        let mut realm = Realm::new();
        let console = RecordingTraceSink::new();
        realm.set_console(Box::new(console.clone()));
        let (first, first_traces) = recording_tracer();
        let (second, second_traces) = recording_tracer();
        let obj = realm.new_object();

        activate(&mut realm, GuardConfig::deprecate().with_tracer(first)).unwrap();
        realm.get(obj, "__proto__").unwrap();
        activate(&mut realm, GuardConfig::deprecate().with_tracer(second)).unwrap();
        realm.get(obj, "__proto__").unwrap();
        activate(&mut realm, GuardConfig::deprecate()).unwrap();
        realm.get(obj, "__proto__").unwrap();

        assert_eq!(first_traces.borrow().len(), 1);
        assert_eq!(second_traces.borrow().len(), 1);
        assert_eq!(console.lines(), vec!["__proto__ getter was called".to_string()]);
    }

    #[test]
    fn restore_reinstalls_snapshot_and_is_idempotent() {
        let mut realm = Realm::new();
        let original = root_proto_descriptor(&realm);

        restore(&mut realm);
        assert_eq!(root_proto_descriptor(&realm), original);

        activate(&mut realm, GuardConfig::deprecate()).unwrap();
        restore(&mut realm);
        restore(&mut realm);
        assert_eq!(root_proto_descriptor(&realm), original);
        assert_eq!(realm.guard_mode(), None);
    }

    #[test]
    fn events_record_lifecycle() {
        let mut realm = Realm::with_trace_id("trace-guard");
        activate(&mut realm, GuardConfig::default()).unwrap();
        let _ = activate(
            &mut realm,
            GuardConfig {
                partial: true,
                deprecate: true,
                tracer: None,
            },
        );
        activate(&mut realm, GuardConfig::partial()).unwrap();
        restore(&mut realm);

        let recorded = realm.drain_guard_events();
        assert_eq!(recorded.len(), 4);
        assert!(recorded.iter().all(|e| e.trace_id == "trace-guard"));
        assert!(recorded.iter().all(|e| e.component == "proto_guard"));

        assert_eq!(recorded[0].outcome, GuardEventOutcome::Installed);
        assert_eq!(recorded[0].from_mode, None);
        assert_eq!(recorded[0].to_mode, Some(GuardMode::Removal));

        assert_eq!(recorded[1].outcome, GuardEventOutcome::Rejected);
        assert_eq!(
            recorded[1].error_code.as_deref(),
            Some("proto_guard_conflicting_modes")
        );
        assert_eq!(recorded[1].from_mode, Some(GuardMode::Removal));

        assert_eq!(recorded[2].from_mode, Some(GuardMode::Removal));
        assert_eq!(recorded[2].to_mode, Some(GuardMode::Partial));

        assert_eq!(recorded[3].event, GuardEventType::Restore);
        assert_eq!(recorded[3].from_mode, Some(GuardMode::Partial));
        assert!(realm.guard_events().is_empty());

        let json = serde_json::to_value(&recorded[1]).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["from_mode"], "removal");
    }
}
