//! One-call presets for the three guard modes.
//!
//! Each preset is `activate` with the matching configuration and supersedes
//! whatever an earlier preset installed.

use crate::proto_guard::{self, GuardMode, Tracer};
use crate::realm::Realm;

/// Remove `__proto__` from the root prototype.
pub fn apply(realm: &mut Realm) {
    proto_guard::install_mode(realm, GuardMode::Removal, None);
}

/// Install the write-only `__proto__` accessor.
pub fn partial(realm: &mut Realm) {
    proto_guard::install_mode(realm, GuardMode::Partial, None);
}

/// Install the instrumented accessor, tracing to the realm console.
pub fn deprecate(realm: &mut Realm) {
    proto_guard::install_mode(realm, GuardMode::Instrumented, None);
}

/// Install the instrumented accessor with a caller-supplied tracer.
pub fn deprecate_with(realm: &mut Realm, tracer: Tracer) {
    proto_guard::install_mode(realm, GuardMode::Instrumented, Some(tracer));
}
