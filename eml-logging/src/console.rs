//! The `console` global.

use eml_host::{CallbackRegistry, Function, Realm, Value};

use crate::handler::LoggingExt;
use crate::level::LogLevel;
use crate::operation::LogOperation;

const METHODS: [(&str, LogLevel); 6] = [
    ("log", LogLevel::Info),
    ("info", LogLevel::Info),
    ("debug", LogLevel::Debug),
    ("trace", LogLevel::Trace),
    ("warn", LogLevel::Warn),
    ("error", LogLevel::Error),
];

/// Define `console` on the realm's global object.
///
/// Each method joins its arguments with spaces and hands the line to the
/// log handler of the registry the realm was created from.
pub fn install_console(realm: &mut Realm) {
    let console = Value::new_object();
    for (name, level) in METHODS {
        let method = Function::native(name, move |guest, _, args| {
            let message = args.iter().map(Value::to_js_string).collect::<Vec<_>>().join(" ");
            let realm = guest.realm();
            let operation = match realm.label() {
                Some(source) => LogOperation::with_source(level, message, source),
                None => LogOperation::new(level, message),
            };
            realm.callbacks().handle_log(operation);
            Ok(Value::Undefined)
        });
        // Setting a property on a fresh object cannot fail.
        let _ = realm.set_property(&console, name, Value::from(method));
    }
    realm.define_global("console", console);
}

/// Install `console` on every realm created from `registry`
pub fn register_console(registry: &mut CallbackRegistry) {
    registry.add_realm_setup(install_console);
}
