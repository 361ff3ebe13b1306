// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Calling host values: plain calls, constructor calls and method calls.

use eml_error::{kinds, Error, Result};

use crate::guest::Guest;
use crate::value::{FunctionKind, Value};

/// Call `func` with `this` and `args`.
///
/// Guest callbacks receive their arguments as a temporary array handle,
/// released once the callback returns.
pub fn call(guest: &mut dyn Guest, func: &Value, this: Value, args: &[Value]) -> Result<Value> {
    let Value::Function(function) = func else {
        return Err(kinds::not_a_function(&func.to_js_string()));
    };
    match function.kind() {
        FunctionKind::Native(native) => {
            let native = native.clone();
            native(guest, this, args)
        }
        FunctionKind::Guest(index) => {
            let index = *index;
            let argv = guest.realm().to_handle(Value::new_array(args.to_vec()));
            let result = guest.call_callback(index, argv);
            guest.realm().release(argv);
            let handle = result?;
            guest.realm().value(handle)
        }
    }
}

/// `new ctor(...args)`
pub fn construct(guest: &mut dyn Guest, ctor: &Value, args: &[Value]) -> Result<Value> {
    let Value::Function(function) = ctor else {
        return Err(Error::type_error(format!("{} is not a constructor", ctor.to_js_string())));
    };
    let object = Value::new_object_of(function.clone());
    let result = call(guest, ctor, object.clone(), args)?;
    Ok(if result.is_object_like() { result } else { object })
}

/// `target[key](...args)`
pub fn call_method(guest: &mut dyn Guest, target: &Value, key: &str, args: &[Value]) -> Result<Value> {
    let method = guest.realm().get_property(target, key)?;
    if method.as_function().is_none() {
        return Err(kinds::not_a_function(&format!("{}.{key}", target.type_of())));
    }
    call(guest, &method, target.clone(), args)
}
