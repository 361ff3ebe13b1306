// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The `env` import table expected by emlite-built modules.
//!
//! Every function takes and returns core wasm32 values: handles, pointers
//! and sizes are `i32`, doubles are `f64`, booleans are `i32` 0/1.

use eml_error::{Error, Result};

use crate::callback::CallbackRegistry;
use crate::function::{FuncSignature, HostFunction, ValueType, WasmValue};
use crate::guest::Guest;
use crate::handle::{self, Handle};
use crate::interop;
use crate::value::{Function, Value};

/// Import module name of the emlite host functions
pub const ENV_MODULE: &str = "env";

const I32: ValueType = ValueType::I32;
const F64: ValueType = ValueType::F64;

fn handle_arg(args: &[WasmValue], index: usize) -> Result<Handle> {
    args.get(index)
        .and_then(WasmValue::as_u32)
        .ok_or_else(|| Error::invalid_argument(format!("expected i32 argument at position {index}")))
}

fn value_arg(guest: &mut dyn Guest, args: &[WasmValue], index: usize) -> Result<Value> {
    let handle = handle_arg(args, index)?;
    guest.realm().value(handle)
}

/// Property name passed as `(ptr, len)` starting at `index`
fn key_arg(guest: &mut dyn Guest, args: &[WasmValue], index: usize) -> Result<String> {
    let ptr = handle_arg(args, index)?;
    let len = handle_arg(args, index + 1)?;
    guest.read_str(ptr, len)
}

fn argv_arg(guest: &mut dyn Guest, args: &[WasmValue], index: usize) -> Result<Vec<Value>> {
    let argv = handle_arg(args, index)?;
    guest.realm().arguments(argv)
}

#[allow(clippy::cast_possible_wrap)]
fn ret_i32(value: u32) -> Vec<WasmValue> {
    vec![WasmValue::I32(value as i32)]
}

fn ret_value(guest: &mut dyn Guest, value: Value) -> Vec<WasmValue> {
    ret_i32(guest.realm().to_handle(value))
}

fn ret_bool(value: bool) -> Vec<WasmValue> {
    vec![WasmValue::I32(i32::from(value))]
}

fn register<F>(registry: &mut CallbackRegistry, name: &str, params: &[ValueType], results: &[ValueType], f: F)
where
    F: Fn(&mut dyn Guest, &[WasmValue]) -> Result<Vec<WasmValue>> + Send + Sync + Clone + 'static,
{
    registry.register_host_function(ENV_MODULE, name, HostFunction::new(FuncSignature::new(params, results), f));
}

fn register_constant(registry: &mut CallbackRegistry, name: &str, handle: Handle) {
    register(registry, name, &[], &[I32], move |_, _| Ok(ret_i32(handle)));
}

fn register_comparison(registry: &mut CallbackRegistry, name: &str, test: fn(&Value, &Value) -> bool) {
    register(registry, name, &[I32, I32], &[I32], move |guest, args| {
        let a = value_arg(guest, args, 0)?;
        let b = value_arg(guest, args, 1)?;
        Ok(ret_bool(test(&a, &b)))
    });
}

/// Register the full `env` import table on `registry`
pub fn register_env(registry: &mut CallbackRegistry) {
    register_constant(registry, "emlite_val_null", handle::NULL);
    register_constant(registry, "emlite_val_undefined", handle::UNDEFINED);
    register_constant(registry, "emlite_val_false", handle::FALSE);
    register_constant(registry, "emlite_val_true", handle::TRUE);
    register_constant(registry, "emlite_val_global_this", handle::GLOBAL_THIS);

    register(registry, "emlite_val_new_array", &[], &[I32], |guest, _| {
        Ok(ret_value(guest, Value::new_array(Vec::new())))
    });
    register(registry, "emlite_val_new_object", &[], &[I32], |guest, _| {
        Ok(ret_value(guest, Value::new_object()))
    });
    register(registry, "emlite_val_typeof", &[I32], &[I32], |guest, args| {
        let value = value_arg(guest, args, 0)?;
        Ok(ret_i32(guest.write_c_string(value.type_of())?))
    });
    register(registry, "emlite_val_construct_new", &[I32, I32], &[I32], |guest, args| {
        let ctor = value_arg(guest, args, 0)?;
        let argv = argv_arg(guest, args, 1)?;
        let result = interop::construct(guest, &ctor, &argv)?;
        Ok(ret_value(guest, result))
    });
    register(registry, "emlite_val_func_call", &[I32, I32], &[I32], |guest, args| {
        let func = value_arg(guest, args, 0)?;
        let argv = argv_arg(guest, args, 1)?;
        let result = interop::call(guest, &func, Value::Undefined, &argv)?;
        Ok(ret_value(guest, result))
    });
    register(registry, "emlite_val_push", &[I32, I32], &[], |guest, args| {
        let array = value_arg(guest, args, 0)?;
        let value = value_arg(guest, args, 1)?;
        guest.realm().push(&array, value)?;
        Ok(Vec::new())
    });

    register(registry, "emlite_val_make_int", &[I32], &[I32], |guest, args| {
        let value = args.first().and_then(WasmValue::as_i32).unwrap_or_default();
        Ok(ret_value(guest, Value::from(value)))
    });
    register(registry, "emlite_val_make_double", &[F64], &[I32], |guest, args| {
        let value = args.first().and_then(WasmValue::as_f64).unwrap_or_default();
        Ok(ret_value(guest, Value::from(value)))
    });
    register(registry, "emlite_val_make_str", &[I32, I32], &[I32], |guest, args| {
        let text = key_arg(guest, args, 0)?;
        Ok(ret_value(guest, Value::from(text)))
    });

    register(registry, "emlite_val_get_value_int", &[I32], &[I32], |guest, args| {
        let value = value_arg(guest, args, 0)?;
        Ok(vec![WasmValue::I32(value.to_int32())])
    });
    register(registry, "emlite_val_get_value_double", &[I32], &[F64], |guest, args| {
        let value = value_arg(guest, args, 0)?;
        Ok(vec![WasmValue::F64(value.to_number())])
    });
    register(registry, "emlite_val_get_value_string", &[I32], &[I32], |guest, args| {
        let value = value_arg(guest, args, 0)?;
        Ok(ret_i32(guest.write_c_string(&value.to_js_string())?))
    });
    register(registry, "emlite_val_get_elem", &[I32, I32], &[I32], |guest, args| {
        let array = value_arg(guest, args, 0)?;
        let index = handle_arg(args, 1)?;
        let element = guest.realm().get_property(&array, &index.to_string())?;
        Ok(ret_value(guest, element))
    });

    register(registry, "emlite_val_is_string", &[I32], &[I32], |guest, args| {
        Ok(ret_bool(matches!(value_arg(guest, args, 0)?, Value::String(_))))
    });
    register(registry, "emlite_val_is_number", &[I32], &[I32], |guest, args| {
        Ok(ret_bool(matches!(value_arg(guest, args, 0)?, Value::Number(_))))
    });
    register(registry, "emlite_val_not", &[I32], &[I32], |guest, args| {
        Ok(ret_bool(!value_arg(guest, args, 0)?.is_truthy()))
    });

    register_comparison(registry, "emlite_val_gt", |a, b| a.compare(b).is_some_and(|o| o.is_gt()));
    register_comparison(registry, "emlite_val_gte", |a, b| a.compare(b).is_some_and(|o| o.is_ge()));
    register_comparison(registry, "emlite_val_lt", |a, b| a.compare(b).is_some_and(|o| o.is_lt()));
    register_comparison(registry, "emlite_val_lte", |a, b| a.compare(b).is_some_and(|o| o.is_le()));
    register_comparison(registry, "emlite_val_equals", Value::loose_equals);
    register_comparison(registry, "emlite_val_strictly_equals", Value::strict_equals);
    register(registry, "emlite_val_instanceof", &[I32, I32], &[I32], |guest, args| {
        let value = value_arg(guest, args, 0)?;
        let ctor = value_arg(guest, args, 1)?;
        Ok(ret_bool(guest.realm().instance_of(&value, &ctor)?))
    });

    register(registry, "emlite_val_delete", &[I32], &[], |guest, args| {
        let handle = handle_arg(args, 0)?;
        guest.realm().release(handle);
        Ok(Vec::new())
    });
    register(registry, "emlite_val_throw", &[I32], &[], |guest, args| {
        let value = value_arg(guest, args, 0)?;
        Err(Error::host_thrown(value.to_js_string()))
    });

    register(registry, "emlite_val_obj_call", &[I32, I32, I32, I32], &[I32], |guest, args| {
        let target = value_arg(guest, args, 0)?;
        let key = key_arg(guest, args, 1)?;
        let argv = argv_arg(guest, args, 3)?;
        let result = interop::call_method(guest, &target, &key, &argv)?;
        Ok(ret_value(guest, result))
    });
    register(registry, "emlite_val_obj_prop", &[I32, I32, I32], &[I32], |guest, args| {
        let target = value_arg(guest, args, 0)?;
        let key = key_arg(guest, args, 1)?;
        let value = guest.realm().get_property(&target, &key)?;
        Ok(ret_value(guest, value))
    });
    register(registry, "emlite_val_obj_set_prop", &[I32, I32, I32, I32], &[], |guest, args| {
        let target = value_arg(guest, args, 0)?;
        let key = key_arg(guest, args, 1)?;
        let value = value_arg(guest, args, 3)?;
        guest.realm().set_property(&target, &key, value)?;
        Ok(Vec::new())
    });
    register(registry, "emlite_val_obj_has_prop", &[I32, I32, I32], &[I32], |guest, args| {
        let target = value_arg(guest, args, 0)?;
        let key = key_arg(guest, args, 1)?;
        Ok(ret_bool(guest.realm().has_property(&target, &key)?))
    });
    register(registry, "emlite_val_obj_has_own_prop", &[I32, I32, I32], &[I32], |guest, args| {
        let target = value_arg(guest, args, 0)?;
        let key = key_arg(guest, args, 1)?;
        Ok(ret_bool(guest.realm().has_own_property(&target, &key)?))
    });
    register(registry, "emlite_val_make_callback", &[I32], &[I32], |guest, args| {
        let index = handle_arg(args, 0)?;
        Ok(ret_value(guest, Value::from(Function::guest(index))))
    });

    register(registry, "emlite_malloc", &[I32], &[I32], |guest, args| {
        let size = handle_arg(args, 0)?;
        Ok(ret_i32(guest.alloc(size)?))
    });
    register(registry, "emlite_realloc", &[I32, I32], &[I32], |guest, args| {
        let ptr = handle_arg(args, 0)?;
        let size = handle_arg(args, 1)?;
        Ok(ret_i32(guest.realloc(ptr, size)?))
    });
    register(registry, "emlite_free", &[I32], &[], |guest, args| {
        let ptr = handle_arg(args, 0)?;
        guest.free(ptr)?;
        Ok(Vec::new())
    });
}
