//! Tests for the `env` import table driven through a byte-vector guest

use std::sync::Arc;

use eml_host::handle::{FALSE, GLOBAL_THIS, NULL, TRUE, UNDEFINED};
use eml_host::prelude::*;
use eml_host::testing::MemoryGuest;
use eml_host::{register_env, ENV_MODULE};

struct Env {
    registry: Arc<CallbackRegistry>,
    guest:    MemoryGuest,
}

impl Env {
    fn new() -> Self {
        let mut registry = CallbackRegistry::new();
        register_env(&mut registry);
        let registry = Arc::new(registry);
        let guest = MemoryGuest::with_registry(registry.clone());
        Self { registry, guest }
    }

    fn call(&mut self, name: &str, args: &[WasmValue]) -> Result<Vec<WasmValue>> {
        self.registry.call_host_function(&mut self.guest, ENV_MODULE, name, args)
    }

    fn handle(&mut self, name: &str, args: &[u32]) -> u32 {
        let args: Vec<WasmValue> = args.iter().map(|&a| WasmValue::I32(a as i32)).collect();
        let result = self.call(name, &args).unwrap();
        result[0].as_u32().unwrap()
    }

    fn handle_void(&mut self, name: &str, args: &[u32]) {
        let args: Vec<WasmValue> = args.iter().map(|&a| WasmValue::I32(a as i32)).collect();
        assert!(self.call(name, &args).unwrap().is_empty());
    }

    fn string(&mut self, text: &str) -> u32 {
        let (ptr, len) = self.guest.put_str(text).unwrap();
        self.handle("emlite_val_make_str", &[ptr, len])
    }

    fn prop(&mut self, target: u32, key: &str) -> u32 {
        let (ptr, len) = self.guest.put_str(key).unwrap();
        self.handle("emlite_val_obj_prop", &[target, ptr, len])
    }

    fn read_string(&mut self, handle: u32) -> String {
        let ptr = self.handle("emlite_val_get_value_string", &[handle]);
        self.guest.c_string_at(ptr).unwrap()
    }

    fn value(&mut self, handle: u32) -> Value {
        self.guest.realm().value(handle).unwrap()
    }
}

#[test]
fn test_reserved_handles() {
    let mut env = Env::new();
    assert_eq!(env.handle("emlite_val_null", &[]), NULL);
    assert_eq!(env.handle("emlite_val_undefined", &[]), UNDEFINED);
    assert_eq!(env.handle("emlite_val_false", &[]), FALSE);
    assert_eq!(env.handle("emlite_val_true", &[]), TRUE);
    assert_eq!(env.handle("emlite_val_global_this", &[]), GLOBAL_THIS);

    let global = env.prop(GLOBAL_THIS, "globalThis");
    assert_eq!(global, GLOBAL_THIS);

    env.handle_void("emlite_val_delete", &[GLOBAL_THIS]);
    assert_eq!(env.read_string(GLOBAL_THIS), "[object Object]");
}

#[test]
fn test_strings_round_trip_through_memory() {
    let mut env = Env::new();
    let hello = env.string("héllo wörld");
    assert_eq!(env.handle("emlite_val_is_string", &[hello]), 1);
    assert_eq!(env.read_string(hello), "héllo wörld");

    let kind = env.handle("emlite_val_typeof", &[hello]);
    assert_eq!(env.guest.c_string_at(kind).unwrap(), "string");
}

#[test]
fn test_numbers() {
    let mut env = Env::new();
    let result = env.call("emlite_val_make_double", &[WasmValue::F64(2.5)]).unwrap();
    let n = result[0].as_u32().unwrap();
    assert_eq!(env.handle("emlite_val_is_number", &[n]), 1);
    assert_eq!(env.handle("emlite_val_get_value_int", &[n]), 2);
    assert_eq!(env.read_string(n), "2.5");

    let minus_one = env.call("emlite_val_make_int", &[WasmValue::I32(-1)]).unwrap();
    let minus_one = minus_one[0].as_u32().unwrap();
    let double = env.call("emlite_val_get_value_double", &[WasmValue::I32(minus_one as i32)]).unwrap();
    assert_eq!(double, vec![WasmValue::F64(-1.0)]);
}

#[test]
fn test_arrays_and_calls() {
    let mut env = Env::new();
    let array = env.handle("emlite_val_new_array", &[]);
    let one = env.handle("emlite_val_make_int", &[1]);
    let two = env.string("two");
    env.handle_void("emlite_val_push", &[array, one]);
    env.handle_void("emlite_val_push", &[array, two]);

    let elem = env.handle("emlite_val_get_elem", &[array, 1]);
    assert_eq!(env.read_string(elem), "two");
    let missing = env.handle("emlite_val_get_elem", &[array, 9]);
    assert_eq!(missing, UNDEFINED);

    let separator = env.string("+");
    let argv = env.handle("emlite_val_new_array", &[]);
    env.handle_void("emlite_val_push", &[argv, separator]);
    let (ptr, len) = env.guest.put_str("join").unwrap();
    let joined = env.handle("emlite_val_obj_call", &[array, ptr, len, argv]);
    assert_eq!(env.read_string(joined), "1+two");
}

#[test]
fn test_objects() {
    let mut env = Env::new();
    let object = env.handle("emlite_val_new_object", &[]);
    let value = env.handle("emlite_val_make_int", &[42]);
    let (ptr, len) = env.guest.put_str("answer").unwrap();
    env.handle_void("emlite_val_obj_set_prop", &[object, ptr, len, value]);

    assert_eq!(env.handle("emlite_val_obj_has_prop", &[object, ptr, len]), 1);
    assert_eq!(env.handle("emlite_val_obj_has_own_prop", &[object, ptr, len]), 1);
    let read = env.prop(object, "answer");
    assert_eq!(env.handle("emlite_val_get_value_int", &[read]), 42);

    let absent = env.prop(object, "question");
    assert_eq!(absent, UNDEFINED);
}

#[test]
fn test_construct_and_instanceof() {
    let mut env = Env::new();
    let ctor = env.prop(GLOBAL_THIS, "TypeError");
    let message = env.string("bad input");
    let argv = env.handle("emlite_val_new_array", &[]);
    env.handle_void("emlite_val_push", &[argv, message]);

    let error = env.handle("emlite_val_construct_new", &[ctor, argv]);
    assert_eq!(env.read_string(error), "TypeError: bad input");
    let error_ctor = env.prop(GLOBAL_THIS, "Error");
    assert_eq!(env.handle("emlite_val_instanceof", &[error, error_ctor]), 1);
    let array_ctor = env.prop(GLOBAL_THIS, "Array");
    assert_eq!(env.handle("emlite_val_instanceof", &[error, array_ctor]), 0);
}

#[test]
fn test_comparisons() {
    let mut env = Env::new();
    let one = env.handle("emlite_val_make_int", &[1]);
    let one_str = env.string("1");
    let two = env.handle("emlite_val_make_int", &[2]);

    assert_eq!(env.handle("emlite_val_equals", &[one, one_str]), 1);
    assert_eq!(env.handle("emlite_val_strictly_equals", &[one, one_str]), 0);
    assert_eq!(env.handle("emlite_val_lt", &[one, two]), 1);
    assert_eq!(env.handle("emlite_val_gte", &[one, two]), 0);
    assert_eq!(env.handle("emlite_val_lte", &[one, one_str]), 1);
    assert_eq!(env.handle("emlite_val_not", &[NULL]), 1);
    assert_eq!(env.handle("emlite_val_not", &[one]), 0);
}

#[test]
fn test_callbacks_receive_arguments() {
    let mut env = Env::new();
    env.guest.register_callback(3, |realm, args| {
        let total: f64 = args.iter().map(Value::to_number).sum();
        Ok(realm.to_handle(Value::from(total * 10.0)))
    });

    let callback = env.handle("emlite_val_make_callback", &[3]);
    let argv = env.handle("emlite_val_new_array", &[]);
    let four = env.handle("emlite_val_make_int", &[4]);
    env.handle_void("emlite_val_push", &[argv, four]);

    let result = env.handle("emlite_val_func_call", &[callback, argv]);
    assert_eq!(env.value(result).to_number(), 40.0);

    let no_args = env.handle("emlite_val_func_call", &[callback, NULL]);
    assert_eq!(env.value(no_args).to_number(), 0.0);
}

#[test]
fn test_oversized_array_writes_fail_without_growing() {
    let mut env = Env::new();
    let array = env.handle("emlite_val_new_array", &[]);
    let one = env.handle("emlite_val_make_int", &[1]);
    let huge = env.call("emlite_val_make_double", &[WasmValue::F64(1e9)]).unwrap();
    let huge = huge[0].as_u32().unwrap();
    for (key, value) in [("4000000000", one), ("length", huge)] {
        let (ptr, len) = env.guest.put_str(key).unwrap();
        let args = [array, ptr, len, value].map(|a| WasmValue::I32(a as i32));
        let err = env.call("emlite_val_obj_set_prop", &args).unwrap_err();
        assert!(err.is_resource_error());
        assert_eq!(err.code, codes::RESOURCE_LIMIT_EXCEEDED);
    }
    let length = env.prop(array, "length");
    assert_eq!(env.handle("emlite_val_get_value_int", &[length]), 0);
}

#[test]
fn test_thrown_values_become_traps() {
    let mut env = Env::new();
    let message = env.string("boom");
    let err = env.call("emlite_val_throw", &[WasmValue::I32(message as i32)]).unwrap_err();
    assert!(err.is_runtime_trap());
    assert_eq!(err.code, codes::HOST_THROWN);
    assert_eq!(err.message, "boom");
}

#[test]
fn test_type_errors() {
    let mut env = Env::new();
    let (ptr, len) = env.guest.put_str("x").unwrap();
    let args = [WasmValue::I32(UNDEFINED as i32), WasmValue::I32(ptr as i32), WasmValue::I32(len as i32)];
    let err = env.call("emlite_val_obj_prop", &args).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(err.message, "Cannot read properties of undefined (reading 'x')");

    let number = env.handle("emlite_val_make_int", &[5]);
    let err = env
        .call("emlite_val_func_call", &[WasmValue::I32(number as i32), WasmValue::I32(NULL as i32)])
        .unwrap_err();
    assert_eq!(err.message, "5 is not a function");

    let err = env.call("emlite_val_get_value_int", &[WasmValue::I32(12345)]).unwrap_err();
    assert_eq!(err.code, codes::INVALID_HANDLE);
}

#[test]
fn test_handles_are_recycled() {
    let mut env = Env::new();
    let a = env.handle("emlite_val_new_object", &[]);
    env.handle_void("emlite_val_delete", &[a]);
    let b = env.handle("emlite_val_new_object", &[]);
    assert_eq!(a, b);
    assert_eq!(env.guest.realm().live_handles(), 1);
}

#[test]
fn test_host_allocator_functions() {
    let mut env = Env::new();
    let ptr = env.handle("emlite_malloc", &[16]);
    env.guest.write_memory(ptr, b"abcdefgh").unwrap();
    let moved = env.handle("emlite_realloc", &[ptr, 32]);
    assert_eq!(env.guest.read_memory(moved, 8).unwrap(), b"abcdefgh");
    env.handle_void("emlite_free", &[moved]);
}

#[test]
fn test_wrong_argument_types_are_rejected() {
    let mut env = Env::new();
    let err = env.call("emlite_val_make_int", &[WasmValue::F64(1.0)]).unwrap_err();
    assert_eq!(err.code, codes::INVALID_ARGUMENT);
}
