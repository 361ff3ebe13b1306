//! Modules driving the host realm through the `env` imports.

use std::path::Path;
use std::sync::{Arc, Mutex};

use eml_error::codes;
use eml_host::Value;
use eml_logging::{LogLevel, LogOperation};
use eml_runtime::{Emlite, Loader, LoaderConfig, ModuleInstance, Result};
use tempfile::TempDir;

const IMPORTS: &str = r#"
    (import "env" "emlite_val_global_this" (func $global (result i32)))
    (import "env" "emlite_val_new_array" (func $new_array (result i32)))
    (import "env" "emlite_val_push" (func $push (param i32 i32)))
    (import "env" "emlite_val_make_int" (func $make_int (param i32) (result i32)))
    (import "env" "emlite_val_make_str" (func $make_str (param i32 i32) (result i32)))
    (import "env" "emlite_val_get_value_string" (func $get_string (param i32) (result i32)))
    (import "env" "emlite_val_get_elem" (func $get_elem (param i32 i32) (result i32)))
    (import "env" "emlite_val_obj_prop" (func $prop (param i32 i32 i32) (result i32)))
    (import "env" "emlite_val_obj_set_prop" (func $set_prop (param i32 i32 i32 i32)))
    (import "env" "emlite_val_obj_call" (func $obj_call (param i32 i32 i32 i32) (result i32)))
    (import "env" "emlite_val_func_call" (func $func_call (param i32 i32) (result i32)))
    (import "env" "emlite_val_make_callback" (func $make_callback (param i32) (result i32)))
    (import "env" "emlite_val_throw" (func $throw (param i32)))
    (import "env" "emlite_malloc" (func $host_malloc (param i32) (result i32)))
"#;

/// `globalThis.result = v`, with "result" stored at address 8
const SET_RESULT: &str = r#"
    (data (i32.const 8) "result")
    (func $set_result (param $v i32)
        (call $set_prop (call $global) (i32.const 8) (i32.const 6) (local.get $v)))
"#;

fn module(body: &str) -> String {
    format!("(module {IMPORTS} (memory (export \"memory\") 1) {SET_RESULT} {body})")
}

fn run(config: LoaderConfig, emlite: Emlite, body: &str) -> (TempDir, Loader, Result<ModuleInstance>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.wasm");
    std::fs::write(&path, wat::parse_str(module(body)).unwrap()).unwrap();
    let mut loader = Loader::new(config).unwrap();
    let result = loader.run(&path.display().to_string(), &emlite.imports());
    (dir, loader, result)
}

fn result_of(instance: &mut ModuleInstance) -> Value {
    let realm = instance.realm();
    let global = realm.global();
    realm.get_property(&global, "result").unwrap()
}

#[test]
fn test_console_log_reaches_log_handler() {
    let seen = Arc::new(Mutex::new(Vec::<LogOperation>::new()));
    let sink = seen.clone();
    let emlite = Emlite::new().with_log_handler(move |op| sink.lock().unwrap().push(op));

    let (_dir, _, result) = run(
        LoaderConfig::default(),
        emlite,
        r#"
        (data (i32.const 32) "console")
        (data (i32.const 48) "log")
        (data (i32.const 64) "hello")
        (func (export "main")
            (local $argv i32)
            (local.set $argv (call $new_array))
            (call $push (local.get $argv) (call $make_str (i32.const 64) (i32.const 5)))
            (call $push (local.get $argv) (call $make_int (i32.const 42)))
            (drop (call $obj_call
                (call $prop (call $global) (i32.const 32) (i32.const 7))
                (i32.const 48) (i32.const 3)
                (local.get $argv))))
        "#,
    );
    result.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, LogLevel::Info);
    assert_eq!(seen[0].message, "hello 42");
    assert!(seen[0].source.as_deref().is_some_and(|s| s.ends_with("app.wasm")));
}

#[test]
fn test_string_methods() {
    let (_dir, _, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (data (i32.const 32) "hello")
        (data (i32.const 48) "toUpperCase")
        (func (export "main")
            (call $set_result
                (call $obj_call
                    (call $make_str (i32.const 32) (i32.const 5))
                    (i32.const 48) (i32.const 11)
                    (i32.const 0))))
        "#,
    );
    let mut instance = result.unwrap();
    assert_eq!(result_of(&mut instance).to_js_string(), "HELLO");
}

#[test]
fn test_strings_returned_through_host_allocator() {
    let (_dir, _, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (func (export "main")
            (call $set_result
                (call $make_str (call $get_string (call $make_int (i32.const 42))) (i32.const 2))))
        "#,
    );
    let mut instance = result.unwrap();
    assert_eq!(result_of(&mut instance).to_js_string(), "42");
}

#[test]
fn test_strings_returned_through_exported_malloc() {
    let (_dir, _, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (global $heap (mut i32) (i32.const 1024))
        (func (export "malloc") (param $size i32) (result i32)
            (local $ptr i32)
            (local.set $ptr (global.get $heap))
            (global.set $heap (i32.add (global.get $heap) (local.get $size)))
            (local.get $ptr))
        (func (export "main")
            (call $set_result (call $make_int (call $get_string (call $make_int (i32.const 7))))))
        "#,
    );
    let mut instance = result.unwrap();
    assert!(instance.bindings().is_some_and(|b| b.malloc.is_some()));
    assert_eq!(result_of(&mut instance).to_number(), 1024.0);
}

const CALLBACK_BODY: &str = r#"
    (table (export "__indirect_function_table") 1 funcref)
    (elem (i32.const 0) $first_arg)
    (type $callback (func (param i32) (result i32)))
    (func $first_arg (type $callback) (param $argv i32) (result i32)
        (call $get_elem (local.get $argv) (i32.const 0)))
    (func (export "main")
        (local $argv i32)
        (local.set $argv (call $new_array))
        (call $push (local.get $argv) (call $make_int (i32.const 7)))
        (call $set_result (call $func_call (call $make_callback (i32.const 0)) (local.get $argv))))
"#;

#[test]
fn test_guest_callbacks() {
    let (_dir, _, result) = run(LoaderConfig::default(), Emlite::new(), CALLBACK_BODY);
    let mut instance = result.unwrap();
    assert_eq!(result_of(&mut instance).to_number(), 7.0);

    let echoed = instance.call_callback(0, &[Value::from("again")]).unwrap();
    assert_eq!(echoed.to_js_string(), "again");

    let missing = instance.call_callback(5, &[]).unwrap_err();
    assert!(missing.is_runtime_trap());
    assert_eq!(missing.code, codes::CALLBACK_NOT_FOUND);
}

#[test]
fn test_thrown_values_trap() {
    let (_dir, loader, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (data (i32.const 32) "boom")
        (func (export "main")
            (call $throw (call $make_str (i32.const 32) (i32.const 4))))
        "#,
    );
    let err = result.unwrap_err();
    assert!(err.is_runtime_trap());
    assert_eq!(err.code, codes::HOST_THROWN);
    assert_eq!(err.message, "boom");
    assert_eq!(loader.stats().entry_points_invoked, 1);
}

#[test]
fn test_eval_is_not_supported() {
    let (_dir, _, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (data (i32.const 32) "eval")
        (func (export "main")
            (drop (call $obj_call (call $global) (i32.const 32) (i32.const 4) (i32.const 0))))
        "#,
    );
    let err = result.unwrap_err();
    assert!(err.is_runtime_trap());
    assert!(err.message.contains("eval is not supported"), "{}", err.message);
}

#[test]
fn test_type_errors_trap() {
    let (_dir, _, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (func (export "main")
            (drop (call $func_call (call $make_int (i32.const 1)) (i32.const 0))))
        "#,
    );
    let err = result.unwrap_err();
    assert!(err.is_runtime_trap());
    assert_eq!(err.code, codes::TYPE_ERROR);
    assert_eq!(err.message, "1 is not a function");
}

#[test]
fn test_memory_access_before_binding_fails() {
    let (_dir, loader, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (data (i32.const 32) "early")
        (func $early (drop (call $make_str (i32.const 32) (i32.const 5))))
        (start $early)
        (func (export "main"))
        "#,
    );
    let err = result.unwrap_err();
    assert!(err.is_runtime_trap());
    assert_eq!(err.code, codes::INVALID_STATE);
    assert_eq!(loader.stats().instances_created, 0);
}

#[test]
fn test_out_of_bounds_strings_trap() {
    let (_dir, _, result) = run(
        LoaderConfig::default(),
        Emlite::new(),
        r#"
        (func (export "main")
            (drop (call $make_str (i32.const 65530) (i32.const 100))))
        "#,
    );
    let err = result.unwrap_err();
    assert!(err.is_runtime_trap());
    assert_eq!(err.code, codes::MEMORY_OUT_OF_BOUNDS);
}

#[test]
fn test_host_allocator_respects_memory_limit() {
    let body = r#"
        (func (export "main")
            (call $set_result (call $make_int (call $host_malloc (i32.const 16)))))
    "#;

    let (_dir, _, result) = run(LoaderConfig::default(), Emlite::new(), body);
    let mut instance = result.unwrap();
    assert_eq!(result_of(&mut instance).to_number(), 65536.0);

    let (_dir, _, result) = run(LoaderConfig::default().with_max_memory_pages(1), Emlite::new(), body);
    let err = result.unwrap_err();
    assert!(err.is_runtime_trap());
    assert_eq!(err.code, codes::RESOURCE_LIMIT_EXCEEDED);
}

#[test]
fn test_fuel_is_reported() {
    let (_dir, loader, result) = run(LoaderConfig::default().with_fuel(1_000_000), Emlite::new(), CALLBACK_BODY);
    result.unwrap();
    let stats = loader.stats();
    assert!(stats.fuel_consumed > 0);
    assert!(stats.exports_bound >= 3);
}
