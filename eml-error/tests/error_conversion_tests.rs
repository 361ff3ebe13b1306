//! Tests for error conversion and category mapping

use eml_error::{codes, kinds, Error, ErrorCategory, ErrorSource, Result};

fn read_image(path: &str) -> Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

#[test]
fn test_io_error_through_question_mark() {
    let error = read_image("/definitely/not/here.wasm").unwrap_err();
    assert_eq!(error.category, ErrorCategory::Io);
    assert_eq!(error.code, codes::MODULE_NOT_FOUND);
}

#[test]
fn test_error_source_trait() {
    let error = kinds::missing_import("env", "emlite_val_null");
    let source: &dyn ErrorSource = &error;
    assert_eq!(source.category(), ErrorCategory::Link);
    assert_eq!(source.code(), codes::MISSING_IMPORT);
    assert!(source.message().contains("env::emlite_val_null"));
}

#[test]
fn test_error_codes_by_stage() {
    assert_eq!(kinds::module_not_found("x").code, codes::MODULE_NOT_FOUND);
    assert_eq!(kinds::unsupported_location("http://x").code, codes::UNSUPPORTED_LOCATION);
    assert_eq!(Error::compile_error("bad").code, codes::INVALID_MODULE);
    assert_eq!(
        kinds::unsupported_import_kind("env", "memory", "memory").code,
        codes::UNSUPPORTED_IMPORT_KIND
    );
    assert_eq!(kinds::entry_point_not_found("main").code, codes::ENTRY_POINT_NOT_FOUND);
}

#[test]
fn test_category_names() {
    assert_eq!(ErrorCategory::Io.as_str(), "io");
    assert_eq!(ErrorCategory::Compile.as_str(), "compile");
    assert_eq!(ErrorCategory::Link.as_str(), "link");
    assert_eq!(ErrorCategory::RuntimeTrap.as_str(), "runtime-trap");
}

#[test]
fn test_boxed_as_std_error() {
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(Error::host_thrown("Error: boom"));
    assert_eq!(boxed.to_string(), "[RuntimeTrap][E0FA2] Error: boom");
}
