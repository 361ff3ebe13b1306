// EML - eml-error
// Module: EML Error Kinds
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Constructors for the specific error kinds raised by the loader and the
//! host bridge.

use crate::{codes, Error, ErrorCategory};

/// Module image location does not exist
#[must_use]
pub fn module_not_found(location: &str) -> Error {
    Error::io_error(codes::MODULE_NOT_FOUND, format!("module image not found: {location}"))
}

/// Module image is larger than the configured limit
#[must_use]
pub fn module_too_large(size: usize, max: usize) -> Error {
    Error::io_error(
        codes::MODULE_TOO_LARGE,
        format!("module image is too large ({size} > {max} bytes)"),
    )
}

/// Location uses a scheme the loader cannot read from
#[must_use]
pub fn unsupported_location(location: &str) -> Error {
    Error::io_error(
        codes::UNSUPPORTED_LOCATION,
        format!("unsupported module location: {location}"),
    )
}

/// Declared import has no host counterpart
#[must_use]
pub fn missing_import(module: &str, name: &str) -> Error {
    Error::link_error(
        codes::MISSING_IMPORT,
        format!("unknown import: `{module}::{name}` is not provided by the host"),
    )
}

/// Declared import type differs from the host signature
#[must_use]
pub fn import_type_mismatch(module: &str, name: &str, expected: &str, found: &str) -> Error {
    Error::link_error(
        codes::IMPORT_TYPE_MISMATCH,
        format!("incompatible import type for `{module}::{name}`: host provides {expected}, module expects {found}"),
    )
}

/// Declared import is not a function
#[must_use]
pub fn unsupported_import_kind(module: &str, name: &str, kind: &str) -> Error {
    Error::link_error(
        codes::UNSUPPORTED_IMPORT_KIND,
        format!("import `{module}::{name}` is a {kind}; the host only provides functions"),
    )
}

/// Entry point export does not exist
#[must_use]
pub fn entry_point_not_found(name: &str) -> Error {
    Error::runtime_trap(codes::ENTRY_POINT_NOT_FOUND, format!("export `{name}` not found"))
}

/// `TypeError` raised by a host value operation
#[must_use]
pub fn not_a_function(what: &str) -> Error {
    Error::type_error(format!("{what} is not a function"))
}

/// `TypeError` raised when reading or writing a property of null/undefined
#[must_use]
pub fn property_of_nullish(action: &str, key: &str, target: &str) -> Error {
    let gerund = match action {
        "set" => "setting".to_string(),
        other => format!("{other}ing"),
    };
    Error::type_error(format!("Cannot {action} properties of {target} ({gerund} '{key}')"))
}

/// Host function is not registered
#[must_use]
pub fn host_function_not_found(module: &str, name: &str) -> Error {
    Error::new(
        ErrorCategory::Link,
        codes::HOST_FUNCTION_NOT_FOUND,
        format!("host function {module}.{name} not found"),
    )
}
