// EML - eml-error
// Module: EML Error Codes
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for EML
//!
//! Codes are grouped in ranges of one thousand, one range per pipeline
//! stage, followed by the host bridge ranges.

// I/O error codes (1000-1999)
/// Module image could not be found
pub const MODULE_NOT_FOUND: u16 = 1000;
/// Module image could not be read
pub const MODULE_READ_ERROR: u16 = 1001;
/// Module image exceeds the configured size limit
pub const MODULE_TOO_LARGE: u16 = 1002;
/// Location scheme is not supported
pub const UNSUPPORTED_LOCATION: u16 = 1003;
/// Generic I/O error
pub const IO_ERROR: u16 = 1004;

// Compile error codes (2000-2999)
/// Bytes are not a valid WebAssembly module
pub const INVALID_MODULE: u16 = 2000;
/// Module uses a feature the engine does not support
pub const UNSUPPORTED_FEATURE: u16 = 2001;
/// Engine could not be configured
pub const ENGINE_CONFIGURATION_ERROR: u16 = 2002;

// Link error codes (3000-3999)
/// A declared import has no host counterpart
pub const MISSING_IMPORT: u16 = 3000;
/// A declared import has a different type than the host function
pub const IMPORT_TYPE_MISMATCH: u16 = 3001;
/// A declared import is not a function
pub const UNSUPPORTED_IMPORT_KIND: u16 = 3002;
/// Instantiation failed for another reason
pub const INSTANTIATION_ERROR: u16 = 3003;

// Runtime trap codes (4000-4999)
/// WebAssembly trap raised by the guest
pub const TRAP: u16 = 4000;
/// Execution ran out of fuel
pub const FUEL_EXHAUSTED: u16 = 4001;
/// Host threw a value into the guest
pub const HOST_THROWN: u16 = 4002;
/// Entry point export is missing
pub const ENTRY_POINT_NOT_FOUND: u16 = 4003;
/// Entry point export is not a callable function
pub const ENTRY_POINT_NOT_CALLABLE: u16 = 4004;
/// Guest callback could not be resolved
pub const CALLBACK_NOT_FOUND: u16 = 4005;

// Host bridge error codes (5000-5999)
/// Handle does not name a live value
pub const INVALID_HANDLE: u16 = 5000;
/// Value has the wrong type for the operation
pub const TYPE_ERROR: u16 = 5001;
/// Argument list passed by the guest is malformed
pub const INVALID_ARGUMENT: u16 = 5002;
/// Operation not valid in the current state
pub const INVALID_STATE: u16 = 5003;
/// Host function is not registered
pub const HOST_FUNCTION_NOT_FOUND: u16 = 5004;

// Memory error codes (6000-6999)
/// Guest memory access out of bounds
pub const MEMORY_OUT_OF_BOUNDS: u16 = 6000;
/// Guest memory could not be grown
pub const MEMORY_GROW_ERROR: u16 = 6001;
/// Guest does not export a linear memory
pub const MEMORY_NOT_FOUND: u16 = 6002;

// Resource error codes (7000-7999)
/// Allocation request could not be satisfied
pub const ALLOCATION_FAILED: u16 = 7000;
/// Configured resource limit exceeded
pub const RESOURCE_LIMIT_EXCEEDED: u16 = 7001;
