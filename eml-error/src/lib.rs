// EML - eml-error
// Module: EML Error Handling
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! EML Error handling library
//!
//! This library provides the error type shared by the emlite host crates.
//!
//! # Error Categories
//!
//! Errors are organized by the pipeline stage that raised them, each with
//! its own range of error codes:
//!
//! ## I/O Errors (1000-1999)
//! - Missing or unreadable module image
//! - Image size limit exceeded
//!
//! ## Compile Errors (2000-2999)
//! - Malformed binary
//! - Unsupported features
//!
//! ## Link Errors (3000-3999)
//! - Missing host import
//! - Import type mismatch
//!
//! ## Runtime Traps (4000-4999)
//! - Guest traps, fuel exhaustion
//! - Values thrown by the host bridge
//!
//! Host bridge, memory and resource errors use the 5000-7999 ranges. When
//! they escape a guest call they are reported as runtime traps.
//!
//! # Usage
//!
//! ```
//! use eml_error::{codes, kinds, Error, ErrorCategory};
//!
//! let error = Error::new(
//!     ErrorCategory::Link,
//!     codes::MISSING_IMPORT,
//!     "unknown import: `env::emlite_val_null`",
//! );
//! assert!(error.is_link_error());
//!
//! let missing = kinds::module_not_found("bin/eval.wasm");
//! assert!(missing.is_io_error());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Error codes for eml
pub mod codes;
/// Error and error handling types
pub mod errors;
/// Error kind constructors
pub mod kinds;

pub use errors::{Error, ErrorCategory, ErrorSource};

/// A specialized `Result` type for EML operations.
pub type Result<T> = core::result::Result<T, Error>;
