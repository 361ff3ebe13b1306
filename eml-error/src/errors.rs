// EML - eml-error
// Module: EML Error Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Unified error handling system for EML
//!
//! Every failure in the loader pipeline and the host bridge is expressed as
//! one `Error` value carrying a category, a numeric code and a message.

use core::fmt;

use crate::codes;

/// `Error` categories for EML operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Module image could not be acquired
    Io          = 1,
    /// Module image is not a valid module
    Compile     = 2,
    /// Imports could not be satisfied
    Link        = 3,
    /// Fault during guest execution
    RuntimeTrap = 4,
    /// Host value has the wrong type
    Type        = 5,
    /// Guest memory errors
    Memory      = 6,
    /// Resource errors (allocation, limits)
    Resource    = 7,
    /// Invalid argument passed across the bridge
    Parameter   = 8,
    /// Invalid state errors
    InvalidState = 9,
}

impl ErrorCategory {
    /// Short lowercase name, used in CLI output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Compile => "compile",
            Self::Link => "link",
            Self::RuntimeTrap => "runtime-trap",
            Self::Type => "type",
            Self::Memory => "memory",
            Self::Resource => "resource",
            Self::Parameter => "parameter",
            Self::InvalidState => "invalid-state",
        }
    }
}

/// Base trait for all error types
pub trait ErrorSource: fmt::Debug + Send + Sync {
    /// Get the error code
    fn code(&self) -> u16;

    /// Get the error message
    fn message(&self) -> &str;

    /// Get the error category
    fn category(&self) -> ErrorCategory;
}

/// EML `Error` type
///
/// Categorized error with a code and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  String,
}

impl Error {
    /// Create a new error.
    #[must_use]
    pub fn new(category: ErrorCategory, code: u16, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    /// Same error with a new category, keeping code and message
    #[must_use]
    pub fn recategorize(self, category: ErrorCategory) -> Self {
        Self { category, ..self }
    }

    /// Prefix the message with some context
    #[must_use]
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        Self {
            message: format!("{context}: {}", self.message),
            ..self
        }
    }

    /// Check if this is an I/O error
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        self.category == ErrorCategory::Io
    }

    /// Check if this is a compile error
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        self.category == ErrorCategory::Compile
    }

    /// Check if this is a link error
    #[must_use]
    pub fn is_link_error(&self) -> bool {
        self.category == ErrorCategory::Link
    }

    /// Check if this is a runtime trap
    #[must_use]
    pub fn is_runtime_trap(&self) -> bool {
        self.category == ErrorCategory::RuntimeTrap
    }

    /// Check if this is a type error
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        self.category == ErrorCategory::Type
    }

    /// Check if this is a memory error
    #[must_use]
    pub fn is_memory_error(&self) -> bool {
        self.category == ErrorCategory::Memory
    }

    /// Check if this is a resource error
    #[must_use]
    pub fn is_resource_error(&self) -> bool {
        self.category == ErrorCategory::Resource
    }

    // Factory methods for common error types

    /// Create an I/O error
    #[must_use]
    pub fn io_error(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Io, code, message)
    }

    /// Create a compile error for an invalid module
    #[must_use]
    pub fn compile_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Compile, codes::INVALID_MODULE, message)
    }

    /// Create a link error
    #[must_use]
    pub fn link_error(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Link, code, message)
    }

    /// Create a runtime trap error
    #[must_use]
    pub fn runtime_trap(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::RuntimeTrap, code, message)
    }

    /// Create an error for a value thrown by the host into the guest
    #[must_use]
    pub fn host_thrown(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::RuntimeTrap, codes::HOST_THROWN, message)
    }

    /// Create a type error
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Type, codes::TYPE_ERROR, message)
    }

    /// Create an invalid handle error
    #[must_use]
    pub fn invalid_handle(handle: u32) -> Self {
        Self::new(
            ErrorCategory::Parameter,
            codes::INVALID_HANDLE,
            format!("invalid handle {handle}"),
        )
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Parameter, codes::INVALID_ARGUMENT, message)
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidState, codes::INVALID_STATE, message)
    }

    /// Create a memory out-of-bounds error
    #[must_use]
    pub fn memory_out_of_bounds(address: u32, length: u32) -> Self {
        Self::new(
            ErrorCategory::Memory,
            codes::MEMORY_OUT_OF_BOUNDS,
            format!("memory access out of bounds: address {address}, length {length}"),
        )
    }

    /// Create a memory error
    #[must_use]
    pub fn memory_error(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Memory, code, message)
    }

    /// Create a resource error
    #[must_use]
    pub fn resource_error(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Resource, code, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}][E{:04X}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl ErrorSource for Error {
    fn code(&self) -> u16 {
        self.code
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn category(&self) -> ErrorCategory {
        self.category
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => codes::MODULE_NOT_FOUND,
            _ => codes::IO_ERROR,
        };
        Self::io_error(code, err.to_string())
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::invalid_state("formatting error")
    }
}
