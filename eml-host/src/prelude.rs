// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for eml-host
//!
//! Re-exports the types host function implementations reach for most often.

pub use eml_error::{codes, kinds, Error, ErrorCategory, Result};

pub use crate::callback::{CallbackRegistry, CallbackType};
pub use crate::function::{FuncSignature, HostFunction, ValueType, WasmValue};
pub use crate::guest::Guest;
pub use crate::handle::Handle;
pub use crate::interop::{call, call_method, construct};
pub use crate::realm::Realm;
pub use crate::value::{Function, Value};
