// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)] // Rule 2

//! Host side of the emlite bridge.
//!
//! Modules built against emlite manipulate host values through 32-bit
//! handles and a fixed `env` import table. This crate provides that table
//! and everything behind it, independent of any wasm engine.
//!
//! The bridge is split into two capability tables:
//!
//! - module -> host: the [`CallbackRegistry`] of [`HostFunction`]s the
//!   module imports, with [`register_env`] installing the emlite functions
//! - host -> module: the [`Guest`] trait, implemented by the engine on top
//!   of the module's exports (memory, allocator, callback table)
//!
//! ## Usage
//!
//! ```rust
//! use eml_host::prelude::*;
//! use eml_host::{register_env, testing::MemoryGuest, ENV_MODULE};
//!
//! let mut registry = CallbackRegistry::new();
//! register_env(&mut registry);
//!
//! let mut guest = MemoryGuest::default();
//! let handle = registry
//!     .call_host_function(&mut guest, ENV_MODULE, "emlite_val_make_double", &[WasmValue::F64(1.5)])
//!     .unwrap();
//! assert_eq!(handle.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_panics_doc)]

pub mod builtins;
pub mod callback;
pub mod env;
pub mod function;
pub mod guest;
pub mod handle;
pub mod interop;
pub mod prelude;
pub mod realm;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod value;

pub use callback::{function_key, CallbackRegistry, CallbackType, RealmSetup};
pub use env::{register_env, ENV_MODULE};
pub use function::{CloneableFn, FuncSignature, HostFunction, HostFunctionHandler, ValueType, WasmValue};
pub use guest::Guest;
pub use handle::Handle;
pub use realm::Realm;
pub use value::{Function, Value};
