// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Mapping engine failures onto runtime traps.

use eml_error::{codes, Error, ErrorCategory};
use wasmtime::Trap;

/// Convert a failure raised while running guest code.
///
/// Errors raised by host functions keep their code; everything is reported
/// as a runtime trap.
pub(crate) fn from_wasmtime(err: &wasmtime::Error) -> Error {
    if let Some(error) = err.downcast_ref::<Error>() {
        return error.clone().recategorize(ErrorCategory::RuntimeTrap);
    }
    match err.downcast_ref::<Trap>() {
        Some(Trap::OutOfFuel) => Error::runtime_trap(codes::FUEL_EXHAUSTED, "all fuel consumed by guest"),
        Some(trap) => Error::runtime_trap(codes::TRAP, format!("wasm trap: {trap}")),
        None => Error::runtime_trap(codes::TRAP, format!("{err:#}")),
    }
}

/// Whether `err` came from running guest code rather than from linking
pub(crate) fn is_guest_failure(err: &wasmtime::Error) -> bool {
    err.downcast_ref::<Trap>().is_some() || err.downcast_ref::<Error>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_errors_keep_their_code() {
        let err = wasmtime::Error::new(Error::type_error("x is not a function"));
        let mapped = from_wasmtime(&err);
        assert!(mapped.is_runtime_trap());
        assert_eq!(mapped.code, codes::TYPE_ERROR);
        assert_eq!(mapped.message, "x is not a function");
    }

    #[test]
    fn test_traps() {
        let fuel = from_wasmtime(&wasmtime::Error::new(Trap::OutOfFuel));
        assert_eq!(fuel.code, codes::FUEL_EXHAUSTED);

        let unreachable = from_wasmtime(&wasmtime::Error::new(Trap::UnreachableCodeReached));
        assert_eq!(unreachable.code, codes::TRAP);
        assert!(is_guest_failure(&wasmtime::Error::new(Trap::UnreachableCodeReached)));
        assert!(!is_guest_failure(&wasmtime::Error::msg("unknown import")));
    }
}
