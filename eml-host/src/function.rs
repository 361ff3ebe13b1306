//! Host function implementation for the emlite host.
//!
//! This module provides types for representing host functions that can be
//! imported by a WebAssembly module, together with the core value types
//! that cross the import boundary.

use core::fmt;

use eml_error::{Error, Result};

use crate::guest::Guest;

/// Core WebAssembly number types accepted by host functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit integer (also pointers, sizes and handles on wasm32)
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        })
    }
}

/// A core WebAssembly value passed to or returned from a host function
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WasmValue {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
}

impl WasmValue {
    /// The type of this value
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::I32(_) => ValueType::I32,
            Self::I64(_) => ValueType::I64,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
        }
    }

    /// The value as an `i32`, if it is one
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The value reinterpreted as an unsigned 32-bit integer (handles,
    /// pointers and sizes)
    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::I32(v) => Some(*v as u32),
            _ => None,
        }
    }

    /// The value as an `f64`, if it is one
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }
}

/// Parameter and result types of a host function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncSignature {
    /// Parameter types
    pub params:  Vec<ValueType>,
    /// Result types
    pub results: Vec<ValueType>,
}

impl FuncSignature {
    /// Create a signature from parameter and result types
    #[must_use]
    pub fn new(params: &[ValueType], results: &[ValueType]) -> Self {
        Self { params: params.to_vec(), results: results.to_vec() }
    }
}

impl fmt::Display for FuncSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValueType]| {
            types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };
        write!(f, "({}) -> ({})", join(&self.params), join(&self.results))
    }
}

/// A trait for host function bodies that can be cloned.
/// This is used for storing host functions that can be called by the Wasm
/// engine.
pub trait FnWithValues: Send + Sync {
    /// Calls the function with the given guest and arguments.
    fn call(&self, guest: &mut dyn Guest, args: &[WasmValue]) -> Result<Vec<WasmValue>>;

    /// Clones the function into a `Box`.
    fn clone_box(&self) -> Box<dyn FnWithValues>;
}

impl<F> FnWithValues for F
where
    F: Fn(&mut dyn Guest, &[WasmValue]) -> Result<Vec<WasmValue>> + Send + Sync + Clone + 'static,
{
    fn call(&self, guest: &mut dyn Guest, args: &[WasmValue]) -> Result<Vec<WasmValue>> {
        self(guest, args)
    }

    fn clone_box(&self) -> Box<dyn FnWithValues> {
        Box::new(self.clone())
    }
}

/// A wrapper struct that makes a closure implementing `Fn` cloneable
/// by boxing it and handling the cloning via the `FnWithValues` trait.
pub struct CloneableFn(Box<dyn FnWithValues>);

impl CloneableFn {
    /// Creates a new `CloneableFn` from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Guest, &[WasmValue]) -> Result<Vec<WasmValue>>
            + Send
            + Sync
            + Clone
            + 'static,
    {
        Self(Box::new(f))
    }

    /// Calls the wrapped function.
    pub fn call(&self, guest: &mut dyn Guest, args: &[WasmValue]) -> Result<Vec<WasmValue>> {
        self.0.call(guest, args)
    }
}

impl Clone for CloneableFn {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

/// Host function handler type for implementing WebAssembly imports
pub type HostFunctionHandler = CloneableFn;

/// A host function together with the signature it is imported under
#[derive(Clone)]
pub struct HostFunction {
    signature: FuncSignature,
    handler:   HostFunctionHandler,
}

impl HostFunction {
    /// Create a host function with the given signature
    pub fn new<F>(signature: FuncSignature, f: F) -> Self
    where
        F: Fn(&mut dyn Guest, &[WasmValue]) -> Result<Vec<WasmValue>>
            + Send
            + Sync
            + Clone
            + 'static,
    {
        Self { signature, handler: CloneableFn::new(f) }
    }

    /// The signature the function is imported under
    #[must_use]
    pub fn signature(&self) -> &FuncSignature {
        &self.signature
    }

    /// Call the function after checking the arguments against its signature
    pub fn call(&self, guest: &mut dyn Guest, args: &[WasmValue]) -> Result<Vec<WasmValue>> {
        let arg_types: Vec<ValueType> = args.iter().map(WasmValue::value_type).collect();
        if arg_types != self.signature.params {
            return Err(Error::invalid_argument(format!(
                "host function expects {}, called with ({})",
                self.signature,
                arg_types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            )));
        }
        self.handler.call(guest, args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction").field("signature", &self.signature).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryGuest;

    #[test]
    fn test_cloneable_fn() {
        let f = CloneableFn::new(|_, _| Ok(vec![WasmValue::I32(42)]));
        let f2 = f.clone();

        let mut guest = MemoryGuest::default();
        assert_eq!(f.call(&mut guest, &[]).unwrap(), vec![WasmValue::I32(42)]);
        assert_eq!(f2.call(&mut guest, &[]).unwrap(), vec![WasmValue::I32(42)]);
    }

    #[test]
    fn test_host_function_checks_arguments() {
        let function = HostFunction::new(
            FuncSignature::new(&[ValueType::I32], &[ValueType::I32]),
            |_, args| Ok(vec![WasmValue::I32(args[0].as_i32().unwrap_or(0) + 1)]),
        );

        let mut guest = MemoryGuest::default();
        assert_eq!(function.call(&mut guest, &[WasmValue::I32(1)]).unwrap(), vec![WasmValue::I32(2)]);
        assert!(function.call(&mut guest, &[]).is_err());
        assert!(function.call(&mut guest, &[WasmValue::F64(1.0)]).is_err());
    }

    #[test]
    fn test_signature_display() {
        let sig = FuncSignature::new(&[ValueType::I32, ValueType::F64], &[ValueType::I32]);
        assert_eq!(sig.to_string(), "(i32, f64) -> (i32)");
        assert_eq!(FuncSignature::new(&[], &[]).to_string(), "() -> ()");
    }

    #[test]
    fn test_wasm_value_accessors() {
        assert_eq!(WasmValue::I32(-1).as_u32(), Some(u32::MAX));
        assert_eq!(WasmValue::F64(1.5).as_f64(), Some(1.5));
        assert_eq!(WasmValue::I64(3).as_i32(), None);
        assert_eq!(WasmValue::F32(0.0).value_type(), ValueType::F32);
    }
}
