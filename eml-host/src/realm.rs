// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The realm: global object, intrinsics and handle table of one instance.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use eml_error::{codes, kinds, Error, Result};

use crate::builtins;
use crate::callback::CallbackRegistry;
use crate::handle::{Handle, HandleTable, NULL, UNDEFINED};
use crate::value::{Function, Object, Properties, Value};

/// Largest array length the host will materialize
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Validate a requested array length
pub(crate) fn array_length(len: f64) -> Result<usize> {
    if !(0.0..=f64::from(u32::MAX)).contains(&len) || len.fract() != 0.0 {
        return Err(Error::type_error("Invalid array length"));
    }
    let len = len as usize;
    if len > MAX_ARRAY_LENGTH {
        return Err(Error::resource_error(
            codes::RESOURCE_LIMIT_EXCEEDED,
            format!("array length {len} exceeds the host limit of {MAX_ARRAY_LENGTH}"),
        ));
    }
    Ok(len)
}

/// Constructors and prototypes the host operations refer to directly
#[derive(Debug)]
pub struct Intrinsics {
    /// `Object`
    pub object:           Rc<Function>,
    /// `Array`
    pub array:            Rc<Function>,
    /// `Error`
    pub error:            Rc<Function>,
    /// `TypeError`
    pub type_error:       Rc<Function>,
    /// Methods visible on every array
    pub array_prototype:  Properties,
    /// Methods visible on every string
    pub string_prototype: Properties,
    /// Methods visible on every number
    pub number_prototype: Properties,
}

/// Host value heap seen by one module instance
pub struct Realm {
    handles:    HandleTable,
    global:     Rc<RefCell<Object>>,
    intrinsics: Intrinsics,
    registry:   Arc<CallbackRegistry>,
    label:      Option<String>,
}

impl Realm {
    /// Create a realm with the standard globals, then run the realm setups
    /// registered on `registry`
    #[must_use]
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        let global = Rc::new(RefCell::new(Object::default()));
        let mut realm = Self {
            handles: HandleTable::new(Value::Object(global.clone())),
            global,
            intrinsics: builtins::intrinsics(),
            registry,
            label: None,
        };
        builtins::install(&mut realm);
        for setup in realm.registry.realm_setups() {
            setup(&mut realm);
        }
        realm
    }

    /// Registry this realm was created from
    #[must_use]
    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Name used as the log source for this realm
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set the log source name
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Intrinsic constructors and prototypes
    #[must_use]
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The global object
    #[must_use]
    pub fn global(&self) -> Value {
        Value::Object(self.global.clone())
    }

    /// Define a property on the global object
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.global.borrow_mut().properties.set(name, value);
    }

    /// Hand out a handle for `value`
    pub fn to_handle(&mut self, value: Value) -> Handle {
        self.handles.insert(value)
    }

    /// The value a handle names
    pub fn value(&self, handle: Handle) -> Result<Value> {
        self.handles.get(handle)
    }

    /// Release a handle
    pub fn release(&mut self, handle: Handle) {
        self.handles.remove(handle);
    }

    /// Number of live non-reserved handles
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    /// Arguments named by an `argv` handle
    pub fn arguments(&self, argv: Handle) -> Result<Vec<Value>> {
        if argv == NULL || argv == UNDEFINED {
            return Ok(Vec::new());
        }
        match self.value(argv)? {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::Null | Value::Undefined => Ok(Vec::new()),
            other => Err(Error::type_error(format!(
                "argument list must be an array, got {}",
                other.type_of()
            ))),
        }
    }

    /// `target[key]`
    pub fn get_property(&self, target: &Value, key: &str) -> Result<Value> {
        match target {
            Value::Undefined | Value::Null => {
                Err(kinds::property_of_nullish("read", key, &target.to_js_string()))
            }
            Value::Object(object) => {
                if key == "globalThis" && Rc::ptr_eq(object, &self.global) {
                    return Ok(self.global());
                }
                let object = object.borrow();
                if let Some(value) = object.properties.get(key) {
                    return Ok(value.clone());
                }
                Ok(match (&object.constructor, key) {
                    (Some(ctor), "constructor") => Value::Function(ctor.clone()),
                    _ => Value::Undefined,
                })
            }
            Value::Array(items) => {
                let items = items.borrow();
                if key == "length" {
                    return Ok(Value::Number(items.len() as f64));
                }
                if let Some(index) = array_index(key) {
                    return Ok(items.get(index).cloned().unwrap_or_default());
                }
                Ok(self.intrinsics.array_prototype.get(key).cloned().unwrap_or_default())
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Some(index) = array_index(key) {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map_or(Value::Undefined, |c| Value::from(c.to_string())));
                }
                Ok(self.intrinsics.string_prototype.get(key).cloned().unwrap_or_default())
            }
            Value::Number(_) => {
                Ok(self.intrinsics.number_prototype.get(key).cloned().unwrap_or_default())
            }
            Value::Bool(_) => Ok(Value::Undefined),
            Value::Function(f) => {
                if let Some(value) = f.properties().get(key) {
                    return Ok(value.clone());
                }
                Ok(if key == "name" { Value::from(f.name()) } else { Value::Undefined })
            }
        }
    }

    /// `target[key] = value`
    pub fn set_property(&self, target: &Value, key: &str, value: Value) -> Result<()> {
        match target {
            Value::Undefined | Value::Null => {
                Err(kinds::property_of_nullish("set", key, &target.to_js_string()))
            }
            Value::Object(object) => {
                object.borrow_mut().properties.set(key, value);
                Ok(())
            }
            Value::Function(f) => {
                f.properties_mut().set(key, value);
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let len = array_length(value.to_number())?;
                    items.resize(len, Value::Undefined);
                } else if let Some(index) = array_index(key) {
                    if index >= items.len() {
                        let len = array_length((index + 1) as f64)?;
                        items.resize(len, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            // Primitives silently drop the assignment.
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
        }
    }

    /// `key in target`
    pub fn has_property(&self, target: &Value, key: &str) -> Result<bool> {
        match target {
            Value::Object(object) => Ok((key == "globalThis" && Rc::ptr_eq(object, &self.global))
                || object.borrow().properties.contains(key)),
            Value::Array(_) => Ok(self.has_own_property(target, key)?
                || self.intrinsics.array_prototype.contains(key)),
            Value::Function(_) => self.has_own_property(target, key),
            _ => Err(Error::type_error(format!(
                "Cannot use 'in' operator to search for '{key}' in {}",
                target.to_js_string()
            ))),
        }
    }

    /// `Object.prototype.hasOwnProperty.call(target, key)`
    pub fn has_own_property(&self, target: &Value, key: &str) -> Result<bool> {
        Ok(match target {
            Value::Undefined | Value::Null => {
                return Err(Error::type_error("Cannot convert undefined or null to object"));
            }
            Value::Object(object) => object.borrow().properties.contains(key),
            Value::Array(items) => {
                key == "length" || array_index(key).is_some_and(|i| i < items.borrow().len())
            }
            Value::String(s) => {
                key == "length" || array_index(key).is_some_and(|i| i < s.chars().count())
            }
            Value::Function(f) => key == "name" || f.properties().contains(key),
            Value::Bool(_) | Value::Number(_) => false,
        })
    }

    /// `value instanceof ctor`
    pub fn instance_of(&self, value: &Value, ctor: &Value) -> Result<bool> {
        let Value::Function(ctor) = ctor else {
            return Err(Error::type_error("Right-hand side of 'instanceof' is not callable"));
        };
        let is_object = Rc::ptr_eq(ctor, &self.intrinsics.object);
        Ok(match value {
            Value::Array(_) => is_object || Rc::ptr_eq(ctor, &self.intrinsics.array),
            Value::Function(_) => is_object,
            Value::Object(object) => {
                is_object
                    || object.borrow().constructor.as_ref().is_some_and(|own| {
                        Rc::ptr_eq(own, ctor)
                            || (Rc::ptr_eq(ctor, &self.intrinsics.error)
                                && Rc::ptr_eq(own, &self.intrinsics.type_error))
                    })
            }
            _ => false,
        })
    }

    /// Append to an array
    pub fn push(&self, target: &Value, value: Value) -> Result<()> {
        match target {
            Value::Array(items) => {
                items.borrow_mut().push(value);
                Ok(())
            }
            other => Err(kinds::not_a_function(&format!("{}.push", other.type_of()))),
        }
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new(Arc::new(CallbackRegistry::new()))
    }
}

impl core::fmt::Debug for Realm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Realm")
            .field("label", &self.label)
            .field("live_handles", &self.live_handles())
            .finish_non_exhaustive()
    }
}

/// Canonical array index: decimal digits without leading zeros
fn array_index(key: &str) -> Option<usize> {
    let index = key.parse::<u32>().ok()?;
    (index.to_string() == key && index != u32::MAX).then_some(index as usize)
}
