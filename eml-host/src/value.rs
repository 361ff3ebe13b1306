// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host values manipulated by the module through handles.
//!
//! The model follows JavaScript closely enough for the emlite API:
//! primitives are copied, arrays/objects/functions are shared references
//! whose identity is observable through strict equality.

use core::cmp::Ordering;
use core::fmt;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;

use eml_error::Result;

use crate::guest::Guest;

/// Native host function: `(guest, this, args) -> value`
pub type NativeFn = Arc<dyn Fn(&mut dyn Guest, Value, &[Value]) -> Result<Value> + Send + Sync>;

/// Insertion-ordered property list
#[derive(Clone, Debug, Default)]
pub struct Properties {
    entries: Vec<(String, Value)>,
}

impl Properties {
    /// Empty property list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or overwrite a property, keeping its original position
    pub fn set(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Whether the property exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Property names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no properties
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What runs when a function value is called
#[derive(Clone)]
pub enum FunctionKind {
    /// Implemented by the host
    Native(NativeFn),
    /// Entry of the module's function table, created by
    /// `emlite_val_make_callback`
    Guest(u32),
}

/// A callable host value
pub struct Function {
    name:       String,
    kind:       FunctionKind,
    properties: RefCell<Properties>,
}

impl Function {
    /// Create a native function
    pub fn native<F>(name: &str, f: F) -> Rc<Self>
    where
        F: Fn(&mut dyn Guest, Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Rc::new(Self {
            name:       name.to_string(),
            kind:       FunctionKind::Native(Arc::new(f)),
            properties: RefCell::new(Properties::new()),
        })
    }

    /// Create a function backed by a guest table entry
    #[must_use]
    pub fn guest(index: u32) -> Rc<Self> {
        Rc::new(Self {
            name:       String::new(),
            kind:       FunctionKind::Guest(index),
            properties: RefCell::new(Properties::new()),
        })
    }

    /// Function name (empty for guest callbacks)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the function runs
    #[must_use]
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Own properties
    pub fn properties(&self) -> Ref<'_, Properties> {
        self.properties.borrow()
    }

    /// Own properties, mutably
    pub fn properties_mut(&self) -> RefMut<'_, Properties> {
        self.properties.borrow_mut()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FunctionKind::Native(_) => write!(f, "Function(native {})", self.name),
            FunctionKind::Guest(index) => write!(f, "Function(guest #{index})"),
        }
    }
}

/// A plain object
#[derive(Debug, Default)]
pub struct Object {
    /// Own properties
    pub properties:  Properties,
    /// Function the object was constructed by, if any
    pub constructor: Option<Rc<Function>>,
}

/// A host value
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// A boolean
    Bool(bool),
    /// A number
    Number(f64),
    /// An immutable string
    String(Rc<str>),
    /// A shared array
    Array(Rc<RefCell<Vec<Value>>>),
    /// A shared object
    Object(Rc<RefCell<Object>>),
    /// A shared function
    Function(Rc<Function>),
}

impl Value {
    /// A new array holding `items`
    #[must_use]
    pub fn new_array(items: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    /// A new empty object
    #[must_use]
    pub fn new_object() -> Self {
        Self::Object(Rc::new(RefCell::new(Object::default())))
    }

    /// A new empty object created by `constructor`
    #[must_use]
    pub fn new_object_of(constructor: Rc<Function>) -> Self {
        Self::Object(Rc::new(RefCell::new(Object {
            properties:  Properties::new(),
            constructor: Some(constructor),
        })))
    }

    /// Wrap a function
    #[must_use]
    pub fn function(function: Rc<Function>) -> Self {
        Self::Function(function)
    }

    /// The `typeof` string
    #[must_use]
    pub const fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Array(_) | Self::Object(_) => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
        }
    }

    /// Whether the value is `null` or `undefined`
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Whether the value is a reference (array, object or function)
    #[must_use]
    pub const fn is_object_like(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_) | Self::Function(_))
    }

    /// The function, if this value is callable
    #[must_use]
    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// JavaScript truthiness
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) => true,
        }
    }

    /// JavaScript `ToNumber`
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Object(_) | Self::Function(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
            Self::Array(_) => string_to_number(&self.to_js_string()),
        }
    }

    /// JavaScript `ToInt32`
    #[must_use]
    pub fn to_int32(&self) -> i32 {
        number_to_int32(self.to_number())
    }

    /// JavaScript `ToString`
    #[must_use]
    pub fn to_js_string(&self) -> String {
        let mut seen = Vec::new();
        self.stringify(&mut seen)
    }

    fn stringify(&self, seen: &mut Vec<*const ()>) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.to_string(),
            Self::Array(items) => {
                let id = Rc::as_ptr(items).cast::<()>();
                if seen.contains(&id) {
                    return String::new();
                }
                seen.push(id);
                let joined = items
                    .borrow()
                    .iter()
                    .map(|item| if item.is_nullish() { String::new() } else { item.stringify(seen) })
                    .collect::<Vec<_>>()
                    .join(",");
                seen.pop();
                joined
            }
            Self::Object(object) => {
                let id = Rc::as_ptr(object).cast::<()>();
                if seen.contains(&id) {
                    return String::new();
                }
                let object = object.borrow();
                let Some(ctor) = object.constructor.as_ref().filter(|c| c.name().ends_with("Error")) else {
                    return "[object Object]".to_string();
                };
                seen.push(id);
                let name = match object.properties.get("name") {
                    Some(name) => name.stringify(seen),
                    None => ctor.name().to_string(),
                };
                let message = match object.properties.get("message") {
                    Some(message) => message.stringify(seen),
                    None => String::new(),
                };
                seen.pop();
                if message.is_empty() { name } else { format!("{name}: {message}") }
            }
            Self::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        }
    }

    /// Strict equality (`===`)
    #[must_use]
    pub fn strict_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `SameValueZero`, used by `includes`
    #[must_use]
    pub fn same_value_zero(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    /// Loose equality (`==`)
    #[must_use]
    pub fn loose_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined | Self::Null, Self::Undefined | Self::Null) => true,
            (Self::Undefined | Self::Null, _) | (_, Self::Undefined | Self::Null) => false,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Bool(_), _) => Self::Number(self.to_number()).loose_equals(other),
            (_, Self::Bool(_)) => self.loose_equals(&Self::Number(other.to_number())),
            (Self::Number(a), Self::String(_)) => *a == other.to_number(),
            (Self::String(_), Self::Number(b)) => self.to_number() == *b,
            _ if self.is_object_like() && other.is_object_like() => self.strict_equals(other),
            _ if self.is_object_like() => Self::from(self.to_js_string()).loose_equals(other),
            _ => self.loose_equals(&Self::from(other.to_js_string())),
        }
    }

    /// Abstract relational comparison; `None` when either side is NaN
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let left = self.to_primitive();
        let right = other.to_primitive();
        match (&left, &right) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => left.to_number().partial_cmp(&right.to_number()),
        }
    }

    fn to_primitive(&self) -> Self {
        if self.is_object_like() { Self::from(self.to_js_string()) } else { self.clone() }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Rc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(Rc::from(v))
    }
}

impl From<Rc<Function>> for Value {
    fn from(v: Rc<Function>) -> Self {
        Self::Function(v)
    }
}

/// Format a number the way JavaScript's `Number.prototype.toString` does
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{n:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => formatted,
        };
    }
    format!("{n}")
}

/// JavaScript `StringToNumber`
#[must_use]
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix).map_or(f64::NAN, |v| v as f64);
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// JavaScript `ToInt32` applied to a number
#[must_use]
pub fn number_to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    const TWO_32: f64 = 4_294_967_296.0;
    let wrapped = n.trunc().rem_euclid(TWO_32);
    if wrapped >= TWO_32 / 2.0 { (wrapped - TWO_32) as i32 } else { wrapped as i32 }
}
