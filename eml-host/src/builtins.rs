// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Standard globals and prototype methods installed into every realm.

use std::rc::Rc;

use eml_error::{Error, Result};

use crate::guest::Guest;
use crate::interop;
use crate::realm::{array_length, Intrinsics, Realm};
use crate::value::{format_number, Function, Properties, Value};

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Clamp a relative index (negative counts from the end) into `0..=len`
fn relative_index(index: f64, len: usize) -> usize {
    if index.is_nan() {
        return 0;
    }
    let len_f = len as f64;
    let index = index.trunc();
    if index < 0.0 { (len_f + index).max(0.0) as usize } else { index.min(len_f) as usize }
}

/// `this` when called through `new ctor`, else a fresh object of `ctor`
fn construct_target(this: Value, ctor: &Rc<Function>) -> Value {
    match &this {
        Value::Object(object)
            if object.borrow().constructor.as_ref().is_some_and(|own| Rc::ptr_eq(own, ctor)) =>
        {
            this
        }
        _ => Value::new_object_of(ctor.clone()),
    }
}

fn method<F>(props: &mut Properties, name: &str, f: F)
where
    F: Fn(&mut dyn Guest, Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
{
    props.set(name, Value::from(Function::native(name, f)));
}

fn error_constructor(name: &'static str, pick: fn(&Intrinsics) -> &Rc<Function>) -> Rc<Function> {
    Function::native(name, move |guest, this, args| {
        let ctor = pick(guest.realm().intrinsics()).clone();
        let error = construct_target(this, &ctor);
        let realm = guest.realm();
        realm.set_property(&error, "name", Value::from(name))?;
        let message = match arg(args, 0) {
            Value::Undefined => String::new(),
            other => other.to_js_string(),
        };
        realm.set_property(&error, "message", Value::from(message))?;
        Ok(error)
    })
}

/// Create the intrinsic constructors and prototypes
#[must_use]
pub fn intrinsics() -> Intrinsics {
    let object = Function::native("Object", |guest, this, args| {
        let ctor = guest.realm().intrinsics().object.clone();
        Ok(match arg(args, 0) {
            value if value.is_object_like() => value,
            _ => construct_target(this, &ctor),
        })
    });
    let array = Function::native("Array", |_, _, args| match args {
        [Value::Number(n)] => Ok(Value::new_array(vec![Value::Undefined; array_length(*n)?])),
        _ => Ok(Value::new_array(args.to_vec())),
    });

    Intrinsics {
        object,
        array,
        error: error_constructor("Error", |i| &i.error),
        type_error: error_constructor("TypeError", |i| &i.type_error),
        array_prototype: array_prototype(),
        string_prototype: string_prototype(),
        number_prototype: number_prototype(),
    }
}

/// Define the standard globals on the realm's global object
pub fn install(realm: &mut Realm) {
    let intrinsics = realm.intrinsics();
    let object = intrinsics.object.clone();
    let array = intrinsics.array.clone();
    let error = intrinsics.error.clone();
    let type_error = intrinsics.type_error.clone();

    object.properties_mut().set(
        "keys",
        Value::from(Function::native("keys", |_, _, args| {
            let keys: Vec<Value> = match &arg(args, 0) {
                Value::Undefined | Value::Null => {
                    return Err(Error::type_error("Cannot convert undefined or null to object"));
                }
                Value::Object(object) => object.borrow().properties.keys().map(Value::from).collect(),
                Value::Function(f) => f.properties().keys().map(Value::from).collect(),
                Value::Array(items) => {
                    (0..items.borrow().len()).map(|i| Value::from(i.to_string())).collect()
                }
                Value::String(s) => (0..s.chars().count()).map(|i| Value::from(i.to_string())).collect(),
                Value::Bool(_) | Value::Number(_) => Vec::new(),
            };
            Ok(Value::new_array(keys))
        })),
    );
    array.properties_mut().set(
        "isArray",
        Value::from(Function::native("isArray", |_, _, args| {
            Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))
        })),
    );

    realm.define_global("Object", Value::Function(object));
    realm.define_global("Array", Value::Function(array));
    realm.define_global("Error", Value::Function(error));
    realm.define_global("TypeError", Value::Function(type_error));
    realm.define_global(
        "String",
        Value::from(Function::native("String", |_, _, args| {
            Ok(Value::from(args.first().map(Value::to_js_string).unwrap_or_default()))
        })),
    );
    realm.define_global(
        "Number",
        Value::from(Function::native("Number", |_, _, args| {
            Ok(Value::from(args.first().map_or(0.0, Value::to_number)))
        })),
    );
    realm.define_global(
        "Boolean",
        Value::from(Function::native("Boolean", |_, _, args| Ok(Value::Bool(arg(args, 0).is_truthy())))),
    );
    realm.define_global("Math", math());
    realm.define_global(
        "eval",
        Value::from(Function::native("eval", |_, _, _| {
            Err(Error::host_thrown("EvalError: eval is not supported by this host"))
        })),
    );
}

fn math() -> Value {
    fn unary(props: &mut Properties, name: &str, f: fn(f64) -> f64) {
        method(props, name, move |_, _, args| Ok(Value::from(f(arg(args, 0).to_number()))));
    }

    let math = Value::new_object();
    if let Value::Object(object) = &math {
        let mut object = object.borrow_mut();
        let props = &mut object.properties;
        props.set("PI", Value::from(core::f64::consts::PI));
        props.set("E", Value::from(core::f64::consts::E));
        unary(props, "abs", f64::abs);
        unary(props, "floor", f64::floor);
        unary(props, "ceil", f64::ceil);
        unary(props, "sqrt", f64::sqrt);
        unary(props, "round", |x| (x + 0.5).floor());
        method(props, "pow", |_, _, args| {
            Ok(Value::from(arg(args, 0).to_number().powf(arg(args, 1).to_number())))
        });
        method(props, "min", |_, _, args| {
            Ok(Value::from(args.iter().map(Value::to_number).fold(f64::INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.min(x) }
            })))
        });
        method(props, "max", |_, _, args| {
            Ok(Value::from(args.iter().map(Value::to_number).fold(f64::NEG_INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.max(x) }
            })))
        });
    }
    math
}

fn this_array(this: &Value, name: &str) -> Result<Rc<core::cell::RefCell<Vec<Value>>>> {
    match this {
        Value::Array(items) => Ok(items.clone()),
        other => Err(Error::type_error(format!(
            "Array.prototype.{name} called on {}",
            other.type_of()
        ))),
    }
}

fn array_prototype() -> Properties {
    let mut props = Properties::new();
    method(&mut props, "push", |_, this, args| {
        let items = this_array(&this, "push")?;
        let mut items = items.borrow_mut();
        items.extend_from_slice(args);
        Ok(Value::from(items.len() as f64))
    });
    method(&mut props, "pop", |_, this, _| {
        Ok(this_array(&this, "pop")?.borrow_mut().pop().unwrap_or_default())
    });
    method(&mut props, "join", |_, this, args| {
        let separator = match arg(args, 0) {
            Value::Undefined => ",".to_string(),
            other => other.to_js_string(),
        };
        let items = this_array(&this, "join")?;
        let joined = items
            .borrow()
            .iter()
            .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
            .collect::<Vec<_>>()
            .join(&separator);
        Ok(Value::from(joined))
    });
    method(&mut props, "indexOf", |_, this, args| {
        let needle = arg(args, 0);
        let items = this_array(&this, "indexOf")?;
        let items = items.borrow();
        let start = relative_index(arg(args, 1).to_number(), items.len());
        let found = items.iter().skip(start).position(|item| item.strict_equals(&needle));
        Ok(Value::from(found.map_or(-1.0, |i| (i + start) as f64)))
    });
    method(&mut props, "includes", |_, this, args| {
        let needle = arg(args, 0);
        let items = this_array(&this, "includes")?;
        let found = items.borrow().iter().any(|item| item.same_value_zero(&needle));
        Ok(Value::Bool(found))
    });
    method(&mut props, "slice", |_, this, args| {
        let items = this_array(&this, "slice")?;
        let items = items.borrow();
        let len = items.len();
        let start = relative_index(arg(args, 0).to_number(), len);
        let end = match arg(args, 1) {
            Value::Undefined => len,
            other => relative_index(other.to_number(), len),
        };
        let slice = if start < end { items[start..end].to_vec() } else { Vec::new() };
        Ok(Value::new_array(slice))
    });
    method(&mut props, "forEach", |guest, this, args| {
        let callback = arg(args, 0);
        let items = this_array(&this, "forEach")?;
        let len = items.borrow().len();
        for index in 0..len {
            let Some(item) = items.borrow().get(index).cloned() else { break };
            interop::call(guest, &callback, Value::Undefined, &[item, Value::from(index as f64), this.clone()])?;
        }
        Ok(Value::Undefined)
    });
    method(&mut props, "map", |guest, this, args| {
        let callback = arg(args, 0);
        let items = this_array(&this, "map")?;
        let len = items.borrow().len();
        let mut mapped = Vec::with_capacity(len);
        for index in 0..len {
            let Some(item) = items.borrow().get(index).cloned() else { break };
            mapped.push(interop::call(
                guest,
                &callback,
                Value::Undefined,
                &[item, Value::from(index as f64), this.clone()],
            )?);
        }
        Ok(Value::new_array(mapped))
    });
    props
}

fn string_prototype() -> Properties {
    let mut props = Properties::new();
    method(&mut props, "toUpperCase", |_, this, _| Ok(Value::from(this.to_js_string().to_uppercase())));
    method(&mut props, "toLowerCase", |_, this, _| Ok(Value::from(this.to_js_string().to_lowercase())));
    method(&mut props, "trim", |_, this, _| Ok(Value::from(this.to_js_string().trim())));
    method(&mut props, "includes", |_, this, args| {
        Ok(Value::Bool(this.to_js_string().contains(arg(args, 0).to_js_string().as_str())))
    });
    method(&mut props, "indexOf", |_, this, args| {
        let haystack = this.to_js_string();
        let needle = arg(args, 0).to_js_string();
        Ok(Value::from(
            haystack
                .find(needle.as_str())
                .map_or(-1.0, |byte| haystack[..byte].chars().count() as f64),
        ))
    });
    method(&mut props, "slice", |_, this, args| {
        let chars: Vec<char> = this.to_js_string().chars().collect();
        let start = relative_index(arg(args, 0).to_number(), chars.len());
        let end = match arg(args, 1) {
            Value::Undefined => chars.len(),
            other => relative_index(other.to_number(), chars.len()),
        };
        let slice: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
        Ok(Value::from(slice))
    });
    method(&mut props, "split", |_, this, args| {
        let text = this.to_js_string();
        let parts: Vec<Value> = match arg(args, 0) {
            Value::Undefined => vec![Value::from(text)],
            separator => {
                let separator = separator.to_js_string();
                if separator.is_empty() {
                    text.chars().map(|c| Value::from(c.to_string())).collect()
                } else {
                    text.split(separator.as_str()).map(Value::from).collect()
                }
            }
        };
        Ok(Value::new_array(parts))
    });
    method(&mut props, "charAt", |_, this, args| {
        let index = arg(args, 0).to_number();
        let index = if index.is_nan() { 0.0 } else { index.trunc() };
        let found = if index < 0.0 { None } else { this.to_js_string().chars().nth(index as usize) };
        Ok(Value::from(found.map(String::from).unwrap_or_default()))
    });
    props
}

fn integer_to_radix(mut n: u64, radix: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let digit = (n % u64::from(radix)) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('?'));
        n /= u64::from(radix);
    }
    digits.iter().rev().collect()
}

fn number_prototype() -> Properties {
    let mut props = Properties::new();
    method(&mut props, "toString", |_, this, args| {
        let n = this.to_number();
        let radix = match arg(args, 0) {
            Value::Undefined => 10.0,
            other => other.to_number(),
        };
        if !(2.0..=36.0).contains(&radix) || radix.fract() != 0.0 {
            return Err(Error::type_error("toString() radix must be between 2 and 36"));
        }
        let radix = radix as u32;
        if radix == 10 || !n.is_finite() || n.fract() != 0.0 || n.abs() >= 2f64.powi(53) {
            return Ok(Value::from(format_number(n)));
        }
        let digits = integer_to_radix(n.abs() as u64, radix);
        Ok(Value::from(if n < 0.0 { format!("-{digits}") } else { digits }))
    });
    method(&mut props, "toFixed", |_, this, args| {
        let n = this.to_number();
        let digits = arg(args, 0).to_number();
        let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
        if !(0.0..=100.0).contains(&digits) {
            return Err(Error::type_error("toFixed() digits argument must be between 0 and 100"));
        }
        if !n.is_finite() || n.abs() >= 1e21 {
            return Ok(Value::from(format_number(n)));
        }
        Ok(Value::from(to_fixed(n, digits as usize)))
    });
    props
}

/// Fixed-point rendering with ties rounded away from zero.
///
/// Works on the exact decimal expansion of `n` so values such as `1.005`
/// (stored just below the tie) round down, as in JavaScript.
fn to_fixed(n: f64, digits: usize) -> String {
    let exact = format!("{:.1074}", n.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int_part.bytes().chain(frac_part.bytes().take(digits)).collect();
    if frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }
    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if n < 0.0 {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|&d| char::from(d)));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|&d| char::from(d)));
    }
    out
}
