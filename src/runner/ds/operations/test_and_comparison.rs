use std::rc::Rc;

use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::types::ValueResult;
use crate::runner::ds::operations::type_conversion::{
    string_to_number, to_number, to_primitive, PreferredType,
};

fn same_primitive_or_object(a: &JsValue, b: &JsValue, nan_equal: bool, zero_sign: bool) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Symbol(x), JsValue::Symbol(y)) => x == y,
        (JsValue::Number(x), JsValue::Number(y)) => {
            if x.is_nan() || y.is_nan() {
                nan_equal && x.is_nan() && y.is_nan()
            } else if zero_sign && *x == 0.0 && *y == 0.0 {
                x.is_sign_negative() == y.is_sign_negative()
            } else {
                x == y
            }
        }
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// SameValue: NaN equals NaN and +0 differs from -0.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    same_primitive_or_object(a, b, true, true)
}

/// The `===` comparison.
pub fn strict_equality(a: &JsValue, b: &JsValue) -> bool {
    same_primitive_or_object(a, b, false, false)
}

/// The `==` comparison. Objects compared with primitives go through ToPrimitive, which
/// may run script code.
pub fn loose_equality(ctx: &mut EvalContext, a: &JsValue, b: &JsValue) -> ValueResult<bool> {
    let mut x = a.clone();
    let mut y = b.clone();
    loop {
        match (&x, &y) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => {
                return Ok(Ok(true))
            }
            (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
                return Ok(Ok(false))
            }
            (JsValue::Number(n), JsValue::String(s)) => {
                return Ok(Ok(*n == string_to_number(s)))
            }
            (JsValue::String(s), JsValue::Number(n)) => {
                return Ok(Ok(string_to_number(s) == *n))
            }
            (JsValue::Boolean(_), _) => {
                x = JsValue::Number(try_value!(to_number(ctx, &x), abrupt));
            }
            (_, JsValue::Boolean(_)) => {
                y = JsValue::Number(try_value!(to_number(ctx, &y), abrupt));
            }
            (JsValue::Object(_), JsValue::Object(_)) => return Ok(Ok(strict_equality(&x, &y))),
            (JsValue::Object(_), _) => {
                x = try_value!(to_primitive(ctx, &x, PreferredType::Default), abrupt);
            }
            (_, JsValue::Object(_)) => {
                y = try_value!(to_primitive(ctx, &y, PreferredType::Default), abrupt);
            }
            _ => return Ok(Ok(strict_equality(&x, &y))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_distinguishes_zero_signs() {
        assert!(!same_value(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
        assert!(strict_equality(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
    }

    #[test]
    fn nan_is_only_same_value_equal() {
        assert!(same_value(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
        assert!(!strict_equality(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
    }

    #[test]
    fn strings_compare_by_content() {
        assert!(strict_equality(&JsValue::from("ab"), &JsValue::from("ab")));
        assert!(!strict_equality(&JsValue::from("1"), &JsValue::Number(1.0)));
    }
}
