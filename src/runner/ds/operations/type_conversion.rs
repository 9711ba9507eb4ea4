use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectKind;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{call, get};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::types::ValueResult;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_SYMBOL: &str = "symbol";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// The result of `typeof`.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Symbol(_) => TYPE_STR_SYMBOL,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => match (**o).borrow().kind {
            ObjectKind::Function(_) => TYPE_STR_FUNCTION,
            _ => TYPE_STR_OBJECT,
        },
    }
}

pub enum PreferredType {
    Default,
    String,
    Number,
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Symbol(_) => true,
        JsValue::Number(n) => !(n.is_nan() || *n == 0.0),
        JsValue::Object(_) => true,
    }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let s = format!("{:e}", n);
        match s.find('e') {
            Some(idx) if !s[idx + 1..].starts_with('-') => {
                format!("{}e+{}", &s[..idx], &s[idx + 1..])
            }
            _ => s,
        }
    } else {
        format!("{}", n)
    }
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// StringToNumber. Anything that is not a complete numeric literal is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let lower = s.to_ascii_lowercase();
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = lower.strip_prefix(prefix) {
            return match u64::from_str_radix(digits, radix) {
                Ok(v) if !digits.is_empty() => v as f64,
                _ => f64::NAN,
            };
        }
    }
    // Rust's float parser also accepts "inf" and "nan", which are not numeric literals.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// ToNumber for values that are already primitive.
pub fn to_number_primitive(v: &JsValue) -> Result<f64, JErrorType> {
    match v {
        JsValue::Undefined => Ok(f64::NAN),
        JsValue::Null => Ok(0.0),
        JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsValue::String(s) => Ok(string_to_number(s)),
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a number".to_string(),
        )),
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(_) => Err(JErrorType::InternalError(
            "to_number_primitive called with an object".to_string(),
        )),
    }
}

/// ToString for values that are already primitive.
pub fn to_string_primitive(v: &JsValue) -> Result<String, JErrorType> {
    match v {
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a string".to_string(),
        )),
        JsValue::Object(_) => Err(JErrorType::InternalError(
            "to_string_primitive called with an object".to_string(),
        )),
        _ => Ok(v.to_string()),
    }
}

pub fn to_primitive(
    ctx: &mut EvalContext,
    v: &JsValue,
    preferred_type: PreferredType,
) -> ValueResult<JsValue> {
    let o = match v {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(Ok(v.clone())),
    };
    let method_names = match preferred_type {
        PreferredType::String => ["toString", "valueOf"],
        PreferredType::Default | PreferredType::Number => ["valueOf", "toString"],
    };
    for name in method_names {
        let method = get(&o, &PropertyKey::from(name));
        if method.is_callable() {
            let result = call(ctx, &method, v.clone(), vec![])?;
            if result.is_abrupt() {
                return Ok(Err(result));
            }
            let result = result.get_value();
            if result.is_primitive() {
                return Ok(Ok(result));
            }
        }
    }
    match ctx.throw_error(JErrorType::TypeError(
        "Cannot convert object to primitive value".to_string(),
    )) {
        Ok(c) => Ok(Err(c)),
        Err(e) => Err(e),
    }
}

pub fn to_number(ctx: &mut EvalContext, v: &JsValue) -> ValueResult<f64> {
    let prim = try_value!(to_primitive(ctx, v, PreferredType::Number), abrupt);
    match to_number_primitive(&prim) {
        Ok(n) => Ok(Ok(n)),
        Err(e) => ctx.throw_error(e).map(Err),
    }
}

pub fn to_string(ctx: &mut EvalContext, v: &JsValue) -> ValueResult<String> {
    let prim = try_value!(to_primitive(ctx, v, PreferredType::String), abrupt);
    match to_string_primitive(&prim) {
        Ok(s) => Ok(Ok(s)),
        Err(e) => ctx.throw_error(e).map(Err),
    }
}

pub fn to_property_key(ctx: &mut EvalContext, v: &JsValue) -> ValueResult<PropertyKey> {
    let prim = try_value!(to_primitive(ctx, v, PreferredType::String), abrupt);
    match prim {
        JsValue::Symbol(s) => Ok(Ok(PropertyKey::Sym(s))),
        other => match to_string_primitive(&other) {
            Ok(s) => Ok(Ok(PropertyKey::Str(s))),
            Err(e) => ctx.throw_error(e).map(Err),
        },
    }
}

/// ToInt32, for the bitwise operators.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc() % 4294967296.0;
    let int = if int < 0.0 { int + 4294967296.0 } else { int };
    (int as u32) as i32
}
