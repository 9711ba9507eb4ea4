//! Error built-in objects.
//!
//! Provides Error, TypeError, ReferenceError, SyntaxError and RangeError. Errors raised by
//! the engine itself are built from the same per-realm prototypes, so a script can catch and
//! inspect them like any error it constructs.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::NativeFn;
use crate::runner::ds::object::{JsObjectType, ObjectKind, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{define_hidden_property, get, set_prototype_of};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::{get_intrinsic, JsCodeRealmType, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::function::get_prototype_from_constructor;
use crate::runner::eval::types::{Completion, EvalResult};
use crate::runner::std_lib::{arg, BuiltInObject};

/// Installs `Error` and the native error constructors into `realm`.
pub fn create_error_intrinsics(realm: &JsCodeRealmType) -> Result<(), JErrorType> {
    let object_proto = get_intrinsic(realm, WellKnownIntrinsics::ObjectPrototype)?;
    let (error_ctor, error_proto) = BuiltInObject::new("Error")
        .with_constructor(error_constructor, 1)
        .add_method("toString", error_prototype_to_string, 0)
        .add_property("name", JsValue::from("Error"))
        .add_property("message", JsValue::from(""))
        .build(realm, Some(object_proto))?;
    let error_ctor = error_ctor.ok_or_else(|| {
        JErrorType::InternalError("Error has no constructor".to_string())
    })?;
    {
        let mut r = realm.borrow_mut();
        r.intrinsics
            .insert(WellKnownIntrinsics::Error, error_ctor.clone());
        r.intrinsics
            .insert(WellKnownIntrinsics::ErrorPrototype, error_proto.clone());
    }

    let native_errors: [(&str, NativeFn, WellKnownIntrinsics, WellKnownIntrinsics); 4] = [
        (
            "RangeError",
            range_error_constructor,
            WellKnownIntrinsics::RangeError,
            WellKnownIntrinsics::RangeErrorPrototype,
        ),
        (
            "ReferenceError",
            reference_error_constructor,
            WellKnownIntrinsics::ReferenceError,
            WellKnownIntrinsics::ReferenceErrorPrototype,
        ),
        (
            "SyntaxError",
            syntax_error_constructor,
            WellKnownIntrinsics::SyntaxError,
            WellKnownIntrinsics::SyntaxErrorPrototype,
        ),
        (
            "TypeError",
            type_error_constructor,
            WellKnownIntrinsics::TypeError,
            WellKnownIntrinsics::TypeErrorPrototype,
        ),
    ];
    for (name, func, ctor_slot, proto_slot) in native_errors {
        let (ctor, proto) = BuiltInObject::new(name)
            .with_constructor(func, 1)
            .add_property("name", JsValue::from(name))
            .add_property("message", JsValue::from(""))
            .build(realm, Some(error_proto.clone()))?;
        let ctor = ctor.ok_or_else(|| {
            JErrorType::InternalError(format!("{} has no constructor", name))
        })?;
        // The native error constructors inherit from Error itself.
        set_prototype_of(&ctor, Some(error_ctor.clone()));
        let mut r = realm.borrow_mut();
        r.intrinsics.insert(ctor_slot, ctor);
        r.intrinsics.insert(proto_slot, proto);
    }
    Ok(())
}

fn prototype_for(err: &JErrorType) -> WellKnownIntrinsics {
    match err {
        JErrorType::TypeError(_) => WellKnownIntrinsics::TypeErrorPrototype,
        JErrorType::ReferenceError(_) => WellKnownIntrinsics::ReferenceErrorPrototype,
        JErrorType::RangeError(_) => WellKnownIntrinsics::RangeErrorPrototype,
        JErrorType::SyntaxError(_) => WellKnownIntrinsics::SyntaxErrorPrototype,
        JErrorType::InternalError(_) => WellKnownIntrinsics::ErrorPrototype,
    }
}

/// An error object of `realm` for an engine raised error.
pub fn create_error_object(
    realm: &JsCodeRealmType,
    err: &JErrorType,
) -> Result<JsObjectType, JErrorType> {
    let proto = get_intrinsic(realm, prototype_for(err))?;
    let o = ObjectType::new(Some(proto), ObjectKind::Error).into_js_object();
    define_hidden_property(&o, "message", JsValue::from(err.message()));
    Ok(o)
}

/// The `name` and `message` of a thrown value, read without running any script code. For
/// values that are not error objects the name is empty and the message is the value itself.
pub fn describe_thrown_value(value: &JsValue) -> (String, String) {
    match value {
        JsValue::Object(o) if (**o).borrow().is_error() => {
            let name = match get(o, &PropertyKey::from("name")) {
                JsValue::String(s) => s,
                _ => "Error".to_string(),
            };
            let message = match get(o, &PropertyKey::from("message")) {
                JsValue::String(s) => s,
                JsValue::Undefined => String::new(),
                other => other.to_string(),
            };
            (name, message)
        }
        other => (String::new(), other.to_string()),
    }
}

/// Shared body of the error constructors. Called without `new`, the active function
/// stands in as new target.
fn construct_error(
    ctx: &mut EvalContext,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
    default_proto: WellKnownIntrinsics,
) -> EvalResult {
    let new_target = match new_target.or_else(|| ctx.running().function.clone()) {
        Some(nt) => nt,
        None => {
            return ctx.throw_error(JErrorType::InternalError(
                "Error constructor invoked without a function context".to_string(),
            ))
        }
    };
    let proto = throw_on_err!(
        ctx,
        get_prototype_from_constructor(&new_target, default_proto)
    );
    let o = ObjectType::new(Some(proto), ObjectKind::Error).into_js_object();
    let message = arg(&args, 0);
    if !message.is_undefined() {
        let message = try_value!(to_string(ctx, &message));
        define_hidden_property(&o, "message", JsValue::String(message));
    }
    Ok(Completion::normal_with_value(JsValue::Object(o)))
}

fn error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    construct_error(ctx, args, new_target, WellKnownIntrinsics::ErrorPrototype)
}

fn type_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    construct_error(ctx, args, new_target, WellKnownIntrinsics::TypeErrorPrototype)
}

fn reference_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    construct_error(
        ctx,
        args,
        new_target,
        WellKnownIntrinsics::ReferenceErrorPrototype,
    )
}

fn syntax_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    construct_error(ctx, args, new_target, WellKnownIntrinsics::SyntaxErrorPrototype)
}

fn range_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    construct_error(ctx, args, new_target, WellKnownIntrinsics::RangeErrorPrototype)
}

/// Error.prototype.toString
fn error_prototype_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let o = match &this {
        JsValue::Object(o) => o.clone(),
        _ => {
            return ctx.throw_error(JErrorType::TypeError(
                "Error.prototype.toString requires that 'this' be an Object".to_string(),
            ))
        }
    };
    let name = match get(&o, &PropertyKey::from("name")) {
        JsValue::Undefined => "Error".to_string(),
        v => try_value!(to_string(ctx, &v)),
    };
    let message = match get(&o, &PropertyKey::from("message")) {
        JsValue::Undefined => String::new(),
        v => try_value!(to_string(ctx, &v)),
    };
    let result = if name.is_empty() {
        message
    } else if message.is_empty() {
        name
    } else {
        format!("{}: {}", name, message)
    };
    Ok(Completion::normal_with_value(JsValue::String(result)))
}
