//! Realm bootstrap: the fundamental intrinsics and the default global bindings.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{create_builtin_function, FunctionKind, FunctionObject};
use crate::runner::ds::object::{JsObjectType, ObjectKind, ObjectType};
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::object::{
    call, define_hidden_property, define_property_or_throw, get, object_create,
};
use crate::runner::ds::operations::type_conversion::{to_property_key, to_string};
use crate::runner::ds::realm::{get_intrinsic, JsCodeRealmType, WellKnownIntrinsics};
use crate::runner::ds::symbol::{SymbolData, SYMBOL_TO_STRING_TAG};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::types::{Completion, EvalResult};
use crate::runner::std_lib::console::create_console_object;
use crate::runner::std_lib::error::create_error_intrinsics;
use crate::runner::std_lib::shadow_realm::create_shadow_realm_intrinsics;
use crate::runner::std_lib::{arg, install_methods};

fn add_intrinsic(realm: &JsCodeRealmType, which: WellKnownIntrinsics, o: JsObjectType) {
    realm.borrow_mut().intrinsics.insert(which, o);
}

/// CreateIntrinsics. `Object.prototype` and `Function.prototype` come first since every
/// other built-in hangs off them.
pub fn create_intrinsics(realm: &JsCodeRealmType) -> Result<(), JErrorType> {
    let object_proto = object_create(None);
    add_intrinsic(realm, WellKnownIntrinsics::ObjectPrototype, object_proto.clone());

    let function_proto = ObjectType::new(
        Some(object_proto.clone()),
        ObjectKind::Function(FunctionObject {
            realm: realm.clone(),
            kind: FunctionKind::Native {
                func: function_prototype,
                is_constructor: false,
            },
        }),
    )
    .into_js_object();
    add_intrinsic(realm, WellKnownIntrinsics::FunctionPrototype, function_proto.clone());

    install_methods(
        realm,
        &object_proto,
        &[
            ("toString", object_prototype_to_string, 0),
            ("hasOwnProperty", object_prototype_has_own_property, 1),
            ("valueOf", object_prototype_value_of, 0),
        ],
    )?;
    install_methods(
        realm,
        &function_proto,
        &[
            ("toString", function_prototype_to_string, 0),
            ("call", function_prototype_call, 1),
        ],
    )?;

    create_error_intrinsics(realm)?;
    create_shadow_realm_intrinsics(realm)?;

    let symbol = create_builtin_function(realm, symbol_function, "Symbol", 0, false)?;
    define_property_or_throw(
        &symbol,
        "toStringTag".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_frozen(
            JsValue::Symbol(SYMBOL_TO_STRING_TAG.clone()),
        )),
    )?;
    add_intrinsic(realm, WellKnownIntrinsics::Symbol, symbol);
    Ok(())
}

/// SetDefaultGlobalBindings.
pub fn set_default_global_bindings(realm: &JsCodeRealmType) -> Result<(), JErrorType> {
    let global = (**realm).borrow().get_global_object()?;
    define_hidden_property(&global, "globalThis", JsValue::Object(global.clone()));
    for (name, value) in [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::Number(f64::NAN)),
        ("Infinity", JsValue::Number(f64::INFINITY)),
    ] {
        define_property_or_throw(
            &global,
            name.into(),
            PropertyDescriptorSetter::new_from_property_descriptor(
                PropertyDescriptor::new_frozen(value),
            ),
        )?;
    }
    for (name, which) in [
        ("Error", WellKnownIntrinsics::Error),
        ("RangeError", WellKnownIntrinsics::RangeError),
        ("ReferenceError", WellKnownIntrinsics::ReferenceError),
        ("SyntaxError", WellKnownIntrinsics::SyntaxError),
        ("TypeError", WellKnownIntrinsics::TypeError),
        ("ShadowRealm", WellKnownIntrinsics::ShadowRealm),
        ("Symbol", WellKnownIntrinsics::Symbol),
    ] {
        define_hidden_property(&global, name, JsValue::Object(get_intrinsic(realm, which)?));
    }
    define_hidden_property(
        &global,
        "console",
        JsValue::Object(create_console_object(realm)?),
    );
    Ok(())
}

fn function_prototype(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    Ok(Completion::normal_with_value(JsValue::Undefined))
}

fn object_prototype_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let tag = match &this {
        JsValue::Undefined => "Undefined".to_string(),
        JsValue::Null => "Null".to_string(),
        JsValue::Boolean(_) => "Boolean".to_string(),
        JsValue::Number(_) => "Number".to_string(),
        JsValue::String(_) => "String".to_string(),
        JsValue::Symbol(_) => "Symbol".to_string(),
        JsValue::Object(o) => {
            match get(o, &PropertyKey::Sym(SYMBOL_TO_STRING_TAG.clone())) {
                JsValue::String(tag) => tag,
                _ => {
                    let obj = (**o).borrow();
                    if obj.is_callable() {
                        "Function".to_string()
                    } else if obj.is_error() {
                        "Error".to_string()
                    } else {
                        "Object".to_string()
                    }
                }
            }
        }
    };
    Ok(Completion::normal_with_value(JsValue::String(format!(
        "[object {}]",
        tag
    ))))
}

fn object_prototype_has_own_property(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let key = try_value!(to_property_key(ctx, &arg(&args, 0)));
    let has = match &this {
        JsValue::Object(o) => (**o).borrow().has_own_property(&key),
        JsValue::Undefined | JsValue::Null => {
            return ctx.throw_error(JErrorType::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            ))
        }
        _ => false,
    };
    Ok(Completion::normal_with_value(JsValue::Boolean(has)))
}

fn object_prototype_value_of(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    if this.is_nullish() {
        return ctx.throw_error(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        ));
    }
    Ok(Completion::normal_with_value(this))
}

fn function_prototype_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    if !this.is_callable() {
        return ctx.throw_error(JErrorType::TypeError(
            "Function.prototype.toString requires that 'this' be a Function".to_string(),
        ));
    }
    Ok(Completion::normal_with_value(JsValue::String(
        this.to_string(),
    )))
}

fn function_prototype_call(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let mut args = args.into_iter();
    let this_arg = args.next().unwrap_or(JsValue::Undefined);
    call(ctx, &this, this_arg, args.collect())
}

/// `Symbol(description)`. Not a constructor.
fn symbol_function(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let description = match arg(&args, 0) {
        JsValue::Undefined => None,
        d => Some(try_value!(to_string(ctx, &d))),
    };
    Ok(Completion::normal_with_value(JsValue::Symbol(SymbolData::new(
        description,
    ))))
}
