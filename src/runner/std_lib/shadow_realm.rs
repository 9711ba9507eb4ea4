//! The `ShadowRealm` built-in: evaluation and module import inside a separate realm, with
//! only primitives and callables allowed across the boundary.

use tracing::debug;

use crate::parser::JsParser;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::function_object::{
    function_object_create, get_function_realm, FunctionKind,
};
use crate::runner::ds::object::{JsObjectType, ObjectKind, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{call, get};
use crate::runner::ds::realm::{
    get_intrinsic, initialize_host_defined_realm, JsCodeRealmType, WellKnownIntrinsics,
};
use crate::runner::ds::symbol::SYMBOL_TO_STRING_TAG;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::function::get_prototype_from_constructor;
use crate::runner::eval::script::strict_eval_evaluation;
use crate::runner::eval::types::{Completion, EvalResult};
use crate::runner::module::{load_module, ModuleError};
use crate::runner::std_lib::error::describe_thrown_value;
use crate::runner::std_lib::{arg, BuiltInObject};

pub fn create_shadow_realm_intrinsics(realm: &JsCodeRealmType) -> Result<(), JErrorType> {
    let object_proto = get_intrinsic(realm, WellKnownIntrinsics::ObjectPrototype)?;
    let (ctor, proto) = BuiltInObject::new("ShadowRealm")
        .with_constructor(shadow_realm_constructor, 0)
        .add_method("evaluate", shadow_realm_evaluate, 1)
        .add_method("importValue", shadow_realm_import_value_method, 2)
        .add_property(
            PropertyKey::Sym(SYMBOL_TO_STRING_TAG.clone()),
            JsValue::from("ShadowRealm"),
        )
        .build(realm, Some(object_proto))?;
    let ctor = ctor.ok_or_else(|| {
        JErrorType::InternalError("ShadowRealm has no constructor".to_string())
    })?;
    let mut r = realm.borrow_mut();
    r.intrinsics.insert(WellKnownIntrinsics::ShadowRealm, ctor);
    r.intrinsics
        .insert(WellKnownIntrinsics::ShadowRealmPrototype, proto);
    Ok(())
}

/// `new ShadowRealm()`: a fresh realm with its own intrinsics and global object.
fn shadow_realm_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    let new_target = match new_target {
        Some(nt) => nt,
        None => {
            return ctx.throw_error(JErrorType::TypeError(
                "Constructor ShadowRealm requires 'new'".to_string(),
            ))
        }
    };
    let proto = throw_on_err!(
        ctx,
        get_prototype_from_constructor(&new_target, WellKnownIntrinsics::ShadowRealmPrototype)
    );
    let inner = throw_on_err!(ctx, initialize_host_defined_realm());
    let o = ObjectType::new(Some(proto), ObjectKind::ShadowRealm(inner)).into_js_object();
    Ok(Completion::normal_with_value(JsValue::Object(o)))
}

/// ValidateShadowRealmObject.
fn validate_shadow_realm_object(this: &JsValue) -> Result<JsCodeRealmType, JErrorType> {
    let realm = match this {
        JsValue::Object(o) => (**o).borrow().as_shadow_realm().cloned(),
        _ => None,
    };
    realm.ok_or_else(|| JErrorType::TypeError("object must be a ShadowRealm".to_string()))
}

/// ShadowRealm.prototype.evaluate
fn shadow_realm_evaluate(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let eval_realm = throw_on_err!(ctx, validate_shadow_realm_object(&this));
    let source_text = match arg(&args, 0) {
        JsValue::String(s) => s,
        _ => {
            return ctx.throw_error(JErrorType::TypeError(
                "ShadowRealm.prototype.evaluate: source text must be a string".to_string(),
            ))
        }
    };
    let caller_realm = ctx.current_realm();
    perform_shadow_realm_eval(ctx, &source_text, &caller_realm, &eval_realm)
}

/// ShadowRealm.prototype.importValue
fn shadow_realm_import_value_method(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    let eval_realm = throw_on_err!(ctx, validate_shadow_realm_object(&this));
    let specifier = match arg(&args, 0) {
        JsValue::String(s) => s,
        _ => {
            return ctx.throw_error(JErrorType::TypeError(
                "ShadowRealm.prototype.importValue: specifier must be a string".to_string(),
            ))
        }
    };
    let export_name = match arg(&args, 1) {
        JsValue::String(s) => s,
        _ => {
            return ctx.throw_error(JErrorType::TypeError(
                "ShadowRealm.prototype.importValue: export name must be a string".to_string(),
            ))
        }
    };
    let caller_realm = ctx.current_realm();
    shadow_realm_import_value(ctx, &specifier, &export_name, &caller_realm, &eval_realm)
}

fn describe_failure(value: &JsValue) -> String {
    match describe_thrown_value(value) {
        (name, message) if name.is_empty() => message,
        (name, message) if message.is_empty() => name,
        (name, message) => format!("{}: {}", name, message),
    }
}

/// PerformShadowRealmEval. Parse errors are reported in the caller realm as they are;
/// anything thrown inside `eval_realm` comes back as a TypeError of the caller realm.
#[tracing::instrument(level = "debug", skip_all, fields(len = source_text.len()))]
pub fn perform_shadow_realm_eval(
    ctx: &mut EvalContext,
    source_text: &str,
    caller_realm: &JsCodeRealmType,
    eval_realm: &JsCodeRealmType,
) -> EvalResult {
    let program = match JsParser::parse_script(source_text) {
        Ok(p) => p,
        Err(e) => {
            return ctx.throw_error_in_realm(caller_realm, JErrorType::SyntaxError(e.to_string()))
        }
    };
    let result = strict_eval_evaluation(ctx, &program, eval_realm)?;
    if result.is_abrupt() {
        let message = describe_failure(&result.get_value());
        debug!(%message, "shadow realm evaluation threw");
        return ctx.throw_error_in_realm(
            caller_realm,
            JErrorType::TypeError(format!("ShadowRealm evaluation failed: {}", message)),
        );
    }
    get_wrapped_value(ctx, caller_realm, result.get_value())
}

/// ShadowRealmImportValue. Imports run synchronously: the module is loaded and evaluated
/// before this returns, and the export is handed back directly.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(specifier = specifier, export = export_name)
)]
pub fn shadow_realm_import_value(
    ctx: &mut EvalContext,
    specifier: &str,
    export_name: &str,
    caller_realm: &JsCodeRealmType,
    eval_realm: &JsCodeRealmType,
) -> EvalResult {
    let module = match load_module(ctx, eval_realm, specifier) {
        Ok(m) => m,
        Err(ModuleError::Engine(e)) => return Err(e),
        Err(e) => {
            return ctx.throw_error_in_realm(
                caller_realm,
                JErrorType::TypeError(format!("Cannot import '{}': {}", specifier, e)),
            )
        }
    };
    let export = module.borrow().get_export(export_name);
    let value = match export {
        Ok(Some(v)) => v,
        Ok(None) => {
            return ctx.throw_error_in_realm(
                caller_realm,
                JErrorType::TypeError(format!(
                    "'{}' is not exported by '{}'",
                    export_name, specifier
                )),
            )
        }
        Err(e) => {
            return ctx.throw_error_in_realm(
                caller_realm,
                JErrorType::TypeError(format!("Cannot import '{}': {}", specifier, e)),
            )
        }
    };
    get_wrapped_value(ctx, caller_realm, value)
}

/// GetWrappedValue: primitives cross as they are, callables as a wrapped function created
/// in `realm`. Any other object is refused with a TypeError of the current realm.
pub fn get_wrapped_value(
    ctx: &mut EvalContext,
    realm: &JsCodeRealmType,
    value: JsValue,
) -> EvalResult {
    match value {
        JsValue::Object(o) => {
            if !(*o).borrow().is_callable() {
                return ctx.throw_error(JErrorType::TypeError(
                    "Only primitives and callables can cross a ShadowRealm boundary".to_string(),
                ));
            }
            let wrapped = throw_on_err!(ctx, wrapped_function_create(realm, &o));
            Ok(Completion::normal_with_value(JsValue::Object(wrapped)))
        }
        primitive => Ok(Completion::normal_with_value(primitive)),
    }
}

/// WrappedFunctionCreate. The wrapper copies the target's `name` and `length`.
pub fn wrapped_function_create(
    realm: &JsCodeRealmType,
    target: &JsObjectType,
) -> Result<JsObjectType, JErrorType> {
    let name = match get(target, &PropertyKey::from("name")) {
        JsValue::String(s) => s,
        _ => String::new(),
    };
    let length = match get(target, &PropertyKey::from("length")) {
        JsValue::Number(n) if n.is_finite() && n > 0.0 => n as usize,
        _ => 0,
    };
    function_object_create(
        realm,
        FunctionKind::Wrapped {
            target: target.clone(),
        },
        &name,
        length,
    )
}

/// [[Call]] of a wrapped function. Arguments are wrapped into the target's realm, the
/// target runs there with an undefined `this`, and its result or thrown value is wrapped
/// back into the wrapper's realm.
#[tracing::instrument(level = "debug", skip_all)]
pub fn call_wrapped_function(
    ctx: &mut EvalContext,
    f: &JsObjectType,
    args: Vec<JsValue>,
) -> EvalResult {
    let parts = {
        let o = (**f).borrow();
        match o.as_function_object() {
            Some(fo) => match &fo.kind {
                FunctionKind::Wrapped { target } => Some((fo.realm.clone(), target.clone())),
                _ => None,
            },
            None => None,
        }
    };
    let (caller_realm, target) = match parts {
        Some(parts) => parts,
        None => {
            return ctx.throw_error(JErrorType::InternalError(
                "Not a wrapped function".to_string(),
            ))
        }
    };
    let mut caller_ec = throw_on_err!(ctx, ExecutionContext::new_for_realm(&caller_realm, true));
    caller_ec.function = Some(f.clone());
    ctx.with_execution_context(caller_ec, |ctx| {
        let target_realm = throw_on_err!(ctx, get_function_realm(&target));
        let mut wrapped_args = Vec::with_capacity(args.len());
        for a in args {
            wrapped_args.push(completion_value!(get_wrapped_value(ctx, &target_realm, a)));
        }
        debug!("calling across a realm boundary");
        let target_ec = throw_on_err!(ctx, ExecutionContext::new_for_realm(&target_realm, true));
        let result = ctx.with_execution_context(target_ec, |ctx| {
            call(
                ctx,
                &JsValue::Object(target.clone()),
                JsValue::Undefined,
                wrapped_args,
            )
        })?;
        if result.is_throw() {
            let thrown = result.get_value();
            if thrown.is_primitive() || thrown.is_callable() {
                let rethrown = completion_value!(get_wrapped_value(ctx, &caller_realm, thrown));
                return Ok(Completion::throw(rethrown));
            }
            return ctx.throw_error(JErrorType::TypeError(describe_failure(&thrown)));
        }
        if result.is_abrupt() {
            return Ok(result);
        }
        get_wrapped_value(ctx, &caller_realm, result.get_value())
    })
}
