//! Function objects: creation from function syntax, [[Call]] and [[Construct]].

use std::rc::Rc;

use tracing::trace;

use crate::parser::ast::FunctionData;
use crate::runner::ds::env_record::{new_declarative_environment, new_function_environment};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::function_object::{
    function_object_create, get_function_realm, FunctionKind, NativeFn, ScriptFunction, ThisMode,
};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::object::{
    define_hidden_property, define_property_or_throw, get, object_create,
};
use crate::runner::ds::realm::{get_intrinsic, JsCodeRealmType, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::declaration::function_declaration_instantiation;
use crate::runner::eval::statement::evaluate_statement_list;
use crate::runner::eval::types::{Completion, CompletionType, EvalResult};
use crate::runner::std_lib::shadow_realm::call_wrapped_function;

enum Callee {
    Script {
        code: Rc<FunctionData>,
        this_mode: ThisMode,
        strict: bool,
    },
    Native(NativeFn),
    Wrapped,
}

fn inspect_callee(f: &JsObjectType) -> Option<(JsCodeRealmType, Callee)> {
    let o = (**f).borrow();
    let fo = o.as_function_object()?;
    let callee = match &fo.kind {
        FunctionKind::Script(s) => Callee::Script {
            code: s.code.clone(),
            this_mode: s.this_mode,
            strict: s.strict,
        },
        FunctionKind::Native { func, .. } => Callee::Native(*func),
        FunctionKind::Wrapped { .. } => Callee::Wrapped,
    };
    Some((fo.realm.clone(), callee))
}

/// OrdinaryCallBindThis.
fn ordinary_call_bind_this(
    realm: &JsCodeRealmType,
    this_mode: ThisMode,
    local_env: &JsLexEnvironmentType,
    this_argument: JsValue,
) -> Result<(), JErrorType> {
    let this_value = match this_mode {
        ThisMode::Lexical => return Ok(()),
        ThisMode::Strict => this_argument,
        ThisMode::Global => {
            if this_argument.is_nullish() {
                JsValue::Object((**realm).borrow().get_global_object()?)
            } else {
                this_argument
            }
        }
    };
    let mut env = local_env.borrow_mut();
    match env.inner.as_function_mut() {
        Some(f) => f.bind_this_value(this_value),
        None => Err(JErrorType::InternalError(
            "Function call without a function environment".to_string(),
        )),
    }
}

fn ordinary_call_evaluate_body(
    ctx: &mut EvalContext,
    code: &FunctionData,
    args: Vec<JsValue>,
) -> EvalResult {
    throw_on_err!(ctx, function_declaration_instantiation(ctx, code, args));
    evaluate_statement_list(&code.body.body, ctx)
}

fn native_context(
    f: &JsObjectType,
    realm: &JsCodeRealmType,
) -> Result<ExecutionContext, JErrorType> {
    let mut ec = ExecutionContext::new_for_realm(realm, true)?;
    ec.function = Some(f.clone());
    Ok(ec)
}

/// [[Call]] of a function object.
pub fn call_function_object(
    ctx: &mut EvalContext,
    f: &JsObjectType,
    this: JsValue,
    args: Vec<JsValue>,
) -> EvalResult {
    let (realm, callee) = match inspect_callee(f) {
        Some(c) => c,
        None => {
            return ctx.throw_error(JErrorType::TypeError("object is not a function".to_string()))
        }
    };
    ctx.with_call_depth(|ctx| match callee {
        Callee::Native(func) => {
            let ec = throw_on_err!(ctx, native_context(f, &realm));
            ctx.with_execution_context(ec, |ctx| func(ctx, this, args, None))
        }
        Callee::Wrapped => call_wrapped_function(ctx, f, args),
        Callee::Script {
            code,
            this_mode,
            strict,
        } => {
            trace!(function = code.name(), "call");
            let local_env = throw_on_err!(ctx, new_function_environment(f.clone(), None));
            let ec = ExecutionContext {
                function: Some(f.clone()),
                realm: realm.clone(),
                lex_env: local_env.clone(),
                var_env: local_env.clone(),
                strict,
            };
            ctx.with_execution_context(ec, |ctx| {
                throw_on_err!(
                    ctx,
                    ordinary_call_bind_this(&realm, this_mode, &local_env, this)
                );
                let result = ordinary_call_evaluate_body(ctx, &code, args)?;
                Ok(match result.completion_type {
                    CompletionType::Return => Completion::normal_with_value(result.get_value()),
                    CompletionType::Throw => result,
                    _ => Completion::normal_with_value(JsValue::Undefined),
                })
            })
        }
    })
}

/// [[Construct]] of a function object.
pub fn construct_function_object(
    ctx: &mut EvalContext,
    f: &JsObjectType,
    args: Vec<JsValue>,
    new_target: JsObjectType,
) -> EvalResult {
    let (realm, callee) = match inspect_callee(f) {
        Some(c) => c,
        None => {
            return ctx
                .throw_error(JErrorType::TypeError("object is not a constructor".to_string()))
        }
    };
    ctx.with_call_depth(|ctx| match callee {
        Callee::Native(func) => {
            let ec = throw_on_err!(ctx, native_context(f, &realm));
            ctx.with_execution_context(ec, |ctx| {
                func(ctx, JsValue::Undefined, args, Some(new_target))
            })
        }
        Callee::Wrapped => {
            ctx.throw_error(JErrorType::TypeError("object is not a constructor".to_string()))
        }
        Callee::Script {
            code,
            this_mode,
            strict,
        } => {
            trace!(function = code.name(), "construct");
            let proto = throw_on_err!(
                ctx,
                get_prototype_from_constructor(&new_target, WellKnownIntrinsics::ObjectPrototype)
            );
            let this_argument = object_create(Some(proto));
            let local_env = throw_on_err!(
                ctx,
                new_function_environment(f.clone(), Some(new_target.clone()))
            );
            let ec = ExecutionContext {
                function: Some(f.clone()),
                realm: realm.clone(),
                lex_env: local_env.clone(),
                var_env: local_env.clone(),
                strict,
            };
            ctx.with_execution_context(ec, |ctx| {
                throw_on_err!(
                    ctx,
                    ordinary_call_bind_this(
                        &realm,
                        this_mode,
                        &local_env,
                        JsValue::Object(this_argument.clone())
                    )
                );
                let result = ordinary_call_evaluate_body(ctx, &code, args)?;
                Ok(match result.completion_type {
                    CompletionType::Throw => result,
                    CompletionType::Return if matches!(result.value, Some(JsValue::Object(_))) => {
                        Completion::normal_with_value(result.get_value())
                    }
                    _ => Completion::normal_with_value(JsValue::Object(this_argument)),
                })
            })
        }
    })
}

/// GetPrototypeFromConstructor. Falls back to the intrinsic of the constructor's realm.
pub fn get_prototype_from_constructor(
    constructor: &JsObjectType,
    default: WellKnownIntrinsics,
) -> Result<JsObjectType, JErrorType> {
    match get(constructor, &"prototype".into()) {
        JsValue::Object(proto) => Ok(proto),
        _ => {
            let realm = get_function_realm(constructor)?;
            get_intrinsic(&realm, default)
        }
    }
}

/// Gives `f` a fresh `prototype` object whose `constructor` points back at `f`.
pub fn make_constructor(realm: &JsCodeRealmType, f: &JsObjectType) -> Result<(), JErrorType> {
    let proto = object_create(Some(get_intrinsic(
        realm,
        WellKnownIntrinsics::ObjectPrototype,
    )?));
    define_hidden_property(&proto, "constructor", JsValue::Object(f.clone()));
    define_property_or_throw(
        f,
        "prototype".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new(
            JsValue::Object(proto),
            true,
            false,
            false,
        )),
    )
}

/// OrdinaryFunctionCreate. Code inside a strict context, or with its own directive, is strict.
pub fn ordinary_function_create(
    realm: &JsCodeRealmType,
    code: Rc<FunctionData>,
    environment: JsLexEnvironmentType,
    strict_context: bool,
    name: &str,
    home_object: Option<JsObjectType>,
) -> Result<JsObjectType, JErrorType> {
    let strict = strict_context || code.has_use_strict;
    let this_mode = if code.is_arrow {
        ThisMode::Lexical
    } else if strict {
        ThisMode::Strict
    } else {
        ThisMode::Global
    };
    let is_constructor = !code.is_arrow && !code.is_method;
    let length = code.params.len();
    let f = function_object_create(
        realm,
        FunctionKind::Script(ScriptFunction {
            code,
            environment,
            this_mode,
            strict,
            is_constructor,
            home_object,
        }),
        name,
        length,
    )?;
    if is_constructor {
        make_constructor(realm, &f)?;
    }
    Ok(f)
}

/// InstantiateFunctionObject, for hoisted function declarations.
pub fn instantiate_function_object(
    ctx: &EvalContext,
    code: &Rc<FunctionData>,
    env: JsLexEnvironmentType,
    name: &str,
) -> Result<JsObjectType, JErrorType> {
    ordinary_function_create(
        &ctx.current_realm(),
        code.clone(),
        env,
        ctx.is_strict(),
        name,
        None,
    )
}

/// A function expression. A named one gets its own scope binding its name to itself.
pub fn instantiate_ordinary_function_expression(
    ctx: &EvalContext,
    code: &Rc<FunctionData>,
    name: &str,
) -> Result<JsObjectType, JErrorType> {
    let realm = ctx.current_realm();
    match &code.id {
        Some(id) => {
            let func_env = new_declarative_environment(Some(ctx.lex_env()));
            func_env
                .borrow_mut()
                .inner
                .as_env_record_mut()
                .create_immutable_binding(id.name.to_string(), false)?;
            let closure = ordinary_function_create(
                &realm,
                code.clone(),
                func_env.clone(),
                ctx.is_strict(),
                &id.name,
                None,
            )?;
            func_env
                .borrow_mut()
                .inner
                .as_env_record_mut()
                .initialize_binding(&id.name, JsValue::Object(closure.clone()))?;
            Ok(closure)
        }
        None => ordinary_function_create(
            &realm,
            code.clone(),
            ctx.lex_env(),
            ctx.is_strict(),
            name,
            None,
        ),
    }
}

pub fn instantiate_arrow_function_expression(
    ctx: &EvalContext,
    code: &Rc<FunctionData>,
    name: &str,
) -> Result<JsObjectType, JErrorType> {
    ordinary_function_create(
        &ctx.current_realm(),
        code.clone(),
        ctx.lex_env(),
        ctx.is_strict(),
        name,
        None,
    )
}

/// DefineMethod for object literal methods, whose home object is the literal.
pub fn define_method(
    ctx: &EvalContext,
    code: &Rc<FunctionData>,
    home_object: &JsObjectType,
    name: &str,
) -> Result<JsObjectType, JErrorType> {
    ordinary_function_create(
        &ctx.current_realm(),
        code.clone(),
        ctx.lex_env(),
        ctx.is_strict(),
        name,
        Some(home_object.clone()),
    )
}
