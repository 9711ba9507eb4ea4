//! Declaration instantiation: the hoisting phase run on entry to a scope, before any of its
//! statements execute.

use std::collections::HashSet;

use crate::parser::ast::{FunctionData, StatementType};
use crate::parser::static_semantics::{
    block_function_declarations, lexically_scoped_declarations, var_declared_names,
    var_scoped_function_declarations, HoistedFunction,
};
use crate::runner::ds::env_record::{EnvironmentRecordType, GlobalEnvironmentRecord};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::function::instantiate_function_object;

/// Function declarations to initialize, one per name, the last declaration winning.
fn functions_to_initialize(body: &[StatementType]) -> Vec<HoistedFunction> {
    let mut declared = HashSet::new();
    let mut functions = vec![];
    for f in var_scoped_function_declarations(body).into_iter().rev() {
        if declared.insert(f.binding_name.to_string()) {
            functions.push(f);
        }
    }
    functions.reverse();
    functions
}

/// The `name` of a hoisted function. Anonymous default exports are called "default".
fn function_name(f: &HoistedFunction) -> &str {
    match &f.data.id {
        Some(id) => id.name.as_str(),
        None => "default",
    }
}

fn with_global_record<R>(
    env: &JsLexEnvironmentType,
    f: impl FnOnce(&mut GlobalEnvironmentRecord) -> Result<R, JErrorType>,
) -> Result<R, JErrorType> {
    let mut env = env.borrow_mut();
    match env.inner.as_global_mut() {
        Some(global) => f(global),
        None => Err(JErrorType::InternalError(
            "Expected the global environment".to_string(),
        )),
    }
}

fn create_lexical_bindings(
    env: &JsLexEnvironmentType,
    body: &[StatementType],
    top_level: bool,
) -> Result<(), JErrorType> {
    let mut env = env.borrow_mut();
    for binding in lexically_scoped_declarations(body, top_level) {
        let declared = env.inner.has_lexical_binding(&binding.name);
        let record = env.inner.as_env_record_mut();
        if binding.is_constant {
            record.create_immutable_binding(binding.name, true)?;
        } else if !declared {
            record.create_mutable_binding(binding.name, false)?;
        }
    }
    Ok(())
}

/// GlobalDeclarationInstantiation for a script about to run in `env`.
pub fn global_declaration_instantiation(
    ctx: &EvalContext,
    body: &[StatementType],
    env: &JsLexEnvironmentType,
) -> Result<(), JErrorType> {
    let lex_names = lexically_scoped_declarations(body, true);
    let functions = functions_to_initialize(body);
    let function_names: HashSet<&str> =
        functions.iter().map(|f| f.binding_name.as_str()).collect();
    let var_names = var_declared_names(body);

    with_global_record(env, |global| {
        for binding in &lex_names {
            if global.has_var_declaration(&binding.name)
                || global.has_lexical_declaration(&binding.name)
            {
                return Err(JErrorType::SyntaxError(format!(
                    "Identifier '{}' has already been declared",
                    binding.name
                )));
            }
            if global.has_restricted_global_property(&binding.name) {
                return Err(JErrorType::SyntaxError(format!(
                    "Cannot redeclare restricted global '{}'",
                    binding.name
                )));
            }
        }
        for name in var_names.iter().map(|n| n.as_str()).chain(function_names.iter().copied()) {
            if global.has_lexical_declaration(name) {
                return Err(JErrorType::SyntaxError(format!(
                    "Identifier '{}' has already been declared",
                    name
                )));
            }
        }
        for f in &functions {
            if !global.can_declare_global_function(&f.binding_name) {
                return Err(JErrorType::TypeError(format!(
                    "Cannot declare global function '{}'",
                    f.binding_name
                )));
            }
        }
        for name in &var_names {
            if !function_names.contains(name.as_str()) && !global.can_declare_global_var(name) {
                return Err(JErrorType::TypeError(format!(
                    "Cannot declare global variable '{}'",
                    name
                )));
            }
        }
        Ok(())
    })?;

    create_lexical_bindings(env, body, true)?;
    for f in &functions {
        let fo = instantiate_function_object(ctx, &f.data, env.clone(), function_name(f))?;
        with_global_record(env, |global| {
            global.create_global_function_binding(
                f.binding_name.to_string(),
                JsValue::Object(fo),
                false,
            )
        })?;
    }
    with_global_record(env, |global| {
        for name in var_names {
            if !function_names.contains(name.as_str()) {
                global.create_global_var_binding(name, false)?;
            }
        }
        Ok(())
    })
}

/// Hoisting for a scope that is both the var and the lexical scope: strict eval code, module
/// bodies and function bodies. Vars start as undefined, functions as fresh closures and
/// lexical bindings uninitialized.
pub fn var_scope_declaration_instantiation(
    ctx: &EvalContext,
    body: &[StatementType],
    env: &JsLexEnvironmentType,
) -> Result<(), JErrorType> {
    let functions = functions_to_initialize(body);
    {
        let mut e = env.borrow_mut();
        let record = e.inner.as_env_record_mut();
        let function_names = functions.iter().map(|f| f.binding_name.to_string());
        for name in var_declared_names(body).into_iter().chain(function_names) {
            if !record.has_binding(&name) {
                record.create_mutable_binding(name.to_string(), false)?;
                record.initialize_binding(&name, JsValue::Undefined)?;
            }
        }
    }
    create_lexical_bindings(env, body, true)?;
    for f in &functions {
        let fo = instantiate_function_object(ctx, &f.data, env.clone(), function_name(f))?;
        env.borrow_mut().inner.as_env_record_mut().set_mutable_binding(
            &f.binding_name,
            JsValue::Object(fo),
            false,
        )?;
    }
    Ok(())
}

/// FunctionDeclarationInstantiation, run in the callee's freshly pushed context.
pub fn function_declaration_instantiation(
    ctx: &EvalContext,
    code: &FunctionData,
    args: Vec<JsValue>,
) -> Result<(), JErrorType> {
    let env = ctx.lex_env();
    {
        let mut e = env.borrow_mut();
        let record = e.inner.as_env_record_mut();
        for param in &code.params {
            if !record.has_binding(&param.name) {
                record.create_mutable_binding(param.name.to_string(), false)?;
                record.initialize_binding(&param.name, JsValue::Undefined)?;
            }
        }
        // With duplicate parameter names the last one wins.
        let mut args = args.into_iter();
        for param in &code.params {
            let value = args.next().unwrap_or(JsValue::Undefined);
            record.set_mutable_binding(&param.name, value, false)?;
        }
    }
    var_scope_declaration_instantiation(ctx, &code.body.body, &env)
}

/// BlockDeclarationInstantiation. Block level functions are lexical and initialized on entry.
pub fn block_declaration_instantiation(
    ctx: &EvalContext,
    body: &[StatementType],
    env: &JsLexEnvironmentType,
) -> Result<(), JErrorType> {
    create_lexical_bindings(env, body, false)?;
    for f in block_function_declarations(body) {
        let fo = instantiate_function_object(ctx, &f, env.clone(), f.name())?;
        let mut e = env.borrow_mut();
        let initialized = match e.inner.as_ref() {
            EnvironmentRecordType::Declarative(d) => d
                .get_binding(f.name())
                .map(|b| b.is_initialized())
                .unwrap_or(false),
            _ => false,
        };
        let record = e.inner.as_env_record_mut();
        if initialized {
            record.set_mutable_binding(f.name(), JsValue::Object(fo), false)?;
        } else {
            record.initialize_binding(f.name(), JsValue::Object(fo))?;
        }
    }
    Ok(())
}

/// Whether a statement list declares anything lexically, so needs its own scope.
pub fn has_lexical_declarations(body: &[StatementType]) -> bool {
    !lexically_scoped_declarations(body, false).is_empty()
}
