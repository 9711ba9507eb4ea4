//! Entry points that run a whole parsed program.

use tracing::debug;

use crate::parser::ast::ProgramData;
use crate::runner::ds::env_record::new_declarative_environment;
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::realm::JsCodeRealmType;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::declaration::{
    global_declaration_instantiation, var_scope_declaration_instantiation,
};
use crate::runner::eval::statement::evaluate_statement_list;
use crate::runner::eval::types::EvalResult;

/// ScriptEvaluation: runs `program` as a classic script against the global scope of `realm`.
#[tracing::instrument(level = "debug", skip_all, fields(strict = program.strict))]
pub fn script_evaluation(
    ctx: &mut EvalContext,
    program: &ProgramData,
    realm: &JsCodeRealmType,
) -> EvalResult {
    let strict = program.strict || ctx.config.strict_scripts;
    let ec = throw_on_err!(ctx, ExecutionContext::new_for_realm(realm, strict));
    let global_env = ec.var_env.clone();
    ctx.with_execution_context(ec, |ctx| {
        throw_on_err!(
            ctx,
            global_declaration_instantiation(ctx, &program.body, &global_env)
        );
        let result = evaluate_statement_list(&program.body, ctx)?;
        debug!(completion = ?result.completion_type, "script evaluated");
        Ok(result)
    })
}

/// Runs `program` as strict eval code in `realm`. Its vars and lexical declarations live in a
/// fresh declarative scope over the global one and vanish once it completes.
#[tracing::instrument(level = "debug", skip_all)]
pub fn strict_eval_evaluation(
    ctx: &mut EvalContext,
    program: &ProgramData,
    realm: &JsCodeRealmType,
) -> EvalResult {
    let mut ec = throw_on_err!(ctx, ExecutionContext::new_for_realm(realm, true));
    let eval_env = new_declarative_environment(Some(ec.lex_env.clone()));
    ec.lex_env = eval_env.clone();
    ec.var_env = eval_env.clone();
    ctx.with_execution_context(ec, |ctx| {
        throw_on_err!(
            ctx,
            var_scope_declaration_instantiation(ctx, &program.body, &eval_env)
        );
        let result = evaluate_statement_list(&program.body, ctx)?;
        debug!(completion = ?result.completion_type, "eval code evaluated");
        Ok(result)
    })
}
