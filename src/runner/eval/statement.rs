//! Statement execution.

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, DeclarationType, ExportKind, ExpressionType, HasMeta,
    StatementType, SwitchCaseData, VariableDeclarationData, VariableDeclarationKind,
    VariableDeclarationOrExpression,
};
use crate::parser::DEFAULT_EXPORT_BINDING;
use crate::runner::ds::env_record::{new_declarative_environment, new_object_environment};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::test_and_comparison::strict_equality;
use crate::runner::ds::operations::type_conversion::{get_type, to_boolean};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::declaration::{block_declaration_instantiation, has_lexical_declarations};
use crate::runner::eval::expression::{
    evaluate_expression, evaluate_named, initialize_referenced_binding, put_value,
    resolve_binding,
};
use crate::runner::eval::types::{Completion, CompletionType, EvalResult};

/// A normal completion carrying a possibly empty value.
fn normal_from(value: Option<JsValue>) -> Completion {
    Completion {
        completion_type: CompletionType::Normal,
        value,
        target: None,
        location: None,
    }
}

/// Executes a statement. Every statement counts against the step budget.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    ctx.tick()?;
    let result = match stmt {
        StatementType::ExpressionStatement { expression, .. } => {
            let value = completion_value!(evaluate_expression(expression, ctx));
            Ok(Completion::normal_with_value(value))
        }
        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),
        StatementType::EmptyStatement { .. } | StatementType::DebuggerStatement { .. } => {
            Ok(Completion::normal())
        }
        StatementType::DeclarationStatement(decl) => execute_declaration(decl, ctx),
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            let test = completion_value!(evaluate_expression(test, ctx));
            let completion = if to_boolean(&test) {
                execute_statement(consequent, ctx)?
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)?
            } else {
                return Ok(Completion::normal_with_value(JsValue::Undefined));
            };
            Ok(completion.update_empty(JsValue::Undefined))
        }
        StatementType::WhileStatement { .. }
        | StatementType::DoWhileStatement { .. }
        | StatementType::ForStatement { .. }
        | StatementType::SwitchStatement { .. }
        | StatementType::LabeledStatement { .. } => {
            labelled_evaluation(stmt, &mut Vec::new(), ctx)
        }
        StatementType::BreakStatement { label, .. } => Ok(Completion::break_completion(
            label.as_ref().map(|l| l.name.to_string()),
        )),
        StatementType::ContinueStatement { label, .. } => Ok(Completion::continue_completion(
            label.as_ref().map(|l| l.name.to_string()),
        )),
        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(argument) => completion_value!(evaluate_expression(argument, ctx)),
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }
        StatementType::ThrowStatement { argument, .. } => {
            let value = completion_value!(evaluate_expression(argument, ctx));
            Ok(Completion::throw(value))
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => execute_try_statement(block, handler.as_ref(), finalizer.as_ref(), ctx),
        StatementType::WithStatement { object, body, .. } => {
            execute_with_statement(object, body, ctx)
        }
        StatementType::ExportStatement { export, .. } => execute_export(export, ctx),
    };
    result.map(|c| c.at(stmt.get_meta()))
}

/// Runs a statement list, carrying the last non-empty value into the final completion.
pub fn evaluate_statement_list(stmts: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last = None;
    for stmt in stmts {
        let completion = execute_statement(stmt, ctx)?;
        if completion.is_abrupt() {
            return Ok(match last {
                Some(value) => completion.update_empty(value),
                None => completion,
            });
        }
        if completion.value.is_some() {
            last = completion.value;
        }
    }
    Ok(normal_from(last))
}

fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    let body = &block.body;
    if !has_lexical_declarations(body) {
        return evaluate_statement_list(body, ctx);
    }
    let block_env = new_declarative_environment(Some(ctx.lex_env()));
    throw_on_err!(ctx, block_declaration_instantiation(ctx, body, &block_env));
    ctx.with_lex_env(block_env, |ctx| evaluate_statement_list(body, ctx))
}

fn execute_declaration(decl: &DeclarationType, ctx: &mut EvalContext) -> EvalResult {
    match decl {
        DeclarationType::VariableDeclaration(var_decl) => {
            execute_variable_declaration(var_decl, ctx)
        }
        // Hoisted on scope entry.
        DeclarationType::FunctionDeclaration(_) => Ok(Completion::normal()),
    }
}

fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> EvalResult {
    for d in &decl.declarations {
        let name = d.id.name.as_str();
        match decl.kind {
            VariableDeclarationKind::Var => {
                if let Some(init) = &d.init {
                    let reference = resolve_binding(ctx, name);
                    let value = completion_value!(evaluate_named(init, name, ctx));
                    completion_value!(put_value(ctx, &reference, value));
                }
            }
            VariableDeclarationKind::Let | VariableDeclarationKind::Const => {
                let reference = resolve_binding(ctx, name);
                let value = match &d.init {
                    Some(init) => completion_value!(evaluate_named(init, name, ctx)),
                    None => JsValue::Undefined,
                };
                completion_value!(initialize_referenced_binding(ctx, &reference, value));
            }
        }
    }
    Ok(Completion::normal())
}

/// LoopContinues.
fn loop_continues(completion: &Completion, label_set: &[String]) -> bool {
    if completion.is_normal() {
        return true;
    }
    if completion.completion_type != CompletionType::Continue {
        return false;
    }
    match &completion.target {
        None => true,
        Some(target) => label_set.contains(target),
    }
}

/// LabelledEvaluation. Breakable statements absorb an unlabelled `break`; a labelled
/// statement absorbs a `break` aimed at its own label.
fn labelled_evaluation(
    stmt: &StatementType,
    label_set: &mut Vec<String>,
    ctx: &mut EvalContext,
) -> EvalResult {
    match stmt {
        StatementType::LabeledStatement { label, body, .. } => {
            label_set.push(label.name.to_string());
            let completion = labelled_evaluation(body, label_set, ctx)?;
            if completion.completion_type == CompletionType::Break
                && completion.target.as_deref() == Some(label.name.as_str())
            {
                Ok(normal_from(completion.value))
            } else {
                Ok(completion)
            }
        }
        StatementType::WhileStatement { .. }
        | StatementType::DoWhileStatement { .. }
        | StatementType::ForStatement { .. }
        | StatementType::SwitchStatement { .. } => {
            let completion = match stmt {
                StatementType::SwitchStatement {
                    discriminant,
                    cases,
                    ..
                } => execute_switch_statement(discriminant, cases, ctx)?,
                _ => loop_evaluation(stmt, label_set, ctx)?,
            };
            if completion.completion_type == CompletionType::Break && completion.target.is_none()
            {
                Ok(normal_from(Some(completion.get_value())))
            } else {
                Ok(completion)
            }
        }
        _ => execute_statement(stmt, ctx),
    }
}

fn loop_evaluation(
    stmt: &StatementType,
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    match stmt {
        StatementType::WhileStatement { test, body, .. } => {
            let mut v = JsValue::Undefined;
            loop {
                let test_value = completion_value!(evaluate_expression(test, ctx));
                if !to_boolean(&test_value) {
                    return Ok(Completion::normal_with_value(v));
                }
                let completion = execute_statement(body, ctx)?;
                if !loop_continues(&completion, label_set) {
                    return Ok(completion.update_empty(v));
                }
                if let Some(value) = completion.value {
                    v = value;
                }
            }
        }
        StatementType::DoWhileStatement { body, test, .. } => {
            let mut v = JsValue::Undefined;
            loop {
                let completion = execute_statement(body, ctx)?;
                if !loop_continues(&completion, label_set) {
                    return Ok(completion.update_empty(v));
                }
                if let Some(value) = completion.value {
                    v = value;
                }
                let test_value = completion_value!(evaluate_expression(test, ctx));
                if !to_boolean(&test_value) {
                    return Ok(Completion::normal_with_value(v));
                }
            }
        }
        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => execute_for_statement(
            init.as_ref(),
            test.as_deref(),
            update.as_deref(),
            body,
            label_set,
            ctx,
        ),
        _ => execute_statement(stmt, ctx),
    }
}

fn execute_for_statement(
    init: Option<&VariableDeclarationOrExpression>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    match init {
        Some(VariableDeclarationOrExpression::VariableDeclaration(decl))
            if decl.kind != VariableDeclarationKind::Var =>
        {
            let loop_env = new_declarative_environment(Some(ctx.lex_env()));
            let is_const = decl.kind == VariableDeclarationKind::Const;
            let names: Vec<String> = decl
                .declarations
                .iter()
                .map(|d| d.id.name.to_string())
                .collect();
            let created: Result<(), JErrorType> = {
                let mut env = loop_env.borrow_mut();
                let record = env.inner.as_env_record_mut();
                let result = names.iter().try_for_each(|name| {
                    if is_const {
                        record.create_immutable_binding(name.to_string(), true)
                    } else {
                        record.create_mutable_binding(name.to_string(), false)
                    }
                });
                result
            };
            throw_on_err!(ctx, created);
            let per_iteration = if is_const { Vec::new() } else { names };
            ctx.with_lex_env(loop_env, |ctx| {
                let completion = execute_variable_declaration(decl, ctx)?;
                if completion.is_abrupt() {
                    return Ok(completion);
                }
                for_body_evaluation(test, update, body, &per_iteration, label_set, ctx)
            })
        }
        Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) => {
            let completion = execute_variable_declaration(decl, ctx)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
            for_body_evaluation(test, update, body, &[], label_set, ctx)
        }
        Some(VariableDeclarationOrExpression::Expression(e)) => {
            completion_value!(evaluate_expression(e, ctx));
            for_body_evaluation(test, update, body, &[], label_set, ctx)
        }
        None => for_body_evaluation(test, update, body, &[], label_set, ctx),
    }
}

/// CreatePerIterationEnvironment: copies the loop's `let` bindings into a fresh scope so
/// closures created in one iteration do not see later updates.
fn create_per_iteration_environment(
    ctx: &mut EvalContext,
    names: &[String],
) -> Result<(), JErrorType> {
    if names.is_empty() {
        return Ok(());
    }
    let last = ctx.lex_env();
    let outer = last.borrow().outer.clone();
    let this_env = new_declarative_environment(outer);
    for name in names {
        let value = last
            .borrow()
            .inner
            .as_env_record()
            .get_binding_value(name, true)?;
        let mut env = this_env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        record.create_mutable_binding(name.to_string(), false)?;
        record.initialize_binding(name, value)?;
    }
    ctx.set_lex_env(this_env);
    Ok(())
}

fn for_body_evaluation(
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    per_iteration: &[String],
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut v = JsValue::Undefined;
    throw_on_err!(ctx, create_per_iteration_environment(ctx, per_iteration));
    loop {
        if let Some(test) = test {
            let test_value = completion_value!(evaluate_expression(test, ctx));
            if !to_boolean(&test_value) {
                return Ok(Completion::normal_with_value(v));
            }
        }
        let completion = execute_statement(body, ctx)?;
        if !loop_continues(&completion, label_set) {
            return Ok(completion.update_empty(v));
        }
        if let Some(value) = completion.value {
            v = value;
        }
        throw_on_err!(ctx, create_per_iteration_environment(ctx, per_iteration));
        if let Some(update) = update {
            completion_value!(evaluate_expression(update, ctx));
        }
    }
}

fn execute_switch_statement(
    discriminant: &ExpressionType,
    cases: &[SwitchCaseData],
    ctx: &mut EvalContext,
) -> EvalResult {
    let input = completion_value!(evaluate_expression(discriminant, ctx));
    if !cases.iter().any(|c| has_lexical_declarations(&c.consequent)) {
        return case_block_evaluation(&input, cases, ctx);
    }
    let block_env = new_declarative_environment(Some(ctx.lex_env()));
    for case in cases {
        throw_on_err!(
            ctx,
            block_declaration_instantiation(ctx, &case.consequent, &block_env)
        );
    }
    ctx.with_lex_env(block_env, |ctx| case_block_evaluation(&input, cases, ctx))
}

/// Runs the clauses from the first one whose test strictly equals `input`, falling back to
/// `default`. Later clauses fall through.
fn case_block_evaluation(
    input: &JsValue,
    cases: &[SwitchCaseData],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut matched = None;
    for (index, case) in cases.iter().enumerate() {
        if let Some(test) = &case.test {
            let case_value = completion_value!(evaluate_expression(test, ctx));
            if strict_equality(input, &case_value) {
                matched = Some(index);
                break;
            }
        }
    }
    let start = match matched.or_else(|| cases.iter().position(|c| c.test.is_none())) {
        Some(start) => start,
        None => return Ok(Completion::normal_with_value(JsValue::Undefined)),
    };
    let mut v = JsValue::Undefined;
    for case in &cases[start..] {
        let completion = evaluate_statement_list(&case.consequent, ctx)?;
        if let Some(value) = &completion.value {
            v = value.clone();
        }
        if completion.is_abrupt() {
            return Ok(completion.update_empty(v));
        }
    }
    Ok(Completion::normal_with_value(v))
}

fn execute_try_statement(
    block: &BlockStatementData,
    handler: Option<&CatchClauseData>,
    finalizer: Option<&BlockStatementData>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut completion = execute_block_statement(block, ctx)?;
    if completion.is_throw() {
        if let Some(handler) = handler {
            completion = execute_catch_clause(handler, completion.get_value(), ctx)?;
        }
    }
    if let Some(finalizer) = finalizer {
        let finally_completion = execute_block_statement(finalizer, ctx)?;
        if finally_completion.is_abrupt() {
            return Ok(finally_completion);
        }
    }
    Ok(completion.update_empty(JsValue::Undefined))
}

fn execute_catch_clause(
    handler: &CatchClauseData,
    thrown: JsValue,
    ctx: &mut EvalContext,
) -> EvalResult {
    let catch_env = new_declarative_environment(Some(ctx.lex_env()));
    if let Some(param) = &handler.param {
        let bound = {
            let mut env = catch_env.borrow_mut();
            let record = env.inner.as_env_record_mut();
            let result = record
                .create_mutable_binding(param.name.to_string(), false)
                .and_then(|_| record.initialize_binding(&param.name, thrown));
            result
        };
        throw_on_err!(ctx, bound);
    }
    ctx.with_lex_env(catch_env, |ctx| execute_block_statement(&handler.body, ctx))
}

fn execute_with_statement(
    object: &ExpressionType,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let value = completion_value!(evaluate_expression(object, ctx));
    let binding_object = match value {
        JsValue::Object(o) => o,
        JsValue::Undefined | JsValue::Null => {
            return ctx.throw_error(JErrorType::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            ))
        }
        other => {
            return ctx.throw_error(JErrorType::TypeError(format!(
                "with statement requires an object, got {}",
                get_type(&other)
            )))
        }
    };
    let with_env = new_object_environment(binding_object, true, Some(ctx.lex_env()));
    let completion = ctx.with_lex_env(with_env, |ctx| execute_statement(body, ctx))?;
    Ok(completion.update_empty(JsValue::Undefined))
}

fn execute_export(export: &ExportKind, ctx: &mut EvalContext) -> EvalResult {
    match export {
        ExportKind::Declaration(decl) => execute_declaration(decl, ctx),
        ExportKind::DefaultFunction(_) | ExportKind::Named(_) => Ok(Completion::normal()),
        ExportKind::DefaultExpression(expr) => {
            let value = completion_value!(evaluate_named(expr, "default", ctx));
            let reference = resolve_binding(ctx, DEFAULT_EXPORT_BINDING);
            completion_value!(initialize_referenced_binding(ctx, &reference, value));
            Ok(Completion::normal())
        }
    }
}
