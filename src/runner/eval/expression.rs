//! Expression evaluation.

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionType, HasMeta, LiteralData, LiteralType,
    LogicalOperator, MemberExpressionType, PropertyData, PropertyNameType, UnaryOperator,
    UpdateOperator,
};
use crate::runner::ds::error::{EngineError, JErrorType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::lex_env::{get_identifier_reference, resolve_this_binding};
use crate::runner::ds::operations::object::{
    call, construct, create_data_property, get_v, has_property, object_create,
    ordinary_has_instance, put, set,
};
use crate::runner::ds::operations::test_and_comparison::{loose_equality, strict_equality};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_int32, to_number, to_number_primitive, to_primitive,
    to_property_key, to_string_primitive, PreferredType, TYPE_STR_UNDEFINED,
};
use crate::runner::ds::realm::{get_intrinsic, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::function::{
    define_method, instantiate_arrow_function_expression,
    instantiate_ordinary_function_expression,
};
use crate::runner::eval::types::{
    Completion, EvalResult, Reference, ReferenceBase, ReferenceResult, ValueResult,
};

pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> EvalResult {
    let result = match expr {
        ExpressionType::Literal(lit) => Ok(Completion::normal_with_value(evaluate_literal(lit))),
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
            let reference = try_value!(evaluate_reference(expr, ctx));
            get_value(ctx, &reference)
        }
        ExpressionType::ThisExpression { .. } => {
            let this = throw_on_err!(ctx, resolve_this_binding(&ctx.lex_env()));
            Ok(Completion::normal_with_value(this))
        }
        ExpressionType::ObjectExpression { properties, .. } => {
            evaluate_object_expression(properties, ctx)
        }
        ExpressionType::FunctionExpression(f) => {
            let closure = throw_on_err!(ctx, instantiate_ordinary_function_expression(ctx, f, ""));
            Ok(Completion::normal_with_value(JsValue::Object(closure)))
        }
        ExpressionType::ArrowFunctionExpression(f) => {
            let closure = throw_on_err!(ctx, instantiate_arrow_function_expression(ctx, f, ""));
            Ok(Completion::normal_with_value(JsValue::Object(closure)))
        }
        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(*operator, argument, ctx),
        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => evaluate_update_expression(*operator, argument, *prefix, ctx),
        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let lval = completion_value!(evaluate_expression(left, ctx));
            let rval = completion_value!(evaluate_expression(right, ctx));
            apply_binary_operator(ctx, *operator, lval, rval)
        }
        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let lval = completion_value!(evaluate_expression(left, ctx));
            if short_circuits(*operator, &lval) {
                Ok(Completion::normal_with_value(lval))
            } else {
                evaluate_expression(right, ctx)
            }
        }
        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment_expression(*operator, left, right, ctx),
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            let test = completion_value!(evaluate_expression(test, ctx));
            if to_boolean(&test) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => evaluate_call_expression(callee, arguments, ctx),
        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let constructor = completion_value!(evaluate_expression(callee, ctx));
            let args = try_value!(evaluate_arguments(arguments, ctx));
            if !constructor.is_constructor() {
                return ctx.throw_error(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    describe_callee(callee)
                )));
            }
            construct(ctx, &constructor, args, None)
        }
        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = completion_value!(evaluate_expression(e, ctx));
            }
            Ok(Completion::normal_with_value(value))
        }
    };
    result.map(|c| c.at(expr.get_meta()))
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::StringLiteral(s) => JsValue::String(s.to_string()),
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
    }
}

/// NamedEvaluation: anonymous function definitions take `name`, anything else evaluates
/// normally.
pub fn evaluate_named(expr: &ExpressionType, name: &str, ctx: &mut EvalContext) -> EvalResult {
    match expr {
        ExpressionType::FunctionExpression(f) if f.id.is_none() => {
            let closure =
                throw_on_err!(ctx, instantiate_ordinary_function_expression(ctx, f, name));
            Ok(Completion::normal_with_value(JsValue::Object(closure)))
        }
        ExpressionType::ArrowFunctionExpression(f) => {
            let closure = throw_on_err!(ctx, instantiate_arrow_function_expression(ctx, f, name));
            Ok(Completion::normal_with_value(JsValue::Object(closure)))
        }
        _ => evaluate_expression(expr, ctx),
    }
}

/// ResolveBinding in the running lexical environment.
pub fn resolve_binding(ctx: &EvalContext, name: &str) -> Reference {
    get_identifier_reference(Some(ctx.lex_env()), name, ctx.is_strict())
}

/// Evaluates an identifier or member expression to a reference, without reading it.
pub fn evaluate_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> ReferenceResult {
    match expr {
        ExpressionType::Identifier(id) => Ok(Ok(resolve_binding(ctx, &id.name))),
        ExpressionType::MemberExpression(m) => {
            let (base, key) = match m {
                MemberExpressionType::SimpleMemberExpression {
                    object, property, ..
                } => {
                    let base = completion_value!(evaluate_expression(object, ctx), abrupt);
                    (base, PropertyKey::from(property.name.as_str()))
                }
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                } => {
                    let base = completion_value!(evaluate_expression(object, ctx), abrupt);
                    let key_value = completion_value!(evaluate_expression(property, ctx), abrupt);
                    let key = try_value!(to_property_key(ctx, &key_value), abrupt);
                    (base, key)
                }
            };
            Ok(Ok(Reference {
                base: ReferenceBase::Value(base),
                referenced_name: key,
                strict: ctx.is_strict(),
                this_value: None,
            }))
        }
        _ => Err(EngineError::Internal(
            "Expression is not a valid reference".to_string(),
        )),
    }
}

fn binding_name(reference: &Reference) -> &str {
    match &reference.referenced_name {
        PropertyKey::Str(s) => s.as_str(),
        PropertyKey::Sym(_) => "",
    }
}

/// GetValue.
pub fn get_value(ctx: &mut EvalContext, reference: &Reference) -> EvalResult {
    let value = match &reference.base {
        ReferenceBase::Unresolvable => {
            return ctx.throw_error(JErrorType::ReferenceError(format!(
                "{} is not defined",
                reference.referenced_name
            )))
        }
        ReferenceBase::Value(base) => get_v(base, &reference.referenced_name),
        ReferenceBase::Environment(env) => (*env)
            .borrow()
            .inner
            .as_env_record()
            .get_binding_value(binding_name(reference), reference.strict),
    };
    Ok(Completion::normal_with_value(throw_on_err!(ctx, value)))
}

/// PutValue. Sloppy writes to unresolvable names create global object properties.
pub fn put_value(ctx: &mut EvalContext, reference: &Reference, value: JsValue) -> EvalResult {
    let key = &reference.referenced_name;
    match &reference.base {
        ReferenceBase::Unresolvable => {
            if reference.strict {
                return ctx.throw_error(JErrorType::ReferenceError(format!(
                    "{} is not defined",
                    key
                )));
            }
            let global = throw_on_err!(ctx, ctx.global_object());
            throw_on_err!(ctx, put(&global, key.clone(), value, false));
        }
        ReferenceBase::Value(base) => match base {
            JsValue::Object(o) => {
                let succeeded = set(o, key.clone(), value, &reference.get_this_value());
                if !succeeded && reference.strict {
                    return ctx.throw_error(JErrorType::TypeError(format!(
                        "Cannot assign to read only property '{}' of object",
                        key
                    )));
                }
            }
            JsValue::Undefined | JsValue::Null => {
                return ctx.throw_error(JErrorType::TypeError(format!(
                    "Cannot set properties of {} (setting '{}')",
                    base, key
                )))
            }
            _ => {
                if reference.strict {
                    return ctx.throw_error(JErrorType::TypeError(format!(
                        "Cannot create property '{}' on {} '{}'",
                        key,
                        get_type(base),
                        base
                    )));
                }
            }
        },
        ReferenceBase::Environment(env) => {
            let result = env.borrow_mut().inner.as_env_record_mut().set_mutable_binding(
                binding_name(reference),
                value,
                reference.strict,
            );
            throw_on_err!(ctx, result);
        }
    }
    Ok(Completion::normal())
}

/// InitializeReferencedBinding, for `let` and `const` declarations.
pub fn initialize_referenced_binding(
    ctx: &mut EvalContext,
    reference: &Reference,
    value: JsValue,
) -> EvalResult {
    match &reference.base {
        ReferenceBase::Environment(env) => {
            let result = env
                .borrow_mut()
                .inner
                .as_env_record_mut()
                .initialize_binding(binding_name(reference), value);
            throw_on_err!(ctx, result);
            Ok(Completion::normal())
        }
        _ => Err(EngineError::Internal(format!(
            "Cannot initialize '{}': not a binding in scope",
            reference.referenced_name
        ))),
    }
}

fn function_name_for_key(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Str(s) => s.to_string(),
        PropertyKey::Sym(s) => format!("[{}]", s.description().unwrap_or("")),
    }
}

fn evaluate_object_expression(properties: &[PropertyData], ctx: &mut EvalContext) -> EvalResult {
    let proto = throw_on_err!(
        ctx,
        get_intrinsic(&ctx.current_realm(), WellKnownIntrinsics::ObjectPrototype)
    );
    let obj = object_create(Some(proto));
    for prop in properties {
        let key = match &prop.key {
            PropertyNameType::Name(n) => PropertyKey::from(n.as_str()),
            PropertyNameType::Computed(e) => {
                let key_value = completion_value!(evaluate_expression(e, ctx));
                try_value!(to_property_key(ctx, &key_value))
            }
        };
        let value = match prop.value.as_ref() {
            ExpressionType::FunctionExpression(f) if f.is_method => {
                let method = throw_on_err!(
                    ctx,
                    define_method(ctx, f, &obj, &function_name_for_key(&key))
                );
                JsValue::Object(method)
            }
            v if v.is_anonymous_function_definition() => {
                completion_value!(evaluate_named(v, &function_name_for_key(&key), ctx))
            }
            v => completion_value!(evaluate_expression(v, ctx)),
        };
        create_data_property(&obj, key, value);
    }
    Ok(Completion::normal_with_value(JsValue::Object(obj)))
}

fn evaluate_unary_expression(
    operator: UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let value = match operator {
        UnaryOperator::Delete => return evaluate_delete(argument, ctx),
        UnaryOperator::TypeOf => {
            if let ExpressionType::Identifier(_) = argument {
                let reference = try_value!(evaluate_reference(argument, ctx));
                if reference.is_unresolvable() {
                    return Ok(Completion::normal_with_value(JsValue::from(
                        TYPE_STR_UNDEFINED,
                    )));
                }
                let v = completion_value!(get_value(ctx, &reference));
                JsValue::from(get_type(&v))
            } else {
                let v = completion_value!(evaluate_expression(argument, ctx));
                JsValue::from(get_type(&v))
            }
        }
        UnaryOperator::Void => {
            completion_value!(evaluate_expression(argument, ctx));
            JsValue::Undefined
        }
        UnaryOperator::LogicalNot => {
            let v = completion_value!(evaluate_expression(argument, ctx));
            JsValue::Boolean(!to_boolean(&v))
        }
        UnaryOperator::Minus => {
            let v = completion_value!(evaluate_expression(argument, ctx));
            JsValue::Number(-try_value!(to_number(ctx, &v)))
        }
        UnaryOperator::Plus => {
            let v = completion_value!(evaluate_expression(argument, ctx));
            JsValue::Number(try_value!(to_number(ctx, &v)))
        }
        UnaryOperator::BitwiseNot => {
            let v = completion_value!(evaluate_expression(argument, ctx));
            JsValue::Number(!to_int32(try_value!(to_number(ctx, &v))) as f64)
        }
    };
    Ok(Completion::normal_with_value(value))
}

fn evaluate_delete(argument: &ExpressionType, ctx: &mut EvalContext) -> EvalResult {
    let deleted = match argument {
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
            let reference = try_value!(evaluate_reference(argument, ctx));
            match &reference.base {
                ReferenceBase::Unresolvable => true,
                ReferenceBase::Value(JsValue::Object(o)) => {
                    let deleted = o.borrow_mut().delete(&reference.referenced_name);
                    if !deleted && reference.strict {
                        return ctx.throw_error(JErrorType::TypeError(format!(
                            "Cannot delete property '{}' of object",
                            reference.referenced_name
                        )));
                    }
                    deleted
                }
                ReferenceBase::Value(JsValue::Undefined | JsValue::Null) => {
                    return ctx.throw_error(JErrorType::TypeError(
                        "Cannot convert undefined or null to object".to_string(),
                    ))
                }
                ReferenceBase::Value(_) => true,
                ReferenceBase::Environment(env) => {
                    let result = env
                        .borrow_mut()
                        .inner
                        .as_env_record_mut()
                        .delete_binding(binding_name(&reference));
                    throw_on_err!(ctx, result)
                }
            }
        }
        _ => {
            completion_value!(evaluate_expression(argument, ctx));
            true
        }
    };
    Ok(Completion::normal_with_value(JsValue::Boolean(deleted)))
}

fn evaluate_update_expression(
    operator: UpdateOperator,
    argument: &ExpressionType,
    prefix: bool,
    ctx: &mut EvalContext,
) -> EvalResult {
    let reference = try_value!(evaluate_reference(argument, ctx));
    let old_value = completion_value!(get_value(ctx, &reference));
    let old = try_value!(to_number(ctx, &old_value));
    let new = match operator {
        UpdateOperator::PlusPlus => old + 1.0,
        UpdateOperator::MinusMinus => old - 1.0,
    };
    completion_value!(put_value(ctx, &reference, JsValue::Number(new)));
    Ok(Completion::normal_with_value(JsValue::Number(if prefix {
        new
    } else {
        old
    })))
}

/// IsLessThan. `None` when either side is NaN.
fn is_less_than(
    ctx: &mut EvalContext,
    x: &JsValue,
    y: &JsValue,
    left_first: bool,
) -> ValueResult<Option<bool>> {
    let (px, py) = if left_first {
        let px = try_value!(to_primitive(ctx, x, PreferredType::Number), abrupt);
        let py = try_value!(to_primitive(ctx, y, PreferredType::Number), abrupt);
        (px, py)
    } else {
        let py = try_value!(to_primitive(ctx, y, PreferredType::Number), abrupt);
        let px = try_value!(to_primitive(ctx, x, PreferredType::Number), abrupt);
        (px, py)
    };
    if let (JsValue::String(a), JsValue::String(b)) = (&px, &py) {
        return Ok(Ok(Some(a.encode_utf16().lt(b.encode_utf16()))));
    }
    let nx = throw_on_err!(ctx, to_number_primitive(&px), abrupt);
    let ny = throw_on_err!(ctx, to_number_primitive(&py), abrupt);
    if nx.is_nan() || ny.is_nan() {
        Ok(Ok(None))
    } else {
        Ok(Ok(Some(nx < ny)))
    }
}

/// Applies a binary operator to two already evaluated operands.
pub fn apply_binary_operator(
    ctx: &mut EvalContext,
    operator: BinaryOperator,
    lval: JsValue,
    rval: JsValue,
) -> EvalResult {
    let result = match operator {
        BinaryOperator::Add => {
            let lprim = try_value!(to_primitive(ctx, &lval, PreferredType::Default));
            let rprim = try_value!(to_primitive(ctx, &rval, PreferredType::Default));
            if matches!(lprim, JsValue::String(_)) || matches!(rprim, JsValue::String(_)) {
                let ls = throw_on_err!(ctx, to_string_primitive(&lprim));
                let rs = throw_on_err!(ctx, to_string_primitive(&rprim));
                JsValue::String(ls + &rs)
            } else {
                let ln = throw_on_err!(ctx, to_number_primitive(&lprim));
                let rn = throw_on_err!(ctx, to_number_primitive(&rprim));
                JsValue::Number(ln + rn)
            }
        }
        BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => {
            let ln = try_value!(to_number(ctx, &lval));
            let rn = try_value!(to_number(ctx, &rval));
            JsValue::Number(match operator {
                BinaryOperator::Subtract => ln - rn,
                BinaryOperator::Multiply => ln * rn,
                BinaryOperator::Divide => ln / rn,
                _ => ln % rn,
            })
        }
        BinaryOperator::LessThan => {
            JsValue::Boolean(try_value!(is_less_than(ctx, &lval, &rval, true)) == Some(true))
        }
        BinaryOperator::GreaterThan => {
            JsValue::Boolean(try_value!(is_less_than(ctx, &rval, &lval, false)) == Some(true))
        }
        BinaryOperator::LessThanEqual => {
            JsValue::Boolean(try_value!(is_less_than(ctx, &rval, &lval, false)) == Some(false))
        }
        BinaryOperator::GreaterThanEqual => {
            JsValue::Boolean(try_value!(is_less_than(ctx, &lval, &rval, true)) == Some(false))
        }
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equality(&lval, &rval)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!strict_equality(&lval, &rval)),
        BinaryOperator::LooselyEqual => {
            JsValue::Boolean(try_value!(loose_equality(ctx, &lval, &rval)))
        }
        BinaryOperator::LooselyUnequal => {
            JsValue::Boolean(!try_value!(loose_equality(ctx, &lval, &rval)))
        }
        BinaryOperator::In => {
            let target = match &rval {
                JsValue::Object(o) => o.clone(),
                _ => {
                    return ctx.throw_error(JErrorType::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        lval, rval
                    )))
                }
            };
            let key = try_value!(to_property_key(ctx, &lval));
            JsValue::Boolean(has_property(&target, &key))
        }
        BinaryOperator::InstanceOf => {
            if !rval.is_callable() {
                return ctx.throw_error(JErrorType::TypeError(
                    "Right-hand side of 'instanceof' is not callable".to_string(),
                ));
            }
            JsValue::Boolean(throw_on_err!(ctx, ordinary_has_instance(&rval, &lval)))
        }
    };
    Ok(Completion::normal_with_value(result))
}

/// Whether a logical operator is decided by its left operand alone.
fn short_circuits(operator: LogicalOperator, lval: &JsValue) -> bool {
    match operator {
        LogicalOperator::And => !to_boolean(lval),
        LogicalOperator::Or => to_boolean(lval),
        LogicalOperator::NullishCoalescing => !lval.is_nullish(),
    }
}

fn evaluate_assignment_expression(
    operator: AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let reference = try_value!(evaluate_reference(left, ctx));
    let logical = match operator {
        AssignmentOperator::LogicalAndEquals => Some(LogicalOperator::And),
        AssignmentOperator::LogicalOrEquals => Some(LogicalOperator::Or),
        AssignmentOperator::NullishEquals => Some(LogicalOperator::NullishCoalescing),
        _ => None,
    };
    let arithmetic = match operator {
        AssignmentOperator::AddEquals => Some(BinaryOperator::Add),
        AssignmentOperator::SubtractEquals => Some(BinaryOperator::Subtract),
        AssignmentOperator::MultiplyEquals => Some(BinaryOperator::Multiply),
        AssignmentOperator::DivideEquals => Some(BinaryOperator::Divide),
        AssignmentOperator::ModuloEquals => Some(BinaryOperator::Modulo),
        _ => None,
    };
    let value = if let Some(op) = arithmetic {
        let lval = completion_value!(get_value(ctx, &reference));
        let rval = completion_value!(evaluate_expression(right, ctx));
        completion_value!(apply_binary_operator(ctx, op, lval, rval))
    } else {
        if let Some(op) = logical {
            let lval = completion_value!(get_value(ctx, &reference));
            if short_circuits(op, &lval) {
                return Ok(Completion::normal_with_value(lval));
            }
        }
        match left {
            ExpressionType::Identifier(id) if right.is_anonymous_function_definition() => {
                completion_value!(evaluate_named(right, &id.name, ctx))
            }
            _ => completion_value!(evaluate_expression(right, ctx)),
        }
    };
    completion_value!(put_value(ctx, &reference, value.clone()));
    Ok(Completion::normal_with_value(value))
}

fn evaluate_arguments(
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> ValueResult<Vec<JsValue>> {
    let mut values = Vec::with_capacity(arguments.len());
    for arg in arguments {
        values.push(completion_value!(evaluate_expression(arg, ctx), abrupt));
    }
    Ok(Ok(values))
}

/// Source-like text for a callee, used in "is not a function" messages.
fn describe_callee(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(id) => id.name.to_string(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", describe_callee(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => format!("{}[...]", describe_callee(object)),
        ExpressionType::CallExpression { callee, .. } => {
            format!("{}(...)", describe_callee(callee))
        }
        _ => "expression".to_string(),
    }
}

fn evaluate_call_expression(
    callee: &ExpressionType,
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> EvalResult {
    let (func, this_value) = match callee {
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
            let reference = try_value!(evaluate_reference(callee, ctx));
            let func = completion_value!(get_value(ctx, &reference));
            let this_value = match &reference.base {
                ReferenceBase::Value(_) => reference.get_this_value(),
                ReferenceBase::Environment(env) => (*env)
                    .borrow()
                    .inner
                    .as_env_record()
                    .with_base_object()
                    .map(JsValue::Object)
                    .unwrap_or(JsValue::Undefined),
                ReferenceBase::Unresolvable => JsValue::Undefined,
            };
            (func, this_value)
        }
        _ => (
            completion_value!(evaluate_expression(callee, ctx)),
            JsValue::Undefined,
        ),
    };
    let args = try_value!(evaluate_arguments(arguments, ctx));
    if !func.is_callable() {
        return ctx.throw_error(JErrorType::TypeError(format!(
            "{} is not a function",
            describe_callee(callee)
        )));
    }
    call(ctx, &func, this_value, args)
}
