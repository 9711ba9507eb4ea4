use std::rc::Rc;

use pest::error::{Error as PestError, ErrorVariant, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::ast::*;
use super::static_semantics::check_early_errors;
use super::util::{line_col, parse_numeric_literal, unescape_string_literal};

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

/// A syntax error, reported either by the grammar or by the early error checks.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({line}:{column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    pub(crate) fn at(source: &str, index: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(source, index);
        ParseError::new(message, line, column)
    }

    fn at_pair(pair: &Pair<Rule>, message: impl Into<String>) -> Self {
        let (line, column) = pair.as_span().start_pos().line_col();
        ParseError::new(message, line, column)
    }
}

impl From<PestError<Rule>> for ParseError {
    fn from(e: PestError<Rule>) -> Self {
        let (line, column) = match &e.line_col {
            LineColLocation::Pos(p) => *p,
            LineColLocation::Span(p, _) => *p,
        };
        let message = match &e.variant {
            ErrorVariant::ParsingError { positives, .. } if positives.is_empty() => {
                "Unexpected token".to_string()
            }
            ErrorVariant::ParsingError { positives, .. } => format!(
                "Unexpected token, expected {}",
                positives
                    .iter()
                    .map(|r| format!("{:?}", r))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            ErrorVariant::CustomError { message } => message.to_string(),
        };
        ParseError::new(message, line, column)
    }
}

impl JsParser {
    /// Parses classic script source text.
    pub fn parse_script(source: &str) -> Result<ProgramData, ParseError> {
        parse_program(source, SourceType::Script)
    }

    /// Parses module source text. Module code is always strict.
    pub fn parse_module(source: &str) -> Result<ProgramData, ParseError> {
        parse_program(source, SourceType::Module)
    }
}

fn parse_program(source: &str, source_type: SourceType) -> Result<ProgramData, ParseError> {
    let rule = match source_type {
        SourceType::Script => Rule::script,
        SourceType::Module => Rule::module,
    };
    let mut pairs = JsParser::parse(rule, source)?;
    let root = pairs
        .next()
        .ok_or_else(|| ParseError::new("Empty program", 1, 1))?;
    let meta = get_meta(&root);
    let (body, has_use_strict) = build_statement_list(root.into_inner())?;
    let program = ProgramData {
        meta,
        source_type,
        body,
        strict: has_use_strict || source_type == SourceType::Module,
    };
    check_early_errors(&program, source)?;
    Ok(program)
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn position(pair: &Pair<Rule>) -> (usize, usize) {
    pair.as_span().start_pos().line_col()
}

fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    parent: (usize, usize),
) -> Result<Pair<'i, Rule>, ParseError> {
    pairs
        .next()
        .ok_or_else(|| ParseError::new("Unexpected end of input", parent.0, parent.1))
}

fn get_unexpected_error(pair: &Pair<Rule>) -> ParseError {
    ParseError::at_pair(
        pair,
        format!("Unexpected {:?} '{}'", pair.as_rule(), pair.as_str()),
    )
}

fn is_use_strict_directive(raw: &str) -> bool {
    let raw = raw.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    raw == "'use strict'" || raw == "\"use strict\""
}

/// Builds a statement list and reports whether its directive prologue holds "use strict".
fn build_statement_list(pairs: Pairs<Rule>) -> Result<(Vec<StatementType>, bool), ParseError> {
    let mut statements = vec![];
    let mut in_prologue = true;
    let mut strict = false;
    for pair in pairs {
        if pair.as_rule() == Rule::EOI {
            continue;
        }
        let raw = pair.as_str();
        let statement = build_statement(pair.clone())?;
        if in_prologue {
            match &statement {
                StatementType::ExpressionStatement { expression, .. }
                    if matches!(
                        **expression,
                        ExpressionType::Literal(LiteralData {
                            value: LiteralType::StringLiteral(_),
                            ..
                        })
                    ) =>
                {
                    if is_use_strict_directive(raw) {
                        strict = true;
                    }
                }
                _ => in_prologue = false,
            }
        }
        statements.push(statement);
    }
    Ok((statements, strict))
}

fn build_statements(pairs: Pairs<Rule>) -> Result<Vec<StatementType>, ParseError> {
    pairs.map(build_statement).collect()
}

fn build_statement(pair: Pair<Rule>) -> Result<StatementType, ParseError> {
    let meta = get_meta(&pair);
    let pos = position(&pair);
    Ok(match pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(build_block(pair)?),
        Rule::variable_declaration => StatementType::DeclarationStatement(
            DeclarationType::VariableDeclaration(build_variable_declaration(pair)?),
        ),
        Rule::function_declaration => StatementType::DeclarationStatement(
            DeclarationType::FunctionDeclaration(Rc::new(build_function(pair)?)),
        ),
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::debugger_statement => StatementType::DebuggerStatement { meta },
        Rule::expression_statement => {
            let mut inner = pair.into_inner();
            StatementType::ExpressionStatement {
                meta,
                expression: Box::new(build_expression(next_pair(&mut inner, pos)?)?),
            }
        }
        Rule::if_statement => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, pos)?)?;
            let consequent = build_statement(next_pair(&mut inner, pos)?)?;
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::while_statement => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, pos)?)?;
            let body = build_statement(next_pair(&mut inner, pos)?)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::do_while_statement => {
            let mut inner = pair.into_inner();
            let body = build_statement(next_pair(&mut inner, pos)?)?;
            let test = build_expression(next_pair(&mut inner, pos)?)?;
            StatementType::DoWhileStatement {
                meta,
                body: Box::new(body),
                test: Box::new(test),
            }
        }
        Rule::for_statement => build_for_statement(pair)?,
        Rule::continue_statement => StatementType::ContinueStatement {
            meta,
            label: pair.into_inner().next().map(|p| build_identifier(&p)),
        },
        Rule::break_statement => StatementType::BreakStatement {
            meta,
            label: pair.into_inner().next().map(|p| build_identifier(&p)),
        },
        Rule::return_statement => StatementType::ReturnStatement {
            meta,
            argument: match pair.into_inner().next() {
                Some(p) => Some(Box::new(build_expression(p)?)),
                None => None,
            },
        },
        Rule::throw_statement => {
            let mut inner = pair.into_inner();
            StatementType::ThrowStatement {
                meta,
                argument: Box::new(build_expression(next_pair(&mut inner, pos)?)?),
            }
        }
        Rule::with_statement => {
            let mut inner = pair.into_inner();
            let object = build_expression(next_pair(&mut inner, pos)?)?;
            let body = build_statement(next_pair(&mut inner, pos)?)?;
            StatementType::WithStatement {
                meta,
                object: Box::new(object),
                body: Box::new(body),
            }
        }
        Rule::switch_statement => {
            let mut inner = pair.into_inner();
            let discriminant = build_expression(next_pair(&mut inner, pos)?)?;
            let mut cases = vec![];
            for clause in inner {
                let clause_meta = get_meta(&clause);
                let clause_pos = position(&clause);
                match clause.as_rule() {
                    Rule::case_clause => {
                        let mut clause_inner = clause.into_inner();
                        let test = build_expression(next_pair(&mut clause_inner, clause_pos)?)?;
                        cases.push(SwitchCaseData {
                            meta: clause_meta,
                            test: Some(Box::new(test)),
                            consequent: build_statements(clause_inner)?,
                        });
                    }
                    Rule::default_clause => cases.push(SwitchCaseData {
                        meta: clause_meta,
                        test: None,
                        consequent: build_statements(clause.into_inner())?,
                    }),
                    _ => return Err(get_unexpected_error(&clause)),
                }
            }
            StatementType::SwitchStatement {
                meta,
                discriminant: Box::new(discriminant),
                cases,
            }
        }
        Rule::try_statement => {
            let mut inner = pair.into_inner();
            let block = build_block(next_pair(&mut inner, pos)?)?;
            let mut handler = None;
            let mut finalizer = None;
            for clause in inner {
                match clause.as_rule() {
                    Rule::catch_clause => handler = Some(build_catch_clause(clause)?),
                    Rule::finally_clause => {
                        let clause_pos = position(&clause);
                        let mut clause_inner = clause.into_inner();
                        finalizer = Some(build_block(next_pair(&mut clause_inner, clause_pos)?)?);
                    }
                    _ => return Err(get_unexpected_error(&clause)),
                }
            }
            StatementType::TryStatement {
                meta,
                block,
                handler,
                finalizer,
            }
        }
        Rule::labelled_statement => {
            let mut inner = pair.into_inner();
            let label = build_identifier(&next_pair(&mut inner, pos)?);
            let body = build_statement(next_pair(&mut inner, pos)?)?;
            StatementType::LabeledStatement {
                meta,
                label,
                body: Box::new(body),
            }
        }
        Rule::export_declaration => StatementType::ExportStatement {
            meta,
            export: build_export(pair)?,
        },
        _ => return Err(get_unexpected_error(&pair)),
    })
}

fn build_block(pair: Pair<Rule>) -> Result<BlockStatementData, ParseError> {
    if pair.as_rule() != Rule::block_statement {
        return Err(get_unexpected_error(&pair));
    }
    let meta = get_meta(&pair);
    Ok(BlockStatementData {
        meta,
        body: build_statements(pair.into_inner())?,
    })
}

fn build_catch_clause(pair: Pair<Rule>) -> Result<CatchClauseData, ParseError> {
    let meta = get_meta(&pair);
    let mut param = None;
    let mut body = None;
    for p in pair.clone().into_inner() {
        match p.as_rule() {
            Rule::identifier => param = Some(build_identifier(&p)),
            Rule::block_statement => body = Some(build_block(p)?),
            _ => return Err(get_unexpected_error(&p)),
        }
    }
    match body {
        Some(body) => Ok(CatchClauseData { meta, param, body }),
        None => Err(ParseError::at_pair(&pair, "Missing catch block")),
    }
}

fn build_for_statement(pair: Pair<Rule>) -> Result<StatementType, ParseError> {
    let meta = get_meta(&pair);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for p in pair.clone().into_inner() {
        let pos = position(&p);
        match p.as_rule() {
            Rule::for_init => {
                let inner = next_pair(&mut p.into_inner(), pos)?;
                init = Some(if inner.as_rule() == Rule::variable_declaration {
                    VariableDeclarationOrExpression::VariableDeclaration(
                        build_variable_declaration(inner)?,
                    )
                } else {
                    VariableDeclarationOrExpression::Expression(Box::new(build_expression(
                        inner,
                    )?))
                });
            }
            Rule::for_test => {
                test = Some(Box::new(build_expression(next_pair(
                    &mut p.into_inner(),
                    pos,
                )?)?))
            }
            Rule::for_update => {
                update = Some(Box::new(build_expression(next_pair(
                    &mut p.into_inner(),
                    pos,
                )?)?))
            }
            _ => body = Some(Box::new(build_statement(p)?)),
        }
    }
    match body {
        Some(body) => Ok(StatementType::ForStatement {
            meta,
            init,
            test,
            update,
            body,
        }),
        None => Err(ParseError::at_pair(&pair, "Missing loop body")),
    }
}

fn build_variable_declaration(pair: Pair<Rule>) -> Result<VariableDeclarationData, ParseError> {
    let meta = get_meta(&pair);
    let pos = position(&pair);
    let mut inner = pair.into_inner();
    let kind = match next_pair(&mut inner, pos)?.as_str() {
        "var" => VariableDeclarationKind::Var,
        "let" => VariableDeclarationKind::Let,
        _ => VariableDeclarationKind::Const,
    };
    let mut declarations = vec![];
    for declarator in inner {
        let declarator_meta = get_meta(&declarator);
        let declarator_pos = position(&declarator);
        let mut declarator_inner = declarator.clone().into_inner();
        let id = build_identifier(&next_pair(&mut declarator_inner, declarator_pos)?);
        let init = match declarator_inner.next() {
            Some(p) => Some(Box::new(build_expression(p)?)),
            None => None,
        };
        if init.is_none() && kind == VariableDeclarationKind::Const {
            return Err(ParseError::at_pair(
                &declarator,
                "Missing initializer in const declaration",
            ));
        }
        declarations.push(VariableDeclaratorData {
            meta: declarator_meta,
            id,
            init,
        });
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_identifier(pair: &Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(pair),
    }
}

/// Builds function declarations, expressions and `export default function`.
fn build_function(pair: Pair<Rule>) -> Result<FunctionData, ParseError> {
    let meta = get_meta(&pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for p in pair.clone().into_inner() {
        match p.as_rule() {
            Rule::identifier => id = Some(build_identifier(&p)),
            Rule::property_name => {}
            Rule::formal_parameters => {
                params = p.into_inner().map(|i| build_identifier(&i)).collect();
            }
            Rule::function_body => body = Some(build_function_body(p)?),
            _ => return Err(get_unexpected_error(&p)),
        }
    }
    let (body, has_use_strict) =
        body.ok_or_else(|| ParseError::at_pair(&pair, "Missing function body"))?;
    Ok(FunctionData {
        meta,
        id,
        params,
        body,
        is_arrow: false,
        is_method: pair.as_rule() == Rule::method_definition,
        has_use_strict,
        is_concise: false,
    })
}

fn build_function_body(pair: Pair<Rule>) -> Result<(FunctionBodyData, bool), ParseError> {
    let meta = get_meta(&pair);
    let (body, strict) = build_statement_list(pair.into_inner())?;
    Ok((FunctionBodyData { meta, body }, strict))
}

fn build_arrow_function(pair: Pair<Rule>) -> Result<FunctionData, ParseError> {
    let meta = get_meta(&pair);
    let pos = position(&pair);
    let mut inner = pair.into_inner();
    let params_pair = next_pair(&mut inner, pos)?;
    let params = params_pair
        .into_inner()
        .map(|i| build_identifier(&i))
        .collect();
    let body_pair = next_pair(&mut inner, pos)?;
    if body_pair.as_rule() == Rule::function_body {
        let (body, has_use_strict) = build_function_body(body_pair)?;
        Ok(FunctionData {
            meta,
            id: None,
            params,
            body,
            is_arrow: true,
            is_method: false,
            has_use_strict,
            is_concise: false,
        })
    } else {
        let expression = build_expression(body_pair)?;
        let expression_meta = *expression.get_meta();
        Ok(FunctionData {
            meta,
            id: None,
            params,
            body: FunctionBodyData {
                meta: expression_meta,
                body: vec![StatementType::ReturnStatement {
                    meta: expression_meta,
                    argument: Some(Box::new(expression)),
                }],
            },
            is_arrow: true,
            is_method: false,
            has_use_strict: false,
            is_concise: true,
        })
    }
}

fn build_export(pair: Pair<Rule>) -> Result<ExportKind, ParseError> {
    let pos = position(&pair);
    let inner = next_pair(&mut pair.into_inner(), pos)?;
    Ok(match inner.as_rule() {
        Rule::export_default => {
            let default_pos = position(&inner);
            let target = next_pair(&mut inner.into_inner(), default_pos)?;
            if target.as_rule() == Rule::default_function {
                ExportKind::DefaultFunction(Rc::new(build_function(target)?))
            } else {
                ExportKind::DefaultExpression(Box::new(build_expression(target)?))
            }
        }
        Rule::export_named => {
            let mut specifiers = vec![];
            for specifier in inner.into_inner() {
                let meta = get_meta(&specifier);
                let specifier_pos = position(&specifier);
                let mut names = specifier.into_inner();
                let local = build_identifier(&next_pair(&mut names, specifier_pos)?);
                let exported = match names.next() {
                    Some(p) => build_identifier(&p),
                    None => local.clone(),
                };
                specifiers.push(ExportSpecifierData {
                    meta,
                    local,
                    exported,
                });
            }
            ExportKind::Named(specifiers)
        }
        Rule::function_declaration => ExportKind::Declaration(
            DeclarationType::FunctionDeclaration(Rc::new(build_function(inner)?)),
        ),
        Rule::variable_declaration => ExportKind::Declaration(
            DeclarationType::VariableDeclaration(build_variable_declaration(inner)?),
        ),
        _ => return Err(get_unexpected_error(&inner)),
    })
}

fn build_expression(pair: Pair<Rule>) -> Result<ExpressionType, ParseError> {
    let meta = get_meta(&pair);
    let pos = position(&pair);
    match pair.as_rule() {
        Rule::expression => {
            let mut expressions = pair
                .into_inner()
                .map(build_expression)
                .collect::<Result<Vec<ExpressionType>, ParseError>>()?;
            if expressions.len() == 1 {
                expressions
                    .pop()
                    .ok_or_else(|| ParseError::new("Empty expression", pos.0, pos.1))
            } else {
                Ok(ExpressionType::SequenceExpression { meta, expressions })
            }
        }
        Rule::assignment_expression => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, pos)?;
            if first.as_rule() == Rule::arrow_function {
                return Ok(ExpressionType::ArrowFunctionExpression(Rc::new(
                    build_arrow_function(first)?,
                )));
            }
            let target_pair = first.clone();
            let left = build_expression(first)?;
            match inner.next() {
                None => Ok(left),
                Some(op_pair) => {
                    if !is_valid_simple_assignment_target(&left) {
                        return Err(ParseError::at_pair(
                            &target_pair,
                            "Invalid left-hand side in assignment",
                        ));
                    }
                    let operator = match op_pair.as_str() {
                        "=" => AssignmentOperator::Equals,
                        "+=" => AssignmentOperator::AddEquals,
                        "-=" => AssignmentOperator::SubtractEquals,
                        "*=" => AssignmentOperator::MultiplyEquals,
                        "/=" => AssignmentOperator::DivideEquals,
                        "%=" => AssignmentOperator::ModuloEquals,
                        "&&=" => AssignmentOperator::LogicalAndEquals,
                        "||=" => AssignmentOperator::LogicalOrEquals,
                        "??=" => AssignmentOperator::NullishEquals,
                        _ => return Err(get_unexpected_error(&op_pair)),
                    };
                    let right = build_expression(next_pair(&mut inner, pos)?)?;
                    Ok(ExpressionType::AssignmentExpression {
                        meta,
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                }
            }
        }
        Rule::conditional_expression => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, pos)?)?;
            match inner.next() {
                None => Ok(test),
                Some(consequent) => {
                    let consequent = build_expression(consequent)?;
                    let alternate = build_expression(next_pair(&mut inner, pos)?)?;
                    Ok(ExpressionType::ConditionalExpression {
                        meta,
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    })
                }
            }
        }
        Rule::coalesce_expression
        | Rule::logical_or_expression
        | Rule::logical_and_expression
        | Rule::equality_expression
        | Rule::relational_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_operator_chain(pair),
        Rule::unary_expression => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, pos)?;
            if first.as_rule() != Rule::unary_operator {
                return build_expression(first);
            }
            let operator = match first.as_str() {
                "-" => UnaryOperator::Minus,
                "+" => UnaryOperator::Plus,
                "!" => UnaryOperator::LogicalNot,
                "~" => UnaryOperator::BitwiseNot,
                "typeof" => UnaryOperator::TypeOf,
                "void" => UnaryOperator::Void,
                "delete" => UnaryOperator::Delete,
                _ => return Err(get_unexpected_error(&first)),
            };
            let argument = build_expression(next_pair(&mut inner, pos)?)?;
            Ok(ExpressionType::UnaryExpression {
                meta,
                operator,
                argument: Box::new(argument),
            })
        }
        Rule::prefix_update_expression => {
            let mut inner = pair.into_inner();
            let operator = build_update_operator(&next_pair(&mut inner, pos)?)?;
            let argument_pair = next_pair(&mut inner, pos)?;
            let argument = build_expression(argument_pair.clone())?;
            if !is_valid_simple_assignment_target(&argument) {
                return Err(ParseError::at_pair(
                    &argument_pair,
                    "Invalid left-hand side expression in prefix operation",
                ));
            }
            Ok(ExpressionType::UpdateExpression {
                meta,
                operator,
                argument: Box::new(argument),
                prefix: true,
            })
        }
        Rule::postfix_expression => {
            let mut inner = pair.into_inner();
            let argument_pair = next_pair(&mut inner, pos)?;
            let argument = build_expression(argument_pair.clone())?;
            match inner.next() {
                None => Ok(argument),
                Some(op) => {
                    if !is_valid_simple_assignment_target(&argument) {
                        return Err(ParseError::at_pair(
                            &argument_pair,
                            "Invalid left-hand side expression in postfix operation",
                        ));
                    }
                    Ok(ExpressionType::UpdateExpression {
                        meta,
                        operator: build_update_operator(&op)?,
                        argument: Box::new(argument),
                        prefix: false,
                    })
                }
            }
        }
        Rule::left_hand_side_expression | Rule::new_callee => {
            let mut inner = pair.into_inner();
            let head = build_expression(next_pair(&mut inner, pos)?)?;
            inner.try_fold(head, build_member_or_call)
        }
        Rule::new_expression => {
            let mut inner = pair.into_inner();
            let callee = build_expression(next_pair(&mut inner, pos)?)?;
            let arguments = match inner.next() {
                Some(args) => build_arguments(args)?,
                None => vec![],
            };
            Ok(ExpressionType::NewExpression {
                meta,
                callee: Box::new(callee),
                arguments,
            })
        }
        Rule::parenthesized_expression => build_expression(next_pair(&mut pair.into_inner(), pos)?),
        Rule::this_expression => Ok(ExpressionType::ThisExpression { meta }),
        Rule::identifier => Ok(ExpressionType::Identifier(build_identifier(&pair))),
        Rule::null_literal => Ok(ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NullLiteral,
        })),
        Rule::boolean_literal => Ok(ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::BooleanLiteral(pair.as_str() == "true"),
        })),
        Rule::numeric_literal => Ok(ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NumberLiteral(
                parse_numeric_literal(pair.as_str()).map_err(|m| ParseError::at_pair(&pair, m))?,
            ),
        })),
        Rule::string_literal => Ok(ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::StringLiteral(
                unescape_string_literal(pair.as_str())
                    .map_err(|m| ParseError::at_pair(&pair, m))?,
            ),
        })),
        Rule::function_expression => Ok(ExpressionType::FunctionExpression(Rc::new(
            build_function(pair)?,
        ))),
        Rule::arrow_function => Ok(ExpressionType::ArrowFunctionExpression(Rc::new(
            build_arrow_function(pair)?,
        ))),
        Rule::object_literal => {
            let properties = pair
                .into_inner()
                .map(build_property)
                .collect::<Result<Vec<PropertyData>, ParseError>>()?;
            Ok(ExpressionType::ObjectExpression { meta, properties })
        }
        _ => Err(get_unexpected_error(&pair)),
    }
}

fn build_update_operator(pair: &Pair<Rule>) -> Result<UpdateOperator, ParseError> {
    match pair.as_str() {
        "++" => Ok(UpdateOperator::PlusPlus),
        "--" => Ok(UpdateOperator::MinusMinus),
        _ => Err(get_unexpected_error(pair)),
    }
}

fn is_valid_simple_assignment_target(e: &ExpressionType) -> bool {
    matches!(
        e,
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_)
    )
}

/// Folds `a op b op c` left to right.
fn build_operator_chain(pair: Pair<Rule>) -> Result<ExpressionType, ParseError> {
    let pos = position(&pair);
    let mut inner = pair.into_inner();
    let mut left = build_expression(next_pair(&mut inner, pos)?)?;
    while let Some(op_pair) = inner.next() {
        let right = build_expression(next_pair(&mut inner, pos)?)?;
        let meta = Meta {
            start_index: left.get_meta().start_index,
            end_index: right.get_meta().end_index,
        };
        let (left_box, right_box) = (Box::new(left), Box::new(right));
        left = match op_pair.as_str() {
            "||" => logical(meta, LogicalOperator::Or, left_box, right_box),
            "&&" => logical(meta, LogicalOperator::And, left_box, right_box),
            "??" => logical(meta, LogicalOperator::NullishCoalescing, left_box, right_box),
            op => {
                let operator = match op {
                    "==" => BinaryOperator::LooselyEqual,
                    "!=" => BinaryOperator::LooselyUnequal,
                    "===" => BinaryOperator::StrictlyEqual,
                    "!==" => BinaryOperator::StrictlyUnequal,
                    "<" => BinaryOperator::LessThan,
                    "<=" => BinaryOperator::LessThanEqual,
                    ">" => BinaryOperator::GreaterThan,
                    ">=" => BinaryOperator::GreaterThanEqual,
                    "+" => BinaryOperator::Add,
                    "-" => BinaryOperator::Subtract,
                    "*" => BinaryOperator::Multiply,
                    "/" => BinaryOperator::Divide,
                    "%" => BinaryOperator::Modulo,
                    "in" => BinaryOperator::In,
                    "instanceof" => BinaryOperator::InstanceOf,
                    _ => return Err(get_unexpected_error(&op_pair)),
                };
                ExpressionType::BinaryExpression {
                    meta,
                    operator,
                    left: left_box,
                    right: right_box,
                }
            }
        };
    }
    Ok(left)
}

fn logical(
    meta: Meta,
    operator: LogicalOperator,
    left: Box<ExpressionType>,
    right: Box<ExpressionType>,
) -> ExpressionType {
    ExpressionType::LogicalExpression {
        meta,
        operator,
        left,
        right,
    }
}

fn build_member_or_call(
    object: ExpressionType,
    tail: Pair<Rule>,
) -> Result<ExpressionType, ParseError> {
    let meta = Meta {
        start_index: object.get_meta().start_index,
        end_index: tail.as_span().end(),
    };
    let pos = position(&tail);
    Ok(match tail.as_rule() {
        Rule::call_arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(object),
            arguments: build_arguments(tail)?,
        },
        Rule::member_dot => ExpressionType::MemberExpression(
            MemberExpressionType::SimpleMemberExpression {
                meta,
                object: Box::new(object),
                property: build_identifier(&next_pair(&mut tail.into_inner(), pos)?),
            },
        ),
        Rule::member_index => ExpressionType::MemberExpression(
            MemberExpressionType::ComputedMemberExpression {
                meta,
                object: Box::new(object),
                property: Box::new(build_expression(next_pair(&mut tail.into_inner(), pos)?)?),
            },
        ),
        _ => return Err(get_unexpected_error(&tail)),
    })
}

fn build_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionType>, ParseError> {
    pair.into_inner().map(build_expression).collect()
}

fn build_property(pair: Pair<Rule>) -> Result<PropertyData, ParseError> {
    let meta = get_meta(&pair);
    let pos = position(&pair);
    let mut inner = pair.into_inner();
    let first = next_pair(&mut inner, pos)?;
    match first.as_rule() {
        Rule::identifier => {
            let id = build_identifier(&first);
            Ok(PropertyData {
                meta,
                key: PropertyNameType::Name(id.name.to_string()),
                value: Box::new(ExpressionType::Identifier(id)),
                shorthand: true,
            })
        }
        Rule::method_definition => {
            let method_pos = position(&first);
            let key_pair = next_pair(&mut first.clone().into_inner(), method_pos)?;
            let key = build_property_name(key_pair)?;
            Ok(PropertyData {
                meta,
                key,
                value: Box::new(ExpressionType::FunctionExpression(Rc::new(
                    build_function(first)?,
                ))),
                shorthand: false,
            })
        }
        Rule::property_name => {
            let key = build_property_name(first)?;
            let value = build_expression(next_pair(&mut inner, pos)?)?;
            Ok(PropertyData {
                meta,
                key,
                value: Box::new(value),
                shorthand: false,
            })
        }
        _ => Err(get_unexpected_error(&first)),
    }
}

fn build_property_name(pair: Pair<Rule>) -> Result<PropertyNameType, ParseError> {
    let pos = position(&pair);
    let inner = next_pair(&mut pair.into_inner(), pos)?;
    Ok(match inner.as_rule() {
        Rule::identifier_name => PropertyNameType::Name(inner.as_str().to_string()),
        Rule::string_literal => PropertyNameType::Name(
            unescape_string_literal(inner.as_str()).map_err(|m| ParseError::at_pair(&inner, m))?,
        ),
        Rule::numeric_literal => PropertyNameType::Computed(Box::new(build_expression(inner)?)),
        Rule::computed_property_name => PropertyNameType::Computed(Box::new(build_expression(
            next_pair(&mut inner.into_inner(), pos)?,
        )?)),
        _ => return Err(get_unexpected_error(&inner)),
    })
}
