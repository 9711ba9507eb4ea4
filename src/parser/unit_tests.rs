use super::api::{JsParser, Rule};
use super::ast::*;

use pest::{consumes_to, parses_to};

#[test]
fn test_numeric_literal_is_a_single_token() {
    parses_to! {
        parser: JsParser,
        input: "10.5e2",
        rule: Rule::numeric_literal,
        tokens: [numeric_literal(0, 6)]
    };
}

#[test]
fn test_identifier_may_start_with_keyword() {
    parses_to! {
        parser: JsParser,
        input: "iffy",
        rule: Rule::identifier,
        tokens: [identifier(0, 4)]
    };
}

#[test]
fn test_keyword_is_not_an_identifier() {
    assert!(JsParser::parse_script("var if = 1;").is_err());
}

#[test]
fn test_string_literal_keeps_quotes_in_token() {
    parses_to! {
        parser: JsParser,
        input: "'a\\'b'",
        rule: Rule::string_literal,
        tokens: [string_literal(0, 6)]
    };
}

fn single_expression(code: &str) -> ExpressionType {
    let mut program = JsParser::parse_script(code).unwrap();
    match program.body.pop() {
        Some(StatementType::ExpressionStatement { expression, .. }) => *expression,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_binary_operators_fold_left() {
    match single_expression("1 - 2 - 3;") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Subtract,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Subtract,
                    ..
                }
            ));
            assert!(matches!(
                *right,
                ExpressionType::Literal(LiteralData {
                    value: LiteralType::NumberLiteral(n),
                    ..
                }) if n == 3.0
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter() {
    match single_expression("1 + 2 * 3") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    match single_expression("a = b = 1") {
        ExpressionType::AssignmentExpression { left, right, .. } => {
            assert!(matches!(*left, ExpressionType::Identifier(_)));
            assert!(matches!(*right, ExpressionType::AssignmentExpression { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_invalid_assignment_target() {
    let err = JsParser::parse_script("1 = 2;").unwrap_err();
    assert!(err.message.contains("Invalid left-hand side"));
}

#[test]
fn test_arrow_function_with_concise_body() {
    match single_expression("(a, b) => a + b") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert_eq!(f.params.len(), 2);
            assert!(f.is_concise);
            assert!(matches!(
                f.body.body[0],
                StatementType::ReturnStatement { argument: Some(_), .. }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_member_call_chain() {
    match single_expression("console.log(1, 2)") {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            assert!(matches!(
                *callee,
                ExpressionType::MemberExpression(
                    MemberExpressionType::SimpleMemberExpression { .. }
                )
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_new_with_member_callee() {
    match single_expression("new a.B(1)") {
        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 1);
            assert!(matches!(*callee, ExpressionType::MemberExpression(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_object_literal_property_forms() {
    match single_expression("({ a: 1, b, c() { return 1; }, [d]: 2, 'e': 3 })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties.len(), 5);
            assert!(properties[1].shorthand);
            assert!(matches!(*properties[2].value, ExpressionType::FunctionExpression(_)));
            assert!(matches!(properties[3].key, PropertyNameType::Computed(_)));
            assert!(matches!(&properties[4].key, PropertyNameType::Name(n) if n == "e"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_use_strict_directive() {
    assert!(JsParser::parse_script("'use strict'; var a;").unwrap().strict);
    assert!(!JsParser::parse_script("var a; 'use strict';").unwrap().strict);
    assert!(JsParser::parse_module("var a;").unwrap().strict);
}

#[test]
fn test_function_level_directive() {
    let program = JsParser::parse_script("function f() { \"use strict\"; return 1; }").unwrap();
    match &program.body[0] {
        StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => {
            assert!(f.has_use_strict)
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!program.strict);
}

#[test]
fn test_keyword_prefixed_identifiers_in_statements() {
    let program = JsParser::parse_script("var iffy = 1; var newer = iffy; instance = 2;").unwrap();
    assert_eq!(program.body.len(), 3);
}

#[test]
fn test_const_requires_initializer() {
    let err = JsParser::parse_script("const a;").unwrap_err();
    assert!(err.message.contains("Missing initializer"));
}

#[test]
fn test_duplicate_lexical_declaration_is_early_error() {
    assert!(JsParser::parse_script("let a = 1; let a = 2;").is_err());
    assert!(JsParser::parse_script("let a = 1; var a = 2;").is_err());
    assert!(JsParser::parse_script("var a = 1; var a = 2;").is_ok());
    assert!(JsParser::parse_script("{ let a; } { let a; }").is_ok());
}

#[test]
fn test_break_and_continue_targets() {
    assert!(JsParser::parse_script("break;").is_err());
    assert!(JsParser::parse_script("while (true) { break; }").is_ok());
    assert!(JsParser::parse_script("a: { break a; }").is_ok());
    assert!(JsParser::parse_script("a: { while (true) { continue a; } }").is_err());
    assert!(JsParser::parse_script("a: while (true) { continue a; }").is_ok());
    assert!(JsParser::parse_script("while (true) { function f() { break; } }").is_err());
}

#[test]
fn test_return_outside_function() {
    let err = JsParser::parse_script("return 1;").unwrap_err();
    assert!(err.message.contains("Illegal return"));
}

#[test]
fn test_strict_mode_rejects_with() {
    assert!(JsParser::parse_script("with ({}) {}").is_ok());
    assert!(JsParser::parse_script("'use strict'; with ({}) {}").is_err());
}

#[test]
fn test_module_exports() {
    let program = JsParser::parse_module(
        "export const a = 1; export function f() {} var b = 2; export { b as c }; \
         export default 5;",
    )
    .unwrap();
    let entries = super::static_semantics::export_entries(&program.body);
    let names: Vec<&str> = entries.iter().map(|e| e.export_name.as_str()).collect();
    assert_eq!(names, vec!["a", "f", "c", "default"]);
}

#[test]
fn test_module_export_of_undeclared_name() {
    assert!(JsParser::parse_module("export { nope };").is_err());
    assert!(JsParser::parse_module("var x; export { x, x };").is_err());
}

#[test]
fn test_error_position_is_reported() {
    let err = JsParser::parse_script("var a = 1;\nvar = 2;").unwrap_err();
    assert_eq!(err.line, 2);
}
