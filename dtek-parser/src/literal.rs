//! Restricted literal evaluator.
//!
//! Turns the right-hand side of a script assignment into a JSON value
//! without executing anything. Only these nodes are accepted:
//!
//! - `null`, booleans, numbers and strings
//! - array literals (holes become `null`)
//! - object literals with plain, non-computed keys
//! - unary minus applied to a number
//!
//! Parentheses are transparent but count as a nesting level. Anything else
//! is rejected with a [`ParseKind::Literal`] error naming the offending
//! node, and nesting is bounded by [`MAX_DEPTH`].

use oxc_ast::ast::{
    ArrayExpressionElement, Expression, ObjectPropertyKind, PropertyKind, UnaryOperator,
};
use serde_json::{Map, Number, Value};

use dtek_core::{DtekError, ParseKind};

/// Maximum nesting of arrays, objects and parentheses.
pub const MAX_DEPTH: usize = 50;

/// Evaluates a literal expression into a JSON value.
pub fn evaluate(expr: &Expression<'_>) -> Result<Value, DtekError> {
    eval(expr, 0)
}

fn eval(expr: &Expression<'_>, depth: usize) -> Result<Value, DtekError> {
    if depth > MAX_DEPTH {
        return Err(DtekError::parse(
            ParseKind::Literal,
            format!("literal nested at most {MAX_DEPTH} levels"),
            Some(format!("depth {depth}")),
        ));
    }

    match expr {
        Expression::NullLiteral(_) => Ok(Value::Null),
        Expression::BooleanLiteral(b) => Ok(Value::Bool(b.value)),
        Expression::NumericLiteral(n) => number(n.value),
        Expression::StringLiteral(s) => Ok(Value::String(s.value.as_str().to_string())),
        Expression::ParenthesizedExpression(p) => eval(&p.expression, depth + 1),
        Expression::UnaryExpression(u) if u.operator == UnaryOperator::UnaryNegation => {
            match u.argument.without_parentheses() {
                Expression::NumericLiteral(n) => number(-n.value),
                other => Err(reject("numeric literal after unary minus", other)),
            }
        }
        Expression::ArrayExpression(array) => {
            let mut items = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                let item = match element {
                    ArrayExpressionElement::Elision(_) => Value::Null,
                    ArrayExpressionElement::SpreadElement(_) => {
                        return Err(DtekError::parse(
                            ParseKind::Literal,
                            "array element",
                            Some("SpreadElement".to_string()),
                        ));
                    }
                    other => match other.as_expression() {
                        Some(inner) => eval(inner, depth + 1)?,
                        None => {
                            return Err(DtekError::parse(
                                ParseKind::Literal,
                                "array element",
                                Some("unsupported element".to_string()),
                            ));
                        }
                    },
                };
                items.push(item);
            }
            Ok(Value::Array(items))
        }
        Expression::ObjectExpression(object) => {
            let mut map = Map::new();
            for property in &object.properties {
                let ObjectPropertyKind::ObjectProperty(prop) = property else {
                    return Err(DtekError::parse(
                        ParseKind::Literal,
                        "object property",
                        Some("SpreadElement".to_string()),
                    ));
                };
                if prop.computed || prop.method || prop.kind != PropertyKind::Init {
                    return Err(DtekError::parse(
                        ParseKind::Literal,
                        "plain object property",
                        Some("computed key, method or accessor".to_string()),
                    ));
                }
                let key = prop.key.static_name().ok_or_else(|| {
                    DtekError::parse(
                        ParseKind::Literal,
                        "static property key",
                        Some("dynamic key".to_string()),
                    )
                })?;
                let value = eval(&prop.value, depth + 1)?;
                map.insert(key.into_owned(), value);
            }
            Ok(Value::Object(map))
        }
        other => Err(reject("literal", other)),
    }
}

/// Converts a JS number, keeping integral values as JSON integers.
#[allow(clippy::cast_possible_truncation)]
fn number(value: f64) -> Result<Value, DtekError> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::Number(Number::from(value as i64)));
    }
    Number::from_f64(value).map(Value::Number).ok_or_else(|| {
        DtekError::parse(
            ParseKind::Literal,
            "finite number",
            Some(value.to_string()),
        )
    })
}

fn reject(expected: &str, expr: &Expression<'_>) -> DtekError {
    DtekError::parse(
        ParseKind::Literal,
        expected,
        Some(node_name(expr).to_string()),
    )
}

/// Names an expression node for error messages.
pub fn node_name(expr: &Expression<'_>) -> &'static str {
    match expr {
        Expression::BooleanLiteral(_) => "BooleanLiteral",
        Expression::NullLiteral(_) => "NullLiteral",
        Expression::NumericLiteral(_) => "NumericLiteral",
        Expression::BigIntLiteral(_) => "BigIntLiteral",
        Expression::RegExpLiteral(_) => "RegExpLiteral",
        Expression::StringLiteral(_) => "StringLiteral",
        Expression::TemplateLiteral(_) => "TemplateLiteral",
        Expression::Identifier(_) => "Identifier",
        Expression::ArrayExpression(_) => "ArrayExpression",
        Expression::ObjectExpression(_) => "ObjectExpression",
        Expression::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
        Expression::FunctionExpression(_) => "FunctionExpression",
        Expression::AssignmentExpression(_) => "AssignmentExpression",
        Expression::BinaryExpression(_) => "BinaryExpression",
        Expression::CallExpression(_) => "CallExpression",
        Expression::NewExpression(_) => "NewExpression",
        Expression::ConditionalExpression(_) => "ConditionalExpression",
        Expression::LogicalExpression(_) => "LogicalExpression",
        Expression::SequenceExpression(_) => "SequenceExpression",
        Expression::TaggedTemplateExpression(_) => "TaggedTemplateExpression",
        Expression::UnaryExpression(_) => "UnaryExpression",
        Expression::UpdateExpression(_) => "UpdateExpression",
        Expression::AwaitExpression(_) => "AwaitExpression",
        Expression::ThisExpression(_) => "ThisExpression",
        Expression::ClassExpression(_) => "ClassExpression",
        Expression::ParenthesizedExpression(_) => "ParenthesizedExpression",
        Expression::StaticMemberExpression(_)
        | Expression::ComputedMemberExpression(_)
        | Expression::PrivateFieldExpression(_) => "MemberExpression",
        _ => "Expression",
    }
}

// ============================================================================
// Tests
// ============================================================================
