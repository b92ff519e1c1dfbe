//! Conversion module for transforming evalexpr AST nodes into our internal expression representation.
//!
//! This module walks the operator tree produced by the evalexpr parser and builds the
//! corresponding [`Expr`]. Variables must be among the declared parameters; function
//! names are mapped onto the built-in operators where one exists and become named
//! calls otherwise, to be resolved later through a rule table.
//!
//! The main entry point is the `build_ast` function.

use evalexpr::{Node, Operator};

use crate::{
    errors::ConvertError,
    expr::{Expr, UnaryOp, VarRef},
};

/// Converts an evalexpr AST node into our internal expression representation.
///
/// # Arguments
/// * `node` - The evalexpr AST node to convert
/// * `params` - The variables the expression may reference
///
/// # Returns
/// * `Result<Expr, ConvertError>` - The converted expression or an error if conversion fails
///
/// # Examples of supported operations:
/// * Basic arithmetic: +, -, *, /, ^ and unary minus
/// * Variables: x, y, etc.
/// * Constants: integer and floating point numbers
/// * Functions: ln/log, exp, sqrt, sin, cos, tan, sinh, cosh, tanh, asin, acos, atan, atan2,
///   with or without the `math::` prefix
/// * Any other function name, e.g. abs(x) or hypot(x, y), as a named call
pub fn build_ast(node: &Node, params: &[VarRef]) -> Result<Expr, ConvertError> {
    match node.operator() {
        // Addition and multiplication may carry more than two operands
        Operator::Add => fold_children(node, params, Expr::add),
        Operator::Mul => fold_children(node, params, Expr::mul),
        Operator::Sub => {
            let (left, right) = two_children(node, params, "-")?;
            Ok(Expr::sub(left, right))
        }
        Operator::Div => {
            let (left, right) = two_children(node, params, "/")?;
            Ok(Expr::div(left, right))
        }
        Operator::Exp => {
            let (base, exponent) = two_children(node, params, "^")?;
            Ok(Expr::pow(base, exponent))
        }
        Operator::Neg => match node.children() {
            [operand] => Ok(Expr::neg(build_ast(operand, params)?)),
            children => Err(ConvertError::Arity {
                operator: "neg".to_string(),
                expected: 1,
                got: children.len(),
            }),
        },
        Operator::Const { value } => match value {
            evalexpr::Value::Float(f) => Ok(Expr::constant(*f)),
            evalexpr::Value::Int(i) => Ok(Expr::int(*i)),
            _ => Err(ConvertError::ConstOperator(format!("{value:?}"))),
        },
        Operator::VariableIdentifierRead { identifier } => params
            .iter()
            .find(|p| p.name == *identifier)
            .map(|p| Expr::Var(p.clone()))
            .ok_or_else(|| ConvertError::VariableNotFound(identifier.to_string())),
        Operator::FunctionIdentifier { identifier } => {
            let name = identifier
                .strip_prefix("math::")
                .unwrap_or(identifier.as_str());
            let mut args = Vec::new();
            for child in node.children() {
                collect_args(child, params, &mut args)?;
            }

            if let Some(op) = UnaryOp::from_name(name) {
                let [arg] = expect_args::<1>(name, args)?;
                Ok(Expr::unary(op, arg))
            } else if name == "atan2" {
                let [y, x] = expect_args::<2>(name, args)?;
                Ok(Expr::atan2(y, x))
            } else {
                Ok(Expr::call(name, args))
            }
        }
        // Root node - should have exactly one child
        Operator::RootNode => match node.children() {
            [child] => build_ast(child, params),
            children => Err(ConvertError::RootNode(format!("{children:?}"))),
        },
        // Any other operator is unsupported
        other => Err(ConvertError::UnsupportedOperator(format!("{other:?}"))),
    }
}

fn fold_children(
    node: &Node,
    params: &[VarRef],
    combine: fn(Expr, Expr) -> Expr,
) -> Result<Expr, ConvertError> {
    let children = node.children();
    let Some(first) = children.first() else {
        return Err(ConvertError::Arity {
            operator: format!("{:?}", node.operator()),
            expected: 2,
            got: 0,
        });
    };
    children
        .iter()
        .skip(1)
        .try_fold(build_ast(first, params)?, |acc, child| {
            Ok(combine(acc, build_ast(child, params)?))
        })
}

fn two_children(
    node: &Node,
    params: &[VarRef],
    operator: &str,
) -> Result<(Expr, Expr), ConvertError> {
    match node.children() {
        [left, right] => Ok((build_ast(left, params)?, build_ast(right, params)?)),
        children => Err(ConvertError::Arity {
            operator: operator.to_string(),
            expected: 2,
            got: children.len(),
        }),
    }
}

/// Flattens a function's argument list. `f(a, b)` arrives as a tuple, possibly
/// wrapped in a root node for the parentheses.
fn collect_args(node: &Node, params: &[VarRef], args: &mut Vec<Expr>) -> Result<(), ConvertError> {
    match node.operator() {
        Operator::RootNode => {
            for child in node.children() {
                collect_args(child, params, args)?;
            }
        }
        Operator::Tuple => {
            for child in node.children() {
                args.push(build_ast(child, params)?);
            }
        }
        _ => args.push(build_ast(node, params)?),
    }
    Ok(())
}

fn expect_args<const N: usize>(name: &str, args: Vec<Expr>) -> Result<[Expr; N], ConvertError> {
    let got = args.len();
    args.try_into().map_err(|_| ConvertError::Arity {
        operator: name.to_string(),
        expected: N,
        got,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Head;
    use evalexpr::build_operator_tree;

    fn params(names: &[&str]) -> Vec<VarRef> {
        names.iter().map(|n| VarRef::new(*n)).collect()
    }

    fn convert(src: &str, names: &[&str]) -> Result<Expr, ConvertError> {
        let node: Node = build_operator_tree(src).unwrap();
        build_ast(&node, &params(names))
    }

    #[test]
    fn test_arithmetic() {
        let expr = convert("2*x + y^2", &["x", "y"]).unwrap();
        assert_eq!(format!("{expr}"), "((2 * x) + (y^2))");

        let expr = convert("(x - y) / -x", &["x", "y"]).unwrap();
        assert_eq!(format!("{expr}"), "((x - y) / -(x))");
    }

    #[test]
    fn test_literal_types() {
        let expr = convert("x + 2", &["x"]).unwrap();
        match expr {
            Expr::Binary(_, _, right) => assert_eq!(*right, Expr::int(2)),
            other => panic!("unexpected tree {other}"),
        }
        assert_eq!(convert("1.5", &[]).unwrap(), Expr::constant(1.5));
    }

    #[test]
    fn test_functions() {
        let expr = convert("sin(x) * ln(y)", &["x", "y"]).unwrap();
        assert_eq!(format!("{expr}"), "(sin(x) * log(y))");

        let expr = convert("math::cos(x)", &["x"]).unwrap();
        assert_eq!(expr, Expr::cos(Expr::var("x")));

        let expr = convert("atan2(y, x)", &["x", "y"]).unwrap();
        assert_eq!(expr, Expr::atan2(Expr::var("y"), Expr::var("x")));
    }

    #[test]
    fn test_named_calls() {
        let expr = convert("hypot(x, y) + abs(x)", &["x", "y"]).unwrap();
        match expr {
            Expr::Binary(_, left, right) => {
                assert!(matches!(*left, Expr::Generic(Head::Call(ref n), ref a) if n == "hypot" && a.len() == 2));
                assert!(matches!(*right, Expr::Generic(Head::Call(ref n), ref a) if n == "abs" && a.len() == 1));
            }
            other => panic!("unexpected tree {other}"),
        }
    }

    #[test]
    fn test_wrong_function_arity() {
        assert!(matches!(
            convert("sin(x, y)", &["x", "y"]),
            Err(ConvertError::Arity { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn test_undeclared_variable() {
        assert!(matches!(
            convert("x + z", &["x"]),
            Err(ConvertError::VariableNotFound(name)) if name == "z"
        ));
    }

    #[test]
    fn test_unsupported_operator() {
        assert!(matches!(
            convert("x % 2", &["x"]),
            Err(ConvertError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            convert("\"text\"", &[]),
            Err(ConvertError::ConstOperator(_))
        ));
    }
}
