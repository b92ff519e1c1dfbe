//! Tree-walking evaluator.
//!
//! Binds the outermost curried parameters of a function to the given arguments,
//! left to right, and reduces the body to a [`Value`]. Arithmetic follows IEEE 754:
//! `log(-1)` is NaN and `1 / 0` is infinity, neither is an error.

use log::trace;

use crate::errors::EvalError;
use crate::expr::{Expr, Head, VarRef};
use crate::rules::{standard, RuleTable};
use crate::types::{Shape, Value};

/// Evaluates expression trees, resolving named calls through a rule table.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'t> {
    rules: &'t RuleTable,
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Self::new(standard())
    }
}

impl<'t> Evaluator<'t> {
    pub fn new(rules: &'t RuleTable) -> Self {
        Self { rules }
    }

    /// Applies the curried function `expr` to `args` and reduces the result.
    ///
    /// A tree without binders is a function of zero arguments.
    ///
    /// # Errors
    /// - [`EvalError::ArityMismatch`] when `args` does not have one value per parameter
    /// - [`EvalError::UnboundVariable`] when the body references a variable with no value
    /// - [`EvalError::TypeMismatch`] for ragged aggregates or a binder inside the body
    /// - [`EvalError::UnsupportedConstruct`] for calls missing from the rule table
    pub fn evaluate(&self, expr: &Expr, args: &[f64]) -> Result<Value, EvalError> {
        let params = expr.params();
        if params.len() != args.len() {
            return Err(EvalError::ArityMismatch {
                expected: params.len(),
                got: args.len(),
            });
        }
        trace!("evaluating {} nodes at {args:?}", expr.size());

        let env: Vec<(&VarRef, f64)> = params.into_iter().zip(args.iter().copied()).collect();
        self.reduce(expr.body(), &env)
    }

    fn reduce(&self, expr: &Expr, env: &[(&VarRef, f64)]) -> Result<Value, EvalError> {
        match expr {
            Expr::Const(value, _) => Ok(Value::Scalar(*value)),
            Expr::Zero(_) => Ok(Value::Scalar(0.0)),
            Expr::One(_) => Ok(Value::Scalar(1.0)),
            // Later parameters are bound by inner binders and shadow earlier ones
            Expr::Var(var_ref) => env
                .iter()
                .rev()
                .find(|(param, _)| param.same_entity(var_ref))
                .map(|(_, value)| Value::Scalar(*value))
                .ok_or_else(|| EvalError::UnboundVariable(var_ref.name.clone())),
            Expr::Unary(op, operand) => {
                let x = self.scalar(operand, env)?;
                Ok(Value::Scalar(op.apply(x)))
            }
            Expr::Binary(op, left, right) => {
                let l = self.scalar(left, env)?;
                let r = self.scalar(right, env)?;
                Ok(Value::Scalar(op.apply(l, r)))
            }
            Expr::Lambda(..) => Err(EvalError::TypeMismatch {
                expected: Shape::Scalar,
                found: Shape::Function,
            }),
            Expr::Generic(Head::Vector, children) => self.aggregate(children, env),
            Expr::Generic(Head::Call(name), args) => {
                let def = self
                    .rules
                    .get(name)
                    .ok_or_else(|| EvalError::UnsupportedConstruct(name.clone()))?;
                if def.arity != args.len() {
                    return Err(EvalError::ArityMismatch {
                        expected: def.arity,
                        got: args.len(),
                    });
                }
                let values = args
                    .iter()
                    .map(|arg| self.scalar(arg, env))
                    .collect::<Result<Vec<f64>, EvalError>>()?;
                Ok(Value::Scalar((def.eval)(&values)))
            }
        }
    }

    fn scalar(&self, expr: &Expr, env: &[(&VarRef, f64)]) -> Result<f64, EvalError> {
        self.reduce(expr, env)?.into_scalar()
    }

    /// Scalars stack into a vector, equal-length vectors into a row-major matrix.
    fn aggregate(&self, children: &[Expr], env: &[(&VarRef, f64)]) -> Result<Value, EvalError> {
        let values = children
            .iter()
            .map(|child| self.reduce(child, env))
            .collect::<Result<Vec<Value>, EvalError>>()?;

        match values.first().map(Value::shape) {
            None => Ok(Value::Vector(Vec::new())),
            Some(Shape::Scalar) => values
                .into_iter()
                .map(Value::into_scalar)
                .collect::<Result<Vec<f64>, EvalError>>()
                .map(Value::Vector),
            Some(Shape::Vector) => {
                let rows = values
                    .into_iter()
                    .map(Value::into_vector)
                    .collect::<Result<Vec<Vec<f64>>, EvalError>>()?;
                let width = rows[0].len();
                if rows.iter().any(|row| row.len() != width) {
                    // Ragged rows do not form a matrix
                    return Err(EvalError::TypeMismatch {
                        expected: Shape::Matrix,
                        found: Shape::Vector,
                    });
                }
                Ok(Value::Matrix(rows))
            }
            Some(found) => Err(EvalError::TypeMismatch {
                expected: Shape::Scalar,
                found,
            }),
        }
    }
}

/// Evaluates `expr` at `args` using the standard rule table.
pub fn evaluate(expr: &Expr, args: &[f64]) -> Result<Value, EvalError> {
    Evaluator::default().evaluate(expr, args)
}
