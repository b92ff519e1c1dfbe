//! Error types for the evalexpr-symdiff crate.
//!
//! Each layer has its own error enum and the high-level types wrap them:
//!
//! - `ConvertError`: Errors during conversion from the evalexpr AST to an expression tree
//! - `DiffError`: Errors raised by the differentiation engine and the order/partial driver
//! - `EvalError`: Errors raised while reducing an expression tree to a number
//! - `EquationError`: High-level errors from equations, systems and the derived operations
//!
//! Each error type implements the standard Error trait and provides detailed error messages.

use evalexpr::{DefaultNumericTypes, EvalexprError};
use thiserror::Error;

use crate::types::Shape;

/// Errors that can occur during conversion from evalexpr AST to our expression tree.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Error when encountering an operator that is not supported by our implementation
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// Error when an operator does not have the expected number of operands
    #[error("Operator {operator} expects {expected} operands, got {got}")]
    Arity {
        operator: String,
        expected: usize,
        got: usize,
    },
    /// Error when the root node does not have exactly one child
    #[error("Expected single child for root node: {0}")]
    RootNode(String),
    /// Error when a constant value is not numeric
    #[error("Expected numeric constant: {0}")]
    ConstOperator(String),
    /// Error when a variable is not among the declared parameters
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
}

/// Errors raised while building derivative trees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    /// The requested derivative order is negative
    #[error("Invalid derivative order: {0}")]
    InvalidOrder(i64),
    /// A named differentiation target is not a parameter (strict lookup only)
    #[error("Variable not found among parameters: {0}")]
    VariableNotFound(String),
    /// The tree contains a call with no registered derivative
    #[error("Cannot differentiate unsupported construct: {0}")]
    UnsupportedConstruct(String),
}

/// Errors raised while evaluating an expression tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The number of arguments does not match the number of curried parameters
    #[error("Arity mismatch: expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    /// The reduced value does not have the expected shape
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Shape, found: Shape },
    /// A variable occurs in the body without being bound to a value
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),
    /// The tree contains a call with no registered evaluation
    #[error("Cannot evaluate unsupported construct: {0}")]
    UnsupportedConstruct(String),
}

/// High-level errors that can occur when working with functions, equations and systems.
///
/// This enum wraps the lower-level errors from parsing, conversion, differentiation
/// and evaluation, and adds the input validation done by the front end.
#[derive(Debug, Error)]
pub enum EquationError {
    /// Error when parsing the initial expression string with evalexpr
    #[error("Failed to build Evalexpr AST")]
    BuildEvalexprError(#[from] EvalexprError<DefaultNumericTypes>),
    /// Error when converting from evalexpr AST to our expression tree
    #[error("Failed to build expression tree")]
    BuildAstError(#[from] ConvertError),
    /// Error while differentiating
    #[error(transparent)]
    Differentiation(#[from] DiffError),
    /// Error while evaluating
    #[error(transparent)]
    Evaluation(#[from] EvalError),
    /// Error when trying to get derivative for a variable that doesn't exist
    #[error("Derivative not found for variable: {0}")]
    DerivativeNotFound(String),
    /// Error when the input length is not the same as the number of variables
    #[error("Invalid input length: expected {expected}, got {got}")]
    InvalidInputLength { expected: usize, got: usize },
    /// Error when a variable is not found in the equation
    #[error("Variable not found in equation: {0}")]
    VariableNotFound(String),
    /// Error when the output length is not the same as the number of equations
    #[error("Invalid output length: expected {expected}, got {got}")]
    InvalidOutputLength { expected: usize, got: usize },
    /// Error when a variable map does not assign the indices 0..n exactly once
    #[error("Invalid variable map: {0}")]
    InvalidVariableMap(String),
}
