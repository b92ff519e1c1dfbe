use std::fmt;

use crate::errors::EvalError;

/// Numeric type carried by literals and variables in an expression tree.
///
/// Evaluation always happens in `f64`. The type only decides which literals the
/// differentiation rules build and how composite nodes report their own type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumType {
    /// Floating point quantity
    #[default]
    Float,
    /// Integer quantity
    Int,
}

impl NumType {
    /// Joins two operand types: `Int` only when both sides are `Int`.
    pub fn join(self, other: NumType) -> NumType {
        match (self, other) {
            (NumType::Int, NumType::Int) => NumType::Int,
            _ => NumType::Float,
        }
    }
}

impl fmt::Display for NumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumType::Float => write!(f, "float"),
            NumType::Int => write!(f, "int"),
        }
    }
}

/// Shape of an evaluated result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Vector,
    Matrix,
    /// A binder that was not applied to an argument
    Function,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "scalar"),
            Shape::Vector => write!(f, "vector"),
            Shape::Matrix => write!(f, "matrix"),
            Shape::Function => write!(f, "function"),
        }
    }
}

/// Numeric result of evaluating an expression tree.
///
/// The evaluator returns one tagged value; callers that need a specific shape
/// use [`Value::into_scalar`], [`Value::into_vector`] or [`Value::into_matrix`],
/// which fail with [`EvalError::TypeMismatch`] on the wrong variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
    /// Row-major matrix, every row of equal length
    Matrix(Vec<Vec<f64>>),
}

impl Value {
    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Vector(_) => Shape::Vector,
            Value::Matrix(_) => Shape::Matrix,
        }
    }

    pub fn into_scalar(self) -> Result<f64, EvalError> {
        match self {
            Value::Scalar(v) => Ok(v),
            other => Err(EvalError::TypeMismatch {
                expected: Shape::Scalar,
                found: other.shape(),
            }),
        }
    }

    pub fn into_vector(self) -> Result<Vec<f64>, EvalError> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(EvalError::TypeMismatch {
                expected: Shape::Vector,
                found: other.shape(),
            }),
        }
    }

    pub fn into_matrix(self) -> Result<Vec<Vec<f64>>, EvalError> {
        match self {
            Value::Matrix(m) => Ok(m),
            other => Err(EvalError::TypeMismatch {
                expected: Shape::Matrix,
                found: other.shape(),
            }),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::Vector(value)
    }
}
