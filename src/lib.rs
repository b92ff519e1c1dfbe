//! Exact symbolic differentiation of mathematical expressions.
//!
//! This crate differentiates curried functions `\x1 -> \x2 -> ... -> body` symbolically,
//! producing new expression trees rather than numerical approximations, and evaluates them
//! at points. It builds on top of the [evalexpr](https://github.com/ISibboI/evalexpr) crate
//! for parsing.
//!
//! # Features
//!
//! - Exact symbolic derivatives of any order
//! - Partial derivatives by variable name
//! - Gradients, Jacobians, Hessians and Laplacians at a point
//! - User-registered functions with their own derivative rules
//! - Optional `ndarray` and `nalgebra` inputs and outputs
//!
//! # Example
//!
//! ```rust
//! use evalexpr_symdiff::Equation;
//!
//! // Create an equation
//! let eq = Equation::new("2*x + y^2".to_string()).unwrap();
//!
//! // Evaluate at point (x=1, y=2)
//! let result = eq.eval(&[1.0, 2.0]).unwrap(); // Returns 6.0
//! assert_eq!(result, 6.0);
//!
//! // Compute gradient [∂/∂x, ∂/∂y]
//! let gradient = eq.gradient(&[1.0, 2.0]).unwrap(); // Returns [2.0, 4.0]
//! assert_eq!(gradient, vec![2.0, 4.0]);
//! ```
//!
//! Expressions can also be built directly:
//!
//! ```rust
//! use evalexpr_symdiff::prelude::*;
//!
//! // \x -> \y -> x * y
//! let f = Expr::lambda(
//!     [VarRef::new("x"), VarRef::new("y")],
//!     Expr::mul(Expr::var("x"), Expr::var("y")),
//! );
//! assert_eq!(hessian(&f, &[1.0, 2.0]).unwrap(), vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
//! ```

pub use derived::{
    diff, diff_with_value, diffn, diffn_with_value, grad, grad_with_value, gradhessian,
    gradhessian_with_value, hessian, jacobian, jacobian_t, laplacian, Calculus,
};
pub use diff::{differentiate, Differentiator};
pub use equation::Equation;
pub use expr::{Expr, VarRef};
pub use eval::{evaluate, Evaluator};
pub use partial::{differentiate_by_name, differentiate_by_name_strict, differentiate_n, differentiate_wrt};
pub use system::EquationSystem;

pub mod prelude {
    pub use crate::backends::matrix::Matrix;
    pub use crate::backends::vector::Vector;
    pub use crate::convert::build_ast;
    pub use crate::derived::*;
    pub use crate::diff::{differentiate, Differentiator};
    pub use crate::equation::Equation;
    pub use crate::eval::{evaluate, Evaluator};
    pub use crate::expr::{BinaryOp, Expr, UnaryOp, VarRef};
    pub use crate::partial::*;
    pub use crate::rules::{CallDerivative, RuleTable};
    pub use crate::system::EquationSystem;
    pub use crate::types::{NumType, Value};
}

/// Input and output containers
pub mod backends {
    pub mod matrix;
    pub mod vector;
}
/// Parameter lookup by name
pub mod bindings;
/// Conversion from parsed expressions to internal AST
pub mod convert;
/// Gradients, Jacobians, Hessians and Laplacians at a point
pub mod derived;
/// The core differentiator
pub mod diff;
/// High-level equation handling
pub mod equation;
/// Error types for the various failure modes
pub mod errors;
/// Numeric evaluation of expression trees
pub mod eval;
/// Expression tree representation
pub mod expr;
/// Higher-order and named partial derivatives
pub mod partial;
/// Derivative rules for operators and named calls
pub mod rules;
/// System of equations
pub mod system;
/// Numeric types, shapes and evaluation results
pub mod types;
