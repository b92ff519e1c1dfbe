//! Expression module for representing mathematical expressions.
//!
//! This module defines the expression tree every other part of the crate works on:
//!
//! - `Expr`: An enum representing the different kinds of nodes
//! - `VarRef`: A named, typed leaf standing for an independent quantity
//! - `UnaryOp` / `BinaryOp`: The closed set of differentiable operators
//! - `Head`: The head of a generic node (aggregates and named calls)
//!
//! The expression tree is built recursively using `Box<Expr>` for nested expressions and can be:
//! - Symbolically differentiated to any order (see [`crate::diff`] and [`crate::partial`])
//! - Evaluated at a point (see [`crate::eval`])
//! - Printed in fully parenthesised infix notation
//!
//! # Expression Tree Structure
//! The expression tree is built recursively with each node being one of:
//! - Leaf nodes: Constants, the identities `Zero` and `One`, and Variables
//! - Unary operations: Neg, Log, Exp, Sin, Cos, Tan, Sqrt, Sinh, Cosh, Tanh, Asin, Acos, Atan
//! - Binary operations: Add, Sub, Mul, Div, Pow, Atan2
//! - Binders: `Lambda(param, body)`, nested to express functions of several arguments
//! - Generic nodes: vector aggregates and named calls resolved through the rule table
//!
//! Trees are immutable values. Every transformation builds a new tree and shared
//! subexpressions are duplicated rather than shared.

use itertools::Itertools;

use crate::types::NumType;

/// Represents a reference to a variable in an expression.
///
/// Two references denote the same variable when their names and declaring
/// scopes coincide (see [`VarRef::same_entity`]).
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub ty: NumType,
    pub scope: u32,
}

impl VarRef {
    /// Creates a floating point variable in the default scope.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: NumType::Float,
            scope: 0,
        }
    }

    pub fn typed(name: impl Into<String>, ty: NumType) -> Self {
        Self {
            name: name.into(),
            ty,
            scope: 0,
        }
    }

    pub fn with_scope(mut self, scope: u32) -> Self {
        self.scope = scope;
        self
    }

    /// Returns true if both references denote the same variable.
    pub fn same_entity(&self, other: &VarRef) -> bool {
        self.scope == other.scope && self.name == other.name
    }
}

/// One-argument operators with a built-in derivative rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    /// Natural logarithm
    Log,
    Exp,
    Sin,
    Cos,
    Tan,
    Sqrt,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 13] = [
        UnaryOp::Neg,
        UnaryOp::Log,
        UnaryOp::Exp,
        UnaryOp::Sin,
        UnaryOp::Cos,
        UnaryOp::Tan,
        UnaryOp::Sqrt,
        UnaryOp::Sinh,
        UnaryOp::Cosh,
        UnaryOp::Tanh,
        UnaryOp::Asin,
        UnaryOp::Acos,
        UnaryOp::Atan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Log => "log",
            UnaryOp::Exp => "exp",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
        }
    }

    /// Looks up a function name as written in source text. `ln` is accepted for `log`.
    pub fn from_name(name: &str) -> Option<UnaryOp> {
        match name {
            "ln" => Some(UnaryOp::Log),
            _ => UnaryOp::ALL
                .into_iter()
                .find(|op| *op != UnaryOp::Neg && op.name() == name),
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Log => x.ln(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Sinh => x.sinh(),
            UnaryOp::Cosh => x.cosh(),
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::Asin => x.asin(),
            UnaryOp::Acos => x.acos(),
            UnaryOp::Atan => x.atan(),
        }
    }
}

/// Two-argument operators with a built-in derivative rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// `atan2(y, x)`, the angle of the point (x, y)
    Atan2,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 6] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
        BinaryOp::Atan2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Pow => "pow",
            BinaryOp::Atan2 => "atan2",
        }
    }

    pub fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            BinaryOp::Pow => l.powf(r),
            BinaryOp::Atan2 => l.atan2(r),
        }
    }
}

/// Head of a generic node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Head {
    /// Aggregate constructor. Evaluates to a vector, or to a matrix when the
    /// children are vectors. Differentiation acts elementwise.
    Vector,
    /// Named application. Its evaluation and derivative come from the rule table.
    Call(String),
}

/// An expression tree node.
///
/// See the module documentation for the meaning of each variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Const(f64, NumType),
    /// The additive identity
    Zero(NumType),
    /// The multiplicative identity
    One(NumType),
    /// A reference to a variable
    Var(VarRef),
    /// Application of a one-argument operator
    Unary(UnaryOp, Box<Expr>),
    /// Application of a two-argument operator
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// A function of one parameter
    Lambda(VarRef, Box<Expr>),
    /// Any other structural form
    Generic(Head, Vec<Expr>),
}

impl Expr {
    pub fn constant(value: f64) -> Expr {
        Expr::Const(value, NumType::Float)
    }

    pub fn int(value: i64) -> Expr {
        Expr::Const(value as f64, NumType::Int)
    }

    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(VarRef::new(name))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn add(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, left, right)
    }

    pub fn sub(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, left, right)
    }

    pub fn div(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, left, right)
    }

    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        Expr::binary(BinaryOp::Pow, base, exponent)
    }

    pub fn atan2(y: Expr, x: Expr) -> Expr {
        Expr::binary(BinaryOp::Atan2, y, x)
    }

    pub fn neg(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Neg, operand)
    }

    pub fn log(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Log, operand)
    }

    pub fn exp(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Exp, operand)
    }

    pub fn sin(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Sin, operand)
    }

    pub fn cos(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Cos, operand)
    }

    pub fn tan(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Tan, operand)
    }

    pub fn sqrt(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Sqrt, operand)
    }

    pub fn sinh(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Sinh, operand)
    }

    pub fn cosh(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Cosh, operand)
    }

    pub fn tanh(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Tanh, operand)
    }

    pub fn asin(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Asin, operand)
    }

    pub fn acos(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Acos, operand)
    }

    pub fn atan(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Atan, operand)
    }

    /// Builds a named call node.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Generic(Head::Call(name.into()), args)
    }

    /// Builds a vector aggregate.
    pub fn vector(elements: Vec<Expr>) -> Expr {
        Expr::Generic(Head::Vector, elements)
    }

    /// Builds the curried function `\p1 -> \p2 -> ... -> body`.
    ///
    /// The first parameter ends up outermost, so arguments are bound left to right.
    pub fn lambda<I>(params: I, body: Expr) -> Expr
    where
        I: IntoIterator<Item = VarRef>,
        I::IntoIter: DoubleEndedIterator,
    {
        params
            .into_iter()
            .rev()
            .fold(body, |body, param| Expr::Lambda(param, Box::new(body)))
    }

    /// Returns the numeric type of the value this node produces.
    pub fn num_type(&self) -> NumType {
        match self {
            Expr::Const(_, ty) | Expr::Zero(ty) | Expr::One(ty) => *ty,
            Expr::Var(var_ref) => var_ref.ty,
            Expr::Unary(UnaryOp::Neg, operand) => operand.num_type(),
            Expr::Unary(_, _) => NumType::Float,
            Expr::Binary(BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul, left, right) => {
                left.num_type().join(right.num_type())
            }
            Expr::Binary(_, _, _) => NumType::Float,
            Expr::Lambda(_, body) => body.num_type(),
            Expr::Generic(_, children) => children
                .iter()
                .map(Expr::num_type)
                .reduce(NumType::join)
                .unwrap_or(NumType::Float),
        }
    }

    /// Returns the outermost curried parameters, outermost first.
    pub fn params(&self) -> Vec<&VarRef> {
        let mut params = Vec::new();
        let mut current = self;
        while let Expr::Lambda(param, body) = current {
            params.push(param);
            current = body;
        }
        params
    }

    /// Returns the expression under the outermost binders.
    pub fn body(&self) -> &Expr {
        match self {
            Expr::Lambda(_, body) => body.body(),
            _ => self,
        }
    }

    /// Returns the number of outermost curried parameters.
    pub fn arity(&self) -> usize {
        match self {
            Expr::Lambda(_, body) => 1 + body.arity(),
            _ => 0,
        }
    }

    /// Returns the variables referenced without an enclosing binder, in order of first use.
    pub fn free_variables(&self) -> Vec<VarRef> {
        let mut bound = Vec::new();
        let mut free = Vec::new();
        self.collect_free(&mut bound, &mut free);
        free
    }

    fn collect_free<'a>(&'a self, bound: &mut Vec<&'a VarRef>, free: &mut Vec<VarRef>) {
        match self {
            Expr::Const(..) | Expr::Zero(_) | Expr::One(_) => {}
            Expr::Var(var_ref) => {
                let is_bound = bound.iter().any(|b| b.same_entity(var_ref));
                let is_known = free.iter().any(|f| f.same_entity(var_ref));
                if !is_bound && !is_known {
                    free.push(var_ref.clone());
                }
            }
            Expr::Unary(_, operand) => operand.collect_free(bound, free),
            Expr::Binary(_, left, right) => {
                left.collect_free(bound, free);
                right.collect_free(bound, free);
            }
            Expr::Lambda(param, body) => {
                bound.push(param);
                body.collect_free(bound, free);
                bound.pop();
            }
            Expr::Generic(_, children) => {
                for child in children {
                    child.collect_free(bound, free);
                }
            }
        }
    }

    /// Returns true if the node is zero by construction, whatever its variables.
    ///
    /// Recognises the identities and zero literals, products with a zero factor,
    /// sums and differences of zeros, and negated zeros.
    pub fn is_structurally_zero(&self) -> bool {
        match self {
            Expr::Zero(_) => true,
            Expr::Const(value, _) => *value == 0.0,
            Expr::Unary(UnaryOp::Neg, operand) => operand.is_structurally_zero(),
            Expr::Binary(BinaryOp::Mul, left, right) => {
                left.is_structurally_zero() || right.is_structurally_zero()
            }
            Expr::Binary(BinaryOp::Add | BinaryOp::Sub, left, right) => {
                left.is_structurally_zero() && right.is_structurally_zero()
            }
            Expr::Generic(Head::Vector, children) => {
                !children.is_empty() && children.iter().all(Expr::is_structurally_zero)
            }
            _ => false,
        }
    }

    /// Counts the nodes of the tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Const(..) | Expr::Zero(_) | Expr::One(_) | Expr::Var(_) => 1,
            Expr::Unary(_, operand) => 1 + operand.size(),
            Expr::Binary(_, left, right) => 1 + left.size() + right.size(),
            Expr::Lambda(_, body) => 1 + body.size(),
            Expr::Generic(_, children) => 1 + children.iter().map(Expr::size).sum::<usize>(),
        }
    }
}

/// Implements string formatting for expressions.
///
/// This implementation converts expressions to their standard mathematical notation:
/// - Constants are formatted as numbers, the identities as `0` and `1`
/// - Variables are formatted as their names
/// - Binary operations (+,-,*,/,^) are wrapped in parentheses
/// - Functions use function call notation
/// - Negation uses - prefix
/// - Binders use `\x -> body`
/// - Vectors use `[a, b]`
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(val, _) => write!(f, "{val}"),
            Expr::Zero(_) => write!(f, "0"),
            Expr::One(_) => write!(f, "1"),
            Expr::Var(var_ref) => write!(f, "{0}", var_ref.name),
            Expr::Unary(UnaryOp::Neg, expr) => write!(f, "-({expr})"),
            Expr::Unary(op, expr) => write!(f, "{}({expr})", op.name()),
            Expr::Binary(BinaryOp::Add, left, right) => write!(f, "({left} + {right})"),
            Expr::Binary(BinaryOp::Sub, left, right) => write!(f, "({left} - {right})"),
            Expr::Binary(BinaryOp::Mul, left, right) => write!(f, "({left} * {right})"),
            Expr::Binary(BinaryOp::Div, left, right) => write!(f, "({left} / {right})"),
            Expr::Binary(BinaryOp::Pow, base, exponent) => write!(f, "({base}^{exponent})"),
            Expr::Binary(BinaryOp::Atan2, y, x) => write!(f, "atan2({y}, {x})"),
            Expr::Lambda(param, body) => write!(f, "\\{} -> {body}", param.name),
            Expr::Generic(Head::Vector, children) => {
                write!(f, "[{}]", children.iter().join(", "))
            }
            Expr::Generic(Head::Call(name), children) => {
                write!(f, "{name}({})", children.iter().join(", "))
            }
        }
    }
}
