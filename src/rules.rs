//! Operator rule table.
//!
//! Every operator of the closed set ([`UnaryOp`], [`BinaryOp`]) owns a derivative rule,
//! resolved by `match` at compile time. A rule receives the original operands and their
//! already-computed derivatives and returns the derivative tree:
//!
//! | Operator     | d/dx                                  |
//! |--------------|---------------------------------------|
//! | f + g        | f' + g'                               |
//! | f - g        | f' - g'                               |
//! | f * g        | f' * g + f * g'                       |
//! | f / g        | (f' * g - f * g') / (g * g)           |
//! | f ^ g        | f^(g - 1) * (g * f' + f * log(f) * g')|
//! | atan2(f, g)  | (g * f' - f * g') / (f * f + g * g)   |
//! | -f           | -f'                                   |
//! | log(f)       | f' / f                                |
//! | exp(f)       | f' * exp(f)                           |
//! | sin(f)       | f' * cos(f)                           |
//! | cos(f)       | -f' * sin(f)                          |
//! | tan(f)       | f' / (cos(f) * cos(f))                |
//! | sqrt(f)      | f' / (2 * sqrt(f))                    |
//! | sinh(f)      | f' * cosh(f)                          |
//! | cosh(f)      | f' * sinh(f)                          |
//! | tanh(f)      | f' / (cosh(f) * cosh(f))              |
//! | asin(f)      | f' / sqrt(1 - f * f)                  |
//! | acos(f)      | -f' / sqrt(1 - f * f)                 |
//! | atan(f)      | f' / (1 + f * f)                      |
//!
//! Named calls (`Generic(Head::Call(name), args)`) are resolved through a [`RuleTable`],
//! an immutable map from call name to a [`CallDef`]. A call either has its own rule, is
//! declared linear in its arguments (and is differentiated argument by argument), or is
//! not differentiable at all. The process-wide [`standard`] table registers `abs`, `sign`,
//! `cbrt` and `hypot`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::types::NumType;

/// Derivative rule of a one-argument operator: `(f, f') -> d/dx op(f)`.
pub type UnaryRule = fn(&Expr, Expr) -> Expr;

/// Derivative rule of a two-argument operator: `(f, g, f', g') -> d/dx op(f, g)`.
pub type BinaryRule = fn(&Expr, &Expr, Expr, Expr) -> Expr;

/// Derivative rule of a named call: `(args, primes) -> d/dx call(args)`.
pub type CallRule = fn(&[Expr], &[Expr]) -> Expr;

/// Numeric evaluation of a named call.
pub type CallEval = fn(&[f64]) -> f64;

impl UnaryOp {
    pub fn rule(self) -> UnaryRule {
        match self {
            UnaryOp::Neg => neg_rule,
            UnaryOp::Log => log_rule,
            UnaryOp::Exp => exp_rule,
            UnaryOp::Sin => sin_rule,
            UnaryOp::Cos => cos_rule,
            UnaryOp::Tan => tan_rule,
            UnaryOp::Sqrt => sqrt_rule,
            UnaryOp::Sinh => sinh_rule,
            UnaryOp::Cosh => cosh_rule,
            UnaryOp::Tanh => tanh_rule,
            UnaryOp::Asin => asin_rule,
            UnaryOp::Acos => acos_rule,
            UnaryOp::Atan => atan_rule,
        }
    }
}

impl BinaryOp {
    pub fn rule(self) -> BinaryRule {
        match self {
            BinaryOp::Add => add_rule,
            BinaryOp::Sub => sub_rule,
            BinaryOp::Mul => mul_rule,
            BinaryOp::Div => div_rule,
            BinaryOp::Pow => pow_rule,
            BinaryOp::Atan2 => atan2_rule,
        }
    }
}

fn add_rule(_f: &Expr, _g: &Expr, df: Expr, dg: Expr) -> Expr {
    Expr::add(df, dg)
}

fn sub_rule(_f: &Expr, _g: &Expr, df: Expr, dg: Expr) -> Expr {
    Expr::sub(df, dg)
}

fn mul_rule(f: &Expr, g: &Expr, df: Expr, dg: Expr) -> Expr {
    Expr::add(Expr::mul(df, g.clone()), Expr::mul(f.clone(), dg))
}

fn div_rule(f: &Expr, g: &Expr, df: Expr, dg: Expr) -> Expr {
    Expr::div(
        Expr::sub(Expr::mul(df, g.clone()), Expr::mul(f.clone(), dg)),
        Expr::mul(g.clone(), g.clone()),
    )
}

fn pow_rule(f: &Expr, g: &Expr, df: Expr, dg: Expr) -> Expr {
    let lowered = Expr::pow(f.clone(), Expr::sub(g.clone(), Expr::One(g.num_type())));
    let base_term = Expr::mul(g.clone(), df);
    // A constant exponent drops the log term, which is NaN for negative bases.
    if dg.is_structurally_zero() {
        return Expr::mul(lowered, base_term);
    }
    let exponent_term = Expr::mul(Expr::mul(f.clone(), Expr::log(f.clone())), dg);
    Expr::mul(lowered, Expr::add(base_term, exponent_term))
}

fn atan2_rule(f: &Expr, g: &Expr, df: Expr, dg: Expr) -> Expr {
    Expr::div(
        Expr::sub(Expr::mul(g.clone(), df), Expr::mul(f.clone(), dg)),
        Expr::add(
            Expr::mul(f.clone(), f.clone()),
            Expr::mul(g.clone(), g.clone()),
        ),
    )
}

fn neg_rule(_f: &Expr, df: Expr) -> Expr {
    Expr::neg(df)
}

fn log_rule(f: &Expr, df: Expr) -> Expr {
    Expr::div(df, f.clone())
}

fn exp_rule(f: &Expr, df: Expr) -> Expr {
    Expr::mul(df, Expr::exp(f.clone()))
}

fn sin_rule(f: &Expr, df: Expr) -> Expr {
    Expr::mul(df, Expr::cos(f.clone()))
}

fn cos_rule(f: &Expr, df: Expr) -> Expr {
    Expr::mul(Expr::neg(df), Expr::sin(f.clone()))
}

fn tan_rule(f: &Expr, df: Expr) -> Expr {
    Expr::div(df, Expr::mul(Expr::cos(f.clone()), Expr::cos(f.clone())))
}

fn sqrt_rule(f: &Expr, df: Expr) -> Expr {
    let two = Expr::Const(2.0, f.num_type());
    Expr::div(df, Expr::mul(two, Expr::sqrt(f.clone())))
}

fn sinh_rule(f: &Expr, df: Expr) -> Expr {
    Expr::mul(df, Expr::cosh(f.clone()))
}

fn cosh_rule(f: &Expr, df: Expr) -> Expr {
    Expr::mul(df, Expr::sinh(f.clone()))
}

fn tanh_rule(f: &Expr, df: Expr) -> Expr {
    Expr::div(df, Expr::mul(Expr::cosh(f.clone()), Expr::cosh(f.clone())))
}

fn one_minus_square(f: &Expr) -> Expr {
    Expr::sub(Expr::One(f.num_type()), Expr::mul(f.clone(), f.clone()))
}

fn asin_rule(f: &Expr, df: Expr) -> Expr {
    Expr::div(df, Expr::sqrt(one_minus_square(f)))
}

fn acos_rule(f: &Expr, df: Expr) -> Expr {
    Expr::div(Expr::neg(df), Expr::sqrt(one_minus_square(f)))
}

fn atan_rule(f: &Expr, df: Expr) -> Expr {
    Expr::div(
        df,
        Expr::add(Expr::One(f.num_type()), Expr::mul(f.clone(), f.clone())),
    )
}

/// How a named call is differentiated.
#[derive(Debug, Clone, Copy)]
pub enum CallDerivative {
    /// A dedicated rule built from the arguments and their derivatives
    Rule(CallRule),
    /// The call is linear in its arguments: differentiate each argument and keep the call
    Linear,
    /// The call can be evaluated but has no derivative
    NotDifferentiable,
}

/// Definition of a named call.
#[derive(Debug, Clone)]
pub struct CallDef {
    pub name: String,
    pub arity: usize,
    pub eval: CallEval,
    pub derivative: CallDerivative,
}

/// Immutable map from call names to their definitions.
///
/// Tables are assembled once with [`RuleTable::builder`] and never change afterwards,
/// so a table can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    calls: HashMap<String, CallDef>,
}

impl RuleTable {
    /// Starts a table pre-populated with the standard calls.
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default().with_standard_calls()
    }

    /// A table that knows no calls at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&CallDef> {
        self.calls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.calls.contains_key(name)
    }

    /// Returns the registered call names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.calls.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Builder for [`RuleTable`].
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    calls: HashMap<String, CallDef>,
}

impl RuleTableBuilder {
    /// Registers (or replaces) a call definition.
    pub fn register(mut self, def: CallDef) -> Self {
        self.calls.insert(def.name.clone(), def);
        self
    }

    pub fn call(
        self,
        name: impl Into<String>,
        arity: usize,
        eval: CallEval,
        derivative: CallDerivative,
    ) -> Self {
        self.register(CallDef {
            name: name.into(),
            arity,
            eval,
            derivative,
        })
    }

    pub fn with_standard_calls(self) -> Self {
        self.call("abs", 1, |a| a[0].abs(), CallDerivative::Rule(abs_rule))
            .call("sign", 1, sign_eval, CallDerivative::Rule(sign_rule))
            .call("cbrt", 1, |a| a[0].cbrt(), CallDerivative::Rule(cbrt_rule))
            .call(
                "hypot",
                2,
                |a| a[0].hypot(a[1]),
                CallDerivative::Rule(hypot_rule),
            )
    }

    pub fn build(self) -> RuleTable {
        RuleTable { calls: self.calls }
    }
}

fn sign_eval(args: &[f64]) -> f64 {
    if args[0] == 0.0 {
        0.0
    } else {
        args[0].signum()
    }
}

// d/dx |f| = f' * f / |f|
fn abs_rule(args: &[Expr], primes: &[Expr]) -> Expr {
    let f = &args[0];
    Expr::mul(
        primes[0].clone(),
        Expr::div(f.clone(), Expr::call("abs", vec![f.clone()])),
    )
}

fn sign_rule(args: &[Expr], _primes: &[Expr]) -> Expr {
    Expr::Zero(args[0].num_type())
}

// d/dx cbrt(f) = f' / (3 * cbrt(f) * cbrt(f))
fn cbrt_rule(args: &[Expr], primes: &[Expr]) -> Expr {
    let cbrt = Expr::call("cbrt", vec![args[0].clone()]);
    Expr::div(
        primes[0].clone(),
        Expr::mul(
            Expr::mul(Expr::Const(3.0, NumType::Float), cbrt.clone()),
            cbrt,
        ),
    )
}

// d/dx hypot(f, g) = (f * f' + g * g') / hypot(f, g)
fn hypot_rule(args: &[Expr], primes: &[Expr]) -> Expr {
    let (f, g) = (&args[0], &args[1]);
    Expr::div(
        Expr::add(
            Expr::mul(f.clone(), primes[0].clone()),
            Expr::mul(g.clone(), primes[1].clone()),
        ),
        Expr::call("hypot", vec![f.clone(), g.clone()]),
    )
}

static STANDARD: Lazy<RuleTable> = Lazy::new(|| RuleTable::builder().build());

/// The process-wide default table, initialised on first use.
pub fn standard() -> &'static RuleTable {
    &STANDARD
}
