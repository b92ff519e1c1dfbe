//! Derivative-based numerical operations on curried functions.
//!
//! Every operation differentiates symbolically first and evaluates afterwards, so the
//! results are exact up to floating point rounding. Partials are taken with respect to
//! the function's parameters in declaration order.
//!
//! The `_with_value` variants also return the value of the function at the point.

use crate::bindings::Params;
use crate::diff::Differentiator;
use crate::errors::{EquationError, EvalError};
use crate::eval::Evaluator;
use crate::expr::{Expr, VarRef};
use crate::rules::RuleTable;

/// Derived operations over one rule table.
#[derive(Debug, Clone, Copy)]
pub struct Calculus<'t> {
    differentiator: Differentiator<'t>,
    evaluator: Evaluator<'t>,
}

impl Default for Calculus<'static> {
    fn default() -> Self {
        Self {
            differentiator: Differentiator::default(),
            evaluator: Evaluator::default(),
        }
    }
}

impl<'t> Calculus<'t> {
    pub fn new(rules: &'t RuleTable) -> Self {
        Self {
            differentiator: Differentiator::new(rules),
            evaluator: Evaluator::new(rules),
        }
    }

    fn scalar(&self, f: &Expr, x: &[f64]) -> Result<f64, EquationError> {
        Ok(self.evaluator.evaluate(f, x)?.into_scalar()?)
    }

    fn sole_param<'f>(&self, f: &'f Expr) -> Result<&'f VarRef, EquationError> {
        match f.params().as_slice() {
            [param] => Ok(*param),
            params => Err(EvalError::ArityMismatch {
                expected: params.len(),
                got: 1,
            }
            .into()),
        }
    }

    /// Fails unless `x` holds one value per parameter of `f`, as evaluation would.
    fn check_point(&self, f: &Expr, x: &[f64]) -> Result<(), EquationError> {
        if x.len() != f.arity() {
            return Err(EvalError::ArityMismatch {
                expected: f.arity(),
                got: x.len(),
            }
            .into());
        }
        Ok(())
    }

    /// First derivative of a one-parameter function at `x`.
    pub fn diff(&self, f: &Expr, x: f64) -> Result<f64, EquationError> {
        self.diffn(1, f, x)
    }

    /// Returns `(f(x), f'(x))`.
    pub fn diff_with_value(&self, f: &Expr, x: f64) -> Result<(f64, f64), EquationError> {
        self.diffn_with_value(1, f, x)
    }

    /// `n`-th derivative of a one-parameter function at `x`.
    pub fn diffn(&self, n: i64, f: &Expr, x: f64) -> Result<f64, EquationError> {
        let param = self.sole_param(f)?;
        let derivative = self.differentiator.differentiate_n(param, n, f)?;
        self.scalar(&derivative, &[x])
    }

    pub fn diffn_with_value(&self, n: i64, f: &Expr, x: f64) -> Result<(f64, f64), EquationError> {
        let derivative = self.diffn(n, f, x)?;
        Ok((self.scalar(f, &[x])?, derivative))
    }

    /// Gradient of a scalar function at `x`, one entry per parameter.
    pub fn grad(&self, f: &Expr, x: &[f64]) -> Result<Vec<f64>, EquationError> {
        self.check_point(f, x)?;
        Params::of(f)
            .iter()
            .map(|param| -> Result<f64, EquationError> {
                let partial = self.differentiator.differentiate(param, f)?;
                self.scalar(&partial, x)
            })
            .collect()
    }

    pub fn grad_with_value(&self, f: &Expr, x: &[f64]) -> Result<(f64, Vec<f64>), EquationError> {
        let gradient = self.grad(f, x)?;
        Ok((self.scalar(f, x)?, gradient))
    }

    /// Transposed Jacobian of a vector-valued function: row `i` holds the
    /// derivatives of every output with respect to parameter `i`.
    pub fn jacobian_t(&self, f: &Expr, x: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
        self.check_point(f, x)?;
        Params::of(f)
            .iter()
            .map(|param| -> Result<Vec<f64>, EquationError> {
                let partial = self.differentiator.differentiate(param, f)?;
                Ok(self.evaluator.evaluate(&partial, x)?.into_vector()?)
            })
            .collect()
    }

    /// Jacobian of a vector-valued function: one row per output.
    pub fn jacobian(&self, f: &Expr, x: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
        Ok(transpose(&self.jacobian_t(f, x)?))
    }

    /// Sum of the unmixed second partials at `x`.
    pub fn laplacian(&self, f: &Expr, x: &[f64]) -> Result<f64, EquationError> {
        self.check_point(f, x)?;
        Params::of(f).iter().try_fold(0.0, |sum, param| -> Result<f64, EquationError> {
            let second = self.differentiator.differentiate_n(param, 2, f)?;
            Ok(sum + self.scalar(&second, x)?)
        })
    }

    /// Hessian at `x`. Only the upper triangle is computed; the lower one is its mirror.
    pub fn hessian(&self, f: &Expr, x: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
        self.check_point(f, x)?;
        let params: Vec<&VarRef> = Params::of(f).iter().collect();
        let n = params.len();
        let mut hessian = vec![vec![0.0; n]; n];
        for (i, pi) in params.iter().enumerate() {
            let partial = self.differentiator.differentiate(pi, f)?;
            for (j, pj) in params.iter().enumerate().skip(i) {
                let second = self.differentiator.differentiate(pj, &partial)?;
                let value = self.scalar(&second, x)?;
                hessian[i][j] = value;
                hessian[j][i] = value;
            }
        }
        Ok(hessian)
    }

    pub fn gradhessian(
        &self,
        f: &Expr,
        x: &[f64],
    ) -> Result<(Vec<f64>, Vec<Vec<f64>>), EquationError> {
        Ok((self.grad(f, x)?, self.hessian(f, x)?))
    }

    #[allow(clippy::type_complexity)]
    pub fn gradhessian_with_value(
        &self,
        f: &Expr,
        x: &[f64],
    ) -> Result<(f64, Vec<f64>, Vec<Vec<f64>>), EquationError> {
        let (gradient, hessian) = self.gradhessian(f, x)?;
        Ok((self.scalar(f, x)?, gradient, hessian))
    }
}

/// Transposes a row-major matrix.
pub(crate) fn transpose(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    (0..width)
        .map(|col| rows.iter().map(|row| row[col]).collect())
        .collect()
}

pub fn diff(f: &Expr, x: f64) -> Result<f64, EquationError> {
    Calculus::default().diff(f, x)
}

pub fn diff_with_value(f: &Expr, x: f64) -> Result<(f64, f64), EquationError> {
    Calculus::default().diff_with_value(f, x)
}

pub fn diffn(n: i64, f: &Expr, x: f64) -> Result<f64, EquationError> {
    Calculus::default().diffn(n, f, x)
}

pub fn diffn_with_value(n: i64, f: &Expr, x: f64) -> Result<(f64, f64), EquationError> {
    Calculus::default().diffn_with_value(n, f, x)
}

pub fn grad(f: &Expr, x: &[f64]) -> Result<Vec<f64>, EquationError> {
    Calculus::default().grad(f, x)
}

pub fn grad_with_value(f: &Expr, x: &[f64]) -> Result<(f64, Vec<f64>), EquationError> {
    Calculus::default().grad_with_value(f, x)
}

pub fn jacobian_t(f: &Expr, x: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
    Calculus::default().jacobian_t(f, x)
}

pub fn jacobian(f: &Expr, x: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
    Calculus::default().jacobian(f, x)
}

pub fn laplacian(f: &Expr, x: &[f64]) -> Result<f64, EquationError> {
    Calculus::default().laplacian(f, x)
}

pub fn hessian(f: &Expr, x: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
    Calculus::default().hessian(f, x)
}

pub fn gradhessian(f: &Expr, x: &[f64]) -> Result<(Vec<f64>, Vec<Vec<f64>>), EquationError> {
    Calculus::default().gradhessian(f, x)
}

#[allow(clippy::type_complexity)]
pub fn gradhessian_with_value(
    f: &Expr,
    x: &[f64],
) -> Result<(f64, Vec<f64>, Vec<Vec<f64>>), EquationError> {
    Calculus::default().gradhessian_with_value(f, x)
}
