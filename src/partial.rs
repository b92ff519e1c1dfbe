//! Higher-order and by-name differentiation.

use log::trace;

use crate::bindings::{Binding, Params};
use crate::diff::Differentiator;
use crate::errors::DiffError;
use crate::expr::{Expr, VarRef};

impl Differentiator<'_> {
    /// Differentiates `expr` `n` times with respect to `wrt`.
    ///
    /// Order zero returns a copy of `expr`. Each step differentiates the tree
    /// produced by the previous one, so the size of the result can grow quickly with `n`.
    pub fn differentiate_n(&self, wrt: &VarRef, n: i64, expr: &Expr) -> Result<Expr, DiffError> {
        if n < 0 {
            return Err(DiffError::InvalidOrder(n));
        }
        trace!("order {n} derivative with respect to {}", wrt.name);
        let mut result = expr.clone();
        for _ in 0..n {
            result = self.differentiate(wrt, &result)?;
        }
        Ok(result)
    }

    /// Differentiates a function with respect to the parameter called `name`.
    ///
    /// A name that is not a parameter is not an error: the function is differentiated
    /// against a fresh variable of that name, which normally gives a zero derivative.
    /// Use [`Differentiator::differentiate_by_name_strict`] to reject unknown names.
    pub fn differentiate_by_name(&self, name: &str, expr: &Expr) -> Result<Expr, DiffError> {
        match Params::of(expr).resolve(name) {
            Binding::Bound(var_ref) => self.differentiate(var_ref, expr),
            Binding::Unbound(var_ref) => self.differentiate(&var_ref, expr),
        }
    }

    pub fn differentiate_by_name_strict(&self, name: &str, expr: &Expr) -> Result<Expr, DiffError> {
        let params = Params::of(expr);
        let var_ref = params.lookup(name)?;
        self.differentiate(var_ref, expr)
    }

    /// Takes successive partial derivatives, one per name, in the given order.
    ///
    /// Each name is resolved against the parameters of `expr` with the lenient lookup
    /// of [`Differentiator::differentiate_by_name`].
    pub fn differentiate_wrt<S: AsRef<str>>(
        &self,
        names: &[S],
        expr: &Expr,
    ) -> Result<Expr, DiffError> {
        names.iter().try_fold(expr.clone(), |acc, name| {
            self.differentiate_by_name(name.as_ref(), &acc)
        })
    }
}

/// [`Differentiator::differentiate_n`] with the standard rule table.
pub fn differentiate_n(wrt: &VarRef, n: i64, expr: &Expr) -> Result<Expr, DiffError> {
    Differentiator::default().differentiate_n(wrt, n, expr)
}

/// [`Differentiator::differentiate_by_name`] with the standard rule table.
pub fn differentiate_by_name(name: &str, expr: &Expr) -> Result<Expr, DiffError> {
    Differentiator::default().differentiate_by_name(name, expr)
}

/// [`Differentiator::differentiate_by_name_strict`] with the standard rule table.
pub fn differentiate_by_name_strict(name: &str, expr: &Expr) -> Result<Expr, DiffError> {
    Differentiator::default().differentiate_by_name_strict(name, expr)
}

/// [`Differentiator::differentiate_wrt`] with the standard rule table.
pub fn differentiate_wrt<S: AsRef<str>>(names: &[S], expr: &Expr) -> Result<Expr, DiffError> {
    Differentiator::default().differentiate_wrt(names, expr)
}
