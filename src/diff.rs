//! Differentiation engine.
//!
//! Walks an expression tree once and builds the derivative tree with respect to a
//! single variable. Operators are handled by the chain rule: the operands are
//! differentiated first and the operator's rule from [`crate::rules`] combines them.
//! Named calls are looked up in a [`RuleTable`].
//!
//! The output is not simplified. `d/dx (x * y)` is `((1 * y) + (x * 0))`, which
//! evaluates correctly but keeps every term the rules produce.

use log::trace;

use crate::errors::DiffError;
use crate::expr::{Expr, Head, VarRef};
use crate::rules::{standard, CallDerivative, RuleTable};

/// Differentiates expression trees against a rule table.
#[derive(Debug, Clone, Copy)]
pub struct Differentiator<'t> {
    rules: &'t RuleTable,
}

impl Default for Differentiator<'static> {
    fn default() -> Self {
        Self::new(standard())
    }
}

impl<'t> Differentiator<'t> {
    pub fn new(rules: &'t RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'t RuleTable {
        self.rules
    }

    /// Returns the derivative of `expr` with respect to `wrt`.
    ///
    /// Binders are kept: differentiating `\x -> body` gives `\x -> body'`, so the
    /// result of differentiating a function is again a function of the same parameters.
    ///
    /// # Errors
    /// [`DiffError::UnsupportedConstruct`] when the tree contains a call that is not
    /// registered, is registered as not differentiable, or is applied to the wrong
    /// number of arguments.
    pub fn differentiate(&self, wrt: &VarRef, expr: &Expr) -> Result<Expr, DiffError> {
        trace!("differentiating {} nodes with respect to {}", expr.size(), wrt.name);
        self.derive(wrt, expr)
    }

    fn derive(&self, wrt: &VarRef, expr: &Expr) -> Result<Expr, DiffError> {
        match expr {
            Expr::Const(_, ty) | Expr::Zero(ty) | Expr::One(ty) => Ok(Expr::Zero(*ty)),
            Expr::Generic(Head::Call(_), args) if args.is_empty() => {
                Ok(Expr::Zero(expr.num_type()))
            }
            Expr::Unary(op, operand) => {
                let d_operand = self.derive(wrt, operand)?;
                Ok(op.rule()(operand, d_operand))
            }
            Expr::Binary(op, left, right) => {
                let d_left = self.derive(wrt, left)?;
                let d_right = self.derive(wrt, right)?;
                Ok(op.rule()(left, right, d_left, d_right))
            }
            Expr::Var(var_ref) if var_ref.same_entity(wrt) => Ok(Expr::One(var_ref.ty)),
            Expr::Var(var_ref) => Ok(Expr::Zero(var_ref.ty)),
            Expr::Lambda(param, body) => Ok(Expr::Lambda(
                param.clone(),
                Box::new(self.derive(wrt, body)?),
            )),
            Expr::Generic(Head::Vector, children) => {
                Ok(Expr::vector(self.derive_all(wrt, children)?))
            }
            Expr::Generic(Head::Call(name), args) => self.derive_call(wrt, name, args),
        }
    }

    fn derive_all(&self, wrt: &VarRef, exprs: &[Expr]) -> Result<Vec<Expr>, DiffError> {
        exprs.iter().map(|e| self.derive(wrt, e)).collect()
    }

    fn derive_call(&self, wrt: &VarRef, name: &str, args: &[Expr]) -> Result<Expr, DiffError> {
        let def = self
            .rules
            .get(name)
            .ok_or_else(|| DiffError::UnsupportedConstruct(name.to_string()))?;
        if def.arity != args.len() {
            return Err(DiffError::UnsupportedConstruct(format!(
                "{name} applied to {} arguments, expected {}",
                args.len(),
                def.arity
            )));
        }
        match def.derivative {
            CallDerivative::Rule(rule) => Ok(rule(args, &self.derive_all(wrt, args)?)),
            CallDerivative::Linear => Ok(Expr::call(name, self.derive_all(wrt, args)?)),
            CallDerivative::NotDifferentiable => {
                Err(DiffError::UnsupportedConstruct(name.to_string()))
            }
        }
    }
}

/// Differentiates `expr` with respect to `wrt` using the standard rule table.
pub fn differentiate(wrt: &VarRef, expr: &Expr) -> Result<Expr, DiffError> {
    Differentiator::default().differentiate(wrt, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{evaluate, Evaluator};
    use crate::types::NumType;
    use approx::assert_relative_eq;

    fn x() -> VarRef {
        VarRef::new("x")
    }

    fn var(name: &str) -> Expr {
        Expr::var(name)
    }

    fn eval_at(f: &Expr, at: f64) -> f64 {
        evaluate(f, &[at]).unwrap().into_scalar().unwrap()
    }

    /// Checks d/dx body at each point against the closed form and a central difference.
    fn check(body: Expr, points: &[f64], expected: impl Fn(f64) -> f64) {
        let f = Expr::lambda([x()], body);
        let df = differentiate(&x(), &f).unwrap();
        let h = 1e-6;
        for &at in points {
            let derivative = eval_at(&df, at);
            assert_relative_eq!(derivative, expected(at), epsilon = 1e-12, max_relative = 1e-10);

            let central = (eval_at(&f, at + h) - eval_at(&f, at - h)) / (2.0 * h);
            assert_relative_eq!(derivative, central, epsilon = 1e-6, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_leaves() {
        assert_eq!(
            differentiate(&x(), &Expr::int(5)).unwrap(),
            Expr::Zero(NumType::Int)
        );
        assert_eq!(
            differentiate(&x(), &Expr::One(NumType::Float)).unwrap(),
            Expr::Zero(NumType::Float)
        );
        assert_eq!(
            differentiate(&x(), &var("x")).unwrap(),
            Expr::One(NumType::Float)
        );
        assert_eq!(
            differentiate(&x(), &var("y")).unwrap(),
            Expr::Zero(NumType::Float)
        );

        // Same name in another scope is not the target
        let other = Expr::Var(VarRef::new("x").with_scope(3));
        assert_eq!(
            differentiate(&x(), &other).unwrap(),
            Expr::Zero(NumType::Float)
        );
    }

    #[test]
    fn test_binder_is_kept() {
        let f = Expr::lambda([x()], Expr::sin(var("x")));
        let df = differentiate(&x(), &f).unwrap();
        assert_eq!(df.arity(), 1);
        assert_eq!(format!("{df}"), "\\x -> (1 * cos(x))");
    }

    #[test]
    fn test_product_is_not_simplified() {
        let product = Expr::mul(var("x"), var("y"));
        let d = differentiate(&x(), &product).unwrap();
        assert_eq!(format!("{d}"), "((1 * y) + (x * 0))");
    }

    #[test]
    fn test_binary_operators() {
        let x = || var("x");
        let any = [-1.3, 0.2, 0.7, 2.5];
        let positive = [0.4, 1.3, 2.0, 3.5];

        check(Expr::add(x(), Expr::sin(x())), &any, |t| 1.0 + t.cos());
        check(Expr::sub(Expr::int(3), Expr::mul(x(), x())), &any, |t| -2.0 * t);
        check(Expr::mul(x(), Expr::exp(x())), &any, |t| (1.0 + t) * t.exp());
        check(Expr::div(Expr::int(1), x()), &[-2.0, 0.5, 2.0], |t| -1.0 / (t * t));
        check(Expr::pow(x(), Expr::int(3)), &any, |t| 3.0 * t * t);
        check(Expr::pow(Expr::constant(2.0), x()), &any, |t| {
            2f64.powf(t) * 2f64.ln()
        });
        check(Expr::pow(x(), x()), &positive, |t| t.powf(t) * (t.ln() + 1.0));
        check(Expr::atan2(x(), Expr::constant(2.0)), &any, |t| {
            2.0 / (t * t + 4.0)
        });
        check(Expr::atan2(Expr::constant(1.0), x()), &any, |t| {
            -1.0 / (1.0 + t * t)
        });
    }

    #[test]
    fn test_unary_operators() {
        let x = || var("x");
        let any = [-1.1, 0.3, 0.6, 1.9];
        let positive = [0.3, 1.0, 2.5, 4.0];
        let unit = [-0.5, 0.1, 0.7];

        check(Expr::neg(x()), &any, |_| -1.0);
        check(Expr::log(x()), &positive, |t| 1.0 / t);
        check(Expr::exp(x()), &any, f64::exp);
        check(Expr::sin(x()), &any, f64::cos);
        check(Expr::cos(x()), &any, |t| -t.sin());
        check(Expr::tan(x()), &[-1.0, 0.1, 0.4, 1.2], |t| 1.0 / (t.cos() * t.cos()));
        check(Expr::sqrt(x()), &positive, |t| 0.5 / t.sqrt());
        check(Expr::sinh(x()), &any, f64::cosh);
        check(Expr::cosh(x()), &any, f64::sinh);
        check(Expr::tanh(x()), &any, |t| 1.0 / (t.cosh() * t.cosh()));
        check(Expr::asin(x()), &unit, |t| 1.0 / (1.0 - t * t).sqrt());
        check(Expr::acos(x()), &unit, |t| -1.0 / (1.0 - t * t).sqrt());
        check(Expr::atan(x()), &any, |t| 1.0 / (1.0 + t * t));
    }

    #[test]
    fn test_chain_rule() {
        // d/dx sin(x^2) = 2x cos(x^2)
        let body = Expr::sin(Expr::pow(var("x"), Expr::int(2)));
        check(body, &[-0.9, 0.5, 1.2], |t| 2.0 * t * (t * t).cos());

        // d/dx exp(sin(x)) * log(x)
        let body = Expr::mul(Expr::exp(Expr::sin(var("x"))), Expr::log(var("x")));
        check(body, &[0.4, 0.8, 2.2], |t| {
            t.cos() * t.sin().exp() * t.ln() + t.sin().exp() / t
        });
    }

    #[test]
    fn test_power_with_negative_base() {
        let f = Expr::lambda([x()], Expr::pow(var("x"), Expr::int(3)));
        let df = differentiate(&x(), &f).unwrap();
        let value = eval_at(&df, -2.0);
        assert!(value.is_finite());
        assert_relative_eq!(value, 12.0);
    }

    #[test]
    fn test_standard_calls() {
        let x = || var("x");
        check(Expr::call("abs", vec![x()]), &[-1.5, -0.2, 0.8], f64::signum);
        check(Expr::call("cbrt", vec![x()]), &[-8.0, 1.0, 8.0], |t| {
            1.0 / (3.0 * t.cbrt() * t.cbrt())
        });
        check(
            Expr::call("hypot", vec![x(), Expr::constant(4.0)]),
            &[-2.0, 0.5, 3.0],
            |t| t / t.hypot(4.0),
        );

        let d = differentiate(&VarRef::new("x"), &Expr::call("sign", vec![x()])).unwrap();
        assert!(d.is_structurally_zero());
    }

    #[test]
    fn test_vector_is_elementwise() {
        let v = Expr::vector(vec![Expr::mul(var("x"), var("y")), Expr::sin(var("x"))]);
        let dv = differentiate(&x(), &v).unwrap();
        match &dv {
            Expr::Generic(Head::Vector, children) => assert_eq!(children.len(), 2),
            other => panic!("expected a vector, got {other}"),
        }

        let f = Expr::lambda([x(), VarRef::new("y")], dv);
        let values = evaluate(&f, &[0.0, 3.0]).unwrap().into_vector().unwrap();
        assert_eq!(values, vec![3.0, 1.0]);
    }

    #[test]
    fn test_nullary_call_is_constant() {
        let d = differentiate(&x(), &Expr::call("pi", vec![])).unwrap();
        assert_eq!(d, Expr::Zero(NumType::Float));
    }

    #[test]
    fn test_unknown_call_is_rejected() {
        let expr = Expr::call("gamma", vec![var("x")]);
        assert_eq!(
            differentiate(&x(), &expr),
            Err(DiffError::UnsupportedConstruct("gamma".to_string()))
        );

        // Unknown calls are rejected even where they do not depend on the target
        let nested = Expr::add(var("x"), Expr::call("gamma", vec![var("y")]));
        assert!(differentiate(&x(), &nested).is_err());
    }

    #[test]
    fn test_call_arity_is_checked() {
        let expr = Expr::call("hypot", vec![var("x")]);
        assert!(matches!(
            differentiate(&x(), &expr),
            Err(DiffError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_registered_calls() -> Result<(), Box<dyn std::error::Error>> {
        fn square(args: &[Expr], primes: &[Expr]) -> Expr {
            Expr::mul(
                Expr::mul(Expr::constant(2.0), args[0].clone()),
                primes[0].clone(),
            )
        }

        let table = RuleTable::builder()
            .call("sum2", 2, |a| a[0] + a[1], CallDerivative::Linear)
            .call("sq", 1, |a| a[0] * a[0], CallDerivative::Rule(square))
            .call("floor", 1, |a| a[0].floor(), CallDerivative::NotDifferentiable)
            .build();
        let differentiator = Differentiator::new(&table);
        let evaluator = Evaluator::new(&table);

        let f = Expr::lambda(
            [x()],
            Expr::call(
                "sum2",
                vec![Expr::call("sq", vec![var("x")]), Expr::sin(var("x"))],
            ),
        );
        let df = differentiator.differentiate(&x(), &f)?;
        assert!(matches!(df.body(), Expr::Generic(Head::Call(name), _) if name == "sum2"));

        let value = evaluator.evaluate(&df, &[0.5])?.into_scalar()?;
        assert_relative_eq!(value, 1.0 + 0.5f64.cos());

        let floor = Expr::call("floor", vec![var("x")]);
        assert!(differentiator.differentiate(&x(), &floor).is_err());
        Ok(())
    }

    #[test]
    fn test_input_is_untouched() {
        let f = Expr::lambda([x()], Expr::mul(var("x"), Expr::cos(var("x"))));
        let before = f.clone();
        let _ = differentiate(&x(), &f).unwrap();
        assert_eq!(f, before);
    }
}
