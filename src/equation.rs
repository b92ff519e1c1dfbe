//! Mathematical equation evaluation and symbolic differentiation.
//!
//! This module provides the core `Equation` type which represents a mathematical expression
//! parsed from a string. The expression is held as a curried function of its variables,
//! and its first order partial derivatives are built once on creation.
//!
//! # Features
//!
//! - Exact symbolic derivatives of any order
//! - Gradient, Hessian and Laplacian at a point
//! - Support for multiple variables with flexible ordering
//! - Inputs from `Vec`, slices, arrays, and optionally `ndarray` / `nalgebra`
//!
//! # Example
//!
//! ```
//! use evalexpr_symdiff::Equation;
//!
//! let eq = Equation::new("2*x + y^2".to_string()).unwrap();
//! let result = eq.eval(&[1.0, 2.0]).unwrap(); // Evaluates to 6.0
//! let gradient = eq.gradient(&[1.0, 2.0]).unwrap(); // Computes [2.0, 4.0]
//! let hessian = eq.hessian(&[1.0, 2.0]).unwrap(); // Computes [[0.0, 0.0], [0.0, 2.0]]
//! ```
//!
//! # Variable Handling
//!
//! Variables can be specified either:
//! - Automatically extracted and sorted alphabetically using `new()`
//! - Explicitly ordered using `from_params()`
//!
//! Input arrays must match the variable ordering.

use std::collections::{BTreeSet, HashMap};

use colored::Colorize;
use evalexpr::{build_operator_tree, Node, Operator};
use itertools::Itertools;
use log::debug;

use crate::backends::matrix::Matrix;
use crate::backends::vector::Vector;
use crate::bindings::Params;
use crate::convert::build_ast;
use crate::derived::Calculus;
use crate::diff::Differentiator;
use crate::errors::EquationError;
use crate::eval::evaluate;
use crate::expr::{Expr, VarRef};
use crate::EquationSystem;

/// Represents a mathematical equation that can be evaluated and differentiated.
///
/// This struct holds the original equation string together with:
/// - The curried function `\x1 -> ... -> \xn -> body` built from it
/// - The first order partial derivative trees, one per variable
/// - The variable names and their positions in input arrays
#[derive(Clone)]
pub struct Equation {
    equation_str: String,
    function: Expr,
    derivatives_first_order: HashMap<String, Expr>,
    var_map: HashMap<String, u32>,
    sorted_variables: Vec<String>,
}

impl std::fmt::Debug for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{{\n")?;
        writeln!(f, "    {}: {}\n", "Equation".cyan(), self.equation_str)?;
        writeln!(f, "    {}: {}\n", "Function".cyan(), self.function)?;
        for variable in &self.sorted_variables {
            if let Some(derivative) = self.derivatives_first_order.get(variable) {
                writeln!(
                    f,
                    "    {}: {}\n",
                    format!("d/d{variable}").cyan(),
                    derivative.body()
                )?;
            }
        }
        writeln!(f, "}}")?;
        Ok(())
    }
}

impl std::fmt::Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{{\n")?;
        writeln!(f, "    {}: {}\n", "Equation".cyan(), self.equation_str)?;
        writeln!(
            f,
            "    {}: [{}]\n",
            "Variables".cyan(),
            self.sorted_variables.iter().join(", ")
        )?;
        writeln!(f, "}}")?;
        Ok(())
    }
}

impl Equation {
    /// Creates a new `Equation` from a string representation.
    ///
    /// The variable names are extracted from the equation string and sorted
    /// alphabetically; input arrays are expected in the same order.
    ///
    /// For more control over variable ordering, use `from_params()` instead.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::new("2*x + y^2".to_string()).unwrap();
    /// let result = eq.eval(&[1.0, 2.0]).unwrap(); // x=1, y=2 -> 2*1 + 2^2 = 6
    /// assert_eq!(result, 6.0);
    /// ```
    pub fn new(equation_str: String) -> Result<Self, EquationError> {
        let node = build_operator_tree(&equation_str)?;
        let variables = extract_symbols(&node);
        Self::build(variables, equation_str)
    }

    /// Creates a new `Equation` whose input arrays follow the order of `params`.
    ///
    /// Every variable of the equation must be listed. Listing extra names is allowed;
    /// the equation simply does not depend on them.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::from_params("2*x + y^2".to_string(), &["y", "x"]).unwrap();
    /// let result = eq.eval(&[2.0, 1.0]).unwrap(); // y=2, x=1 -> 2*1 + 2^2 = 6
    /// assert_eq!(result, 6.0);
    /// ```
    pub fn from_params(equation_str: String, params: &[&str]) -> Result<Self, EquationError> {
        Self::build(params.iter().map(|p| p.to_string()).collect(), equation_str)
    }

    /// Parses the equation, builds the curried function and its first order partials.
    ///
    /// # Errors
    /// Returns `EquationError` if:
    /// - Equation string fails to parse
    /// - AST conversion fails
    /// - Variables in equation not found among the given names
    /// - The expression calls a function that cannot be differentiated
    fn build(sorted_variables: Vec<String>, equation_str: String) -> Result<Self, EquationError> {
        let params: Vec<VarRef> = sorted_variables.iter().map(VarRef::new).collect();
        let body = parse_body(&equation_str, &params)?;
        let function = Expr::lambda(params, body);

        let differentiator = Differentiator::default();
        let mut derivatives_first_order = HashMap::with_capacity(sorted_variables.len());
        for variable in sorted_variables.iter() {
            let derivative = differentiator.differentiate_by_name_strict(variable, &function)?;
            derivatives_first_order.insert(variable.clone(), derivative);
        }

        let var_map = sorted_variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u32))
            .collect();

        debug!(
            "built equation '{}' over [{}] ({} nodes)",
            equation_str,
            sorted_variables.iter().join(", "),
            function.size()
        );

        Ok(Self {
            equation_str,
            function,
            derivatives_first_order,
            var_map,
            sorted_variables,
        })
    }

    /// Evaluates the equation for the given input values.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::new("2*x + y^2".to_string()).unwrap();
    /// let result = eq.eval(&[1.0, 2.0]).unwrap(); // x=1, y=2
    /// assert_eq!(result, 6.0); // 2*1 + 2^2 = 6
    /// ```
    ///
    /// # Errors
    /// Returns `EquationError::InvalidInputLength` if the length of values doesn't match
    /// the number of variables.
    pub fn eval<V: Vector + ?Sized>(&self, values: &V) -> Result<f64, EquationError> {
        let values = self.validated(values)?;
        Ok(evaluate(&self.function, &values)?.into_scalar()?)
    }

    /// Computes the gradient (all first order partial derivatives) at the given point.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::new("2*x + y^2".to_string()).unwrap();
    /// let gradient = eq.gradient(&[1.0, 2.0]).unwrap(); // at point (1,2)
    /// assert_eq!(gradient, vec![2.0, 4.0]); // [∂/∂x, ∂/∂y] = [2, 2y]
    /// ```
    pub fn gradient<V: Vector + ?Sized>(&self, values: &V) -> Result<Vec<f64>, EquationError> {
        let values = self.validated(values)?;
        self.sorted_variables
            .iter()
            .map(|variable| -> Result<f64, EquationError> {
                let derivative = self.derivative(variable)?;
                Ok(evaluate(derivative, &values)?.into_scalar()?)
            })
            .collect()
    }

    /// Computes the Hessian matrix (all second order partial derivatives) at the given point.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::new("2*x + y^2".to_string()).unwrap();
    /// let hessian = eq.hessian(&[1.0, 2.0]).unwrap(); // at point (1,2)
    /// assert_eq!(hessian, vec![vec![0.0, 0.0], vec![0.0, 2.0]]);
    /// ```
    pub fn hessian<V: Vector + ?Sized>(&self, values: &V) -> Result<Vec<Vec<f64>>, EquationError> {
        let values = self.validated(values)?;
        Calculus::default().hessian(&self.function, &values)
    }

    /// Computes the Hessian into any [`Matrix`] container.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::new("x*y".to_string()).unwrap();
    /// let hessian: Vec<Vec<f64>> = eq.hessian_as(&[1.0, 1.0]).unwrap();
    /// assert_eq!(hessian, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    /// ```
    pub fn hessian_as<M: Matrix, V: Vector + ?Sized>(&self, values: &V) -> Result<M, EquationError> {
        Ok(M::from_rows(&self.hessian(values)?))
    }

    /// Sum of the unmixed second partial derivatives at the given point.
    pub fn laplacian<V: Vector + ?Sized>(&self, values: &V) -> Result<f64, EquationError> {
        let values = self.validated(values)?;
        Calculus::default().laplacian(&self.function, &values)
    }

    /// Returns the first order partial derivative with respect to `variable`.
    ///
    /// The derivative is a function of the same parameters as the equation and can be
    /// evaluated with [`crate::eval::evaluate`].
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// # use evalexpr_symdiff::eval::evaluate;
    /// let eq = Equation::new("2*x + y^2".to_string()).unwrap();
    /// let dx = eq.derivative("x").unwrap();
    /// let result = evaluate(dx, &[1.0, 2.0]).unwrap().into_scalar().unwrap();
    /// assert_eq!(result, 2.0);
    /// ```
    ///
    /// # Errors
    /// Returns `EquationError::DerivativeNotFound` if the variable is not found.
    pub fn derivative(&self, variable: &str) -> Result<&Expr, EquationError> {
        self.derivatives_first_order
            .get(variable)
            .ok_or(EquationError::DerivativeNotFound(variable.to_string()))
    }

    /// Computes the higher-order partial derivative with respect to several variables, in order.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// # use evalexpr_symdiff::eval::evaluate;
    /// let eq = Equation::new("x^2 * y^2".to_string()).unwrap();
    /// let dxdy = eq.derive_wrt(&["x", "y"]).unwrap();
    /// let result = evaluate(&dxdy, &[2.0, 3.0]).unwrap().into_scalar().unwrap();
    /// assert_eq!(result, 24.0); // ∂²/∂x∂y(x^2 * y^2) = 4xy
    /// ```
    ///
    /// # Errors
    /// Returns `EquationError::DerivativeNotFound` if any variable is not found.
    pub fn derive_wrt(&self, variables: &[&str]) -> Result<Expr, EquationError> {
        self.check_variables(variables)?;
        Ok(Differentiator::default().differentiate_wrt(variables, &self.function)?)
    }

    /// Computes the `n`-th derivative with respect to one variable.
    ///
    /// # Errors
    /// Returns `EquationError::DerivativeNotFound` if the variable is not found, and
    /// a differentiation error for a negative order.
    pub fn nth_derivative(&self, variable: &str, n: i64) -> Result<Expr, EquationError> {
        self.check_variables(&[variable])?;
        let params = Params::of(&self.function);
        let var_ref = params.lookup(variable)?;
        Ok(Differentiator::default().differentiate_n(var_ref, n, &self.function)?)
    }

    /// Collects several first order partial derivatives into one system that
    /// evaluates all of them at once.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::Equation;
    /// let eq = Equation::new("x^2 + y^2 + z^2".to_string()).unwrap();
    /// let derivatives = eq.derive_wrt_stack(&["x", "y"]).unwrap();
    /// let mut results = vec![0.0, 0.0];
    /// derivatives.eval_into(&[2.0, 3.0, 4.0], &mut results).unwrap();
    /// assert_eq!(results, vec![4.0, 6.0]);
    /// ```
    pub fn derive_wrt_stack(&self, variables: &[&str]) -> Result<EquationSystem, EquationError> {
        self.check_variables(variables)?;
        let labels = variables
            .iter()
            .map(|v| format!("d({})/d{v}", self.equation_str))
            .collect();
        let bodies = variables
            .iter()
            .map(|v| self.derivative(v).map(|d| d.body().clone()))
            .collect::<Result<Vec<Expr>, EquationError>>()?;
        EquationSystem::from_bodies(labels, bodies, self.sorted_variables.clone())
    }

    /// Returns the map of variable names to their indices.
    pub fn variables(&self) -> &HashMap<String, u32> {
        &self.var_map
    }

    /// Returns the original equation string.
    pub fn equation_str(&self) -> &str {
        &self.equation_str
    }

    /// Returns the curried function built from the equation.
    pub fn function(&self) -> &Expr {
        &self.function
    }

    /// Returns the sorted variables.
    pub fn sorted_variables(&self) -> &[String] {
        &self.sorted_variables
    }

    fn check_variables(&self, variables: &[&str]) -> Result<(), EquationError> {
        let missing: BTreeSet<&str> = variables
            .iter()
            .copied()
            .filter(|v| !self.var_map.contains_key(*v))
            .collect();
        if !missing.is_empty() {
            return Err(EquationError::DerivativeNotFound(missing.iter().join(", ")));
        }
        Ok(())
    }

    /// Reads the input values and checks that there is one per variable.
    fn validated<'v, V: Vector + ?Sized>(
        &self,
        values: &'v V,
    ) -> Result<std::borrow::Cow<'v, [f64]>, EquationError> {
        if values.len() != self.sorted_variables.len() {
            return Err(EquationError::InvalidInputLength {
                expected: self.sorted_variables.len(),
                got: values.len(),
            });
        }
        Ok(values.values())
    }
}

/// Parses `source` and converts it into an expression over `params`.
///
/// Every variable of the source must be one of the parameters.
pub(crate) fn parse_body(source: &str, params: &[VarRef]) -> Result<Expr, EquationError> {
    let node = build_operator_tree(source)?;

    let undefined: Vec<String> = extract_symbols(&node)
        .into_iter()
        .filter(|symbol| !params.iter().any(|p| p.name == *symbol))
        .collect();
    if !undefined.is_empty() {
        return Err(EquationError::VariableNotFound(undefined.join(", ")));
    }

    Ok(build_ast(&node, params)?)
}

/// Extracts the variables of an expression tree, sorted alphabetically.
pub fn extract_symbols(node: &Node) -> Vec<String> {
    let mut symbols = BTreeSet::new();
    extract_symbols_from_node(node, &mut symbols);
    symbols.into_iter().collect()
}

/// Extracts and sorts all unique variables from a collection of equation strings.
///
/// # Example
/// ```
/// # use evalexpr_symdiff::equation::extract_all_symbols;
/// let equations = vec!["2*x + y".to_string(), "z + x^2".to_string()];
/// let variables = extract_all_symbols(&equations).unwrap();
/// assert_eq!(variables, vec!["x".to_string(), "y".to_string(), "z".to_string()]);
/// ```
///
/// # Errors
/// Returns an error if any equation string cannot be parsed.
pub fn extract_all_symbols(equations: &[String]) -> Result<Vec<String>, EquationError> {
    let mut all_symbols = BTreeSet::new();
    for equation in equations {
        let tree = build_operator_tree(equation)?;
        extract_symbols_from_node(&tree, &mut all_symbols);
    }
    Ok(all_symbols.into_iter().collect())
}

/// Recursively extracts variable names from an expression tree node.
fn extract_symbols_from_node(node: &Node, symbols: &mut BTreeSet<String>) {
    match node.operator() {
        Operator::VariableIdentifierRead { identifier } => {
            symbols.insert(identifier.to_string());
        }
        _ => {
            for child in node.children() {
                extract_symbols_from_node(child, symbols);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConvertError, DiffError};
    use approx::assert_relative_eq;

    #[test]
    fn test_equation() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let result = eq.eval(&[1.0, 2.0]).unwrap();
        assert_eq!(result, 6.0);
    }

    #[test]
    fn test_gradient() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let gradient = eq.gradient(&[1.0, 2.0]).unwrap();
        assert_eq!(gradient, vec![2.0, 4.0]);
    }

    #[test]
    fn test_hessian() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let hessian = eq.hessian(&[1.0, 2.0]).unwrap();
        assert_eq!(hessian, vec![vec![0.0, 0.0], vec![0.0, 2.0]]);
    }

    #[test]
    fn test_laplacian() {
        let eq = Equation::new("x^2 + y^2".to_string()).unwrap();
        assert_eq!(eq.laplacian(&[1.0, 1.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_derivative() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let derivative = eq.derivative("x").unwrap();
        let result = evaluate(derivative, &[1.0, 2.0]).unwrap();
        assert_eq!(result.into_scalar().unwrap(), 2.0);
    }

    #[test]
    fn test_derive_wrt() {
        let eq = Equation::new("x^2 * y^2".to_string()).unwrap();
        let dxdy = eq.derive_wrt(&["x", "y"]).unwrap();
        let result = evaluate(&dxdy, &[2.0, 3.0]).unwrap();
        assert_eq!(result.into_scalar().unwrap(), 24.0);
    }

    #[test]
    #[should_panic]
    fn test_derive_wrt_invalid() {
        let eq = Equation::new("x^2 * y^2".to_string()).unwrap();
        let _ = eq.derive_wrt(&["x", "z"]).expect("Invalid variable");
    }

    #[test]
    fn test_nth_derivative() -> Result<(), Box<dyn std::error::Error>> {
        let eq = Equation::new("sin(x) * y".to_string())?;
        let third = eq.nth_derivative("x", 3)?;
        let value = evaluate(&third, &[0.5, 2.0])?.into_scalar()?;
        assert_relative_eq!(value, -2.0 * 0.5f64.cos(), max_relative = 1e-12);

        assert!(matches!(
            eq.nth_derivative("x", -2),
            Err(EquationError::Differentiation(DiffError::InvalidOrder(-2)))
        ));
        assert!(matches!(
            eq.nth_derivative("z", 1),
            Err(EquationError::DerivativeNotFound(_))
        ));
        Ok(())
    }

    #[test]
    #[should_panic]
    fn test_eval_invalid() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let _ = eq.eval(&[1.0]).expect("Invalid input length");
    }

    #[test]
    fn test_from_params() {
        let eq = Equation::from_params("2*x + y^2".to_string(), &["y", "x"]).unwrap();
        let result = eq.eval(&[2.0, 1.0]).unwrap();
        assert_eq!(result, 6.0);
        assert_eq!(eq.gradient(&[2.0, 1.0]).unwrap(), vec![4.0, 2.0]);
    }

    #[test]
    #[should_panic]
    fn test_from_params_invalid() {
        let _ = Equation::from_params("2*x + y^2".to_string(), &["x", "z"])
            .expect("Invalid variable");
    }

    #[test]
    fn test_unused_parameter() {
        let eq = Equation::from_params("x^2".to_string(), &["x", "t"]).unwrap();
        assert_eq!(eq.gradient(&[3.0, 1.0]).unwrap(), vec![6.0, 0.0]);
    }

    #[test]
    fn test_derive_wrt_stack() {
        let eq = Equation::new("x^2 + 2*x*y + y^2 + z^3".to_string()).unwrap();

        // Test getting derivatives with respect to [x, z] (skipping y)
        let derivatives = eq.derive_wrt_stack(&["x", "z"]).unwrap();
        let values = vec![2.0, 3.0, 2.0]; // [x, y, z]
        let mut results = vec![0.0, 0.0];
        derivatives.eval_into(&values, &mut results).unwrap();

        // ∂/∂x = 2x + 2y = 2(2) + 2(3) = 10
        // ∂/∂z = 3z^2 = 3(2^2) = 12
        assert_eq!(results, vec![10.0, 12.0]);

        // Test different order [z, x] to verify order matters
        let derivatives = eq.derive_wrt_stack(&["z", "x"]).unwrap();
        let mut results = vec![0.0, 0.0];
        derivatives.eval_into(&values, &mut results).unwrap();
        assert_eq!(results, vec![12.0, 10.0]);
    }

    #[test]
    fn test_named_calls() -> Result<(), Box<dyn std::error::Error>> {
        let eq = Equation::new("hypot(x, y) + abs(x)".to_string())?;
        assert_eq!(eq.eval(&[-3.0, 4.0])?, 8.0);
        assert_eq!(eq.gradient(&[-3.0, 4.0])?, vec![-0.6 - 1.0, 0.8]);
        Ok(())
    }

    #[test]
    fn test_unknown_call_fails_to_build() {
        assert!(matches!(
            Equation::new("gamma(x)".to_string()),
            Err(EquationError::Differentiation(DiffError::UnsupportedConstruct(_)))
        ));
    }

    #[test]
    fn test_unsupported_operator() {
        assert!(matches!(
            Equation::new("x % 2".to_string()),
            Err(EquationError::BuildAstError(ConvertError::UnsupportedOperator(_)))
        ));
    }

    #[cfg(all(feature = "ndarray", feature = "nalgebra"))]
    #[test]
    fn test_all_backends() {
        use nalgebra::{DMatrix, DVector};
        use ndarray::{Array1, Array2};

        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let expected = 6.0; // 2*1 + 2^2 = 6.0

        // Test Vec (standard)
        let vec_input = vec![1.0, 2.0];
        assert_eq!(eq.eval(&vec_input).unwrap(), expected);

        // Test nalgebra
        let nalgebra_input = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(eq.eval(&nalgebra_input).unwrap(), expected);

        // Test ndarray
        let ndarray_input = Array1::from_vec(vec![1.0, 2.0]);
        assert_eq!(eq.eval(&ndarray_input).unwrap(), expected);

        let h: DMatrix<f64> = eq.hessian_as(&nalgebra_input).unwrap();
        assert_eq!(h[(1, 1)], 2.0);
        let h: Array2<f64> = eq.hessian_as(&ndarray_input).unwrap();
        assert_eq!(h[[1, 1]], 2.0);
    }

    #[test]
    fn test_extract_all_symbols() {
        let equations = vec![
            "2*x + y".to_string(),
            "z + x^2".to_string(),
            "y*z".to_string(),
        ];
        let variables = extract_all_symbols(&equations).unwrap();
        assert_eq!(
            variables,
            vec!["x".to_string(), "y".to_string(), "z".to_string()]
        );
        assert!(extract_all_symbols(&["2*x + )".to_string()]).is_err());
    }

    #[test]
    fn test_debug_and_display_formatting() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();

        // Test Debug formatting
        let debug_output = format!("{:?}", eq);
        assert!(debug_output.contains("Equation"));
        assert!(debug_output.contains("2*x + y^2"));
        assert!(debug_output.contains("d/dx"));

        // Test Display formatting
        let display_output = format!("{}", eq);
        assert!(display_output.contains("Equation"));
        assert!(display_output.contains("2*x + y^2"));
    }

    #[test]
    fn test_equation_clone() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();
        let cloned = eq.clone();

        // Test that both evaluate to the same result
        let values = vec![1.0, 2.0];
        assert_eq!(eq.eval(&values).unwrap(), cloned.eval(&values).unwrap());

        // Test that gradients match
        assert_eq!(
            eq.gradient(&values).unwrap(),
            cloned.gradient(&values).unwrap()
        );
    }

    #[test]
    fn test_invalid_expression() {
        let result = Equation::new("2*x + )".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_accessor_methods() {
        let eq = Equation::new("2*x + y^2".to_string()).unwrap();

        assert_eq!(eq.equation_str(), "2*x + y^2");
        assert_eq!(eq.variables().get("y"), Some(&1));
        assert_eq!(eq.sorted_variables(), &["x", "y"]);
        assert_eq!(eq.function().arity(), 2);
    }

    #[test]
    fn test_variable_ordering() {
        let eq = Equation::from_params("x + y + z".to_string(), &["z", "y", "x"]).unwrap();
        assert_eq!(eq.sorted_variables(), &["z", "y", "x"]);

        // Test evaluation with ordered inputs
        let result = eq.eval(&[1.0, 2.0, 3.0]).unwrap(); // z=1, y=2, x=3
        assert_eq!(result, 6.0);
    }
}
