//! Several equations over a shared set of variables.
//!
//! The equations are combined into one vector-valued curried function
//! `\x1 -> ... -> \xn -> [f1, ..., fm]` over the union of their variables, so a single
//! symbolic derivative of that function yields a whole column of the Jacobian.
//!
//! Variables are ordered alphabetically unless a variable map says otherwise, and every
//! input array is read in that order.
//!
//! ```
//! use evalexpr_symdiff::system::EquationSystem;
//!
//! let system = EquationSystem::new(vec!["2*x + y".to_string(), "x^2 + z".to_string()]).unwrap();
//!
//! // inputs are (x, y, z)
//! assert_eq!(system.eval(&[1.0, 2.0, 3.0]).unwrap(), vec![4.0, 4.0]);
//!
//! // column of the Jacobian for x
//! assert_eq!(system.gradient(&[1.0, 2.0, 3.0], "x").unwrap(), vec![2.0, 2.0]);
//! ```

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use crate::backends::matrix::Matrix;
use crate::backends::vector::Vector;
use crate::derived::transpose;
use crate::diff::Differentiator;
use crate::equation::{extract_all_symbols, parse_body};
use crate::errors::{EquationError, EvalError};
use crate::eval::evaluate;
use crate::expr::{Expr, Head, VarRef};

/// Represents a system of mathematical equations that can be evaluated together.
#[derive(Clone)]
pub struct EquationSystem {
    /// The original string representations of the equations
    pub equations: Vec<String>,
    /// The vector-valued curried function holding every equation
    pub function: Expr,
    /// Maps variable names to their indices in the input array
    pub variable_map: HashMap<String, u32>,
    /// Variables in input order
    pub sorted_variables: Vec<String>,
    /// Derivative of the whole system with respect to each variable
    pub jacobian_exprs: HashMap<String, Expr>,
}

impl EquationSystem {
    /// Creates a new equation system from a vector of expression strings.
    ///
    /// Variables are extracted from all expressions and ordered alphabetically.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "2*x + y".to_string(),
    ///     "x^2 + z".to_string()
    /// ]).unwrap();
    ///
    /// let results = system.eval(&[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(results, vec![4.0, 4.0]);
    /// ```
    pub fn new(expressions: Vec<String>) -> Result<Self, EquationError> {
        let sorted_variables = extract_all_symbols(&expressions)?;
        Self::build(expressions, sorted_variables)
    }

    /// Creates a new equation system from a vector of expressions and a variable map.
    ///
    /// The map assigns each variable its index in input arrays. The indices must be
    /// `0..n`, each used exactly once.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// # use std::collections::HashMap;
    /// let var_map: HashMap<String, u32> = [
    ///     ("y".to_string(), 0),
    ///     ("x".to_string(), 1),
    /// ].into_iter().collect();
    ///
    /// let system = EquationSystem::from_var_map(
    ///     vec!["2*x + y".to_string(), "x - y".to_string()],
    ///     &var_map
    /// ).unwrap();
    /// assert_eq!(system.eval(&[1.0, 3.0]).unwrap(), vec![7.0, 2.0]);
    /// ```
    pub fn from_var_map(
        expressions: Vec<String>,
        variable_map: &HashMap<String, u32>,
    ) -> Result<Self, EquationError> {
        let mut slots: Vec<Option<&String>> = vec![None; variable_map.len()];
        for (var, idx) in variable_map.iter().sorted() {
            match slots.get_mut(*idx as usize) {
                Some(slot @ None) => *slot = Some(var),
                Some(Some(other)) => {
                    return Err(EquationError::InvalidVariableMap(format!(
                        "index {idx} is assigned to both '{other}' and '{var}'"
                    )))
                }
                None => {
                    return Err(EquationError::InvalidVariableMap(format!(
                        "index {idx} of '{var}' is out of range for {} variables",
                        variable_map.len()
                    )))
                }
            }
        }
        let sorted_variables = slots.into_iter().flatten().cloned().collect();
        Self::build(expressions, sorted_variables)
    }

    fn build(expressions: Vec<String>, sorted_variables: Vec<String>) -> Result<Self, EquationError> {
        let params: Vec<VarRef> = sorted_variables.iter().map(VarRef::new).collect();
        let bodies = expressions
            .iter()
            .map(|expr| parse_body(expr, &params))
            .collect::<Result<Vec<Expr>, EquationError>>()?;
        Self::from_bodies(expressions, bodies, sorted_variables)
    }

    /// Assembles a system from already converted equation bodies.
    pub(crate) fn from_bodies(
        equations: Vec<String>,
        bodies: Vec<Expr>,
        sorted_variables: Vec<String>,
    ) -> Result<Self, EquationError> {
        let params: Vec<VarRef> = sorted_variables.iter().map(VarRef::new).collect();
        let function = Expr::lambda(params, Expr::vector(bodies));

        // Create the derivative of the system for each variable, one column of the Jacobian
        let differentiator = Differentiator::default();
        let mut jacobian_exprs = HashMap::with_capacity(sorted_variables.len());
        for var in sorted_variables.iter() {
            let derivative = differentiator.differentiate_by_name_strict(var, &function)?;
            jacobian_exprs.insert(var.clone(), derivative);
        }

        let variable_map = sorted_variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u32))
            .collect();

        debug!(
            "built system of {} equations over [{}]",
            equations.len(),
            sorted_variables.iter().join(", ")
        );

        Ok(Self {
            equations,
            function,
            variable_map,
            sorted_variables,
            jacobian_exprs,
        })
    }

    /// Evaluates all equations in the system into a pre-allocated buffer.
    ///
    /// # Errors
    /// - `EquationError::InvalidInputLength` if the number of inputs doesn't match the number of variables
    /// - `EquationError::InvalidOutputLength` if the buffer size doesn't match the number of equations
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "x + y".to_string(),
    ///     "x * y".to_string(),
    /// ]).unwrap();
    ///
    /// let mut results = vec![0.0; 2];
    /// system.eval_into(&[2.0, 3.0], &mut results).unwrap();
    /// assert_eq!(results, vec![5.0, 6.0]);
    /// ```
    pub fn eval_into<'a, V: Vector + ?Sized>(
        &self,
        inputs: &V,
        results: &'a mut [f64],
    ) -> Result<&'a [f64], EquationError> {
        if results.len() != self.equations.len() {
            return Err(EquationError::InvalidOutputLength {
                expected: self.equations.len(),
                got: results.len(),
            });
        }
        let values = self.eval(inputs)?;
        results.copy_from_slice(&values);
        Ok(results)
    }

    /// Evaluates all equations in the system with the given input values.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "x + y".to_string(),
    ///     "x * y".to_string(),
    /// ]).unwrap();
    ///
    /// let results = system.eval(&[2.0, 3.0]).unwrap();
    /// assert_eq!(results, vec![5.0, 6.0]);
    /// ```
    pub fn eval<V: Vector + ?Sized>(&self, inputs: &V) -> Result<Vec<f64>, EquationError> {
        self.validate_input_length(inputs.len())?;
        Ok(self.eval_unchecked(&inputs.values())?)
    }

    fn eval_unchecked(&self, inputs: &[f64]) -> Result<Vec<f64>, EvalError> {
        evaluate(&self.function, inputs)?.into_vector()
    }

    /// Evaluates the equation system for many input sets on the rayon thread pool.
    ///
    /// The input sets are split into chunks sized from the available parallelism.
    /// Results keep the order of the input sets.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "x + y".to_string(),
    ///     "x * y".to_string(),
    /// ]).unwrap();
    ///
    /// let input_sets = vec![
    ///     vec![1.0, 2.0],
    ///     vec![3.0, 4.0],
    ///     vec![5.0, 6.0],
    /// ];
    ///
    /// let results = system.eval_parallel(&input_sets).unwrap();
    /// assert_eq!(results[2], vec![11.0, 30.0]);
    /// ```
    pub fn eval_parallel(&self, input_sets: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EquationError> {
        for inputs in input_sets {
            self.validate_input_length(inputs.len())?;
        }

        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        let chunk_size = (input_sets.len() / (num_threads * 4)).max(1);

        let chunks = input_sets
            .par_chunks(chunk_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|inputs| self.eval_unchecked(inputs))
                    .collect::<Result<Vec<_>, EvalError>>()
            })
            .collect::<Result<Vec<_>, EvalError>>()?;

        Ok(chunks.into_iter().flatten().collect())
    }

    /// Returns the derivatives of all equations with respect to one variable.
    ///
    /// This is one column of the Jacobian matrix.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "x^2*y".to_string(),  // f1
    ///     "x*y^2".to_string(),  // f2
    /// ]).unwrap();
    ///
    /// let gradient = system.gradient(&[2.0, 3.0], "x").unwrap();
    /// assert_eq!(gradient, vec![12.0, 9.0]); // (∂f1/∂x, ∂f2/∂x)
    /// ```
    pub fn gradient<V: Vector + ?Sized>(
        &self,
        inputs: &V,
        variable: &str,
    ) -> Result<Vec<f64>, EquationError> {
        self.validate_input_length(inputs.len())?;
        let derivative = self
            .jacobian_exprs
            .get(variable)
            .ok_or_else(|| EquationError::VariableNotFound(variable.to_string()))?;
        Ok(evaluate(derivative, &inputs.values())?.into_vector()?)
    }

    /// Computes the Jacobian matrix of the equation system at the given input values.
    ///
    /// Each row corresponds to an equation, and each column to a variable. Pass
    /// `Some(variables)` to restrict and reorder the columns.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "x^2*y".to_string(),  // f1
    ///     "x*y^2".to_string(),  // f2
    /// ]).unwrap();
    ///
    /// let jacobian = system.jacobian(&[2.0, 3.0], None).unwrap();
    /// assert_eq!(jacobian, vec![vec![12.0, 4.0], vec![9.0, 12.0]]);
    /// ```
    pub fn jacobian<V: Vector + ?Sized>(
        &self,
        inputs: &V,
        variables: Option<&[String]>,
    ) -> Result<Vec<Vec<f64>>, EquationError> {
        let variables = variables.unwrap_or(&self.sorted_variables);
        let columns = variables
            .iter()
            .map(|var| self.gradient(inputs, var))
            .collect::<Result<Vec<_>, EquationError>>()?;
        if columns.is_empty() {
            return Ok(vec![Vec::new(); self.equations.len()]);
        }
        Ok(transpose(&columns))
    }

    /// Transposed Jacobian: one row per variable, one column per equation.
    pub fn jacobian_t<V: Vector + ?Sized>(&self, inputs: &V) -> Result<Vec<Vec<f64>>, EquationError> {
        self.sorted_variables
            .iter()
            .map(|var| self.gradient(inputs, var))
            .collect()
    }

    /// Computes the Jacobian into any [`Matrix`] container.
    pub fn jacobian_as<M: Matrix, V: Vector + ?Sized>(&self, inputs: &V) -> Result<M, EquationError> {
        Ok(M::from_rows(&self.jacobian(inputs, None)?))
    }

    /// Creates a new equation system containing the higher-order derivatives of all equations
    /// with respect to multiple variables, taken in the given order.
    ///
    /// # Example
    /// ```
    /// # use evalexpr_symdiff::system::EquationSystem;
    /// let system = EquationSystem::new(vec![
    ///     "x^2*y".to_string(),  // f1
    ///     "x*y^2".to_string(),  // f2
    /// ]).unwrap();
    ///
    /// let derivatives = system.derive_wrt(&["x", "y"]).unwrap();
    /// let results = derivatives.eval(&[2.0, 3.0]).unwrap();
    /// assert_eq!(results, vec![4.0, 6.0]); // ∂²f1/∂x∂y = 2x, ∂²f2/∂x∂y = 2y
    /// ```
    pub fn derive_wrt(&self, variables: &[&str]) -> Result<EquationSystem, EquationError> {
        // Verify all variables exist
        for var in variables {
            if !self.variable_map.contains_key(*var) {
                return Err(EquationError::VariableNotFound(var.to_string()));
            }
        }

        let derivative = Differentiator::default().differentiate_wrt(variables, &self.function)?;
        let bodies = match derivative.body() {
            Expr::Generic(Head::Vector, children) => children.clone(),
            other => vec![other.clone()],
        };
        let labels = self
            .equations
            .iter()
            .map(|eq| format!("d({eq})/d{}", variables.iter().join("d")))
            .collect();

        Self::from_bodies(labels, bodies, self.sorted_variables.clone())
    }

    /// Returns the sorted variables in the system.
    pub fn sorted_variables(&self) -> &[String] {
        &self.sorted_variables
    }

    /// Returns the map of variable names to their indices.
    pub fn variables(&self) -> &HashMap<String, u32> {
        &self.variable_map
    }

    /// Returns the original equation strings.
    pub fn equations(&self) -> &[String] {
        &self.equations
    }

    /// Returns the vector-valued function of the system.
    pub fn function(&self) -> &Expr {
        &self.function
    }

    /// Returns the number of equations in the system.
    pub fn num_equations(&self) -> usize {
        self.equations.len()
    }

    /// Validates that the number of input values matches the number of variables.
    fn validate_input_length(&self, got: usize) -> Result<(), EquationError> {
        if got != self.sorted_variables.len() {
            return Err(EquationError::InvalidInputLength {
                expected: self.sorted_variables.len(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_with_different_variables() -> Result<(), Box<dyn std::error::Error>> {
        let system = EquationSystem::new(vec![
            "2*x + y".to_string(),
            "z^2".to_string(),
            "x + y + z".to_string(),
        ])?;

        assert_eq!(system.sorted_variables, &["x", "y", "z"]);
        assert_eq!(system.num_equations(), 3);
        assert_eq!(system.eval(&[1.0, 2.0, 3.0])?, vec![4.0, 9.0, 6.0]);

        Ok(())
    }

    #[test]
    fn test_consistent_variable_ordering() -> Result<(), Box<dyn std::error::Error>> {
        let system = EquationSystem::new(vec!["y + x".to_string(), "x + z".to_string()])?;

        // alphabetical, whatever order the equations mention them in
        assert_eq!(system.sorted_variables(), &["x", "y", "z"]);
        assert_eq!(system.variables()["z"], 2);
        assert_eq!(system.eval(&[1.0, 2.0, 3.0])?, vec![3.0, 4.0]);

        Ok(())
    }

    #[test]
    #[should_panic]
    fn test_invalid_input_length() {
        let system = EquationSystem::new(vec!["x + y".to_string(), "y + z".to_string()]).unwrap();

        // Should panic: providing only 2 values when system needs 3 (x, y, z)
        let _ = system.eval(&[1.0, 2.0]).unwrap();
    }

    #[test]
    fn test_invalid_output_length() {
        let system = EquationSystem::new(vec!["x + y".to_string(), "x * y".to_string()]).unwrap();
        let mut results = vec![0.0; 3];
        assert!(matches!(
            system.eval_into(&[1.0, 2.0], &mut results),
            Err(EquationError::InvalidOutputLength {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn test_complex_expressions() -> Result<(), Box<dyn std::error::Error>> {
        let expressions = vec![
            "(x + y) * (x - y)".to_string(),     // difference of squares
            "x^3 + y^2 * z".to_string(),         // polynomial
            "(x + y + z) / (x + 1)".to_string(), // division
        ];

        let system = EquationSystem::new(expressions)?;
        let results = system.eval(&[2.0, 3.0, 4.0])?;

        assert_eq!(results[0], -5.0); // (2 + 3) * (2 - 3) = 5 * -1 = -5
        assert_eq!(results[1], 44.0); // 2^3 + 3^2 * 4 = 8 + 9 * 4 = 44
        assert_eq!(results[2], 3.0); // (2 + 3 + 4) / (2 + 1) = 9 / 3 = 3

        Ok(())
    }

    #[test]
    fn test_custom_variable_map() -> Result<(), Box<dyn std::error::Error>> {
        let var_map: HashMap<String, u32> =
            [("z".to_string(), 0), ("x".to_string(), 1), ("y".to_string(), 2)]
                .into_iter()
                .collect();

        let system = EquationSystem::from_var_map(
            vec!["x - y".to_string(), "z * 2".to_string()],
            &var_map,
        )?;
        assert_eq!(system.sorted_variables(), &["z", "x", "y"]);
        assert_eq!(system.eval(&[1.0, 5.0, 2.0])?, vec![3.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_variable_map_indices_must_be_a_permutation() {
        let exprs = || vec!["x + y".to_string()];

        let shared: HashMap<String, u32> =
            [("x".to_string(), 0), ("y".to_string(), 0)].into_iter().collect();
        assert!(matches!(
            EquationSystem::from_var_map(exprs(), &shared),
            Err(EquationError::InvalidVariableMap(_))
        ));

        let gap: HashMap<String, u32> =
            [("x".to_string(), 0), ("y".to_string(), 2)].into_iter().collect();
        assert!(matches!(
            EquationSystem::from_var_map(exprs(), &gap),
            Err(EquationError::InvalidVariableMap(_))
        ));

        let reversed: HashMap<String, u32> =
            [("x".to_string(), 1), ("y".to_string(), 0)].into_iter().collect();
        let system = EquationSystem::from_var_map(vec!["x - y".to_string()], &reversed).unwrap();
        assert_eq!(system.sorted_variables(), &["y", "x"]);
    }

    #[test]
    fn test_undeclared_variable() {
        let var_map: HashMap<String, u32> = [("x".to_string(), 0)].into_iter().collect();
        let result = EquationSystem::from_var_map(vec!["x + y".to_string()], &var_map);
        assert!(matches!(result, Err(EquationError::VariableNotFound(v)) if v == "y"));
    }

    #[test]
    fn test_parallel_evaluation() -> Result<(), Box<dyn std::error::Error>> {
        let system = EquationSystem::new(vec!["x + y".to_string(), "x * y".to_string()])?;
        let input_sets: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64, 2.0]).collect();

        let parallel = system.eval_parallel(&input_sets)?;
        assert_eq!(parallel.len(), 100);
        for (inputs, results) in input_sets.iter().zip(parallel.iter()) {
            assert_eq!(*results, system.eval(inputs)?);
        }

        let bad = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(system.eval_parallel(&bad).is_err());
        Ok(())
    }

    #[test]
    fn test_gradient_and_jacobian() -> Result<(), Box<dyn std::error::Error>> {
        let system = EquationSystem::new(vec![
            "x^2*y".to_string(), // f1
            "x*y^2".to_string(), // f2
            "sin(x)".to_string(),
        ])?;
        let at = [2.0, 3.0];

        assert_eq!(system.gradient(&at, "y")?, vec![4.0, 12.0, 0.0]);
        assert!(matches!(
            system.gradient(&at, "z"),
            Err(EquationError::VariableNotFound(_))
        ));

        let jacobian = system.jacobian(&at, None)?;
        assert_eq!(jacobian[0], vec![12.0, 4.0]);
        assert_eq!(jacobian[1], vec![9.0, 12.0]);
        assert_eq!(jacobian[2], vec![2f64.cos(), 0.0]);

        let jacobian_t = system.jacobian_t(&at)?;
        assert_eq!(jacobian_t[0], vec![12.0, 9.0, 2f64.cos()]);
        assert_eq!(jacobian_t[1], vec![4.0, 12.0, 0.0]);

        // Restricted and reordered columns
        let columns = ["y".to_string()];
        let partial = system.jacobian(&at, Some(&columns))?;
        assert_eq!(partial, vec![vec![4.0], vec![12.0], vec![0.0]]);

        let as_nested: Vec<Vec<f64>> = system.jacobian_as(&at)?;
        assert_eq!(as_nested, jacobian);
        Ok(())
    }

    #[test]
    fn test_derive_wrt() -> Result<(), Box<dyn std::error::Error>> {
        let system = EquationSystem::new(vec!["x^2*y".to_string(), "x*y^2".to_string()])?;
        let derivatives = system.derive_wrt(&["x", "y"])?;
        assert_eq!(derivatives.num_equations(), 2);
        assert_eq!(derivatives.eval(&[2.0, 3.0])?, vec![4.0, 6.0]);

        let second = system.derive_wrt(&["x", "x"])?;
        assert_eq!(second.eval(&[2.0, 3.0])?, vec![6.0, 0.0]);

        assert!(system.derive_wrt(&["w"]).is_err());
        Ok(())
    }

    #[cfg(feature = "nalgebra")]
    #[test]
    fn test_jacobian_as_nalgebra() -> Result<(), Box<dyn std::error::Error>> {
        use nalgebra::{DMatrix, DVector};

        let system = EquationSystem::new(vec!["x*y".to_string(), "x + y".to_string()])?;
        let at = DVector::from_vec(vec![2.0, 3.0]);
        let jacobian: DMatrix<f64> = system.jacobian_as(&at)?;
        assert_eq!(jacobian[(0, 0)], 3.0);
        assert_eq!(jacobian[(0, 1)], 2.0);
        assert_eq!(jacobian[(1, 0)], 1.0);
        Ok(())
    }
}
