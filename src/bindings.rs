//! Name resolution against the parameters of a curried function.

use log::debug;

use crate::errors::DiffError;
use crate::expr::{Expr, VarRef};
use crate::types::NumType;

/// The ordered parameters of a curried function, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct Params<'a> {
    params: Vec<&'a VarRef>,
}

/// Result of looking up a parameter by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<'a> {
    /// The name is one of the declared parameters
    Bound(&'a VarRef),
    /// The name is not declared; the reference is synthesised so that
    /// differentiating with respect to it yields zero
    Unbound(VarRef),
}

impl Binding<'_> {
    pub fn var_ref(&self) -> &VarRef {
        match self {
            Binding::Bound(var_ref) => var_ref,
            Binding::Unbound(var_ref) => var_ref,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

impl<'a> Params<'a> {
    pub fn of(expr: &'a Expr) -> Self {
        Self {
            params: expr.params(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a VarRef> + '_ {
        self.params.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Resolves `name`, falling back to a synthetic reference when it is not a parameter.
    ///
    /// The synthetic reference takes the type and scope of the first parameter,
    /// or `Float` in scope 0 for a function without parameters.
    pub fn resolve(&self, name: &str) -> Binding<'a> {
        if let Some(var_ref) = self.params.iter().copied().find(|p| p.name == name) {
            return Binding::Bound(var_ref);
        }
        let (ty, scope) = self
            .params
            .first()
            .map_or((NumType::Float, 0), |p| (p.ty, p.scope));
        debug!("'{name}' is not a parameter, differentiating against a fresh variable");
        Binding::Unbound(VarRef::typed(name, ty).with_scope(scope))
    }

    /// Resolves `name`, failing when it is not a parameter.
    pub fn lookup(&self, name: &str) -> Result<&'a VarRef, DiffError> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .copied()
            .ok_or_else(|| DiffError::VariableNotFound(name.to_string()))
    }
}
