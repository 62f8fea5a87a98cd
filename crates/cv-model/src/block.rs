//! Named container of model components.
//!
//! Component names are local to the block; variable references inside
//! expressions carry the qualified `block.local` name. Builders stage new
//! components into a scratch block carrying the same name and commit them
//! with [`Block::merge`], which either inserts everything or nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::component::{ConstraintSet, DerivativeOf, Domain, ExpressionSet, Var};
use crate::error::{ModelError, ModelResult};
use crate::expr::{Expr, VarRef};
use crate::index::Index;

#[derive(Clone, Debug)]
pub struct Block {
    name: Arc<str>,
    vars: BTreeMap<String, Var>,
    constraints: BTreeMap<String, ConstraintSet>,
    expressions: BTreeMap<String, ExpressionSet>,
}

impl Block {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            vars: BTreeMap::new(),
            constraints: BTreeMap::new(),
            expressions: BTreeMap::new(),
        }
    }

    /// Empty block with the same name, for staging.
    pub fn scratch(&self) -> Self {
        Self::new(self.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualify(&self, local: &str) -> Arc<str> {
        Arc::from(format!("{}.{}", self.name, local))
    }

    pub fn has_component(&self, local: &str) -> bool {
        self.vars.contains_key(local)
            || self.constraints.contains_key(local)
            || self.expressions.contains_key(local)
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.vars
            .keys()
            .chain(self.constraints.keys())
            .chain(self.expressions.keys())
            .map(String::as_str)
    }

    fn ensure_free(&self, local: &str) -> ModelResult<()> {
        if self.has_component(local) {
            Err(ModelError::DuplicateComponent {
                block: self.name.to_string(),
                name: local.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn missing(&self, local: &str) -> ModelError {
        ModelError::MissingComponent {
            block: self.name.to_string(),
            name: local.to_string(),
        }
    }

    pub fn add_var(
        &mut self,
        local: &str,
        indices: impl IntoIterator<Item = Index>,
    ) -> ModelResult<&mut Var> {
        self.ensure_free(local)?;
        let var = Var::new(self.qualify(local), indices);
        Ok(self.vars.entry(local.to_string()).or_insert(var))
    }

    /// Add a derivative variable of the local variable `of` with respect to `wrt`.
    pub fn add_derivative_var(
        &mut self,
        local: &str,
        of: &str,
        wrt: Domain,
        indices: impl IntoIterator<Item = Index>,
    ) -> ModelResult<&mut Var> {
        let of = DerivativeOf {
            var: self.qualify(of),
            wrt,
        };
        self.ensure_free(local)?;
        let var = Var::new(self.qualify(local), indices).with_derivative(of);
        Ok(self.vars.entry(local.to_string()).or_insert(var))
    }

    pub fn add_constraints(&mut self, local: &str) -> ModelResult<&mut ConstraintSet> {
        self.ensure_free(local)?;
        let set = ConstraintSet::new(self.qualify(local));
        Ok(self.constraints.entry(local.to_string()).or_insert(set))
    }

    pub fn add_expressions(&mut self, local: &str) -> ModelResult<&mut ExpressionSet> {
        self.ensure_free(local)?;
        let set = ExpressionSet::new(self.qualify(local));
        Ok(self.expressions.entry(local.to_string()).or_insert(set))
    }

    pub fn var(&self, local: &str) -> Option<&Var> {
        self.vars.get(local)
    }

    pub fn var_mut(&mut self, local: &str) -> Option<&mut Var> {
        self.vars.get_mut(local)
    }

    pub fn constraints(&self, local: &str) -> Option<&ConstraintSet> {
        self.constraints.get(local)
    }

    pub fn expressions(&self, local: &str) -> Option<&ExpressionSet> {
        self.expressions.get(local)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &Var)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn require_var(&self, local: &str) -> ModelResult<&Var> {
        self.vars.get(local).ok_or_else(|| self.missing(local))
    }

    pub fn require_var_mut(&mut self, local: &str) -> ModelResult<&mut Var> {
        let err = self.missing(local);
        self.vars.get_mut(local).ok_or(err)
    }

    /// Variable owning the qualified reference `r`, if it lives in this block.
    pub fn var_for_ref_mut(&mut self, r: &VarRef) -> Option<&mut Var> {
        let prefix = format!("{}.", self.name);
        let local = r.name.strip_prefix(prefix.as_str())?;
        self.vars.get_mut(local)
    }

    pub fn require_constraints(&self, local: &str) -> ModelResult<&ConstraintSet> {
        self.constraints.get(local).ok_or_else(|| self.missing(local))
    }

    /// Expression for `local[index]`, resolving variables and named expressions.
    pub fn term(&self, local: &str, index: &Index) -> ModelResult<Expr> {
        if let Some(v) = self.vars.get(local) {
            return v.at(index);
        }
        if let Some(e) = self.expressions.get(local) {
            return e.at(index);
        }
        Err(self.missing(local))
    }

    /// Move every component of `other` into this block.
    ///
    /// Fails without modifying `self` when any name is already taken.
    pub fn merge(&mut self, other: Block) -> ModelResult<()> {
        if other.name != self.name {
            return Err(ModelError::MissingComponent {
                block: self.name.to_string(),
                name: format!("<staged block '{}'>", other.name),
            });
        }
        if let Some(dup) = other.component_names().find(|n| self.has_component(n)) {
            return Err(ModelError::DuplicateComponent {
                block: self.name.to_string(),
                name: dup.to_string(),
            });
        }
        self.vars.extend(other.vars);
        self.constraints.extend(other.constraints);
        self.expressions.extend(other.expressions);
        Ok(())
    }
}
