//! Indexed model components: variables, constraints and named expressions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::expr::{Expr, VarRef};
use crate::index::Index;

/// Value and bounds of one variable entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VarData {
    pub value: Option<f64>,
    pub fixed: bool,
    pub lb: Option<f64>,
    pub ub: Option<f64>,
}

/// Continuous domain a derivative variable is taken with respect to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Time,
    Length,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivativeOf {
    /// Qualified name of the differentiated variable.
    pub var: Arc<str>,
    pub wrt: Domain,
}

/// Indexed variable.
#[derive(Clone, Debug)]
pub struct Var {
    name: Arc<str>,
    entries: BTreeMap<Index, VarData>,
    initial: VarData,
    derivative: Option<DerivativeOf>,
}

impl Var {
    pub fn new(name: impl Into<Arc<str>>, indices: impl IntoIterator<Item = Index>) -> Self {
        Self {
            name: name.into(),
            entries: indices.into_iter().map(|i| (i, VarData::default())).collect(),
            initial: VarData::default(),
            derivative: None,
        }
    }

    pub fn scalar(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, [Index::scalar()])
    }

    /// Set the value of every entry, and of entries added later by `reindex`.
    pub fn with_value(mut self, value: f64) -> Self {
        self.set_all(value);
        self
    }

    pub fn with_bounds(mut self, lb: Option<f64>, ub: Option<f64>) -> Self {
        self.set_bounds(lb, ub);
        self
    }

    pub fn set_all(&mut self, value: f64) {
        self.initial.value = Some(value);
        for d in self.entries.values_mut() {
            d.value = Some(value);
        }
    }

    pub fn set_bounds(&mut self, lb: Option<f64>, ub: Option<f64>) {
        self.initial.lb = lb;
        self.initial.ub = ub;
        for d in self.entries.values_mut() {
            d.lb = lb;
            d.ub = ub;
        }
    }

    pub fn with_derivative(mut self, of: DerivativeOf) -> Self {
        self.derivative = Some(of);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn derivative_of(&self) -> Option<&DerivativeOf> {
        self.derivative.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: &Index) -> bool {
        self.entries.contains_key(index)
    }

    pub fn indices(&self) -> impl Iterator<Item = &Index> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Index, &VarData)> {
        self.entries.iter()
    }

    pub fn get(&self, index: &Index) -> Option<&VarData> {
        self.entries.get(index)
    }

    fn entry_mut(&mut self, index: &Index) -> ModelResult<&mut VarData> {
        let name = self.name.clone();
        self.entries
            .get_mut(index)
            .ok_or_else(|| ModelError::UnknownIndex {
                component: name.to_string(),
                index: index.to_string(),
            })
    }

    /// Reference to one entry as an expression.
    pub fn at(&self, index: &Index) -> ModelResult<Expr> {
        if self.contains(index) {
            Ok(Expr::Var(self.var_ref(index.clone())))
        } else {
            Err(ModelError::UnknownIndex {
                component: self.name.to_string(),
                index: index.to_string(),
            })
        }
    }

    pub fn var_ref(&self, index: Index) -> VarRef {
        VarRef::new(self.name.clone(), index)
    }

    pub fn refs(&self) -> Vec<VarRef> {
        self.entries.keys().map(|i| self.var_ref(i.clone())).collect()
    }

    pub fn set_value(&mut self, index: &Index, value: f64) -> ModelResult<()> {
        self.entry_mut(index)?.value = Some(value);
        Ok(())
    }

    /// Fix an entry, optionally at a new value.
    pub fn fix(&mut self, index: &Index, value: Option<f64>) -> ModelResult<()> {
        let d = self.entry_mut(index)?;
        if value.is_some() {
            d.value = value;
        }
        d.fixed = true;
        Ok(())
    }

    pub fn unfix(&mut self, index: &Index) -> ModelResult<()> {
        self.entry_mut(index)?.fixed = false;
        Ok(())
    }

    pub fn is_fixed(&self, index: &Index) -> bool {
        self.entries.get(index).is_some_and(|d| d.fixed)
    }

    /// Replace the index set, keeping data of surviving entries.
    pub fn reindex(&mut self, indices: impl IntoIterator<Item = Index>) {
        let mut old = std::mem::take(&mut self.entries);
        self.entries = indices
            .into_iter()
            .map(|i| {
                let data = old.remove(&i).unwrap_or_else(|| self.initial.clone());
                (i, data)
            })
            .collect();
    }
}

/// Equality constraint `lhs == rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Constraint {
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }

    pub fn residual(&self) -> Expr {
        self.lhs.clone() - self.rhs.clone()
    }
}

macro_rules! indexed_set {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            name: Arc<str>,
            entries: BTreeMap<Index, $item>,
        }

        impl $name {
            pub fn new(name: impl Into<Arc<str>>) -> Self {
                Self {
                    name: name.into(),
                    entries: BTreeMap::new(),
                }
            }

            pub fn name(&self) -> &str {
                &self.name
            }

            pub fn insert(&mut self, index: Index, item: $item) -> ModelResult<()> {
                if self.entries.contains_key(&index) {
                    return Err(ModelError::DuplicateIndex {
                        component: self.name.to_string(),
                        index: index.to_string(),
                    });
                }
                self.entries.insert(index, item);
                Ok(())
            }

            pub fn get(&self, index: &Index) -> Option<&$item> {
                self.entries.get(index)
            }

            pub fn contains(&self, index: &Index) -> bool {
                self.entries.contains_key(index)
            }

            pub fn len(&self) -> usize {
                self.entries.len()
            }

            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }

            pub fn indices(&self) -> impl Iterator<Item = &Index> {
                self.entries.keys()
            }

            pub fn iter(&self) -> impl Iterator<Item = (&Index, &$item)> {
                self.entries.iter()
            }
        }
    };
}

indexed_set!(
    /// Indexed family of equality constraints.
    ConstraintSet,
    Constraint
);

indexed_set!(
    /// Indexed family of named expressions.
    ExpressionSet,
    Expr
);

impl ExpressionSet {
    /// The expression at `index` as an owned tree.
    pub fn at(&self, index: &Index) -> ModelResult<Expr> {
        self.get(index).cloned().ok_or_else(|| ModelError::UnknownIndex {
            component: self.name.to_string(),
            index: index.to_string(),
        })
    }
}
