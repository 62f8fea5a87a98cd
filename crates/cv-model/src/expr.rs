//! Expression trees over indexed variable references.
//!
//! Arithmetic operators fold constants eagerly so that factors of one and
//! empty sums do not clutter the assembled equations.

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::index::Index;

/// Reference to one entry of an indexed variable, by qualified name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarRef {
    pub name: Arc<str>,
    pub index: Index,
}

impl VarRef {
    pub fn new(name: impl Into<Arc<str>>, index: Index) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.index)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(VarRef),
    Sum(Vec<Expr>),
    Product(Box<Expr>, Box<Expr>),
    Quotient(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn zero() -> Self {
        Expr::Const(0.0)
    }

    pub fn one() -> Self {
        Expr::Const(1.0)
    }

    pub fn var(name: impl Into<Arc<str>>, index: Index) -> Self {
        Expr::Var(VarRef::new(name, index))
    }

    /// Fold an iterator of terms into a single sum.
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Self {
        terms.into_iter().fold(Expr::zero(), |acc, t| acc + t)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_const() == Some(0.0)
    }

    /// Evaluate with variable values supplied by `lookup`.
    ///
    /// Returns `None` when any referenced variable has no value.
    pub fn eval(&self, lookup: &dyn Fn(&VarRef) -> Option<f64>) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            Expr::Var(v) => lookup(v),
            Expr::Sum(terms) => terms.iter().try_fold(0.0, |acc, t| Some(acc + t.eval(lookup)?)),
            Expr::Product(a, b) => Some(a.eval(lookup)? * b.eval(lookup)?),
            Expr::Quotient(a, b) => Some(a.eval(lookup)? / b.eval(lookup)?),
            Expr::Neg(a) => Some(-a.eval(lookup)?),
        }
    }

    /// All variable references appearing in the expression.
    pub fn vars(&self) -> BTreeSet<VarRef> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut BTreeSet<VarRef>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(v) => {
                out.insert(v.clone());
            }
            Expr::Sum(terms) => terms.iter().for_each(|t| t.collect_vars(out)),
            Expr::Product(a, b) | Expr::Quotient(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Expr::Neg(a) => a.collect_vars(out),
        }
    }

    pub fn contains_var(&self, name: &str) -> bool {
        self.vars().iter().any(|v| &*v.name == name)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Const(v)
    }
}

impl From<VarRef> for Expr {
    fn from(v: VarRef) -> Self {
        Expr::Var(v)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
            (e, Expr::Const(c)) | (Expr::Const(c), e) if c == 0.0 => e,
            (Expr::Sum(mut a), Expr::Sum(b)) => {
                a.extend(b);
                Expr::Sum(a)
            }
            (Expr::Sum(mut a), e) => {
                a.push(e);
                Expr::Sum(a)
            }
            (e, Expr::Sum(mut b)) => {
                b.insert(0, e);
                Expr::Sum(b)
            }
            (a, b) => Expr::Sum(vec![a, b]),
        }
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
            (_, Expr::Const(c)) | (Expr::Const(c), _) if c == 0.0 => Expr::zero(),
            (e, Expr::Const(c)) | (Expr::Const(c), e) if c == 1.0 => e,
            (e, Expr::Const(c)) | (Expr::Const(c), e) if c == -1.0 => -e,
            (a, b) => Expr::Product(Box::new(a), Box::new(b)),
        }
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Const(a), Expr::Const(b)) if b != 0.0 => Expr::Const(a / b),
            (e, Expr::Const(c)) if c == 1.0 => e,
            (a, b) => Expr::Quotient(Box::new(a), Box::new(b)),
        }
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Const(c) => Expr::Const(-c),
            Expr::Neg(inner) => *inner,
            e => Expr::Neg(Box::new(e)),
        }
    }
}

impl Add<f64> for Expr {
    type Output = Expr;
    fn add(self, rhs: f64) -> Expr {
        self + Expr::Const(rhs)
    }
}

impl Mul<f64> for Expr {
    type Output = Expr;
    fn mul(self, rhs: f64) -> Expr {
        self * Expr::Const(rhs)
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Const(self) * rhs
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Sum(terms) => {
                write!(f, "(")?;
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
            Expr::Product(a, b) => write!(f, "{a}*{b}"),
            Expr::Quotient(a, b) => write!(f, "{a}/({b})"),
            Expr::Neg(a) => write!(f, "-{a}"),
        }
    }
}
