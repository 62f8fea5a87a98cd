//! cv-model: minimal symbolic-model runtime the control volumes emit into.
//!
//! Provides:
//! - Labels and composite indices (positions and names)
//! - Expression trees over indexed variable references
//! - Indexed variables (including derivative variables), constraints and expressions
//! - Named blocks that own components and merge atomically
//!
//! Nothing here solves equations.

pub mod block;
pub mod component;
pub mod error;
pub mod expr;
pub mod index;

pub use block::Block;
pub use component::{Constraint, ConstraintSet, DerivativeOf, Domain, ExpressionSet, Var, VarData};
pub use error::{ModelError, ModelResult};
pub use expr::{Expr, VarRef};
pub use index::{Index, Label};
