//! Property and reaction package traits.
//!
//! A package declares what it can provide once, through its capability
//! summary, and exposes optional accessors that return `None` when a
//! quantity is not offered. Control volumes never probe for attributes.

use std::collections::BTreeMap;

use cv_model::{Block, Expr, VarRef};

use crate::basis::{FlowBasis, PhaseEquilibrium};
use crate::config::{ReactionConfig, StateArgs, StateConfig};
use crate::error::PropsResult;

/// Optional features of a property package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyCapabilities {
    pub element_composition: bool,
    pub phase_equilibrium: bool,
    pub molecular_weight: bool,
    pub pressure: bool,
}

/// Optional features of a reaction package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReactionCapabilities {
    pub rate_reactions: bool,
    pub equilibrium_reactions: bool,
    pub heat_of_reaction: bool,
}

/// Thermophysical property package.
///
/// Implementations must be thread-safe (Send + Sync) so one package can be
/// shared by many control volumes.
pub trait PropertyPackage: Send + Sync {
    fn name(&self) -> &str;

    fn phases(&self) -> &[String];

    fn components(&self) -> &[String];

    /// Element set, when the package maps components onto elements.
    fn elements(&self) -> Option<&[String]>;

    /// Atoms of `element` per unit of `component`.
    fn element_composition(&self, component: &str, element: &str) -> Option<f64>;

    /// Phase-equilibrium index, when the package offers one.
    fn phase_equilibrium(&self) -> Option<&[PhaseEquilibrium]>;

    fn capabilities(&self) -> PropertyCapabilities;

    /// Create the state block for one index point.
    fn build_state(&self, name: &str, config: StateConfig) -> PropsResult<Box<dyn StateBlock>>;
}

/// Thermodynamic state at one index point.
pub trait StateBlock: Send + Sync {
    fn block(&self) -> &Block;

    fn block_mut(&mut self) -> &mut Block;

    fn config(&self) -> &StateConfig;

    fn material_flow_term(&self, phase: &str, component: &str) -> PropsResult<Expr>;

    fn material_density_term(&self, phase: &str, component: &str) -> PropsResult<Expr>;

    fn enthalpy_flow_term(&self, phase: &str) -> PropsResult<Expr>;

    fn enthalpy_density_term(&self, phase: &str) -> PropsResult<Expr>;

    fn material_flow_basis(&self) -> FlowBasis;

    fn pressure(&self) -> Option<Expr>;

    /// Molecular weight of `component`.
    fn mw(&self, component: &str) -> Option<Expr>;

    /// Variables that fully define the state, keyed by port member name.
    fn define_state_vars(&self) -> BTreeMap<String, Vec<VarRef>>;

    fn model_check(&self) -> PropsResult<()>;

    /// Apply initial guesses. With `hold_state`, also fix the state
    /// variables and return the entries that were fixed here.
    fn initialize(&mut self, args: &StateArgs, hold_state: bool) -> PropsResult<Vec<VarRef>>;

    /// Unfix entries previously returned by `initialize`.
    fn release_state(&mut self, fixed: &[VarRef]) -> PropsResult<()>;
}

/// Reaction package bound to a property package.
pub trait ReactionPackage: Send + Sync {
    fn name(&self) -> &str;

    fn rate_reactions(&self) -> Option<&[String]>;

    fn equilibrium_reactions(&self) -> Option<&[String]>;

    /// Stoichiometric coefficient of `(phase, component)` in `reaction` (zero when absent).
    fn stoichiometry(&self, reaction: &str, phase: &str, component: &str) -> f64;

    fn capabilities(&self) -> ReactionCapabilities;

    fn build_reaction(
        &self,
        name: &str,
        config: ReactionConfig,
        state: &dyn StateBlock,
    ) -> PropsResult<Box<dyn ReactionBlock>>;
}

/// Reaction kinetics at one index point.
pub trait ReactionBlock: Send + Sync {
    fn block(&self) -> &Block;

    fn block_mut(&mut self) -> &mut Block;

    fn config(&self) -> &ReactionConfig;

    /// Rate of `reaction` at this point. Control volumes only create the
    /// extents; the unit model relates them to this rate.
    fn reaction_rate(&self, reaction: &str) -> PropsResult<Expr>;

    fn reaction_rate_basis(&self) -> FlowBasis;

    /// Heat of reaction for `reaction`, when the package provides it.
    fn dh_rxn(&self, reaction: &str) -> Option<Expr>;

    fn model_check(&self) -> PropsResult<()>;

    fn initialize(&mut self) -> PropsResult<()>;
}
