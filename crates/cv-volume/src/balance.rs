//! Arguments of the block factory and balance builders.

use cv_model::VarRef;

use crate::config::FlowDirection;

/// Location handed to user-supplied custom terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalancePoint<'a> {
    pub t: usize,
    /// Length position (1D only).
    pub x: Option<usize>,
    pub phase: Option<&'a str>,
    pub component: Option<&'a str>,
    pub element: Option<&'a str>,
}

/// User-supplied term added to a governing equation.
pub type TermFn<'a> = &'a dyn Fn(&BalancePoint<'_>) -> cv_model::Expr;

#[derive(Clone, Copy, Debug, Default)]
pub struct StateBlockArgs {
    /// Defaults to the volume's flow direction.
    pub information_flow: Option<FlowDirection>,
    /// Mandatory.
    pub has_phase_equilibrium: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReactionBlockArgs {
    /// Mandatory.
    pub has_equilibrium: Option<bool>,
}

#[derive(Clone, Copy, Default)]
pub struct MaterialBalanceArgs<'a> {
    pub has_rate_reactions: bool,
    pub has_equilibrium_reactions: bool,
    pub has_phase_equilibrium: bool,
    pub has_mass_transfer: bool,
    /// Molar-basis term per (phase, component) or component.
    pub custom_molar_term: Option<TermFn<'a>>,
    /// Mass-basis term per (phase, component) or component.
    pub custom_mass_term: Option<TermFn<'a>>,
    /// Term per element, for element balances.
    pub custom_elemental_term: Option<TermFn<'a>>,
}

#[derive(Clone, Copy, Default)]
pub struct EnergyBalanceArgs<'a> {
    pub has_heat_of_reaction: bool,
    pub has_heat_transfer: bool,
    pub has_work_transfer: bool,
    pub custom_term: Option<TermFn<'a>>,
}

#[derive(Clone, Copy, Default)]
pub struct MomentumBalanceArgs<'a> {
    pub has_pressure_change: bool,
    pub custom_term: Option<TermFn<'a>>,
}

/// State entries fixed by `initialize`, to be handed back to `release_state`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitFlags {
    pub(crate) fixed: Vec<((usize, usize), Vec<VarRef>)>,
}

impl InitFlags {
    pub fn is_empty(&self) -> bool {
        self.fixed.iter().all(|(_, v)| v.is_empty())
    }

    /// Total number of fixed entries.
    pub fn len(&self) -> usize {
        self.fixed.iter().map(|(_, v)| v.len()).sum()
    }
}
