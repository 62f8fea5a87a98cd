//! Declarative validation of balance requests.
//!
//! Every builder owns a rule table. A rule fires when its triggering flag is
//! requested (or always, without a flag) and either demands a capability or
//! forbids the flag outright. Capability gaps of a bound package are reported
//! as `PropertyNotSupported`; inconsistent requests as `Configuration`.
//! Rules are checked in table order before anything is staged.

use cv_core::{CvError, CvResult, ErrorKind};
use tracing::debug;

/// Caller request that introduces a class of terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    RateReactions,
    EquilibriumReactions,
    PhaseEquilibrium,
    MassTransfer,
    CustomMolarTerm,
    CustomMassTerm,
    CustomElementalTerm,
    HeatOfReaction,
    HeatTransfer,
    WorkTransfer,
    PressureChange,
    CustomTerm,
    /// Set by the volume itself when `has_holdup` is true.
    Holdup,
}

/// Something a rule can require of the volume or its packages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    StateBlocks,
    ReactionPackage,
    ReactionBlocks,
    ReactionBlocksWithEquilibrium,
    RateReactionIndex,
    EquilibriumReactionIndex,
    StateBlocksWithPhaseEquilibrium,
    PhaseEquilibriumIndex,
    ElementComposition,
    VolumeGeometry,
    ReactionExtents,
    HeatOfReactionData,
    Pressure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Check {
    Requires(Capability),
    Forbidden,
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub when: Option<Flag>,
    pub check: Check,
    pub kind: ErrorKind,
    pub what: &'static str,
}

const fn rule(when: Option<Flag>, check: Check, kind: ErrorKind, what: &'static str) -> Rule {
    Rule {
        when,
        check,
        kind,
        what,
    }
}

use Capability as C;
use Check::{Forbidden, Requires};
use Flag as F;

const CONFIG: ErrorKind = ErrorKind::Configuration;
const PNS: ErrorKind = ErrorKind::PropertyNotSupported;

const STATE_BLOCKS: Rule = rule(
    None,
    Requires(C::StateBlocks),
    CONFIG,
    "state blocks must be added before balances",
);

const HOLDUP_GEOMETRY: Rule = rule(
    Some(F::Holdup),
    Requires(C::VolumeGeometry),
    CONFIG,
    "holdup terms require geometry; call add_geometry first",
);

const RATE_REACTIONS: [Rule; 3] = [
    rule(
        Some(F::RateReactions),
        Requires(C::ReactionPackage),
        CONFIG,
        "rate reactions requested but no reaction package is bound",
    ),
    rule(
        Some(F::RateReactions),
        Requires(C::ReactionBlocks),
        CONFIG,
        "rate reactions requested before reaction blocks were added",
    ),
    rule(
        Some(F::RateReactions),
        Requires(C::RateReactionIndex),
        PNS,
        "reaction package does not define rate reactions",
    ),
];

const EQUILIBRIUM_REACTIONS: [Rule; 4] = [
    rule(
        Some(F::EquilibriumReactions),
        Requires(C::ReactionPackage),
        CONFIG,
        "equilibrium reactions requested but no reaction package is bound",
    ),
    rule(
        Some(F::EquilibriumReactions),
        Requires(C::ReactionBlocks),
        CONFIG,
        "equilibrium reactions requested before reaction blocks were added",
    ),
    rule(
        Some(F::EquilibriumReactions),
        Requires(C::ReactionBlocksWithEquilibrium),
        CONFIG,
        "equilibrium reactions requested but reaction blocks were built with has_equilibrium=false",
    ),
    rule(
        Some(F::EquilibriumReactions),
        Requires(C::EquilibriumReactionIndex),
        PNS,
        "reaction package does not define equilibrium reactions",
    ),
];

const PHASE_EQUILIBRIUM_ACTIVE: Rule = rule(
    Some(F::PhaseEquilibrium),
    Requires(C::StateBlocksWithPhaseEquilibrium),
    CONFIG,
    "phase equilibrium requested but state blocks were built with has_phase_equilibrium=false",
);

const PHASE_EQUILIBRIUM_INDEX: Rule = rule(
    Some(F::PhaseEquilibrium),
    Requires(C::PhaseEquilibriumIndex),
    PNS,
    "property package does not define a phase equilibrium index",
);

const NO_ELEMENTAL_TERM: Rule = rule(
    Some(F::CustomElementalTerm),
    Forbidden,
    CONFIG,
    "custom_elemental_term only applies to element balances",
);

pub const PHASE_COMPONENT: &[Rule] = &[
    STATE_BLOCKS,
    HOLDUP_GEOMETRY,
    RATE_REACTIONS[0],
    RATE_REACTIONS[1],
    RATE_REACTIONS[2],
    EQUILIBRIUM_REACTIONS[0],
    EQUILIBRIUM_REACTIONS[1],
    EQUILIBRIUM_REACTIONS[2],
    EQUILIBRIUM_REACTIONS[3],
    PHASE_EQUILIBRIUM_ACTIVE,
    PHASE_EQUILIBRIUM_INDEX,
    NO_ELEMENTAL_TERM,
];

/// Phase-equilibrium terms cancel in the sum over phases, so only the
/// activation is checked.
pub const TOTAL_COMPONENT: &[Rule] = &[
    STATE_BLOCKS,
    HOLDUP_GEOMETRY,
    RATE_REACTIONS[0],
    RATE_REACTIONS[1],
    RATE_REACTIONS[2],
    EQUILIBRIUM_REACTIONS[0],
    EQUILIBRIUM_REACTIONS[1],
    EQUILIBRIUM_REACTIONS[2],
    EQUILIBRIUM_REACTIONS[3],
    PHASE_EQUILIBRIUM_ACTIVE,
    NO_ELEMENTAL_TERM,
];

pub const TOTAL_ELEMENT: &[Rule] = &[
    STATE_BLOCKS,
    rule(
        Some(F::RateReactions),
        Forbidden,
        CONFIG,
        "element balances do not support rate reactions",
    ),
    rule(
        Some(F::EquilibriumReactions),
        Forbidden,
        CONFIG,
        "element balances do not support equilibrium reactions",
    ),
    rule(
        Some(F::PhaseEquilibrium),
        Forbidden,
        CONFIG,
        "element balances do not support phase equilibrium",
    ),
    rule(
        Some(F::CustomMolarTerm),
        Forbidden,
        CONFIG,
        "element balances take custom_elemental_term, not custom_molar_term",
    ),
    rule(
        Some(F::CustomMassTerm),
        Forbidden,
        CONFIG,
        "element balances take custom_elemental_term, not custom_mass_term",
    ),
    rule(
        None,
        Requires(C::ElementComposition),
        PNS,
        "property package does not define an element composition",
    ),
    HOLDUP_GEOMETRY,
];

pub const TOTAL_ENTHALPY: &[Rule] = &[
    STATE_BLOCKS,
    HOLDUP_GEOMETRY,
    rule(
        Some(F::HeatOfReaction),
        Requires(C::ReactionExtents),
        CONFIG,
        "heat of reaction requires a material balance with rate or equilibrium reactions",
    ),
    rule(
        Some(F::HeatOfReaction),
        Requires(C::HeatOfReactionData),
        PNS,
        "reaction package does not provide heats of reaction",
    ),
];

pub const TOTAL_PRESSURE: &[Rule] = &[
    STATE_BLOCKS,
    rule(
        None,
        Requires(C::Pressure),
        PNS,
        "property package does not expose pressure",
    ),
];

fn error(kind: ErrorKind, what: String) -> CvError {
    match kind {
        ErrorKind::Configuration => CvError::Configuration { what },
        ErrorKind::PropertyNotSupported => CvError::PropertyNotSupported { what },
        ErrorKind::BalanceTypeNotSupported => CvError::BalanceTypeNotSupported { what },
        ErrorKind::Internal => CvError::Internal { what },
    }
}

/// Evaluate `rules` in order; the first failing rule is reported.
pub fn check(
    cv: &str,
    rules: &[Rule],
    requested: &[Flag],
    available: impl Fn(Capability) -> bool,
) -> CvResult<()> {
    for r in rules {
        if let Some(flag) = r.when {
            if !requested.contains(&flag) {
                continue;
            }
        }
        let ok = match r.check {
            Requires(cap) => available(cap),
            Forbidden => false,
        };
        if !ok {
            debug!(cv, rule = r.what, "request rejected");
            return Err(error(r.kind, format!("{cv}: {}", r.what)));
        }
    }
    Ok(())
}
