//! Basis reconciliation between reaction rates, custom terms and the
//! property package's material flow basis.

use cv_core::{CvError, CvResult};
use cv_model::Expr;
use cv_props::{FlowBasis, ReactionBlock, StateBlock};

fn molecular_weight(state: &dyn StateBlock, component: &str) -> CvResult<Expr> {
    state.mw(component).ok_or_else(|| {
        CvError::not_supported(format!(
            "{}: molecular weight of '{component}' is needed for basis conversion",
            state.block().name()
        ))
    })
}

/// Factor converting reaction generation of `component` into the property basis.
pub fn rxn_rate_conversion(
    state: &dyn StateBlock,
    reaction: Option<&dyn ReactionBlock>,
    component: &str,
    has_rate_reactions: bool,
) -> CvResult<Expr> {
    if !has_rate_reactions {
        return Ok(Expr::one());
    }
    let reaction = reaction.ok_or_else(|| {
        CvError::config("rate reactions requested before reaction blocks were added")
    })?;
    let property_basis = state.material_flow_basis();
    let reaction_basis = reaction.reaction_rate_basis();
    match (property_basis, reaction_basis) {
        (FlowBasis::Other, _) => Err(CvError::config(
            "property package material flow basis is neither molar nor mass; \
             reaction rates cannot be converted",
        )),
        (_, FlowBasis::Other) => Err(CvError::config(
            "reaction package rate basis is neither molar nor mass; \
             reaction rates cannot be converted",
        )),
        (p, r) if p == r => Ok(Expr::one()),
        (FlowBasis::Molar, FlowBasis::Mass) => {
            Ok(Expr::one() / molecular_weight(state, component)?)
        }
        (FlowBasis::Mass, FlowBasis::Molar) => molecular_weight(state, component),
        (p, r) => Err(CvError::internal(format!(
            "unhandled basis pair {p:?}/{r:?}"
        ))),
    }
}

/// Express a molar-basis custom term in the property basis.
pub fn molar_term(state: &dyn StateBlock, component: &str, term: Expr) -> CvResult<Expr> {
    match state.material_flow_basis() {
        FlowBasis::Molar => Ok(term),
        FlowBasis::Mass => Ok(term * molecular_weight(state, component)?),
        FlowBasis::Other => Err(CvError::config(
            "custom_molar_term given but the property package flow basis is neither molar nor mass",
        )),
    }
}

/// Express a mass-basis custom term in the property basis.
pub fn mass_term(state: &dyn StateBlock, component: &str, term: Expr) -> CvResult<Expr> {
    match state.material_flow_basis() {
        FlowBasis::Molar => Ok(term / molecular_weight(state, component)?),
        FlowBasis::Mass => Ok(term),
        FlowBasis::Other => Err(CvError::config(
            "custom_mass_term given but the property package flow basis is neither molar nor mass",
        )),
    }
}
