//! Balance assembly shared by the 0D and 1D control volumes.
//!
//! A builder validates the request, stages every new component into a scratch
//! block and returns it; the volume commits the block atomically. The
//! geometric variants plug in through [`Layout`].
//!
//! Governing equations take the form
//! `scale * accumulation == flow + scale * (generation + transfer + custom)`
//! where the accumulation side is zero for steady volumes, `scale` is the
//! volume length in 1D and one in 0D, and `flow` is inlet minus outlet (0D)
//! or the signed length derivative of the flow term (1D).

use std::collections::BTreeMap;

use cv_core::{CvError, CvResult};
use cv_model::{Block, Constraint, Domain, Expr, Index, Label};
use cv_props::{ReactionBlock, StateBlock};

use crate::base::{Point, VolumeCore};
use crate::validate::{Capability, Flag};

pub(crate) mod energy;
pub(crate) mod material;
pub(crate) mod momentum;

/// Geometric variant seen by the assembler.
pub(crate) trait Layout {
    fn core(&self) -> &VolumeCore;

    /// Every index point.
    fn points(&self) -> Vec<Point>;

    /// Points carrying governing equations (the defined-state point excluded).
    fn balance_points(&self) -> Vec<Point>;

    fn has_geometry(&self) -> bool;

    /// Volume (0D) or cross-sectional area (1D) at `p`.
    fn geometry_factor(&self, p: Point) -> CvResult<Expr>;

    fn generation_scale(&self) -> CvResult<Expr>;

    /// State describing the volume contents at `p`, also paired with reactions.
    fn state_at(&self, p: Point) -> CvResult<&dyn StateBlock>;

    fn reaction_block(&self, p: Point) -> Option<&dyn ReactionBlock>;

    /// Net inflow per balance point and axis, keyed by the full index.
    fn flow_terms(
        &self,
        staged: &mut Block,
        spec: &FlowSpec<'_>,
    ) -> CvResult<BTreeMap<Index, Expr>>;
}

pub(crate) type Accessor<'a> = &'a dyn Fn(&dyn StateBlock, &Index) -> CvResult<Expr>;

/// A flowing quantity and the names of its 1D auxiliaries.
pub(crate) struct FlowSpec<'a> {
    pub var: &'static str,
    pub linking: &'static str,
    pub dx: &'static str,
    pub axes: &'a [Index],
    pub accessor: Accessor<'a>,
}

pub(crate) fn available<L: Layout>(layout: &L, cap: Capability) -> bool {
    let core = layout.core();
    let property = &core.packages.property;
    let reactions = core.packages.reaction.as_ref();
    match cap {
        Capability::StateBlocks => core.state_phase_equilibrium.is_some(),
        Capability::ReactionPackage => reactions.is_some(),
        Capability::ReactionBlocks => core.reaction_equilibrium.is_some(),
        Capability::ReactionBlocksWithEquilibrium => core.reaction_equilibrium == Some(true),
        Capability::RateReactionIndex => reactions.is_some_and(|r| r.rate_reactions().is_some()),
        Capability::EquilibriumReactionIndex => {
            reactions.is_some_and(|r| r.equilibrium_reactions().is_some())
        }
        Capability::StateBlocksWithPhaseEquilibrium => core.state_phase_equilibrium == Some(true),
        Capability::PhaseEquilibriumIndex => property.phase_equilibrium().is_some(),
        Capability::ElementComposition => {
            property.capabilities().element_composition && property.elements().is_some()
        }
        Capability::VolumeGeometry => layout.has_geometry(),
        Capability::ReactionExtents => {
            core.block.has_component("rate_reaction_extent")
                || core.block.has_component("equilibrium_reaction_extent")
        }
        Capability::HeatOfReactionData => {
            reactions.is_some_and(|r| r.capabilities().heat_of_reaction)
        }
        Capability::Pressure => property.capabilities().pressure,
    }
}

pub(crate) fn validate<L: Layout>(
    layout: &L,
    rules: &[crate::validate::Rule],
    mut requested: Vec<Flag>,
) -> CvResult<()> {
    let core = layout.core();
    if core.has_holdup {
        requested.push(Flag::Holdup);
    }
    crate::validate::check(core.name(), rules, &requested, |c| available(layout, c))
}

/// Every point index extended by every axis.
pub(crate) fn product(points: &[Point], axes: &[Index]) -> Vec<Index> {
    points
        .iter()
        .flat_map(|p| axes.iter().map(move |a| p.with(a)))
        .collect()
}

/// Reference to `local[index]` on the volume block, staged or committed.
pub(crate) fn var(block: &Block, local: &str, index: Index) -> Expr {
    Expr::var(block.qualify(local), index)
}

/// Resolve a component that may live on the committed block or the staged one.
pub(crate) fn term(core: &Block, staged: &Block, local: &str, index: &Index) -> CvResult<Expr> {
    if staged.has_component(local) {
        Ok(staged.term(local, index)?)
    } else {
        Ok(core.term(local, index)?)
    }
}

pub(crate) fn add_constraints(
    staged: &mut Block,
    local: &str,
    entries: Vec<(Index, Constraint)>,
) -> CvResult<()> {
    let set = staged.add_constraints(local)?;
    for (i, c) in entries {
        set.insert(i, c)?;
    }
    Ok(())
}

pub(crate) fn label(index: &Index, i: usize) -> CvResult<&str> {
    index
        .name(i)
        .ok_or_else(|| CvError::internal(format!("index {index} has no name at position {i}")))
}

pub(crate) fn named(values: &[String]) -> Vec<Index> {
    values.iter().map(|v| Index(vec![Label::from(v)])).collect()
}

/// Stage phase fractions unless an earlier balance already did.
///
/// Several phases get a variable summing to one per point; a single phase
/// gets the constant expression one.
pub(crate) fn stage_phase_fraction<L: Layout>(layout: &L, staged: &mut Block) -> CvResult<()> {
    let core = layout.core();
    if core.block.has_component("phase_fraction") || staged.has_component("phase_fraction") {
        return Ok(());
    }
    let points = layout.points();
    let phases = named(core.phases());
    if phases.len() > 1 {
        staged.add_var("phase_fraction", product(&points, &phases))?;
        let entries = points
            .iter()
            .map(|p| {
                let total = Expr::sum(phases.iter().map(|ph| var(staged, "phase_fraction", p.with(ph))));
                (p.index(), Constraint::eq(total, Expr::one()))
            })
            .collect();
        add_constraints(staged, "sum_of_phase_fractions", entries)?;
    } else {
        let set = staged.add_expressions("phase_fraction")?;
        for i in product(&points, &phases) {
            set.insert(i, Expr::one())?;
        }
    }
    Ok(())
}

pub(crate) fn phase_fraction<L: Layout>(
    layout: &L,
    staged: &Block,
    p: Point,
    phase: &str,
) -> CvResult<Expr> {
    term(
        &layout.core().block,
        staged,
        "phase_fraction",
        &p.with(&Index(vec![Label::from(phase)])),
    )
}

/// Names of a holdup family.
pub(crate) struct HoldupNames {
    pub holdup: &'static str,
    pub calculation: &'static str,
    pub accumulation: &'static str,
}

/// Stage holdup, its defining constraint and (dynamic only) the accumulation
/// derivative. `content` returns the phase-fraction-weighted density at a
/// point for one axis.
pub(crate) fn stage_holdup<L: Layout>(
    layout: &L,
    staged: &mut Block,
    names: &HoldupNames,
    axes: &[Index],
    content: &dyn Fn(Point, &Index, &Block) -> CvResult<Expr>,
) -> CvResult<()> {
    let core = layout.core();
    let points = layout.points();
    let indices = product(&points, axes);
    staged.add_var(names.holdup, indices.clone())?;
    let mut entries = Vec::with_capacity(indices.len());
    for p in &points {
        let factor = layout.geometry_factor(*p)?;
        for a in axes {
            let i = p.with(a);
            let rhs = factor.clone() * content(*p, a, staged)?;
            entries.push((i.clone(), Constraint::eq(var(staged, names.holdup, i), rhs)));
        }
    }
    add_constraints(staged, names.calculation, entries)?;
    if core.dynamic {
        staged.add_derivative_var(names.accumulation, names.holdup, Domain::Time, indices)?;
    }
    Ok(())
}

/// Assemble `scale * Σ acc == Σ flow + scale * source` at one balance index.
pub(crate) fn governing(
    dynamic: bool,
    scale: &Expr,
    accumulation: Expr,
    flow: Expr,
    source: Expr,
) -> Constraint {
    let lhs = if dynamic {
        scale.clone() * accumulation
    } else {
        Expr::zero()
    };
    Constraint::eq(lhs, flow + scale.clone() * source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_orders_points_then_axes() {
        let pts = [Point { t: 0, x: Some(1) }, Point { t: 0, x: Some(2) }];
        let axes = named(&["a".to_string(), "b".to_string()]);
        let idx = product(&pts, &axes);
        assert_eq!(idx.len(), 4);
        assert_eq!(idx[1].to_string(), "[0,1,b]");
        assert_eq!(idx[2].to_string(), "[0,2,a]");
    }

    #[test]
    fn steady_governing_has_zero_lhs() {
        let c = governing(false, &Expr::one(), Expr::Const(5.0), Expr::Const(1.0), Expr::Const(2.0));
        assert!(c.lhs.is_zero());
        assert_eq!(c.rhs.as_const(), Some(3.0));
        let c = governing(true, &Expr::Const(2.0), Expr::Const(5.0), Expr::zero(), Expr::zero());
        assert_eq!(c.lhs.as_const(), Some(10.0));
    }
}
