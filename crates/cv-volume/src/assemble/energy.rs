//! Total enthalpy balance.

use cv_core::{CvError, CvResult};
use cv_model::{Block, Expr, Index, Label};

use super::{
    FlowSpec, HoldupNames, Layout, add_constraints, governing, label, named, phase_fraction,
    stage_holdup, stage_phase_fraction, term, validate, var,
};
use crate::balance::{BalancePoint, EnergyBalanceArgs};
use crate::base::Point;
use crate::validate::{Flag, TOTAL_ENTHALPY};

const ENTHALPY_HOLDUP: HoldupNames = HoldupNames {
    holdup: "enthalpy_holdup",
    calculation: "enthalpy_holdup_calculation",
    accumulation: "enthalpy_accumulation",
};

fn flags(args: &EnergyBalanceArgs<'_>) -> Vec<Flag> {
    [
        (args.has_heat_of_reaction, Flag::HeatOfReaction),
        (args.has_heat_transfer, Flag::HeatTransfer),
        (args.has_work_transfer, Flag::WorkTransfer),
        (args.custom_term.is_some(), Flag::CustomTerm),
    ]
    .into_iter()
    .filter_map(|(on, flag)| on.then_some(flag))
    .collect()
}

/// `-Σ extent * dh_rxn` over the rate and equilibrium extents staged by an
/// earlier material balance.
fn stage_heat_of_reaction<L: Layout>(layout: &L, staged: &mut Block) -> CvResult<()> {
    let core = layout.core();
    let package = core.packages.reaction.as_ref().ok_or_else(|| {
        CvError::config(format!("{}: no reaction package is bound", core.name()))
    })?;
    let mut families: Vec<(&str, &[String])> = Vec::new();
    if core.block.has_component("rate_reaction_extent") {
        if let Some(r) = package.rate_reactions() {
            families.push(("rate_reaction_extent", r));
        }
    }
    if core.block.has_component("equilibrium_reaction_extent") {
        if let Some(r) = package.equilibrium_reactions() {
            families.push(("equilibrium_reaction_extent", r));
        }
    }
    let mut entries = Vec::new();
    for p in layout.points() {
        let block = layout.reaction_block(p).ok_or_else(|| {
            CvError::config(format!(
                "{}: heat of reaction requested before reaction blocks were added",
                core.name()
            ))
        })?;
        let mut terms = Vec::new();
        for (extent, reactions) in &families {
            for r in reactions.iter() {
                let dh = block.dh_rxn(r).ok_or_else(|| {
                    CvError::not_supported(format!(
                        "{}: reaction package provides no heat of reaction for '{r}'",
                        core.name()
                    ))
                })?;
                let i = p.with(&Index(vec![Label::from(r)]));
                terms.push(core.block.term(extent, &i)? * dh);
            }
        }
        entries.push((p.index(), -Expr::sum(terms)));
    }
    let set = staged.add_expressions("heat_of_reaction")?;
    for (i, e) in entries {
        set.insert(i, e)?;
    }
    Ok(())
}

/// One balance per balance point, summed over phases.
pub(crate) fn total_enthalpy<L: Layout>(
    layout: &L,
    args: &EnergyBalanceArgs<'_>,
) -> CvResult<Block> {
    validate(layout, TOTAL_ENTHALPY, flags(args))?;
    let core = layout.core();
    let mut staged = core.block.scratch();
    let phases = named(core.phases());

    let accessor = |state: &dyn cv_props::StateBlock, a: &Index| -> CvResult<Expr> {
        Ok(state.enthalpy_flow_term(label(a, 0)?)?)
    };
    let flows = layout.flow_terms(
        &mut staged,
        &FlowSpec {
            var: "_enthalpy_flow",
            linking: "enthalpy_flow_linking_constraint",
            dx: "enthalpy_flow_dx",
            axes: &phases,
            accessor: &accessor,
        },
    )?;

    if core.has_holdup {
        stage_phase_fraction(layout, &mut staged)?;
        let content = |p: Point, a: &Index, staged: &Block| -> CvResult<Expr> {
            let ph = label(a, 0)?;
            let density = layout.state_at(p)?.enthalpy_density_term(ph)?;
            Ok(phase_fraction(layout, staged, p, ph)? * density)
        };
        stage_holdup(layout, &mut staged, &ENTHALPY_HOLDUP, &phases, &content)?;
    }

    let points = layout.points();
    let point_index: Vec<Index> = points.iter().map(|p| p.index()).collect();
    if args.has_heat_transfer {
        staged.add_var("heat", point_index.clone())?;
    }
    if args.has_work_transfer {
        staged.add_var("work", point_index)?;
    }
    if args.has_heat_of_reaction {
        stage_heat_of_reaction(layout, &mut staged)?;
    }

    let scale = layout.generation_scale()?;
    let mut entries = Vec::new();
    for p in layout.balance_points() {
        let mut acc = Vec::new();
        let mut flow = Vec::new();
        for a in &phases {
            let i = p.with(a);
            if core.dynamic {
                acc.push(var(&staged, ENTHALPY_HOLDUP.accumulation, i.clone()));
            }
            flow.push(
                flows
                    .get(&i)
                    .cloned()
                    .ok_or_else(|| CvError::internal(format!("no enthalpy flow at {i}")))?,
            );
        }
        let mut source = Vec::new();
        if args.has_heat_transfer {
            source.push(var(&staged, "heat", p.index()));
        }
        if args.has_work_transfer {
            source.push(var(&staged, "work", p.index()));
        }
        if args.has_heat_of_reaction {
            source.push(term(&core.block, &staged, "heat_of_reaction", &p.index())?);
        }
        if let Some(f) = args.custom_term {
            source.push(f(&BalancePoint {
                t: p.t,
                x: p.x,
                phase: None,
                component: None,
                element: None,
            }));
        }
        let c = governing(
            core.dynamic,
            &scale,
            Expr::sum(acc),
            Expr::sum(flow),
            Expr::sum(source),
        );
        entries.push((p.index(), c));
    }
    add_constraints(&mut staged, "enthalpy_balances", entries)?;
    Ok(staged)
}
