//! Material balances: per phase and component, per component, per element.

use cv_core::{CvError, CvResult};
use cv_model::{Block, Expr, Index, Label};

use super::{
    FlowSpec, HoldupNames, Layout, add_constraints, governing, label, named, phase_fraction,
    product, stage_holdup, stage_phase_fraction, validate, var,
};
use crate::balance::{BalancePoint, MaterialBalanceArgs};
use crate::base::Point;
use crate::conversion::{mass_term, molar_term, rxn_rate_conversion};
use crate::validate::{Flag, PHASE_COMPONENT, TOTAL_COMPONENT, TOTAL_ELEMENT};

const MATERIAL_FLOW: (&str, &str, &str) = (
    "_flow_terms",
    "material_flow_linking_constraints",
    "material_flow_dx",
);

const MATERIAL_HOLDUP: HoldupNames = HoldupNames {
    holdup: "material_holdup",
    calculation: "material_holdup_calculation",
    accumulation: "material_accumulation",
};

const ELEMENT_HOLDUP: HoldupNames = HoldupNames {
    holdup: "element_holdup",
    calculation: "elemental_holdup_calculation",
    accumulation: "element_accumulation",
};

fn flags(args: &MaterialBalanceArgs<'_>) -> Vec<Flag> {
    let mut out = Vec::new();
    let pairs = [
        (args.has_rate_reactions, Flag::RateReactions),
        (args.has_equilibrium_reactions, Flag::EquilibriumReactions),
        (args.has_phase_equilibrium, Flag::PhaseEquilibrium),
        (args.has_mass_transfer, Flag::MassTransfer),
        (args.custom_molar_term.is_some(), Flag::CustomMolarTerm),
        (args.custom_mass_term.is_some(), Flag::CustomMassTerm),
        (args.custom_elemental_term.is_some(), Flag::CustomElementalTerm),
    ];
    for (on, flag) in pairs {
        if on {
            out.push(flag);
        }
    }
    out
}

fn single(name: &str) -> Index {
    Index(vec![Label::from(name)])
}

fn accumulation(dynamic: bool, staged: &Block, local: &str, index: Index) -> Expr {
    if dynamic {
        var(staged, local, index)
    } else {
        Expr::zero()
    }
}

fn material_flows<L: Layout>(
    layout: &L,
    staged: &mut Block,
    axes: &[Index],
) -> CvResult<std::collections::BTreeMap<Index, Expr>> {
    let accessor = |state: &dyn cv_props::StateBlock, a: &Index| -> CvResult<Expr> {
        Ok(state.material_flow_term(label(a, 0)?, label(a, 1)?)?)
    };
    let (var, linking, dx) = MATERIAL_FLOW;
    layout.flow_terms(
        staged,
        &FlowSpec {
            var,
            linking,
            dx,
            axes,
            accessor: &accessor,
        },
    )
}

fn material_holdup<L: Layout>(layout: &L, staged: &mut Block, axes: &[Index]) -> CvResult<()> {
    stage_phase_fraction(layout, staged)?;
    let content = |p: Point, a: &Index, staged: &Block| -> CvResult<Expr> {
        let (ph, j) = (label(a, 0)?, label(a, 1)?);
        let density = layout.state_at(p)?.material_density_term(ph, j)?;
        Ok(phase_fraction(layout, staged, p, ph)? * density)
    };
    stage_holdup(layout, staged, &MATERIAL_HOLDUP, axes, &content)
}

/// Stage `{prefix}_generation[.., p, j]`, `{prefix}_extent[.., r]` and the
/// stoichiometric link between them over every point.
fn stage_reaction_family<L: Layout>(
    layout: &L,
    staged: &mut Block,
    prefix: &str,
    reactions: &[String],
    axes: &[Index],
) -> CvResult<()> {
    let core = layout.core();
    let package = core.packages.reaction.as_ref().ok_or_else(|| {
        CvError::config(format!("{}: no reaction package is bound", core.name()))
    })?;
    let points = layout.points();
    let generation = format!("{prefix}_generation");
    let extent = format!("{prefix}_extent");
    staged.add_var(&generation, product(&points, axes))?;
    staged.add_var(&extent, product(&points, &named(reactions)))?;
    let mut entries = Vec::new();
    for p in &points {
        for a in axes {
            let (ph, j) = (label(a, 0)?, label(a, 1)?);
            let produced = Expr::sum(reactions.iter().filter_map(|r| {
                let nu = package.stoichiometry(r, ph, j);
                (nu != 0.0).then(|| nu * var(staged, &extent, p.with(&single(r))))
            }));
            entries.push((
                p.with(a),
                cv_model::Constraint::eq(var(staged, &generation, p.with(a)), produced),
            ));
        }
    }
    add_constraints(staged, &format!("{prefix}_stoichiometry_constraint"), entries)
}

fn stage_generation<L: Layout>(
    layout: &L,
    staged: &mut Block,
    args: &MaterialBalanceArgs<'_>,
    axes: &[Index],
    with_phase_equilibrium: bool,
) -> CvResult<()> {
    let core = layout.core();
    let reactions = core.packages.reaction.as_ref();
    if args.has_rate_reactions {
        let names = reactions
            .and_then(|r| r.rate_reactions())
            .ok_or_else(|| CvError::not_supported("rate reaction index is undefined"))?
            .to_vec();
        stage_reaction_family(layout, staged, "rate_reaction", &names, axes)?;
    }
    if args.has_equilibrium_reactions {
        let names = reactions
            .and_then(|r| r.equilibrium_reactions())
            .ok_or_else(|| CvError::not_supported("equilibrium reaction index is undefined"))?
            .to_vec();
        stage_reaction_family(layout, staged, "equilibrium_reaction", &names, axes)?;
    }
    if with_phase_equilibrium && args.has_phase_equilibrium {
        let index = core
            .packages
            .property
            .phase_equilibrium()
            .ok_or_else(|| CvError::not_supported("phase equilibrium index is undefined"))?;
        let names: Vec<Index> = index.iter().map(|pe| single(&pe.name)).collect();
        staged.add_var("phase_equilibrium_generation", product(&layout.points(), &names))?;
    }
    if args.has_mass_transfer {
        staged.add_var("mass_transfer_term", product(&layout.points(), axes))?;
    }
    Ok(())
}

/// Generation of `(phase, component)` at `p`, in the property basis and per
/// unit length in 1D.
fn species_source<L: Layout>(
    layout: &L,
    staged: &Block,
    args: &MaterialBalanceArgs<'_>,
    p: Point,
    axis: &Index,
    with_phase_equilibrium: bool,
) -> CvResult<Expr> {
    let (ph, j) = (label(axis, 0)?, label(axis, 1)?);
    let i = p.with(axis);
    let mut terms = Vec::new();
    if args.has_rate_reactions {
        let conversion = rxn_rate_conversion(
            layout.state_at(p)?,
            layout.reaction_block(p),
            j,
            args.has_rate_reactions,
        )?;
        terms.push(var(staged, "rate_reaction_generation", i.clone()) * conversion);
    }
    if args.has_equilibrium_reactions {
        terms.push(var(staged, "equilibrium_reaction_generation", i.clone()));
    }
    if with_phase_equilibrium && args.has_phase_equilibrium {
        if let Some(index) = layout.core().packages.property.phase_equilibrium() {
            for pe in index {
                let sign = pe.sign(ph, j);
                if sign != 0.0 {
                    terms.push(
                        sign * var(staged, "phase_equilibrium_generation", p.with(&single(&pe.name))),
                    );
                }
            }
        }
    }
    if args.has_mass_transfer {
        terms.push(var(staged, "mass_transfer_term", i));
    }
    Ok(Expr::sum(terms))
}

fn custom_material<L: Layout>(
    layout: &L,
    args: &MaterialBalanceArgs<'_>,
    p: Point,
    phase: Option<&str>,
    component: &str,
) -> CvResult<Expr> {
    if args.custom_molar_term.is_none() && args.custom_mass_term.is_none() {
        return Ok(Expr::zero());
    }
    let at = BalancePoint {
        t: p.t,
        x: p.x,
        phase,
        component: Some(component),
        element: None,
    };
    let state = layout.state_at(p)?;
    let mut total = Expr::zero();
    if let Some(f) = args.custom_molar_term {
        total = total + molar_term(state, component, f(&at))?;
    }
    if let Some(f) = args.custom_mass_term {
        total = total + mass_term(state, component, f(&at))?;
    }
    Ok(total)
}

fn flow_at(flows: &std::collections::BTreeMap<Index, Expr>, index: &Index) -> CvResult<Expr> {
    flows
        .get(index)
        .cloned()
        .ok_or_else(|| CvError::internal(format!("no flow term at {index}")))
}

/// One balance per phase, component and balance point.
pub(crate) fn phase_component<L: Layout>(
    layout: &L,
    args: &MaterialBalanceArgs<'_>,
) -> CvResult<Block> {
    validate(layout, PHASE_COMPONENT, flags(args))?;
    let core = layout.core();
    let mut staged = core.block.scratch();
    let axes = core.phase_component_axes();
    let flows = material_flows(layout, &mut staged, &axes)?;
    if core.has_holdup {
        material_holdup(layout, &mut staged, &axes)?;
    }
    stage_generation(layout, &mut staged, args, &axes, true)?;

    let scale = layout.generation_scale()?;
    let mut entries = Vec::new();
    for p in layout.balance_points() {
        for a in &axes {
            let (ph, j) = (label(a, 0)?, label(a, 1)?);
            let i = p.with(a);
            let source = species_source(layout, &staged, args, p, a, true)?
                + custom_material(layout, args, p, Some(ph), j)?;
            let acc = accumulation(core.dynamic, &staged, MATERIAL_HOLDUP.accumulation, i.clone());
            let c = governing(core.dynamic, &scale, acc, flow_at(&flows, &i)?, source);
            entries.push((i, c));
        }
    }
    add_constraints(&mut staged, "material_balances", entries)?;
    Ok(staged)
}

/// One balance per component and balance point, summed over phases.
///
/// Phase-equilibrium generation cancels in the sum and is never staged.
pub(crate) fn total_component<L: Layout>(
    layout: &L,
    args: &MaterialBalanceArgs<'_>,
) -> CvResult<Block> {
    validate(layout, TOTAL_COMPONENT, flags(args))?;
    let core = layout.core();
    let mut staged = core.block.scratch();
    let axes = core.phase_component_axes();
    let flows = material_flows(layout, &mut staged, &axes)?;
    if core.has_holdup {
        material_holdup(layout, &mut staged, &axes)?;
    }
    stage_generation(layout, &mut staged, args, &axes, false)?;

    let scale = layout.generation_scale()?;
    let mut entries = Vec::new();
    for p in layout.balance_points() {
        for j in core.components() {
            let per_phase: Vec<Index> = core
                .phases()
                .iter()
                .map(|ph| Index(vec![Label::from(ph), Label::from(j)]))
                .collect();
            let mut acc = Vec::new();
            let mut flow = Vec::new();
            let mut source = Vec::new();
            for a in &per_phase {
                let i = p.with(a);
                acc.push(accumulation(core.dynamic, &staged, MATERIAL_HOLDUP.accumulation, i.clone()));
                flow.push(flow_at(&flows, &i)?);
                source.push(species_source(layout, &staged, args, p, a, false)?);
            }
            source.push(custom_material(layout, args, p, None, j)?);
            let c = governing(
                core.dynamic,
                &scale,
                Expr::sum(acc),
                Expr::sum(flow),
                Expr::sum(source),
            );
            entries.push((p.with(&single(j)), c));
        }
    }
    add_constraints(&mut staged, "material_balances", entries)?;
    Ok(staged)
}

/// One balance per element and balance point.
pub(crate) fn total_element<L: Layout>(
    layout: &L,
    args: &MaterialBalanceArgs<'_>,
) -> CvResult<Block> {
    validate(layout, TOTAL_ELEMENT, flags(args))?;
    let core = layout.core();
    let property = core.packages.property.clone();
    let elements = property
        .elements()
        .ok_or_else(|| CvError::not_supported("element list is undefined"))?
        .to_vec();
    let element_axes = named(&elements);
    let pairs = core.phase_component_axes();
    let composition = |j: &str, e: &str| property.element_composition(j, e).unwrap_or(0.0);

    let mut staged = core.block.scratch();
    let accessor = |state: &dyn cv_props::StateBlock, a: &Index| -> CvResult<Expr> {
        let e = label(a, 0)?;
        let mut terms = Vec::new();
        for pc in &pairs {
            let (ph, j) = (label(pc, 0)?, label(pc, 1)?);
            let n = composition(j, e);
            if n != 0.0 {
                terms.push(n * state.material_flow_term(ph, j)?);
            }
        }
        Ok(Expr::sum(terms))
    };
    let flows = layout.flow_terms(
        &mut staged,
        &FlowSpec {
            var: "elemental_flow_term",
            linking: "elemental_flow_linking_constraint",
            dx: "elemental_flow_dx",
            axes: &element_axes,
            accessor: &accessor,
        },
    )?;

    if core.has_holdup {
        stage_phase_fraction(layout, &mut staged)?;
        let content = |p: Point, a: &Index, staged: &Block| -> CvResult<Expr> {
            let e = label(a, 0)?;
            let state = layout.state_at(p)?;
            let mut terms = Vec::new();
            for ph in core.phases() {
                let mut inner = Vec::new();
                for j in core.components() {
                    let n = composition(j, e);
                    if n != 0.0 {
                        inner.push(n * state.material_density_term(ph, j)?);
                    }
                }
                terms.push(phase_fraction(layout, staged, p, ph)? * Expr::sum(inner));
            }
            Ok(Expr::sum(terms))
        };
        stage_holdup(layout, &mut staged, &ELEMENT_HOLDUP, &element_axes, &content)?;
    }

    if args.has_mass_transfer {
        let points = layout.points();
        staged.add_var("mass_transfer_term", product(&points, &pairs))?;
        let mut transfer = Vec::new();
        for p in &points {
            for a in &element_axes {
                let e = label(a, 0)?;
                let mut terms = Vec::new();
                for pc in &pairs {
                    let n = composition(label(pc, 1)?, e);
                    if n != 0.0 {
                        terms.push(n * var(&staged, "mass_transfer_term", p.with(pc)));
                    }
                }
                transfer.push((p.with(a), Expr::sum(terms)));
            }
        }
        let set = staged.add_expressions("elemental_mass_transfer_term")?;
        for (i, e) in transfer {
            set.insert(i, e)?;
        }
    }

    let scale = layout.generation_scale()?;
    let mut entries = Vec::new();
    for p in layout.balance_points() {
        for a in &element_axes {
            let e = label(a, 0)?;
            let i = p.with(a);
            let mut source = Vec::new();
            if args.has_mass_transfer {
                source.push(super::term(&core.block, &staged, "elemental_mass_transfer_term", &i)?);
            }
            if let Some(f) = args.custom_elemental_term {
                source.push(f(&BalancePoint {
                    t: p.t,
                    x: p.x,
                    phase: None,
                    component: None,
                    element: Some(e),
                }));
            }
            let acc = accumulation(core.dynamic, &staged, ELEMENT_HOLDUP.accumulation, i.clone());
            let c = governing(core.dynamic, &scale, acc, flow_at(&flows, &i)?, Expr::sum(source));
            entries.push((i, c));
        }
    }
    add_constraints(&mut staged, "element_balances", entries)?;
    Ok(staged)
}
