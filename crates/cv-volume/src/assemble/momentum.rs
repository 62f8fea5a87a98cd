//! Total pressure balance.

use cv_core::{CvError, CvResult};
use cv_model::{Block, Expr, Index};

use super::{FlowSpec, Layout, add_constraints, governing, validate, var};
use crate::balance::{BalancePoint, MomentumBalanceArgs};
use crate::validate::{Flag, TOTAL_PRESSURE};

/// `0 == flow + scale * (deltaP + custom)` per balance point.
pub(crate) fn total_pressure<L: Layout>(
    layout: &L,
    args: &MomentumBalanceArgs<'_>,
) -> CvResult<Block> {
    let mut requested = Vec::new();
    if args.has_pressure_change {
        requested.push(Flag::PressureChange);
    }
    if args.custom_term.is_some() {
        requested.push(Flag::CustomTerm);
    }
    validate(layout, TOTAL_PRESSURE, requested)?;
    let core = layout.core();
    let mut staged = core.block.scratch();

    let accessor = |state: &dyn cv_props::StateBlock, _: &Index| -> CvResult<Expr> {
        state.pressure().ok_or_else(|| {
            CvError::not_supported(format!(
                "{}: state block does not expose pressure",
                state.block().name()
            ))
        })
    };
    let axes = [Index::scalar()];
    let flows = layout.flow_terms(
        &mut staged,
        &FlowSpec {
            var: "pressure",
            linking: "pressure_linking_constraint",
            dx: "pressure_dx",
            axes: &axes,
            accessor: &accessor,
        },
    )?;

    if args.has_pressure_change {
        let indices: Vec<Index> = layout.points().iter().map(|p| p.index()).collect();
        staged.add_var("deltaP", indices)?;
    }

    let scale = layout.generation_scale()?;
    let mut entries = Vec::new();
    for p in layout.balance_points() {
        let i = p.index();
        let flow = flows
            .get(&i)
            .cloned()
            .ok_or_else(|| CvError::internal(format!("no pressure term at {i}")))?;
        let mut source = Vec::new();
        if args.has_pressure_change {
            source.push(var(&staged, "deltaP", i.clone()));
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
        entries.push((i, governing(false, &scale, Expr::zero(), flow, Expr::sum(source))));
    }
    add_constraints(&mut staged, "pressure_balance", entries)?;
    Ok(staged)
}
