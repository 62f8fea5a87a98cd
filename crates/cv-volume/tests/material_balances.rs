//! Material balance assembly on 0D and 1D volumes.

mod common;

use common::*;
use cv_model::{Constraint, Domain, Expr, idx};
use cv_volume::{
    BalancePoint, ControlVolume, ControlVolume0D, ControlVolume1D, ControlVolumeOptions,
    ErrorKind, FlowDirection, GeometryArgs, MaterialBalanceArgs, MaterialBalanceType,
    Packages, ReactionBlockArgs, StateBlockArgs, TimeDomain, TransformationScheme,
};

fn one_d(
    packages: Packages,
    time: TimeDomain,
    scheme: TransformationScheme,
    direction: FlowDirection,
) -> ControlVolume1D {
    let mut cv = ControlVolume1D::new("cv", time, packages, finite_difference(scheme, 10)).unwrap();
    cv.add_geometry(GeometryArgs {
        flow_direction: Some(direction),
        ..Default::default()
    })
    .unwrap();
    cv.apply_transformation().unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(false),
        ..Default::default()
    })
    .unwrap();
    cv
}

fn steady_backward() -> ControlVolume1D {
    one_d(
        packages(two_by_two()),
        TimeDomain::steady(),
        TransformationScheme::Backward,
        FlowDirection::Forward,
    )
}

fn tank(packages: Packages, time: TimeDomain) -> ControlVolume0D {
    let mut cv =
        ControlVolume0D::new("tank", time, packages, ControlVolumeOptions::default()).unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(false),
        ..Default::default()
    })
    .unwrap();
    cv
}

#[test]
fn steady_backward_phase_component_balances() {
    let mut cv = steady_backward();
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    // 2 phases x 2 components at 10 of the 11 length points
    assert_eq!(set.len(), 40);
    assert!(!set.contains(&idx![0usize, 0usize, "Liq", "c1"]));
    for x in 1..=10usize {
        for (p, j) in [("Liq", "c1"), ("Liq", "c2"), ("Vap", "c1"), ("Vap", "c2")] {
            assert!(set.contains(&idx![0usize, x, p, j]));
        }
    }
    let c = set.get(&idx![0usize, 3usize, "Vap", "c2"]).unwrap();
    assert!(c.lhs.is_zero());
    assert!(c.rhs.contains_var("cv.material_flow_dx"));

    let block = cv.block();
    assert_eq!(block.var("_flow_terms").unwrap().len(), 44);
    assert_eq!(
        block
            .constraints("material_flow_linking_constraints")
            .unwrap()
            .len(),
        44
    );
    let dx = block.var("material_flow_dx").unwrap();
    assert_eq!(dx.derivative_of().unwrap().wrt, Domain::Length);
    assert_eq!(
        block.constraints("material_flow_dx_disc_eq").unwrap().len(),
        40
    );
    assert!(block.var("material_holdup").is_none());
}

#[test]
fn backward_flow_excludes_the_last_point() {
    let mut cv = one_d(
        packages(two_by_two()),
        TimeDomain::steady(),
        TransformationScheme::Forward,
        FlowDirection::Backward,
    );
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    assert_eq!(set.len(), 40);
    assert!(set.contains(&idx![0usize, 0usize, "Liq", "c1"]));
    assert!(!set.contains(&idx![0usize, 10usize, "Liq", "c1"]));
}

#[test]
fn finite_difference_schemes_exclude_the_inlet_of_forward_flow() {
    for scheme in [TransformationScheme::Backward, TransformationScheme::Forward] {
        let mut cv = one_d(
            packages(two_by_two()),
            TimeDomain::steady(),
            scheme,
            FlowDirection::Forward,
        );
        let set = cv
            .add_phase_component_balances(MaterialBalanceArgs::default())
            .unwrap();
        assert_eq!(set.len(), 40, "{scheme}");
        assert!(!set.contains(&idx![0usize, 0usize, "Liq", "c1"]), "{scheme}");
    }
}

#[test]
fn forward_scheme_with_forward_flow_leaves_the_outlet_derivative_free() {
    let mut cv = one_d(
        packages(two_by_two()),
        TimeDomain::steady(),
        TransformationScheme::Forward,
        FlowDirection::Forward,
    );
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    assert!(set.contains(&idx![0usize, 10usize, "Liq", "c1"]));
    let disc = cv.block().constraints("material_flow_dx_disc_eq").unwrap();
    assert_eq!(disc.len(), 40);
    assert!(disc.contains(&idx![0usize, 0usize, "Liq", "c1"]));
    assert!(!disc.contains(&idx![0usize, 10usize, "Liq", "c1"]));
}

#[test]
fn repeated_balances_are_rejected() {
    let mut cv = steady_backward();
    cv.add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    let names: Vec<String> = cv.block().component_names().map(String::from).collect();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let after: Vec<String> = cv.block().component_names().map(String::from).collect();
    assert_eq!(names, after);
}

#[test]
fn rejected_request_changes_nothing() {
    let mut cv = steady_backward();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_rate_reactions: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(cv.block().component_names().count(), 2);
    cv.add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
}

#[test]
fn dynamic_balances_carry_holdup_and_accumulation() {
    let time = TimeDomain::dynamic(&[0.0, 1.0]).unwrap();
    let mut cv = one_d(
        packages(two_by_two()),
        time,
        TransformationScheme::Backward,
        FlowDirection::Forward,
    );
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    assert_eq!(set.len(), 80);
    let c = set.get(&idx![1usize, 5usize, "Liq", "c2"]).unwrap();
    assert!(c.lhs.contains_var("cv.material_accumulation"));
    assert!(c.lhs.contains_var("cv.length"));

    let block = cv.block();
    assert_eq!(block.var("material_holdup").unwrap().len(), 88);
    let acc = block.var("material_accumulation").unwrap();
    assert_eq!(acc.derivative_of().unwrap().wrt, Domain::Time);
    assert_eq!(&*acc.derivative_of().unwrap().var, "cv.material_holdup");
    // two phases: a phase-fraction variable summing to one
    assert_eq!(block.var("phase_fraction").unwrap().len(), 44);
    assert_eq!(block.constraints("sum_of_phase_fractions").unwrap().len(), 22);
    let calc = block.constraints("material_holdup_calculation").unwrap();
    let h = calc.get(&idx![0usize, 0usize, "Liq", "c1"]).unwrap();
    assert!(h.rhs.contains_var("cv.area"));
    assert!(h.rhs.contains_var("cv.phase_fraction"));
}

#[test]
fn single_phase_fraction_is_an_expression() {
    let time = TimeDomain::dynamic(&[0.0, 1.0]).unwrap();
    let mut cv = tank(packages(water()), time);
    cv.add_geometry().unwrap();
    cv.add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    let pf = cv.block().expressions("phase_fraction").unwrap();
    assert_eq!(pf.at(&idx![1usize, "Liq"]).unwrap().as_const(), Some(1.0));
    assert!(cv.block().var("phase_fraction").is_none());
}

#[test]
fn holdup_needs_geometry() {
    let time = TimeDomain::dynamic(&[0.0, 1.0]).unwrap();
    let mut cv = tank(packages(two_by_two()), time);
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn balances_need_state_blocks() {
    let mut cv = ControlVolume0D::new(
        "tank",
        TimeDomain::steady(),
        packages(two_by_two()),
        ControlVolumeOptions::default(),
    )
    .unwrap();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn steady_tank_balances_are_inlet_minus_outlet() {
    let mut cv = tank(packages(two_by_two()), TimeDomain::steady());
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    assert_eq!(set.len(), 4);
    let c = set.get(&idx![0usize, "Liq", "c1"]).unwrap();
    assert!(c.lhs.is_zero());
    assert!(c.rhs.contains_var("tank.properties_in[0].flow_mol_phase_comp"));
    assert!(c.rhs.contains_var("tank.properties_out[0].flow_mol_phase_comp"));
    assert!(cv.block().var("_flow_terms").is_none());
}

#[test]
fn rate_reactions_generate_through_stoichiometry() {
    let mut cv = tank(with_reactions(two_by_two(), reactions()), TimeDomain::steady());
    cv.add_reaction_blocks(ReactionBlockArgs {
        has_equilibrium: Some(false),
    })
    .unwrap();
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_rate_reactions: true,
            ..Default::default()
        })
        .unwrap();
    let c = set.get(&idx![0usize, "Liq", "c1"]).unwrap();
    assert!(c.rhs.contains_var("tank.rate_reaction_generation"));

    let block = cv.block();
    assert_eq!(block.var("rate_reaction_extent").unwrap().len(), 1);
    let stoich = block
        .constraints("rate_reaction_stoichiometry_constraint")
        .unwrap();
    assert_eq!(stoich.len(), 4);
    let consumed = stoich.get(&idx![0usize, "Liq", "c1"]).unwrap();
    assert!(consumed.rhs.contains_var("tank.rate_reaction_extent"));
    // c1 does not react in the vapor
    let idle = stoich.get(&idx![0usize, "Vap", "c1"]).unwrap();
    assert!(idle.rhs.is_zero());
}

#[test]
fn rate_extents_close_against_the_paired_reaction_rate() {
    let mut cv = tank(with_reactions(two_by_two(), reactions()), TimeDomain::steady());
    cv.add_reaction_blocks(ReactionBlockArgs {
        has_equilibrium: Some(false),
    })
    .unwrap();
    cv.add_phase_component_balances(MaterialBalanceArgs {
        has_rate_reactions: true,
        ..Default::default()
    })
    .unwrap();
    // the closure a reactor model writes: extent == rate at the same point
    let extent = cv
        .block()
        .term("rate_reaction_extent", &idx![0usize, "R1"])
        .unwrap();
    let rate = cv.reactions(0).unwrap().reaction_rate("R1").unwrap();
    assert!(rate.contains_var("tank.reactions[0].reaction_rate"));
    let closure = Constraint::eq(extent, rate);
    assert!(closure.lhs.contains_var("tank.rate_reaction_extent"));
}

#[test]
fn rate_reactions_need_reaction_blocks() {
    let mut cv = tank(with_reactions(two_by_two(), reactions()), TimeDomain::steady());
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_rate_reactions: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn rate_reactions_need_a_rate_index() {
    let mut cv = tank(
        with_reactions(two_by_two(), equilibrium_reactions()),
        TimeDomain::steady(),
    );
    cv.add_reaction_blocks(ReactionBlockArgs {
        has_equilibrium: Some(true),
    })
    .unwrap();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_rate_reactions: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PropertyNotSupported);
}

#[test]
fn equilibrium_reactions_need_equilibrium_blocks() {
    let mut cv = tank(
        with_reactions(two_by_two(), equilibrium_reactions()),
        TimeDomain::steady(),
    );
    cv.add_reaction_blocks(ReactionBlockArgs {
        has_equilibrium: Some(false),
    })
    .unwrap();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_equilibrium_reactions: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn equilibrium_reactions_enter_without_conversion() {
    let mut cv = tank(
        with_reactions(two_by_two(), equilibrium_reactions()),
        TimeDomain::steady(),
    );
    cv.add_reaction_blocks(ReactionBlockArgs {
        has_equilibrium: Some(true),
    })
    .unwrap();
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_equilibrium_reactions: true,
            ..Default::default()
        })
        .unwrap();
    let c = set.get(&idx![0usize, "Liq", "c2"]).unwrap();
    assert!(c.rhs.contains_var("tank.equilibrium_reaction_generation"));
    assert!(cv.block().var("equilibrium_reaction_extent").is_some());
}

#[test]
fn phase_equilibrium_needs_activated_state_blocks() {
    let mut cv = tank(packages(vle()), TimeDomain::steady());
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_phase_equilibrium: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn phase_equilibrium_transfers_between_phases() {
    let mut cv = ControlVolume0D::new(
        "flash",
        TimeDomain::steady(),
        packages(vle()),
        ControlVolumeOptions::default(),
    )
    .unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(true),
        ..Default::default()
    })
    .unwrap();
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_phase_equilibrium: true,
            ..Default::default()
        })
        .unwrap();
    let vap = set.get(&idx![0usize, "Vap", "c1"]).unwrap();
    assert!(vap.rhs.contains_var("flash.phase_equilibrium_generation"));
    assert_eq!(
        cv.block().var("phase_equilibrium_generation").unwrap().len(),
        2
    );
}

#[test]
fn phase_equilibrium_needs_an_index() {
    let mut cv = ControlVolume0D::new(
        "flash",
        TimeDomain::steady(),
        packages(two_by_two()),
        ControlVolumeOptions::default(),
    )
    .unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(true),
        ..Default::default()
    })
    .unwrap();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_phase_equilibrium: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PropertyNotSupported);
}

#[test]
fn mass_transfer_and_custom_terms() {
    let mut cv = tank(packages(water()), TimeDomain::steady());
    let custom = |at: &BalancePoint<'_>| {
        if at.component == Some("H2") {
            Expr::Const(2.0)
        } else {
            Expr::zero()
        }
    };
    let set = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            has_mass_transfer: true,
            custom_mass_term: Some(&custom),
            ..Default::default()
        })
        .unwrap();
    let c = set.get(&idx![0usize, "Liq", "H2"]).unwrap();
    assert!(c.rhs.contains_var("tank.mass_transfer_term"));
    // 2 kg/s of H2 at 0.002 kg/mol
    let value = c.rhs.eval(&|_| Some(0.0)).unwrap();
    assert!((value - 1000.0).abs() < 1e-9);
}

#[test]
fn total_component_balances_sum_over_phases() {
    let mut cv = steady_backward();
    let set = cv
        .add_total_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    assert_eq!(set.len(), 20);
    let c = set.get(&idx![0usize, 4usize, "c1"]).unwrap();
    let flows: Vec<_> = c.rhs.vars().into_iter().collect();
    assert_eq!(flows.len(), 2);
}

#[test]
fn total_component_balances_only_check_phase_equilibrium_activation() {
    let mut cv = ControlVolume0D::new(
        "flash",
        TimeDomain::steady(),
        packages(two_by_two()),
        ControlVolumeOptions::default(),
    )
    .unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(true),
        ..Default::default()
    })
    .unwrap();
    cv.add_total_component_balances(MaterialBalanceArgs {
        has_phase_equilibrium: true,
        ..Default::default()
    })
    .unwrap();
    assert!(cv.block().var("phase_equilibrium_generation").is_none());
}

#[test]
fn element_balances() {
    let time = TimeDomain::dynamic(&[0.0, 1.0]).unwrap();
    let mut cv = tank(packages(water()), time);
    cv.add_geometry().unwrap();
    let set = cv
        .add_total_element_balances(MaterialBalanceArgs {
            has_mass_transfer: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(set.len(), 4);
    let o = set.get(&idx![1usize, "O"]).unwrap();
    assert!(o.lhs.contains_var("tank.element_accumulation"));
    assert!(o.rhs.contains_var("tank.properties_in[1].flow_mol_phase_comp"));

    let block = cv.block();
    assert_eq!(block.var("element_holdup").unwrap().len(), 4);
    assert!(block.constraints("elemental_holdup_calculation").is_some());
    let transfer = block.expressions("elemental_mass_transfer_term").unwrap();
    assert_eq!(transfer.len(), 4);
}

#[test]
fn element_balances_reject_reaction_terms() {
    let mut cv = tank(packages(water()), TimeDomain::steady());
    for args in [
        MaterialBalanceArgs {
            has_rate_reactions: true,
            ..Default::default()
        },
        MaterialBalanceArgs {
            has_equilibrium_reactions: true,
            ..Default::default()
        },
        MaterialBalanceArgs {
            has_phase_equilibrium: true,
            ..Default::default()
        },
    ] {
        let err = cv.add_total_element_balances(args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
    let custom = |_: &BalancePoint<'_>| Expr::one();
    let err = cv
        .add_total_element_balances(MaterialBalanceArgs {
            custom_molar_term: Some(&custom),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn element_balances_need_element_data() {
    let mut cv = tank(packages(two_by_two()), TimeDomain::steady());
    let err = cv
        .add_total_element_balances(MaterialBalanceArgs::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PropertyNotSupported);
}

#[test]
fn elemental_custom_term_is_element_only() {
    let mut cv = tank(packages(water()), TimeDomain::steady());
    let custom = |_: &BalancePoint<'_>| Expr::one();
    let err = cv
        .add_phase_component_balances(MaterialBalanceArgs {
            custom_elemental_term: Some(&custom),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let set = cv
        .add_total_element_balances(MaterialBalanceArgs {
            custom_elemental_term: Some(&custom),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn dispatcher_routes_and_rejects() {
    let mut cv = tank(packages(two_by_two()), TimeDomain::steady());
    assert!(
        cv.add_material_balances(MaterialBalanceType::None, MaterialBalanceArgs::default())
            .unwrap()
            .is_none()
    );
    let err = cv
        .add_material_balances(MaterialBalanceType::Total, MaterialBalanceArgs::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BalanceTypeNotSupported);
    let set = cv
        .add_material_balances(
            MaterialBalanceType::ComponentTotal,
            MaterialBalanceArgs::default(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(set.len(), 2);
}
