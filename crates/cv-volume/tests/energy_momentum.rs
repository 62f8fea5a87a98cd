//! Enthalpy and pressure balances.

mod common;

use common::*;
use cv_model::{Domain, Expr, idx};
use cv_props::TablePackage;
use cv_volume::{
    BalancePoint, ControlVolume, ControlVolume0D, ControlVolume1D, ControlVolumeOptions,
    EnergyBalanceArgs, EnergyBalanceType, ErrorKind, GeometryArgs, MaterialBalanceArgs,
    MomentumBalanceArgs, MomentumBalanceType, Packages, ReactionBlockArgs, StateBlockArgs,
    TimeDomain, TransformationScheme,
};

fn pipe(time: TimeDomain) -> ControlVolume1D {
    let mut cv = ControlVolume1D::new(
        "pipe",
        time,
        packages(two_by_two()),
        finite_difference(TransformationScheme::Backward, 10),
    )
    .unwrap();
    cv.add_geometry(GeometryArgs::default()).unwrap();
    cv.apply_transformation().unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(false),
        ..Default::default()
    })
    .unwrap();
    cv
}

fn tank(packages: Packages) -> ControlVolume0D {
    let mut cv = ControlVolume0D::new(
        "tank",
        TimeDomain::steady(),
        packages,
        ControlVolumeOptions::default(),
    )
    .unwrap();
    cv.add_state_blocks(StateBlockArgs {
        has_phase_equilibrium: Some(false),
        ..Default::default()
    })
    .unwrap();
    cv
}

fn reacting_tank(rxn: cv_props::TableReactions, equilibrium: bool) -> ControlVolume0D {
    let mut cv = tank(with_reactions(two_by_two(), rxn));
    cv.add_reaction_blocks(ReactionBlockArgs {
        has_equilibrium: Some(equilibrium),
    })
    .unwrap();
    cv
}

#[test]
fn steady_pipe_enthalpy_balances() {
    let mut cv = pipe(TimeDomain::steady());
    let set = cv
        .add_total_enthalpy_balances(EnergyBalanceArgs {
            has_heat_transfer: true,
            has_work_transfer: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(set.len(), 10);
    assert!(!set.contains(&idx![0usize, 0usize]));
    let c = set.get(&idx![0usize, 7usize]).unwrap();
    assert!(c.lhs.is_zero());
    assert!(c.rhs.contains_var("pipe.enthalpy_flow_dx"));
    assert!(c.rhs.contains_var("pipe.heat"));
    assert!(c.rhs.contains_var("pipe.work"));

    let block = cv.block();
    assert_eq!(block.var("_enthalpy_flow").unwrap().len(), 22);
    assert_eq!(block.var("heat").unwrap().len(), 11);
    assert_eq!(
        block.constraints("enthalpy_flow_dx_disc_eq").unwrap().len(),
        20
    );
    let link = block
        .constraints("enthalpy_flow_linking_constraint")
        .unwrap()
        .get(&idx![0usize, 0usize, "Vap"])
        .unwrap();
    assert!(link.rhs.contains_var("pipe.properties[0,0].enth_phase"));
}

#[test]
fn dynamic_pipe_enthalpy_holdup() {
    let mut cv = pipe(TimeDomain::dynamic(&[0.0, 0.5, 1.0]).unwrap());
    let set = cv
        .add_total_enthalpy_balances(EnergyBalanceArgs::default())
        .unwrap();
    assert_eq!(set.len(), 30);
    let c = set.get(&idx![2usize, 10usize]).unwrap();
    assert!(c.lhs.contains_var("pipe.enthalpy_accumulation"));
    let block = cv.block();
    assert_eq!(block.var("enthalpy_holdup").unwrap().len(), 66);
    let acc = block.var("enthalpy_accumulation").unwrap();
    assert_eq!(acc.derivative_of().unwrap().wrt, Domain::Time);
    assert!(block.constraints("enthalpy_holdup_calculation").is_some());
}

#[test]
fn material_and_energy_share_phase_fractions() {
    let mut cv = pipe(TimeDomain::dynamic(&[0.0, 1.0]).unwrap());
    cv.add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    cv.add_total_enthalpy_balances(EnergyBalanceArgs::default())
        .unwrap();
    assert_eq!(cv.block().var("phase_fraction").unwrap().len(), 44);
}

#[test]
fn heat_of_reaction_from_rate_extents() {
    let mut cv = reacting_tank(reactions(), false);
    cv.add_phase_component_balances(MaterialBalanceArgs {
        has_rate_reactions: true,
        ..Default::default()
    })
    .unwrap();
    let set = cv
        .add_total_enthalpy_balances(EnergyBalanceArgs {
            has_heat_of_reaction: true,
            ..Default::default()
        })
        .unwrap();
    let c = set.get(&idx![0usize]).unwrap();
    assert!(c.rhs.contains_var("tank.rate_reaction_extent"));

    let hor = cv.block().expressions("heat_of_reaction").unwrap();
    let e = hor.at(&idx![0usize]).unwrap();
    // -extent * (-1000 J/mol)
    let value = e.eval(&|_| Some(2.0)).unwrap();
    assert!((value - 2000.0).abs() < 1e-9);
}

#[test]
fn heat_of_reaction_needs_reaction_terms() {
    let mut cv = reacting_tank(reactions(), false);
    cv.add_phase_component_balances(MaterialBalanceArgs::default())
        .unwrap();
    let err = cv
        .add_total_enthalpy_balances(EnergyBalanceArgs {
            has_heat_of_reaction: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn heat_of_reaction_needs_package_data() {
    let mut cv = reacting_tank(equilibrium_reactions(), true);
    cv.add_phase_component_balances(MaterialBalanceArgs {
        has_equilibrium_reactions: true,
        ..Default::default()
    })
    .unwrap();
    let err = cv
        .add_total_enthalpy_balances(EnergyBalanceArgs {
            has_heat_of_reaction: true,
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PropertyNotSupported);
}

#[test]
fn custom_energy_term() {
    let mut cv = tank(packages(two_by_two()));
    let custom = |at: &BalancePoint<'_>| {
        assert!(at.phase.is_none() && at.x.is_none());
        Expr::Const(5.0)
    };
    let set = cv
        .add_total_enthalpy_balances(EnergyBalanceArgs {
            custom_term: Some(&custom),
            ..Default::default()
        })
        .unwrap();
    let value = set.get(&idx![0usize]).unwrap().rhs.eval(&|_| Some(0.0)).unwrap();
    assert_eq!(value, 5.0);
}

#[test]
fn pipe_pressure_balance() {
    let mut cv = pipe(TimeDomain::steady());
    let set = cv
        .add_total_pressure_balances(MomentumBalanceArgs {
            has_pressure_change: true,
            custom_term: None,
        })
        .unwrap();
    assert_eq!(set.len(), 10);
    let c = set.get(&idx![0usize, 1usize]).unwrap();
    assert!(c.lhs.is_zero());
    assert!(c.rhs.contains_var("pipe.pressure_dx"));
    assert!(c.rhs.contains_var("pipe.deltaP"));

    let block = cv.block();
    assert_eq!(block.var("pressure").unwrap().len(), 11);
    assert_eq!(block.var("deltaP").unwrap().len(), 11);
    let link = block
        .constraints("pressure_linking_constraint")
        .unwrap()
        .get(&idx![0usize, 4usize])
        .unwrap();
    assert!(link.rhs.contains_var("pipe.properties[0,4].pressure"));
}

#[test]
fn pressure_balances_are_steady_in_dynamic_pipes() {
    let mut cv = pipe(TimeDomain::dynamic(&[0.0, 1.0]).unwrap());
    let set = cv
        .add_total_pressure_balances(MomentumBalanceArgs::default())
        .unwrap();
    assert!(set.iter().all(|(_, c)| c.lhs.is_zero()));
}

#[test]
fn tank_pressure_balance() {
    let mut cv = tank(packages(two_by_two()));
    let set = cv
        .add_total_pressure_balances(MomentumBalanceArgs {
            has_pressure_change: true,
            custom_term: None,
        })
        .unwrap();
    assert_eq!(set.len(), 1);
    let c = set.get(&idx![0usize]).unwrap();
    assert!(c.rhs.contains_var("tank.properties_in[0].pressure"));
    assert!(c.rhs.contains_var("tank.properties_out[0].pressure"));
    assert!(c.rhs.contains_var("tank.deltaP"));
}

#[test]
fn pressure_balance_needs_pressure() {
    let pp = TablePackage::builder("nop")
        .phases(&["Liq"])
        .components(&["c1"])
        .without_pressure()
        .build()
        .unwrap();
    let mut cv = tank(packages(pp));
    let err = cv
        .add_total_pressure_balances(MomentumBalanceArgs::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PropertyNotSupported);
}

#[test]
fn unsupported_energy_and_momentum_kinds() {
    let mut cv = tank(packages(two_by_two()));
    for kind in [
        EnergyBalanceType::EnthalpyPhase,
        EnergyBalanceType::EnergyTotal,
        EnergyBalanceType::EnergyPhase,
    ] {
        let err = cv
            .add_energy_balances(kind, EnergyBalanceArgs::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BalanceTypeNotSupported);
    }
    for kind in [
        MomentumBalanceType::PressurePhase,
        MomentumBalanceType::MomentumTotal,
        MomentumBalanceType::MomentumPhase,
    ] {
        let err = cv
            .add_momentum_balances(kind, MomentumBalanceArgs::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BalanceTypeNotSupported);
    }
    assert!(
        cv.add_energy_balances(EnergyBalanceType::None, EnergyBalanceArgs::default())
            .unwrap()
            .is_none()
    );
    assert!(
        cv.add_momentum_balances(MomentumBalanceType::PressureTotal, MomentumBalanceArgs::default())
            .unwrap()
            .is_some()
    );
}
