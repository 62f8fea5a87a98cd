//! Shared fixtures for the control-volume integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cv_model::{Block, Expr, VarRef};
use cv_props::{
    FlowBasis, PhaseEquilibrium, PropertyCapabilities, PropertyPackage, PropsResult, StateArgs,
    StateBlock, StateConfig, TablePackage, TableReactions,
};
use cv_volume::{ControlVolumeOptions, Packages, TransformationMethod, TransformationScheme};

/// Two phases, two components, no reactions.
pub fn two_by_two() -> TablePackage {
    TablePackage::builder("pp")
        .phases(&["Liq", "Vap"])
        .components(&["c1", "c2"])
        .build()
        .unwrap()
}

/// One phase, water-like component with an element table and weights.
pub fn water() -> TablePackage {
    TablePackage::builder("water")
        .phases(&["Liq"])
        .components(&["H2O", "H2"])
        .elements(&["H", "O"])
        .composition("H2O", "H", 2.0)
        .composition("H2O", "O", 1.0)
        .composition("H2", "H", 2.0)
        .molecular_weights(&[("H2O", 0.018), ("H2", 0.002)])
        .build()
        .unwrap()
}

/// Vapor-liquid package with one phase equilibrium per component.
pub fn vle() -> TablePackage {
    TablePackage::builder("vle")
        .phases(&["Liq", "Vap"])
        .components(&["c1", "c2"])
        .phase_equilibrium("e1", "c1", "Vap", "Liq")
        .phase_equilibrium("e2", "c2", "Vap", "Liq")
        .build()
        .unwrap()
}

/// Rate reaction `R1: c1 -> c2` in the liquid, with heats of reaction.
pub fn reactions() -> TableReactions {
    TableReactions::builder("rxn")
        .rate_reactions(&["R1"])
        .stoichiometry("R1", "Liq", "c1", -1.0)
        .stoichiometry("R1", "Liq", "c2", 1.0)
        .heat_of_reaction("R1", -1000.0)
        .build()
        .unwrap()
}

/// Equilibrium reaction `E1: c1 <-> c2` in the liquid.
pub fn equilibrium_reactions() -> TableReactions {
    TableReactions::builder("eq")
        .equilibrium_reactions(&["E1"])
        .stoichiometry("E1", "Liq", "c1", -1.0)
        .stoichiometry("E1", "Liq", "c2", 1.0)
        .build()
        .unwrap()
}

pub fn packages(pp: TablePackage) -> Packages {
    Packages::new(Arc::new(pp))
}

pub fn with_reactions(pp: TablePackage, rxn: TableReactions) -> Packages {
    Packages::new(Arc::new(pp)).with_reactions(Arc::new(rxn))
}

pub fn finite_difference(scheme: TransformationScheme, elements: usize) -> ControlVolumeOptions {
    ControlVolumeOptions {
        transformation_method: Some(TransformationMethod::FiniteDifference),
        transformation_scheme: Some(scheme),
        finite_elements: Some(elements),
        ..Default::default()
    }
}

pub fn collocation(
    scheme: TransformationScheme,
    elements: usize,
    points: usize,
) -> ControlVolumeOptions {
    ControlVolumeOptions {
        transformation_method: Some(TransformationMethod::Collocation),
        transformation_scheme: Some(scheme),
        finite_elements: Some(elements),
        collocation_points: Some(points),
        ..Default::default()
    }
}

/// Calls observed by [`CountingPackage`].
#[derive(Clone, Debug, Default)]
pub struct Counters {
    pub built: Arc<AtomicUsize>,
    pub checked: Arc<AtomicUsize>,
    pub initialized: Arc<AtomicUsize>,
}

impl Counters {
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub fn checked(&self) -> usize {
        self.checked.load(Ordering::SeqCst)
    }

    pub fn initialized(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }
}

/// Property package wrapper counting block construction and lifecycle calls.
pub struct CountingPackage {
    pub inner: TablePackage,
    pub counters: Counters,
}

impl CountingPackage {
    pub fn new(inner: TablePackage) -> (Self, Counters) {
        let counters = Counters::default();
        (
            Self {
                inner,
                counters: counters.clone(),
            },
            counters,
        )
    }
}

impl PropertyPackage for CountingPackage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn phases(&self) -> &[String] {
        self.inner.phases()
    }

    fn components(&self) -> &[String] {
        self.inner.components()
    }

    fn elements(&self) -> Option<&[String]> {
        self.inner.elements()
    }

    fn element_composition(&self, component: &str, element: &str) -> Option<f64> {
        self.inner.element_composition(component, element)
    }

    fn phase_equilibrium(&self) -> Option<&[PhaseEquilibrium]> {
        self.inner.phase_equilibrium()
    }

    fn capabilities(&self) -> PropertyCapabilities {
        self.inner.capabilities()
    }

    fn build_state(&self, name: &str, config: StateConfig) -> PropsResult<Box<dyn StateBlock>> {
        self.counters.built.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingState {
            inner: self.inner.build_state(name, config)?,
            counters: self.counters.clone(),
        }))
    }
}

pub struct CountingState {
    inner: Box<dyn StateBlock>,
    counters: Counters,
}

impl StateBlock for CountingState {
    fn block(&self) -> &Block {
        self.inner.block()
    }

    fn block_mut(&mut self) -> &mut Block {
        self.inner.block_mut()
    }

    fn config(&self) -> &StateConfig {
        self.inner.config()
    }

    fn material_flow_term(&self, phase: &str, component: &str) -> PropsResult<Expr> {
        self.inner.material_flow_term(phase, component)
    }

    fn material_density_term(&self, phase: &str, component: &str) -> PropsResult<Expr> {
        self.inner.material_density_term(phase, component)
    }

    fn enthalpy_flow_term(&self, phase: &str) -> PropsResult<Expr> {
        self.inner.enthalpy_flow_term(phase)
    }

    fn enthalpy_density_term(&self, phase: &str) -> PropsResult<Expr> {
        self.inner.enthalpy_density_term(phase)
    }

    fn material_flow_basis(&self) -> FlowBasis {
        self.inner.material_flow_basis()
    }

    fn pressure(&self) -> Option<Expr> {
        self.inner.pressure()
    }

    fn mw(&self, component: &str) -> Option<Expr> {
        self.inner.mw(component)
    }

    fn define_state_vars(&self) -> BTreeMap<String, Vec<VarRef>> {
        self.inner.define_state_vars()
    }

    fn model_check(&self) -> PropsResult<()> {
        self.counters.checked.fetch_add(1, Ordering::SeqCst);
        self.inner.model_check()
    }

    fn initialize(&mut self, args: &StateArgs, hold_state: bool) -> PropsResult<Vec<VarRef>> {
        self.counters.initialized.fetch_add(1, Ordering::SeqCst);
        self.inner.initialize(args, hold_state)
    }

    fn release_state(&mut self, fixed: &[VarRef]) -> PropsResult<()> {
        self.inner.release_state(fixed)
    }
}
