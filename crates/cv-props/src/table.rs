//! Declarative property package backed by fixed tables.
//!
//! State blocks carry one flow variable per (phase, component), temperature,
//! pressure and a handful of per-phase properties. Flow and density terms are
//! simple products of these variables. Useful for exercising control volumes
//! and as a template for real correlation packages.

use std::collections::BTreeMap;
use std::sync::Arc;

use cv_model::{Block, Expr, Index, Label, VarRef};
use tracing::debug;

use crate::basis::{FlowBasis, PhaseEquilibrium};
use crate::config::{StateArgs, StateConfig};
use crate::error::{PropsError, PropsResult};
use crate::package::{PropertyCapabilities, PropertyPackage, StateBlock};

#[derive(Debug)]
struct TableData {
    name: String,
    phases: Vec<String>,
    components: Vec<String>,
    elements: Option<Vec<String>>,
    composition: BTreeMap<(String, String), f64>,
    phase_equilibrium: Option<Vec<PhaseEquilibrium>>,
    basis: FlowBasis,
    mw: BTreeMap<String, f64>,
    pressure: bool,
}

impl TableData {
    fn check_phase(&self, phase: &str) -> PropsResult<()> {
        if self.phases.iter().any(|p| p == phase) {
            Ok(())
        } else {
            Err(PropsError::UnknownPhase { name: phase.into() })
        }
    }

    fn check_component(&self, component: &str) -> PropsResult<()> {
        if self.components.iter().any(|c| c == component) {
            Ok(())
        } else {
            Err(PropsError::UnknownComponent {
                name: component.into(),
            })
        }
    }

    fn flow_var(&self) -> String {
        format!("flow_{}_phase_comp", self.basis.tag())
    }

    fn has_molecular_weights(&self) -> bool {
        !self.mw.is_empty() && self.components.iter().all(|c| self.mw.contains_key(c))
    }
}

/// Table-backed property package.
#[derive(Clone, Debug)]
pub struct TablePackage {
    data: Arc<TableData>,
}

impl TablePackage {
    pub fn builder(name: impl Into<String>) -> TablePackageBuilder {
        TablePackageBuilder::new(name)
    }
}

/// Builder for [`TablePackage`]; `build()` validates cross references.
#[derive(Debug)]
pub struct TablePackageBuilder {
    name: String,
    phases: Vec<String>,
    components: Vec<String>,
    elements: Option<Vec<String>>,
    composition: BTreeMap<(String, String), f64>,
    phase_equilibrium: Vec<PhaseEquilibrium>,
    basis: FlowBasis,
    mw: BTreeMap<String, f64>,
    pressure: bool,
}

impl TablePackageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
            components: Vec::new(),
            elements: None,
            composition: BTreeMap::new(),
            phase_equilibrium: Vec::new(),
            basis: FlowBasis::Molar,
            mw: BTreeMap::new(),
            pressure: true,
        }
    }

    pub fn phases(mut self, phases: &[&str]) -> Self {
        self.phases = phases.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn components(mut self, components: &[&str]) -> Self {
        self.components = components.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn elements(mut self, elements: &[&str]) -> Self {
        self.elements = Some(elements.iter().map(|e| e.to_string()).collect());
        self
    }

    /// Atoms of `element` per unit of `component`.
    pub fn composition(mut self, component: &str, element: &str, n: f64) -> Self {
        self.composition
            .insert((component.to_string(), element.to_string()), n);
        self
    }

    /// `component` moves from `from` into `to` through equilibrium `name`.
    pub fn phase_equilibrium(mut self, name: &str, component: &str, to: &str, from: &str) -> Self {
        self.phase_equilibrium.push(PhaseEquilibrium {
            name: name.to_string(),
            component: component.to_string(),
            phases: (to.to_string(), from.to_string()),
        });
        self
    }

    pub fn basis(mut self, basis: FlowBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn molecular_weights(mut self, mw: &[(&str, f64)]) -> Self {
        self.mw = mw.iter().map(|(c, v)| (c.to_string(), *v)).collect();
        self
    }

    pub fn without_pressure(mut self) -> Self {
        self.pressure = false;
        self
    }

    pub fn build(self) -> PropsResult<TablePackage> {
        let invalid = |what: String| PropsError::InvalidPackage { what };
        if self.phases.is_empty() {
            return Err(invalid(format!("package '{}' has no phases", self.name)));
        }
        if self.components.is_empty() {
            return Err(invalid(format!("package '{}' has no components", self.name)));
        }
        let known = |set: &[String], v: &str| set.iter().any(|s| s == v);
        for (c, e) in self.composition.keys() {
            if !known(&self.components, c) {
                return Err(invalid(format!("composition refers to unknown component '{c}'")));
            }
            let elements = self.elements.as_deref().unwrap_or(&[]);
            if !known(elements, e) {
                return Err(invalid(format!("composition refers to unknown element '{e}'")));
            }
        }
        if !self.composition.is_empty() && self.elements.is_none() {
            return Err(invalid("composition given without an element list".into()));
        }
        for pe in &self.phase_equilibrium {
            if !known(&self.components, &pe.component)
                || !known(&self.phases, &pe.phases.0)
                || !known(&self.phases, &pe.phases.1)
            {
                return Err(invalid(format!(
                    "phase equilibrium '{}' refers to unknown phase or component",
                    pe.name
                )));
            }
        }
        for (c, v) in &self.mw {
            if !known(&self.components, c) {
                return Err(invalid(format!("molecular weight for unknown component '{c}'")));
            }
            if !(v.is_finite() && *v > 0.0) {
                return Err(invalid(format!("molecular weight of '{c}' must be positive")));
            }
        }
        let elements_mapped = self.elements.is_some() && !self.composition.is_empty();
        Ok(TablePackage {
            data: Arc::new(TableData {
                name: self.name,
                phases: self.phases,
                components: self.components,
                elements: if elements_mapped { self.elements } else { None },
                composition: self.composition,
                phase_equilibrium: (!self.phase_equilibrium.is_empty())
                    .then_some(self.phase_equilibrium),
                basis: self.basis,
                mw: self.mw,
                pressure: self.pressure,
            }),
        })
    }
}

impl PropertyPackage for TablePackage {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn phases(&self) -> &[String] {
        &self.data.phases
    }

    fn components(&self) -> &[String] {
        &self.data.components
    }

    fn elements(&self) -> Option<&[String]> {
        self.data.elements.as_deref()
    }

    fn element_composition(&self, component: &str, element: &str) -> Option<f64> {
        self.data.elements.as_ref()?;
        Some(
            self.data
                .composition
                .get(&(component.to_string(), element.to_string()))
                .copied()
                .unwrap_or(0.0),
        )
    }

    fn phase_equilibrium(&self) -> Option<&[PhaseEquilibrium]> {
        self.data.phase_equilibrium.as_deref()
    }

    fn capabilities(&self) -> PropertyCapabilities {
        PropertyCapabilities {
            element_composition: self.data.elements.is_some(),
            phase_equilibrium: self.data.phase_equilibrium.is_some(),
            molecular_weight: self.data.has_molecular_weights(),
            pressure: self.data.pressure,
        }
    }

    fn build_state(&self, name: &str, config: StateConfig) -> PropsResult<Box<dyn StateBlock>> {
        TableState::new(self.data.clone(), name, config).map(|s| Box::new(s) as Box<dyn StateBlock>)
    }
}

/// State block produced by [`TablePackage`].
#[derive(Debug)]
pub struct TableState {
    data: Arc<TableData>,
    block: Block,
    config: StateConfig,
}

impl TableState {
    fn new(data: Arc<TableData>, name: &str, config: StateConfig) -> PropsResult<Self> {
        let mut block = Block::new(name);
        let pc: Vec<Index> = data
            .phases
            .iter()
            .flat_map(|p| {
                data.components
                    .iter()
                    .map(move |c| Index(vec![Label::from(p), Label::from(c)]))
            })
            .collect();
        let per_phase: Vec<Index> = data
            .phases
            .iter()
            .map(|p| Index(vec![Label::from(p)]))
            .collect();
        let frac = 1.0 / data.components.len() as f64;

        let flow = block.add_var(&data.flow_var(), pc.clone())?;
        flow.set_all(1.0);
        flow.set_bounds(Some(0.0), None);
        block.add_var("temperature", [Index::scalar()])?.set_all(300.0);
        if data.pressure {
            block.add_var("pressure", [Index::scalar()])?.set_all(101_325.0);
        }
        block.add_var("dens_phase", per_phase.clone())?;
        block.add_var("enth_phase", per_phase)?;
        block.add_var("frac_phase_comp", pc)?.set_all(frac);

        Ok(Self {
            data,
            block,
            config,
        })
    }

    fn term(&self, local: &str, index: Index) -> PropsResult<Expr> {
        Ok(self.block.term(local, &index)?)
    }

    fn state_var_names(&self) -> Vec<String> {
        let mut names = vec![self.data.flow_var(), "temperature".to_string()];
        if self.data.pressure {
            names.push("pressure".to_string());
        }
        names
    }
}

impl StateBlock for TableState {
    fn block(&self) -> &Block {
        &self.block
    }

    fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    fn config(&self) -> &StateConfig {
        &self.config
    }

    fn material_flow_term(&self, phase: &str, component: &str) -> PropsResult<Expr> {
        self.data.check_phase(phase)?;
        self.data.check_component(component)?;
        self.term(&self.data.flow_var(), cv_model::idx![phase, component])
    }

    fn material_density_term(&self, phase: &str, component: &str) -> PropsResult<Expr> {
        self.data.check_phase(phase)?;
        self.data.check_component(component)?;
        let dens = self.term("dens_phase", cv_model::idx![phase])?;
        let frac = self.term("frac_phase_comp", cv_model::idx![phase, component])?;
        Ok(dens * frac)
    }

    fn enthalpy_flow_term(&self, phase: &str) -> PropsResult<Expr> {
        self.data.check_phase(phase)?;
        let enth = self.term("enth_phase", cv_model::idx![phase])?;
        let flow = self
            .data
            .components
            .iter()
            .map(|c| self.term(&self.data.flow_var(), cv_model::idx![phase, c.as_str()]))
            .collect::<PropsResult<Vec<_>>>()?;
        Ok(Expr::sum(flow) * enth)
    }

    fn enthalpy_density_term(&self, phase: &str) -> PropsResult<Expr> {
        self.data.check_phase(phase)?;
        let dens = self.term("dens_phase", cv_model::idx![phase])?;
        let enth = self.term("enth_phase", cv_model::idx![phase])?;
        Ok(dens * enth)
    }

    fn material_flow_basis(&self) -> FlowBasis {
        self.data.basis
    }

    fn pressure(&self) -> Option<Expr> {
        self.block.term("pressure", &Index::scalar()).ok()
    }

    fn mw(&self, component: &str) -> Option<Expr> {
        self.data.mw.get(component).map(|v| Expr::Const(*v))
    }

    fn define_state_vars(&self) -> BTreeMap<String, Vec<VarRef>> {
        self.state_var_names()
            .into_iter()
            .filter_map(|n| {
                let refs = self.block.var(&n)?.refs();
                Some((n, refs))
            })
            .collect()
    }

    fn model_check(&self) -> PropsResult<()> {
        for (local, var) in self.block.vars() {
            for (index, data) in var.entries() {
                if let Some(v) = data.value {
                    if !v.is_finite() {
                        return Err(PropsError::CheckFailed {
                            block: self.block.name().to_string(),
                            what: format!("{local}{index} is not finite"),
                        });
                    }
                }
            }
        }
        let temperature = self
            .block
            .var("temperature")
            .and_then(|v| v.get(&Index::scalar()))
            .and_then(|d| d.value);
        if temperature.is_some_and(|t| t <= 0.0) {
            return Err(PropsError::CheckFailed {
                block: self.block.name().to_string(),
                what: "temperature must be positive".into(),
            });
        }
        Ok(())
    }

    fn initialize(&mut self, args: &StateArgs, hold_state: bool) -> PropsResult<Vec<VarRef>> {
        let names = self.state_var_names();
        for (name, value) in args {
            if !names.contains(name) {
                continue;
            }
            let var = self.block.require_var_mut(name)?;
            let indices: Vec<Index> = var.indices().cloned().collect();
            for i in &indices {
                var.set_value(i, *value)?;
            }
        }

        let mut fixed = Vec::new();
        if hold_state {
            for name in &names {
                let var = self.block.require_var_mut(name)?;
                let free: Vec<Index> = var.indices().filter(|i| !var.is_fixed(i)).cloned().collect();
                for i in free {
                    var.fix(&i, None)?;
                    fixed.push(var.var_ref(i));
                }
            }
        }
        debug!(block = self.block.name(), fixed = fixed.len(), "state initialized");
        Ok(fixed)
    }

    fn release_state(&mut self, fixed: &[VarRef]) -> PropsResult<()> {
        for r in fixed {
            if let Some(var) = self.block.var_for_ref_mut(r) {
                var.unfix(&r.index)?;
            }
        }
        Ok(())
    }
}
