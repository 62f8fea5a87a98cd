//! Zero-dimensional (well-mixed) control volume: one inlet and one outlet
//! state per time point.

use std::collections::BTreeMap;

use cv_core::{CvError, CvResult, defaults};
use cv_model::{Block, ConstraintSet, Expr, Index};
use cv_props::{ReactionBlock, ReactionConfig, StateArgs, StateBlock, StateConfig};
use tracing::{debug, info};

use crate::arena::PointArena;
use crate::assemble::{self, FlowSpec, Layout};
use crate::balance::{
    EnergyBalanceArgs, InitFlags, MaterialBalanceArgs, MomentumBalanceArgs, ReactionBlockArgs,
    StateBlockArgs,
};
use crate::base::{BuildStage, Packages, Point, VolumeCore};
use crate::config::{ControlVolumeOptions, FlowDirection};
use crate::conversion;
use crate::ports::Port;
use crate::time::TimeDomain;
use crate::volume::{self, ControlVolume};

/// Arena column of each state family in `InitFlags`.
const INLET: usize = 0;
const OUTLET: usize = 1;

type States = PointArena<Box<dyn StateBlock>>;

pub struct ControlVolume0D {
    core: VolumeCore,
    information_flow: FlowDirection,
    properties_in: Option<States>,
    properties_out: Option<States>,
    reactions: Option<PointArena<Box<dyn ReactionBlock>>>,
}

impl ControlVolume0D {
    pub fn new(
        name: &str,
        time: TimeDomain,
        packages: Packages,
        options: ControlVolumeOptions,
    ) -> CvResult<Self> {
        let auto = options.auto_construct;
        let mut cv = Self {
            core: VolumeCore::new(name, time, packages, options)?,
            information_flow: FlowDirection::default(),
            properties_in: None,
            properties_out: None,
            reactions: None,
        };
        if auto {
            cv.auto_construct()?;
        }
        Ok(cv)
    }

    /// Build everything the options describe; geometry only with holdup.
    pub fn auto_construct(&mut self) -> CvResult<()> {
        if self.core.has_holdup {
            self.add_geometry()?;
        }
        let has_reactions = self.core.packages.reaction.is_some();
        volume::construct_from_options(self, has_reactions)
    }

    /// Create `volume[t]`.
    pub fn add_geometry(&mut self) -> CvResult<()> {
        self.core.ensure_open("add_geometry")?;
        if self.core.block.has_component("volume") {
            return Err(CvError::config(format!(
                "{}: geometry has already been added",
                self.core.name()
            )));
        }
        let indices: Vec<Index> = self.points().iter().map(|p| p.index()).collect();
        let mut staged = self.core.block.scratch();
        staged
            .add_var("volume", indices)?
            .set_all(defaults::volume().value);
        self.core.block.merge(staged)?;
        self.core.advance(BuildStage::Geometry);
        debug!(cv = %self.core.name(), "volume added");
        Ok(())
    }

    pub fn information_flow(&self) -> FlowDirection {
        self.information_flow
    }

    pub fn properties_in(&self, t: usize) -> Option<&dyn StateBlock> {
        self.properties_in.as_ref()?.get(t, 0).map(|b| &**b)
    }

    pub fn properties_out(&self, t: usize) -> Option<&dyn StateBlock> {
        self.properties_out.as_ref()?.get(t, 0).map(|b| &**b)
    }

    pub fn reactions(&self, t: usize) -> Option<&dyn ReactionBlock> {
        self.reactions.as_ref()?.get(t, 0).map(|b| &**b)
    }

    fn arena<'a>(&self, states: &'a Option<States>) -> CvResult<&'a States> {
        states.as_ref().ok_or_else(|| {
            CvError::config(format!("{}: state blocks have not been added", self.core.name()))
        })
    }

    pub fn rxn_rate_conversion(
        &self,
        t: usize,
        component: &str,
        has_rate_reactions: bool,
    ) -> CvResult<Expr> {
        let state: &dyn StateBlock = &**self.arena(&self.properties_out)?.at(t, 0)?;
        conversion::rxn_rate_conversion(state, self.reactions(t), component, has_rate_reactions)
    }

    fn build_states(
        &self,
        family: &str,
        defined_state: bool,
        has_phase_equilibrium: bool,
    ) -> CvResult<States> {
        let name = self.core.name();
        let property = &self.core.packages.property;
        PointArena::build(self.core.time.len(), 1, |t, _| {
            let config = StateConfig {
                parameters: property.name().to_string(),
                defined_state,
                has_phase_equilibrium,
                extra: self.core.options.property_package_args.clone(),
            };
            Ok(property.build_state(&format!("{name}.{family}[{t}]"), config)?)
        })
    }

    fn family_port(&mut self, name: &str, column: usize) -> CvResult<&Port> {
        let family = if column == INLET {
            &self.properties_in
        } else {
            &self.properties_out
        };
        let states = self.arena(family)?;
        let members: Vec<&dyn StateBlock> = states.iter().map(|(_, b)| &**b).collect();
        let port = Port::from_states(name, members);
        self.core.add_port(port)
    }
}

impl Layout for ControlVolume0D {
    fn core(&self) -> &VolumeCore {
        &self.core
    }

    fn points(&self) -> Vec<Point> {
        (0..self.core.time.len())
            .map(|t| Point { t, x: None })
            .collect()
    }

    fn balance_points(&self) -> Vec<Point> {
        self.points()
    }

    fn has_geometry(&self) -> bool {
        self.core.block.has_component("volume")
    }

    fn geometry_factor(&self, p: Point) -> CvResult<Expr> {
        Ok(self.core.block.term("volume", &p.index())?)
    }

    fn generation_scale(&self) -> CvResult<Expr> {
        Ok(Expr::one())
    }

    /// The outlet state represents the well-mixed contents.
    fn state_at(&self, p: Point) -> CvResult<&dyn StateBlock> {
        Ok(&**self.arena(&self.properties_out)?.at(p.t, 0)?)
    }

    fn reaction_block(&self, p: Point) -> Option<&dyn ReactionBlock> {
        self.reactions(p.t)
    }

    /// Inlet minus outlet; nothing is staged.
    fn flow_terms(
        &self,
        _staged: &mut Block,
        spec: &FlowSpec<'_>,
    ) -> CvResult<BTreeMap<Index, Expr>> {
        let inlet = self.arena(&self.properties_in)?;
        let outlet = self.arena(&self.properties_out)?;
        let mut out = BTreeMap::new();
        for p in self.points() {
            let s_in: &dyn StateBlock = &**inlet.at(p.t, 0)?;
            let s_out: &dyn StateBlock = &**outlet.at(p.t, 0)?;
            for a in spec.axes {
                let net = (spec.accessor)(s_in, a)? - (spec.accessor)(s_out, a)?;
                out.insert(p.with(a), net);
            }
        }
        Ok(out)
    }
}

impl ControlVolume for ControlVolume0D {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn block(&self) -> &Block {
        &self.core.block
    }

    fn options(&self) -> &ControlVolumeOptions {
        &self.core.options
    }

    fn is_dynamic(&self) -> bool {
        self.core.dynamic
    }

    fn has_holdup(&self) -> bool {
        self.core.has_holdup
    }

    /// `properties_in[t]` and `properties_out[t]`; forward information flow
    /// makes the inlet the defined state.
    fn add_state_blocks(&mut self, args: StateBlockArgs) -> CvResult<()> {
        self.core.ensure_open("add_state_blocks")?;
        let name = self.core.name().to_string();
        if self.properties_in.is_some() {
            return Err(CvError::config(format!("{name}: state blocks already exist")));
        }
        let has_phase_equilibrium = args.has_phase_equilibrium.ok_or_else(|| {
            CvError::config(format!("{name}: has_phase_equilibrium must be given for state blocks"))
        })?;
        let information_flow = args.information_flow.unwrap_or_default();
        let forward = information_flow == FlowDirection::Forward;
        let inlet = self.build_states("properties_in", forward, has_phase_equilibrium)?;
        let outlet = self.build_states("properties_out", !forward, has_phase_equilibrium)?;
        info!(cv = %name, blocks = inlet.len() + outlet.len(), %information_flow, "state blocks added");
        self.properties_in = Some(inlet);
        self.properties_out = Some(outlet);
        self.information_flow = information_flow;
        self.core.state_phase_equilibrium = Some(has_phase_equilibrium);
        self.core.advance(BuildStage::StateBlocks);
        Ok(())
    }

    fn add_reaction_blocks(&mut self, args: ReactionBlockArgs) -> CvResult<()> {
        self.core.ensure_open("add_reaction_blocks")?;
        let name = self.core.name().to_string();
        if self.reactions.is_some() {
            return Err(CvError::config(format!("{name}: reaction blocks already exist")));
        }
        let package = self.core.packages.reaction.clone().ok_or_else(|| {
            CvError::config(format!("{name}: no reaction package is bound"))
        })?;
        let has_equilibrium = args.has_equilibrium.ok_or_else(|| {
            CvError::config(format!("{name}: has_equilibrium must be given for reaction blocks"))
        })?;
        let outlet = self.properties_out.as_ref().ok_or_else(|| {
            CvError::config(format!("{name}: state blocks must be added before reaction blocks"))
        })?;
        let config = ReactionConfig {
            parameters: package.name().to_string(),
            state_block: format!("{name}.properties_out"),
            has_equilibrium,
            extra: self.core.options.reaction_package_args.clone(),
        };
        let arena = PointArena::build(self.core.time.len(), 1, |t, _| {
            let state: &dyn StateBlock = &**outlet.at(t, 0)?;
            Ok(package.build_reaction(&format!("{name}.reactions[{t}]"), config.clone(), state)?)
        })?;
        info!(cv = %name, blocks = arena.len(), has_equilibrium, "reaction blocks added");
        self.reactions = Some(arena);
        self.core.reaction_equilibrium = Some(has_equilibrium);
        self.core.advance(BuildStage::ReactionBlocks);
        Ok(())
    }

    fn add_phase_component_balances(
        &mut self,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        let staged = assemble::material::phase_component(self, &args)?;
        self.core.commit(staged, "material_balances")
    }

    fn add_total_component_balances(
        &mut self,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        let staged = assemble::material::total_component(self, &args)?;
        self.core.commit(staged, "material_balances")
    }

    fn add_total_element_balances(
        &mut self,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        let staged = assemble::material::total_element(self, &args)?;
        self.core.commit(staged, "element_balances")
    }

    fn add_total_enthalpy_balances(
        &mut self,
        args: EnergyBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        let staged = assemble::energy::total_enthalpy(self, &args)?;
        self.core.commit(staged, "enthalpy_balances")
    }

    fn add_total_pressure_balances(
        &mut self,
        args: MomentumBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        let staged = assemble::momentum::total_pressure(self, &args)?;
        self.core.commit(staged, "pressure_balance")
    }

    fn model_check(&self) -> CvResult<()> {
        for family in [&self.properties_in, &self.properties_out] {
            for (_, state) in self.arena(family)?.iter() {
                state.model_check()?;
            }
        }
        if let Some(reactions) = &self.reactions {
            for (_, r) in reactions.iter() {
                r.model_check()?;
            }
        }
        Ok(())
    }

    fn initialize(&mut self, args: &StateArgs) -> CvResult<InitFlags> {
        let name = self.core.name().to_string();
        let forward = self.information_flow == FlowDirection::Forward;
        let mut flags = InitFlags::default();
        let families = [
            (INLET, forward, self.properties_in.as_mut()),
            (OUTLET, !forward, self.properties_out.as_mut()),
        ];
        for (column, hold, states) in families {
            let states = states.ok_or_else(|| {
                CvError::config(format!("{name}: state blocks have not been added"))
            })?;
            for ((t, _), state) in states.iter_mut() {
                let fixed = state.initialize(args, hold)?;
                if !fixed.is_empty() {
                    flags.fixed.push(((t, column), fixed));
                }
            }
        }
        if let Some(reactions) = self.reactions.as_mut() {
            for (_, r) in reactions.iter_mut() {
                r.initialize()?;
            }
        }
        debug!(cv = %name, held = flags.len(), "initialized");
        Ok(flags)
    }

    fn release_state(&mut self, flags: InitFlags) -> CvResult<()> {
        let name = self.core.name().to_string();
        for ((t, column), refs) in flags.fixed {
            let family = if column == INLET {
                self.properties_in.as_mut()
            } else {
                self.properties_out.as_mut()
            };
            let state = family
                .and_then(|a| a.get_mut(t, 0))
                .ok_or_else(|| CvError::internal(format!("{name}: no state block at ({t}, {column})")))?;
            state.release_state(&refs)?;
        }
        Ok(())
    }

    fn add_inlet_port(&mut self) -> CvResult<&Port> {
        self.family_port("inlet", INLET)
    }

    fn add_outlet_port(&mut self) -> CvResult<&Port> {
        self.family_port("outlet", OUTLET)
    }

    fn port(&self, name: &str) -> Option<&Port> {
        self.core.ports.get(name)
    }
}
