//! One-dimensional control volume: balances at every (time, length) point.

use std::collections::BTreeMap;

use cv_core::{CvError, CvResult, defaults};
use cv_model::{Block, Constraint, ConstraintSet, Domain, Expr, Index, Label};
use cv_props::{ReactionBlock, ReactionConfig, StateArgs, StateBlock, StateConfig};
use tracing::{debug, info, warn};

use crate::arena::PointArena;
use crate::assemble::{self, FlowSpec, Layout, add_constraints, product, var};
use crate::balance::{
    EnergyBalanceArgs, InitFlags, MaterialBalanceArgs, MomentumBalanceArgs, ReactionBlockArgs,
    StateBlockArgs,
};
use crate::base::{BuildStage, Packages, Point, VolumeCore};
use crate::config::{
    AreaDefinition, ControlVolumeOptions, FlowDirection, TransformationMethod,
    TransformationScheme,
};
use crate::conversion;
use crate::discretize::{StencilKind, derivative_stencils, discretize};
use crate::geometry::{GeometryArgs, LengthDomain};
use crate::ports::Port;
use crate::time::TimeDomain;
use crate::volume::{self, ControlVolume};

fn position(x: usize) -> Index {
    Index(vec![Label::Pos(x)])
}

/// Control volume discretized along a normalized length coordinate.
///
/// Build order: `add_geometry`, optionally `apply_transformation`,
/// `add_state_blocks`, optionally `add_reaction_blocks`, then balances.
pub struct ControlVolume1D {
    core: VolumeCore,
    method: TransformationMethod,
    scheme: TransformationScheme,
    domain: Option<LengthDomain>,
    flow_direction: FlowDirection,
    /// Direction the state information travels; fixes the defined-state boundary.
    information_flow: FlowDirection,
    properties: Option<PointArena<Box<dyn StateBlock>>>,
    reactions: Option<PointArena<Box<dyn ReactionBlock>>>,
}

impl ControlVolume1D {
    pub fn new(
        name: &str,
        time: TimeDomain,
        packages: Packages,
        options: ControlVolumeOptions,
    ) -> CvResult<Self> {
        let (method, scheme) = options.transformation()?;
        let auto = options.auto_construct;
        let mut cv = Self {
            core: VolumeCore::new(name, time, packages, options)?,
            method,
            scheme,
            domain: None,
            flow_direction: FlowDirection::default(),
            information_flow: FlowDirection::default(),
            properties: None,
            reactions: None,
        };
        if auto {
            cv.auto_construct()?;
        }
        Ok(cv)
    }

    /// Build everything the options describe, in order.
    pub fn auto_construct(&mut self) -> CvResult<()> {
        let o = &self.core.options;
        let args = GeometryArgs {
            length_domain: None,
            length_domain_set: o.length_domain_set.clone(),
            flow_direction: Some(o.flow_direction),
        };
        self.add_geometry(args)?;
        self.apply_transformation()?;
        let has_reactions = self.core.packages.reaction.is_some();
        volume::construct_from_options(self, has_reactions)
    }

    pub fn length_domain(&self) -> Option<&LengthDomain> {
        self.domain.as_ref()
    }

    pub fn flow_direction(&self) -> FlowDirection {
        self.flow_direction
    }

    pub fn information_flow(&self) -> FlowDirection {
        self.information_flow
    }

    pub fn transformation(&self) -> (TransformationMethod, TransformationScheme) {
        (self.method, self.scheme)
    }

    /// Length position without governing equations, once state blocks exist.
    pub fn excluded_point(&self) -> Option<usize> {
        let domain = self.domain.as_ref()?;
        self.properties
            .as_ref()
            .map(|_| domain.inlet(self.information_flow))
    }

    pub fn properties(&self, t: usize, x: usize) -> Option<&dyn StateBlock> {
        self.properties.as_ref()?.get(t, x).map(|b| &**b)
    }

    pub fn reactions(&self, t: usize, x: usize) -> Option<&dyn ReactionBlock> {
        self.reactions.as_ref()?.get(t, x).map(|b| &**b)
    }

    /// Create `area` and `length` over the chosen length domain.
    pub fn add_geometry(&mut self, args: GeometryArgs) -> CvResult<()> {
        self.core.ensure_open("add_geometry")?;
        if self.domain.is_some() {
            return Err(CvError::config(format!(
                "{}: geometry has already been added",
                self.core.name()
            )));
        }
        let (domain, direction) = args.resolve()?;
        let mut staged = self.core.block.scratch();
        let area = match self.core.options.area_definition {
            AreaDefinition::Uniform => vec![Index::scalar()],
            AreaDefinition::Variant => (0..domain.len()).map(position).collect(),
        };
        staged.add_var("area", area)?.set_all(defaults::area().value);
        staged
            .add_var("length", [Index::scalar()])?
            .set_all(defaults::length().value);
        self.core.block.merge(staged)?;
        debug!(
            cv = %self.core.name(),
            points = domain.len(),
            owned = domain.is_owned(),
            %direction,
            "geometry added"
        );
        if domain.is_transformed() {
            self.core.advance(BuildStage::Transformed);
        } else {
            self.core.advance(BuildStage::Geometry);
        }
        self.domain = Some(domain);
        self.flow_direction = direction;
        self.information_flow = direction;
        Ok(())
    }

    /// Discretize the owned length domain with the configured method.
    pub fn apply_transformation(&mut self) -> CvResult<()> {
        let name = self.core.name().to_string();
        self.core.ensure_open("apply_transformation")?;
        let domain = self.domain.as_ref().ok_or_else(|| {
            CvError::config(format!("{name}: add_geometry must be called before apply_transformation"))
        })?;
        if !domain.is_owned() {
            return Err(CvError::config(format!(
                "{name}: the length domain is owned elsewhere and cannot be transformed here"
            )));
        }
        if domain.is_transformed() {
            return Err(CvError::config(format!(
                "{name}: the length domain has already been transformed"
            )));
        }
        if self.properties.is_some() {
            return Err(CvError::config(format!(
                "{name}: apply_transformation called after state blocks were added"
            )));
        }
        let elements = match self.core.options.finite_elements {
            Some(n) if n > 0 => n,
            _ => {
                return Err(CvError::config(format!(
                    "{name}: finite_elements must be set to at least 1"
                )));
            }
        };
        let discretized = discretize(
            domain,
            self.method,
            self.scheme,
            elements,
            self.core.options.collocation_points,
        )?;
        if self.core.options.area_definition == AreaDefinition::Variant {
            self.core
                .block
                .require_var_mut("area")?
                .reindex((0..discretized.len()).map(position));
        }
        debug!(
            cv = %name,
            method = %self.method,
            scheme = %self.scheme,
            elements,
            points = discretized.len(),
            "length domain transformed"
        );
        self.domain = Some(discretized);
        self.core.advance(BuildStage::Transformed);
        Ok(())
    }

    /// The length domain, transformed or not.
    ///
    /// An owned domain that was never transformed keeps its continuous-set
    /// points and is differenced with the scheme's finite-difference stencil.
    fn domain(&self) -> CvResult<&LengthDomain> {
        self.domain.as_ref().ok_or_else(|| {
            CvError::config(format!(
                "{}: add_geometry must be called before adding state blocks",
                self.core.name()
            ))
        })
    }

    fn states(&self) -> CvResult<&PointArena<Box<dyn StateBlock>>> {
        self.properties.as_ref().ok_or_else(|| {
            CvError::config(format!("{}: state blocks have not been added", self.core.name()))
        })
    }

    /// Conversion of reaction generation of `component` at `(t, x)` into the
    /// property basis.
    pub fn rxn_rate_conversion(
        &self,
        t: usize,
        x: usize,
        component: &str,
        has_rate_reactions: bool,
    ) -> CvResult<Expr> {
        let state: &dyn StateBlock = &**self.states()?.at(t, x)?;
        conversion::rxn_rate_conversion(state, self.reactions(t, x), component, has_rate_reactions)
    }

    fn boundary_port(&mut self, name: &str, x: usize) -> CvResult<&Port> {
        let states = self.states()?;
        let nt = self.core.time.len();
        let members = (0..nt)
            .map(|t| states.at(t, x).map(|b| &**b))
            .collect::<CvResult<Vec<&dyn StateBlock>>>()?;
        let port = Port::from_states(name, members);
        self.core.add_port(port)
    }
}

impl Layout for ControlVolume1D {
    fn core(&self) -> &VolumeCore {
        &self.core
    }

    fn points(&self) -> Vec<Point> {
        let nx = self.domain.as_ref().map_or(0, LengthDomain::len);
        (0..self.core.time.len())
            .flat_map(|t| (0..nx).map(move |x| Point { t, x: Some(x) }))
            .collect()
    }

    fn balance_points(&self) -> Vec<Point> {
        let excluded = self.excluded_point();
        self.points()
            .into_iter()
            .filter(|p| p.x != excluded)
            .collect()
    }

    fn has_geometry(&self) -> bool {
        self.domain.is_some()
    }

    fn geometry_factor(&self, p: Point) -> CvResult<Expr> {
        let index = match self.core.options.area_definition {
            AreaDefinition::Uniform => Index::scalar(),
            AreaDefinition::Variant => position(p.x.unwrap_or(0)),
        };
        Ok(self.core.block.term("area", &index)?)
    }

    fn generation_scale(&self) -> CvResult<Expr> {
        Ok(self.core.block.term("length", &Index::scalar())?)
    }

    fn state_at(&self, p: Point) -> CvResult<&dyn StateBlock> {
        Ok(&**self.states()?.at(p.t, p.x.unwrap_or(0))?)
    }

    fn reaction_block(&self, p: Point) -> Option<&dyn ReactionBlock> {
        self.reactions(p.t, p.x.unwrap_or(0))
    }

    /// Stage the flow variable, its link to the state blocks, its length
    /// derivative and the discretization equations; return the signed
    /// derivative at every balance point.
    fn flow_terms(
        &self,
        staged: &mut Block,
        spec: &FlowSpec<'_>,
    ) -> CvResult<BTreeMap<Index, Expr>> {
        let domain = self.domain()?;
        let points = self.points();
        let indices = product(&points, spec.axes);
        staged.add_var(spec.var, indices.clone())?;

        let mut linking = Vec::with_capacity(indices.len());
        for p in &points {
            let state = self.state_at(*p)?;
            for a in spec.axes {
                let i = p.with(a);
                let value = (spec.accessor)(state, a)?;
                linking.push((i.clone(), Constraint::eq(var(staged, spec.var, i), value)));
            }
        }
        add_constraints(staged, spec.linking, linking)?;

        staged.add_derivative_var(spec.dx, spec.var, Domain::Length, indices)?;
        let stencils = derivative_stencils(domain, self.scheme);
        let mut disc = Vec::new();
        for t in 0..self.core.time.len() {
            for s in &stencils {
                let at = Point { t, x: Some(s.point) };
                for a in spec.axes {
                    let rhs = Expr::sum(s.weights.iter().map(|&(k, w)| {
                        w * var(staged, spec.var, Point { t, x: Some(k) }.with(a))
                    }));
                    let lhs = match s.kind {
                        StencilKind::Derivative => var(staged, spec.dx, at.with(a)),
                        StencilKind::Continuity => var(staged, spec.var, at.with(a)),
                    };
                    disc.push((at.with(a), Constraint::eq(lhs, rhs)));
                }
            }
        }
        add_constraints(staged, &format!("{}_disc_eq", spec.dx), disc)?;

        let sign = self.flow_direction.sign();
        let mut out = BTreeMap::new();
        for p in self.balance_points() {
            for a in spec.axes {
                let i = p.with(a);
                out.insert(i.clone(), sign * var(staged, spec.dx, i));
            }
        }
        Ok(out)
    }
}

impl ControlVolume for ControlVolume1D {
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

    fn add_state_blocks(&mut self, args: StateBlockArgs) -> CvResult<()> {
        self.core.ensure_open("add_state_blocks")?;
        let name = self.core.name().to_string();
        if self.properties.is_some() {
            return Err(CvError::config(format!("{name}: state blocks already exist")));
        }
        let has_phase_equilibrium = args.has_phase_equilibrium.ok_or_else(|| {
            CvError::config(format!("{name}: has_phase_equilibrium must be given for state blocks"))
        })?;
        let domain = self.domain()?;
        let information_flow = args.information_flow.unwrap_or(self.flow_direction);
        let defined = domain.inlet(information_flow);
        if self.scheme.open_boundary() != information_flow {
            warn!(
                cv = %name,
                scheme = %self.scheme,
                %information_flow,
                "defined-state boundary differs from the scheme's open boundary; \
                 the far boundary derivative has no discretization equation"
            );
        }

        let property = self.core.packages.property.clone();
        let config = StateConfig {
            parameters: property.name().to_string(),
            defined_state: false,
            has_phase_equilibrium,
            extra: self.core.options.property_package_args.clone(),
        };
        let arena = PointArena::build(self.core.time.len(), domain.len(), |t, x| {
            let config = StateConfig {
                defined_state: x == defined,
                ..config.clone()
            };
            Ok(property.build_state(&format!("{name}.properties[{t},{x}]"), config)?)
        })?;
        info!(cv = %name, blocks = arena.len(), defined, "state blocks added");
        self.properties = Some(arena);
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
        let states = self.properties.as_ref().ok_or_else(|| {
            CvError::config(format!("{name}: state blocks must be added before reaction blocks"))
        })?;
        let config = ReactionConfig {
            parameters: package.name().to_string(),
            state_block: format!("{name}.properties"),
            has_equilibrium,
            extra: self.core.options.reaction_package_args.clone(),
        };
        let (nt, nx) = states.shape();
        let arena = PointArena::build(nt, nx, |t, x| {
            let state: &dyn StateBlock = &**states.at(t, x)?;
            Ok(package.build_reaction(&format!("{name}.reactions[{t},{x}]"), config.clone(), state)?)
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
        for (_, state) in self.states()?.iter() {
            state.model_check()?;
        }
        if let Some(reactions) = &self.reactions {
            for (_, r) in reactions.iter() {
                r.model_check()?;
            }
        }
        Ok(())
    }

    fn initialize(&mut self, args: &StateArgs) -> CvResult<InitFlags> {
        let defined = self
            .excluded_point()
            .ok_or_else(|| CvError::config(format!("{}: nothing to initialize", self.core.name())))?;
        let mut flags = InitFlags::default();
        if let Some(states) = self.properties.as_mut() {
            for ((t, x), state) in states.iter_mut() {
                let fixed = state.initialize(args, x == defined)?;
                if !fixed.is_empty() {
                    flags.fixed.push(((t, x), fixed));
                }
            }
        }
        if let Some(reactions) = self.reactions.as_mut() {
            for (_, r) in reactions.iter_mut() {
                r.initialize()?;
            }
        }
        debug!(cv = %self.core.name(), held = flags.len(), "initialized");
        Ok(flags)
    }

    fn release_state(&mut self, flags: InitFlags) -> CvResult<()> {
        let name = self.core.name().to_string();
        let states = self
            .properties
            .as_mut()
            .ok_or_else(|| CvError::config(format!("{name}: state blocks have not been added")))?;
        for ((t, x), refs) in flags.fixed {
            let state = states
                .get_mut(t, x)
                .ok_or_else(|| CvError::internal(format!("{name}: no state block at ({t}, {x})")))?;
            state.release_state(&refs)?;
        }
        Ok(())
    }

    fn add_inlet_port(&mut self) -> CvResult<&Port> {
        let x = self.excluded_point().ok_or_else(|| {
            CvError::config(format!("{}: state blocks must be added before ports", self.core.name()))
        })?;
        self.boundary_port("inlet", x)
    }

    fn add_outlet_port(&mut self) -> CvResult<&Port> {
        let domain = self.domain()?;
        let x = domain.outlet(self.information_flow);
        self.boundary_port("outlet", x)
    }

    fn port(&self, name: &str) -> Option<&Port> {
        self.core.ports.get(name)
    }
}
