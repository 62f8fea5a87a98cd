//! Declarative reaction package backed by fixed tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use cv_model::{Block, Expr, Index, Label};

use crate::basis::FlowBasis;
use crate::config::ReactionConfig;
use crate::error::{PropsError, PropsResult};
use crate::package::{ReactionBlock, ReactionCapabilities, ReactionPackage, StateBlock};

type StoichKey = (String, String, String);

#[derive(Debug)]
struct ReactionData {
    name: String,
    rate_reactions: Option<Vec<String>>,
    equilibrium_reactions: Option<Vec<String>>,
    stoichiometry: BTreeMap<StoichKey, f64>,
    basis: FlowBasis,
    dh_rxn: BTreeMap<String, f64>,
}

#[derive(Clone, Debug)]
pub struct TableReactions {
    data: Arc<ReactionData>,
}

impl TableReactions {
    pub fn builder(name: impl Into<String>) -> TableReactionsBuilder {
        TableReactionsBuilder {
            name: name.into(),
            rate_reactions: None,
            equilibrium_reactions: None,
            stoichiometry: BTreeMap::new(),
            basis: FlowBasis::Molar,
            dh_rxn: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct TableReactionsBuilder {
    name: String,
    rate_reactions: Option<Vec<String>>,
    equilibrium_reactions: Option<Vec<String>>,
    stoichiometry: BTreeMap<StoichKey, f64>,
    basis: FlowBasis,
    dh_rxn: BTreeMap<String, f64>,
}

impl TableReactionsBuilder {
    pub fn rate_reactions(mut self, names: &[&str]) -> Self {
        self.rate_reactions = Some(names.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn equilibrium_reactions(mut self, names: &[&str]) -> Self {
        self.equilibrium_reactions = Some(names.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn stoichiometry(mut self, reaction: &str, phase: &str, component: &str, nu: f64) -> Self {
        self.stoichiometry.insert(
            (reaction.to_string(), phase.to_string(), component.to_string()),
            nu,
        );
        self
    }

    pub fn basis(mut self, basis: FlowBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn heat_of_reaction(mut self, reaction: &str, dh: f64) -> Self {
        self.dh_rxn.insert(reaction.to_string(), dh);
        self
    }

    pub fn build(self) -> PropsResult<TableReactions> {
        let all: Vec<&String> = self
            .rate_reactions
            .iter()
            .flatten()
            .chain(self.equilibrium_reactions.iter().flatten())
            .collect();
        for (r, _, _) in self.stoichiometry.keys() {
            if !all.contains(&r) {
                return Err(PropsError::InvalidPackage {
                    what: format!("stoichiometry refers to unknown reaction '{r}'"),
                });
            }
        }
        for r in self.dh_rxn.keys() {
            if !all.contains(&r) {
                return Err(PropsError::InvalidPackage {
                    what: format!("heat of reaction given for unknown reaction '{r}'"),
                });
            }
        }
        Ok(TableReactions {
            data: Arc::new(ReactionData {
                name: self.name,
                rate_reactions: self.rate_reactions.filter(|r| !r.is_empty()),
                equilibrium_reactions: self.equilibrium_reactions.filter(|r| !r.is_empty()),
                stoichiometry: self.stoichiometry,
                basis: self.basis,
                dh_rxn: self.dh_rxn,
            }),
        })
    }
}

impl ReactionPackage for TableReactions {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn rate_reactions(&self) -> Option<&[String]> {
        self.data.rate_reactions.as_deref()
    }

    fn equilibrium_reactions(&self) -> Option<&[String]> {
        self.data.equilibrium_reactions.as_deref()
    }

    fn stoichiometry(&self, reaction: &str, phase: &str, component: &str) -> f64 {
        self.data
            .stoichiometry
            .get(&(reaction.to_string(), phase.to_string(), component.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    fn capabilities(&self) -> ReactionCapabilities {
        let mut reactions = self
            .data
            .rate_reactions
            .iter()
            .flatten()
            .chain(self.data.equilibrium_reactions.iter().flatten());
        ReactionCapabilities {
            rate_reactions: self.data.rate_reactions.is_some(),
            equilibrium_reactions: self.data.equilibrium_reactions.is_some(),
            heat_of_reaction: !self.data.dh_rxn.is_empty()
                && reactions.all(|r| self.data.dh_rxn.contains_key(r)),
        }
    }

    fn build_reaction(
        &self,
        name: &str,
        config: ReactionConfig,
        state: &dyn StateBlock,
    ) -> PropsResult<Box<dyn ReactionBlock>> {
        let mut block = Block::new(name);
        if let Some(rates) = &self.data.rate_reactions {
            block
                .add_var(
                    "reaction_rate",
                    rates.iter().map(|r| Index(vec![Label::from(r)])),
                )?
                .set_all(0.0);
        }
        Ok(Box::new(TableReactionBlock {
            data: self.data.clone(),
            block,
            config,
            state_name: state.block().name().to_string(),
        }))
    }
}

/// Reaction block produced by [`TableReactions`].
#[derive(Debug)]
pub struct TableReactionBlock {
    data: Arc<ReactionData>,
    block: Block,
    config: ReactionConfig,
    state_name: String,
}

impl TableReactionBlock {
    /// Name of the state block this reaction block was built against.
    pub fn state_name(&self) -> &str {
        &self.state_name
    }
}

impl ReactionBlock for TableReactionBlock {
    fn block(&self) -> &Block {
        &self.block
    }

    fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    fn config(&self) -> &ReactionConfig {
        &self.config
    }

    fn reaction_rate(&self, reaction: &str) -> PropsResult<Expr> {
        let known = self
            .data
            .rate_reactions
            .as_ref()
            .is_some_and(|r| r.iter().any(|n| n == reaction));
        if !known {
            return Err(PropsError::UnknownReaction {
                name: reaction.to_string(),
            });
        }
        Ok(self.block.term("reaction_rate", &cv_model::idx![reaction])?)
    }

    fn reaction_rate_basis(&self) -> FlowBasis {
        self.data.basis
    }

    fn dh_rxn(&self, reaction: &str) -> Option<Expr> {
        self.data.dh_rxn.get(reaction).map(|v| Expr::Const(*v))
    }

    fn model_check(&self) -> PropsResult<()> {
        if self.config.state_block.is_empty() {
            return Err(PropsError::CheckFailed {
                block: self.block.name().to_string(),
                what: "reaction block is not bound to a state block".into(),
            });
        }
        Ok(())
    }

    fn initialize(&mut self) -> PropsResult<()> {
        if let Some(rate) = self.block.var_mut("reaction_rate") {
            let unset: Vec<Index> = rate
                .entries()
                .filter(|(_, d)| d.value.is_none())
                .map(|(i, _)| i.clone())
                .collect();
            for i in unset {
                rate.set_value(&i, 0.0)?;
            }
        }
        Ok(())
    }
}
