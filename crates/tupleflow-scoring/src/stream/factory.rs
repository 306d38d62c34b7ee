// Constraint factory: entry point of the fluent constraint API.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tupleflow_config::{EngineConfig, EnvironmentMode};
use tupleflow_core::error::Result;
use tupleflow_core::{ParseableScore, Score, TupleFlowError};

use super::joiner::Joiner;
use super::{BiStream, UniStream};
use crate::node::ForEachNode;
use crate::session::{ConstraintWeightOverrides, Network, Session};

// Factory for creating constraint streams over facts of type `F`.
//
// Streams created from one factory share its network; `build` hands the
// network to a new session.
pub struct ConstraintFactory<F, Sc: Score> {
    network: Rc<RefCell<Network<F, Sc>>>,
}

impl<F: 'static, Sc: Score> Default for ConstraintFactory<F, Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: 'static, Sc: Score> ConstraintFactory<F, Sc> {
    pub fn new() -> Self {
        Self {
            network: Rc::new(RefCell::new(Network::default())),
        }
    }

    // Creates a stream of every fact matching the predicate.
    pub fn for_each<P>(&self, predicate: P) -> UniStream<F, Sc>
    where
        P: Fn(&F) -> bool + Send + 'static,
    {
        let node = self
            .network
            .borrow_mut()
            .add_source(Box::new(ForEachNode::new(predicate)));
        UniStream::new(Rc::clone(&self.network), node)
    }

    // Creates a stream of every fact.
    pub fn for_all(&self) -> UniStream<F, Sc> {
        self.for_each(|_: &F| true)
    }

    // Creates a stream of unique pairs of matching facts, never pairing a fact with itself.
    pub fn for_each_unique_pair<P, J>(&self, predicate: P, joiner: J) -> BiStream<F, Sc>
    where
        P: Fn(&F) -> bool + Send + 'static,
        J: Joiner<F>,
    {
        self.for_each(predicate).join_unique(joiner)
    }

    // Builds a session with default settings.
    pub fn build(self) -> Result<Session<F, Sc>> {
        self.build_with(EnvironmentMode::default(), &ConstraintWeightOverrides::new())
    }

    // Builds a session with an environment mode and weight overrides.
    //
    // Fails with a configuration error if two constraints share a name or an
    // override names no constraint.
    pub fn build_with(
        self,
        environment_mode: EnvironmentMode,
        overrides: &ConstraintWeightOverrides<Sc>,
    ) -> Result<Session<F, Sc>> {
        let network = std::mem::take(&mut *self.network.borrow_mut());
        {
            let mut names = HashSet::new();
            for name in &network.constraint_names {
                if !names.insert(name.as_str()) {
                    return Err(TupleFlowError::Config(format!(
                        "duplicate constraint name '{}'",
                        name
                    )));
                }
            }
            if let Some(unknown) = overrides.names().find(|name| !names.contains(name)) {
                return Err(TupleFlowError::Config(format!(
                    "weight override for unknown constraint '{}'",
                    unknown
                )));
            }
        }
        Ok(Session::new(network, environment_mode, overrides))
    }

    // Builds a session from an engine configuration.
    pub fn build_from_config(self, config: &EngineConfig) -> Result<Session<F, Sc>>
    where
        Sc: ParseableScore,
    {
        let overrides = ConstraintWeightOverrides::from_pairs(config.parsed_weights::<Sc>()?);
        self.build_with(config.environment_mode, &overrides)
    }
}

impl<F, Sc: Score> std::fmt::Debug for ConstraintFactory<F, Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintFactory")
            .field("nodes", &self.network.borrow().nodes.len())
            .finish()
    }
}
