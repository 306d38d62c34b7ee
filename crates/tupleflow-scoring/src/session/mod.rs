//! Sessions: the change-driver interface of a built network.
//!
//! A [`Session`] owns the facts, the tuples and the nodes. Every fact change
//! runs in two passes: source nodes turn the change into signals, then each
//! node drains its inbox in topological order and forwards what it emits to
//! its children. Tuples killed during the change are released only after the
//! change has settled.

mod analysis;
mod network;
mod weights;


pub use analysis::{ConstraintTotal, NodeStats, SignalCounts};
pub use weights::ConstraintWeightOverrides;

pub(crate) use network::Network;

use std::collections::VecDeque;

use tracing::{debug, error, info, trace, warn};
use tupleflow_config::EnvironmentMode;
use tupleflow_core::error::Result;
use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use crate::fact::{FactHandle, FactTable};
use crate::node::{FactChange, Node, NodeId, Propagation, Side, Signal, SignalKind};
use crate::tuple::TupleArena;

/// How to undo a change whose fact was rejected.
enum Rollback<F> {
    /// Forget a freshly inserted fact.
    Drop,
    /// Put back the value the fact had before an update.
    Restore(F),
}

/// An incremental scoring session over facts of type `F`.
///
/// Built by [`ConstraintFactory::build`](crate::stream::ConstraintFactory::build).
///
/// # Example
///
/// ```
/// use tupleflow_core::SimpleScore;
/// use tupleflow_scoring::stream::{joiner::equal, ConstraintFactory};
///
/// let factory = ConstraintFactory::<i64, SimpleScore>::new();
/// factory
///     .for_all()
///     .join_unique(equal(|v: &i64| *v))
///     .penalize(SimpleScore::of(1))
///     .as_constraint("Equal values");
/// let mut session = factory.build().unwrap();
///
/// let a = session.insert_fact(3).unwrap();
/// session.insert_fact(3).unwrap();
/// assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-1));
///
/// session.update_fact(a, |v| *v = 4).unwrap();
/// assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(0));
/// ```
pub struct Session<F, Sc: Score> {
    facts: FactTable<F>,
    tuples: TupleArena,
    nodes: Vec<Box<dyn Node<F, Sc>>>,
    children: Vec<Vec<(NodeId, Side)>>,
    sources: Vec<NodeId>,
    inboxes: Vec<VecDeque<(Side, Signal)>>,
    stats: Vec<NodeStats>,
    emitted: Vec<Signal>,
    score: Sc,
    environment_mode: EnvironmentMode,
    corruption: Option<String>,
}

impl<F, Sc: Score> std::fmt::Debug for Session<F, Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("nodes", &self.nodes.len())
            .field("score", &self.score)
            .field("environment_mode", &self.environment_mode)
            .finish_non_exhaustive()
    }
}

impl<F, Sc: Score> Session<F, Sc> {
    pub(crate) fn new(
        network: Network<F, Sc>,
        environment_mode: EnvironmentMode,
        overrides: &ConstraintWeightOverrides<Sc>,
    ) -> Self {
        let Network {
            mut nodes,
            children,
            sources,
            constraint_names,
        } = network;
        for node in &mut nodes {
            node.apply_weight_overrides(overrides);
        }
        let stats = nodes.iter().map(|node| NodeStats::new(node.kind())).collect();
        let inboxes = nodes.iter().map(|_| VecDeque::new()).collect();

        debug!(
            event = "session_built",
            nodes = nodes.len(),
            sources = sources.len(),
            constraints = constraint_names.len(),
            environment_mode = ?environment_mode,
        );

        Self {
            facts: FactTable::new(),
            tuples: TupleArena::new(),
            nodes,
            children,
            sources,
            inboxes,
            stats,
            emitted: Vec::new(),
            score: Sc::zero(),
            environment_mode,
            corruption: None,
        }
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }

    /// Inserts a new fact and propagates it.
    ///
    /// A fact rejected with [`TupleFlowError::DomainRange`] (for instance an
    /// interval whose end precedes its start) is dropped again and the
    /// session rebuilt without it.
    pub fn insert_fact(&mut self, fact: F) -> Result<FactHandle> {
        self.ensure_usable()?;
        let handle = self.facts.insert(fact);
        if let Err(err) = self.propagate(FactChange::Insert, handle) {
            return Err(self.recover(err, handle, Rollback::Drop));
        }
        trace!(event = "fact_inserted", fact = %handle, score = %self.score);
        self.check_quiescent()?;
        Ok(handle)
    }

    /// Retracts a fact, returning it.
    ///
    /// The fact stays readable by the nodes until the retraction settles.
    pub fn retract_fact(&mut self, handle: FactHandle) -> Result<F> {
        self.ensure_usable()?;
        if !self.facts.contains(handle) {
            return Err(ConsistencyError::UnknownFact {
                handle: handle.to_string(),
            }
            .into());
        }
        if let Err(err) = self.propagate(FactChange::Retract, handle) {
            return Err(self.poison(err));
        }
        let fact = self
            .facts
            .remove(handle)
            .ok_or_else(|| ConsistencyError::UnknownFact {
                handle: handle.to_string(),
            })?;
        trace!(event = "fact_retracted", fact = %handle, score = %self.score);
        self.check_quiescent()?;
        Ok(fact)
    }

    /// Mutates a fact in place and propagates the change.
    ///
    /// Nodes keep the keys they indexed a tuple under, so the mutation may
    /// change any property; a changed key becomes a retract then an insert
    /// inside the affected node. A mutation rejected with
    /// [`TupleFlowError::DomainRange`] is undone: the fact gets its previous
    /// value back, keeps its handle, and the session is rebuilt.
    pub fn update_fact<M>(&mut self, handle: FactHandle, mutate: M) -> Result<()>
    where
        F: Clone,
        M: FnOnce(&mut F),
    {
        self.ensure_usable()?;
        let fact = self
            .facts
            .get_mut(handle)
            .ok_or_else(|| ConsistencyError::UnknownFact {
                handle: handle.to_string(),
            })?;
        let previous = fact.clone();
        mutate(fact);
        if let Err(err) = self.propagate(FactChange::Update, handle) {
            return Err(self.recover(err, handle, Rollback::Restore(previous)));
        }
        trace!(event = "fact_updated", fact = %handle, score = %self.score);
        self.check_quiescent()
    }

    /// Returns the current score.
    ///
    /// In [`EnvironmentMode::FullAssert`] the network is rebuilt from scratch
    /// first and the call fails with [`TupleFlowError::ScoreCorruption`] if
    /// the incremental score differed from the recalculated one.
    pub fn calculate_score(&mut self) -> Result<Sc> {
        self.ensure_usable()?;
        if self.environment_mode.is_fully_asserted() {
            let incremental = self.score;
            self.rebuild()?;
            if self.score != incremental {
                warn!(
                    event = "score_corruption",
                    incremental = %incremental,
                    recalculated = %self.score,
                );
                return Err(TupleFlowError::ScoreCorruption {
                    incremental: incremental.to_string(),
                    recalculated: self.score.to_string(),
                });
            }
        }
        Ok(self.score)
    }

    /// The score as last propagated, without any checks.
    pub fn score(&self) -> Sc {
        self.score
    }

    pub fn fact(&self, handle: FactHandle) -> Option<&F> {
        self.facts.get(handle)
    }

    /// Live facts in handle slot order.
    pub fn facts(&self) -> impl Iterator<Item = (FactHandle, &F)> {
        self.facts.iter()
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of live tuples across all nodes.
    pub fn tuple_count(&self) -> usize {
        self.tuples.live_count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_stats(&self, node: NodeId) -> Option<&NodeStats> {
        self.stats.get(node)
    }

    /// Per-constraint totals, in constraint declaration order.
    pub fn constraint_totals(&self) -> Vec<ConstraintTotal<Sc>> {
        self.nodes
            .iter()
            .filter_map(|node| node.constraint_total())
            .collect()
    }

    /// Returns true once a consistency violation poisoned the session.
    pub fn is_corrupted(&self) -> bool {
        self.corruption.is_some()
    }

    /// Drops all node state and re-propagates every live fact from scratch.
    ///
    /// This is the only way to recover a corrupted session.
    pub fn rebuild(&mut self) -> Result<()> {
        for node in &mut self.nodes {
            node.reset();
        }
        for inbox in &mut self.inboxes {
            inbox.clear();
        }
        for stats in &mut self.stats {
            stats.clear();
        }
        self.tuples.clear();
        self.emitted.clear();
        self.score = Sc::zero();
        self.corruption = None;

        for handle in self.facts.handles() {
            if let Err(err) = self.propagate(FactChange::Insert, handle) {
                return Err(self.poison(err));
            }
        }
        info!(
            event = "session_rebuilt",
            facts = self.facts.len(),
            tuples = self.tuples.live_count(),
            score = %self.score,
        );
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        match &self.corruption {
            Some(reason) => Err(TupleFlowError::Corrupted(reason.clone())),
            None => Ok(()),
        }
    }

    fn poison(&mut self, err: TupleFlowError) -> TupleFlowError {
        error!(event = "session_poisoned", error = %err);
        self.corruption = Some(err.to_string());
        for inbox in &mut self.inboxes {
            inbox.clear();
        }
        self.emitted.clear();
        err
    }

    fn recover(
        &mut self,
        err: TupleFlowError,
        offending: FactHandle,
        rollback: Rollback<F>,
    ) -> TupleFlowError {
        if !matches!(err, TupleFlowError::DomainRange(_)) {
            return self.poison(err);
        }
        warn!(event = "change_rejected", fact = %offending, error = %err);
        match rollback {
            Rollback::Drop => {
                self.facts.remove(offending);
            }
            Rollback::Restore(previous) => {
                if let Some(fact) = self.facts.get_mut(offending) {
                    *fact = previous;
                }
            }
        }
        match self.rebuild() {
            Ok(()) => err,
            Err(rebuild_err) => rebuild_err,
        }
    }

    fn propagate(&mut self, change: FactChange, handle: FactHandle) -> Result<()> {
        for i in 0..self.sources.len() {
            let source = self.sources[i];
            let mut ctx = Propagation::new(
                &self.facts,
                &mut self.tuples,
                &mut self.score,
                &mut self.emitted,
            );
            self.nodes[source].fact_changed(change, handle, &mut ctx)?;
            self.route(source);
        }
        self.settle()
    }

    fn settle(&mut self) -> Result<()> {
        for id in 0..self.nodes.len() {
            while let Some((side, signal)) = self.inboxes[id].pop_front() {
                self.stats[id].record(side, signal.kind);
                let mut ctx = Propagation::new(
                    &self.facts,
                    &mut self.tuples,
                    &mut self.score,
                    &mut self.emitted,
                );
                let node = &mut self.nodes[id];
                match signal.kind {
                    SignalKind::Insert => node.insert(side, signal.tuple, &mut ctx)?,
                    SignalKind::Update => node.update(side, signal.tuple, &mut ctx)?,
                    SignalKind::Retract => node.retract(side, signal.tuple, &mut ctx)?,
                }
                self.route(id);
            }
        }
        self.tuples.release_dying();
        Ok(())
    }

    fn route(&mut self, from: NodeId) {
        for signal in self.emitted.drain(..) {
            for &(child, side) in &self.children[from] {
                self.inboxes[child].push_back((side, signal));
            }
        }
    }

    fn check_quiescent(&mut self) -> Result<()> {
        if !self.environment_mode.is_asserted() {
            return Ok(());
        }
        let pending: usize = self.inboxes.iter().map(VecDeque::len).sum();
        let unreleased = self.tuples.pending_release();
        if pending > 0 || unreleased > 0 {
            let err = TupleFlowError::Corrupted(format!(
                "network not quiescent: {} pending signals, {} unreleased tuples",
                pending, unreleased
            ));
            return Err(self.poison(err));
        }
        let summed = self
            .constraint_totals()
            .iter()
            .fold(Sc::zero(), |acc, total| acc + total.score);
        if summed != self.score {
            let err = TupleFlowError::Corrupted(format!(
                "constraint totals ({}) differ from session score ({})",
                summed, self.score
            ));
            return Err(self.poison(err));
        }
        Ok(())
    }
}
