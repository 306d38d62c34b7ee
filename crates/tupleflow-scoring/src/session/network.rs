//! Node graph assembled by the stream builder and owned by a session.

use tupleflow_core::Score;

use crate::node::{Node, NodeId, Side};

/// Nodes in topological order with their outgoing edges.
///
/// A node is only ever appended after all of its inputs, so processing
/// nodes by ascending id visits every parent before its children.
pub(crate) struct Network<F, Sc: Score> {
    pub(crate) nodes: Vec<Box<dyn Node<F, Sc>>>,
    pub(crate) children: Vec<Vec<(NodeId, Side)>>,
    pub(crate) sources: Vec<NodeId>,
    pub(crate) constraint_names: Vec<String>,
}

impl<F, Sc: Score> Default for Network<F, Sc> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            children: Vec::new(),
            sources: Vec::new(),
            constraint_names: Vec::new(),
        }
    }
}

impl<F, Sc: Score> Network<F, Sc> {
    pub(crate) fn add_source(&mut self, node: Box<dyn Node<F, Sc>>) -> NodeId {
        let id = self.add_node(node, &[]);
        self.sources.push(id);
        id
    }

    pub(crate) fn add_node(
        &mut self,
        node: Box<dyn Node<F, Sc>>,
        inputs: &[(NodeId, Side)],
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.children.push(Vec::new());
        for &(parent, side) in inputs {
            self.children[parent].push((id, side));
        }
        id
    }

    pub(crate) fn add_constraint(
        &mut self,
        name: &str,
        node: Box<dyn Node<F, Sc>>,
        input: NodeId,
    ) -> NodeId {
        self.constraint_names.push(name.to_string());
        self.add_node(node, &[(input, Side::Left)])
    }
}
