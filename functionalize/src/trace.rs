//! The graph the trace-recording mode emits into.
//!
//! A trace consumer sees one node per rewritten call, never the original
//! mutating operation. Each node's output layout is fixed and documented:
//! logical outputs first, then mutated arguments in signature order, then
//! bystander aliases in alias-group order.

/// Index of a recorded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// One recorded input of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyInput {
    /// Produced by an earlier recorded node.
    Output { node: NodeId, index: usize },
    /// Lifted from outside the trace (environment tensor or constant);
    /// carries a human-readable description.
    Lifted(String),
}

/// One recorded `auto_functionalized` application.
#[derive(Debug, Clone)]
pub struct TraceNode {
    /// Name of the rewritten operation.
    pub op: String,
    /// Keyword inputs in deterministic (sorted-name) order.
    pub inputs: Vec<(String, ProxyInput)>,
    /// Total output arity: logical outputs + mutated arguments + aliases.
    pub n_outputs: usize,
}

/// A recorded program fragment.
#[derive(Default)]
pub struct TraceGraph {
    nodes: Vec<TraceNode>,
}

impl TraceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, op: impl Into<String>, inputs: Vec<(String, ProxyInput)>, n_outputs: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TraceNode { op: op.into(), inputs, n_outputs });
        id
    }

    pub fn nodes(&self) -> &[TraceNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
