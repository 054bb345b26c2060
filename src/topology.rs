//! Compiles a gene list into an evaluation plan.
//!
//! Nodes live in an arena and are addressed by their index ("handle"). Names
//! are only resolved when the topology is built and at the evaluation boundary.

use crate::activation::Activation;
use crate::error::{NeatError, Result};
use crate::gene::{Gene, GeneKind};
use std::collections::HashMap;

/// Name of the bias node, which always emits 1.0.
pub const BIAS: &str = "b";

/// Handle of the bias node in every topology.
const BIAS_HANDLE: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub sink: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Number of enabled connections ending in this node.
    pub fan_in: usize,
    pub edges: Vec<Edge>,
    pub activation: Activation,
}

impl Node {
    fn new(name: &str, activation: Activation) -> Self {
        Node {
            name: name.to_owned(),
            fan_in: 0,
            edges: Vec::new(),
            activation: activation,
        }
    }
}

/// The compiled form of a genome.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    nodes: Vec<Node>,
    handles: HashMap<String, usize>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    order: Vec<usize>,
}

impl Topology {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn handle(&self, name: &str) -> Option<usize> {
        self.handles.get(name).cloned()
    }

    /// Evaluation order as node handles.

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Evaluation order as node names.

    pub fn order_names(&self) -> Vec<&str> {
        self.order.iter().map(|&h| self.nodes[h].name.as_str()).collect()
    }

    /// `false` if some nodes could not be ordered because they sit on (or
    /// behind) a cycle.

    pub fn is_acyclic(&self) -> bool {
        self.order.len() == self.nodes.len()
    }

    /// Propagates `inputs` through the network and returns the value of every
    /// declared output.
    ///
    /// # Errors
    ///
    /// If an input is missing or unknown, if the topology is cyclic, or if the
    /// internal bookkeeping is inconsistent.

    pub fn evaluate(&self, inputs: &HashMap<String, f64>) -> Result<HashMap<String, f64>> {
        if !self.is_acyclic() {
            return Err(NeatError::Cyclic);
        }

        for name in inputs.keys() {
            let declared = self
                .handle(name)
                .map_or(false, |h| self.inputs.contains(&h));
            if !declared {
                return Err(NeatError::UnknownInput(name.clone()));
            }
        }

        let n = self.nodes.len();
        let mut accumulated = vec![0.0; n];
        let mut values = vec![0.0; n];
        let mut tally = vec![0usize; n];
        let mut resolved = vec![false; n];

        accumulated[BIAS_HANDLE] = 1.0;
        for &h in self.inputs.iter() {
            let name = &self.nodes[h].name;
            match inputs.get(name) {
                Some(&v) => accumulated[h] = v,
                None => return Err(NeatError::MissingInput(name.clone())),
            }
        }

        for &h in self.order.iter() {
            let node = &self.nodes[h];
            if tally[h] != node.fan_in {
                return Err(NeatError::FanInMismatch {
                    node: node.name.clone(),
                    expected: node.fan_in,
                    actual: tally[h],
                });
            }

            let value = node.activation.apply(accumulated[h]);
            values[h] = value;
            resolved[h] = true;

            for edge in node.edges.iter() {
                accumulated[edge.sink] += value * edge.weight;
                tally[edge.sink] += 1;
            }
        }

        let mut outputs = HashMap::with_capacity(self.outputs.len());
        for &h in self.outputs.iter() {
            let name = &self.nodes[h].name;
            if !resolved[h] {
                return Err(NeatError::UnresolvedOutput(name.clone()));
            }
            outputs.insert(name.clone(), values[h]);
        }
        Ok(outputs)
    }
}

/// Builds the node table and evaluation order for `genes`.
///
/// `inputs` and `outputs` must already be validated (see
/// `network::validate_interface`). A cycle is not an error: it is reported by
/// `Topology::is_acyclic` so that mutation can use this as a validity test.
///
/// # Errors
///
/// If a connection references an unknown node or ends in the bias or an input,
/// if two enabled connections join the same pair of nodes, or if a declared
/// output has no incoming connection.

pub fn compile(inputs: &[String], outputs: &[String], genes: &[Gene]) -> Result<Topology> {
    let mut nodes = Vec::with_capacity(1 + inputs.len() + outputs.len());
    let mut handles = HashMap::new();

    {
        let mut declare = |name: &str, activation: Activation| -> Result<usize> {
            let handle = nodes.len();
            if handles.insert(name.to_owned(), handle).is_some() {
                return Err(NeatError::DuplicateNode(name.to_owned()));
            }
            nodes.push(Node::new(name, activation));
            Ok(handle)
        };

        declare(BIAS, Activation::Identity)?;
        for name in inputs.iter() {
            declare(name, Activation::Identity)?;
        }
        for name in outputs.iter() {
            declare(name, Activation::Identity)?;
        }
        for gene in genes.iter().filter(|g| g.enabled) {
            if let GeneKind::Node { activation } = gene.kind {
                declare(&gene.id.to_string(), activation)?;
            }
        }
    }

    for gene in genes.iter().filter(|g| g.enabled) {
        if let GeneKind::Connection {
            ref from,
            ref to,
            weight,
        } = gene.kind
        {
            let source = *handles
                .get(from)
                .ok_or_else(|| NeatError::UnknownNode(from.clone()))?;
            let sink = *handles
                .get(to)
                .ok_or_else(|| NeatError::UnknownNode(to.clone()))?;
            if sink <= inputs.len() {
                return Err(NeatError::InvalidConnection {
                    from: from.clone(),
                    to: to.clone(),
                    reason: if sink == BIAS_HANDLE {
                        "the bias cannot receive connections"
                    } else {
                        "inputs cannot receive connections"
                    },
                });
            }

            if nodes[source].edges.iter().any(|e| e.sink == sink) {
                return Err(NeatError::DuplicateConnection {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            nodes[source].edges.push(Edge {
                sink: sink,
                weight: weight,
            });
            nodes[sink].fan_in += 1;
        }
    }

    let input_handles: Vec<usize> = (1..1 + inputs.len()).collect();
    let output_handles: Vec<usize> = (1 + inputs.len()..1 + inputs.len() + outputs.len()).collect();

    for &h in output_handles.iter() {
        if nodes[h].fan_in == 0 {
            return Err(NeatError::UnconnectedOutput(nodes[h].name.clone()));
        }
    }

    let order = evaluation_order(&nodes, &input_handles);
    if order.len() < nodes.len() {
        debug!(
            "cycle detected: ordered {} of {} nodes",
            order.len(),
            nodes.len()
        );
    }

    Ok(Topology {
        nodes: nodes,
        handles: handles,
        inputs: input_handles,
        outputs: output_handles,
        order: order,
    })
}

/// Kahn-style sweep. Starts from the bias, the inputs and any hidden node
/// without incoming connections; a node is appended once every one of its
/// sources has been ordered. Nodes on or behind a cycle are never reached.

fn evaluation_order(nodes: &[Node], inputs: &[usize]) -> Vec<usize> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut visited = vec![false; nodes.len()];
    let mut seen = vec![0usize; nodes.len()];

    let roots = Some(BIAS_HANDLE)
        .into_iter()
        .chain(inputs.iter().cloned())
        .chain((1 + inputs.len()..nodes.len()).filter(|&h| nodes[h].fan_in == 0));
    for h in roots {
        if !visited[h] {
            visited[h] = true;
            order.push(h);
        }
    }

    let mut i = 0;
    while i < order.len() {
        let h = order[i];
        for edge in nodes[h].edges.iter() {
            seen[edge.sink] += 1;
            if seen[edge.sink] == nodes[edge.sink].fan_in && !visited[edge.sink] {
                visited[edge.sink] = true;
                order.push(edge.sink);
            }
        }
        i += 1;
    }

    return order;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Genome;
    use petgraph::algo::is_cyclic_directed;
    use petgraph::graph::DiGraph;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn inputs_of(v: &[(&str, f64)]) -> HashMap<String, f64> {
        v.iter().map(|&(k, x)| (k.to_owned(), x)).collect()
    }

    /// Independent check: no depth-first walk revisits a node on its own path.
    fn dfs_acyclic(topology: &Topology) -> bool {
        fn walk(t: &Topology, h: usize, on_path: &mut Vec<bool>, done: &mut Vec<bool>) -> bool {
            if on_path[h] {
                return false;
            }
            if done[h] {
                return true;
            }
            on_path[h] = true;
            for e in t.nodes()[h].edges.iter() {
                if !walk(t, e.sink, on_path, done) {
                    return false;
                }
            }
            on_path[h] = false;
            done[h] = true;
            true
        }
        let n = topology.node_count();
        let mut on_path = vec![false; n];
        let mut done = vec![false; n];
        (0..n).all(|h| walk(topology, h, &mut on_path, &mut done))
    }

    fn petgraph_acyclic(topology: &Topology) -> bool {
        let mut g = DiGraph::<(), ()>::new();
        let idx: Vec<_> = (0..topology.node_count()).map(|_| g.add_node(())).collect();
        for (h, node) in topology.nodes().iter().enumerate() {
            for e in node.edges.iter() {
                g.add_edge(idx[h], idx[e.sink], ());
            }
        }
        !is_cyclic_directed(&g)
    }

    #[test]
    fn test_compile_and_evaluate_simple() {
        let genes = vec![
            Gene::connection(0, "i1", "o1", 0.1),
            Gene::connection(1, BIAS, "o1", 0.2),
        ];
        let t = compile(&names(&["i1"]), &names(&["o1"]), &genes).unwrap();
        assert!(t.is_acyclic());
        assert_eq!(vec!["b", "i1", "o1"], t.order_names());

        let out = t.evaluate(&inputs_of(&[("i1", 10.0)])).unwrap();
        assert!((out["o1"] - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let genes = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::node(1, Activation::Sigmoid),
            Gene::connection(2, "i1", "1", 0.5),
            Gene::connection(3, "1", "1", 0.5),
        ];
        let t = compile(&names(&["i1"]), &names(&["o1"]), &genes).unwrap();
        assert!(!t.is_acyclic());
        assert!(t.order().len() < t.node_count());
        assert_eq!(Err(NeatError::Cyclic), t.evaluate(&inputs_of(&[("i1", 1.0)])));
    }

    #[test]
    fn test_two_node_cycle() {
        let genes = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::node(1, Activation::Sigmoid),
            Gene::node(2, Activation::Sigmoid),
            Gene::connection(3, "i1", "1", 0.5),
            Gene::connection(4, "1", "2", 0.5),
            Gene::connection(5, "2", "1", 0.5),
            Gene::connection(6, "2", "o1", 0.5),
        ];
        let t = compile(&names(&["i1"]), &names(&["o1"]), &genes).unwrap();
        assert!(!t.is_acyclic());
        assert!(!dfs_acyclic(&t));
        assert!(!petgraph_acyclic(&t));
        // bias and i1 are ordered, "1", "2" and "o1" are stuck behind the cycle
        assert_eq!(vec!["b", "i1"], t.order_names());
    }

    #[test]
    fn test_hidden_layer_order_and_values() {
        let genes = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::node(1, Activation::Inverse),
            Gene::connection(2, "i1", "1", 2.0),
            Gene::connection(3, "i2", "1", 1.0),
            Gene::connection(4, "1", "o1", 1.0),
            Gene::connection(5, "1", "o2", 3.0),
        ];
        let t = compile(&names(&["i1", "i2"]), &names(&["o1", "o2"]), &genes).unwrap();
        assert!(t.is_acyclic());
        assert!(dfs_acyclic(&t));
        assert!(petgraph_acyclic(&t));
        assert_eq!(t.node_count(), t.order().len());

        let out = t
            .evaluate(&inputs_of(&[("i1", 1.0), ("i2", 0.5)]))
            .unwrap();
        // hidden = -(2.0 + 0.5) = -2.5
        assert!((out["o1"] - (0.5 - 2.5)).abs() < 1e-12);
        assert!((out["o2"] - (-7.5)).abs() < 1e-12);
    }

    #[test]
    fn test_disabled_genes_are_ignored() {
        let mut genes = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::connection(1, "o1", "i1", 0.5),
            Gene::connection(2, BIAS, "o1", 1.0),
        ];
        genes[1].enabled = false;
        let t = compile(&names(&["i1"]), &names(&["o1"]), &genes).unwrap();
        assert!(t.is_acyclic());
    }

    #[test]
    fn test_unknown_endpoint_is_fatal() {
        let genes = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::connection(1, "7", "o1", 0.5),
        ];
        assert_eq!(
            Err(NeatError::UnknownNode("7".to_owned())),
            compile(&names(&["i1"]), &names(&["o1"]), &genes)
        );
    }

    #[test]
    fn test_duplicate_connection_is_fatal() {
        let genes = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::connection(1, "i1", "o1", 0.7),
        ];
        match compile(&names(&["i1"]), &names(&["o1"]), &genes) {
            Err(NeatError::DuplicateConnection { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unconnected_output_is_fatal() {
        let genes = vec![Gene::connection(0, "i1", "o1", 0.5)];
        assert_eq!(
            Err(NeatError::UnconnectedOutput("o2".to_owned())),
            compile(&names(&["i1"]), &names(&["o1", "o2"]), &genes)
        );
    }

    #[test]
    fn test_evaluate_input_errors() {
        let genes = vec![Gene::connection(0, "i1", "o1", 0.5)];
        let t = compile(&names(&["i1"]), &names(&["o1"]), &genes).unwrap();
        assert_eq!(
            Err(NeatError::MissingInput("i1".to_owned())),
            t.evaluate(&HashMap::new())
        );
        assert_eq!(
            Err(NeatError::UnknownInput("x".to_owned())),
            t.evaluate(&inputs_of(&[("i1", 1.0), ("x", 1.0)]))
        );
        // the bias is not an input
        assert_eq!(
            Err(NeatError::UnknownInput(BIAS.to_owned())),
            t.evaluate(&inputs_of(&[("i1", 1.0), (BIAS, 1.0)]))
        );
    }

    #[test]
    fn test_connection_into_input_or_bias_is_fatal() {
        let into_input = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::connection(1, "i2", "i1", 0.5),
        ];
        match compile(&names(&["i1", "i2"]), &names(&["o1"]), &into_input) {
            Err(NeatError::InvalidConnection { ref to, .. }) if to == "i1" => {}
            other => panic!("unexpected {:?}", other),
        }

        // both would otherwise hide a cycle behind an always-ordered root
        let through_input = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::node(1, Activation::Sigmoid),
            Gene::connection(2, "i1", "1", 0.5),
            Gene::connection(3, "1", "i1", 0.5),
        ];
        match compile(&names(&["i1"]), &names(&["o1"]), &through_input) {
            Err(NeatError::InvalidConnection { ref from, ref to, .. }) if from == "1" && to == "i1" => {}
            other => panic!("unexpected {:?}", other),
        }

        let through_bias = vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::node(1, Activation::Sigmoid),
            Gene::connection(2, BIAS, "1", 0.5),
            Gene::connection(3, "1", BIAS, 0.5),
        ];
        match compile(&names(&["i1"]), &names(&["o1"]), &through_bias) {
            Err(NeatError::InvalidConnection { ref to, .. }) if to == BIAS => {}
            other => panic!("unexpected {:?}", other),
        }

        // disabled, they do not count
        let mut disabled = through_bias.clone();
        disabled[3].enabled = false;
        assert!(compile(&names(&["i1"]), &names(&["o1"]), &disabled).unwrap().is_acyclic());
    }

    #[test]
    fn test_hidden_node_without_inputs() {
        // a hidden node nobody feeds is evaluated on a zero sum
        let genes = vec![
            Gene::connection(0, "i1", "o1", 1.0),
            Gene::node(1, Activation::Sigmoid),
            Gene::connection(2, "1", "o1", 2.0),
        ];
        let t = compile(&names(&["i1"]), &names(&["o1"]), &genes).unwrap();
        assert!(t.is_acyclic());
        assert!(dfs_acyclic(&t));
        assert_eq!(vec![BIAS, "i1", "1", "o1"], t.order_names());
        let out = t.evaluate(&inputs_of(&[("i1", 0.25)])).unwrap();
        assert!((out["o1"] - (0.25 + 2.0 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_genome_roundtrip_compiles_same() {
        let genome = Genome::from_genes(vec![
            Gene::connection(0, "i1", "o1", 0.1),
            Gene::connection(1, BIAS, "o1", 0.2),
        ]);
        let t1 = compile(&names(&["i1"]), &names(&["o1"]), genome.genes()).unwrap();
        let copy = genome.clone();
        let t2 = compile(&names(&["i1"]), &names(&["o1"]), copy.genes()).unwrap();
        assert_eq!(t1, t2);
    }
}
