use crate::activation::Activation;
use serde::{Deserialize, Serialize};

/// Innovation number. Orders genes for crossover and speciation.
pub type Innovation = u64;

/// Allocates innovation numbers.
///
/// Every genome that takes part in the same experiment must draw its ids from
/// the same counter, otherwise crossover and speciation compare unrelated
/// genes. Independent experiments (and tests) use independent counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationCounter {
    next: Innovation,
}

impl InnovationCounter {
    pub fn new() -> Self {
        InnovationCounter { next: 0 }
    }

    /// Continue numbering after `last`, e.g. when resuming from stored genomes.

    pub fn starting_after(last: Innovation) -> Self {
        InnovationCounter { next: last + 1 }
    }

    /// The id the next call to `allocate` will return. Does not consume it.

    pub fn peek(&self) -> Innovation {
        self.next
    }

    pub fn allocate(&mut self) -> Innovation {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneKind {
    Connection {
        from: String,
        to: String,
        weight: f64,
    },
    Node {
        activation: Activation,
    },
}

/// One unit of heritable structure: either a weighted connection or a hidden node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub id: Innovation,
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: GeneKind,
}

impl Gene {
    pub fn connection(id: Innovation, from: &str, to: &str, weight: f64) -> Self {
        Gene {
            id: id,
            enabled: true,
            kind: GeneKind::Connection {
                from: from.to_owned(),
                to: to.to_owned(),
                weight: weight,
            },
        }
    }

    pub fn node(id: Innovation, activation: Activation) -> Self {
        Gene {
            id: id,
            enabled: true,
            kind: GeneKind::Node { activation: activation },
        }
    }

    pub fn is_connection(&self) -> bool {
        match self.kind {
            GeneKind::Connection { .. } => true,
            GeneKind::Node { .. } => false,
        }
    }

    pub fn is_enabled_connection(&self) -> bool {
        self.enabled && self.is_connection()
    }

    /// Weight of a connection gene. Node genes count as zero.

    pub fn weight(&self) -> f64 {
        match self.kind {
            GeneKind::Connection { weight, .. } => weight,
            GeneKind::Node { .. } => 0.0,
        }
    }

    pub fn set_weight(&mut self, new_weight: f64) {
        if let GeneKind::Connection { ref mut weight, .. } = self.kind {
            *weight = new_weight;
        }
    }

    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match self.kind {
            GeneKind::Connection {
                ref from, ref to, ..
            } => Some((from.as_str(), to.as_str())),
            GeneKind::Node { .. } => None,
        }
    }

    /// The identifier a hidden node is referenced by in connection genes.

    pub fn node_name(&self) -> Option<String> {
        match self.kind {
            GeneKind::Node { .. } => Some(self.id.to_string()),
            GeneKind::Connection { .. } => None,
        }
    }
}

/// Genome representing a feed-forward (acyclic) network as a list of genes,
/// kept sorted ascending by innovation number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    genes: Vec<Gene>,
}

impl Genome {
    pub fn new() -> Self {
        Genome { genes: Vec::new() }
    }

    /// Wraps `genes` as they are. Ordering is not checked here; operations that
    /// depend on it (crossover) verify it themselves.

    pub fn from_genes(genes: Vec<Gene>) -> Self {
        Genome { genes: genes }
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Strictly ascending ids.

    pub fn is_sorted(&self) -> bool {
        self.genes.windows(2).all(|w| w[0].id < w[1].id)
    }

    pub fn max_innovation(&self) -> Option<Innovation> {
        self.genes.iter().map(|g| g.id).max()
    }

    /// Number of enabled genes.

    pub fn complexity(&self) -> usize {
        self.genes.iter().filter(|g| g.enabled).count()
    }

    /// Binary search by id. Requires a sorted genome.

    pub fn position(&self, id: Innovation) -> Option<usize> {
        self.genes.binary_search_by_key(&id, |g| g.id).ok()
    }

    pub fn find(&self, id: Innovation) -> Option<&Gene> {
        self.position(id).map(|idx| &self.genes[idx])
    }

    pub fn find_mut(&mut self, id: Innovation) -> Option<&mut Gene> {
        match self.position(id) {
            Some(idx) => Some(&mut self.genes[idx]),
            None => None,
        }
    }

    /// Inserts `gene` at its sorted position.

    pub fn insert(&mut self, gene: Gene) {
        let idx = self.genes.partition_point(|g| g.id < gene.id);
        self.genes.insert(idx, gene);
    }

    pub fn enabled_connections<'a>(&'a self) -> impl Iterator<Item = &'a Gene> + 'a {
        self.genes.iter().filter(|g| g.is_enabled_connection())
    }

    pub fn enabled_connections_mut<'a>(&'a mut self) -> impl Iterator<Item = &'a mut Gene> + 'a {
        self.genes.iter_mut().filter(|g| g.is_enabled_connection())
    }

    /// Names of the enabled hidden nodes, in gene order.

    pub fn hidden_nodes(&self) -> Vec<String> {
        self.genes
            .iter()
            .filter(|g| g.enabled)
            .filter_map(|g| g.node_name())
            .collect()
    }

    /// Is there an enabled connection `from -> to`?

    pub fn has_enabled_link(&self, from: &str, to: &str) -> bool {
        self.enabled_connections()
            .filter_map(|g| g.endpoints())
            .any(|(f, t)| f == from && t == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let mut c = InnovationCounter::new();
        assert_eq!(0, c.peek());
        assert_eq!(0, c.allocate());
        assert_eq!(1, c.allocate());
        assert_eq!(2, c.peek());
        assert_eq!(2, c.peek());
        assert_eq!(5, InnovationCounter::starting_after(4).allocate());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut g = Genome::new();
        g.insert(Gene::connection(3, "a", "x", 0.1));
        g.insert(Gene::connection(1, "b", "x", 0.2));
        g.insert(Gene::node(2, Activation::Sigmoid));
        let ids: Vec<_> = g.genes().iter().map(|g| g.id).collect();
        assert_eq!(vec![1, 2, 3], ids);
        assert!(g.is_sorted());
        assert_eq!(Some(3), g.max_innovation());
        assert_eq!(Some(Activation::Sigmoid), match g.find(2).map(|g| &g.kind) {
            Some(&GeneKind::Node { activation }) => Some(activation),
            _ => None,
        });
    }

    #[test]
    fn test_unsorted_detected() {
        let g = Genome::from_genes(vec![
            Gene::connection(2, "a", "x", 0.1),
            Gene::connection(1, "b", "x", 0.2),
        ]);
        assert!(!g.is_sorted());

        let dup = Genome::from_genes(vec![
            Gene::connection(1, "a", "x", 0.1),
            Gene::connection(1, "b", "x", 0.2),
        ]);
        assert!(!dup.is_sorted());
    }

    #[test]
    fn test_enabled_links_and_hidden_nodes() {
        let mut g = Genome::from_genes(vec![
            Gene::connection(0, "i1", "o1", 0.5),
            Gene::node(1, Activation::Sine),
            Gene::connection(2, "i1", "1", 0.5),
            Gene::connection(3, "1", "o1", 0.5),
        ]);
        g.find_mut(0).unwrap().enabled = false;
        assert!(!g.has_enabled_link("i1", "o1"));
        assert!(g.has_enabled_link("i1", "1"));
        assert!(!g.has_enabled_link("1", "i1"));
        assert_eq!(vec!["1".to_owned()], g.hidden_nodes());
        assert_eq!(3, g.complexity());
        assert_eq!(2, g.enabled_connections().count());
    }

    #[test]
    fn test_genome_json_preserves_order_and_fields() {
        let g = Genome::from_genes(vec![
            Gene::connection(0, "i1", "o1", 0.25),
            Gene::node(1, Activation::Gaussian),
        ]);
        let json = serde_json::to_string(&g).unwrap();
        assert!(json.starts_with("[{\"id\":0,\"enabled\":true,\"kind\":\"connection\""));
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(g, back);
    }
}
