//! Structural and weight mutations, crossover.
//!
//! Operations return `Ok(false)` when a randomly proposed edit is rejected
//! (would cycle, already exists). Errors are reserved for edits no valid
//! caller can ask for.

use crate::activation::Activation;
use crate::error::{NeatError, Result};
use crate::gene::{Gene, GeneKind, Genome, Innovation, InnovationCounter};
use crate::network::Network;
use crate::topology::BIAS;
use rand::seq::SliceRandom;
use rand::Rng;

fn random_enabled_connection<R>(genome: &Genome, rng: &mut R) -> Option<Innovation>
    where R: Rng
{
    let candidates: Vec<Innovation> = genome.enabled_connections().map(|g| g.id).collect();
    candidates.choose(rng).cloned()
}

/// Crossover of two genomes.
///
/// The child has exactly the genes of `fitter`, in the same order. For every
/// enabled connection gene that `other` also carries, a fair coin decides
/// whether the child keeps the fitter weight or takes the other one. Genes
/// only `other` has are never inherited.
///
/// # Errors
///
/// If either genome is not sorted by innovation number.

pub fn crossover<R>(fitter: &Genome, other: &Genome, rng: &mut R) -> Result<Genome>
    where R: Rng
{
    if !fitter.is_sorted() || !other.is_sorted() {
        return Err(NeatError::UnsortedGenome);
    }

    let mut child = fitter.clone();
    for gene in child.enabled_connections_mut() {
        if let Some(partner) = other.find(gene.id) {
            if partner.is_connection() && rng.gen::<bool>() {
                gene.set_weight(partner.weight());
            }
        }
    }
    Ok(child)
}

impl Network {
    /// Adds an enabled connection `from -> to`.
    ///
    /// Returns `false` for a self-loop, if the link or its reverse already
    /// exists, or if the link would close a cycle. No innovation number is
    /// consumed in that case.
    ///
    /// # Errors
    ///
    /// If `to` is the bias or an input, if `from` is an output, or if an
    /// endpoint is unknown. These checks come before the self-loop check, so
    /// a loop on the bias, an input or an output is an error, not a rejection.

    pub fn add_connection(&mut self,
                          innovations: &mut InnovationCounter,
                          from: &str,
                          to: &str,
                          weight: f64)
                          -> Result<bool> {
        let invalid = |reason| NeatError::InvalidConnection {
            from: from.to_owned(),
            to: to.to_owned(),
            reason: reason,
        };
        if to == BIAS {
            return Err(invalid("the bias cannot receive connections"));
        }
        if self.is_input(to) {
            return Err(invalid("inputs cannot receive connections"));
        }
        if self.is_output(from) {
            return Err(invalid("outputs cannot send connections"));
        }

        if from == to {
            return Ok(false);
        }
        if self.genome().has_enabled_link(from, to) || self.genome().has_enabled_link(to, from) {
            return Ok(false);
        }

        let from_source = from == BIAS || self.is_input(from);
        if !(from_source && self.is_output(to)) {
            let mut tentative = self.genome().genes().to_vec();
            tentative.push(Gene::connection(innovations.peek(), from, to, weight));
            if !self.compile_genes(&tentative)?.is_acyclic() {
                debug!("rejected connection {} -> {}: would create a cycle", from, to);
                return Ok(false);
            }
        }

        let id = innovations.allocate();
        self.genome_mut().insert(Gene::connection(id, from, to, weight));
        Ok(true)
    }

    /// Splits the enabled connection gene `gene_id` by inserting a new hidden
    /// node with `activation`. The original gene is disabled; both new
    /// connections carry the original weight.
    ///
    /// Returns the innovation number (and thereby the name) of the new node.
    ///
    /// # Errors
    ///
    /// If `gene_id` does not exist or is not an enabled connection.

    pub fn add_node(&mut self,
                    innovations: &mut InnovationCounter,
                    gene_id: Innovation,
                    activation: Activation)
                    -> Result<Innovation> {
        let (from, to, weight) = {
            let gene = self.genome_mut()
                .find_mut(gene_id)
                .ok_or(NeatError::UnknownGene(gene_id))?;
            if !gene.enabled {
                return Err(NeatError::NotAnEnabledConnection(gene_id));
            }
            let split = match gene.kind {
                GeneKind::Connection {
                    ref from,
                    ref to,
                    weight,
                } => (from.clone(), to.clone(), weight),
                GeneKind::Node { .. } => return Err(NeatError::NotAnEnabledConnection(gene_id)),
            };
            gene.enabled = false;
            split
        };

        let node_id = innovations.allocate();
        let node_name = node_id.to_string();
        let genome = self.genome_mut();
        genome.insert(Gene::node(node_id, activation));
        genome.insert(Gene::connection(innovations.allocate(), &from, &node_name, weight));
        genome.insert(Gene::connection(innovations.allocate(), &node_name, &to, weight));
        Ok(node_id)
    }

    /// Structural Mutation `AddNode`.
    ///
    /// Splits a random enabled connection. The node's activation is drawn from
    /// `activations` (identity if empty). Returns `false` if there is no
    /// enabled connection.

    pub fn mutate_add_node<R>(&mut self,
                              innovations: &mut InnovationCounter,
                              activations: &[Activation],
                              rng: &mut R)
                              -> Result<bool>
        where R: Rng
    {
        let gene_id = match random_enabled_connection(self.genome(), rng) {
            Some(id) => id,
            None => return Ok(false),
        };
        let activation = activations.choose(rng).cloned().unwrap_or_default();
        self.add_node(innovations, gene_id, activation)?;
        Ok(true)
    }

    /// Structural Mutation `AddConnection`.
    ///
    /// Tries up to `max_attempts` random (source, sink) pairs with a random
    /// weight. Sources are the bias, inputs and hidden nodes; sinks are hidden
    /// nodes and outputs. If every attempt is rejected, a weight is changed
    /// instead and `false` is returned.

    pub fn mutate_add_connection<R>(&mut self,
                                    innovations: &mut InnovationCounter,
                                    max_attempts: usize,
                                    rng: &mut R)
                                    -> Result<bool>
        where R: Rng
    {
        let hidden = self.genome().hidden_nodes();
        let sources: Vec<String> = Some(BIAS.to_owned())
            .into_iter()
            .chain(self.inputs().iter().cloned())
            .chain(hidden.iter().cloned())
            .collect();
        let sinks: Vec<String> = hidden.iter().cloned().chain(self.outputs().iter().cloned()).collect();

        for _ in 0..max_attempts {
            let (from, to) = match (sources.choose(rng), sinks.choose(rng)) {
                (Some(f), Some(t)) => (f, t),
                _ => break,
            };
            let weight = rng.gen::<f64>();
            if self.add_connection(innovations, from, to, weight)? {
                return Ok(true);
            }
        }

        debug!("no connection added after {} attempts, changing a weight instead", max_attempts);
        self.mutate_change_weight(rng);
        Ok(false)
    }

    /// Weight mutation: a random enabled connection gets a new weight in
    /// [0, 1). Returns `false` if there is no enabled connection.

    pub fn mutate_change_weight<R>(&mut self, rng: &mut R) -> bool
        where R: Rng
    {
        match random_enabled_connection(self.genome(), rng) {
            Some(id) => {
                let weight = rng.gen::<f64>();
                if let Some(gene) = self.genome_mut().find_mut(id) {
                    gene.set_weight(weight);
                }
                true
            }
            None => false,
        }
    }

    /// Clone with every enabled connection weight re-drawn from [0, 1).

    pub fn randomized_clone<R>(&self, rng: &mut R) -> Network
        where R: Rng
    {
        let mut child = self.clone();
        for gene in child.genome_mut().enabled_connections_mut() {
            gene.set_weight(rng.gen::<f64>());
        }
        child
    }

    /// Mates `fitter` with `other` (see `mutation::crossover`).
    ///
    /// # Errors
    ///
    /// If the networks have different interfaces or a genome is unsorted.

    pub fn crossover<R>(fitter: &Network, other: &Network, rng: &mut R) -> Result<Network>
        where R: Rng
    {
        if !fitter.same_interface(other) {
            return Err(NeatError::InterfaceMismatch);
        }
        let genome = crossover(fitter.genome(), other.genome(), rng)?;
        let mut child = fitter.clone();
        *child.genome_mut() = genome;
        Ok(child)
    }
}
