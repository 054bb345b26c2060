use crate::error::{NeatError, Result};
use crate::gene::{Gene, Genome, InnovationCounter};
use crate::topology::{self, Topology, BIAS};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;

/// A named input/output interface plus the genome wiring it up.
///
/// The compiled topology is built on first use and dropped by every operation
/// that touches the genome. Deserialization goes through `Network::new`, so a
/// stored interface is validated and sorted like a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredNetwork")]
pub struct Network {
    inputs: Vec<String>,
    outputs: Vec<String>,
    genome: Genome,
    #[serde(skip)]
    topology: OnceCell<Topology>,
}

#[derive(Deserialize)]
struct StoredNetwork {
    inputs: Vec<String>,
    outputs: Vec<String>,
    genome: Genome,
}

impl TryFrom<StoredNetwork> for Network {
    type Error = NeatError;

    fn try_from(stored: StoredNetwork) -> Result<Self> {
        let inputs: Vec<&str> = stored.inputs.iter().map(|s| s.as_str()).collect();
        let outputs: Vec<&str> = stored.outputs.iter().map(|s| s.as_str()).collect();
        Network::new(&inputs, &outputs, stored.genome)
    }
}

/// Checks the user supplied node names and returns them sorted.
///
/// Both lists must be non-empty, every name must be non-empty, unique, differ
/// from the bias name and must not parse as an unsigned integer (those are
/// reserved for hidden nodes).

pub fn validate_interface(inputs: &[&str], outputs: &[&str]) -> Result<(Vec<String>, Vec<String>)> {
    if inputs.is_empty() {
        return Err(NeatError::InvalidConfig("no inputs declared".to_owned()));
    }
    if outputs.is_empty() {
        return Err(NeatError::InvalidConfig("no outputs declared".to_owned()));
    }

    let mut seen = HashSet::new();
    for &name in inputs.iter().chain(outputs.iter()) {
        let invalid = |reason| NeatError::InvalidName {
            name: name.to_owned(),
            reason: reason,
        };
        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if name == BIAS {
            return Err(invalid("reserved for the bias node"));
        }
        if name.parse::<u64>().is_ok() {
            return Err(invalid("numeric names are reserved for hidden nodes"));
        }
        if !seen.insert(name) {
            return Err(invalid("declared more than once"));
        }
    }

    let mut inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    let mut outputs: Vec<String> = outputs.iter().map(|s| s.to_string()).collect();
    inputs.sort();
    outputs.sort();
    Ok((inputs, outputs))
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.same_interface(other) && self.genome == other.genome
    }
}

impl Network {
    /// # Errors
    ///
    /// If the interface is invalid (see `validate_interface`).

    pub fn new(inputs: &[&str], outputs: &[&str], genome: Genome) -> Result<Self> {
        let (inputs, outputs) = validate_interface(inputs, outputs)?;
        Ok(Network {
            inputs: inputs,
            outputs: outputs,
            genome: genome,
            topology: OnceCell::new(),
        })
    }

    /// Creates a network connecting the bias and every input to every output,
    /// with weights drawn from [0, 1).

    pub fn fully_connected<R>(inputs: &[&str],
                              outputs: &[&str],
                              innovations: &mut InnovationCounter,
                              rng: &mut R)
                              -> Result<Self>
        where R: Rng
    {
        let mut network = Network::new(inputs, outputs, Genome::new())?;
        let mut genome = Genome::new();
        for to in network.outputs.iter() {
            for from in Some(BIAS).into_iter().chain(network.inputs.iter().map(|s| s.as_str())) {
                genome.insert(Gene::connection(innovations.allocate(), from, to, rng.gen::<f64>()));
            }
        }
        network.genome = genome;
        Ok(network)
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Mutable access to the genome. Drops the cached topology.

    pub fn genome_mut(&mut self) -> &mut Genome {
        self.invalidate();
        &mut self.genome
    }

    pub fn same_interface(&self, other: &Network) -> bool {
        self.inputs == other.inputs && self.outputs == other.outputs
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|s| s == name)
    }

    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|s| s == name)
    }

    pub(crate) fn invalidate(&mut self) {
        self.topology = OnceCell::new();
    }

    /// Compiles `genes` against this network's interface without touching the
    /// network itself.

    pub fn compile_genes(&self, genes: &[Gene]) -> Result<Topology> {
        topology::compile(&self.inputs, &self.outputs, genes)
    }

    /// The compiled topology, built on first use.
    ///
    /// # Errors
    ///
    /// If the genome is inconsistent (see `topology::compile`). A cyclic
    /// genome compiles fine; check `Topology::is_acyclic`.

    pub fn topology(&self) -> Result<&Topology> {
        if let Some(t) = self.topology.get() {
            return Ok(t);
        }
        let compiled = self.compile_genes(self.genome.genes())?;
        Ok(self.topology.get_or_init(|| compiled))
    }

    /// Feeds `inputs` through the network.
    ///
    /// # Errors
    ///
    /// If an input is missing or undeclared, if the genome is cyclic or
    /// otherwise inconsistent.

    pub fn evaluate(&self, inputs: &HashMap<String, f64>) -> Result<HashMap<String, f64>> {
        self.topology()?.evaluate(inputs)
    }
}
