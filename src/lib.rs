#[macro_use]
extern crate log;

pub mod activation;
pub mod config;
pub mod error;
pub mod fitness;
pub mod gene;
pub mod hypercube;
pub mod kdtree;
pub mod mating;
pub mod mutation;
pub mod network;
pub mod population;
pub mod ranker;
pub mod speciation;
pub mod topology;

pub use crate::config::ExperimentConfig;
pub use crate::error::{NeatError, Result};
pub use crate::gene::{Gene, GeneKind, Genome, Innovation, InnovationCounter};
pub use crate::network::Network;
pub use crate::population::{Population, Species, Specimen};
pub use crate::ranker::{rank, Ranking};
