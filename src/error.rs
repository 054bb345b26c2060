use crate::gene::Innovation;
use thiserror::Error;

/// Invariant violations. These indicate a bug in the caller or an inconsistent
/// genome and abort the current operation.
///
/// Expected negative outcomes of random exploration (a rejected connection, an
/// exhausted retry budget) are never reported through this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NeatError {
    #[error("invalid node name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("node {0:?} is declared twice")]
    DuplicateNode(String),

    #[error("connection references unknown node {0:?}")]
    UnknownNode(String),

    #[error("duplicate connection {from:?} -> {to:?}")]
    DuplicateConnection { from: String, to: String },

    #[error("output {0:?} has no incoming connection")]
    UnconnectedOutput(String),

    #[error("connection {from:?} -> {to:?} is not allowed: {reason}")]
    InvalidConnection {
        from: String,
        to: String,
        reason: &'static str,
    },

    #[error("gene {0} does not exist")]
    UnknownGene(Innovation),

    #[error("gene {0} is not an enabled connection")]
    NotAnEnabledConnection(Innovation),

    #[error("genome is not sorted by innovation number")]
    UnsortedGenome,

    #[error("networks do not share the same inputs and outputs")]
    InterfaceMismatch,

    #[error("input {0:?} was not supplied")]
    MissingInput(String),

    #[error("{0:?} is not a declared input")]
    UnknownInput(String),

    #[error("output {0:?} was never computed")]
    UnresolvedOutput(String),

    #[error("node {node:?} received {actual} of {expected} contributions")]
    FanInMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("network contains a cycle")]
    Cyclic,

    #[error("unknown activation function {0:?}")]
    UnknownActivation(String),

    #[error("population is empty")]
    EmptyPopulation,

    #[error("expected {expected} objectives, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = ::std::result::Result<T, NeatError>;
