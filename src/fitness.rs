use crate::error::Result;
use crate::network::Network;
use crate::population::Specimen;

/// What a scorer reports for one network.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    /// The domain-specific fitness. Larger is better.
    pub score: f64,

    /// Extra credit added on top of `score` (e.g. for novelty).
    pub bonus: f64,

    /// One value per objective, fed into the multi-objective ranker.
    pub outcomes: Vec<f64>,
}

/// Domain-specific fitness evaluation.
///
/// `networks` is the whole generation, so scorers that compare networks with
/// each other (novelty, competition) can do so; `index` is the position of
/// the network being scored.
pub trait Scorer {
    fn generation_started(&mut self, _generation: usize) {}

    fn score(&mut self, networks: &[Network], index: usize) -> Result<Evaluation>;

    fn generation_finished(&mut self, _generation: usize) {}
}

/// Scores every network of a generation and wraps the results into fresh
/// specimens (in the same order).

pub fn score_all<S>(scorer: &mut S, networks: Vec<Network>, generation: usize) -> Result<Vec<Specimen>>
    where S: Scorer
{
    scorer.generation_started(generation);
    let mut evaluations = Vec::with_capacity(networks.len());
    for index in 0..networks.len() {
        evaluations.push(scorer.score(&networks, index)?);
    }
    scorer.generation_finished(generation);

    Ok(networks
        .into_iter()
        .zip(evaluations)
        .map(|(network, evaluation)| Specimen::scored(network, evaluation))
        .collect())
}
