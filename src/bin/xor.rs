//! Evolves a network approximating XOR.
//!
//! Two objectives: accuracy (maximized) and the number of enabled connections
//! (minimized). Usage: `xor [generations] [seed]`.

extern crate env_logger;
#[macro_use]
extern crate log;
extern crate neatcube;
extern crate rand;

use neatcube::fitness::{score_all, Evaluation, Scorer};
use neatcube::{rank, ExperimentConfig, InnovationCounter, Network, Population, Result, Specimen};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::env;

const CASES: [(f64, f64, f64); 4] = [(0.0, 0.0, 0.0), (0.0, 1.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 0.0)];

/// Above this many enabled connections a network no longer clears the
/// reference point.
const MAX_COMPLEXITY: f64 = 50.0;

struct XorScorer;

impl Scorer for XorScorer {
    fn score(&mut self, networks: &[Network], index: usize) -> Result<Evaluation> {
        let network = &networks[index];
        let mut inputs = HashMap::new();
        let mut error = 0.0;
        for &(x1, x2, expected) in CASES.iter() {
            inputs.insert("x1".to_owned(), x1);
            inputs.insert("x2".to_owned(), x2);
            let y = network.evaluate(&inputs)?["y"];
            let diff = (expected - y).abs();
            error += if diff.is_finite() { diff.min(1.0) } else { 1.0 };
        }
        let accuracy = CASES.len() as f64 - error;

        Ok(Evaluation {
            score: accuracy,
            bonus: 0.0,
            outcomes: vec![accuracy, network.genome().complexity() as f64],
        })
    }

    fn generation_finished(&mut self, generation: usize) {
        debug!("generation {} scored", generation);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let generations: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(200);
    let mut rng = match args.next().and_then(|s| s.parse().ok()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let config = ExperimentConfig::default();
    config.validate()?;

    let reference = [0.0, MAX_COMPLEXITY];
    let maximize = [true, false];
    let weights = [1.0, 0.1];

    let mut innovations = InnovationCounter::new();
    let template = Network::fully_connected(&["x1", "x2"], &["y"], &mut innovations, &mut rng)?;

    let mut population = Population::new(&config);
    for _ in 0..(config.population_size / 10).max(1) {
        population.add_specimen(Specimen::new(template.randomized_clone(&mut rng)));
    }

    let mut scorer = XorScorer;
    for generation in 0..generations {
        population.fill_out(config.population_size, &mut innovations, &mut rng)?;

        let networks: Vec<Network> = population.dump_specimens().into_iter().map(|s| s.network).collect();
        for specimen in score_all(&mut scorer, networks, generation)? {
            population.add_specimen(specimen);
        }
        population.weight_species();

        let species = population.species().len();
        let ranking = rank(population.dump_specimens(), &reference, &maximize, &weights)?;
        info!("generation {}: {} species, best {}", generation, species, ranking.best_summary);

        let solved = ranking.best_score > 3.9;
        let survivors = (ranking.specimens.len() / 2).max(1);
        for specimen in ranking.specimens.into_iter().take(survivors) {
            population.add_specimen(specimen);
        }
        population.prune_empty_species();

        if solved {
            info!("solved after {} generations", generation + 1);
            break;
        }
    }

    for network in population.dump_networks().iter().take(1) {
        for &(x1, x2, expected) in CASES.iter() {
            let mut inputs = HashMap::new();
            inputs.insert("x1".to_owned(), x1);
            inputs.insert("x2".to_owned(), x2);
            let y = network.evaluate(&inputs)?["y"];
            println!("{} xor {} = {:.3} (expected {})", x1, x2, y, expected);
        }
    }
    Ok(())
}
