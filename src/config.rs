use crate::activation::Activation;
use crate::error::{NeatError, Result};
use crate::mating::MatingMethodWeights;
use crate::speciation::SpeciationConfig;
use serde::{Deserialize, Serialize};

/// Everything the population manager needs to know about an experiment.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// configuration file only has to mention what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub population_size: usize,
    pub speciation: SpeciationConfig,
    pub mating_method_weights: MatingMethodWeights,
    /// How often `mutate_add_connection` may propose a link before falling
    /// back to a weight change.
    pub max_add_connection_attempts: usize,
    /// Activation functions new hidden nodes choose from.
    pub activation_functions: Vec<Activation>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            population_size: 150,
            speciation: SpeciationConfig::default(),
            mating_method_weights: MatingMethodWeights::default(),
            max_add_connection_attempts: 20,
            activation_functions: vec![
                Activation::Sigmoid,
                Activation::Gaussian,
                Activation::Sine,
                Activation::HyperbolicTangent,
            ],
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(NeatError::InvalidConfig("population_size must be positive".to_owned()));
        }
        let s = &self.speciation;
        let coefficients = [("c1", s.c1), ("c2", s.c2), ("c3", s.c3), ("threshold", s.threshold)];
        for &(name, value) in coefficients.iter() {
            if !(value >= 0.0) {
                return Err(NeatError::InvalidConfig(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        Ok(())
    }
}

#[test]
fn test_defaults_are_valid() {
    assert_eq!(Ok(()), ExperimentConfig::default().validate());
}

#[test]
fn test_validate_rejects() {
    let mut c = ExperimentConfig::default();
    c.population_size = 0;
    assert!(c.validate().is_err());

    let mut c = ExperimentConfig::default();
    c.speciation.c3 = -0.1;
    assert!(c.validate().is_err());

    let mut c = ExperimentConfig::default();
    c.speciation.threshold = ::std::f64::NAN;
    assert!(c.validate().is_err());
}

#[test]
fn test_partial_json() {
    let c: ExperimentConfig = serde_json::from_str(
        r#"{
            "population_size": 40,
            "speciation": { "threshold": 0.0 },
            "mating_method_weights": { "mate": 0 },
            "activation_functions": ["bipolar-sigmoid", "spike"]
        }"#,
    )
    .unwrap();
    assert_eq!(40, c.population_size);
    assert_eq!(0.0, c.speciation.threshold);
    assert_eq!(1.0, c.speciation.c1);
    assert_eq!(0, c.mating_method_weights.mate);
    assert_eq!(72, c.mating_method_weights.mutate_change_weight);
    assert_eq!(20, c.max_add_connection_attempts);
    assert_eq!(vec![Activation::BipolarSigmoid, Activation::Spike], c.activation_functions);
}
