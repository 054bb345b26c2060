use crate::error::{NeatError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Stateless scalar activation functions a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activation {
    Identity,
    Sigmoid,
    BipolarSigmoid,
    Gaussian,
    Inverse,
    Sine,
    Cosine,
    Tangent,
    HyperbolicTangent,
    Ramp,
    Step,
    Spike,
}

impl Activation {
    pub const ALL: [Activation; 12] = [
        Activation::Identity,
        Activation::Sigmoid,
        Activation::BipolarSigmoid,
        Activation::Gaussian,
        Activation::Inverse,
        Activation::Sine,
        Activation::Cosine,
        Activation::Tangent,
        Activation::HyperbolicTangent,
        Activation::Ramp,
        Activation::Step,
        Activation::Spike,
    ];

    pub fn name(&self) -> &'static str {
        match *self {
            Activation::Identity => "identity",
            Activation::Sigmoid => "sigmoid",
            Activation::BipolarSigmoid => "bipolar-sigmoid",
            Activation::Gaussian => "gaussian",
            Activation::Inverse => "inverse",
            Activation::Sine => "sine",
            Activation::Cosine => "cosine",
            Activation::Tangent => "tangent",
            Activation::HyperbolicTangent => "hyperbolic-tangent",
            Activation::Ramp => "ramp",
            Activation::Step => "step",
            Activation::Spike => "spike",
        }
    }

    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Activation::Identity => x,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::BipolarSigmoid => 2.0 / (1.0 + (-x).exp()) - 1.0,
            Activation::Gaussian => (-x * x).exp(),
            Activation::Inverse => -x,
            Activation::Sine => (x * PI).sin(),
            Activation::Cosine => (x * PI).cos(),
            Activation::Tangent => x.tan(),
            Activation::HyperbolicTangent => x.tanh(),
            // sawtooth falling from 1.0 to -1.0 on every unit interval
            Activation::Ramp => 1.0 - 2.0 * (x - x.floor()),
            Activation::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            // triangle wave
            Activation::Spike => {
                let frac = x - x.floor();
                if (x.floor() as i64) % 2 == 0 {
                    1.0 - 2.0 * frac
                } else {
                    -1.0 + 2.0 * frac
                }
            }
        }
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Identity
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = NeatError;

    fn from_str(s: &str) -> Result<Self> {
        Activation::ALL
            .iter()
            .find(|a| a.name() == s)
            .cloned()
            .ok_or_else(|| NeatError::UnknownActivation(s.to_owned()))
    }
}

/// Looks up the activation function `name` and applies it to `x`.

pub fn activate(name: &str, x: f64) -> Result<f64> {
    Ok(name.parse::<Activation>()?.apply(x))
}

#[test]
fn test_activation_names_roundtrip() {
    for a in Activation::ALL.iter() {
        assert_eq!(*a, a.name().parse::<Activation>().unwrap());
    }
    assert_eq!(
        Err(NeatError::UnknownActivation("relu".to_owned())),
        "relu".parse::<Activation>()
    );
}

#[test]
fn test_activate() {
    let eps = 1e-9;
    assert!((activate("sigmoid", 0.0).unwrap() - 0.5).abs() < eps);
    assert!(activate("bipolar-sigmoid", 0.0).unwrap().abs() < eps);
    assert!((activate("gaussian", 0.0).unwrap() - 1.0).abs() < eps);
    assert!((activate("inverse", 2.5).unwrap() + 2.5).abs() < eps);
    assert!(activate("sine", 1.0).unwrap().abs() < eps);
    assert!((activate("cosine", 0.0).unwrap() - 1.0).abs() < eps);
    assert!((activate("hyperbolic-tangent", 0.5).unwrap() - 0.5f64.tanh()).abs() < eps);
    assert!((activate("ramp", 0.25).unwrap() - 0.5).abs() < eps);
    assert_eq!(1.0, activate("step", 0.1).unwrap());
    assert_eq!(0.0, activate("step", -0.1).unwrap());
    assert!((activate("spike", 0.25).unwrap() - 0.5).abs() < eps);
    assert!((activate("spike", 1.25).unwrap() + 0.5).abs() < eps);
    assert!(activate("swish", 1.0).is_err());
}

#[test]
fn test_serde_names() {
    let json = serde_json::to_string(&Activation::BipolarSigmoid).unwrap();
    assert_eq!("\"bipolar-sigmoid\"", json);
    let back: Activation = serde_json::from_str("\"hyperbolic-tangent\"").unwrap();
    assert_eq!(Activation::HyperbolicTangent, back);
}
