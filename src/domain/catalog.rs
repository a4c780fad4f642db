//! Static metadata for the loom systems, served by `GET /api/loom/systems`.
//!
//! Parameter bounds here are informational only; `/api/loom/generate` forwards
//! parameters to the script without checking them.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::domain::model::LoomSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl ParamSpec {
    const fn int(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Int,
            default,
            min,
            max,
        }
    }

    const fn float(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Float,
            default,
            min,
            max,
        }
    }

    pub fn default_in_bounds(&self) -> bool {
        self.min <= self.default && self.default <= self.max
    }

    fn number(&self, value: f64) -> Value {
        match self.kind {
            ParamKind::Int => Value::from(value as i64),
            ParamKind::Float => Value::from(value),
        }
    }
}

#[derive(Serialize)]
struct ParamSchema {
    #[serde(rename = "type")]
    kind: ParamKind,
    default: Value,
    min: Value,
    max: Value,
}

fn serialize_params<S: Serializer>(
    params: &&'static [ParamSpec],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(params.len()))?;
    for spec in params.iter() {
        map.serialize_entry(
            spec.name,
            &ParamSchema {
                kind: spec.kind,
                default: spec.number(spec.default),
                min: spec.number(spec.min),
                max: spec.number(spec.max),
            },
        )?;
    }
    map.end()
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub id: LoomSystem,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    #[serde(serialize_with = "serialize_params")]
    pub params: &'static [ParamSpec],
}

const LORENZ_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("n", 2000.0, 100.0, 10000.0),
    ParamSpec::float("dt", 0.01, 0.001, 0.1),
    ParamSpec::float("sigma", 10.0, 1.0, 20.0),
    ParamSpec::float("rho", 28.0, 1.0, 50.0),
    ParamSpec::float("beta", 2.667, 0.5, 5.0),
];

const AUTOMATON_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("rule", 110.0, 0.0, 255.0),
    ParamSpec::int("width", 64.0, 16.0, 128.0),
    ParamSpec::int("generations", 64.0, 16.0, 128.0),
];

const FIBONACCI_PARAMS: &[ParamSpec] = &[ParamSpec::int("n", 144.0, 10.0, 500.0)];

const CLIFFORD_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("n", 5000.0, 100.0, 20000.0),
    ParamSpec::float("a", -1.4, -3.0, 3.0),
    ParamSpec::float("b", 1.6, -3.0, 3.0),
    ParamSpec::float("c", 1.0, -3.0, 3.0),
    ParamSpec::float("d", 0.7, -3.0, 3.0),
];

impl LoomSystem {
    pub fn info(&self) -> SystemInfo {
        match self {
            LoomSystem::Lorenz => SystemInfo {
                id: *self,
                name: "Lorenz Attractor",
                description: "The butterfly's wing. Deterministic chaos—predictable yet unknowable.",
                category: "chaos",
                params: LORENZ_PARAMS,
            },
            LoomSystem::Automaton => SystemInfo {
                id: *self,
                name: "Cellular Automaton",
                description: "Simple rules, emergent complexity. The flamenco of logic.",
                category: "discrete",
                params: AUTOMATON_PARAMS,
            },
            LoomSystem::Fibonacci => SystemInfo {
                id: *self,
                name: "Fibonacci Spiral",
                description: "Nature's favorite number. Shells, galaxies, your heartbeat.",
                category: "harmony",
                params: FIBONACCI_PARAMS,
            },
            LoomSystem::Clifford => SystemInfo {
                id: *self,
                name: "Clifford Attractor",
                description: "Four numbers, infinite beauty. Adjust and discover.",
                category: "strange",
                params: CLIFFORD_PARAMS,
            },
        }
    }
}

pub fn system_catalog() -> Vec<SystemInfo> {
    LoomSystem::ALL.iter().map(LoomSystem::info).collect()
}
