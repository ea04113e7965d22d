pub mod bradley_terry;
pub mod error;
pub mod experiment;
mod logging;
pub mod matchmaker;
pub mod outcome;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod trophy;
pub mod types;

pub use error::{Result, SimError};
pub use simulation::Simulation;
pub use types::*;

use report::trophy_histogram;
use wasm_bindgen::prelude::*;

fn js_error(e: SimError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> std::result::Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error(e.into()))
}

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
}

/// WASM-exposed simulation wrapper
#[wasm_bindgen]
pub struct RankingEngine {
    sim: Simulation,
}

#[wasm_bindgen]
impl RankingEngine {
    /// Create a new simulation with default config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> std::result::Result<RankingEngine, JsValue> {
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        let sim = Simulation::new(config).map_err(js_error)?;
        Ok(RankingEngine { sim })
    }

    /// Create with custom config
    pub fn new_with_config(config_json: &str) -> std::result::Result<RankingEngine, JsValue> {
        let config = SimulationConfig::from_json(config_json).map_err(js_error)?;
        let sim = Simulation::new(config).map_err(js_error)?;
        Ok(RankingEngine { sim })
    }

    /// Play one round; returns the match record as JSON, or "null" once finished
    pub fn play_round(&mut self) -> std::result::Result<String, JsValue> {
        let record = self.sim.play_round().map_err(js_error)?;
        to_json(&record)
    }

    /// Run up to `rounds` more rounds
    pub fn run(&mut self, rounds: u64) -> std::result::Result<u64, JsValue> {
        self.sim.run(rounds).map_err(js_error)
    }

    /// Run every remaining round
    pub fn run_to_completion(&mut self) -> std::result::Result<u64, JsValue> {
        self.sim.run_to_completion().map_err(js_error)
    }

    pub fn is_finished(&self) -> bool {
        self.sim.is_finished()
    }

    /// Rounds processed so far
    pub fn get_time(&self) -> u64 {
        self.sim.current_round
    }

    /// Get current simulation state as JSON
    pub fn get_state(&self) -> std::result::Result<String, JsValue> {
        self.sim.get_state_json().map_err(js_error)
    }

    /// Per-participant records as JSON
    pub fn get_snapshot(&self) -> std::result::Result<String, JsValue> {
        to_json(&self.sim.snapshot())
    }

    /// Get statistics JSON
    pub fn get_stats(&self) -> std::result::Result<String, JsValue> {
        to_json(&self.sim.stats)
    }

    /// Population summary (distribution, bands, rank correlations) as JSON
    pub fn get_summary(&self) -> std::result::Result<String, JsValue> {
        to_json(&self.sim.summary())
    }

    pub fn get_latent_strengths(&self) -> Vec<f64> {
        self.sim.latent_strengths().to_vec()
    }

    pub fn get_trophies(&self) -> Vec<f64> {
        self.sim.participants.iter().map(|p| p.trophy_score).collect()
    }

    /// Current target trophies
    pub fn get_targets(&self) -> std::result::Result<Vec<f64>, JsValue> {
        self.sim.targets().map_err(js_error)
    }

    /// Get trophy histogram (for visualization)
    pub fn get_trophy_histogram(&self, num_bins: usize) -> String {
        let histogram: Vec<_> = trophy_histogram(&self.sim.snapshot(), num_bins)
            .into_iter()
            .map(|(bin_start, bin_end, count)| {
                serde_json::json!({
                    "bin_start": bin_start,
                    "bin_end": bin_end,
                    "count": count,
                })
            })
            .collect();

        serde_json::to_string(&histogram).unwrap_or_default()
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&SimulationConfig::default()).unwrap_or_default()
    }
}

/// Run a parameter sweep experiment
#[wasm_bindgen]
pub fn run_experiment(
    base_config_json: &str,
    parameter: &str,
    values_json: &str,
    seed: u64,
) -> std::result::Result<String, JsValue> {
    let base_config = SimulationConfig::from_json(base_config_json).map_err(js_error)?;
    let values: Vec<f64> = serde_json::from_str(values_json)
        .map_err(|e| JsValue::from_str(&format!("Values parse error: {}", e)))?;

    let results =
        experiment::run_experiment(&base_config, parameter, &values, seed).map_err(js_error)?;
    to_json(&results)
}

/// Compare two configs
#[wasm_bindgen]
pub fn compare_configs(
    config_a_json: &str,
    config_b_json: &str,
    seed: u64,
) -> std::result::Result<String, JsValue> {
    let config_a = SimulationConfig::from_json(config_a_json).map_err(js_error)?;
    let config_b = SimulationConfig::from_json(config_b_json).map_err(js_error)?;

    let comparison = experiment::compare_configs(&config_a, &config_b, seed).map_err(js_error)?;
    to_json(&comparison)
}
