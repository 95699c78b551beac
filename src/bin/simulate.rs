//! Simulated probe that feeds the `roomclimate` ingestion endpoint.
//!
//! Reads `SIMULATOR_*` variables (see [`roomclimate::config::load_simulator_from_env`]).
use anyhow::Result;
use dotenvy::dotenv;

use roomclimate::{config, logging, simulator};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    logging::init_tracing("info");

    let cfg = config::load_simulator_from_env()?;
    simulator::run(cfg).await
}
