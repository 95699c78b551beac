//! Simulated temperature probe.
//!
//! Posts one temperature-only reading every half hour (`HH:00` and `HH:30`
//! local time) to the ingestion endpoint, with the same fault and heat
//! distribution a real probe in a warm kitchen shows.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use rand::Rng;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::SimulatorConfig;
use crate::engine::DEFAULT_SENSOR_FAULT;
use crate::models::{Measurement, Reading};

// ---

/// Share of samples that come back as the fault sentinel.
const FAULT_RATE: f64 = 0.05;

/// Share of samples (on top of faults) drawn from the hot band.
const HOT_RATE: f64 = 0.10;

/// True at the minutes a sample is due.
pub fn is_due(at: &NaiveDateTime) -> bool {
    at.minute() == 0 || at.minute() == 30
}

/// `YYYY-MM-DD HH:MM:SS`, the timestamp format the service stores.
pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Draw one temperature: 5% sentinel, 10% in 30–35 °C, otherwise 24–29 °C,
/// rounded to one decimal.
pub fn sample_temperature<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // ---
    let roll: f64 = rng.gen();
    if roll < FAULT_RATE {
        return DEFAULT_SENSOR_FAULT;
    }
    let value = if roll < FAULT_RATE + HOT_RATE {
        30.0 + rng.gen::<f64>() * 5.0
    } else {
        24.0 + rng.gen::<f64>() * 5.0
    };
    (value * 10.0).round() / 10.0
}

/// Build the payload for one sample taken at `at`.
pub fn build_reading(config: &SimulatorConfig, temperature: f64, at: &NaiveDateTime) -> Reading {
    // ---
    Reading {
        device_id: config.device_id.clone(),
        temperature: Measurement::Value(temperature),
        humidity: Measurement::Missing,
        room: config.room.clone(),
        timestamp: format_timestamp(at),
        api_key: config.api_key.clone(),
    }
}

/// Run forever, checking the clock every second and sending once per slot.
pub async fn run(config: SimulatorConfig) -> Result<()> {
    // ---
    let client = reqwest::Client::new();
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_slot = String::new();

    tracing::info!("Simulator started, posting to {}", config.target_url);

    loop {
        ticker.tick().await;

        let now = Local::now().naive_local();
        let slot = now.format("%H:%M").to_string();
        if !is_due(&now) || slot == last_slot {
            continue;
        }
        last_slot = slot;

        let reading = build_reading(&config, sample_temperature(&mut rand::thread_rng()), &now);
        if let Err(e) = send(&client, &config.target_url, &reading).await {
            tracing::error!("Failed to send reading: {:#}", e);
        }
    }
}

async fn send(client: &reqwest::Client, url: &str, reading: &Reading) -> Result<()> {
    // ---
    tracing::info!("Sending {:?}", reading);

    client
        .post(url)
        .json(reading)
        .send()
        .await
        .context("request failed")?
        .error_for_status()
        .context("ingestion rejected the reading")?;
    Ok(())
}
