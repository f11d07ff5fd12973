//! Seeding command handlers
//!
//! The only callers of mock generation outside tests.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use tracing::debug;

use soldcars_core::store::CarStore;
use soldcars_core::Car;

use crate::output::Output;

/// Request timeout for `fakesend`
const SEND_TIMEOUT: u64 = 30;

/// Insert `count` mock cars starting at serial number `start`
///
/// Each car's serial number and model year are both set to its index.
pub async fn fake(store: &CarStore, count: u32, start: u32, output: &Output) -> Result<()> {
    let Some(end) = start.checked_add(count) else {
        bail!("Serial numbers {}+{} do not fit in 32 bits", start, count);
    };

    for serial in start..end {
        let fields = overrides(json!({"serialNumber": serial, "modelYear": serial}));
        let mut car = Car::mock(&fields)?;
        store
            .insert(&mut car)
            .await
            .with_context(|| format!("Failed to insert car {}", serial))?;
        debug!("Inserted mock car {}", serial);
    }

    let message = format!("Inserted {} car(s) from serial number {}", count, start);
    output.success(&message);
    Ok(())
}

/// POST a mock car with `serial` to the service at `host`
pub async fn fakesend(host: &str, serial: u32, output: &Output) -> Result<()> {
    let car = Car::mock(&overrides(json!({"serialNumber": serial})))?;
    let url = format!("http://{}/api/cars", host);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(SEND_TIMEOUT))
        .build()?;
    let response = client
        .post(&url)
        .json(&Value::Object(car.to_map()))
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let reply: Value = response
        .json()
        .await
        .context("Service reply was not JSON")?;
    output.print_value(&reply);
    Ok(())
}

fn overrides(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
