//! Car collection command handlers

use anyhow::{Context, Result};

use soldcars_core::store::{CarStore, Consistency, Lookup, StoreError};

use crate::output::Output;

/// List stored cars
pub async fn list(store: &CarStore, limit: Option<i64>, output: &Output) -> Result<()> {
    let records = store
        .list(limit, Consistency::Primary)
        .await
        .context("Failed to list cars")?;

    output.print_records(&records);
    Ok(())
}

/// Show a single car
pub async fn show(store: &CarStore, serial: u32, stale_ok: bool, output: &Output) -> Result<()> {
    let lookup = if stale_ok {
        Lookup::new().stale_ok()
    } else {
        Lookup::new()
    };

    match store.one(serial, &lookup.optional()).await? {
        Some(record) => output.print_record(&record),
        None => return Err(StoreError::NotFound { serial }.into()),
    }
    Ok(())
}

/// Drop the car collection
pub async fn drop_collection(store: &CarStore, output: &Output) -> Result<()> {
    store
        .drop_collection()
        .await
        .context("Failed to drop the car collection")?;

    output.success("Dropped car collection");
    Ok(())
}

/// Create the unique serial number index
pub async fn index(store: &CarStore, output: &Output) -> Result<()> {
    store
        .ensure_index()
        .await
        .context("Failed to create the serial number index")?;

    output.success("Serial number index is in place");
    Ok(())
}
