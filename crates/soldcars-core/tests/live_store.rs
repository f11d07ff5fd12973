//! Store tests against a running replica set
//!
//! Skipped unless SOLDCARS_TEST_MONGODB_HOSTS is set, e.g.
//! `SOLDCARS_TEST_MONGODB_HOSTS=localhost:27017 SOLDCARS_TEST_MONGODB_REPLSET=rs0`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use soldcars_core::config::{parse_hosts, StoreSettings};
use soldcars_core::store::{CarStore, ConnectionRegistry, Consistency, Lookup, StoreError};
use soldcars_core::Car;

static NEXT_DB: AtomicU32 = AtomicU32::new(0);

/// Store on a fresh database, or `None` when no live set is configured
async fn live_store() -> Option<CarStore> {
    let hosts = std::env::var("SOLDCARS_TEST_MONGODB_HOSTS").ok()?;
    let replica_set = std::env::var("SOLDCARS_TEST_MONGODB_REPLSET")
        .ok()
        .filter(|s| !s.is_empty());

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let settings = StoreSettings {
        hosts: parse_hosts(&hosts),
        replica_set,
        database: format!(
            "soldcars_test_{}_{}_{}",
            std::process::id(),
            nanos,
            NEXT_DB.fetch_add(1, Ordering::SeqCst)
        ),
        collection: "cars".to_string(),
        write_timeout: Duration::from_secs(10),
    };

    let store = CarStore::new(Arc::new(ConnectionRegistry::new(settings)));
    store.ensure_index().await.unwrap();
    Some(store)
}

async fn teardown(store: CarStore) {
    let client = store.registry().default_client().await.unwrap();
    let database = store.registry().settings().database.clone();
    client.database(&database).drop(None).await.unwrap();
    store.registry().close_all().await;
}

fn car(serial: u32) -> Car {
    Car::validate(&json!({
        "ownerName": "Jane Doe",
        "serialNumber": serial,
        "modelYear": 2019,
        "code": "abc123",
        "vehicleCode": "veh-001",
        "engine": {"capacity": 1998, "numCylinders": 4, "maxRpm": 6500, "manufacturerCode": "B"},
        "fuelFigures": {"speed": 90, "mpg": 41.25, "usageDescription": "combined cycle"},
        "performanceFigures": {"octaneRating": 95, "acceleration": {"mph": 60, "seconds": 7.4}},
        "manufacturer": "Bavarian",
        "model": "Tourer",
        "activationCode": "act-9f2"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_insert_then_lookup() {
    let Some(store) = live_store().await else {
        return;
    };

    let mut sold = car(u32::MAX);
    store.insert(&mut sold).await.unwrap();
    assert!(sold.id().is_some());

    let record = store.one(u32::MAX, &Lookup::new()).await.unwrap().unwrap();
    assert!(record.get("_id").is_none());
    assert_eq!(
        Value::Object(record.into_map()),
        Value::Object(sold.to_map())
    );

    let fetched = store.get(u32::MAX, Consistency::Primary).await.unwrap();
    assert_eq!(fetched.to_map(), sold.to_map());

    teardown(store).await;
}

#[tokio::test]
async fn test_duplicate_serial_is_rejected() {
    let Some(store) = live_store().await else {
        return;
    };

    let mut first = car(7);
    store.insert(&mut first).await.unwrap();

    let mut second = Car::validate(&{
        let mut input = Value::Object(car(7).to_map());
        input["ownerName"] = json!("John Roe");
        input
    })
    .unwrap();
    let err = store.insert(&mut second).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { serial: 7 }));
    assert!(second.id().is_none());

    let kept = store.get(7, Consistency::Primary).await.unwrap();
    assert_eq!(kept.to_map(), first.to_map());
    assert_eq!(kept.owner_name(), "Jane Doe");

    teardown(store).await;
}

#[tokio::test]
async fn test_missing_car() {
    let Some(store) = live_store().await else {
        return;
    };

    let err = store.one(404, &Lookup::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { serial: 404 }));
    assert!(store.one(404, &Lookup::new().optional()).await.unwrap().is_none());

    let err = store.get(404, Consistency::Primary).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { serial: 404 }));

    teardown(store).await;
}

#[tokio::test]
async fn test_filter_and_projection() {
    let Some(store) = live_store().await else {
        return;
    };
    store.insert(&mut car(11)).await.unwrap();

    let lookup = Lookup::new()
        .filter(mongodb::bson::doc! {"model": "Tourer"})
        .projection(mongodb::bson::doc! {"ownerName": 1});
    let record = store.one(11, &lookup).await.unwrap().unwrap();
    assert_eq!(record.get("ownerName"), Some(&json!("Jane Doe")));
    assert!(record.get("model").is_none());

    let miss = Lookup::new()
        .filter(mongodb::bson::doc! {"model": "Roadster"})
        .optional();
    assert!(store.one(11, &miss).await.unwrap().is_none());

    teardown(store).await;
}

#[tokio::test]
async fn test_concurrent_ensure_index() {
    let Some(store) = live_store().await else {
        return;
    };

    // Already called once by live_store()
    store.ensure_index().await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.ensure_index().await.is_ok() })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap());
    }

    let mut names = store
        .collection(Consistency::Primary)
        .await
        .unwrap()
        .list_index_names()
        .await
        .unwrap();
    names.sort();
    assert_eq!(names, vec!["_id_", "serialNumber_1"]);

    store.insert(&mut car(1)).await.unwrap();
    let listed = store.list(None, Consistency::Primary).await.unwrap();
    assert_eq!(listed.len(), 1);

    teardown(store).await;
}
