//! Car collection operations

use std::sync::Arc;

use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOneOptions, FindOptions, IndexOptions};
use mongodb::{Collection, IndexModel};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::registry::{ConnectionRegistry, DEFAULT_KEY};
use super::{Consistency, Lookup};
use crate::models::{fields, Car};
use crate::schema::Record;

/// Number of cars [`CarStore::list`] returns when no limit is given
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Car records in the replicated store
///
/// Cheap to clone; all clones share the registry's connection.
#[derive(Clone)]
pub struct CarStore {
    registry: Arc<ConnectionRegistry>,
    key: String,
}

impl CarStore {
    /// Store using the registry's default connection
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self::with_key(registry, DEFAULT_KEY)
    }

    /// Store using the connection registered under `key`
    pub fn with_key(registry: Arc<ConnectionRegistry>, key: impl Into<String>) -> Self {
        Self {
            registry,
            key: key.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handle to the car collection configured for `consistency`
    pub async fn collection(&self, consistency: Consistency) -> StoreResult<Collection<Document>> {
        let client = self.registry.get_or_create(&self.key).await?;
        let settings = self.registry.settings();
        Ok(client.database(&settings.database).collection_with_options(
            &settings.collection,
            consistency.collection_options(settings.write_timeout),
        ))
    }

    /// Create the unique ascending index on the serial number
    ///
    /// Idempotent: the store treats a create for an identical existing index
    /// as a no-op, so concurrent and repeated calls all succeed.
    pub async fn ensure_index(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { fields::SERIAL_NUMBER: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        let result = self
            .collection(Consistency::Primary)
            .await?
            .create_index(index, None)
            .await?;
        debug!("Ensured index {}", result.index_name);
        Ok(())
    }

    /// Look up one car by serial number
    ///
    /// Returns `Ok(None)` only for a non-required lookup that matched
    /// nothing. The storage identifier is never part of the result.
    pub async fn one(&self, serial: u32, lookup: &Lookup) -> StoreResult<Option<Record>> {
        let mut filter = doc! { fields::SERIAL_NUMBER: i64::from(serial) };
        if let Some(ref extra) = lookup.extra_filter {
            filter.extend(extra.clone());
        }

        let mut options = FindOneOptions::default();
        options.projection = lookup.projection.clone();

        let found = self
            .collection(lookup.consistency)
            .await?
            .find_one(filter, options)
            .await?;

        match found {
            Some(document) => Ok(Some(into_record(document)?)),
            None if lookup.required => Err(StoreError::NotFound { serial }),
            None => Ok(None),
        }
    }

    /// Fetch a complete car by serial number
    pub async fn get(&self, serial: u32, consistency: Consistency) -> StoreResult<Car> {
        let lookup = Lookup::new().consistency(consistency).optional();
        let Some(record) = self.one(serial, &lookup).await? else {
            return Err(StoreError::NotFound { serial });
        };

        Car::from_record(record).map_err(|e| StoreError::InvalidDocument {
            details: e.to_string(),
        })
    }

    /// Insert a new car with durable consistency
    pub async fn insert(&self, car: &mut Car) -> StoreResult<()> {
        self.insert_with(car, Consistency::Durable).await
    }

    /// Insert a new car and attach the storage identifier to it
    ///
    /// A serial-number collision fails with `AlreadyExists`. A durable write
    /// that misses its acknowledgment deadline fails with
    /// `DurabilityTimeout` and is not retried.
    pub async fn insert_with(&self, car: &mut Car, consistency: Consistency) -> StoreResult<()> {
        let serial = car.serial_number();
        let document = car.to_document().map_err(|e| StoreError::InvalidDocument {
            details: e.to_string(),
        })?;

        let result = match self
            .collection(consistency)
            .await?
            .insert_one(document, None)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                let error =
                    StoreError::from_write(e, serial, self.registry.settings().write_timeout);
                warn!("Insert of car {} failed: {}", serial, error);
                return Err(error);
            }
        };

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::InvalidDocument {
                details: format!("unexpected inserted id {}", result.inserted_id),
            })?;
        car.set_id(id);

        info!("Inserted car {} as {}", serial, id);
        Ok(())
    }

    /// Up to `limit` cars in natural order
    pub async fn list(
        &self,
        limit: Option<i64>,
        consistency: Consistency,
    ) -> StoreResult<Vec<Record>> {
        let mut options = FindOptions::default();
        options.limit = Some(limit.unwrap_or(DEFAULT_LIST_LIMIT));

        let documents: Vec<Document> = self
            .collection(consistency)
            .await?
            .find(None, options)
            .await?
            .try_collect()
            .await?;

        documents.into_iter().map(into_record).collect()
    }

    /// Drop the whole car collection, indexes included
    pub async fn drop_collection(&self) -> StoreResult<()> {
        self.collection(Consistency::Primary)
            .await?
            .drop(None)
            .await?;
        info!("Dropped car collection");
        Ok(())
    }
}

/// Strip the storage identifier and wrap a stored document
fn into_record(mut document: Document) -> StoreResult<Record> {
    document.remove(fields::ID);

    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(Record::from_store(Car::schema(), map)),
        other => Err(StoreError::InvalidDocument {
            details: format!("expected an object, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_into_record_strips_id() {
        let document = doc! {
            "_id": ObjectId::new(),
            "serialNumber": 42_i64,
            "ownerName": "Jane Doe",
            "fuelFigures": {"mpg": 41.25},
        };

        let record = into_record(document).unwrap();
        assert!(record.get("_id").is_none());
        assert_eq!(record.get("serialNumber"), Some(&json!(42)));
        assert_eq!(record.get("fuelFigures.mpg"), Some(&json!(41.25)));
        assert_eq!(record.schema_name(), "Car");
    }

    #[test]
    fn test_stored_car_round_trips() {
        let input = json!({
            "ownerName": "Jane Doe",
            "serialNumber": 4_294_967_295u64,
            "modelYear": 2019,
            "code": "abc",
            "vehicleCode": "veh",
            "engine": {"capacity": 1998, "numCylinders": 4, "maxRpm": 6500, "manufacturerCode": ""},
            "fuelFigures": {"speed": 90, "mpg": 41.25, "usageDescription": "combined"},
            "performanceFigures": {"octaneRating": 95, "acceleration": {"mph": 60, "seconds": 7.5}},
            "manufacturer": "Bavarian",
            "model": "Tourer",
            "activationCode": "act"
        });
        let mut car = Car::validate(&input).unwrap();
        car.set_id(ObjectId::new());

        let stored = car.to_document().unwrap();
        let record = into_record(stored).unwrap();
        assert_eq!(Value::Object(record.clone().into_map()), input);

        let loaded = Car::from_record(record).unwrap();
        assert_eq!(loaded.serial_number(), u32::MAX);
        assert!(loaded.id().is_none());
    }

    #[test]
    fn test_integer_valued_float_survives_store() {
        let input = json!({
            "ownerName": "Jane Doe",
            "serialNumber": 30,
            "modelYear": 2019,
            "code": "abc",
            "vehicleCode": "veh",
            "engine": {"capacity": 1998, "numCylinders": 4, "maxRpm": 6500, "manufacturerCode": "B"},
            "fuelFigures": {"speed": 90, "mpg": 30, "usageDescription": "combined"},
            "performanceFigures": {"octaneRating": 95, "acceleration": {"mph": 60, "seconds": 8.0}},
            "manufacturer": "Bavarian",
            "model": "Tourer",
            "activationCode": "act"
        });
        let car = Car::validate(&input).unwrap();

        let record = into_record(car.to_document().unwrap()).unwrap();
        assert_eq!(record.get("fuelFigures.mpg"), Some(&json!(30)));
        assert_eq!(
            record.get("performanceFigures.acceleration.seconds"),
            Some(&json!(8.0))
        );
        assert_eq!(Value::Object(record.into_map()), input);
    }
}
