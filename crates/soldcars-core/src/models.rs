//! Data models for soldcars
//!
//! Defines the car sale record and the schema it is validated against.
//! A [`Car`] can only be obtained from validated input, from a generated
//! mock, or from the store, so every `Car` handed to the store is valid.

use std::sync::OnceLock;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};

use crate::schema::{self, Constraint, FieldSpec, Record, SchemaNode, ValidationError};

/// Minimum length of an ordinary string field
pub const MIN_STRING_LEN: usize = 3;

/// Maximum length of an ordinary string field
pub const MAX_STRING_LEN: usize = 255;

/// Upper bound of the fractional figures (mpg, seconds to speed)
pub const MAX_FIGURE: f64 = 100.0;

/// Wire names the store layer needs to know about
pub mod fields {
    pub const ID: &str = "_id";
    pub const SERIAL_NUMBER: &str = "serialNumber";
}

static CAR_SCHEMA: OnceLock<SchemaNode> = OnceLock::new();

fn ordinary_string() -> FieldSpec {
    FieldSpec::string(MIN_STRING_LEN, MAX_STRING_LEN)
}

fn build_car_schema() -> SchemaNode {
    SchemaNode::new("Car")
        .field("ownerName", ordinary_string())
        // 32 bits wide: persisted as Int64, which holds every value exactly
        .field(fields::SERIAL_NUMBER, FieldSpec::uint(32))
        .field("modelYear", FieldSpec::uint(32))
        .field("code", ordinary_string())
        .field("vehicleCode", ordinary_string())
        .field(
            "engine",
            SchemaNode::new("Engine")
                .field("capacity", FieldSpec::uint(16))
                .field("numCylinders", FieldSpec::uint(8))
                .field("maxRpm", FieldSpec::uint(16))
                .field("manufacturerCode", FieldSpec::char()),
        )
        .field(
            "fuelFigures",
            SchemaNode::new("FuelFigures")
                .field("speed", FieldSpec::uint(16))
                .field("mpg", FieldSpec::float(0.0, MAX_FIGURE))
                .field("usageDescription", ordinary_string()),
        )
        .field(
            "performanceFigures",
            SchemaNode::new("PerformanceFigures")
                .field("octaneRating", FieldSpec::uint(16))
                .field(
                    "acceleration",
                    SchemaNode::new("Acceleration")
                        .field("mph", FieldSpec::uint(16))
                        .field("seconds", FieldSpec::float(0.0, MAX_FIGURE)),
                ),
        )
        .field("manufacturer", ordinary_string())
        .field("model", ordinary_string())
        .field("activationCode", ordinary_string())
}

/// Fractional figure that keeps the number form it was given
///
/// Float fields also accept integers, and `30` must come back as `30`, not
/// `30.0`, from maps and from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Figure(Number);

impl Figure {
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }

    pub fn is_integer(&self) -> bool {
        !self.0.is_f64()
    }
}

/// Engine block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    pub capacity: u16,
    pub num_cylinders: u8,
    pub max_rpm: u16,
    /// Single character, may be empty
    pub manufacturer_code: String,
}

/// Fuel consumption figures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FuelFigures {
    pub speed: u16,
    pub mpg: Figure,
    pub usage_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Acceleration {
    pub mph: u16,
    pub seconds: Figure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceFigures {
    pub octane_rating: u16,
    pub acceleration: Acceleration,
}

/// A sold car
///
/// Serializes to the stored document shape. There is deliberately no
/// `Deserialize` impl: decoding goes through [`Car::from_record`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    /// Storage-assigned identifier, present only after insertion
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    owner_name: String,
    serial_number: u32,
    model_year: u32,
    code: String,
    vehicle_code: String,
    engine: Engine,
    fuel_figures: FuelFigures,
    performance_figures: PerformanceFigures,
    manufacturer: String,
    model: String,
    activation_code: String,
}

/// Decoding mirror of [`Car`], only ever fed validated maps
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CarFields {
    owner_name: String,
    serial_number: u32,
    model_year: u32,
    code: String,
    vehicle_code: String,
    engine: Engine,
    fuel_figures: FuelFigures,
    performance_figures: PerformanceFigures,
    manufacturer: String,
    model: String,
    activation_code: String,
}

impl From<CarFields> for Car {
    fn from(fields: CarFields) -> Self {
        Self {
            id: None,
            owner_name: fields.owner_name,
            serial_number: fields.serial_number,
            model_year: fields.model_year,
            code: fields.code,
            vehicle_code: fields.vehicle_code,
            engine: fields.engine,
            fuel_figures: fields.fuel_figures,
            performance_figures: fields.performance_figures,
            manufacturer: fields.manufacturer,
            model: fields.model,
            activation_code: fields.activation_code,
        }
    }
}

impl Car {
    /// The schema every car is validated against
    pub fn schema() -> &'static SchemaNode {
        CAR_SCHEMA.get_or_init(build_car_schema)
    }

    /// Validate external input and build a car from it
    pub fn validate(input: &Value) -> Result<Self, ValidationError> {
        Self::from_record(schema::validate(Self::schema(), input)?)
    }

    /// Build a car from a generic map, validating it first
    pub fn from_map(map: Map<String, Value>) -> Result<Self, ValidationError> {
        Self::validate(&Value::Object(map))
    }

    /// Convert a complete record into a car
    ///
    /// Fails for records that do not carry every field, such as the result
    /// of a projected lookup.
    pub fn from_record(record: Record) -> Result<Self, ValidationError> {
        serde_json::from_value::<CarFields>(Value::Object(record.into_map()))
            .map(Car::from)
            .map_err(|e| {
                ValidationError::new(
                    "",
                    Constraint::Malformed {
                        reason: e.to_string(),
                    },
                )
            })
    }

    /// Generate a random car, with `overrides` replacing top-level fields
    ///
    /// Attention: only for tests and seeding tools.
    #[cfg(any(test, feature = "mock"))]
    pub fn mock(overrides: &Map<String, Value>) -> Result<Self, ValidationError> {
        Self::from_record(schema::mock(Self::schema(), overrides)?)
    }

    /// Plain map form, without the storage identifier
    pub fn to_map(&self) -> Map<String, Value> {
        let Value::Object(map) = json!({
            "ownerName": self.owner_name,
            "serialNumber": self.serial_number,
            "modelYear": self.model_year,
            "code": self.code,
            "vehicleCode": self.vehicle_code,
            "engine": {
                "capacity": self.engine.capacity,
                "numCylinders": self.engine.num_cylinders,
                "maxRpm": self.engine.max_rpm,
                "manufacturerCode": self.engine.manufacturer_code,
            },
            "fuelFigures": {
                "speed": self.fuel_figures.speed,
                "mpg": self.fuel_figures.mpg,
                "usageDescription": self.fuel_figures.usage_description,
            },
            "performanceFigures": {
                "octaneRating": self.performance_figures.octane_rating,
                "acceleration": {
                    "mph": self.performance_figures.acceleration.mph,
                    "seconds": self.performance_figures.acceleration.seconds,
                },
            },
            "manufacturer": self.manufacturer,
            "model": self.model,
            "activationCode": self.activation_code,
        }) else {
            unreachable!("object literal always builds an object")
        };
        map
    }

    /// Stored document form, carrying `_id` once one is assigned
    pub fn to_document(&self) -> Result<Document, mongodb::bson::ser::Error> {
        mongodb::bson::to_document(self)
    }

    /// JSON text of [`Car::to_map`]
    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Natural key, unique across the store
    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    pub fn model_year(&self) -> u32 {
        self.model_year
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn vehicle_code(&self) -> &str {
        &self.vehicle_code
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn fuel_figures(&self) -> &FuelFigures {
        &self.fuel_figures
    }

    pub fn performance_figures(&self) -> &PerformanceFigures {
        &self.performance_figures
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn activation_code(&self) -> &str {
        &self.activation_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> Value {
        json!({
            "ownerName": "Jane Doe",
            "serialNumber": 42,
            "modelYear": 2019,
            "code": "abc123",
            "vehicleCode": "veh-001",
            "engine": {
                "capacity": 1998,
                "numCylinders": 4,
                "maxRpm": 6500,
                "manufacturerCode": "B"
            },
            "fuelFigures": {
                "speed": 90,
                "mpg": 41.25,
                "usageDescription": "combined cycle"
            },
            "performanceFigures": {
                "octaneRating": 95,
                "acceleration": {"mph": 60, "seconds": 7.4}
            },
            "manufacturer": "Bavarian",
            "model": "Tourer",
            "activationCode": "act-9f2"
        })
    }

    #[test]
    fn test_validate_sample() {
        let car = Car::validate(&sample_input()).unwrap();
        assert_eq!(car.serial_number(), 42);
        assert_eq!(car.owner_name(), "Jane Doe");
        assert_eq!(car.engine().manufacturer_code, "B");
        assert_eq!(car.performance_figures().acceleration.seconds.as_f64(), 7.4);
        assert!(!car.fuel_figures().mpg.is_integer());
        assert!(car.id().is_none());
    }

    #[test]
    fn test_to_map_reproduces_input() {
        let input = sample_input();
        let car = Car::validate(&input).unwrap();
        assert_eq!(Value::Object(car.to_map()), input);

        let again = Car::from_map(car.to_map()).unwrap();
        assert_eq!(again, car);
    }

    #[test]
    fn test_integer_figures_keep_their_form() {
        let mut input = sample_input();
        input["fuelFigures"]["mpg"] = json!(30);
        input["performanceFigures"]["acceleration"]["seconds"] = json!(0);

        let car = Car::validate(&input).unwrap();
        assert!(car.fuel_figures().mpg.is_integer());
        assert_eq!(car.fuel_figures().mpg.as_f64(), 30.0);
        assert_eq!(Value::Object(car.to_map()), input);

        let doc = car.to_document().unwrap();
        let fuel = doc.get_document("fuelFigures").unwrap();
        assert_eq!(fuel.get_i64("mpg").unwrap(), 30);
    }

    #[test]
    fn test_to_map_omits_storage_id() {
        let mut car = Car::validate(&sample_input()).unwrap();
        car.set_id(ObjectId::new());
        assert!(!car.to_map().contains_key(fields::ID));
        assert!(!car.to_json().contains("_id"));
    }

    #[test]
    fn test_invalid_nested_field() {
        let mut input = sample_input();
        input["engine"]["numCylinders"] = json!(300);
        let err = Car::validate(&input).unwrap_err();
        assert_eq!(err.path, "engine.numCylinders");
    }

    #[test]
    fn test_serial_number_width() {
        let mut input = sample_input();
        input["serialNumber"] = json!(u32::MAX);
        assert_eq!(Car::validate(&input).unwrap().serial_number(), u32::MAX);

        input["serialNumber"] = json!(u64::from(u32::MAX) + 1);
        assert_eq!(Car::validate(&input).unwrap_err().path, "serialNumber");
    }

    #[test]
    fn test_partial_record_is_not_a_car() {
        let input = json!({"serialNumber": 42});
        let Value::Object(map) = input else {
            unreachable!()
        };
        let partial = Record::from_store(Car::schema(), map);
        let err = Car::from_record(partial).unwrap_err();
        assert!(matches!(err.constraint, Constraint::Malformed { .. }));
    }

    #[test]
    fn test_mock_car_is_valid() {
        let overrides = json!({"serialNumber": 7, "modelYear": 7});
        let Value::Object(overrides) = overrides else {
            unreachable!()
        };
        let car = Car::mock(&overrides).unwrap();
        assert_eq!(car.serial_number(), 7);
        assert_eq!(car.model_year(), 7);
        assert!(Car::from_map(car.to_map()).is_ok());
    }

    #[test]
    fn test_bson_document_shape() {
        let mut car = Car::validate(&sample_input()).unwrap();
        let doc = car.to_document().unwrap();
        assert_eq!(doc.get_i64(fields::SERIAL_NUMBER).unwrap(), 42);
        assert!(!doc.contains_key(fields::ID));
        assert_eq!(doc.get_document("engine").unwrap().len(), 4);

        let id = ObjectId::new();
        car.set_id(id);
        let doc = car.to_document().unwrap();
        assert_eq!(doc.get_object_id(fields::ID).unwrap(), id);
    }
}
