//! Store layer
//!
//! Maps validated cars onto a replicated document store.
//!
//! ## Consistency
//!
//! Every operation takes a [`Consistency`] hint:
//!
//! - **Primary** (default): strongly consistent, primary-only, default durability
//! - **StaleOk**: reads may be served by a secondary and can lag the primary
//! - **Durable**: writes wait for a majority of replicas, bounded by a timeout
//!
//! ## Usage
//!
//! ```ignore
//! let registry = Arc::new(ConnectionRegistry::new(config.store_settings()));
//! let store = CarStore::new(Arc::clone(&registry));
//!
//! store.ensure_index().await?;
//! store.insert(&mut car).await?;
//! let found = store.one(42, &Lookup::new().stale_ok()).await?;
//!
//! registry.close_all().await;
//! ```

mod cars;
mod error;
mod registry;

pub use cars::CarStore;
pub use error::{StoreError, StoreResult, DUPLICATE_KEY, WRITE_CONCERN_FAILED};
pub use registry::{client_options, ConnectionRegistry, DEFAULT_KEY};

use std::time::Duration;

use mongodb::bson::Document;
use mongodb::options::{
    Acknowledgment, CollectionOptions, ReadPreference, ReadPreferenceOptions, SelectionCriteria,
    WriteConcern,
};

/// Per-operation consistency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consistency {
    /// Primary-only reads, default write durability
    #[default]
    Primary,
    /// Reads may come from a secondary and be stale
    StaleOk,
    /// Writes need majority acknowledgment within the write timeout
    Durable,
}

impl Consistency {
    /// Collection options implementing this hint
    pub fn collection_options(self, write_timeout: Duration) -> CollectionOptions {
        let mut options = CollectionOptions::default();
        match self {
            Consistency::Primary => {}
            Consistency::StaleOk => {
                options.selection_criteria =
                    Some(SelectionCriteria::ReadPreference(ReadPreference::SecondaryPreferred {
                        options: ReadPreferenceOptions::default(),
                    }));
            }
            Consistency::Durable => {
                options.write_concern = Some(
                    WriteConcern::builder()
                        .w(Acknowledgment::Majority)
                        .w_timeout(write_timeout)
                        .build(),
                );
            }
        }
        options
    }
}

/// Parameters of a single-car lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Additional conditions merged into the serial-number filter
    pub extra_filter: Option<Document>,
    /// Fields to return; all fields when absent
    pub projection: Option<Document>,
    /// Fail with `NotFound` instead of returning nothing
    pub required: bool,
    pub consistency: Consistency,
}

impl Default for Lookup {
    fn default() -> Self {
        Self {
            extra_filter: None,
            projection: None,
            required: true,
            consistency: Consistency::Primary,
        }
    }
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Document) -> Self {
        self.extra_filter = Some(filter);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Return nothing instead of failing when no car matches
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Allow the read to be served by a secondary
    pub fn stale_ok(mut self) -> Self {
        self.consistency = Consistency::StaleOk;
        self
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }
}
