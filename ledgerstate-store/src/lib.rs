//! Partitioned record store for ledgerstate.
//!
//! [`RecordStore`] keeps typed records in a [`PartitionStore`]: every record
//! has a base row holding its header and public fields, plus one row in each
//! restricted partition its field rules route data to. Reads reassemble the
//! record from whichever partitions the caller can reach; queries fan out to
//! every partition and keep the records that matched everywhere they had to.
//!
//! ```text
//! base      records:t-1 {"key":"t-1","stateClass":"Trade","hash":"…","asset":"ACME"}
//! buyer     records:t-1 {"price":12.5,"buyer_notes":"hedge"}
//! seller    records:t-1 {"price":12.5}
//! ```
//!
//! Failures of restricted partitions never fail an operation; they are
//! logged and the partition counts as having contributed nothing. Base
//! failures are always returned.

mod config;
mod error;
mod query;
mod router;
mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use query::{QueryPlan, TypePlan};
pub use router::{partitions_for, FieldRoute, RoutingTable};
pub use store::{HistoryEntry, RecordStore, RecordStoreBuilder};

pub use ledgerstate_model as model;
pub use ledgerstate_storage::{MemoryStore, Partition, PartitionStore, Selector, StorageError};
