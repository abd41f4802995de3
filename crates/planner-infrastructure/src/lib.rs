//! Infrastructure for the Study Planner client: filesystem paths, durable
//! key-value storage and configuration loading.

pub mod config_service;
pub mod paths;
pub mod storage;

pub use crate::config_service::{ConfigError, ConfigService};
pub use crate::paths::PlannerPaths;
pub use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};
