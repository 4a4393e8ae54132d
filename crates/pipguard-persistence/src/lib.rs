//! Flat-file state persistence for pipguard.
//!
//! The only durable state is the set of already-triggered group keys
//! used by the progressive variant: one key per line, append-only,
//! reloaded at startup so a restart never re-fires a level.

pub mod error;
pub mod hit_groups;

pub use error::{PersistenceError, PersistenceResult};
pub use hit_groups::{FileHitGroupStore, HitGroupStore};
