//! Grouping, TP detection and securing engine for pipguard.
//!
//! Data flow per tick:
//! 1. `grouper` clusters the position snapshot into signal groups
//! 2. `ranker` orders each group's TP ladder
//! 3. `decision` judges whether a TP1 leg is effectively reached
//! 4. `dispatcher` executes the secure / cancel / second-price steps
//! 5. `tracker` guarantees at-most-once semantics across cycles
//!
//! `cycle::Monitor` wires these together for one account.

pub mod config;
pub mod cycle;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod grouper;
pub mod ladder;
pub mod ranker;
pub mod tracker;

pub use config::EngineConfig;
pub use cycle::Monitor;
pub use decision::{Decision, TpMetrics};
pub use error::{EngineError, EngineResult};
pub use grouper::{group_positions, GroupKey, SignalGroup};
pub use ladder::{LadderCache, TpLadder};
pub use ranker::{rank_from_tag, rank_in_group};
pub use tracker::SessionTracker;
