//! In-memory admin store for a school: typed actions dispatched through a
//! single reducer, plus derived metrics and risk scanning over snapshots.

pub mod action;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod metrics;
pub mod models;
pub mod report;
pub mod risk;
pub mod seed;
pub mod session;
pub mod state;
pub mod store;

pub use action::Action;
pub use error::{StoreError, StoreResult};
pub use state::AdminState;
pub use store::{Clock, DispatchOutcome, FixedClock, Store, SystemClock};
