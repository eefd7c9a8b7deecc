//! FYNDR economy simulator core.
//!
//! A day-stepped, agent-based model of the sticker economy: players of
//! three archetypes buy packs, place stickers and scan each other's
//! stickers for points while growth and churn reshape the population.
//! Entry point is [`engine::SimEngine`].

pub mod behavior_subsystem;
pub mod churn_subsystem;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod growth_subsystem;
pub mod player;
pub mod reward;
pub mod rng;
pub mod season;
pub mod snapshot;
pub mod sticker;
pub mod store;
pub mod subsystem;
pub mod types;

pub use config::SimConfig;
pub use engine::{InitialPopulation, SimEngine};
pub use error::{Rejection, SimError, SimResult};
pub use snapshot::{DailySnapshot, SimSummary};
