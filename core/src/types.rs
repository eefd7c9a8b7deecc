//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// A simulated day. Day 0 is the seeding day; the first tick is day 1.
pub type Day = u64;

/// Player identifier. Assigned sequentially from 1 in creation order.
pub type PlayerId = u64;

/// Sticker identifier. Assigned sequentially from 1 in placement order.
pub type StickerId = u64;

/// Meters per degree in the flat-earth approximation.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Fixed behavioral category assigned at player creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Whale,
    Grinder,
    Casual,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Whale, Archetype::Grinder, Archetype::Casual];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Whale   => "whale",
            Self::Grinder => "grinder",
            Self::Casual  => "casual",
        }
    }
}

/// A point on the simulated map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Euclidean degree distance scaled to meters.
    pub fn distance_meters(&self, other: &Location) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt() * METERS_PER_DEGREE
    }
}

/// One value per archetype. Used for counts, ratios and per-archetype caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerArchetype<T> {
    pub whale:   T,
    pub grinder: T,
    pub casual:  T,
}

impl<T> PerArchetype<T> {
    pub fn new(whale: T, grinder: T, casual: T) -> Self {
        Self { whale, grinder, casual }
    }

    pub fn get(&self, archetype: Archetype) -> &T {
        match archetype {
            Archetype::Whale   => &self.whale,
            Archetype::Grinder => &self.grinder,
            Archetype::Casual  => &self.casual,
        }
    }

    pub fn get_mut(&mut self, archetype: Archetype) -> &mut T {
        match archetype {
            Archetype::Whale   => &mut self.whale,
            Archetype::Grinder => &mut self.grinder,
            Archetype::Casual  => &mut self.casual,
        }
    }
}

impl PerArchetype<u64> {
    pub fn total(&self) -> u64 {
        self.whale + self.grinder + self.casual
    }
}

impl PerArchetype<f64> {
    pub fn total(&self) -> f64 {
        self.whale + self.grinder + self.casual
    }
}
