//! Simulation clock: owns the day counter.

use crate::types::Day;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current_day: Day,
}

impl SimClock {
    pub fn new() -> Self {
        Self { current_day: 0 }
    }

    /// Advance one day. Returns the new day number.
    pub fn advance(&mut self) -> Day {
        self.current_day += 1;
        self.current_day
    }

    /// True on the last day of each simulated week.
    pub fn is_week_boundary(&self) -> bool {
        self.current_day > 0 && self.current_day % 7 == 0
    }
}

impl Default for SimClock {
    fn default() -> Self { Self::new() }
}
