//! Sticker entity.

use crate::{
    config::SimConfig,
    types::{Day, Location, PlayerId, StickerId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub id:             StickerId,
    /// Back-reference to the owning player.
    pub owner_id:       PlayerId,
    pub location:       Location,
    pub venue_category: String,
    pub level:          u32,
    pub placed_day:     Day,
    pub is_active:      bool,

    pub base_value:    f64,
    pub current_value: f64,

    pub scans_today:         u32,
    pub unique_scans_today:  u32,
    pub sneeze_awards_today: u32,
    pub total_scans:         u64,
    pub daily_earnings:      f64,
    pub total_earnings:      f64,
}

impl Sticker {
    pub fn new(
        id: StickerId,
        owner_id: PlayerId,
        location: Location,
        venue_category: String,
        level: u32,
        placed_day: Day,
    ) -> Self {
        Self {
            id,
            owner_id,
            location,
            venue_category,
            level: level.max(1),
            placed_day,
            is_active: true,
            base_value: 1.0,
            current_value: 1.0,
            scans_today: 0,
            unique_scans_today: 0,
            sneeze_awards_today: 0,
            total_scans: 0,
            daily_earnings: 0.0,
            total_earnings: 0.0,
        }
    }

    /// Value multiplier applied to scan rewards. 1.0 unless decay is on.
    pub fn value_multiplier(&self, config: &SimConfig) -> f64 {
        if config.sticker_decay_enabled {
            self.current_value
        } else {
            1.0
        }
    }

    /// Owner multiplier from the three-tier diminishing-returns step.
    pub fn diminishing_multiplier(&self, config: &SimConfig) -> f64 {
        let threshold = config.diminishing_threshold;
        let tier = if self.scans_today < threshold {
            0
        } else if self.scans_today < threshold * 2 {
            1
        } else {
            2
        };
        // Short hand-built rate lists fall back to their last tier.
        let rates = &config.diminishing_rates;
        rates.get(tier).or(rates.last()).copied().unwrap_or(1.0)
    }

    /// Start-of-day reset. A sticker that went unscanned yesterday
    /// loses value when decay is enabled.
    pub fn begin_day(&mut self, config: &SimConfig) {
        if config.sticker_decay_enabled && self.is_active && self.scans_today == 0 {
            self.current_value =
                (self.current_value * (1.0 - config.sticker_decay_rate)).max(config.sticker_min_value);
        }
        self.scans_today = 0;
        self.unique_scans_today = 0;
        self.sneeze_awards_today = 0;
        self.daily_earnings = 0.0;
    }
}
