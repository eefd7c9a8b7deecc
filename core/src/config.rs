//! Run configuration: every tunable of the FYNDR economy.
//!
//! A SimConfig is immutable for the lifetime of a run. It is loaded from
//! JSON (missing fields fall back to the defaults below) and validated
//! once by the engine constructor. Invalid values are an error, never
//! clamped.

use crate::{
    error::{SimError, SimResult},
    types::{Archetype, Location, PerArchetype},
};
use serde::{Deserialize, Serialize};

/// Inclusive integer range of daily scan attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanRange {
    pub min: u32,
    pub max: u32,
}

impl ScanRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Rectangle in which stickers are placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GeoBounds {
    pub fn contains(&self, loc: &Location) -> bool {
        (self.lat_min..=self.lat_max).contains(&loc.lat)
            && (self.lng_min..=self.lng_max).contains(&loc.lng)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // ── Scoring ──────────────────────────────────────────────────
    pub owner_base_points:   f64,
    pub scanner_base_points: f64,
    /// Bonus fraction when a sticker gets its first unique scan of the day.
    pub unique_scanner_bonus: f64,

    // ── Diminishing returns (owner side) ────────────────────────
    pub diminishing_threshold: u32,
    /// Owner multiplier per tier: [below threshold, below 2× threshold, beyond].
    pub diminishing_rates: Vec<f64>,

    // ── Diversity ───────────────────────────────────────────────
    pub geo_diversity_radius: f64, // meters
    pub geo_diversity_bonus:  f64,
    pub venue_variety_bonus:  f64,

    // ── Social sneeze ───────────────────────────────────────────
    /// Scans in one day after which a sticker is "sneezing".
    pub social_sneeze_threshold: u32,
    pub social_sneeze_bonus:     f64,
    /// Max sneeze awards per sticker per day.
    pub social_sneeze_cap:       u32,

    // ── Levels ──────────────────────────────────────────────────
    pub level_multipliers:     Vec<f64>,
    pub max_level:             u32,
    pub level_base_xp:         f64,
    pub level_first_increment: f64,
    pub level_increment_step:  f64,

    // ── Sticker decay (off by default) ──────────────────────────
    pub sticker_decay_enabled: bool,
    pub sticker_decay_rate:    f64,
    pub sticker_min_value:     f64,

    // ── Economy ─────────────────────────────────────────────────
    pub pack_price_points:  f64,
    pub pack_price_dollars: f64,
    pub points_per_dollar:  f64,
    pub stickers_per_pack:  u32,
    pub wallet_topup_min:   f64,
    pub wallet_topup_max:   f64,

    // ── Behavior caps ───────────────────────────────────────────
    pub sticker_scan_cooldown_hours: f64,
    pub whale_scans:   ScanRange,
    pub grinder_scans: ScanRange,
    pub casual_scans:  ScanRange,
    /// Chance that an active player engages on a given day.
    pub play_probability: PerArchetype<f64>,
    pub whale_weekly_purchase_probability: f64,
    pub whale_packs_max: u32,
    pub grinder_reinvest_fraction:   f64,
    pub grinder_levelup_window_days: u64,
    pub casual_purchase_interval_days: u64,
    pub casual_purchase_probability:   f64,
    pub casual_reinvest_fraction:      f64,
    pub initial_stickers_per_player:   u32,

    // ── Churn (daily probability) ───────────────────────────────
    pub churn_probability_whale:   f64,
    pub churn_probability_grinder: f64,
    pub churn_probability_casual:  f64,

    // ── Engagement ──────────────────────────────────────────────
    pub streak_bonus_days:      u64,
    pub streak_bonus:           f64,
    pub comeback_bonus_days:    u64,
    pub comeback_bonus:         f64,
    pub new_player_bonus_days:  u32,
    pub new_player_bonus:       f64,
    pub new_player_free_packs:  u32,

    // ── Seasonal events ─────────────────────────────────────────
    pub event_frequency_days:    u64,
    pub event_duration_days:     u64,
    pub event_bonus:             f64,
    pub event_growth_multiplier: f64,

    // ── Population & spread ─────────────────────────────────────
    pub total_population:             u64,
    pub viral_spread_percentage:      f64,
    pub viral_spread_frequency_days:  u64,
    pub viral_spread_cap_percentage:  f64,
    pub organic_growth_interval_days: u64,
    pub organic_growth_rate_min:      f64,
    pub organic_growth_rate_max:      f64,
    pub organic_growth_tags_threshold: u64,
    pub organic_growth_density_cap:   f64,
    pub new_player_type_ratios:       PerArchetype<f64>,

    // ── Geography ───────────────────────────────────────────────
    pub bounds:              GeoBounds,
    pub scan_jitter_degrees: f64,
    pub venue_categories:    Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            owner_base_points:    2.0,
            scanner_base_points:  1.0,
            unique_scanner_bonus: 1.0,

            diminishing_threshold: 3,
            diminishing_rates:     vec![1.0, 0.5, 0.25],

            geo_diversity_radius: 500.0,
            geo_diversity_bonus:  1.0,
            venue_variety_bonus:  1.0,

            social_sneeze_threshold: 3,
            social_sneeze_bonus:     2.0,
            social_sneeze_cap:       1,

            level_multipliers:     vec![1.0, 1.05, 1.10, 1.15, 1.20],
            max_level:             20,
            level_base_xp:         100.0,
            level_first_increment: 25.0,
            level_increment_step:  5.0,

            sticker_decay_enabled: false,
            sticker_decay_rate:    0.1,
            sticker_min_value:     0.1,

            pack_price_points:  300.0,
            pack_price_dollars: 3.0,
            points_per_dollar:  100.0,
            stickers_per_pack:  6,
            wallet_topup_min:   6.0,
            wallet_topup_max:   12.0,

            sticker_scan_cooldown_hours: 11.0,
            whale_scans:   ScanRange::new(5, 12),
            grinder_scans: ScanRange::new(15, 25),
            casual_scans:  ScanRange::new(3, 8),
            play_probability: PerArchetype::new(1.0, 0.95, 0.6),
            whale_weekly_purchase_probability: 0.8,
            whale_packs_max: 3,
            grinder_reinvest_fraction:   0.10,
            grinder_levelup_window_days: 3,
            casual_purchase_interval_days: 28,
            casual_purchase_probability:   0.3,
            casual_reinvest_fraction:      0.10,
            initial_stickers_per_player:   2,

            churn_probability_whale:   0.0005,
            churn_probability_grinder: 0.0008,
            churn_probability_casual:  0.002,

            streak_bonus_days:     7,
            streak_bonus:          0.5,
            comeback_bonus_days:   3,
            comeback_bonus:        1.0,
            new_player_bonus_days: 7,
            new_player_bonus:      1.0,
            new_player_free_packs: 1,

            event_frequency_days:    30,
            event_duration_days:     7,
            event_bonus:             0.5,
            event_growth_multiplier: 2.0,

            total_population:              100_000,
            viral_spread_percentage:       0.40,
            viral_spread_frequency_days:   14,
            viral_spread_cap_percentage:   0.40,
            organic_growth_interval_days:  7,
            organic_growth_rate_min:       0.0002,
            organic_growth_rate_max:       0.0005,
            organic_growth_tags_threshold: 200,
            organic_growth_density_cap:    3.0,
            new_player_type_ratios:        PerArchetype::new(0.05, 0.25, 0.70),

            bounds: GeoBounds {
                lat_min: 40.0,
                lat_max: 41.0,
                lng_min: -74.0,
                lng_max: -73.0,
            },
            scan_jitter_degrees: 0.01,
            venue_categories: ["campus", "coffee", "library", "park", "restaurant"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config for a small locale, used in tests.
    pub fn default_test() -> Self {
        Self {
            total_population: 2_000,
            organic_growth_tags_threshold: 50,
            organic_growth_rate_min: 0.002,
            organic_growth_rate_max: 0.005,
            ..Self::default()
        }
    }

    /// Copy of this config with every additive bonus fraction set to zero.
    pub fn without_bonuses(mut self) -> Self {
        self.unique_scanner_bonus = 0.0;
        self.geo_diversity_bonus = 0.0;
        self.venue_variety_bonus = 0.0;
        self.social_sneeze_bonus = 0.0;
        self.streak_bonus = 0.0;
        self.comeback_bonus = 0.0;
        self.new_player_bonus = 0.0;
        self.event_bonus = 0.0;
        self
    }

    // ── Derived values ──────────────────────────────────────────

    pub fn max_possible_players(&self) -> u64 {
        (self.total_population as f64 * self.viral_spread_cap_percentage).floor() as u64
    }

    pub fn cooldown_days(&self) -> f64 {
        self.sticker_scan_cooldown_hours / 24.0
    }

    /// Multiplier for a sticker level, clamped to the last entry.
    pub fn level_multiplier(&self, level: u32) -> f64 {
        let last = self.level_multipliers.len().saturating_sub(1);
        let idx = (level.max(1) as usize - 1).min(last);
        self.level_multipliers.get(idx).copied().unwrap_or(1.0)
    }

    /// Lifetime XP at which a player leaves `level` for `level + 1`.
    /// The gap between thresholds grows linearly with each level.
    pub fn xp_threshold(&self, level: u32) -> f64 {
        let k = f64::from(level.max(1) - 1);
        self.level_base_xp
            + k * self.level_first_increment
            + self.level_increment_step * k * (k - 1.0).max(0.0) / 2.0
    }

    pub fn churn_probability(&self, archetype: Archetype) -> f64 {
        match archetype {
            Archetype::Whale   => self.churn_probability_whale,
            Archetype::Grinder => self.churn_probability_grinder,
            Archetype::Casual  => self.churn_probability_casual,
        }
    }

    pub fn scan_range(&self, archetype: Archetype) -> ScanRange {
        match archetype {
            Archetype::Whale   => self.whale_scans,
            Archetype::Grinder => self.grinder_scans,
            Archetype::Casual  => self.casual_scans,
        }
    }

    /// Points bought by a cash amount at the fixed exchange rate.
    pub fn dollars_to_points(&self, dollars: f64) -> f64 {
        dollars * self.points_per_dollar
    }

    // ── Validation ──────────────────────────────────────────────

    /// Fail fast on malformed configuration.
    pub fn validate(&self) -> SimResult<()> {
        let probabilities = [
            ("churn_probability_whale", self.churn_probability_whale),
            ("churn_probability_grinder", self.churn_probability_grinder),
            ("churn_probability_casual", self.churn_probability_casual),
            ("viral_spread_percentage", self.viral_spread_percentage),
            ("viral_spread_cap_percentage", self.viral_spread_cap_percentage),
            ("organic_growth_rate_min", self.organic_growth_rate_min),
            ("organic_growth_rate_max", self.organic_growth_rate_max),
            ("whale_weekly_purchase_probability", self.whale_weekly_purchase_probability),
            ("casual_purchase_probability", self.casual_purchase_probability),
            ("grinder_reinvest_fraction", self.grinder_reinvest_fraction),
            ("casual_reinvest_fraction", self.casual_reinvest_fraction),
            ("sticker_decay_rate", self.sticker_decay_rate),
            ("play_probability.whale", self.play_probability.whale),
            ("play_probability.grinder", self.play_probability.grinder),
            ("play_probability.casual", self.play_probability.casual),
        ];
        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::invalid(field, format!("{p} is outside [0, 1]")));
            }
        }

        let non_negative = [
            ("owner_base_points", self.owner_base_points),
            ("scanner_base_points", self.scanner_base_points),
            ("unique_scanner_bonus", self.unique_scanner_bonus),
            ("geo_diversity_radius", self.geo_diversity_radius),
            ("geo_diversity_bonus", self.geo_diversity_bonus),
            ("venue_variety_bonus", self.venue_variety_bonus),
            ("social_sneeze_bonus", self.social_sneeze_bonus),
            ("streak_bonus", self.streak_bonus),
            ("comeback_bonus", self.comeback_bonus),
            ("new_player_bonus", self.new_player_bonus),
            ("event_bonus", self.event_bonus),
            ("event_growth_multiplier", self.event_growth_multiplier),
            ("sticker_scan_cooldown_hours", self.sticker_scan_cooldown_hours),
            ("scan_jitter_degrees", self.scan_jitter_degrees),
            ("level_base_xp", self.level_base_xp),
            ("level_first_increment", self.level_first_increment),
            ("level_increment_step", self.level_increment_step),
            ("organic_growth_density_cap", self.organic_growth_density_cap),
        ];
        for (field, v) in non_negative {
            if !(v >= 0.0) {
                return Err(SimError::invalid(field, format!("{v} must be >= 0")));
            }
        }

        let positive = [
            ("pack_price_points", self.pack_price_points),
            ("pack_price_dollars", self.pack_price_dollars),
            ("points_per_dollar", self.points_per_dollar),
            ("sticker_min_value", self.sticker_min_value),
        ];
        for (field, v) in positive {
            if !(v > 0.0) {
                return Err(SimError::invalid(field, format!("{v} must be > 0")));
            }
        }

        let intervals = [
            ("event_frequency_days", self.event_frequency_days),
            ("viral_spread_frequency_days", self.viral_spread_frequency_days),
            ("organic_growth_interval_days", self.organic_growth_interval_days),
            ("casual_purchase_interval_days", self.casual_purchase_interval_days),
            ("organic_growth_tags_threshold", self.organic_growth_tags_threshold),
        ];
        for (field, v) in intervals {
            if v == 0 {
                return Err(SimError::invalid(field, "must be > 0"));
            }
        }
        if self.stickers_per_pack == 0 {
            return Err(SimError::invalid("stickers_per_pack", "must be > 0"));
        }
        if self.whale_packs_max == 0 {
            return Err(SimError::invalid("whale_packs_max", "must be > 0"));
        }
        if self.max_level == 0 {
            return Err(SimError::invalid("max_level", "must be > 0"));
        }
        if self.diminishing_threshold == 0 {
            return Err(SimError::invalid("diminishing_threshold", "must be > 0"));
        }

        if self.level_multipliers.is_empty() {
            return Err(SimError::invalid("level_multipliers", "must not be empty"));
        }
        if let Some(m) = self.level_multipliers.iter().find(|m| !(**m > 0.0)) {
            return Err(SimError::invalid("level_multipliers", format!("{m} must be > 0")));
        }

        if self.diminishing_rates.len() != 3 {
            return Err(SimError::invalid(
                "diminishing_rates",
                format!("expected 3 tiers, got {}", self.diminishing_rates.len()),
            ));
        }
        if self.diminishing_rates.iter().any(|r| !(*r >= 0.0)) {
            return Err(SimError::invalid("diminishing_rates", "rates must be >= 0"));
        }
        if self.diminishing_rates.windows(2).any(|w| w[1] > w[0]) {
            return Err(SimError::invalid("diminishing_rates", "rates must be non-increasing"));
        }

        if self.venue_categories.is_empty() {
            return Err(SimError::invalid("venue_categories", "must not be empty"));
        }

        let ratios = self.new_player_type_ratios;
        if [ratios.whale, ratios.grinder, ratios.casual].iter().any(|r| !(*r >= 0.0)) {
            return Err(SimError::invalid("new_player_type_ratios", "ratios must be >= 0"));
        }
        let sum = ratios.total();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(SimError::invalid(
                "new_player_type_ratios",
                format!("ratios sum to {sum}, expected 1.0"),
            ));
        }

        if self.organic_growth_rate_min > self.organic_growth_rate_max {
            return Err(SimError::invalid("organic_growth_rate_min", "exceeds organic_growth_rate_max"));
        }
        if self.wallet_topup_min > self.wallet_topup_max || self.wallet_topup_min < 0.0 {
            return Err(SimError::invalid("wallet_topup_min", "must be in [0, wallet_topup_max]"));
        }
        for (field, range) in [
            ("whale_scans", self.whale_scans),
            ("grinder_scans", self.grinder_scans),
            ("casual_scans", self.casual_scans),
        ] {
            if range.min > range.max {
                return Err(SimError::invalid(field, format!("min {} > max {}", range.min, range.max)));
            }
        }
        let b = self.bounds;
        if !(b.lat_min < b.lat_max) || !(b.lng_min < b.lng_max) {
            return Err(SimError::invalid("bounds", "min must be below max on both axes"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
        SimConfig::default_test().validate().unwrap();
    }

    #[test]
    fn level_multiplier_clamps_to_last_entry() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.level_multiplier(1), 1.0);
        assert_eq!(cfg.level_multiplier(3), 1.10);
        assert_eq!(cfg.level_multiplier(5), 1.20);
        assert_eq!(cfg.level_multiplier(40), 1.20);
    }

    #[test]
    fn xp_thresholds_grow_linearly_in_increment() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.xp_threshold(1), 100.0);
        assert_eq!(cfg.xp_threshold(2), 125.0);
        assert_eq!(cfg.xp_threshold(3), 155.0);
        assert_eq!(cfg.xp_threshold(4), 190.0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: SimConfig =
            serde_json::from_str(r#"{ "pack_price_points": 500.0, "max_level": 10 }"#).unwrap();
        assert_eq!(cfg.pack_price_points, 500.0);
        assert_eq!(cfg.max_level, 10);
        assert_eq!(cfg.diminishing_rates, vec![1.0, 0.5, 0.25]);
    }
}
