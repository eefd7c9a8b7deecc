//! The event stream: every state change a subsystem makes during a day.
//!
//! RULE: Subsystems report what they did ONLY through events.
//! Daily counts in the snapshot (scans, joins, churn, revenue) are
//! bucketed from the events of that day, not from entity counters.

use crate::types::{Archetype, Day, PlayerId, StickerId};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    DayStarted {
        day: Day,
        event_active: bool,
    },
    DayCompleted {
        day: Day,
    },

    // ── Population events ──────────────────────────
    PlayerJoined {
        day: Day,
        player_id: PlayerId,
        archetype: Archetype,
        source: JoinSource,
    },
    PlayerChurned {
        day: Day,
        player_id: PlayerId,
        archetype: Archetype,
        days_active: u64,
    },

    // ── Economy events ─────────────────────────────
    PackPurchased {
        day: Day,
        player_id: PlayerId,
        archetype: Archetype,
        currency: Currency,
        packs: u32,
        /// Dollars for cash purchases, points for point purchases.
        amount: f64,
    },
    StickerPlaced {
        day: Day,
        sticker_id: StickerId,
        owner_id: PlayerId,
        venue_category: String,
        level: u32,
    },
    ScanRecorded {
        day: Day,
        scanner_id: PlayerId,
        sticker_id: StickerId,
        owner_id: PlayerId,
        sticker_level: u32,
        scanner_points: f64,
        owner_points: f64,
        bonus_label: BonusLabel,
    },
    LevelUp {
        day: Day,
        player_id: PlayerId,
        level: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinSource {
    Seed,
    Viral,
    Organic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Cash,
    Points,
}

/// Analytics label of a scan: the highest-priority bonus that applied.
/// Never affects reward magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusLabel {
    Unique,
    GeoDiversity,
    VenueVariety,
    NewPlayer,
    Streak,
    Comeback,
    Event,
    Sneeze,
    Base,
}
