//! Seasonal event calendar.
//!
//! An event is active on day `d` iff `d` falls on a frequency boundary or
//! within `event_duration_days` of the most recent one. Recomputed from
//! the day alone on every call; there is no persisted event state.

use crate::{config::SimConfig, types::Day};

pub fn is_event_active(day: Day, config: &SimConfig) -> bool {
    let frequency = config.event_frequency_days;
    if day % frequency == 0 {
        return true;
    }
    let window_start = (day / frequency) * frequency;
    day - window_start < config.event_duration_days
}

/// Per-day scoring context shared by every scan of that day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayContext {
    pub day:          Day,
    pub event_active: bool,
}

impl DayContext {
    pub fn for_day(day: Day, config: &SimConfig) -> Self {
        Self { day, event_active: is_event_active(day, config) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_still_marks_boundary_days() {
        let cfg = SimConfig {
            event_frequency_days: 5,
            event_duration_days: 0,
            ..SimConfig::default()
        };
        let active: Vec<Day> = (0..16).filter(|d| is_event_active(*d, &cfg)).collect();
        assert_eq!(active, vec![0, 5, 10, 15]);
    }

    #[test]
    fn default_calendar_runs_first_week_of_each_month() {
        let cfg = SimConfig::default();
        assert!(is_event_active(30, &cfg));
        assert!(is_event_active(36, &cfg));
        assert!(!is_event_active(37, &cfg));
        assert!(!is_event_active(59, &cfg));
    }
}
