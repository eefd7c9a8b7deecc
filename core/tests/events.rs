//! Seasonal event calendar.

use fyndr_core::{
    config::SimConfig,
    engine::{InitialPopulation, SimEngine},
    season::is_event_active,
};

fn ten_day_calendar() -> SimConfig {
    SimConfig {
        event_frequency_days: 10,
        event_duration_days: 3,
        ..SimConfig::default_test()
    }
}

#[test]
fn event_window_opens_on_each_boundary() {
    let config = ten_day_calendar();
    let active: Vec<u64> = (0..=25).filter(|d| is_event_active(*d, &config)).collect();
    assert_eq!(active, vec![0, 1, 2, 10, 11, 12, 20, 21, 22]);
}

#[test]
fn snapshots_report_the_calendar() {
    let config = ten_day_calendar();
    let mut engine = SimEngine::build(config.clone(), InitialPopulation::default(), 4).unwrap();
    engine.run(25).unwrap();

    for s in engine.snapshots() {
        assert_eq!(
            s.event_active,
            is_event_active(s.day, &config),
            "day {}: snapshot disagrees with the calendar",
            s.day
        );
    }
}

#[test]
fn event_days_pay_more_for_the_same_scan() {
    // Only the event bonus is switched on, so any non-base label is an event.
    let config = SimConfig {
        event_bonus: 0.5,
        ..ten_day_calendar().without_bonuses()
    };
    let mut engine = SimEngine::build(config.clone(), InitialPopulation::default(), 21).unwrap();

    for _ in 0..15 {
        for event in engine.tick().unwrap() {
            if let fyndr_core::event::SimEvent::ScanRecorded {
                day, scanner_points, sticker_level, bonus_label, ..
            } = event
            {
                let base = config.scanner_base_points * config.level_multiplier(sticker_level);
                if is_event_active(day, &config) {
                    assert_eq!(bonus_label, fyndr_core::event::BonusLabel::Event);
                    assert!((scanner_points - base * 1.5).abs() < 1e-9, "day {day}: {scanner_points}");
                } else {
                    assert_eq!(bonus_label, fyndr_core::event::BonusLabel::Base);
                    assert!((scanner_points - base).abs() < 1e-9, "day {day}: {scanner_points}");
                }
            }
        }
    }
}
