//! Churn subsystem: daily Bernoulli attrition.
//!
//! Every active player rolls once per day against the churn probability
//! fixed at their creation. A hit is terminal: the player is deactivated,
//! their stickers leave the map, and a PlayerChurned event is emitted.
//!
//! Execution: every day, after growth and before behavior.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    season::DayContext,
    store::SimStore,
    subsystem::SimSubsystem,
};

#[derive(Debug, Default)]
pub struct ChurnSubsystem {
    /// Players lost since the start of the run.
    pub churned_total: u64,
}

impl ChurnSubsystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimSubsystem for ChurnSubsystem {
    fn name(&self) -> &'static str { "churn" }

    fn update(
        &mut self,
        ctx: &DayContext,
        _events_in: &[SimEvent],
        store: &mut SimStore,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let day = ctx.day;
        let mut events = Vec::new();

        for player_id in store.active_player_ids() {
            let Some(player) = store.player(player_id) else { continue };
            let (archetype, p, days_active) =
                (player.archetype, player.churn_probability, player.total_days_active);

            // One draw per active player keeps the stream aligned across runs.
            if !rng.chance(p) {
                continue;
            }
            store.churn_player(player_id, day)?;
            events.push(SimEvent::PlayerChurned { day, player_id, archetype, days_active });
        }

        self.churned_total += events.len() as u64;
        if !events.is_empty() {
            log::info!(
                "day={day} churn: {} players left ({} active remain)",
                events.len(),
                store.active_player_count()
            );
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SimConfig, types::Archetype};

    fn store_of(n: usize, cfg: &SimConfig) -> SimStore {
        let mut store = SimStore::new();
        for _ in 0..n {
            store.add_player(Archetype::Casual, 0, false, cfg);
        }
        store
    }

    #[test]
    fn zero_probability_never_churns() {
        let cfg = SimConfig { churn_probability_casual: 0.0, ..SimConfig::default() };
        let mut store = store_of(200, &cfg);
        let mut rng = SubsystemRng::new(1, 2);
        let mut churn = ChurnSubsystem::new();
        for day in 1..=30 {
            let ctx = DayContext { day, event_active: false };
            let events = churn.update(&ctx, &[], &mut store, &mut rng).unwrap();
            assert!(events.is_empty(), "day {day}: unexpected churn");
        }
        assert_eq!(store.active_player_count(), 200);
    }

    #[test]
    fn certain_probability_churns_everyone_once() {
        let cfg = SimConfig { churn_probability_casual: 1.0, ..SimConfig::default() };
        let mut store = store_of(25, &cfg);
        let mut rng = SubsystemRng::new(1, 2);
        let mut churn = ChurnSubsystem::new();

        let ctx = DayContext { day: 1, event_active: false };
        let first = churn.update(&ctx, &[], &mut store, &mut rng).unwrap();
        let ctx = DayContext { day: 2, event_active: false };
        let second = churn.update(&ctx, &[], &mut store, &mut rng).unwrap();

        assert_eq!(first.len(), 25);
        assert!(second.is_empty(), "churned players must not churn again");
        assert_eq!(churn.churned_total, 25);
        assert!(store.players().iter().all(|p| p.churn_day == Some(1)));
    }
}
