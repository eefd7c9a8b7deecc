//! In-memory entity store for one run.
//!
//! RULE: Only store.rs creates, churns or charges entities.
//! Subsystems call store methods and never push into the
//! collections directly. Running totals live on the Ledger so that
//! nothing about a run is held in shared or global state.

use crate::{
    config::SimConfig,
    error::Rejection,
    player::Player,
    sticker::Sticker,
    types::{Archetype, Day, Location, PerArchetype, PlayerId, StickerId},
};
use serde::{Deserialize, Serialize};

/// Cumulative economic totals for the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub total_players_ever:   u64,
    pub churned_total:        u64,
    pub total_revenue:        f64,
    pub revenue_by_archetype: PerArchetype<f64>,
    pub purchases:            PerArchetype<u64>,
    pub cash_purchases:       u64,
    pub point_purchases:      u64,
    pub total_scans:          u64,
    /// Scanner plus owner points paid out by scans.
    pub points_awarded:       f64,
    pub stickers_placed:      u64,
}

#[derive(Debug, Clone, Default)]
pub struct SimStore {
    players:   Vec<Player>,
    stickers:  Vec<Sticker>,
    /// Placed sticker ids per player, indexed like `players`.
    owned_by:  Vec<Vec<StickerId>>,
    /// Active sticker ids. Unordered: churn swap-removes.
    scannable: Vec<StickerId>,
    /// Position of each sticker in `scannable`, indexed like `stickers`.
    scannable_pos: Vec<Option<usize>>,
    pub ledger: Ledger,
}

impl SimStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookups ────────────────────────────────────────────────

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        id.checked_sub(1).and_then(|i| self.players.get(i as usize))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        id.checked_sub(1).and_then(|i| self.players.get_mut(i as usize))
    }

    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        id.checked_sub(1).and_then(|i| self.stickers.get(i as usize))
    }

    pub fn sticker_mut(&mut self, id: StickerId) -> Option<&mut Sticker> {
        id.checked_sub(1).and_then(|i| self.stickers.get_mut(i as usize))
    }

    /// Active player ids in creation order.
    pub fn active_player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().filter(|p| p.is_active).map(|p| p.id).collect()
    }

    pub fn active_player_count(&self) -> u64 {
        self.players.iter().filter(|p| p.is_active).count() as u64
    }

    pub fn scannable(&self) -> &[StickerId] {
        &self.scannable
    }

    pub fn active_sticker_count(&self) -> u64 {
        self.scannable.len() as u64
    }

    fn active_player_mut(&mut self, id: PlayerId) -> Result<&mut Player, Rejection> {
        let player = self.player_mut(id).ok_or(Rejection::UnknownPlayer(id))?;
        if !player.is_active {
            return Err(Rejection::InactivePlayer(id));
        }
        Ok(player)
    }

    // ── Players ────────────────────────────────────────────────

    pub fn add_player(
        &mut self,
        archetype: Archetype,
        day: Day,
        is_new: bool,
        config: &SimConfig,
    ) -> PlayerId {
        let id = self.players.len() as PlayerId + 1;
        self.players.push(Player::new(id, archetype, day, is_new, config));
        self.owned_by.push(Vec::new());
        self.ledger.total_players_ever += 1;
        id
    }

    /// Permanently deactivate a player and take their stickers off the map.
    pub fn churn_player(&mut self, id: PlayerId, day: Day) -> Result<(), Rejection> {
        let player = self.active_player_mut(id)?;
        player.is_active = false;
        player.churn_day = Some(day);

        let owned = std::mem::take(&mut self.owned_by[id as usize - 1]);
        for sid in &owned {
            if let Some(sticker) = self.sticker_mut(*sid) {
                sticker.is_active = false;
            }
            self.unlist(*sid);
        }
        self.owned_by[id as usize - 1] = owned;
        self.ledger.churned_total += 1;
        Ok(())
    }

    /// Drop a sticker from the scannable set in O(1).
    fn unlist(&mut self, sid: StickerId) {
        let Some(pos) = self.scannable_pos[sid as usize - 1].take() else { return };
        self.scannable.swap_remove(pos);
        if let Some(&moved) = self.scannable.get(pos) {
            self.scannable_pos[moved as usize - 1] = Some(pos);
        }
    }

    /// Add free stickers to a player's hand.
    pub fn grant_stickers(&mut self, id: PlayerId, count: u32) -> Result<(), Rejection> {
        let player = self.active_player_mut(id)?;
        player.stickers_owned += count;
        Ok(())
    }

    // ── Purchases ──────────────────────────────────────────────

    /// Buy `packs` with real money. Returns the dollars charged.
    pub fn purchase_with_cash(
        &mut self,
        id: PlayerId,
        packs: u32,
        config: &SimConfig,
    ) -> Result<f64, Rejection> {
        let cost = f64::from(packs) * config.pack_price_dollars;
        let player = self.active_player_mut(id)?;
        player.money_spent += cost;
        player.stickers_owned += packs * config.stickers_per_pack;
        player.purchases += 1;
        let archetype = player.archetype;
        self.record_cash(archetype, cost);
        Ok(cost)
    }

    /// Top up with `dollars`, converted to points at the fixed rate and
    /// spent on as many packs as they cover. Leftover points stay on the
    /// balance. Returns the packs obtained.
    pub fn topup_for_packs(
        &mut self,
        id: PlayerId,
        dollars: f64,
        config: &SimConfig,
    ) -> Result<u32, Rejection> {
        let points = config.dollars_to_points(dollars);
        let packs = (points / config.pack_price_points).floor() as u32;
        let player = self.active_player_mut(id)?;
        player.money_spent += dollars;
        player.total_points += points - f64::from(packs) * config.pack_price_points;
        player.stickers_owned += packs * config.stickers_per_pack;
        player.purchases += 1;
        let archetype = player.archetype;
        self.record_cash(archetype, dollars);
        Ok(packs)
    }

    /// Buy `packs` with earned points. Returns the points spent.
    pub fn purchase_with_points(
        &mut self,
        id: PlayerId,
        packs: u32,
        config: &SimConfig,
    ) -> Result<f64, Rejection> {
        let cost = f64::from(packs) * config.pack_price_points;
        let player = self.active_player_mut(id)?;
        if player.total_points < cost {
            return Err(Rejection::InsufficientPoints {
                player_id: id,
                held:      player.total_points,
                needed:    cost,
            });
        }
        player.total_points -= cost;
        player.stickers_owned += packs * config.stickers_per_pack;
        player.purchases += 1;
        let archetype = player.archetype;
        *self.ledger.purchases.get_mut(archetype) += 1;
        self.ledger.point_purchases += 1;
        Ok(cost)
    }

    fn record_cash(&mut self, archetype: Archetype, dollars: f64) {
        self.ledger.total_revenue += dollars;
        *self.ledger.revenue_by_archetype.get_mut(archetype) += dollars;
        *self.ledger.purchases.get_mut(archetype) += 1;
        self.ledger.cash_purchases += 1;
    }

    // ── Stickers ───────────────────────────────────────────────

    /// Place one sticker from the owner's hand. The sticker takes the
    /// owner's current level.
    pub fn place_sticker(
        &mut self,
        owner_id: PlayerId,
        location: Location,
        venue_category: String,
        day: Day,
    ) -> Result<StickerId, Rejection> {
        let owner = self.active_player_mut(owner_id)?;
        if owner.stickers_owned == 0 {
            return Err(Rejection::EmptyInventory(owner_id));
        }
        owner.stickers_owned -= 1;
        owner.stickers_placed += 1;
        let level = owner.level;

        let id = self.stickers.len() as StickerId + 1;
        self.stickers.push(Sticker::new(id, owner_id, location, venue_category, level, day));
        self.owned_by[owner_id as usize - 1].push(id);
        self.scannable_pos.push(Some(self.scannable.len()));
        self.scannable.push(id);
        self.ledger.stickers_placed += 1;
        Ok(id)
    }

    // ── Day / week boundaries ──────────────────────────────────

    /// Reset per-day counters on every entity.
    pub fn begin_day(&mut self, config: &SimConfig) {
        for player in &mut self.players {
            player.days_since_last_activity += 1;
            if player.is_active {
                player.daily_points = 0.0;
                player.scans_today = 0;
            }
        }
        for sticker in &mut self.stickers {
            sticker.begin_day(config);
        }
    }

    /// Reset per-week counters on active players.
    pub fn begin_week(&mut self) {
        for player in self.players.iter_mut().filter(|p| p.is_active) {
            player.weekly_points = 0.0;
            player.venues_visited_this_week.clear();
        }
    }
}
