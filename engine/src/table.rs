use std::collections::HashSet;

use crate::error::{GameError, TableError};
use crate::game::{GamePhase, GameState, PlayerAction};
use crate::player::{PlayerState, PlayerStatus};

/// A seated table: its seats, blind structure, and (while a hand is in
/// progress) the current [`GameState`]. `Table` owns the one `Vec<PlayerState>`
/// for its seats and hands `&mut self.players` into every `GameState` call,
/// which is what keeps `GameState` itself free of any borrow back into the
/// seats it acts on.
#[derive(Debug, Clone)]
pub struct Table {
    pub max_players: usize,
    pub small_blind: i64,
    pub big_blind: i64,
    pub players: Vec<PlayerState>,
    pub spectators: Vec<PlayerState>,
    pending_leave_user_ids: HashSet<u64>,
    pub dealer: usize,
    pub game_state: Option<GameState>,
}

impl Table {
    pub fn new(max_players: usize, small_blind: i64, big_blind: i64) -> Self {
        Table {
            max_players,
            small_blind,
            big_blind,
            players: Vec::new(),
            spectators: Vec::new(),
            pending_leave_user_ids: HashSet::new(),
            dealer: 0,
            game_state: None,
        }
    }

    pub fn seat_player(&mut self, user_id: u64, stack: i64) -> Result<&PlayerState, TableError> {
        if self.players.len() >= self.max_players {
            return Err(TableError::TableFull);
        }
        let position = self.players.len();
        let seat = if self.is_hand_active() {
            PlayerState::waiting(user_id, stack, position)
        } else {
            PlayerState::new(user_id, stack, position)
        };
        self.players.push(seat);
        Ok(self.players.last().unwrap())
    }

    pub fn seat_spectator(&mut self, user_id: u64) {
        self.spectators.push(PlayerState::spectator(user_id));
    }

    /// Removes a user from the table, returning their cashout amount. If a
    /// hand is active and they're a seated player, they're force-folded and
    /// their stack is zeroed without refund; actual removal from the seat
    /// array is deferred until the hand ends (`evict_pending_leavers`), so
    /// seat indices stay stable for the rest of the hand.
    pub fn leave(&mut self, user_id: u64) -> i64 {
        self.spectators.retain(|s| s.user_id != user_id);

        let Some(player_index) = self.players.iter().position(|p| p.user_id == user_id) else {
            self.pending_leave_user_ids.remove(&user_id);
            return 0;
        };

        let cashout = self.players[player_index].stack.max(0);
        let hand_active = self.game_state.as_ref().is_some_and(GameState::is_hand_active);
        if hand_active {
            self.pending_leave_user_ids.insert(user_id);
            if let Some(game_state) = self.game_state.as_mut() {
                let _ = game_state.force_fold(&mut self.players, user_id);
            }
            self.players[player_index].stack = 0;
            let still_active = self.game_state.as_ref().is_some_and(GameState::is_hand_active);
            if !still_active {
                self.advance_dealer_button();
                self.evict_pending_leavers();
            }
            return cashout;
        }

        self.pending_leave_user_ids.remove(&user_id);
        self.players.remove(player_index);
        self.renumber_positions();
        cashout
    }

    pub fn start_hand(&mut self) -> Result<(), TableError> {
        if self.players.len() < 2 {
            return Err(TableError::Game(GameError::NotEnoughPlayers));
        }
        if self.game_state.as_ref().is_some_and(GameState::is_hand_active) {
            return Err(TableError::HandAlreadyInProgress);
        }
        let mut game_state = GameState::new(&self.players, self.dealer, self.small_blind, self.big_blind)
            .map_err(TableError::Game)?;
        game_state.start_hand(&mut self.players).map_err(TableError::Game)?;
        self.game_state = Some(game_state);
        Ok(())
    }

    pub fn apply_action(&mut self, user_id: u64, action: PlayerAction, amount: i64) -> Result<(), TableError> {
        let game_state = self.game_state.as_mut().ok_or(TableError::NoHandInProgress)?;
        if !self.players.iter().any(|p| p.user_id == user_id) {
            return Err(TableError::PlayerNotSeated(user_id));
        }
        game_state.apply_action(&mut self.players, user_id, action, amount).map_err(TableError::Game)?;
        if !game_state.is_hand_active() {
            self.advance_dealer_button();
            self.evict_pending_leavers();
        }
        Ok(())
    }

    /// Advances a finished hand's betting round to the next street, or to
    /// showdown. A no-op while a round is still open (the runtime should
    /// only call this once every active player has acted).
    pub fn advance_phase(&mut self) -> Result<(), TableError> {
        let game_state = self.game_state.as_mut().ok_or(TableError::NoHandInProgress)?;
        game_state.advance_phase(&mut self.players).map_err(TableError::Game)?;
        if !game_state.is_hand_active() {
            self.advance_dealer_button();
            self.evict_pending_leavers();
        }
        Ok(())
    }

    pub fn current_phase(&self) -> Option<GamePhase> {
        self.game_state.as_ref().map(GameState::phase)
    }

    pub fn is_hand_active(&self) -> bool {
        self.game_state.as_ref().is_some_and(GameState::is_hand_active)
    }

    pub fn public_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter().filter(|p| !self.pending_leave_user_ids.contains(&p.user_id))
    }

    pub fn public_spectators(&self) -> &[PlayerState] {
        &self.spectators
    }

    pub fn is_effectively_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }

    pub fn eligible_to_start(&self) -> bool {
        !self.is_hand_active()
            && self.players.iter().filter(|p| p.stack > 0 && p.status != PlayerStatus::Spectator).count() >= 2
    }

    fn evict_pending_leavers(&mut self) {
        if self.pending_leave_user_ids.is_empty() {
            return;
        }
        self.players.retain(|p| !self.pending_leave_user_ids.contains(&p.user_id));
        self.pending_leave_user_ids.clear();
        self.renumber_positions();
    }

    fn renumber_positions(&mut self) {
        for (idx, player) in self.players.iter_mut().enumerate() {
            player.position = idx;
        }
    }

    fn advance_dealer_button(&mut self) {
        if self.players.is_empty() {
            self.dealer = 0;
            return;
        }
        let mut next_index = (self.dealer + 1) % self.players.len();
        for _ in 0..self.players.len() {
            let player = &self.players[next_index];
            if player.stack > 0 && player.status != PlayerStatus::Spectator {
                self.dealer = next_index;
                return;
            }
            next_index = (next_index + 1) % self.players.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_table_with_players(n: usize, stack: i64) -> Table {
        let mut table = Table::new(9, 50, 100);
        for i in 0..n {
            table.seat_player(i as u64, stack).unwrap();
        }
        table
    }

    #[test]
    fn start_hand_requires_two_players() {
        let mut table = new_table_with_players(1, 1000);
        assert!(table.start_hand().is_err());
    }

    #[test]
    fn leave_during_active_hand_force_folds_and_zeros_stack() {
        let mut table = new_table_with_players(3, 1000);
        table.start_hand().unwrap();
        let leaver_id = 2;
        let cashout = table.leave(leaver_id);
        assert_eq!(cashout, 1000);
        // stack zeroed immediately even though the seat isn't evicted yet
        let seat = table.players.iter().find(|p| p.user_id == leaver_id).unwrap();
        assert_eq!(seat.stack, 0);
    }

    #[test]
    fn heads_up_fold_awards_entire_pot_to_remaining_player() {
        let mut table = new_table_with_players(2, 1000);
        table.start_hand().unwrap();
        let to_act = table.game_state.as_ref().unwrap().current_player_index().unwrap();
        let actor_id = table.players[to_act].user_id;
        table.apply_action(actor_id, PlayerAction::Fold, 0).unwrap();
        assert!(!table.is_hand_active());
        let total: i64 = table.players.iter().map(|p| p.stack).sum();
        assert_eq!(total, 2000);
    }

    #[test]
    fn seating_mid_hand_marks_the_new_seat_waiting_not_active() {
        let mut table = new_table_with_players(2, 1000);
        table.start_hand().unwrap();
        table.seat_player(99, 1000).unwrap();
        let seat = table.players.iter().find(|p| p.user_id == 99).unwrap();
        assert_eq!(seat.status, PlayerStatus::Waiting);
    }

    #[test]
    fn waiting_seat_is_promoted_to_active_at_the_next_hand() {
        let mut table = new_table_with_players(2, 1000);
        table.start_hand().unwrap();
        table.seat_player(99, 1000).unwrap();
        let to_act = table.game_state.as_ref().unwrap().current_player_index().unwrap();
        let actor_id = table.players[to_act].user_id;
        table.apply_action(actor_id, PlayerAction::Fold, 0).unwrap();
        table.start_hand().unwrap();
        let seat = table.players.iter().find(|p| p.user_id == 99).unwrap();
        assert_eq!(seat.status, PlayerStatus::Active);
    }
}
