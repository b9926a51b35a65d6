use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::error::GameError;
use crate::hand_eval::{self, HandEvaluation};
use crate::player::{PlayerState, PlayerStatus};

/// The betting round a hand is in, plus the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

/// An action a player can submit against the current betting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// A single hand of Texas Hold'em in progress. Holds no reference to the
/// seat array — every mutating method is handed `&mut Vec<PlayerState>`
/// explicitly by the caller (the owning [`crate::table::Table`]), so there is
/// no self-referential borrow between a table's seats and its current hand.
#[derive(Debug, Clone)]
pub struct GameState {
    dealer_position: usize,
    num_seats: usize,
    deck: Deck,
    board: Vec<Card>,
    phase: GamePhase,
    pot: i64,
    small_blind_amount: i64,
    big_blind_amount: i64,
    minimum_raise: i64,
    current_bet: i64,
    current_player_index: Option<usize>,
    small_blind_index: usize,
    big_blind_index: usize,
    last_raiser_index: Option<usize>,
    hand_active: bool,
    winners: Vec<usize>,
    best_hand: Option<HandEvaluation>,
    /// The pot total at the moment it was distributed, retained after `pot`
    /// itself drops to zero so finished-hand records can report it.
    final_pot: i64,
}

impl GameState {
    pub fn new(
        players: &[PlayerState],
        dealer: usize,
        small_blind: i64,
        big_blind: i64,
    ) -> Result<Self, GameError> {
        if players.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }
        let num_seats = players.len();
        Ok(GameState {
            dealer_position: dealer % num_seats,
            num_seats,
            deck: Deck::new(),
            board: Vec::new(),
            phase: GamePhase::Finished,
            pot: 0,
            small_blind_amount: small_blind,
            big_blind_amount: big_blind,
            minimum_raise: big_blind,
            current_bet: 0,
            current_player_index: None,
            small_blind_index: 0,
            big_blind_index: 0,
            last_raiser_index: None,
            hand_active: false,
            winners: Vec::new(),
            best_hand: None,
            final_pot: 0,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_hand_active(&self) -> bool {
        self.hand_active
    }

    pub fn pot(&self) -> i64 {
        self.pot
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn current_bet(&self) -> i64 {
        self.current_bet
    }

    pub fn current_player_index(&self) -> Option<usize> {
        self.current_player_index
    }

    pub fn winners(&self) -> &[usize] {
        &self.winners
    }

    pub fn best_hand(&self) -> Option<&HandEvaluation> {
        self.best_hand.as_ref()
    }

    /// The pot size as of the hand that just finished, for persistence and
    /// the last-hand snapshot; `pot()` itself is back to zero by then.
    pub fn final_pot(&self) -> i64 {
        self.final_pot
    }

    /// Deals a fresh hand: posts blinds, deals hole cards, and opens the
    /// preflop betting round to the first eligible player after the big
    /// blind. The dealer is preserved as-is — heads-up, where the dealer and
    /// small blind are the same seat, is reached by this falling out of the
    /// normal blind-rotation math rather than a special case.
    pub fn start_hand(&mut self, players: &mut Vec<PlayerState>) -> Result<(), GameError> {
        let eligible = players
            .iter()
            .filter(|p| p.stack > 0 && p.status != PlayerStatus::Spectator)
            .count();
        if eligible < 2 {
            return Err(GameError::NotEnoughEligiblePlayers);
        }
        self.prepare_new_hand(players)?;
        self.phase = GamePhase::Preflop;
        let start = self.next_index(self.big_blind_index);
        self.current_player_index = self.start_betting_round(players, start, true);
        Ok(())
    }

    pub fn apply_action(
        &mut self,
        players: &mut Vec<PlayerState>,
        user_id: u64,
        action: PlayerAction,
        amount: i64,
    ) -> Result<(), GameError> {
        if !self.hand_active {
            return Err(GameError::HandNotActive);
        }
        let player_index = players
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or(GameError::PlayerNotFound)?;
        let current = self.current_player_index.ok_or(GameError::NoCurrentActor)?;
        if player_index != current {
            return Err(GameError::NotPlayersTurn);
        }
        if !matches!(players[player_index].status, PlayerStatus::Active | PlayerStatus::AllIn) {
            return Err(GameError::PlayerCannotAct);
        }

        match action {
            PlayerAction::Fold => {
                players[player_index].fold();
                players[player_index].has_acted_in_round = true;
                if self.players_still_in_hand(players).len() <= 1 {
                    self.finish_with_single_player(players);
                    return Ok(());
                }
            }
            PlayerAction::Check => {
                if players[player_index].bet != self.current_bet {
                    return Err(GameError::CannotCheckFacingBet);
                }
                players[player_index].check();
            }
            PlayerAction::Call => {
                let required = (self.current_bet - players[player_index].bet).max(0);
                let committed = players[player_index].call(required)?;
                self.pot += committed;
            }
            PlayerAction::Bet => {
                if self.current_bet != 0 {
                    return Err(GameError::BetNotAvailable);
                }
                if amount < self.minimum_raise {
                    return Err(GameError::BetTooSmall);
                }
                let committed = players[player_index].bet_chips(amount)?;
                self.current_bet = players[player_index].bet;
                self.pot += committed;
                self.minimum_raise = amount;
                self.last_raiser_index = Some(player_index);
                self.reset_round_actions(players, Some(player_index));
            }
            PlayerAction::Raise => {
                if self.current_bet == 0 {
                    return Err(GameError::NoBetToRaise);
                }
                if amount <= self.current_bet {
                    return Err(GameError::RaiseMustExceedCurrentBet);
                }
                let raise_size = amount - self.current_bet;
                if raise_size < self.minimum_raise {
                    return Err(GameError::RaiseTooSmall);
                }
                let required = amount - players[player_index].bet;
                let committed = players[player_index].raise_bet(required)?;
                self.pot += committed;
                self.current_bet = players[player_index].bet;
                self.minimum_raise = raise_size;
                self.last_raiser_index = Some(player_index);
                self.reset_round_actions(players, Some(player_index));
            }
            PlayerAction::AllIn => {
                if players[player_index].stack <= 0 {
                    return Err(GameError::ZeroStackAllIn);
                }
                let committed = players[player_index].go_all_in()?;
                self.pot += committed;
                let bet = players[player_index].bet;
                if bet > self.current_bet {
                    let raise_size = bet - self.current_bet;
                    self.current_bet = bet;
                    if raise_size >= self.minimum_raise {
                        self.minimum_raise = raise_size;
                        self.last_raiser_index = Some(player_index);
                        self.reset_round_actions(players, Some(player_index));
                    }
                    // A short all-in below the minimum raise size counts as a
                    // call: it does not reopen betting for players who already acted.
                }
            }
        }

        self.advance_turn(players)?;
        Ok(())
    }

    /// Forces a fold out of turn (a player disconnecting/leaving mid-hand).
    /// Unlike [`Self::apply_action`] this does not require the player to be
    /// the current actor.
    pub fn force_fold(&mut self, players: &mut Vec<PlayerState>, user_id: u64) -> Result<(), GameError> {
        if !self.hand_active {
            return Ok(());
        }
        let player_index = players
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or(GameError::PlayerNotFound)?;
        if !players[player_index].is_active_in_hand() {
            return Ok(());
        }
        let was_current = self.current_player_index == Some(player_index);
        players[player_index].fold();
        players[player_index].has_acted_in_round = true;

        if self.players_still_in_hand(players).len() <= 1 {
            self.finish_with_single_player(players);
            return Ok(());
        }
        if was_current {
            self.advance_turn(players)?;
        }
        Ok(())
    }

    pub fn advance_phase(&mut self, players: &mut Vec<PlayerState>) -> Result<(), GameError> {
        if !self.hand_active {
            return Ok(());
        }
        loop {
            match self.phase {
                GamePhase::Preflop => {
                    self.phase = GamePhase::Flop;
                    self.deal_board_cards(3)?;
                    let start = self.next_index(self.dealer_position);
                    self.current_player_index = self.start_betting_round(players, start, false);
                }
                GamePhase::Flop => {
                    self.phase = GamePhase::Turn;
                    self.deal_board_cards(1)?;
                    let start = self.next_index(self.dealer_position);
                    self.current_player_index = self.start_betting_round(players, start, false);
                }
                GamePhase::Turn => {
                    self.phase = GamePhase::River;
                    self.deal_board_cards(1)?;
                    let start = self.next_index(self.dealer_position);
                    self.current_player_index = self.start_betting_round(players, start, false);
                }
                GamePhase::River => {
                    self.phase = GamePhase::Showdown;
                    self.run_showdown(players)?;
                    return Ok(());
                }
                GamePhase::Showdown => {
                    self.phase = GamePhase::Finished;
                    self.hand_active = false;
                    return Ok(());
                }
                GamePhase::Finished => return Ok(()),
            }

            if self.current_player_index.is_some() {
                return Ok(());
            }
            if matches!(self.phase, GamePhase::Showdown | GamePhase::Finished) {
                return Ok(());
            }
        }
    }

    fn prepare_new_hand(&mut self, players: &mut Vec<PlayerState>) -> Result<(), GameError> {
        self.deck.reset();
        self.board.clear();
        self.pot = 0;
        self.winners.clear();
        self.best_hand = None;
        self.hand_active = true;
        for player in players.iter_mut() {
            player.reset_for_new_hand();
        }
        self.small_blind_index = self.next_eligible_index(players, self.dealer_position)?;
        self.big_blind_index = self.next_eligible_index(players, self.small_blind_index)?;
        players[self.small_blind_index].is_small_blind = true;
        players[self.big_blind_index].is_big_blind = true;
        self.post_blind(players, self.small_blind_index, self.small_blind_amount);
        self.post_blind(players, self.big_blind_index, self.big_blind_amount);
        self.current_bet = players.iter().map(|p| p.bet).max().unwrap_or(0);
        self.minimum_raise = self.big_blind_amount;
        self.deal_private_cards(players)?;
        Ok(())
    }

    fn post_blind(&mut self, players: &mut [PlayerState], index: usize, amount: i64) {
        let player = &mut players[index];
        if matches!(player.status, PlayerStatus::Out | PlayerStatus::Spectator) {
            return;
        }
        let blind_amount = if player.stack > 0 { amount.min(player.stack) } else { 0 };
        if blind_amount == 0 {
            return;
        }
        let committed = player.bet_chips(blind_amount).expect("blind is capped at stack");
        self.pot += committed;
    }

    fn deal_private_cards(&mut self, players: &mut [PlayerState]) -> Result<(), GameError> {
        for _ in 0..2 {
            for player in players.iter_mut() {
                if matches!(player.status, PlayerStatus::Spectator | PlayerStatus::Out) {
                    continue;
                }
                player.hole_cards.push(self.deck.draw_card()?);
            }
        }
        Ok(())
    }

    fn deal_board_cards(&mut self, amount: usize) -> Result<(), GameError> {
        self.deck.draw_card()?;
        self.board.extend(self.deck.draw_many(amount)?);
        Ok(())
    }

    fn start_betting_round(
        &mut self,
        players: &mut [PlayerState],
        start_index: usize,
        preserve_existing_bets: bool,
    ) -> Option<usize> {
        if !preserve_existing_bets {
            for player in players.iter_mut() {
                player.reset_for_betting_round();
            }
            self.current_bet = 0;
            self.minimum_raise = self.big_blind_amount;
        }
        for player in players.iter_mut() {
            let can_act = player.status == PlayerStatus::Active;
            player.has_acted_in_round = !can_act;
        }
        self.find_next_player(players, start_index)
    }

    fn advance_turn(&mut self, players: &mut Vec<PlayerState>) -> Result<(), GameError> {
        if !self.hand_active {
            return Ok(());
        }
        if self.players_still_in_hand(players).len() <= 1 {
            self.finish_with_single_player(players);
            return Ok(());
        }
        if self.is_round_complete(players) {
            self.current_player_index = None;
            return self.advance_phase(players);
        }
        let current = self.current_player_index.expect("advance_turn called with an open round");
        let next = self.find_next_player(players, self.next_index(current));
        self.current_player_index = next;
        if self.current_player_index.is_none() {
            return self.advance_phase(players);
        }
        Ok(())
    }

    fn is_round_complete(&self, players: &[PlayerState]) -> bool {
        let active: Vec<&PlayerState> = players.iter().filter(|p| p.status == PlayerStatus::Active).collect();
        if active.len() <= 1 {
            return true;
        }
        active.iter().all(|p| p.has_acted_in_round && p.bet == self.current_bet)
    }

    fn run_showdown(&mut self, players: &mut Vec<PlayerState>) -> Result<(), GameError> {
        let contenders: Vec<usize> = players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_active_in_hand())
            .map(|(i, _)| i)
            .collect();
        if contenders.is_empty() {
            self.phase = GamePhase::Finished;
            self.hand_active = false;
            return Ok(());
        }
        let (winners, best_hand) = hand_eval::determine_winners(&contenders, |&i| players[i].hole_cards.as_slice(), &self.board)?;
        let winners: Vec<usize> = winners.into_iter().copied().collect();
        self.winners = winners.clone();
        self.best_hand = Some(best_hand);
        self.distribute_side_pots(players, &winners)?;
        self.phase = GamePhase::Finished;
        self.hand_active = false;
        Ok(())
    }

    /// Splits the pot into layers so that a short all-in only contends for
    /// the portion of the pot it could have matched, with any excess
    /// contributed by deeper stacks forming side pots among the remaining
    /// contenders. Within a layer, ties split evenly with the remainder
    /// distributed one chip at a time to the first winners in seat order.
    ///
    /// `winners` are the showdown-best contenders overall; a layer's actual
    /// winners are whichever of those also contributed to that layer (a
    /// side pot a short all-in winner didn't buy into goes to the next-best
    /// hand among the players who did).
    fn distribute_side_pots(&mut self, players: &mut Vec<PlayerState>, winners: &[usize]) -> Result<(), GameError> {
        let mut levels: Vec<i64> = players
            .iter()
            .filter(|p| p.total_bet_this_hand > 0)
            .map(|p| p.total_bet_this_hand)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let folded: std::collections::HashSet<usize> =
            players.iter().enumerate().filter(|(_, p)| p.status == PlayerStatus::Folded).map(|(i, _)| i).collect();

        let mut previous_level = 0i64;
        let mut total_distributed = 0i64;
        for level in levels {
            let layer_size = level - previous_level;
            if layer_size <= 0 {
                previous_level = level;
                continue;
            }
            let payers_in_layer =
                players.iter().filter(|p| p.total_bet_this_hand >= level).count() as i64;
            let layer_total = layer_size * payers_in_layer;

            // Eligible winners of this layer: overall winners who (a) are
            // still in the hand (not folded) and (b) contributed at least
            // this layer's level.
            let layer_winners: Vec<usize> = winners
                .iter()
                .copied()
                .filter(|&i| !folded.contains(&i) && players[i].total_bet_this_hand >= level)
                .collect();

            let recipients = if layer_winners.is_empty() {
                // No overall winner bought into this layer (they were a
                // short all-in that didn't reach it); award it to the best
                // hand among whoever did contribute and is still in.
                let contenders: Vec<usize> = players
                    .iter()
                    .enumerate()
                    .filter(|(i, p)| !folded.contains(i) && p.is_active_in_hand() && p.total_bet_this_hand >= level)
                    .map(|(i, _)| i)
                    .collect();
                if contenders.is_empty() {
                    Vec::new()
                } else {
                    let (best, _) =
                        hand_eval::determine_winners(&contenders, |&i| players[i].hole_cards.as_slice(), &self.board)?;
                    best.into_iter().copied().collect()
                }
            } else {
                layer_winners
            };

            if !recipients.is_empty() {
                let share = layer_total / recipients.len() as i64;
                let remainder = layer_total % recipients.len() as i64;
                for (n, &w) in recipients.iter().enumerate() {
                    let bonus = if (n as i64) < remainder { 1 } else { 0 };
                    players[w].stack += share + bonus;
                }
                total_distributed += layer_total;
            }
            previous_level = level;
        }

        self.final_pot = self.pot;
        self.pot = (self.pot - total_distributed).max(0);
        Ok(())
    }

    fn finish_with_single_player(&mut self, players: &mut Vec<PlayerState>) {
        let remaining: Vec<usize> =
            players.iter().enumerate().filter(|(_, p)| p.is_active_in_hand()).map(|(i, _)| i).collect();
        if remaining.is_empty() {
            self.hand_active = false;
            self.phase = GamePhase::Finished;
            return;
        }
        let winner = remaining[0];
        self.final_pot = self.pot;
        players[winner].stack += self.pot;
        self.winners = vec![winner];
        self.pot = 0;
        self.hand_active = false;
        self.phase = GamePhase::Finished;
    }

    fn find_next_player(&self, players: &[PlayerState], start_index: usize) -> Option<usize> {
        if players.is_empty() {
            return None;
        }
        let mut index = start_index % players.len();
        for _ in 0..players.len() {
            let player = &players[index];
            if player.status == PlayerStatus::Active && !player.has_acted_in_round {
                return Some(index);
            }
            index = self.next_index(index);
        }
        None
    }

    fn players_still_in_hand<'a>(&self, players: &'a [PlayerState]) -> Vec<&'a PlayerState> {
        players.iter().filter(|p| p.is_active_in_hand()).collect()
    }

    fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.num_seats
    }

    fn next_eligible_index(&self, players: &[PlayerState], from_index: usize) -> Result<usize, GameError> {
        let mut index = self.next_index(from_index);
        for _ in 0..players.len() {
            let player = &players[index];
            if !matches!(player.status, PlayerStatus::Out | PlayerStatus::Spectator) && player.stack > 0 {
                return Ok(index);
            }
            index = self.next_index(index);
        }
        Err(GameError::NoEligibleSeatForBlinds)
    }

    fn reset_round_actions(&mut self, players: &mut [PlayerState], except_index: Option<usize>) {
        for (idx, player) in players.iter_mut().enumerate() {
            if Some(idx) == except_index {
                player.has_acted_in_round = true;
                continue;
            }
            player.has_acted_in_round = player.status != PlayerStatus::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(user_id: u64, total_bet: i64, stack: i64) -> PlayerState {
        let mut p = PlayerState::new(user_id, stack, user_id as usize);
        p.total_bet_this_hand = total_bet;
        p
    }

    /// Concrete scenario: two players tie on a board straight; an odd pot
    /// (here, left odd by a folded contributor's dead chip) splits with the
    /// extra chip going to the earlier-seated winner.
    #[test]
    fn split_pot_remainder_goes_to_earlier_seat() {
        let mut folded = contributor(3, 1, 0);
        folded.status = PlayerStatus::Folded;
        let mut players = vec![contributor(1, 2, 0), contributor(2, 2, 0), folded];
        let template = players.clone();
        let mut state = GameState::new(&template, 0, 1, 2).unwrap();
        state.pot = 5;
        state.distribute_side_pots(&mut players, &[0, 1]).unwrap();
        assert_eq!(players[0].stack, 3);
        assert_eq!(players[1].stack, 2);
        assert_eq!(state.pot, 0);
    }

    /// Concrete scenario: an unequal all-in creates a side pot the short
    /// stack never contends for; it's awarded to the best hand among the
    /// players who covered it.
    #[test]
    fn short_all_in_only_wins_the_main_pot_layer() {
        use crate::cards::{Rank, Suit};

        let board = vec![
            Card::new(Rank::Two, Suit::Clubs),
            Card::new(Rank::Seven, Suit::Diamonds),
            Card::new(Rank::Nine, Suit::Hearts),
            Card::new(Rank::Jack, Suit::Spades),
            Card::new(Rank::King, Suit::Clubs),
        ];

        let mut seat0 = contributor(1, 200, 0);
        seat0.hole_cards = vec![Card::new(Rank::Ace, Suit::Hearts), Card::new(Rank::Ace, Suit::Spades)];
        let mut seat1 = contributor(2, 500, 0);
        seat1.hole_cards = vec![Card::new(Rank::King, Suit::Hearts), Card::new(Rank::King, Suit::Spades)];
        let mut seat2 = contributor(3, 500, 0);
        seat2.hole_cards = vec![Card::new(Rank::Three, Suit::Hearts), Card::new(Rank::Four, Suit::Spades)];
        let mut players = vec![seat0, seat1, seat2];

        let mut state = GameState::new(&players.clone(), 0, 25, 50).unwrap();
        state.board = board;
        state.pot = 1200;
        // Seat 0 (a pair of aces) is the overall showdown winner; seat 1
        // (a pair of kings) is the best hand among the deeper stacks that
        // covered the side pot.
        state.distribute_side_pots(&mut players, &[0]).unwrap();
        // Main pot: 200 * 3 = 600, all to seat 0.
        assert_eq!(players[0].stack, 600);
        // Side pot: 300 * 2 = 600, entirely to seat 1.
        assert_eq!(players[1].stack, 600);
        assert_eq!(players[2].stack, 0);
        assert_eq!(state.pot, 0);
    }
}
