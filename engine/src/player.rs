use serde::Serialize;

use crate::cards::Card;
use crate::error::GameError;

/// A seated player's standing with respect to the hand in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Seated and excluded from the hand currently in progress; will be
    /// dealt in at the next hand.
    Waiting,
    Active,
    Folded,
    AllIn,
    /// Seated but out of chips; sits out until re-buying.
    Out,
    Spectator,
}

/// The last voluntary action a player took, carried for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastAction {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// One seat's state, valid for the lifetime of the table (not just one hand).
#[derive(Debug, Clone, Serialize)]
pub struct PlayerState {
    pub user_id: u64,
    pub stack: i64,
    pub position: usize,
    pub status: PlayerStatus,
    pub hole_cards: Vec<Card>,
    pub bet: i64,
    /// Total chips committed to the pot across every betting round this
    /// hand, used at showdown to layer side pots (`bet` alone only covers
    /// the current street, since it resets every round).
    pub total_bet_this_hand: i64,
    pub last_action: Option<LastAction>,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub has_acted_in_round: bool,
}

impl PlayerState {
    pub fn new(user_id: u64, stack: i64, position: usize) -> Self {
        PlayerState {
            user_id,
            stack,
            position,
            status: PlayerStatus::Active,
            hole_cards: Vec::new(),
            bet: 0,
            total_bet_this_hand: 0,
            last_action: None,
            is_small_blind: false,
            is_big_blind: false,
            has_acted_in_round: false,
        }
    }

    /// A seat taken while a hand is already in progress: excluded from the
    /// current hand, promoted to `Active` by `reset_for_new_hand` at the
    /// next deal.
    pub fn waiting(user_id: u64, stack: i64, position: usize) -> Self {
        PlayerState { status: PlayerStatus::Waiting, ..Self::new(user_id, stack, position) }
    }

    pub fn spectator(user_id: u64) -> Self {
        PlayerState {
            user_id,
            stack: -1,
            position: usize::MAX,
            status: PlayerStatus::Spectator,
            hole_cards: Vec::new(),
            bet: 0,
            total_bet_this_hand: 0,
            last_action: None,
            is_small_blind: false,
            is_big_blind: false,
            has_acted_in_round: false,
        }
    }

    /// Resets per-hand bookkeeping before a new hand deals. A seat with no
    /// chips sits out; one waiting to rejoin becomes active here.
    pub fn reset_for_new_hand(&mut self) {
        if self.stack <= 0 {
            self.status = PlayerStatus::Out;
        } else if !matches!(self.status, PlayerStatus::Spectator) {
            self.status = PlayerStatus::Active;
        }
        self.hole_cards.clear();
        self.bet = 0;
        self.total_bet_this_hand = 0;
        self.last_action = None;
        self.is_small_blind = false;
        self.is_big_blind = false;
        self.has_acted_in_round = false;
    }

    pub fn reset_for_betting_round(&mut self) {
        self.bet = 0;
        self.has_acted_in_round = false;
    }

    pub fn fold(&mut self) {
        if self.status == PlayerStatus::Active {
            self.status = PlayerStatus::Folded;
            self.last_action = Some(LastAction::Fold);
        }
    }

    pub fn check(&mut self) {
        self.last_action = Some(LastAction::Check);
        self.has_acted_in_round = true;
    }

    pub fn call(&mut self, amount: i64) -> Result<i64, GameError> {
        let committed = self.commit(amount, true)?;
        self.last_action = Some(LastAction::Call);
        self.has_acted_in_round = true;
        Ok(committed)
    }

    pub fn bet_chips(&mut self, amount: i64) -> Result<i64, GameError> {
        let committed = self.commit(amount, false)?;
        self.last_action = Some(LastAction::Bet);
        self.has_acted_in_round = true;
        Ok(committed)
    }

    pub fn raise_bet(&mut self, amount: i64) -> Result<i64, GameError> {
        let committed = self.commit(amount, false)?;
        self.last_action = Some(LastAction::Raise);
        self.has_acted_in_round = true;
        Ok(committed)
    }

    pub fn go_all_in(&mut self) -> Result<i64, GameError> {
        if self.stack <= 0 {
            return Err(GameError::ZeroStackAllIn);
        }
        let committed = self.commit(self.stack, false)?;
        self.last_action = Some(LastAction::AllIn);
        self.has_acted_in_round = true;
        Ok(committed)
    }

    /// Moves `amount` from stack to bet. When `allow_partial` the commit is
    /// capped at the remaining stack (a call facing a short stack); otherwise
    /// committing more than the stack holds is an error.
    fn commit(&mut self, amount: i64, allow_partial: bool) -> Result<i64, GameError> {
        if amount < 0 {
            return Err(GameError::BetTooSmall);
        }
        if !allow_partial && amount > self.stack {
            return Err(GameError::ZeroStackAllIn);
        }
        let commit_amount = amount.min(self.stack);
        self.stack -= commit_amount;
        self.bet += commit_amount;
        self.total_bet_this_hand += commit_amount;
        if self.stack == 0 && self.status != PlayerStatus::Spectator {
            self.status = PlayerStatus::AllIn;
        }
        Ok(commit_amount)
    }

    pub fn is_active_in_hand(&self) -> bool {
        matches!(self.status, PlayerStatus::Active | PlayerStatus::AllIn)
    }
}
