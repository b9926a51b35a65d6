use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One seated player's result in a finished hand, mirroring the
/// `player_games` row a durable backend would write.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerGameRecord {
    pub user_id: u64,
    pub hole_cards: Vec<String>,
    pub bet: i64,
    pub net_stack_delta: i64,
    pub resulting_balance: i64,
    pub won_hand: bool,
}

/// A completed hand, mirroring the `finished_games` row plus its nested
/// per-player rows.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedHandRecord {
    pub id: Uuid,
    pub table_id: String,
    pub pot: i64,
    pub board: Vec<String>,
    pub winners: Vec<u64>,
    pub players: Vec<PlayerGameRecord>,
}

/// Running aggregate stats for one user across every hand they've played,
/// updated incrementally as each hand finishes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerStats {
    pub user_id: u64,
    pub hands_won: u64,
    pub hands_lost: u64,
    pub max_balance: i64,
    pub max_bet: i64,
    pub lost_stack: i64,
    pub won_stack: i64,
}

impl PlayerStats {
    pub fn new(user_id: u64) -> Self {
        PlayerStats { user_id, ..Default::default() }
    }

    /// Folds one hand's result into the running aggregate.
    pub fn apply(&mut self, won_hand: bool, bet: i64, net_stack_delta: i64, resulting_balance: i64) {
        if won_hand {
            self.hands_won += 1;
        } else {
            self.hands_lost += 1;
        }
        if bet > self.max_bet {
            self.max_bet = bet;
        }
        if net_stack_delta >= 0 {
            self.won_stack += net_stack_delta;
        } else {
            self.lost_stack += -net_stack_delta;
        }
        if resulting_balance > self.max_balance {
            self.max_balance = resulting_balance;
        }
    }
}

/// External collaborator for durable storage. Token issuance, user accounts
/// and the hand-history/stats tables themselves live outside this crate —
/// this trait is the seam the table runtime calls into when a hand finishes.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn record_finished_hand(&self, hand: FinishedHandRecord);
    async fn credit_balance(&self, user_id: u64, amount: i64);
    async fn player_stats(&self, user_id: u64) -> Option<PlayerStats>;
}

/// In-memory stand-in for tests and local runs.
#[derive(Default)]
pub struct InMemoryPersistence {
    hands: Mutex<Vec<FinishedHandRecord>>,
    balances: Mutex<HashMap<u64, i64>>,
    stats: Mutex<HashMap<u64, PlayerStats>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn balance_of(&self, user_id: u64) -> i64 {
        self.balances.lock().await.get(&user_id).copied().unwrap_or(0)
    }

    pub async fn hand_count(&self) -> usize {
        self.hands.lock().await.len()
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryPersistence {
    async fn record_finished_hand(&self, hand: FinishedHandRecord) {
        let mut stats = self.stats.lock().await;
        for player in &hand.players {
            let entry = stats.entry(player.user_id).or_insert_with(|| PlayerStats::new(player.user_id));
            entry.apply(player.won_hand, player.bet, player.net_stack_delta, player.resulting_balance);
        }
        self.hands.lock().await.push(hand);
    }

    async fn credit_balance(&self, user_id: u64, amount: i64) {
        *self.balances.lock().await.entry(user_id).or_insert(0) += amount;
    }

    async fn player_stats(&self, user_id: u64) -> Option<PlayerStats> {
        self.stats.lock().await.get(&user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_split_won_and_lost_stack_by_sign() {
        let mut stats = PlayerStats::new(1);
        stats.apply(true, 200, 300, 1300);
        stats.apply(false, 100, -150, 1150);
        assert_eq!(stats.hands_won, 1);
        assert_eq!(stats.hands_lost, 1);
        assert_eq!(stats.won_stack, 300);
        assert_eq!(stats.lost_stack, 150);
        assert_eq!(stats.max_bet, 200);
        assert_eq!(stats.max_balance, 1300);
    }

    #[tokio::test]
    async fn in_memory_persistence_aggregates_across_hands() {
        let store = InMemoryPersistence::new();
        let hand = FinishedHandRecord {
            id: Uuid::nil(),
            table_id: "t1".into(),
            pot: 500,
            board: vec!["AS".into(), "KD".into()],
            winners: vec![1],
            players: vec![
                PlayerGameRecord {
                    user_id: 1,
                    hole_cards: vec!["AS".into(), "AD".into()],
                    bet: 500,
                    net_stack_delta: 250,
                    resulting_balance: 1250,
                    won_hand: true,
                },
                PlayerGameRecord {
                    user_id: 2,
                    hole_cards: vec!["2C".into(), "3C".into()],
                    bet: 500,
                    net_stack_delta: -250,
                    resulting_balance: 750,
                    won_hand: false,
                },
            ],
        };
        store.record_finished_hand(hand).await;
        assert_eq!(store.hand_count().await, 1);
        let winner_stats = store.player_stats(1).await.unwrap();
        assert_eq!(winner_stats.hands_won, 1);
        assert_eq!(winner_stats.won_stack, 250);
    }
}
