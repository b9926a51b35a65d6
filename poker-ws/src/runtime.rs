use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use texas_engine::{PlayerAction, Table, TableError};

use crate::config::Config;
use crate::persistence::{FinishedHandRecord, PersistenceAdapter, PlayerGameRecord};
use crate::snapshot::{build_table_state, TableSnapshot};

pub type ConnId = u64;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("table not found")]
    NotFound,
}

struct Connection {
    user_id: u64,
    show_all: bool,
    sender: mpsc::UnboundedSender<TableSnapshot>,
}

/// Owns one table's lock, its connected sessions, and the delayed-leave /
/// next-hand timers that run against it. One instance per live table; shared
/// via `Arc` between the session tasks that talk to it.
pub struct TableRuntime {
    table_id: String,
    table: Mutex<Table>,
    conns: Mutex<HashMap<ConnId, Connection>>,
    next_conn_id: AtomicU64,
    pending_leave: Mutex<HashMap<u64, JoinHandle<()>>>,
    pending_next_hand: Mutex<Option<JoinHandle<()>>>,
    start_stacks: Mutex<HashMap<u64, i64>>,
    config: Config,
    persistence: Arc<dyn PersistenceAdapter>,
}

impl TableRuntime {
    pub fn new(
        table_id: impl Into<String>,
        table: Table,
        config: Config,
        persistence: Arc<dyn PersistenceAdapter>,
    ) -> Arc<Self> {
        Arc::new(TableRuntime {
            table_id: table_id.into(),
            table: Mutex::new(table),
            conns: Mutex::new(HashMap::new()),
            next_conn_id: AtomicU64::new(0),
            pending_leave: Mutex::new(HashMap::new()),
            pending_next_hand: Mutex::new(None),
            start_stacks: Mutex::new(HashMap::new()),
            config,
            persistence,
        })
    }

    /// Registers a new connection for `user_id`, cancelling any delayed-leave
    /// timer pending for them, and returns its id plus a receiver for the
    /// snapshots it should forward to the socket.
    pub async fn register(self: &Arc<Self>, user_id: u64) -> (ConnId, mpsc::UnboundedReceiver<TableSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        self.conns.lock().await.insert(conn_id, Connection { user_id, show_all: false, sender: tx });
        self.cancel_pending_leave(user_id).await;
        (conn_id, rx)
    }

    /// Removes a connection. If it was the user's last live connection on
    /// this table, schedules the delayed-leave timer.
    pub async fn unregister(self: &Arc<Self>, conn_id: ConnId) {
        let user_id = {
            let mut conns = self.conns.lock().await;
            let Some(conn) = conns.remove(&conn_id) else { return };
            conn.user_id
        };
        let still_connected = self.conns.lock().await.values().any(|c| c.user_id == user_id);
        if !still_connected {
            self.schedule_delayed_leave(user_id).await;
        }
    }

    pub async fn set_show_all(&self, conn_id: ConnId, show_all: bool) -> bool {
        let mut conns = self.conns.lock().await;
        match conns.get_mut(&conn_id) {
            Some(conn) => {
                conn.show_all = show_all;
                true
            }
            None => false,
        }
    }

    pub async fn is_spectator(&self, user_id: u64) -> bool {
        self.table.lock().await.public_spectators().iter().any(|s| s.user_id == user_id)
    }

    pub async fn is_seated(&self, user_id: u64) -> bool {
        self.table.lock().await.public_players().any(|p| p.user_id == user_id)
    }

    pub async fn seat_player(&self, user_id: u64, stack: i64) -> Result<(), RuntimeError> {
        self.table.lock().await.seat_player(user_id, stack)?;
        Ok(())
    }

    pub async fn seat_spectator(&self, user_id: u64) {
        self.table.lock().await.seat_spectator(user_id);
    }

    pub async fn is_hand_active(&self) -> bool {
        self.table.lock().await.is_hand_active()
    }

    /// Starts a new hand, cancelling any pending auto-start timer first. The
    /// session layer calls this when a player acts with no hand in progress.
    pub async fn start_hand(self: &Arc<Self>) -> Result<(), TableError> {
        self.cancel_pending_next_hand_locked().await;
        let mut table = self.table.lock().await;
        table.start_hand()?;
        self.snapshot_start_stacks(&table).await;
        Ok(())
    }

    async fn snapshot_start_stacks(&self, table: &Table) {
        let stacks = table.players.iter().map(|p| (p.user_id, p.stack)).collect();
        *self.start_stacks.lock().await = stacks;
    }

    pub async fn apply_action(&self, user_id: u64, action: PlayerAction, amount: i64) -> Result<(), TableError> {
        let record = {
            let mut table = self.table.lock().await;
            table.apply_action(user_id, action, amount)?;
            if table.is_hand_active() {
                None
            } else {
                self.build_finished_hand_record(&table).await
            }
        };
        if let Some(record) = record {
            self.persistence.record_finished_hand(record).await;
        }
        Ok(())
    }

    /// Builds the persistence record for the hand that just finished, reading
    /// final stacks against the snapshot taken when the hand started.
    async fn build_finished_hand_record(&self, table: &Table) -> Option<FinishedHandRecord> {
        let game = table.game_state.as_ref()?;
        let start_stacks = self.start_stacks.lock().await;
        let winners: Vec<u64> = game.winners().iter().map(|&i| table.players[i].user_id).collect();
        let players = table
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let start_stack = start_stacks.get(&p.user_id).copied().unwrap_or(p.stack);
                PlayerGameRecord {
                    user_id: p.user_id,
                    hole_cards: p.hole_cards.iter().map(|c| c.to_string()).collect(),
                    bet: p.total_bet_this_hand,
                    net_stack_delta: p.stack - start_stack,
                    resulting_balance: p.stack,
                    won_hand: winners.contains(&p.user_id),
                }
            })
            .collect();
        Some(FinishedHandRecord {
            id: Uuid::new_v4(),
            table_id: self.table_id.clone(),
            pot: game.final_pot(),
            board: game.board().iter().map(|c| c.to_string()).collect(),
            winners,
            players,
        })
    }

    pub async fn leave(self: &Arc<Self>, user_id: u64) -> i64 {
        let cashout = self.table.lock().await.leave(user_id);
        self.broadcast_state().await;
        cashout
    }

    /// Sends each connected viewer its own personalized snapshot; drops any
    /// connection whose receiver has gone away.
    pub async fn broadcast_state(&self) {
        let table = self.table.lock().await;
        let mut conns = self.conns.lock().await;
        let mut dead = Vec::new();
        for (&conn_id, conn) in conns.iter() {
            let snapshot = build_table_state(&self.table_id, &table, conn.user_id, conn.show_all);
            if conn.sender.send(snapshot).is_err() {
                dead.push(conn_id);
            }
        }
        for conn_id in dead {
            conns.remove(&conn_id);
        }
    }

    async fn cancel_pending_leave(&self, user_id: u64) {
        if let Some(handle) = self.pending_leave.lock().await.remove(&user_id) {
            handle.abort();
        }
    }

    async fn schedule_delayed_leave(self: &Arc<Self>, user_id: u64) {
        let mut pending = self.pending_leave.lock().await;
        if pending.contains_key(&user_id) {
            return;
        }
        let runtime = Arc::clone(self);
        let grace = self.config.leave_grace;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let still_connected = runtime.conns.lock().await.values().any(|c| c.user_id == user_id);
            if still_connected {
                return;
            }
            runtime.table.lock().await.leave(user_id);
            runtime.broadcast_state().await;
            runtime.pending_leave.lock().await.remove(&user_id);
        });
        pending.insert(user_id, handle);
    }

    async fn cancel_pending_next_hand_locked(&self) {
        if let Some(handle) = self.pending_next_hand.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn schedule_next_hand(self: &Arc<Self>) {
        let mut pending = self.pending_next_hand.lock().await;
        if pending.is_some() {
            return;
        }
        let runtime = Arc::clone(self);
        let delay = self.config.next_hand_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let started = {
                let mut table = runtime.table.lock().await;
                if table.eligible_to_start() && table.start_hand().is_ok() {
                    runtime.snapshot_start_stacks(&table).await;
                    true
                } else {
                    false
                }
            };
            if started {
                runtime.broadcast_state().await;
            }
            *runtime.pending_next_hand.lock().await = None;
        });
        *pending = Some(handle);
    }

    /// Starts a hand immediately if enough players are eligible, broadcasting
    /// state on success. Used on first join and after a manual start request.
    pub async fn maybe_start_game(self: &Arc<Self>) -> bool {
        let started = {
            let mut table = self.table.lock().await;
            if !table.eligible_to_start() {
                return false;
            }
            self.cancel_pending_next_hand_locked().await;
            if table.start_hand().is_ok() {
                self.snapshot_start_stacks(&table).await;
                true
            } else {
                false
            }
        };
        if started {
            info!(table_id = %self.table_id, "hand started");
            self.broadcast_state().await;
        }
        started
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }
}
