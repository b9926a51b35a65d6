use serde::Serialize;

use texas_engine::{GamePhase, PlayerStatus, Table};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub user_id: u64,
    pub position: usize,
    pub stack: i64,
    pub bet: i64,
    pub status: PlayerStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hole_cards: Vec<String>,
}

/// A point-in-time view of a table, personalized for one viewer: hole cards
/// are included only for the viewer's own seat, unless `show_all` is set
/// (spectators may toggle this to see every hand).
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub table_id: String,
    pub phase: GamePhase,
    pub hand_active: bool,
    pub pot: i64,
    pub board: Vec<String>,
    pub players: Vec<PlayerView>,
    pub winners: Vec<u64>,
    pub best_hand_rank: Option<String>,
    pub best_hand_cards: Vec<String>,
    pub current_player_id: Option<u64>,
    pub current_bet: Option<i64>,
    pub min_bet: i64,
}

/// Builds a personalized snapshot of `table` for `viewer_id`. `show_all`
/// overrides hole-card hiding — only meaningful for spectators.
pub fn build_table_state(table_id: &str, table: &Table, viewer_id: u64, show_all: bool) -> TableSnapshot {
    let game = table.game_state.as_ref();

    let phase = game.map(|g| g.phase()).unwrap_or(GamePhase::Preflop);
    let pot = game.map(|g| g.pot()).unwrap_or(0);
    let board = game.map(|g| g.board().iter().map(|c| c.to_string()).collect()).unwrap_or_default();
    let current_bet = game.map(|g| g.current_bet());
    let hand_active = table.is_hand_active();
    let winners: Vec<u64> =
        game.map(|g| g.winners().iter().map(|&i| table.players[i].user_id).collect()).unwrap_or_default();

    let (best_hand_rank, best_hand_cards) = match game.and_then(|g| g.best_hand()) {
        Some(best) => (
            Some(format!("{:?}", best.rank)),
            best.cards.iter().map(|c| c.to_string()).collect(),
        ),
        None => (None, Vec::new()),
    };

    let current_player_id = game
        .and_then(|g| g.current_player_index())
        .and_then(|idx| table.players.get(idx))
        .map(|p| p.user_id);

    let reveal_all_hands = phase == GamePhase::Finished && !winners.is_empty();

    let players = table
        .public_players()
        .map(|p| {
            let reveal = show_all || reveal_all_hands || p.user_id == viewer_id;
            PlayerView {
                user_id: p.user_id,
                position: p.position,
                stack: p.stack,
                bet: p.bet,
                status: p.status,
                hole_cards: if reveal { p.hole_cards.iter().map(|c| c.to_string()).collect() } else { Vec::new() },
            }
        })
        .collect();

    TableSnapshot {
        table_id: table_id.to_string(),
        phase,
        hand_active,
        pot,
        board,
        players,
        winners,
        best_hand_rank,
        best_hand_cards,
        current_player_id,
        current_bet,
        min_bet: table.big_blind,
    }
}

/// Table state frozen at the moment a hand finishes: every hole card is
/// shown regardless of viewer, since the hand is over and nothing is hidden.
pub fn build_last_hand_snapshot(table_id: &str, table: &Table) -> TableSnapshot {
    build_table_state(table_id, table, 0, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_table() -> Table {
        let mut table = Table::new(6, 5, 10);
        table.seat_player(1, 1000).unwrap();
        table.seat_player(2, 1000).unwrap();
        table.start_hand().unwrap();
        table
    }

    #[test]
    fn hides_other_players_hole_cards() {
        let table = two_player_table();
        let snapshot = build_table_state("t1", &table, 1, false);
        let me = snapshot.players.iter().find(|p| p.user_id == 1).unwrap();
        let opponent = snapshot.players.iter().find(|p| p.user_id == 2).unwrap();
        assert_eq!(me.hole_cards.len(), 2);
        assert!(opponent.hole_cards.is_empty());
    }

    #[test]
    fn show_all_reveals_every_hand() {
        let table = two_player_table();
        let snapshot = build_table_state("t1", &table, 99, true);
        assert!(snapshot.players.iter().all(|p| p.hole_cards.len() == 2));
    }

    #[test]
    fn min_bet_tracks_table_big_blind() {
        let table = two_player_table();
        let snapshot = build_table_state("t1", &table, 1, false);
        assert_eq!(snapshot.min_bet, 10);
    }

    #[test]
    fn finished_hand_reveals_every_hole_card_even_to_a_bystander() {
        use texas_engine::PlayerAction;

        let mut table = two_player_table();
        let to_act = table.game_state.as_ref().unwrap().current_player_index().unwrap();
        let to_act = table.players[to_act].user_id;
        table.apply_action(to_act, PlayerAction::Fold, 0).unwrap();

        let snapshot = build_table_state("t1", &table, 99, false);
        assert_eq!(snapshot.phase, GamePhase::Finished);
        assert!(snapshot.players.iter().all(|p| p.hole_cards.len() == 2));
    }
}
