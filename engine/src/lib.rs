//! Core Texas Hold'em rules engine: cards, hand evaluation, the player and
//! game state machines, and the table that owns them. Has no knowledge of
//! networking, persistence, or sessions — those live in the `poker-ws` crate.

pub mod cards;
pub mod deck;
pub mod error;
pub mod game;
pub mod hand_eval;
pub mod player;
pub mod table;

pub use cards::{Card, Rank, Suit};
pub use deck::Deck;
pub use error::{CardParseError, GameError, TableError};
pub use game::{GamePhase, GameState, PlayerAction};
pub use hand_eval::{evaluate_best_hand, HandEvaluation, HandRank};
pub use player::{LastAction, PlayerState, PlayerStatus};
pub use table::Table;
