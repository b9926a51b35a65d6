use thiserror::Error;

use texas_engine::{GameError, TableError};

/// Session-level failures, each carrying the wire error code a client sees
/// alongside the human message.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid table id")]
    InvalidTableId,
    #[error("table not found")]
    TableNotFound,
    #[error("invalid json")]
    InvalidJson,
    #[error("unknown message type")]
    UnknownMessageType,
    #[error("missing action")]
    MissingAction,
    #[error("invalid action")]
    InvalidAction,
    #[error("show cards is available to spectators only")]
    SpectatorOnly,
    #[error("spectators cannot act")]
    SpectatorCannotAct,
    #[error("player not seated at this table")]
    PlayerNotSeated,
    #[error("could not start a hand: {0}")]
    StartHandFailed(TableError),
    #[error("action failed: {0}")]
    ActionFailed(TableError),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::MissingToken => "missing_token",
            SessionError::InvalidToken => "invalid_token",
            SessionError::InvalidTableId => "invalid_table_id",
            SessionError::TableNotFound => "table_not_found",
            SessionError::InvalidJson => "invalid_json",
            SessionError::UnknownMessageType => "unknown_message_type",
            SessionError::MissingAction => "missing_action",
            SessionError::InvalidAction => "invalid_action",
            SessionError::SpectatorOnly => "spectator_only",
            SessionError::SpectatorCannotAct => "spectator_cannot_act",
            SessionError::PlayerNotSeated => "player_not_seated",
            SessionError::StartHandFailed(_) => "start_hand_failed",
            SessionError::ActionFailed(_) => "action_failed",
        }
    }
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        SessionError::ActionFailed(TableError::Game(err))
    }
}
