use thiserror::Error;

/// Failure parsing a two-character card token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardParseError {
    #[error("card token must be exactly two characters, got {0:?}")]
    WrongLength(String),
    #[error("unrecognized rank character {0:?}")]
    BadRank(char),
    #[error("unrecognized suit character {0:?}")]
    BadSuit(char),
}

/// Failure applying an action or advancing a hand's state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("at least two players are required to start a hand")]
    NotEnoughPlayers,
    #[error("not enough players have chips to start a hand")]
    NotEnoughEligiblePlayers,
    #[error("the hand is finished")]
    HandNotActive,
    #[error("no player is currently eligible to act")]
    NoCurrentActor,
    #[error("it is not this player's turn")]
    NotPlayersTurn,
    #[error("player is not seated at this table")]
    PlayerNotFound,
    #[error("player cannot act right now")]
    PlayerCannotAct,
    #[error("cannot check while facing a bet")]
    CannotCheckFacingBet,
    #[error("betting is not available once a bet has been made; raise instead")]
    BetNotAvailable,
    #[error("bet amount is smaller than the minimum bet")]
    BetTooSmall,
    #[error("there is no bet to raise")]
    NoBetToRaise,
    #[error("raise must exceed the current bet")]
    RaiseMustExceedCurrentBet,
    #[error("raise is below the minimum allowed size")]
    RaiseTooSmall,
    #[error("player cannot go all-in with zero stack")]
    ZeroStackAllIn,
    #[error("not enough cards remain in the deck")]
    DeckExhausted,
    #[error("at least five cards are required to evaluate a hand")]
    NotEnoughCardsToEvaluate,
    #[error("unable to find an eligible seat for blinds")]
    NoEligibleSeatForBlinds,
}

/// Failure at the table level (seating, runtime bookkeeping).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("the table is full")]
    TableFull,
    #[error("player with id {0} is not seated at this table")]
    PlayerNotSeated(u64),
    #[error("a hand is already in progress")]
    HandAlreadyInProgress,
    #[error("no hand is currently in progress")]
    NoHandInProgress,
}
