use std::cmp::Ordering;
use std::collections::HashMap;

use itertools::Itertools;

use crate::cards::{Card, Suit};
use crate::error::GameError;

/// The nine mutually exclusive hand categories, ordered low to high. A royal
/// flush is not a separate variant — it's simply the highest `StraightFlush`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandRank {
    HighCard = 0,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

/// The evaluated strength of a five-card hand: its category, tie-breaking
/// kicker values (rank values, high to low, meaning varies per category), and
/// the five cards that produced it. Comparison is purely by `(rank, kickers)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandEvaluation {
    pub rank: HandRank,
    pub kicker_values: Vec<u8>,
    pub cards: [Card; 5],
}

impl HandEvaluation {
    fn score(&self) -> (HandRank, &[u8]) {
        (self.rank, &self.kicker_values)
    }
}

impl PartialOrd for HandEvaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandEvaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score().cmp(&other.score())
    }
}

/// Finds the best five-card hand obtainable from `hole_cards` + `board_cards`
/// by enumerating every five-card combination.
pub fn evaluate_best_hand(hole_cards: &[Card], board_cards: &[Card]) -> Result<HandEvaluation, GameError> {
    let mut combined = Vec::with_capacity(hole_cards.len() + board_cards.len());
    combined.extend_from_slice(hole_cards);
    combined.extend_from_slice(board_cards);
    if combined.len() < 5 {
        return Err(GameError::NotEnoughCardsToEvaluate);
    }
    combined
        .into_iter()
        .combinations(5)
        .map(|combo| classify_hand(&combo))
        .max()
        .ok_or(GameError::NotEnoughCardsToEvaluate)
}

/// Evaluates every contender's best hand and returns the subset tying for
/// best, alongside that winning evaluation.
pub fn determine_winners<'a, T>(
    contenders: &'a [T],
    hole_cards_of: impl Fn(&'a T) -> &'a [Card],
    board_cards: &[Card],
) -> Result<(Vec<&'a T>, HandEvaluation), GameError> {
    let mut evaluations = Vec::with_capacity(contenders.len());
    for contender in contenders {
        let evaluation = evaluate_best_hand(hole_cards_of(contender), board_cards)?;
        evaluations.push((contender, evaluation));
    }
    let best = evaluations
        .iter()
        .map(|(_, eval)| eval.clone())
        .max()
        .ok_or(GameError::NotEnoughCardsToEvaluate)?;
    let winners = evaluations
        .into_iter()
        .filter(|(_, eval)| *eval == best)
        .map(|(contender, _)| contender)
        .collect();
    Ok((winners, best))
}

fn classify_hand(cards: &[Card]) -> HandEvaluation {
    debug_assert_eq!(cards.len(), 5);
    let mut values: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    let mut ordered_cards: Vec<Card> = cards.to_vec();
    ordered_cards.sort_by(|a, b| b.rank.value().cmp(&a.rank.value()));
    let ordered: [Card; 5] = ordered_cards.try_into().unwrap();

    let is_flush = cards.iter().map(|c| c.suit).collect::<std::collections::HashSet<Suit>>().len() == 1;
    let (is_straight, straight_high) = detect_straight(&values);

    let mut counts: HashMap<u8, u8> = HashMap::new();
    for &v in &values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut by_count: Vec<(u8, u8)> = counts.into_iter().map(|(value, count)| (count, value)).collect();
    by_count.sort_unstable_by(|a, b| b.cmp(a));

    if is_straight && is_flush {
        return HandEvaluation { rank: HandRank::StraightFlush, kicker_values: vec![straight_high], cards: ordered };
    }

    if by_count[0].0 == 4 {
        let quad_value = by_count[0].1;
        let kicker = values.iter().copied().find(|&v| v != quad_value).unwrap();
        return HandEvaluation { rank: HandRank::FourOfAKind, kicker_values: vec![quad_value, kicker], cards: ordered };
    }

    if by_count[0].0 == 3 && by_count[1].0 == 2 {
        return HandEvaluation {
            rank: HandRank::FullHouse,
            kicker_values: vec![by_count[0].1, by_count[1].1],
            cards: ordered,
        };
    }

    if is_flush {
        return HandEvaluation { rank: HandRank::Flush, kicker_values: values, cards: ordered };
    }

    if is_straight {
        return HandEvaluation { rank: HandRank::Straight, kicker_values: vec![straight_high], cards: ordered };
    }

    if by_count[0].0 == 3 {
        let triple = by_count[0].1;
        let kickers: Vec<u8> = values.iter().copied().filter(|&v| v != triple).collect();
        let mut kicker_values = vec![triple];
        kicker_values.extend(kickers);
        return HandEvaluation { rank: HandRank::ThreeOfAKind, kicker_values, cards: ordered };
    }

    if by_count[0].0 == 2 && by_count[1].0 == 2 {
        let pair_high = by_count[0].1.max(by_count[1].1);
        let pair_low = by_count[0].1.min(by_count[1].1);
        let kicker = values.iter().copied().find(|&v| v != pair_high && v != pair_low).unwrap();
        return HandEvaluation {
            rank: HandRank::TwoPair,
            kicker_values: vec![pair_high, pair_low, kicker],
            cards: ordered,
        };
    }

    if by_count[0].0 == 2 {
        let pair = by_count[0].1;
        let kickers: Vec<u8> = values.iter().copied().filter(|&v| v != pair).collect();
        let mut kicker_values = vec![pair];
        kicker_values.extend(kickers);
        return HandEvaluation { rank: HandRank::OnePair, kicker_values, cards: ordered };
    }

    HandEvaluation { rank: HandRank::HighCard, kicker_values: values, cards: ordered }
}

/// Detects the highest straight among (possibly non-contiguous) rank values,
/// handling the wheel (A-2-3-4-5, where the ace plays low and the straight's
/// high card is 5).
fn detect_straight(values: &[u8]) -> (bool, u8) {
    let mut unique: Vec<u8> = values.to_vec();
    unique.sort_unstable_by(|a, b| b.cmp(a));
    unique.dedup();
    if unique.first() == Some(&14) {
        unique.push(1);
    }
    let mut consecutive = 1usize;
    for i in 1..unique.len() {
        if unique[i - 1] - 1 == unique[i] {
            consecutive += 1;
            if consecutive >= 5 {
                return (true, unique[i - 4]);
            }
        } else {
            consecutive = 1;
        }
    }
    (false, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Rank;
    use rstest::rstest;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[rstest]
    #[case(vec![c(Rank::Ace, Suit::Spades), c(Rank::King, Suit::Spades), c(Rank::Queen, Suit::Spades), c(Rank::Jack, Suit::Spades), c(Rank::Ten, Suit::Spades)], HandRank::StraightFlush)]
    #[case(vec![c(Rank::Two, Suit::Clubs), c(Rank::Two, Suit::Hearts), c(Rank::Two, Suit::Diamonds), c(Rank::Two, Suit::Spades), c(Rank::King, Suit::Clubs)], HandRank::FourOfAKind)]
    #[case(vec![c(Rank::Three, Suit::Clubs), c(Rank::Three, Suit::Hearts), c(Rank::Three, Suit::Diamonds), c(Rank::Nine, Suit::Spades), c(Rank::Nine, Suit::Clubs)], HandRank::FullHouse)]
    #[case(vec![c(Rank::Two, Suit::Clubs), c(Rank::Six, Suit::Clubs), c(Rank::Nine, Suit::Clubs), c(Rank::Jack, Suit::Clubs), c(Rank::King, Suit::Clubs)], HandRank::Flush)]
    #[case(vec![c(Rank::Five, Suit::Clubs), c(Rank::Four, Suit::Hearts), c(Rank::Three, Suit::Diamonds), c(Rank::Two, Suit::Spades), c(Rank::Ace, Suit::Clubs)], HandRank::Straight)]
    fn classifies_five_card_hands(#[case] cards: Vec<Card>, #[case] expected: HandRank) {
        assert_eq!(classify_hand(&cards).rank, expected);
    }

    #[test]
    fn wheel_straight_is_lowest_straight() {
        let wheel = classify_hand(&[
            c(Rank::Five, Suit::Clubs),
            c(Rank::Four, Suit::Hearts),
            c(Rank::Three, Suit::Diamonds),
            c(Rank::Two, Suit::Spades),
            c(Rank::Ace, Suit::Clubs),
        ]);
        let six_high = classify_hand(&[
            c(Rank::Six, Suit::Clubs),
            c(Rank::Five, Suit::Hearts),
            c(Rank::Four, Suit::Diamonds),
            c(Rank::Three, Suit::Spades),
            c(Rank::Two, Suit::Clubs),
        ]);
        assert_eq!(wheel.rank, HandRank::Straight);
        assert_eq!(wheel.kicker_values, vec![5]);
        assert!(wheel < six_high);
    }

    #[test]
    fn wheel_straight_loses_to_trips() {
        let wheel = classify_hand(&[
            c(Rank::Five, Suit::Clubs),
            c(Rank::Four, Suit::Hearts),
            c(Rank::Three, Suit::Diamonds),
            c(Rank::Two, Suit::Spades),
            c(Rank::Ace, Suit::Clubs),
        ]);
        let trips = classify_hand(&[
            c(Rank::Seven, Suit::Clubs),
            c(Rank::Seven, Suit::Hearts),
            c(Rank::Seven, Suit::Diamonds),
            c(Rank::Two, Suit::Spades),
            c(Rank::Three, Suit::Clubs),
        ]);
        assert!(wheel > trips);
    }

    #[test]
    fn evaluate_best_hand_picks_strongest_of_seven() {
        let hole = [c(Rank::Ace, Suit::Hearts), c(Rank::Ace, Suit::Spades)];
        let board = [
            c(Rank::Ace, Suit::Clubs),
            c(Rank::Ace, Suit::Diamonds),
            c(Rank::King, Suit::Hearts),
            c(Rank::Two, Suit::Clubs),
            c(Rank::Three, Suit::Clubs),
        ];
        let best = evaluate_best_hand(&hole, &board).unwrap();
        assert_eq!(best.rank, HandRank::FourOfAKind);
    }

    #[test]
    fn rejects_fewer_than_five_cards() {
        let hole = [c(Rank::Ace, Suit::Hearts)];
        let board = [c(Rank::King, Suit::Hearts), c(Rank::Two, Suit::Clubs)];
        assert!(evaluate_best_hand(&hole, &board).is_err());
    }
}
