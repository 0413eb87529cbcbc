//! Running winnings and the final bonus

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MatchError};
use crate::participant::{Participant, ParticipantId};
use crate::payoff;
use crate::round::{Exchange, ExchangeId};

/// What disconnected participants receive at the end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusPolicy {
    /// Paid for what they earned before leaving.
    #[default]
    IncludePartial,
    /// Paid nothing.
    ZeroDisconnected,
}

impl FromStr for BonusPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include_partial" => Ok(BonusPolicy::IncludePartial),
            "zero_disconnected" => Ok(BonusPolicy::ZeroDisconnected),
            other => Err(ConfigError::UnknownVariant {
                kind: "bonus policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Coins credited by one exchange
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payoff {
    pub bidder: u32,
    pub responder: u32,
}

/// Cumulative winnings per participant
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffLedger {
    winnings: BTreeMap<ParticipantId, u64>,
    applied: BTreeSet<ExchangeId>,
}

impl PayoffLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a closed exchange. Each exchange is credited at most once.
    pub fn apply_payoff(
        &mut self,
        exchange: &Exchange,
        coins_per_round: u32,
    ) -> Result<Payoff, MatchError> {
        let Some(response) = exchange.response else {
            return Err(MatchError::ExchangeStillOpen { exchange: exchange.id });
        };
        if self.applied.contains(&exchange.id) {
            return Err(MatchError::DuplicatePayoffApplication { exchange: exchange.id });
        }

        let (bidder, responder) = payoff(exchange.offer, response, coins_per_round);
        *self.winnings.entry(exchange.bidder.clone()).or_insert(0) += bidder as u64;
        *self.winnings.entry(exchange.responder.clone()).or_insert(0) += responder as u64;
        self.applied.insert(exchange.id);

        Ok(Payoff { bidder, responder })
    }

    pub fn winnings(&self, id: &ParticipantId) -> u64 {
        self.winnings.get(id).copied().unwrap_or(0)
    }

    pub fn is_applied(&self, id: ExchangeId) -> bool {
        self.applied.contains(&id)
    }

    /// Final payout per participant: winnings times the exchange rate,
    /// rounded to cents.
    pub fn compute_bonus(
        &self,
        participants: &[Participant],
        exchange_rate: f64,
        policy: BonusPolicy,
    ) -> BTreeMap<ParticipantId, f64> {
        participants
            .iter()
            .map(|p| {
                let coins = match policy {
                    BonusPolicy::ZeroDisconnected if !p.is_connected() => 0,
                    _ => self.winnings(&p.id),
                };
                let amount = (coins as f64 * exchange_rate * 100.0).round() / 100.0;
                (p.id.clone(), amount)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ConnectionStatus;
    use crate::round::Response;

    fn exchange(index: u32, offer: Option<u32>, response: Option<Response>) -> Exchange {
        Exchange {
            id: ExchangeId { round: 1, index },
            bidder: ParticipantId::from("a"),
            responder: ParticipantId::from("b"),
            offer,
            response,
            timed_out: false,
        }
    }

    #[test]
    fn test_accepted_splits_coins() {
        let mut ledger = PayoffLedger::new();
        let payoff = ledger
            .apply_payoff(&exchange(0, Some(30), Some(Response::Accepted)), 100)
            .unwrap();
        assert_eq!(payoff, Payoff { bidder: 70, responder: 30 });
        assert_eq!(ledger.winnings(&"a".into()), 70);
        assert_eq!(ledger.winnings(&"b".into()), 30);
    }

    #[test]
    fn test_rejected_pays_nothing() {
        let mut ledger = PayoffLedger::new();
        let payoff = ledger
            .apply_payoff(&exchange(0, Some(30), Some(Response::Rejected)), 100)
            .unwrap();
        assert_eq!(payoff, Payoff::default());
        assert_eq!(ledger.winnings(&"a".into()), 0);
        assert_eq!(ledger.winnings(&"b".into()), 0);
    }

    #[test]
    fn test_second_application_is_refused() {
        let mut ledger = PayoffLedger::new();
        let ex = exchange(0, Some(40), Some(Response::Accepted));
        ledger.apply_payoff(&ex, 100).unwrap();
        let err = ledger.apply_payoff(&ex, 100).unwrap_err();
        assert_eq!(
            err,
            MatchError::DuplicatePayoffApplication { exchange: ex.id }
        );
        assert_eq!(ledger.winnings(&"a".into()), 60);
        assert_eq!(ledger.winnings(&"b".into()), 40);
        assert!(ledger.is_applied(ex.id));
    }

    #[test]
    fn test_open_exchange_is_refused() {
        let mut ledger = PayoffLedger::new();
        let err = ledger.apply_payoff(&exchange(0, Some(40), None), 100).unwrap_err();
        assert!(matches!(err, MatchError::ExchangeStillOpen { .. }));
        assert!(!ledger.is_applied(ExchangeId { round: 1, index: 0 }));
    }

    #[test]
    fn test_winnings_accumulate_across_exchanges() {
        let mut ledger = PayoffLedger::new();
        ledger
            .apply_payoff(&exchange(0, Some(30), Some(Response::Accepted)), 100)
            .unwrap();
        ledger
            .apply_payoff(&exchange(1, Some(50), Some(Response::Accepted)), 100)
            .unwrap();
        assert_eq!(ledger.winnings(&"a".into()), 120);
        assert_eq!(ledger.winnings(&"b".into()), 80);
    }

    #[test]
    fn test_bonus_uses_exchange_rate() {
        let mut ledger = PayoffLedger::new();
        ledger
            .apply_payoff(&exchange(0, Some(30), Some(Response::Accepted)), 100)
            .unwrap();
        let players = vec![Participant::new("a", 0), Participant::new("b", 1)];
        let bonus = ledger.compute_bonus(&players, 0.01, BonusPolicy::IncludePartial);
        assert_eq!(bonus[&ParticipantId::from("a")], 0.7);
        assert_eq!(bonus[&ParticipantId::from("b")], 0.3);
    }

    #[test]
    fn test_bonus_policy_for_disconnected() {
        let mut ledger = PayoffLedger::new();
        ledger
            .apply_payoff(&exchange(0, Some(50), Some(Response::Accepted)), 100)
            .unwrap();
        let mut players = vec![Participant::new("a", 0), Participant::new("b", 1)];
        players[1].status = ConnectionStatus::Disconnected;

        let partial = ledger.compute_bonus(&players, 1.0, BonusPolicy::IncludePartial);
        assert_eq!(partial[&ParticipantId::from("b")], 50.0);

        let zeroed = ledger.compute_bonus(&players, 1.0, BonusPolicy::ZeroDisconnected);
        assert_eq!(zeroed[&ParticipantId::from("b")], 0.0);
        assert_eq!(zeroed[&ParticipantId::from("a")], 50.0);
    }

    #[test]
    fn test_bonus_policy_from_str() {
        assert_eq!(
            "zero_disconnected".parse::<BonusPolicy>().unwrap(),
            BonusPolicy::ZeroDisconnected
        );
        assert!("half".parse::<BonusPolicy>().is_err());
    }
}
