//! Transport-facing messages
//!
//! Inbound [`Event`]s come from the session layer; outbound [`Directive`]s
//! are what the host must send or arm in response. Both are plain serde
//! data so any transport can carry them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ultimatum_logic::{Action, ExchangeId, ParticipantId, ReconnectContext, Response, Role};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// First join or reconnect; the room tells them apart.
    Connected { id: ParticipantId },
    Disconnected { id: ParticipantId },
    /// `round` is the round the client was acting in; stale rounds are
    /// refused rather than applied to the current one.
    Action {
        from: ParticipantId,
        round: u32,
        action: Action,
    },
    /// A timer armed by [`Directive::ScheduleTimeout`] expired.
    TimerFired { round: u32 },
    /// A timer armed by [`Directive::ScheduleWaitTimeout`] expired.
    WaitTimerFired { participant: ParticipantId },
    /// A timer armed by [`Directive::ScheduleGraceTimeout`] expired.
    GraceTimerFired,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    Assign {
        to: ParticipantId,
        round: u32,
        role: Role,
        partner: Option<ParticipantId>,
    },
    /// Arm a round timer; feed back [`Event::TimerFired`] after `after_ms`.
    ScheduleTimeout { round: u32, after_ms: u64 },
    /// Arm `participant`'s wait-room limit; feed back
    /// [`Event::WaitTimerFired`].
    ScheduleWaitTimeout {
        participant: ParticipantId,
        after_ms: u64,
    },
    /// Too few players are connected; feed back [`Event::GraceTimerFired`]
    /// once the treatment's reconnect window is over.
    ScheduleGraceTimeout { round: u32, after_ms: u64 },
    DeliverOffer {
        to: ParticipantId,
        from: ParticipantId,
        round: u32,
        offer: u32,
    },
    DeliverResponse {
        to: ParticipantId,
        exchange: ExchangeId,
        offer: Option<u32>,
        response: Response,
        timed_out: bool,
        /// Coins this recipient earned from the exchange
        gain: u32,
    },
    ActionRejected { to: ParticipantId, reason: String },
    Resume {
        to: ParticipantId,
        context: ReconnectContext,
    },
    Bonus {
        to: ParticipantId,
        coins: u64,
        amount: f64,
    },
    GameOver { bonuses: BTreeMap<ParticipantId, f64> },
    Refused { to: ParticipantId, reason: String },
}

impl Directive {
    /// Recipient, for directives aimed at a single participant
    pub fn recipient(&self) -> Option<&ParticipantId> {
        match self {
            Directive::Assign { to, .. }
            | Directive::DeliverOffer { to, .. }
            | Directive::DeliverResponse { to, .. }
            | Directive::ActionRejected { to, .. }
            | Directive::Resume { to, .. }
            | Directive::Bonus { to, .. }
            | Directive::Refused { to, .. } => Some(to),
            Directive::ScheduleTimeout { .. }
            | Directive::ScheduleWaitTimeout { .. }
            | Directive::ScheduleGraceTimeout { .. }
            | Directive::GameOver { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event: Event =
            serde_json::from_str(r#"{"event":"action","from":"a","round":1,"action":{"offer":30}}"#).unwrap();
        assert_eq!(
            event,
            Event::Action {
                from: ParticipantId::from("a"),
                round: 1,
                action: Action::Offer(30),
            }
        );

        let event: Event = serde_json::from_str(r#"{"event":"timer_fired","round":2}"#).unwrap();
        assert_eq!(event, Event::TimerFired { round: 2 });

        let event: Event = serde_json::from_str(r#"{"event":"grace_timer_fired"}"#).unwrap();
        assert_eq!(event, Event::GraceTimerFired);
    }

    #[test]
    fn test_directive_tagging() {
        let json = serde_json::to_value(Directive::ScheduleTimeout { round: 1, after_ms: 60_000 })
            .unwrap();
        assert_eq!(json["directive"], "schedule_timeout");
        assert_eq!(json["after_ms"], 60_000);
    }

    #[test]
    fn test_recipient() {
        let to = ParticipantId::from("b");
        let d = Directive::DeliverOffer {
            to: to.clone(),
            from: ParticipantId::from("a"),
            round: 1,
            offer: 5,
        };
        assert_eq!(d.recipient(), Some(&to));
        assert_eq!(Directive::ScheduleTimeout { round: 1, after_ms: 1 }.recipient(), None);
    }
}
