//! A single game room
//!
//! Collects participants until the pool is full, then runs `REPEAT` rounds
//! through the matcher under the treatment picked for this room. Waiting
//! participants are released after `MAX_WAIT_TIME`; a session short of
//! `MIN_PLAYERS` gets the treatment's `WAIT_TIME` to recover before it
//! ends. Every inbound [`Event`] is handled to completion
//! before the next one, so the round state only ever sees serialized
//! mutations. The room never touches a clock or a socket: callers pass
//! `now_ms` in and carry the returned [`Directive`]s out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ultimatum_logic::{
    assign_round, await_offer, resolve, Action, ConnectionStatus, Exchange, GameSettings,
    MatchError, PairingCycle, Participant, ParticipantId, PayoffLedger, RecordResult, RoundState,
    SeededRng, Treatment,
};

use crate::error::RoomError;
use crate::events::{Directive, Event};
use crate::sink::RecordSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Wait room: collecting joins until `POOL_SIZE`.
    Waiting,
    Playing { round: u32 },
    /// Bonus computed; only reconnects are still answered.
    Finished,
}

pub struct GameRoom<S: RecordSink> {
    session: String,
    settings: GameSettings,
    treatment_name: String,
    treatment: Treatment,
    participants: Vec<Participant>,
    joins: u32,
    /// Join time of everyone still in the wait room
    waiting_since: BTreeMap<ParticipantId, u64>,
    /// Set while connected players are below `MIN_PLAYERS`
    short_since: Option<u64>,
    phase: Phase,
    cycle: PairingCycle,
    rounds: RoundState,
    ledger: PayoffLedger,
    bonuses: BTreeMap<ParticipantId, f64>,
    sink: S,
}

impl<S: RecordSink> GameRoom<S> {
    /// First room dispatched under `settings`
    pub fn new(
        session: impl Into<String>,
        settings: GameSettings,
        sink: S,
    ) -> Result<Self, RoomError> {
        Self::numbered(session, settings, 0, sink)
    }

    /// The `room_number`-th room; picks the treatment per `CHOSEN_TREATMENT`
    pub fn numbered(
        session: impl Into<String>,
        settings: GameSettings,
        room_number: u32,
        sink: S,
    ) -> Result<Self, RoomError> {
        settings.validate()?;
        let (name, treatment) = settings.choose_treatment(room_number)?;
        let (treatment_name, treatment) = (name.to_string(), treatment.clone());

        let session = session.into();
        tracing::info!(session = %session, room_number, treatment = %treatment_name, "room opened");
        Ok(Self {
            session,
            rounds: RoundState::new(settings.coins),
            settings,
            treatment_name,
            treatment,
            participants: Vec::new(),
            joins: 0,
            waiting_since: BTreeMap::new(),
            short_since: None,
            phase: Phase::Waiting,
            cycle: PairingCycle::default(),
            ledger: PayoffLedger::new(),
            bonuses: BTreeMap::new(),
            sink,
        })
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn treatment(&self) -> (&str, &Treatment) {
        (&self.treatment_name, &self.treatment)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn rounds(&self) -> &RoundState {
        &self.rounds
    }

    pub fn ledger(&self) -> &PayoffLedger {
        &self.ledger
    }

    /// Final bonuses; empty until the session finishes
    pub fn bonuses(&self) -> &BTreeMap<ParticipantId, f64> {
        &self.bonuses
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process one inbound event and return what must be sent or armed
    pub fn handle(&mut self, event: Event, now_ms: u64) -> Vec<Directive> {
        match event {
            Event::Connected { id } => self.on_connected(id, now_ms),
            Event::Disconnected { id } => self.on_disconnected(id, now_ms),
            Event::Action {
                from,
                round,
                action,
            } => self.on_action(from, round, action, now_ms),
            Event::TimerFired { round } => self.on_timer(round, now_ms),
            Event::WaitTimerFired { participant } => self.on_wait_timer(participant, now_ms),
            Event::GraceTimerFired => self.on_grace_timer(now_ms),
        }
    }

    fn on_connected(&mut self, id: ParticipantId, now_ms: u64) -> Vec<Directive> {
        if let Some(p) = self.participants.iter_mut().find(|p| p.id == id) {
            if p.is_connected() {
                tracing::debug!(participant = %id, "already connected");
                return Vec::new();
            }
            p.status = ConnectionStatus::Connected;
            tracing::info!(participant = %id, phase = ?self.phase, "participant reconnected");

            return match self.phase {
                Phase::Playing { round } => {
                    self.recover_if_enough(round);
                    self.resume(id, round)
                }
                Phase::Finished => self.bonus_for(&id).into_iter().collect(),
                Phase::Waiting => Vec::new(),
            };
        }

        if self.phase != Phase::Waiting {
            tracing::info!(participant = %id, phase = ?self.phase, "late join refused");
            return vec![Directive::Refused {
                to: id,
                reason: "session already started".to_string(),
            }];
        }

        self.participants.push(Participant::new(id.clone(), self.joins));
        self.joins += 1;
        self.waiting_since.insert(id.clone(), now_ms);
        let mut out: Vec<Directive> = self
            .settings
            .max_wait_time
            .map(|after_ms| Directive::ScheduleWaitTimeout {
                participant: id.clone(),
                after_ms,
            })
            .into_iter()
            .collect();

        let waiting = self.connected_count();
        tracing::info!(
            participant = %id,
            waiting,
            pool_size = self.settings.pool_size,
            "participant joined"
        );
        if waiting >= self.settings.pool_size as usize {
            out.extend(self.start(now_ms));
        }
        out
    }

    fn on_disconnected(&mut self, id: ParticipantId, now_ms: u64) -> Vec<Directive> {
        let Some(index) = self.participants.iter().position(|p| p.id == id) else {
            tracing::debug!(participant = %id, "disconnect from unknown participant");
            return Vec::new();
        };

        match self.phase {
            Phase::Waiting => {
                self.participants.remove(index);
                self.waiting_since.remove(&id);
                tracing::info!(participant = %id, "participant left the wait room");
                Vec::new()
            }
            Phase::Playing { round } => {
                self.participants[index].status = ConnectionStatus::Disconnected;
                let connected = self.connected_count();
                tracing::info!(participant = %id, round, connected, "participant disconnected");
                if connected < self.settings.min_players as usize {
                    self.short_of_players(round, now_ms)
                } else {
                    Vec::new()
                }
            }
            Phase::Finished => {
                self.participants[index].status = ConnectionStatus::Disconnected;
                Vec::new()
            }
        }
    }

    fn on_action(
        &mut self,
        from: ParticipantId,
        round: u32,
        action: Action,
        now_ms: u64,
    ) -> Vec<Directive> {
        if self.phase == Phase::Waiting {
            tracing::debug!(participant = %from, "action before the session started");
            return vec![rejected(from, "no round in progress")];
        }

        match self.rounds.record_action(round, &from, action) {
            Ok(RecordResult::AwaitingResponse {
                exchange,
                bidder,
                responder,
                offer,
            }) => {
                tracing::debug!(participant = %bidder, %exchange, offer, "offer recorded");
                if !self.is_connected(&responder) {
                    // Restored through resolve() when they come back
                    tracing::debug!(participant = %responder, "offer held for disconnected responder");
                    return Vec::new();
                }
                vec![Directive::DeliverOffer {
                    to: responder,
                    from: bidder,
                    round,
                    offer,
                }]
            }
            Ok(RecordResult::RoundClosedForPair(exchange)) => {
                let mut out = self.settle(&exchange);
                let complete = self.rounds.round(round).is_some_and(|r| r.is_complete());
                if complete && self.phase == (Phase::Playing { round }) {
                    out.extend(self.end_round(round, now_ms));
                }
                out
            }
            Err(err @ MatchError::RoundClosed { .. }) => {
                tracing::debug!(participant = %from, round, "late action dropped");
                vec![rejected(from, err)]
            }
            Err(err) => {
                tracing::warn!(participant = %from, round, error = %err, "action refused");
                vec![rejected(from, err)]
            }
        }
    }

    fn on_timer(&mut self, round: u32, now_ms: u64) -> Vec<Directive> {
        match self.phase {
            Phase::Playing { round: current } if current == round => {
                tracing::info!(round, "round timer fired");
                self.end_round(round, now_ms)
            }
            _ => {
                tracing::debug!(round, phase = ?self.phase, "stale timer ignored");
                Vec::new()
            }
        }
    }

    fn on_wait_timer(&mut self, participant: ParticipantId, now_ms: u64) -> Vec<Directive> {
        let (Phase::Waiting, Some(max_wait)) = (self.phase, self.settings.max_wait_time) else {
            tracing::debug!(participant = %participant, phase = ?self.phase, "stale wait timer ignored");
            return Vec::new();
        };
        // A rejoin restarts the clock; the earlier timer is then stale
        let expired = self
            .waiting_since
            .get(&participant)
            .is_some_and(|since| now_ms.saturating_sub(*since) >= max_wait);
        if !expired {
            tracing::debug!(participant = %participant, "stale wait timer ignored");
            return Vec::new();
        }

        self.waiting_since.remove(&participant);
        self.participants.retain(|p| p.id != participant);
        tracing::info!(participant = %participant, max_wait, "participant waited too long");
        vec![Directive::Refused {
            to: participant,
            reason: "waited too long".to_string(),
        }]
    }

    /// Connected players fell below `MIN_PLAYERS`: end now, or give the
    /// treatment's `WAIT_TIME` for someone to come back
    fn short_of_players(&mut self, round: u32, now_ms: u64) -> Vec<Directive> {
        let grace_ms = u64::from(self.treatment.wait_time) * 1_000;
        if grace_ms == 0 {
            return self.not_enough_players(round, now_ms);
        }
        if self.short_since.is_some() {
            return Vec::new();
        }
        self.short_since = Some(now_ms);
        tracing::warn!(
            round,
            min_players = self.settings.min_players,
            grace_ms,
            "too few players, waiting for reconnects"
        );
        vec![Directive::ScheduleGraceTimeout {
            round,
            after_ms: grace_ms,
        }]
    }

    fn recover_if_enough(&mut self, round: u32) {
        if self.short_since.is_some()
            && self.connected_count() >= self.settings.min_players as usize
        {
            self.short_since = None;
            tracing::info!(round, "enough players again");
        }
    }

    fn on_grace_timer(&mut self, now_ms: u64) -> Vec<Directive> {
        let (Phase::Playing { round }, Some(since)) = (self.phase, self.short_since) else {
            tracing::debug!(phase = ?self.phase, "stale grace timer ignored");
            return Vec::new();
        };
        let grace_ms = u64::from(self.treatment.wait_time) * 1_000;
        if now_ms.saturating_sub(since) < grace_ms {
            tracing::debug!(round, "grace timer fired early, ignored");
            return Vec::new();
        }
        self.short_since = None;
        self.not_enough_players(round, now_ms)
    }

    fn start(&mut self, now_ms: u64) -> Vec<Directive> {
        self.waiting_since.clear();
        self.cycle = PairingCycle::new(&self.participants);
        tracing::info!(
            session = %self.session,
            roster = self.cycle.roster().len(),
            policy = %self.settings.policy,
            "session started"
        );
        self.begin_round(now_ms)
    }

    fn begin_round(&mut self, now_ms: u64) -> Vec<Directive> {
        let connected = self.connected_count();
        if connected < self.settings.min_players as usize {
            tracing::warn!(
                connected,
                min_players = self.settings.min_players,
                "not enough players for another round"
            );
            return self.finish(now_ms);
        }

        let assignment = match assign_round(&self.participants, &mut self.cycle, self.settings.policy)
        {
            Ok(assignment) => assignment,
            Err(err) => {
                tracing::warn!(error = %err, "round could not be assigned");
                return self.finish(now_ms);
            }
        };
        if let Err(err) = self.rounds.open_round(&assignment) {
            tracing::error!(round = assignment.round, error = %err, "round could not be opened");
            return self.finish(now_ms);
        }
        assignment.apply_to(&mut self.participants);

        let round = assignment.round;
        self.phase = Phase::Playing { round };
        tracing::info!(round, pairs = assignment.pairs.len(), "round started");

        let mut out: Vec<Directive> = assignment
            .seats
            .iter()
            .map(|(id, seat)| Directive::Assign {
                to: id.clone(),
                round,
                role: seat.role,
                partner: seat.partner.clone(),
            })
            .collect();
        out.push(Directive::ScheduleTimeout {
            round,
            after_ms: self.settings.round_timeout().as_millis() as u64,
        });
        out
    }

    /// Close `round`, then start the next one or finish
    fn end_round(&mut self, round: u32, now_ms: u64) -> Vec<Directive> {
        let mut out = self.close_round(round, now_ms);
        if round < self.settings.repeat {
            out.extend(self.begin_round(now_ms));
        } else {
            out.extend(self.finish(now_ms));
        }
        out
    }

    fn close_round(&mut self, round: u32, now_ms: u64) -> Vec<Directive> {
        let rng = SeededRng::new(self.settings.seed, round);
        let closed = match self
            .rounds
            .close_round(round, self.settings.timeout_response, &rng)
        {
            Ok(closed) => closed,
            Err(err) => {
                tracing::warn!(round, error = %err, "round not closed");
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for exchange in &closed {
            out.extend(self.settle(exchange));
        }
        self.persist(round, now_ms);
        out
    }

    fn not_enough_players(&mut self, round: u32, now_ms: u64) -> Vec<Directive> {
        tracing::warn!(
            round,
            min_players = self.settings.min_players,
            "not enough players, ending session"
        );
        let mut out = self.close_round(round, now_ms);
        out.extend(self.finish(now_ms));
        out
    }

    /// Credit a closed exchange and tell the pair how it ended
    fn settle(&mut self, exchange: &Exchange) -> Vec<Directive> {
        debug_assert!(
            !self.ledger.is_applied(exchange.id),
            "exchange {} credited twice",
            exchange.id
        );
        let payoff = match self.ledger.apply_payoff(exchange, self.settings.coins) {
            Ok(payoff) => payoff,
            Err(err) => {
                tracing::error!(exchange = %exchange.id, error = %err, "payoff not applied");
                return Vec::new();
            }
        };
        tracing::debug!(
            exchange = %exchange.id,
            bidder = payoff.bidder,
            responder = payoff.responder,
            timed_out = exchange.timed_out,
            "payoff applied"
        );

        let Some(response) = exchange.response else {
            return Vec::new();
        };
        let deliver = |to: &ParticipantId, gain: u32| Directive::DeliverResponse {
            to: to.clone(),
            exchange: exchange.id,
            offer: exchange.offer,
            response,
            timed_out: exchange.timed_out,
            gain,
        };

        vec![
            deliver(&exchange.bidder, payoff.bidder),
            deliver(&exchange.responder, payoff.responder),
        ]
    }

    fn persist(&mut self, round: u32, now_ms: u64) {
        let records = match self.rounds.records(round, &self.session, now_ms) {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(round, error = %err, "records unavailable");
                return;
            }
        };
        for record in &records {
            if let Err(err) = self.sink.append(record) {
                tracing::error!(
                    round,
                    participant = %record.participant,
                    error = %err,
                    "failed to persist record"
                );
            }
        }
    }

    fn resume(&mut self, id: ParticipantId, round: u32) -> Vec<Directive> {
        match resolve(&self.rounds, &id, round) {
            Ok(context) => {
                tracing::debug!(
                    participant = %id,
                    round = context.round,
                    view = ?context.view,
                    "participant resumed"
                );
                vec![Directive::Resume { to: id, context }]
            }
            Err(MatchError::OfferUnavailable { round, .. }) => {
                tracing::warn!(participant = %id, round, "offer unavailable on reconnect");
                let partner = self
                    .rounds
                    .round(round)
                    .and_then(|r| r.seat(&id))
                    .and_then(|seat| seat.partner.clone());
                vec![Directive::Resume {
                    to: id,
                    context: await_offer(round, partner),
                }]
            }
            Err(err) => {
                tracing::debug!(participant = %id, round, error = %err, "nothing to resume");
                Vec::new()
            }
        }
    }

    fn finish(&mut self, now_ms: u64) -> Vec<Directive> {
        self.short_since = None;
        self.bonuses = self.ledger.compute_bonus(
            &self.participants,
            self.settings.exchange_rate,
            self.settings.bonus_policy,
        );
        self.phase = Phase::Finished;
        tracing::info!(
            session = %self.session,
            rounds = self.rounds.current().map_or(0, |r| r.number),
            finished_at_ms = now_ms,
            "session finished"
        );

        let mut out: Vec<Directive> = self
            .participants
            .iter()
            .filter(|p| p.is_connected())
            .filter_map(|p| self.bonus_for(&p.id))
            .collect();
        out.push(Directive::GameOver {
            bonuses: self.bonuses.clone(),
        });
        out
    }

    fn bonus_for(&self, id: &ParticipantId) -> Option<Directive> {
        let amount = self.bonuses.get(id).copied()?;
        Some(Directive::Bonus {
            to: id.clone(),
            coins: self.ledger.winnings(id),
            amount,
        })
    }

    fn connected_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_connected()).count()
    }

    fn is_connected(&self, id: &ParticipantId) -> bool {
        self.participant(id).is_some_and(|p| p.is_connected())
    }
}

fn rejected(to: ParticipantId, reason: impl ToString) -> Directive {
    Directive::ActionRejected {
        to,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use ultimatum_logic::{Response, ResumeView, Role};

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::from(id)
    }

    fn room(pool_size: u32) -> GameRoom<MemorySink> {
        let settings = GameSettings {
            pool_size,
            ..GameSettings::default()
        };
        GameRoom::new("test", settings, MemorySink::default()).unwrap()
    }

    fn connect(room: &mut GameRoom<MemorySink>, id: &str) -> Vec<Directive> {
        room.handle(Event::Connected { id: pid(id) }, 0)
    }

    fn act(room: &mut GameRoom<MemorySink>, id: &str, action: Action) -> Vec<Directive> {
        let round = match room.phase() {
            Phase::Playing { round } => round,
            _ => 0,
        };
        room.handle(Event::Action { from: pid(id), round, action }, 10)
    }

    #[test]
    fn test_waits_for_pool_then_starts() {
        let mut room = room(2);
        assert_eq!(
            connect(&mut room, "a"),
            vec![Directive::ScheduleWaitTimeout { participant: pid("a"), after_ms: 60_000 }]
        );
        assert_eq!(room.phase(), Phase::Waiting);

        let out = connect(&mut room, "b");
        assert_eq!(room.phase(), Phase::Playing { round: 1 });
        assert!(out.contains(&Directive::Assign {
            to: pid("a"),
            round: 1,
            role: Role::Bidder,
            partner: Some(pid("b")),
        }));
        assert!(out.contains(&Directive::ScheduleTimeout { round: 1, after_ms: 60_000 }));
    }

    #[test]
    fn test_late_join_refused() {
        let mut room = room(2);
        connect(&mut room, "a");
        connect(&mut room, "b");
        let out = connect(&mut room, "c");
        assert!(matches!(out.as_slice(), [Directive::Refused { .. }]));
        assert!(room.participant(&pid("c")).is_none());
    }

    #[test]
    fn test_wait_room_disconnect_frees_slot() {
        let mut room = room(2);
        connect(&mut room, "a");
        room.handle(Event::Disconnected { id: pid("a") }, 0);
        connect(&mut room, "b");
        assert_eq!(room.phase(), Phase::Waiting);
        connect(&mut room, "c");
        assert_eq!(room.phase(), Phase::Playing { round: 1 });
    }

    #[test]
    fn test_rejoin_restarts_the_wait_clock() {
        let mut room = room(3);
        room.handle(Event::Connected { id: pid("a") }, 0);
        room.handle(Event::Disconnected { id: pid("a") }, 1_000);
        room.handle(Event::Connected { id: pid("a") }, 30_000);

        // Timer from the first join fires; a has only waited 30s
        assert!(room.handle(Event::WaitTimerFired { participant: pid("a") }, 60_000).is_empty());
        assert!(room.participant(&pid("a")).is_some());

        let out = room.handle(Event::WaitTimerFired { participant: pid("a") }, 90_000);
        assert!(matches!(out.as_slice(), [Directive::Refused { to, .. }] if *to == pid("a")));
    }

    #[test]
    fn test_offer_is_delivered_to_responder() {
        let mut room = room(2);
        connect(&mut room, "a");
        connect(&mut room, "b");
        let out = act(&mut room, "a", Action::Offer(30));
        assert_eq!(
            out,
            vec![Directive::DeliverOffer { to: pid("b"), from: pid("a"), round: 1, offer: 30 }]
        );
    }

    #[test]
    fn test_out_of_sequence_action_is_rejected() {
        let mut room = room(2);
        connect(&mut room, "a");
        connect(&mut room, "b");
        let out = act(&mut room, "b", Action::Response(Response::Accepted));
        assert!(matches!(out.as_slice(), [Directive::ActionRejected { to, .. }] if *to == pid("b")));
        assert!(!room.rounds().round(1).unwrap().exchanges[0].is_closed());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut room = room(2);
        connect(&mut room, "a");
        connect(&mut room, "b");
        assert!(room.handle(Event::TimerFired { round: 7 }, 5).is_empty());
        assert_eq!(room.phase(), Phase::Playing { round: 1 });
    }

    #[test]
    fn test_responder_reconnect_without_offer_waits() {
        let mut room = room(2);
        room.settings.min_players = 1;
        connect(&mut room, "a");
        connect(&mut room, "b");
        room.handle(Event::Disconnected { id: pid("b") }, 1);
        let out = connect(&mut room, "b");
        assert_eq!(
            out,
            vec![Directive::Resume {
                to: pid("b"),
                context: await_offer(1, Some(pid("a"))),
            }]
        );
        let Directive::Resume { context, .. } = &out[0] else { unreachable!() };
        assert_eq!(context.view, ResumeView::AwaitOffer);
    }

    #[test]
    fn test_offer_held_while_responder_away() {
        let mut room = room(2);
        room.settings.min_players = 1;
        connect(&mut room, "a");
        connect(&mut room, "b");
        room.handle(Event::Disconnected { id: pid("b") }, 1);
        assert!(act(&mut room, "a", Action::Offer(12)).is_empty());

        let out = connect(&mut room, "b");
        let Some(Directive::Resume { context, .. }) = out.first() else {
            panic!("expected resume, got {:?}", out);
        };
        assert_eq!(context.view, ResumeView::ResponseEntry { offer: 12 });
    }
}
