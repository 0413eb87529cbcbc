//! Round-by-round role and partner assignment
//!
//! Pairs come from a circle-method round-robin schedule over the roster
//! fixed when the pool was finalized. The schedule is computed per step
//! (no full tournament table is stored), then reconciled with whoever is
//! actually connected this round: an odd participant sits out as Solo and
//! anyone whose scheduled partner is missing gets re-paired with the
//! least-met leftover.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MatchError};
use crate::participant::{Participant, ParticipantId, Role};

/// How pairs and roles evolve across repeated rounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// First round's pairs and roles, every round.
    Repeat,
    /// First round's pairs, roles swapped every other round.
    RepeatInvert,
    /// Schedule walked forward, then backward; roles fixed per pair.
    Mirror,
    /// As `Mirror`, roles swapped on the backward passes.
    MirrorInvert,
    /// Circle-method schedule; roles swapped each time the schedule wraps.
    #[default]
    RoundRobin,
}

impl RotationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RotationPolicy::Repeat => "repeat",
            RotationPolicy::RepeatInvert => "repeat_invert",
            RotationPolicy::Mirror => "mirror",
            RotationPolicy::MirrorInvert => "mirror_invert",
            RotationPolicy::RoundRobin => "round_robin",
        }
    }

    fn freezes_pairs(self) -> bool {
        matches!(self, RotationPolicy::Repeat | RotationPolicy::RepeatInvert)
    }
}

impl core::fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repeat" => Ok(RotationPolicy::Repeat),
            "repeat_invert" => Ok(RotationPolicy::RepeatInvert),
            "mirror" => Ok(RotationPolicy::Mirror),
            "mirror_invert" => Ok(RotationPolicy::MirrorInvert),
            "round_robin" => Ok(RotationPolicy::RoundRobin),
            other => Err(ConfigError::UnknownVariant {
                kind: "rotation policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Where one participant sits for a round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub role: Role,
    pub partner: Option<ParticipantId>,
}

/// How often a participant has held each role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub bidder: u32,
    pub responder: u32,
    pub solo: u32,
}

impl RoleCounts {
    /// Bidder turns minus responder turns
    fn lean(&self) -> i64 {
        self.bidder as i64 - self.responder as i64
    }
}

/// Output of [`assign_round`]: every seated participant's role and partner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub round: u32,
    pub seats: BTreeMap<ParticipantId, Seat>,
    /// (bidder, responder), in pairing order
    pub pairs: Vec<(ParticipantId, ParticipantId)>,
}

impl Assignment {
    pub fn seat(&self, id: &ParticipantId) -> Option<&Seat> {
        self.seats.get(id)
    }

    pub fn solo(&self) -> Option<&ParticipantId> {
        self.seats
            .iter()
            .find(|(_, seat)| seat.role == Role::Solo)
            .map(|(id, _)| id)
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Copy roles and partners onto the participant records. Anyone without
    /// a seat this round is cleared.
    pub fn apply_to(&self, participants: &mut [Participant]) {
        for p in participants.iter_mut() {
            match self.seats.get(&p.id) {
                Some(seat) => {
                    p.role = Some(seat.role);
                    p.partner = seat.partner.clone();
                }
                None => {
                    p.role = None;
                    p.partner = None;
                }
            }
        }
    }
}

/// Rotation and coverage history for one session's pool
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingCycle {
    roster: Vec<ParticipantId>,
    rounds_assigned: u32,
    roles: BTreeMap<ParticipantId, RoleCounts>,
    met: BTreeMap<ParticipantId, BTreeMap<ParticipantId, u32>>,
    frozen: Vec<(ParticipantId, ParticipantId)>,
}

impl PairingCycle {
    /// Start a cycle for a finalized pool. Roster order is join order.
    pub fn new(pool: &[Participant]) -> Self {
        let mut sorted: Vec<&Participant> = pool.iter().collect();
        sorted.sort_by_key(|p| p.joined);
        let mut roster: Vec<ParticipantId> = Vec::with_capacity(sorted.len());
        for p in sorted {
            if !roster.contains(&p.id) {
                roster.push(p.id.clone());
            }
        }
        Self {
            roster,
            ..Self::default()
        }
    }

    pub fn roster(&self) -> &[ParticipantId] {
        &self.roster
    }

    pub fn rounds_assigned(&self) -> u32 {
        self.rounds_assigned
    }

    /// Sequence number the next assignment will carry
    pub fn next_round(&self) -> u32 {
        self.rounds_assigned + 1
    }

    pub fn role_counts(&self, id: &ParticipantId) -> RoleCounts {
        self.roles.get(id).copied().unwrap_or_default()
    }

    pub fn times_met(&self, a: &ParticipantId, b: &ParticipantId) -> u32 {
        self.met
            .get(a)
            .and_then(|partners| partners.get(b))
            .copied()
            .unwrap_or(0)
    }

    fn record(&mut self, assignment: &Assignment, policy: RotationPolicy) {
        for (bidder, responder) in &assignment.pairs {
            self.roles.entry(bidder.clone()).or_default().bidder += 1;
            self.roles.entry(responder.clone()).or_default().responder += 1;
            *self
                .met
                .entry(bidder.clone())
                .or_default()
                .entry(responder.clone())
                .or_insert(0) += 1;
            *self
                .met
                .entry(responder.clone())
                .or_default()
                .entry(bidder.clone())
                .or_insert(0) += 1;
        }
        if let Some(solo) = assignment.solo() {
            self.roles.entry(solo.clone()).or_default().solo += 1;
        }
        if policy.freezes_pairs() && self.frozen.is_empty() {
            self.frozen = assignment.pairs.clone();
        }
        self.rounds_assigned += 1;
    }
}

/// Compute roles and partners for the next round.
///
/// Only connected participants are seated. With an odd count the one with
/// the fewest Solo turns so far sits out (earliest join wins ties). The
/// cycle's counters are updated before returning.
pub fn assign_round(
    pool: &[Participant],
    cycle: &mut PairingCycle,
    policy: RotationPolicy,
) -> Result<Assignment, MatchError> {
    let round = cycle.next_round();

    let mut present: Vec<&Participant> = Vec::with_capacity(pool.len());
    let mut seen = BTreeSet::new();
    for p in pool {
        if !p.is_connected() {
            tracing::debug!(participant = %p.id, round, "skipping disconnected participant");
            continue;
        }
        if seen.insert(&p.id) {
            present.push(p);
        }
    }
    if present.is_empty() {
        return Err(MatchError::PoolEmptyAtAssignment { round });
    }
    present.sort_by_key(|p| p.joined);

    let mut seats = BTreeMap::new();
    let mut remaining: Vec<&ParticipantId> = present.iter().map(|p| &p.id).collect();

    if remaining.len() % 2 == 1 {
        // `present` is in join order, so min_by_key keeps the earliest on ties
        let solo = remaining
            .iter()
            .copied()
            .min_by_key(|id| cycle.role_counts(id).solo)
            .cloned();
        if let Some(solo) = solo {
            remaining.retain(|id| **id != solo);
            seats.insert(solo, Seat { role: Role::Solo, partner: None });
        }
    }

    let candidates = candidate_pairs(cycle, policy);
    let pairs = settle_pairs(cycle, &candidates, &remaining);

    for (bidder, responder) in &pairs {
        seats.insert(
            bidder.clone(),
            Seat { role: Role::Bidder, partner: Some(responder.clone()) },
        );
        seats.insert(
            responder.clone(),
            Seat { role: Role::Responder, partner: Some(bidder.clone()) },
        );
    }

    let assignment = Assignment { round, seats, pairs };
    cycle.record(&assignment, policy);

    tracing::debug!(
        round,
        %policy,
        pairs = assignment.pairs.len(),
        solo = ?assignment.solo(),
        "round assigned"
    );

    Ok(assignment)
}

// ──────────────────────────── Internal helpers ────────────────────────────

/// Circle size: roster padded to even length with a bye slot.
fn circle_size(n: u32) -> u32 {
    if n % 2 == 0 {
        n
    } else {
        n + 1
    }
}

/// Circle-method pairs for one schedule step, as (home, away) slots.
///
/// Slot `m - 1` stays fixed while the others rotate; with an odd roster it
/// is the bye, so step `s` benches slot `s`. Over `m - 1` consecutive steps
/// every slot meets every other slot exactly once, and each rotating slot
/// is home as often as away.
fn circle_pairs(n: u32, step: u32) -> Vec<(u32, u32)> {
    let m = circle_size(n);
    if m < 2 {
        return Vec::new();
    }
    let span = m - 1;
    let step = step % span;
    let fixed = m - 1;

    let mut pairs = Vec::with_capacity((m / 2) as usize);
    if step % 2 == 0 {
        pairs.push((step, fixed));
    } else {
        pairs.push((fixed, step));
    }
    for k in 1..m / 2 {
        let home = (step + k) % span;
        let away = (step + span - k) % span;
        pairs.push((home, away));
    }
    pairs
}

/// Which schedule step round `index` (0-based) uses, and whether roles flip.
fn schedule_step(policy: RotationPolicy, index: u32, span: u32) -> (u32, bool) {
    let span = span.max(1);
    let pass = index / span;
    let offset = index % span;
    match policy {
        RotationPolicy::Repeat => (0, false),
        RotationPolicy::RepeatInvert => (0, index % 2 == 1),
        RotationPolicy::RoundRobin => (offset, pass % 2 == 1),
        RotationPolicy::Mirror => {
            let step = if pass % 2 == 0 { offset } else { span - 1 - offset };
            (step, false)
        }
        RotationPolicy::MirrorInvert => {
            let step = if pass % 2 == 0 { offset } else { span - 1 - offset };
            (step, pass % 2 == 1)
        }
    }
}

/// Oriented (bidder, responder) pairs the policy would like this round.
fn candidate_pairs(
    cycle: &PairingCycle,
    policy: RotationPolicy,
) -> Vec<(ParticipantId, ParticipantId)> {
    let index = cycle.rounds_assigned;

    if policy.freezes_pairs() && !cycle.frozen.is_empty() {
        let (_, invert) = schedule_step(policy, index, 1);
        return cycle
            .frozen
            .iter()
            .map(|(b, r)| if invert { (r.clone(), b.clone()) } else { (b.clone(), r.clone()) })
            .collect();
    }

    let n = cycle.roster.len() as u32;
    let span = circle_size(n).saturating_sub(1);
    let (step, invert) = schedule_step(policy, index, span);

    circle_pairs(n, step)
        .into_iter()
        .filter(|&(home, away)| home < n && away < n)
        .map(|(home, away)| {
            let home = cycle.roster[home as usize].clone();
            let away = cycle.roster[away as usize].clone();
            if invert {
                (away, home)
            } else {
                (home, away)
            }
        })
        .collect()
}

/// Keep candidate pairs whose members are both seated; re-pair the rest.
fn settle_pairs(
    cycle: &PairingCycle,
    candidates: &[(ParticipantId, ParticipantId)],
    remaining: &[&ParticipantId],
) -> Vec<(ParticipantId, ParticipantId)> {
    let wanted: BTreeSet<&ParticipantId> = remaining.iter().copied().collect();
    let mut used: BTreeSet<&ParticipantId> = BTreeSet::new();
    let mut pairs = Vec::with_capacity(remaining.len() / 2);

    for (bidder, responder) in candidates {
        if wanted.contains(bidder)
            && wanted.contains(responder)
            && !used.contains(bidder)
            && !used.contains(responder)
        {
            used.insert(bidder);
            used.insert(responder);
            pairs.push((bidder.clone(), responder.clone()));
        }
    }

    let mut leftovers: VecDeque<&ParticipantId> = remaining
        .iter()
        .copied()
        .filter(|id| !used.contains(id))
        .collect();

    while let Some(first) = leftovers.pop_front() {
        let best = leftovers
            .iter()
            .enumerate()
            .min_by_key(|(i, other)| (cycle.times_met(first, other), *i))
            .map(|(i, _)| i);
        let Some(other) = best.and_then(|i| leftovers.remove(i)) else {
            // remaining is always even here
            tracing::error!(participant = %first, "unpaired leftover after solo selection");
            break;
        };
        pairs.push(orient(cycle, first, other));
    }

    pairs
}

/// The participant who has bid less often bids; `first` wins ties.
fn orient(
    cycle: &PairingCycle,
    first: &ParticipantId,
    second: &ParticipantId,
) -> (ParticipantId, ParticipantId) {
    if cycle.role_counts(second).lean() < cycle.role_counts(first).lean() {
        (second.clone(), first.clone())
    } else {
        (first.clone(), second.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ConnectionStatus;

    fn pool(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Participant::new(*id, i as u32))
            .collect()
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::from(id)
    }

    fn unordered(a: &ParticipantId, b: &ParticipantId) -> (ParticipantId, ParticipantId) {
        if a < b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }

    #[test]
    fn test_circle_covers_every_pair_once() {
        for n in (2..=12u32).step_by(2) {
            let mut seen = BTreeSet::new();
            for step in 0..n - 1 {
                let pairs = circle_pairs(n, step);
                assert_eq!(pairs.len(), (n / 2) as usize, "n={}, step={}", n, step);
                for (a, b) in pairs {
                    assert_ne!(a, b);
                    assert!(seen.insert((a.min(b), a.max(b))), "n={}: ({}, {}) repeated", n, a, b);
                }
            }
            assert_eq!(seen.len(), (n * (n - 1) / 2) as usize);
        }
    }

    #[test]
    fn test_circle_home_away_balanced() {
        let n = 8u32;
        let mut home = vec![0u32; n as usize];
        for step in 0..n - 1 {
            for (h, _) in circle_pairs(n, step) {
                home[h as usize] += 1;
            }
        }
        for (slot, count) in home.iter().enumerate() {
            assert!(
                (3..=4).contains(count),
                "slot {} was home {} times out of 7",
                slot,
                count
            );
        }
    }

    #[test]
    fn test_odd_circle_benches_in_roster_order() {
        let n = 5u32;
        for step in 0..n {
            let bye_partner = circle_pairs(n, step)
                .into_iter()
                .find(|&(a, b)| a == n || b == n)
                .map(|(a, b)| if a == n { b } else { a });
            assert_eq!(bye_partner, Some(step));
        }
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let mut cycle = PairingCycle::new(&[]);
        let err = assign_round(&[], &mut cycle, RotationPolicy::RoundRobin).unwrap_err();
        assert_eq!(err, MatchError::PoolEmptyAtAssignment { round: 1 });
        assert_eq!(cycle.rounds_assigned(), 0);
    }

    #[test]
    fn test_all_disconnected_is_an_error() {
        let mut players = pool(&["a", "b"]);
        let mut cycle = PairingCycle::new(&players);
        for p in players.iter_mut() {
            p.status = ConnectionStatus::Disconnected;
        }
        let err = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap_err();
        assert!(matches!(err, MatchError::PoolEmptyAtAssignment { .. }));
    }

    #[test]
    fn test_two_players() {
        let players = pool(&["a", "b"]);
        let mut cycle = PairingCycle::new(&players);
        let first = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();

        assert_eq!(first.round, 1);
        assert_eq!(first.pairs, vec![(pid("a"), pid("b"))]);
        assert_eq!(first.seat(&pid("a")).unwrap().role, Role::Bidder);
        assert_eq!(first.seat(&pid("b")).unwrap().partner, Some(pid("a")));

        // Schedule wraps after one step: roles swap on the second pass
        let second = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        assert_eq!(second.round, 2);
        assert_eq!(second.pairs, vec![(pid("b"), pid("a"))]);
    }

    #[test]
    fn test_round_robin_coverage_then_inverted_repeat() {
        let players = pool(&["a", "b", "c", "d"]);
        let mut cycle = PairingCycle::new(&players);

        let mut met = BTreeSet::new();
        let mut first_pass = Vec::new();
        for _ in 0..3 {
            let assignment = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
            assert_eq!(assignment.pairs.len(), 2);
            assert!(assignment.solo().is_none());
            for (b, r) in &assignment.pairs {
                assert!(met.insert(unordered(b, r)), "pair {:?} repeated early", (b, r));
            }
            first_pass.push(assignment.pairs.clone());
        }
        assert_eq!(met.len(), 6);

        let fourth = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        let expected: Vec<_> = first_pass[0]
            .iter()
            .map(|(b, r)| (r.clone(), b.clone()))
            .collect();
        assert_eq!(fourth.pairs, expected);
    }

    #[test]
    fn test_odd_pool_rotates_solo() {
        let players = pool(&["a", "b", "c"]);
        let mut cycle = PairingCycle::new(&players);

        let mut solos = Vec::new();
        for _ in 0..3 {
            let assignment = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
            let solo_count = assignment
                .seats
                .values()
                .filter(|seat| seat.role == Role::Solo)
                .count();
            assert_eq!(solo_count, 1);
            assert_eq!(assignment.pairs.len(), 1);
            solos.push(assignment.solo().cloned().unwrap());
        }
        assert_eq!(solos, vec![pid("a"), pid("b"), pid("c")]);
        for id in ["a", "b", "c"] {
            assert_eq!(cycle.role_counts(&pid(id)).solo, 1);
        }
    }

    #[test]
    fn test_solo_prefers_fewest_prior_solos() {
        let mut players = pool(&["a", "b", "c", "d"]);
        let mut cycle = PairingCycle::new(&players);

        // d drops out: three left, a sits out first
        players[3].status = ConnectionStatus::Disconnected;
        let r1 = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        assert_eq!(r1.solo(), Some(&pid("a")));

        // a has one solo now, b is the earliest with none
        let r2 = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        assert_eq!(r2.solo(), Some(&pid("b")));
        assert!(r2.seat(&pid("d")).is_none());
    }

    #[test]
    fn test_missing_partner_is_repaired() {
        let mut players = pool(&["a", "b", "c", "d", "e", "f"]);
        let mut cycle = PairingCycle::new(&players);
        players[5].status = ConnectionStatus::Disconnected;
        players[4].status = ConnectionStatus::Disconnected;

        let assignment = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        assert_eq!(assignment.pairs.len(), 2);
        assert_eq!(assignment.seats.len(), 4);
        for id in ["a", "b", "c", "d"] {
            let seat = assignment.seat(&pid(id)).unwrap();
            assert_ne!(seat.role, Role::Solo);
            let partner = seat.partner.clone().unwrap();
            assert_eq!(assignment.seat(&partner).unwrap().partner, Some(pid(id)));
        }
    }

    #[test]
    fn test_repeat_keeps_pairs_and_roles() {
        let players = pool(&["a", "b", "c", "d"]);
        let mut cycle = PairingCycle::new(&players);
        let first = assign_round(&players, &mut cycle, RotationPolicy::Repeat).unwrap();
        for _ in 0..4 {
            let next = assign_round(&players, &mut cycle, RotationPolicy::Repeat).unwrap();
            assert_eq!(next.pairs, first.pairs);
        }
    }

    #[test]
    fn test_repeat_invert_swaps_roles() {
        let players = pool(&["a", "b", "c", "d"]);
        let mut cycle = PairingCycle::new(&players);
        let first = assign_round(&players, &mut cycle, RotationPolicy::RepeatInvert).unwrap();
        let second = assign_round(&players, &mut cycle, RotationPolicy::RepeatInvert).unwrap();
        let third = assign_round(&players, &mut cycle, RotationPolicy::RepeatInvert).unwrap();

        let swapped: Vec<_> = first.pairs.iter().map(|(b, r)| (r.clone(), b.clone())).collect();
        assert_eq!(second.pairs, swapped);
        assert_eq!(third.pairs, first.pairs);
    }

    #[test]
    fn test_mirror_walks_schedule_back() {
        let players = pool(&["a", "b", "c", "d"]);
        let mut cycle = PairingCycle::new(&players);
        let rounds: Vec<_> = (0..6)
            .map(|_| assign_round(&players, &mut cycle, RotationPolicy::Mirror).unwrap().pairs)
            .collect();

        // span 3: steps 0,1,2 then 2,1,0 with the same orientation
        assert_eq!(rounds[3], rounds[2]);
        assert_eq!(rounds[4], rounds[1]);
        assert_eq!(rounds[5], rounds[0]);
    }

    #[test]
    fn test_mirror_invert_flips_on_way_back() {
        let players = pool(&["a", "b", "c", "d"]);
        let mut cycle = PairingCycle::new(&players);
        let rounds: Vec<_> = (0..4)
            .map(|_| assign_round(&players, &mut cycle, RotationPolicy::MirrorInvert).unwrap().pairs)
            .collect();
        let flipped: Vec<_> = rounds[2].iter().map(|(b, r)| (r.clone(), b.clone())).collect();
        assert_eq!(rounds[3], flipped);
    }

    #[test]
    fn test_cycle_counters_updated() {
        let players = pool(&["a", "b"]);
        let mut cycle = PairingCycle::new(&players);
        assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();

        assert_eq!(cycle.rounds_assigned(), 2);
        assert_eq!(cycle.times_met(&pid("a"), &pid("b")), 2);
        assert_eq!(cycle.times_met(&pid("b"), &pid("a")), 2);
        let a = cycle.role_counts(&pid("a"));
        assert_eq!((a.bidder, a.responder, a.solo), (1, 1, 0));
    }

    #[test]
    fn test_apply_to_clears_unseated() {
        let mut players = pool(&["a", "b", "c"]);
        let mut cycle = PairingCycle::new(&players);
        players[2].role = Some(Role::Bidder);
        players[2].status = ConnectionStatus::Disconnected;

        let assignment = assign_round(&players, &mut cycle, RotationPolicy::RoundRobin).unwrap();
        assignment.apply_to(&mut players);
        assert_eq!(players[0].role, Some(Role::Bidder));
        assert_eq!(players[1].partner, Some(pid("a")));
        assert_eq!(players[2].role, None);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("repeat".parse::<RotationPolicy>().unwrap(), RotationPolicy::Repeat);
        assert_eq!("mirror_invert".parse::<RotationPolicy>().unwrap(), RotationPolicy::MirrorInvert);
        assert_eq!("round_robin".parse::<RotationPolicy>().unwrap(), RotationPolicy::RoundRobin);
        assert!("zigzag".parse::<RotationPolicy>().is_err());
        assert_eq!(RotationPolicy::default(), RotationPolicy::RoundRobin);
    }
}
