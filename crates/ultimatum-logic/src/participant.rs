//! Participant identity, roles and connection status

use serde::{Deserialize, Serialize};

/// Opaque participant identifier handed out by the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Role played in one round
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Proposes a split of the coins.
    Bidder,
    /// Accepts or rejects the proposal.
    Responder,
    /// Left unpaired because the pool is odd.
    Solo,
}

impl Role {
    /// The role on the other side of an exchange. Solo has no counterpart.
    pub fn counterpart(self) -> Option<Role> {
        match self {
            Role::Bidder => Some(Role::Responder),
            Role::Responder => Some(Role::Bidder),
            Role::Solo => None,
        }
    }
}

/// Connection status, written only by the transport layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Disconnected,
}

/// A participant in a session.
///
/// `role` and `partner` reflect the latest round assignment. Winnings are
/// kept by [`PayoffLedger`](crate::PayoffLedger), never here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub role: Option<Role>,
    pub partner: Option<ParticipantId>,
    pub status: ConnectionStatus,
    /// Position in join order, used for deterministic tie-breaks.
    pub joined: u32,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, joined: u32) -> Self {
        Self {
            id: id.into(),
            role: None,
            partner: None,
            status: ConnectionStatus::Connected,
            joined,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterpart() {
        assert_eq!(Role::Bidder.counterpart(), Some(Role::Responder));
        assert_eq!(Role::Responder.counterpart(), Some(Role::Bidder));
        assert_eq!(Role::Solo.counterpart(), None);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ParticipantId::from("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let back: ParticipantId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_new_participant_is_connected_and_unassigned() {
        let p = Participant::new("a", 0);
        assert!(p.is_connected());
        assert_eq!(p.role, None);
        assert_eq!(p.partner, None);
    }
}
