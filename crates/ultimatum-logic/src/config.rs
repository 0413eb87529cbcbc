//! Session settings
//!
//! Keys follow the experiment's settings file (`COINS`, `REPEAT`, ...).
//! Everything is immutable once a session starts.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ledger::BonusPolicy;
use crate::pairing::RotationPolicy;
use crate::round::TimeoutPolicy;

/// Per-step timers, in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTimers {
    pub bidder: u64,
    pub responder: u64,
}

impl Default for StepTimers {
    fn default() -> Self {
        Self {
            bidder: 30_000,
            responder: 30_000,
        }
    }
}

/// A named experimental treatment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Treatment {
    pub description: String,
    /// Seconds a disconnected participant may stay away
    #[serde(rename = "WAIT_TIME")]
    pub wait_time: u32,
    #[serde(rename = "instructionsPage")]
    pub instructions_page: String,
}

/// How a room picks its treatment
///
/// `"treatment_rotate"` cycles through the treatments (in name order) by
/// room number; any other string names a fixed treatment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChosenTreatment {
    #[default]
    Rotate,
    Named(String),
}

const ROTATE: &str = "treatment_rotate";

impl From<String> for ChosenTreatment {
    fn from(value: String) -> Self {
        if value == ROTATE {
            ChosenTreatment::Rotate
        } else {
            ChosenTreatment::Named(value)
        }
    }
}

impl From<ChosenTreatment> for String {
    fn from(value: ChosenTreatment) -> Self {
        match value {
            ChosenTreatment::Rotate => ROTATE.to_string(),
            ChosenTreatment::Named(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Minimum number of players that must stay connected
    #[serde(rename = "MIN_PLAYERS")]
    pub min_players: u32,
    /// Number of rounds of the bidding stage
    #[serde(rename = "REPEAT")]
    pub repeat: u32,
    /// Coins to split each round
    #[serde(rename = "COINS")]
    pub coins: u32,
    /// Coins to currency
    #[serde(rename = "EXCHANGE_RATE")]
    pub exchange_rate: f64,
    #[serde(rename = "TIMER")]
    pub timer: StepTimers,
    #[serde(rename = "POLICY")]
    pub policy: RotationPolicy,
    #[serde(rename = "TIMEOUT_RESPONSE")]
    pub timeout_response: TimeoutPolicy,
    #[serde(rename = "BONUS_POLICY")]
    pub bonus_policy: BonusPolicy,
    /// Participants the waiting room collects before the game starts
    #[serde(rename = "POOL_SIZE")]
    pub pool_size: u32,
    /// Longest a participant may sit in the wait room, in ms. `null`
    /// waits forever.
    #[serde(rename = "MAX_WAIT_TIME")]
    pub max_wait_time: Option<u64>,
    #[serde(rename = "CHOSEN_TREATMENT")]
    pub chosen_treatment: ChosenTreatment,
    #[serde(rename = "SEED")]
    pub seed: u64,
    pub treatments: BTreeMap<String, Treatment>,
}

impl Default for GameSettings {
    fn default() -> Self {
        let mut treatments = BTreeMap::new();
        treatments.insert(
            "standard".to_string(),
            Treatment {
                description: "More time to wait and no peer pressure.".to_string(),
                wait_time: 20,
                instructions_page: "instructions.html".to_string(),
            },
        );
        treatments.insert(
            "pp".to_string(),
            Treatment {
                description: "Introduces peer pressure to players to not disconnect.".to_string(),
                wait_time: 10,
                instructions_page: "instructions_pp.html".to_string(),
            },
        );

        Self {
            min_players: 2,
            repeat: 2,
            coins: 100,
            exchange_rate: 1.0 / 2000.0,
            timer: StepTimers::default(),
            policy: RotationPolicy::default(),
            timeout_response: TimeoutPolicy::default(),
            bonus_policy: BonusPolicy::default(),
            pool_size: 2,
            max_wait_time: Some(60_000),
            chosen_treatment: ChosenTreatment::default(),
            seed: 0,
            treatments,
        }
    }
}

impl GameSettings {
    /// Parse and validate a JSON settings document. Missing keys keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut settings: GameSettings = serde_json::from_str(json)?;
        settings
            .treatments
            .entry("standard".to_string())
            .or_insert_with(|| Treatment {
                description: "Default treatment".to_string(),
                wait_time: 20,
                instructions_page: "instructions.html".to_string(),
            });
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coins == 0 {
            return Err(out_of_range("COINS", "> 0", self.coins));
        }
        if self.repeat == 0 {
            return Err(out_of_range("REPEAT", ">= 1", self.repeat));
        }
        if self.min_players == 0 {
            return Err(out_of_range("MIN_PLAYERS", ">= 1", self.min_players));
        }
        if self.pool_size < self.min_players {
            return Err(out_of_range("POOL_SIZE", ">= MIN_PLAYERS", self.pool_size));
        }
        if !self.exchange_rate.is_finite() || self.exchange_rate <= 0.0 {
            return Err(out_of_range("EXCHANGE_RATE", "finite and > 0", self.exchange_rate));
        }
        if self.treatments.is_empty() {
            return Err(out_of_range("treatments", "at least one", 0));
        }
        if let ChosenTreatment::Named(name) = &self.chosen_treatment {
            self.treatment(name)?;
        }
        Ok(())
    }

    /// Time allowed for a whole round: bidding plus responding
    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.timer.bidder.saturating_add(self.timer.responder))
    }

    pub fn treatment(&self, name: &str) -> Result<&Treatment, ConfigError> {
        self.treatments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTreatment(name.to_string()))
    }

    /// Treatment for the `room_number`-th room dispatched from the wait room
    pub fn choose_treatment(&self, room_number: u32) -> Result<(&str, &Treatment), ConfigError> {
        let picked = match &self.chosen_treatment {
            ChosenTreatment::Named(name) => self.treatments.get_key_value(name.as_str()),
            ChosenTreatment::Rotate if self.treatments.is_empty() => None,
            ChosenTreatment::Rotate => {
                let index = room_number as usize % self.treatments.len();
                self.treatments.iter().nth(index)
            }
        };
        picked
            .map(|(name, treatment)| (name.as_str(), treatment))
            .ok_or_else(|| ConfigError::UnknownTreatment(String::from(self.chosen_treatment.clone())))
    }
}

fn out_of_range(field: &'static str, expected: &'static str, got: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        expected,
        got: got.to_string(),
    }
}
