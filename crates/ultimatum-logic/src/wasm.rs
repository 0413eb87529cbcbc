//! WASM bindings for frontend previews

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{assign_round, payoff, Assignment, GameSettings, PairingCycle, Participant};
use crate::{Response, RotationPolicy};

/// Preview the pairings a pool would get over `rounds` rounds
///
/// # Arguments
/// * `ids` - Participant ids in join order
/// * `policy` - Rotation policy name (`round_robin`, `repeat`, ...)
/// * `rounds` - Number of rounds to simulate
///
/// # Returns
/// JSON serialized list of Assignment, one per round
#[wasm_bindgen]
pub fn preview_schedule(ids: js_sys::Array, policy: &str, rounds: u32) -> Result<JsValue, JsError> {
    let policy: RotationPolicy = policy
        .parse()
        .map_err(|e| JsError::new(&format!("Invalid policy: {}", e)))?;

    let pool: Vec<Participant> = ids
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .as_string()
                .map(|id| Participant::new(id, i as u32))
                .ok_or_else(|| JsError::new("Participant ids must be strings"))
        })
        .collect::<Result<_, _>>()?;

    let mut cycle = PairingCycle::new(&pool);
    let mut schedule: Vec<Assignment> = Vec::with_capacity(rounds as usize);
    for _ in 0..rounds {
        let assignment = assign_round(&pool, &mut cycle, policy)
            .map_err(|e| JsError::new(&e.to_string()))?;
        schedule.push(assignment);
    }

    serde_wasm_bindgen::to_value(&schedule)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct PayoffPreview {
    bidder: u32,
    responder: u32,
}

/// Coins each side would get for `offer` under `response` (`accepted`/`rejected`)
#[wasm_bindgen]
pub fn preview_payoff(offer: u32, response: &str, coins: u32) -> Result<JsValue, JsError> {
    let response = match response {
        "accepted" => Response::Accepted,
        "rejected" => Response::Rejected,
        other => return Err(JsError::new(&format!("Unknown response: {}", other))),
    };
    if offer > coins {
        return Err(JsError::new(&format!("Offer must be between 0 and {}", coins)));
    }
    let (bidder, responder) = payoff(Some(offer), response, coins);

    serde_wasm_bindgen::to_value(&PayoffPreview { bidder, responder })
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate a settings document
///
/// Returns `{valid: true}` or `{valid: false, error: "..."}`.
#[wasm_bindgen]
pub fn validate_settings(json: &str) -> JsValue {
    let result = match GameSettings::from_json(json) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}
