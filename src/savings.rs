//! Savings of a right-sized box against an oversized default box.
//!
//! The default box is assumed to be `DEFAULT_BOX_MULTIPLIER` times larger and
//! more expensive than the chosen one. Only cardboard is modelled.

use std::sync::Arc;

use crate::catalog::{MaterialFactors, MaterialNotFoundError};
use crate::model::SavingsResult;
use crate::types::round_to;

/// Cardboard mass per cm³ of box volume, in kg.
pub const CARDBOARD_DENSITY_KG_PER_CM3: f64 = 0.0007;

/// Size and cost ratio of the default box to the chosen box.
pub const DEFAULT_BOX_MULTIPLIER: f64 = 1.5;

/// Material whose CO2 factor drives the estimate.
pub const CARDBOARD: &str = "cardboard";

/// Upper bound of the sustainability score.
pub const MAX_SUSTAINABILITY_SCORE: f64 = 100.0;

/// Sustainability points per kg of CO2 saved.
const SCORE_PER_KG_CO2: f64 = 10.0;

/// Volume of the default box assumed for a chosen box of `optimized_volume`.
pub fn default_volume_for(optimized_volume: f64) -> f64 {
    optimized_volume * DEFAULT_BOX_MULTIPLIER
}

/// Turns box volumes and cost into material, CO2 and cost savings.
#[derive(Clone, Debug)]
pub struct SavingsEstimator {
    factors: Arc<MaterialFactors>,
}

impl SavingsEstimator {
    pub fn new(factors: Arc<MaterialFactors>) -> Self {
        Self { factors }
    }

    /// Whether the factor table can serve `calculate`.
    pub fn has_required_material(&self) -> bool {
        self.factors.contains(CARDBOARD)
    }

    /// Estimates the savings of shipping in the chosen box.
    ///
    /// # Parameters
    /// * `chosen_box_cost` - Unit cost of the chosen box
    /// * `default_volume` - Volume of the oversized default box (cm³)
    /// * `optimized_volume` - Volume of the chosen box (cm³)
    ///
    /// The score is capped at 100 but not floored: a default box smaller than
    /// the chosen one yields negative savings and a negative score.
    pub fn calculate(
        &self,
        chosen_box_cost: f64,
        default_volume: f64,
        optimized_volume: f64,
    ) -> Result<SavingsResult, MaterialNotFoundError> {
        let co2_factor = self.factors.co2_per_kg(CARDBOARD)?;

        let default_weight = default_volume * CARDBOARD_DENSITY_KG_PER_CM3;
        let optimized_weight = optimized_volume * CARDBOARD_DENSITY_KG_PER_CM3;
        let weight_saved = default_weight - optimized_weight;

        let co2_saved = weight_saved * co2_factor;

        let default_cost = chosen_box_cost * DEFAULT_BOX_MULTIPLIER;
        let cost_saved = default_cost - chosen_box_cost;

        let sustainability_score = (co2_saved * SCORE_PER_KG_CO2).min(MAX_SUSTAINABILITY_SCORE);

        Ok(SavingsResult {
            weight_saved_kg: round_to(weight_saved, 4),
            co2_saved_kg: round_to(co2_saved, 4),
            cost_saved: round_to(cost_saved, 2),
            sustainability_score: round_to(sustainability_score, 2),
        })
    }
}
