//! Data models for box selection.
//!
//! - `BoxSpec`: one row of the box catalog
//! - `ProductRequest`: the product to be shipped
//! - `OptimizationResult` / `SavingsResult`: per-call outputs
//! - `Recommendation`: both results combined for the caller

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Dimensions, Weighted, validation};

/// Validation error for box or product data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid cost: {0}")]
    InvalidCost(String),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Invalid emission factor: {0}")]
    InvalidFactor(String),
}

/// A box type available for shipping.
///
/// Field names match the catalog column headers.
///
/// # Fields
/// * `box_id` - Unique identifier of the box type
/// * `length_cm`, `width_cm`, `height_cm` - Interior dimensions
/// * `max_weight_kg` - Maximum load
/// * `cost_per_box` - Unit cost
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "box_id": "B1",
    "length_cm": 30.0,
    "width_cm": 20.0,
    "height_cm": 10.0,
    "max_weight_kg": 5.0,
    "cost_per_box": 10.0
}))]
pub struct BoxSpec {
    pub box_id: String,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub max_weight_kg: f64,
    pub cost_per_box: f64,
}

impl BoxSpec {
    /// Creates a new BoxSpec with validation.
    ///
    /// # Returns
    /// `Ok(BoxSpec)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(
        box_id: impl Into<String>,
        dims: (f64, f64, f64),
        max_weight_kg: f64,
        cost_per_box: f64,
    ) -> Result<Self, ValidationError> {
        let spec = Self {
            box_id: box_id.into(),
            length_cm: dims.0,
            width_cm: dims.1,
            height_cm: dims.2,
            max_weight_kg,
            cost_per_box,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the catalog invariants: non-empty id, every number positive and finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.box_id.trim().is_empty() {
            return Err(ValidationError::InvalidIdentifier(
                "box_id must not be empty".to_string(),
            ));
        }
        validation::validate_dimensions_3d(self.dimensions().as_tuple(), "Box")
            .map_err(ValidationError::InvalidDimension)?;
        validation::validate_positive(self.max_weight_kg, "Maximum weight")
            .map_err(ValidationError::InvalidWeight)?;
        validation::validate_positive(self.cost_per_box, "Cost per box")
            .map_err(ValidationError::InvalidCost)?;
        Ok(())
    }

    /// Checks whether a product of the given size and weight can go in this box.
    pub fn accepts(&self, dims: &Dimensions, weight: f64) -> bool {
        dims.fits_within(&self.dimensions()) && weight <= self.max_weight_kg
    }
}

impl Dimensional for BoxSpec {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length_cm, self.width_cm, self.height_cm)
    }
}

/// A product to be shipped.
///
/// The fields are public so callers that already validated their input can
/// build a request directly; `ProductRequest::new` checks the preconditions
/// of the optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "length": 25.0,
    "width": 15.0,
    "height": 8.0,
    "weight": 3.0,
    "fragile": false
}))]
pub struct ProductRequest {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub fragile: bool,
}

impl ProductRequest {
    /// Creates a new request with validation.
    ///
    /// Dimensions must be positive and finite. Weight must be finite and may
    /// be zero; negative weights are rejected.
    ///
    /// # Examples
    /// ```
    /// use packwise::model::ProductRequest;
    ///
    /// assert!(ProductRequest::new(25.0, 15.0, 8.0, 3.0, false).is_ok());
    /// assert!(ProductRequest::new(25.0, 15.0, 8.0, -1.0, false).is_err());
    /// ```
    pub fn new(
        length: f64,
        width: f64,
        height: f64,
        weight: f64,
        fragile: bool,
    ) -> Result<Self, ValidationError> {
        let request = Self {
            length,
            width,
            height,
            weight,
            fragile,
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks the optimizer preconditions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_dimensions_3d(self.dimensions().as_tuple(), "Product")
            .map_err(ValidationError::InvalidDimension)?;
        validation::validate_non_negative(self.weight, "Weight")
            .map_err(ValidationError::InvalidWeight)?;
        Ok(())
    }
}

impl Dimensional for ProductRequest {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height)
    }
}

impl Weighted for ProductRequest {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Box chosen for a product, with how much of it stays empty.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct OptimizationResult {
    pub selected_box: String,
    /// Catalog dimensions of the selected box (length, width, height).
    #[schema(value_type = [f64; 3], example = json!([30.0, 20.0, 10.0]))]
    pub box_dimensions: (f64, f64, f64),
    pub empty_space_cm3: f64,
    pub waste_percentage: f64,
    pub efficiency_score: f64,
}

impl OptimizationResult {
    /// Volume of the selected box in cm³.
    pub fn box_volume(&self) -> f64 {
        Dimensions::from_tuple(self.box_dimensions).volume()
    }
}

/// Material, carbon and cost savings against an oversized default box.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SavingsResult {
    pub weight_saved_kg: f64,
    pub co2_saved_kg: f64,
    pub cost_saved: f64,
    pub sustainability_score: f64,
}

/// Box choice plus its savings estimate.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Recommendation {
    pub optimization: OptimizationResult,
    pub carbon_analysis: SavingsResult,
}
