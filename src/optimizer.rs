//! Box selection for a single product.
//!
//! Scans the catalog once and keeps the feasible box with the least empty
//! space. A box is feasible when every product axis fits its counterpart
//! (length to length, width to width, height to height) and the product does
//! not exceed the box's weight limit. Fragile products are padded on every
//! axis before any check.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::BoxCatalog;
use crate::model::{BoxSpec, OptimizationResult, ProductRequest};
use crate::types::{Dimensional, Dimensions, Weighted, round_to};

/// Padding in cm added to each axis of a fragile product.
pub const FRAGILITY_BUFFER_CM: f64 = 2.0;

/// No catalog entry satisfies the fit and weight constraints.
///
/// This is an expected outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("No suitable box found")]
pub struct NoFitError {
    /// Dimensions that were checked, including the fragility buffer.
    pub required: Dimensions,
    pub weight: f64,
}

/// Selects the tightest feasible box from a shared catalog.
#[derive(Clone, Debug)]
pub struct PackagingOptimizer {
    catalog: Arc<BoxCatalog>,
}

impl PackagingOptimizer {
    pub fn new(catalog: Arc<BoxCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &BoxCatalog {
        &self.catalog
    }

    /// Finds the box with the least empty space for the product.
    ///
    /// Preconditions (not re-checked here): dimensions > 0, weight >= 0.
    /// See `ProductRequest::new` for the validating constructor.
    ///
    /// Ties on empty space go to the box that appears first in the catalog.
    ///
    /// # Returns
    /// `Ok(OptimizationResult)` with the unpadded catalog dimensions of the
    /// chosen box, or `Err(NoFitError)` when no box is feasible.
    pub fn optimize(&self, product: &ProductRequest) -> Result<OptimizationResult, NoFitError> {
        self.select(product).map(|selection| selection.result)
    }

    /// Like `optimize`, but also hands back the chosen catalog entry.
    pub fn select(&self, product: &ProductRequest) -> Result<Selection<'_>, NoFitError> {
        let required = required_dimensions(product);
        let weight = product.weight();
        let product_volume = required.volume();

        let mut best: Option<(&BoxSpec, f64)> = None;
        for candidate in &*self.catalog {
            if !candidate.accepts(&required, weight) {
                continue;
            }
            let empty_space = candidate.volume() - product_volume;
            // Strict comparison keeps the earlier box on ties.
            if best.is_none_or(|(_, current)| empty_space < current) {
                best = Some((candidate, empty_space));
            }
        }

        let Some((chosen, empty_space)) = best else {
            tracing::debug!(?required, weight, "no box satisfies the constraints");
            return Err(NoFitError { required, weight });
        };

        let waste_percentage = empty_space / chosen.volume() * 100.0;
        let efficiency_score = 100.0 - waste_percentage;

        Ok(Selection {
            spec: chosen,
            result: OptimizationResult {
                selected_box: chosen.box_id.clone(),
                box_dimensions: chosen.dimensions().as_tuple(),
                empty_space_cm3: round_to(empty_space, 2),
                waste_percentage: round_to(waste_percentage, 2),
                efficiency_score: round_to(efficiency_score, 2),
            },
        })
    }
}

/// A chosen catalog entry together with the derived metrics.
#[derive(Clone, Debug)]
pub struct Selection<'a> {
    pub spec: &'a BoxSpec,
    pub result: OptimizationResult,
}

/// Product dimensions after applying the fragility buffer.
pub fn required_dimensions(product: &ProductRequest) -> Dimensions {
    let dims = product.dimensions();
    if product.fragile {
        dims.padded(FRAGILITY_BUFFER_CM)
    } else {
        dims
    }
}
