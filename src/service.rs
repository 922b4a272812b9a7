//! Composition of box selection and savings estimation.
//!
//! `PackagingService` is built once at startup from the loaded tables and
//! handed to whatever front end drives it.

use std::sync::Arc;

use crate::catalog::{BoxCatalog, MaterialFactors, MaterialNotFoundError};
use crate::model::{ProductRequest, Recommendation, SavingsResult};
use crate::optimizer::{NoFitError, PackagingOptimizer, Selection};
use crate::savings::{SavingsEstimator, default_volume_for};

/// Outcome of a recommendation request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Recommended(Recommendation),
    NoFit(NoFitError),
}

#[derive(Clone, Debug)]
pub struct PackagingService {
    optimizer: PackagingOptimizer,
    estimator: SavingsEstimator,
}

impl PackagingService {
    pub fn new(catalog: Arc<BoxCatalog>, factors: Arc<MaterialFactors>) -> Self {
        Self {
            optimizer: PackagingOptimizer::new(catalog),
            estimator: SavingsEstimator::new(factors),
        }
    }

    pub fn catalog(&self) -> &BoxCatalog {
        self.optimizer.catalog()
    }

    pub fn estimator(&self) -> &SavingsEstimator {
        &self.estimator
    }

    /// Picks a box and estimates its savings.
    ///
    /// The default box is taken as 1.5 times the chosen box's volume and the
    /// chosen box's catalog cost feeds the cost estimate. A product that fits
    /// no box yields `Outcome::NoFit`; only a missing material factor is an
    /// error.
    pub fn recommend(&self, product: &ProductRequest) -> Result<Outcome, MaterialNotFoundError> {
        let Selection { spec, result: optimization } = match self.optimizer.select(product) {
            Ok(selection) => selection,
            Err(no_fit) => return Ok(Outcome::NoFit(no_fit)),
        };

        let optimized_volume = optimization.box_volume();
        let carbon_analysis = self.estimator.calculate(
            spec.cost_per_box,
            default_volume_for(optimized_volume),
            optimized_volume,
        )?;

        Ok(Outcome::Recommended(Recommendation {
            optimization,
            carbon_analysis,
        }))
    }

    /// Savings for explicit volumes; the default volume falls back to 1.5x the optimized one.
    pub fn savings(
        &self,
        unit_cost: f64,
        default_volume: Option<f64>,
        optimized_volume: f64,
    ) -> Result<SavingsResult, MaterialNotFoundError> {
        let default_volume = default_volume.unwrap_or_else(|| default_volume_for(optimized_volume));
        self.estimator
            .calculate(unit_cost, default_volume, optimized_volume)
    }
}
