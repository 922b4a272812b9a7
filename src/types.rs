//! Common types and traits for box and product geometry.
//!
//! Dimensions are always expressed as (length, width, height) in centimetres
//! and compared positionally: a product is never rotated to fit a box.

use std::ops::Add;

/// Represents the three interior or exterior extents of a cuboid.
///
/// # Examples
/// ```
/// use packwise::types::Dimensions;
///
/// let product = Dimensions::new(25.0, 15.0, 8.0);
/// let box_dims = Dimensions::new(30.0, 20.0, 10.0);
/// assert!(product.fits_within(&box_dims));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    /// Creates a new set of dimensions.
    ///
    /// # Parameters
    /// * `length` - Extent along the first axis
    /// * `width` - Extent along the second axis
    /// * `height` - Extent along the third axis
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.length, self.width, self.height)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Grows every axis by the same amount.
    #[inline]
    pub fn padded(&self, buffer: f64) -> Self {
        *self + Self::new(buffer, buffer, buffer)
    }

    /// Checks if these dimensions fit inside a container, axis by axis.
    ///
    /// Length is compared with length, width with width and height with
    /// height. No tolerance and no axis permutation is applied.
    #[inline]
    pub fn fits_within(&self, container: &Self) -> bool {
        self.length <= container.length
            && self.width <= container.width
            && self.height <= container.height
    }
}

impl Add for Dimensions {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.length + rhs.length,
            self.width + rhs.width,
            self.height + rhs.height,
        )
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Dimensions;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Rounds to a fixed number of decimal places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Validation functions shared by the catalog loader and the API boundary.
pub mod validation {

    /// Validates a strictly positive, finite quantity.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the quantity for error messages
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_positive(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a finite quantity that may be zero.
    pub fn validate_non_negative(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value < 0.0 {
            return Err(format!("{} must not be negative, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates all three dimensions of a cuboid.
    ///
    /// # Parameters
    /// * `dims` - The dimensions to validate (length, width, height)
    /// * `prefix` - Label prepended to each axis name, e.g. "Box"
    pub fn validate_dimensions_3d(dims: (f64, f64, f64), prefix: &str) -> Result<(), String> {
        validate_positive(dims.0, &format!("{} length", prefix))?;
        validate_positive(dims.1, &format!("{} width", prefix))?;
        validate_positive(dims.2, &format!("{} height", prefix))?;
        Ok(())
    }
}
