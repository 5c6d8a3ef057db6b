//! # Constants and type definitions for varstar
//!
//! This module centralizes the **photometric constants**, **unit conversions**, and **common
//! type definitions** used throughout the `varstar` library.
//!
//! ## Overview
//!
//! - AB magnitude zero point for fluxes in nanojansky
//! - Default thresholds of the candidate filter
//! - Core type aliases used across the crate
//! - Container type for storing light curves per object

use std::collections::HashMap;

use ahash::RandomState;

use crate::observations::Observation;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// AB magnitude of a 1 nJy source: `m = -2.5·log10(f / 3631 Jy)`
pub const AB_ZERO_POINT_NJY: f64 = 31.4;

/// 2.5 / ln(10), converts a relative flux error into a magnitude error
pub const MAG_ERR_FACTOR: f64 = 1.085_736_204_758_129_6;

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-12;

// -------------------------------------------------------------------------------------------------
// Candidate filter defaults
// -------------------------------------------------------------------------------------------------

/// Lower bound of the relative flux scatter σ/F̄
pub const DEFAULT_LO_RATIO: f64 = 0.25;

/// Upper bound of the relative flux scatter σ/F̄
pub const DEFAULT_HI_RATIO: f64 = 1.25;

/// Brightest accepted mean magnitude (AB)
pub const DEFAULT_MIN_MAGNITUDE: f64 = 18.0;

/// Faintest accepted mean magnitude (AB)
pub const DEFAULT_MAX_MAGNITUDE: f64 = 23.0;

/// Minimum number of detections
pub const DEFAULT_MIN_COUNT: u32 = 30;

/// Minimum variability index (Stetson J)
pub const DEFAULT_MIN_VARIABILITY: f64 = 20.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Flux in nanojansky
pub type NanoJansky = f64;
/// Frequency in cycles per day
pub type CyclesPerDay = f64;
/// Catalog identifier of an astronomical source
pub type ObjectId = u64;

/// Light curves of many objects, keyed by [`ObjectId`].
///
/// Uses [`ahash`](https://docs.rs/ahash) for fast hashing.
pub type LightCurveSet = HashMap<ObjectId, Vec<Observation>, RandomState>;

/// Convert a flux in nanojansky into an AB magnitude.
///
/// Return
/// ----------
/// * `Some(magnitude)` for strictly positive finite fluxes, `None` otherwise.
#[inline]
pub fn njy_to_ab_mag(flux: NanoJansky) -> Option<f64> {
    if flux.is_finite() && flux > 0.0 {
        Some(-2.5 * flux.log10() + AB_ZERO_POINT_NJY)
    } else {
        None
    }
}

/// Convert an AB magnitude back into a flux in nanojansky.
#[inline]
pub fn ab_mag_to_njy(magnitude: f64) -> NanoJansky {
    10f64.powf((AB_ZERO_POINT_NJY - magnitude) / 2.5)
}
