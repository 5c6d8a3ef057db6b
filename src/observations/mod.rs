//! # Photometric observations
//!
//! The atomic input of the pipeline is an [`Observation`]: one photometric measurement of one
//! source, taken through one [`Band`] at one epoch. Observations come out of the catalog
//! collaborator already materialized and are never mutated afterwards.
//!
//! ## Units & Conventions
//! -----------------
//! - **Time:** Modified Julian Date in days, **TAI** scale (exposure midpoint).
//! - **Flux:** nanojansky (nJy), as delivered by forced photometry.
//! - **Magnitude:** AB. When only a flux is known, the magnitude is derived with
//!   [`njy_to_ab_mag`]; non-positive fluxes have no magnitude.
//!
//! ## See also
//! ------------
//! * [`band_series`] – Partition of one object's observations into per-band series.
//! * [`crate::catalog`] – Where observations come from.
pub mod band_series;

use std::{fmt, str::FromStr};

use hifitime::{Epoch, TimeScale};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{njy_to_ab_mag, NanoJansky, ObjectId, MAG_ERR_FACTOR, MJD},
    varstar_errors::VarStarError,
};

/// Optical filter under which an observation was taken.
///
/// The six survey bands, ordered from blue to red. The derived `Ord` follows this order, so
/// any `BTreeMap<Band, _>` iterates as `u, g, r, i, z, y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    U,
    G,
    R,
    I,
    Z,
    Y,
}

impl Band {
    /// All bands in canonical (wavelength) order.
    pub const ALL: [Band; 6] = [Band::U, Band::G, Band::R, Band::I, Band::Z, Band::Y];

    /// Single-letter label used by the catalogs.
    pub fn label(&self) -> &'static str {
        match self {
            Band::U => "u",
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
            Band::Z => "z",
            Band::Y => "y",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Band {
    type Err = VarStarError;

    /// Exact, case-insensitive match on the single-letter label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "u" | "U" => Ok(Band::U),
            "g" | "G" => Ok(Band::G),
            "r" | "R" => Ok(Band::R),
            "i" | "I" => Ok(Band::I),
            "z" | "Z" => Ok(Band::Z),
            "y" | "Y" => Ok(Band::Y),
            other => Err(VarStarError::InvalidParameter(format!(
                "unknown band label: {other:?}"
            ))),
        }
    }
}

/// A single photometric measurement.
///
/// # Fields
///
/// * `object_id` - Catalog identifier of the source
/// * `time` - Exposure midpoint, MJD (TAI)
/// * `band` - Filter of the exposure
/// * `flux` - Flux in nJy, if measured
/// * `flux_error` - 1-σ flux uncertainty in nJy, if measured
/// * `magnitude` - AB magnitude, if provided directly by the source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub object_id: ObjectId,
    pub time: MJD,
    pub band: Band,
    #[serde(default)]
    pub flux: Option<NanoJansky>,
    #[serde(default)]
    pub flux_error: Option<NanoJansky>,
    #[serde(default)]
    pub magnitude: Option<f64>,
}

impl Observation {
    /// Create an observation from a forced-photometry flux measurement.
    pub fn from_flux(
        object_id: ObjectId,
        time: MJD,
        band: Band,
        flux: NanoJansky,
        flux_error: NanoJansky,
    ) -> Self {
        Observation {
            object_id,
            time,
            band,
            flux: Some(flux),
            flux_error: Some(flux_error),
            magnitude: None,
        }
    }

    /// Create an observation from a magnitude.
    pub fn from_magnitude(object_id: ObjectId, time: MJD, band: Band, magnitude: f64) -> Self {
        Observation {
            object_id,
            time,
            band,
            flux: None,
            flux_error: None,
            magnitude: Some(magnitude),
        }
    }

    /// AB magnitude of the measurement.
    ///
    /// The explicit `magnitude` column wins; otherwise the magnitude is derived from the flux.
    ///
    /// Return
    /// ----------
    /// * `None` when neither a finite magnitude nor a strictly positive flux is available.
    pub fn ab_magnitude(&self) -> Option<f64> {
        match self.magnitude {
            Some(m) if m.is_finite() => Some(m),
            _ => self.flux.and_then(njy_to_ab_mag),
        }
    }

    /// 1-σ magnitude uncertainty propagated from the flux error (`1.0857·σF/F`).
    pub fn magnitude_error(&self) -> Option<f64> {
        let (flux, err) = (self.flux?, self.flux_error?);
        if flux > 0.0 && err.is_finite() && err > 0.0 {
            Some(MAG_ERR_FACTOR * err / flux)
        } else {
            None
        }
    }

    /// Observation time as a [`hifitime::Epoch`] in the TAI scale.
    pub fn epoch(&self) -> Epoch {
        Epoch::from_mjd_in_time_scale(self.time, TimeScale::TAI)
    }
}
