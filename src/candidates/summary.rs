//! Per-object summary statistics used to pre-select variable-star candidates.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{njy_to_ab_mag, Degree, NanoJansky, ObjectId, Radian},
    observations::{Band, Observation},
    varstar_errors::VarStarError,
};

/// One row of the object catalog, as seen by the candidate filter.
///
/// # Fields
///
/// * `object_id` - Catalog identifier
/// * `ra`, `dec` - Position in degrees (ICRS)
/// * `n_sources` - Number of detections `N`
/// * `flux_mean` - Mean PSF flux `F̄` in nJy
/// * `flux_sigma` - Flux scatter `σ` in nJy
/// * `variability` - Variability index `V` (Stetson J)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub object_id: ObjectId,
    pub ra: Degree,
    #[serde(alias = "decl")]
    pub dec: Degree,
    pub n_sources: u32,
    pub flux_mean: NanoJansky,
    pub flux_sigma: NanoJansky,
    pub variability: f64,
}

impl ObjectSummary {
    /// Summarize the fluxes of one band of an object.
    ///
    /// Arguments
    /// -----------------
    /// * `object_id`, `ra`, `dec`: Identity and position of the source.
    /// * `band`: Only observations taken through this band are used.
    /// * `observations`: Raw measurements; points without a finite flux are ignored.
    ///
    /// Return
    /// ----------
    /// * The summary with `N`, the mean flux, the sample standard deviation of the fluxes and
    ///   the Stetson J index. J is computed over the points that carry a positive flux error
    ///   and is `NaN` when fewer than two such points exist (such a summary never passes a
    ///   filter).
    ///
    /// Errors
    /// ----------
    /// * [`VarStarError::InsufficientData`] if fewer than two usable fluxes remain.
    pub fn from_observations(
        object_id: ObjectId,
        ra: Degree,
        dec: Degree,
        band: Band,
        observations: &[Observation],
    ) -> Result<Self, VarStarError> {
        let points: Vec<(f64, Option<f64>)> = observations
            .iter()
            .filter(|o| o.band == band)
            .filter_map(|o| {
                let flux = o.flux.filter(|f| f.is_finite())?;
                Some((flux, o.flux_error.filter(|e| e.is_finite() && *e > 0.0)))
            })
            .collect();

        let n = points.len();
        if n < 2 {
            return Err(VarStarError::InsufficientData {
                needed: 2,
                found: n,
            });
        }

        let mean = points.iter().map(|(f, _)| f).sum::<f64>() / n as f64;
        let var = points.iter().map(|(f, _)| (f - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

        let with_errors: Vec<(f64, f64)> = points
            .iter()
            .filter_map(|&(f, e)| e.map(|e| (f, e)))
            .collect();

        Ok(ObjectSummary {
            object_id,
            ra,
            dec,
            n_sources: n as u32,
            flux_mean: mean,
            flux_sigma: var.sqrt(),
            variability: stetson_j(&with_errors),
        })
    }

    /// AB magnitude of the mean flux, `None` for a non-positive mean.
    pub fn magnitude(&self) -> Option<f64> {
        njy_to_ab_mag(self.flux_mean)
    }

    /// Relative flux scatter `σ / F̄`.
    pub fn scatter_ratio(&self) -> f64 {
        self.flux_sigma / self.flux_mean
    }
}

/// Single-band Stetson J index of `(flux, flux_error)` pairs.
///
/// Each point is paired with itself: `δ = sqrt(n/(n-1))·(f − f̄)/σ`, `P = δ² − 1` and
/// `J = Σ sgn(P)·sqrt(|P|) / n`, where `f̄` is the inverse-variance weighted mean.
pub fn stetson_j(points: &[(NanoJansky, NanoJansky)]) -> f64 {
    let n = points.len();
    if n < 2 {
        return f64::NAN;
    }

    let (sw, swf) = points
        .iter()
        .fold((0.0, 0.0), |(sw, swf), &(f, e)| {
            let w = 1.0 / (e * e);
            (sw + w, swf + w * f)
        });
    let mean = swf / sw;
    let scale = (n as f64 / (n - 1) as f64).sqrt();

    points
        .iter()
        .map(|&(f, e)| {
            let delta = scale * (f - mean) / e;
            let p = delta * delta - 1.0;
            p.signum() * p.abs().sqrt()
        })
        .sum::<f64>()
        / n as f64
}

/// Unit vector pointing at `(ra, dec)` given in radians.
fn unit_vector(ra: Radian, dec: Radian) -> Vector3<f64> {
    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_ra, cos_ra) = ra.sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Great-circle distance between two sky positions, all in degrees.
///
/// Uses `atan2(|a×b|, a·b)`, accurate both for tiny and for near-antipodal separations.
pub fn angular_separation(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> Degree {
    let a = unit_vector(ra1.to_radians(), dec1.to_radians());
    let b = unit_vector(ra2.to_radians(), dec2.to_radians());
    a.cross(&b).norm().atan2(a.dot(&b)).to_degrees()
}

#[cfg(test)]
mod summary_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angular_separation() {
        assert_relative_eq!(angular_separation(10.0, 0.0, 20.0, 0.0), 10.0, epsilon = 1e-10);
        assert_relative_eq!(angular_separation(0.0, 90.0, 123.0, 90.0), 0.0, epsilon = 1e-10);
        assert_relative_eq!(angular_separation(0.0, 0.0, 180.0, 0.0), 180.0, epsilon = 1e-10);
        assert_relative_eq!(
            angular_separation(62.0, -37.0, 62.0, -37.0 + 1.0 / 3600.0),
            1.0 / 3600.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_from_observations() {
        let obs: Vec<Observation> = [100.0, 200.0, 300.0, 400.0]
            .iter()
            .enumerate()
            .map(|(i, &f)| Observation::from_flux(3, 60000.0 + i as f64, Band::G, f, 10.0))
            .chain(std::iter::once(Observation::from_flux(
                3,
                60010.0,
                Band::R,
                1e6,
                1.0,
            )))
            .collect();

        let s = ObjectSummary::from_observations(3, 62.0, -37.0, Band::G, &obs).unwrap();
        assert_eq!(s.n_sources, 4);
        assert_relative_eq!(s.flux_mean, 250.0);
        // sample std of 100..400 step 100
        assert_relative_eq!(s.flux_sigma, 129.099_444_873_580_57, epsilon = 1e-9);
        assert!(s.variability > 0.0);
        assert_relative_eq!(s.scatter_ratio(), s.flux_sigma / 250.0);

        let err = ObjectSummary::from_observations(3, 62.0, -37.0, Band::U, &obs).unwrap_err();
        assert_eq!(err, VarStarError::InsufficientData { needed: 2, found: 0 });
    }

    #[test]
    fn test_stetson_j_constant_source() {
        // noise-free constant source: every delta is 0, every P is -1
        let pts = vec![(50.0, 1.0); 10];
        assert_relative_eq!(stetson_j(&pts), -1.0, epsilon = 1e-12);
        assert!(stetson_j(&pts[..1]).is_nan());
    }
}
