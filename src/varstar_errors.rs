use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarStarError {
    #[error("Insufficient data: {needed} points required, {found} found")]
    InsufficientData { needed: usize, found: usize },

    #[error("Invalid period (must be finite and > 0): {0}")]
    InvalidPeriod(f64),

    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Catalog service error: {0}")]
    CatalogService(String),

    #[error("Invalid ADQL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl VarStarError {
    /// True for the recoverable analysis errors (as opposed to I/O or service failures).
    pub fn is_analysis_error(&self) -> bool {
        matches!(
            self,
            VarStarError::InsufficientData { .. }
                | VarStarError::InvalidPeriod(_)
                | VarStarError::DegenerateSeries(_)
        )
    }
}

impl PartialEq for VarStarError {
    fn eq(&self, other: &Self) -> bool {
        use VarStarError::*;
        match (self, other) {
            (
                InsufficientData {
                    needed: a,
                    found: b,
                },
                InsufficientData {
                    needed: c,
                    found: d,
                },
            ) => a == c && b == d,
            (InvalidPeriod(a), InvalidPeriod(b)) => a.to_bits() == b.to_bits(),
            (DegenerateSeries(a), DegenerateSeries(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (CatalogService(a), CatalogService(b)) => a == b,
            (InvalidIdentifier(a), InvalidIdentifier(b)) => a == b,

            // Not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
