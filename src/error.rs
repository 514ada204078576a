//! Error types.

use thiserror::Error;

/// Error returned when a secondary conditional sample cannot be drawn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// The primary value lies outside the primary grid and the grid limits
    /// have not been extended.
    #[error(
        "sampling beyond the primary grid boundaries cannot be done unless the grid has been extended ({value} not in [{lower},{upper}])"
    )]
    OutsidePrimaryGrid { value: f64, lower: f64, upper: f64 },
}

/// Error returned by the bin locators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The grid does not contain at least two points.
    #[error("the grid must contain at least two points to define a bin")]
    DegenerateGrid,
    /// The searched value is not within the grid bounds.
    #[error("the value {value} is not within the grid bounds [{lower},{upper}]")]
    OutOfBounds { value: f64, lower: f64, upper: f64 },
}

/// Error type for distribution construction failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    /// A bivariate distribution needs at least two primary grid points.
    #[error("at least two primary grid points are required (found {found})")]
    TooFewGridPoints { found: usize },
    /// Two parallel input sequences have different lengths.
    #[error("the number of {what} ({found}) does not match the number of primary grid points ({expected})")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The primary grid is not sorted in non-decreasing order.
    #[error("the primary grid is not sorted (decrease at index {index})")]
    UnsortedPrimaryGrid { index: usize },
    /// A secondary distribution does not support the secondary processing of
    /// the grid policy.
    #[error("the secondary distribution at index {index} is not compatible with {policy} interpolation")]
    IncompatibleSecondary { index: usize, policy: &'static str },
    /// The secondary processing of the policy is not usable with an angular
    /// cosine variable.
    #[error("the {policy} interpolation cannot be used with an angular cosine secondary variable")]
    UnsupportedSecondaryProcessing { policy: &'static str },
    /// The cutoff cosine is not within (-1, 1].
    #[error("the cutoff cosine should be in (-1, 1]")]
    BadCutoff,
    /// The tabulated data of a secondary distribution is invalid.
    #[error("invalid tabular data: {0}")]
    BadTabularData(&'static str),
    /// The bounds of a uniform distribution are not strictly increasing.
    #[error("the lower bound of a uniform distribution should be less than its upper bound")]
    BadUniformBounds,
}

/// Error type for archive save and load failures.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive could not be encoded or decoded.
    #[error("archive encoding failure")]
    Json(#[from] serde_json::Error),
    /// The archived distribution kind is not known.
    #[error("unknown bivariate distribution kind '{kind}'")]
    UnknownKind { kind: String },
    /// The archived grid policy is not known.
    #[error("unknown grid policy '{grid}' with interpolation '{interp}'")]
    UnknownPolicy { grid: String, interp: String },
    /// A secondary distribution index is dangling.
    #[error("secondary distribution index {index} is out of range")]
    BadSecondaryIndex { index: usize },
    /// The archived data does not describe a valid distribution.
    #[error("invalid archived distribution")]
    Construction(#[from] ConstructionError),
}
