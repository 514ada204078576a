//! Archive records.
//!
//! Distributions are saved as plain `serde` records which can be encoded
//! with any `serde` format; JSON helpers are provided. Secondary
//! distributions shared by several grid points are saved once and restored
//! as shared distributions.

use crate::bivariate::{BasicBivariateDistribution, FullyTabularBasicBivariateDistribution, Tolerances};
use crate::elastic::ElasticBasicBivariateDistribution;
use crate::error::{ArchiveError, ConstructionError};
use crate::grid::{Correlated, CumulativePoints, Direct, UnitBase, UnitBaseCorrelated};
use crate::interpolated::InterpolatedFullyTabularBasicBivariateDistribution;
use crate::interpolation::*;
use crate::num::Float;
use crate::univariate::{TabularDistribution, TabularUnivariateDistribution, UniformDistribution};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of the interpolated fully tabular distribution.
pub const INTERPOLATED_KIND: &str = "InterpolatedFullyTabular";

/// Kind of the elastic distribution.
pub const ELASTIC_KIND: &str = "Elastic";

/// Archive record of a tabular univariate distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TabularRecord {
    /// Piecewise linear distribution.
    Tabular {
        bin_boundaries: Vec<f64>,
        values: Vec<f64>,
    },
    /// Uniform distribution.
    Uniform { lower: f64, upper: f64, value: f64 },
}

impl TabularRecord {
    /// Rebuilds the distribution.
    pub fn to_distribution<T: Float>(
        &self,
    ) -> Result<Arc<dyn TabularUnivariateDistribution<T>>, ConstructionError> {
        let dist: Arc<dyn TabularUnivariateDistribution<T>> = match self {
            TabularRecord::Tabular {
                bin_boundaries,
                values,
            } => Arc::new(TabularDistribution::new(
                bin_boundaries.iter().map(|&x| T::cast_f64(x)).collect(),
                values.iter().map(|&y| T::cast_f64(y)).collect(),
            )?),
            TabularRecord::Uniform {
                lower,
                upper,
                value,
            } => Arc::new(UniformDistribution::new(
                T::cast_f64(*lower),
                T::cast_f64(*upper),
                T::cast_f64(*value),
            )?),
        };

        Ok(dist)
    }
}

/// Archive record of a bivariate distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BivariateRecord {
    /// Distribution kind.
    pub kind: String,
    /// Grid policy name.
    pub grid: String,
    /// Two-dimensional interpolation name.
    pub interp: String,
    pub tolerances: Tolerances,
    pub primary_grid: Vec<f64>,
    /// Distinct secondary distributions.
    pub secondaries: Vec<TabularRecord>,
    /// Index of the secondary distribution of each grid point.
    pub secondary_indices: Vec<usize>,
    /// Whether the primary grid limits are extended.
    pub extended: bool,
    /// Cutoff cosine of elastic distributions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
}

impl BivariateRecord {
    /// Encodes the record as JSON.
    pub fn to_json(&self) -> Result<String, ArchiveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks that the record describes the specified distribution type.
    pub fn check_type(&self, kind: &str, grid: &str, interp: &str) -> Result<(), ArchiveError> {
        if self.kind != kind {
            return Err(ArchiveError::UnknownKind {
                kind: self.kind.clone(),
            });
        }
        if self.grid != grid || self.interp != interp {
            return Err(self.unknown_policy());
        }

        Ok(())
    }

    fn unknown_policy(&self) -> ArchiveError {
        ArchiveError::UnknownPolicy {
            grid: self.grid.clone(),
            interp: self.interp.clone(),
        }
    }
}

/// Distribution which can be rebuilt from its archive record.
pub trait FromRecord: Sized {
    fn from_record(record: &BivariateRecord) -> Result<Self, ArchiveError>;
}

fn make_fully_tabular<D>(
    record: &BivariateRecord,
) -> Result<Box<dyn FullyTabularBasicBivariateDistribution<f64>>, ArchiveError>
where
    D: FromRecord + FullyTabularBasicBivariateDistribution<f64> + 'static,
{
    let dist: Box<dyn FullyTabularBasicBivariateDistribution<f64>> = Box::new(D::from_record(record)?);

    Ok(dist)
}

fn make_basic<D>(record: &BivariateRecord) -> Result<Box<dyn BasicBivariateDistribution<f64>>, ArchiveError>
where
    D: FromRecord + BasicBivariateDistribution<f64> + 'static,
{
    let dist: Box<dyn BasicBivariateDistribution<f64>> = Box::new(D::from_record(record)?);

    Ok(dist)
}

macro_rules! dispatch_interp {
    ($record:ident, $make:ident, $engine:ident, $grid:ident) => {
        dispatch_interp!(@ $record, $make, $engine, $grid, [
            LinLinLin, LinLogLin, LinLinLog, LinLogLog,
            LogLinLin, LogLogLin, LogLinLog, LogLogLog,
            LinLogCosLin, LinLogCosLog, LogLogCosLin, LogLogCosLog,
            LinNudgedLogCosLin, LinNudgedLogCosLog, LogNudgedLogCosLin, LogNudgedLogCosLog
        ])
    };
    (@ $record:ident, $make:ident, $engine:ident, $grid:ident, [$($interp:ident),*]) => {
        match $record.interp.as_str() {
            $(stringify!($interp) => $make::<$engine<$grid<$interp>, f64>>($record),)*
            _ => Err($record.unknown_policy()),
        }
    };
}

macro_rules! dispatch_grid {
    ($record:ident, $make:ident, $engine:ident) => {
        match $record.grid.as_str() {
            "Direct" => dispatch_interp!($record, $make, $engine, Direct),
            "UnitBase" => dispatch_interp!($record, $make, $engine, UnitBase),
            "Correlated" => dispatch_interp!($record, $make, $engine, Correlated),
            "UnitBaseCorrelated" => dispatch_interp!($record, $make, $engine, UnitBaseCorrelated),
            "CumulativePoints" => dispatch_interp!($record, $make, $engine, CumulativePoints),
            _ => Err($record.unknown_policy()),
        }
    };
}

macro_rules! dispatch_kind {
    ($record:ident, $make:ident) => {
        match $record.kind.as_str() {
            INTERPOLATED_KIND => {
                dispatch_grid!($record, $make, InterpolatedFullyTabularBasicBivariateDistribution)
            }
            ELASTIC_KIND => dispatch_grid!($record, $make, ElasticBasicBivariateDistribution),
            _ => Err(ArchiveError::UnknownKind {
                kind: $record.kind.clone(),
            }),
        }
    };
}

/// Rebuilds a fully tabular distribution of any kind, grid policy and
/// interpolation from its record.
pub fn load_fully_tabular(
    record: &BivariateRecord,
) -> Result<Box<dyn FullyTabularBasicBivariateDistribution<f64>>, ArchiveError> {
    dispatch_kind!(record, make_fully_tabular)
}

/// Rebuilds a distribution of any kind, grid policy and interpolation from its
/// record, as a basic distribution.
pub fn load_basic(record: &BivariateRecord) -> Result<Box<dyn BasicBivariateDistribution<f64>>, ArchiveError> {
    dispatch_kind!(record, make_basic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::univariate::UnivariateDistribution;

    #[test]
    fn tabular_record() {
        let record = TabularRecord::Tabular {
            bin_boundaries: vec![0.0, 1.0],
            values: vec![1.0, 1.0],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"Tabular\""));
        assert_eq!(serde_json::from_str::<TabularRecord>(&json).unwrap(), record);

        let dist = record.to_distribution::<f64>().unwrap();
        assert_eq!(dist.to_record(), record);
        assert_eq!(dist.upper_bound(), 1.0);

        let bad = TabularRecord::Uniform {
            lower: 1.0,
            upper: 0.0,
            value: 1.0,
        };
        assert_eq!(
            bad.to_distribution::<f64>().err(),
            Some(ConstructionError::BadUniformBounds)
        );
    }

    #[test]
    fn unknown_type() {
        let mut record = BivariateRecord {
            kind: INTERPOLATED_KIND.to_string(),
            grid: "Direct".to_string(),
            interp: "LinLinLin".to_string(),
            tolerances: Tolerances::default(),
            primary_grid: vec![0.0, 1.0],
            secondaries: vec![TabularRecord::Uniform {
                lower: 0.0,
                upper: 1.0,
                value: 1.0,
            }],
            secondary_indices: vec![0, 0],
            extended: false,
            cutoff: None,
        };
        assert!(load_fully_tabular(&record).is_ok());

        record.interp = "LinLinCubic".to_string();
        assert!(matches!(
            load_fully_tabular(&record),
            Err(ArchiveError::UnknownPolicy { .. })
        ));

        record.interp = "LinLinLin".to_string();
        record.grid = "Histogram".to_string();
        assert!(matches!(load_basic(&record), Err(ArchiveError::UnknownPolicy { .. })));

        record.kind = "Hybrid".to_string();
        assert!(matches!(
            load_basic(&record),
            Err(ArchiveError::UnknownKind { kind }) if kind == "Hybrid"
        ));
    }
}
