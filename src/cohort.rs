//! Age-band cohort partitions.
//!
//! The source data labels every row with an age band code (`"00_04"`,
//! `"80_84"`, `"90+"`, ...). A [`Partition`] maps each band to exactly one
//! named cohort, carries an explicit list of aggregate labels to ignore
//! (`"60+"`, `"00_59"`, `"unassigned"` overlap the five-year bands and would
//! double-count), and treats everything else as unknown. Unknown bands are
//! silently dropped unless the caller opts into strict mode.

use anyhow::Result;
use serde::Deserialize;

use crate::error::DivergenceError;

/// A named cohort and the age-band labels that belong to it.
#[derive(Debug, Clone, Deserialize)]
pub struct Cohort {
    pub name: String,
    pub bands: Vec<String>,
}

/// An ordered set of disjoint cohorts plus the labels excluded from all of them.
///
/// Stored as plain JSON on disk:
/// ```json
/// {
///   "cohorts": [
///     { "name": "under80", "bands": ["00_04", "05_09"] },
///     { "name": "over80", "bands": ["80_84", "85_89", "90+"] }
///   ],
///   "ignored": ["60+", "00_59", "unassigned"]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Partition {
    cohorts: Vec<Cohort>,
    #[serde(default)]
    ignored: Vec<String>,
}

/// Classification of a single age-band label against a [`Partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket<'a> {
    /// The band belongs to the named cohort.
    Cohort(&'a str),
    /// The band is a known aggregate label excluded from the analysis.
    Ignored,
    /// The band matches nothing in the partition.
    Unknown,
}

const AGGREGATE_LABELS: &[&str] = &["60+", "00_59", "unassigned"];

impl Partition {
    /// The two-cohort split used by the divergence pipelines.
    pub fn under_over_80() -> Self {
        Self {
            cohorts: vec![
                Cohort {
                    name: "under80".into(),
                    bands: bands(&[
                        "00_04", "05_09", "10_14", "15_19", "20_24", "25_29", "30_34", "35_39",
                        "40_44", "45_49", "50_54", "55_59", "60_64", "65_69", "70_74", "75_79",
                    ]),
                },
                Cohort {
                    name: "over80".into(),
                    bands: bands(&["80_84", "85_89", "90+"]),
                },
            ],
            ignored: bands(AGGREGATE_LABELS),
        }
    }

    /// The four-cohort split used by the raw cohort view.
    pub fn by_decade() -> Self {
        Self {
            cohorts: vec![
                Cohort {
                    name: "Under60".into(),
                    bands: bands(&[
                        "00_04", "05_09", "10_14", "15_19", "20_24", "25_29", "30_34", "35_39",
                        "40_44", "45_49", "50_54", "55_59",
                    ]),
                },
                Cohort {
                    name: "Sixties".into(),
                    bands: bands(&["60_64", "65_69"]),
                },
                Cohort {
                    name: "Seventies".into(),
                    bands: bands(&["70_74", "75_79"]),
                },
                Cohort {
                    name: "Over80".into(),
                    bands: bands(&["80_84", "85_89", "90+"]),
                },
            ],
            ignored: bands(AGGREGATE_LABELS),
        }
    }

    /// Loads a partition from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Classifies an age-band label.
    pub fn classify(&self, band: &str) -> Bucket<'_> {
        for cohort in &self.cohorts {
            if cohort.bands.iter().any(|b| b == band) {
                return Bucket::Cohort(&cohort.name);
            }
        }
        if self.ignored.iter().any(|b| b == band) {
            return Bucket::Ignored;
        }
        Bucket::Unknown
    }

    /// Classifies a label, turning [`Bucket::Unknown`] into an error when
    /// `strict` is set. Returns the cohort name, or `None` for dropped rows.
    pub fn assign(&self, band: &str, strict: bool) -> Result<Option<&str>, DivergenceError> {
        match self.classify(band) {
            Bucket::Cohort(name) => Ok(Some(name)),
            Bucket::Ignored => Ok(None),
            Bucket::Unknown if strict => Err(DivergenceError::UnmappedCategory {
                label: band.to_string(),
            }),
            Bucket::Unknown => Ok(None),
        }
    }

    /// Cohort names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cohorts.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }
}

fn bands(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}
