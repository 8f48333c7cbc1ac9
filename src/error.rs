//! Error taxonomy for the divergence pipeline.
//!
//! Every variant is fatal: the run aborts with no retry. The binary
//! boundary wraps these in `anyhow`; pipeline functions return them
//! directly so callers and tests can match on the classification.

/// Pipeline errors, classified by the stage that raised them.
#[derive(Debug, thiserror::Error)]
pub enum DivergenceError {
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("no {metric} rows remained after filtering")]
    EmptyDataset { metric: String },

    #[error("cohort {cohort:?} has no positive values; cannot normalize against a zero peak")]
    DegenerateSeries { cohort: String },

    #[error("age band {label:?} is not mapped to any cohort")]
    UnmappedCategory { label: String },
}
