use thiserror::Error;

// ---------------------------------------------------------------------------
// DataError – the caller-visible failure taxonomy of the data layer
// ---------------------------------------------------------------------------

/// Failures the core distinguishes from plain I/O problems.
///
/// Everything else in the pipeline is a total function: unknown categorical
/// values fall through to a default classification branch and a vacuous
/// selection yields empty tables, neither of which is an error.
#[derive(Debug, Error)]
pub enum DataError {
    /// The dataset lacks one of the ten required columns.
    #[error("required column '{0}' is missing from the dataset")]
    MissingColumn(&'static str),

    /// A numeric cell is null, unparseable, or negative.  Records with
    /// broken numeric fields are rejected outright instead of silently
    /// landing in the lowest classification tier.
    #[error("row {row}: column '{column}' {reason}")]
    BadNumeric {
        row: usize,
        column: &'static str,
        reason: String,
    },

    /// A single-winner aggregate (most common value) was requested against
    /// zero records.
    #[error("no records to pick a most common '{0}' from")]
    EmptyGroup(&'static str),
}
