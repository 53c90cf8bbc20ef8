// ⚠️ Source Error Taxonomy
// Every variant here is recoverable: the pipeline substitutes an empty
// result or a default and keeps going. Nothing in this module aborts a
// rebuild.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or service failure in a fetcher. Recovered by
    /// substituting an empty result set.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The vulnerability file's columns could not be located via the
    /// alias lists. Recovered by returning an empty mapping.
    #[error("unrecognized schema: no {missing} column among {headers:?}")]
    SchemaUnrecognized {
        missing: &'static str,
        headers: Vec<String>,
    },

    /// A vulnerability value outside [0,1] — includes the -999 sentinel
    /// for missing data. Recovered by excluding the row (the merge step
    /// defaults it later).
    #[error("score {value} outside [0,1]")]
    ValueOutOfRange { value: f64 },
}
