use thiserror::Error;

/// Typed failures surfaced at the catalog boundary. The UI decides how each
/// one reads in the footer; the store itself never retries or recovers.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An update or favorite toggle named an id with no matching record.
    /// Deletion deliberately does not raise this; removing an id that is
    /// already gone is a no-op.
    #[error("Book not found: {0}")]
    NotFound(String),

    /// An imported snapshot did not parse as a JSON array of book records.
    #[error("Snapshot is not a JSON array of book records: {0}")]
    InvalidFormat(String),

    /// The collection blob could not be serialized or written back to disk.
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_display() {
        let err = CatalogError::NotFound("b-42".into());
        assert!(err.to_string().contains("not found"));

        let err = CatalogError::InvalidFormat("expected value at line 1".into());
        assert!(err.to_string().contains("JSON array"));
    }
}
