use thiserror::Error;

/// Failures of the price pipeline.
#[derive(Debug, Clone, Error)]
pub enum PriceError {
    /// Missing or unusable remote-access credentials.
    #[error("configuration error: {0}")]
    Config(String),
    /// Remote call failed or answered with something we cannot use.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// Local snapshot could not be written.
    #[error("local io error: {0}")]
    LocalIo(String),
}

impl PriceError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            PriceError::Config(_) => 1001,
            PriceError::Upstream(_) => 1101,
            PriceError::LocalIo(_) => 1201,
        }
    }

    pub fn upstream(e: impl std::fmt::Display) -> Self {
        Self::Upstream(e.to_string())
    }

    pub fn local_io(e: impl std::fmt::Display) -> Self {
        Self::LocalIo(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::PriceError;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            PriceError::Config("x".into()).code(),
            PriceError::Upstream("x".into()).code(),
            PriceError::LocalIo("x".into()).code(),
        ];
        assert_eq!(codes, [1001, 1101, 1201]);
    }

    #[test]
    fn display_includes_kind() {
        let e = PriceError::upstream("HTTP 503");
        assert_eq!(e.to_string(), "upstream error: HTTP 503");
    }
}
