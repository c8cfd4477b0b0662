pub type SnapdeckResult<T> = Result<T, SnapdeckError>;

#[derive(thiserror::Error, Debug)]
pub enum SnapdeckError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("reference data error: {0}")]
    Reference(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SnapdeckError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            SnapdeckError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            SnapdeckError::reference("x")
                .to_string()
                .contains("reference data error:")
        );
        assert!(
            SnapdeckError::capture("x")
                .to_string()
                .contains("capture error:")
        );
        assert!(
            SnapdeckError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = SnapdeckError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
