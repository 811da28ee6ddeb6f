use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DefragError {
    #[error("Empty disk map: input contains no run-length tokens")]
    EmptyMap,

    #[error("Invalid byte {byte:#04x} at offset {offset}: disk map must be ASCII digits")]
    InvalidDigit { offset: usize, byte: u8 },

    #[error("Extent registry inconsistency: {0}")]
    ExtentInconsistency(String),
}

impl DefragError {
    /// True for errors caused by malformed input rather than an internal defect.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DefragError::EmptyMap | DefragError::InvalidDigit { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DefragError>;
