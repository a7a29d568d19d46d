use thiserror::Error;

#[derive(Error, Debug)]
pub enum SirenwatchError {
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("telegram error: {0}")]
    Telegram(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl SirenwatchError {
    /// True for the cancellation outcome, as opposed to an application error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SirenwatchError::Cancelled)
    }
}
