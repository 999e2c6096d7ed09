use tally_config::ConfigError;
use tally_core::CoreError;
use thiserror::Error;

/// Error returned by the [`Books`](crate::Books) facade.
#[derive(Debug, Error)]
pub enum BooksError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BooksError {
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            BooksError::Core(err) => Some(err),
            BooksError::Config(_) => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.as_core().is_some_and(CoreError::is_validation)
    }

    pub fn is_no_change(&self) -> bool {
        self.as_core().is_some_and(CoreError::is_no_change)
    }
}
