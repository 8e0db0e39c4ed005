use thiserror::Error;
use wikiwalk_scanner::ScanError;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Provided {role} page is not compatible with the wiki game: {locator}")]
    InvalidLocator { role: &'static str, locator: String },

    #[error("Invalid site prefix: {0}")]
    InvalidSite(String),

    #[error("Failed to fetch {locator} after {attempts} attempt(s): {source}")]
    Fetch {
        locator: String,
        attempts: u32,
        source: ScanError,
    },
}

pub type Result<T> = std::result::Result<T, WalkError>;
