pub mod anchor;
pub mod error;
pub mod fetcher;
pub mod source;

pub use anchor::Anchor;
pub use error::ScanError;
pub use fetcher::{WikiClient, parse_anchors};
pub use source::PageSource;
