pub mod embedding;
pub mod error;
pub mod links;
pub mod policy;
pub mod report;
pub mod score;
pub mod site;
pub mod traverse;

pub use embedding::{EmbeddingError, EmbeddingTable};
pub use error::WalkError;
pub use links::{CandidateMap, extract_links};
pub use policy::{MaxSimilarityPolicy, SelectionPolicy, Strategy, UniformRandomPolicy};
pub use report::{WalkOutcome, WalkReport};
pub use site::{Site, VisitedSet};
pub use traverse::{Navigator, StepCallback, WalkConfig};
