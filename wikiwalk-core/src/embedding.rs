use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("IO error reading model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Model contains no vectors")]
    Empty,
}

/// Token to row lookup plus a dense row-major matrix of vectors.
///
/// Built once and only read afterwards, so one table can back any number of walks.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    words: HashMap<String, usize>,
    vectors: Vec<f32>,
    norms: Vec<f64>,
    dim: usize,
}

impl EmbeddingTable {
    pub fn load(path: &Path) -> Result<Self, EmbeddingError> {
        info!("Loading word2vec model from {}", path.display());
        let table = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!(
            "Loaded {} vectors of dimension {}",
            table.rows(),
            table.dim()
        );
        Ok(table)
    }

    /// Parse a text table. The first line is a header and is skipped; every following
    /// non-blank line is a token then its whitespace-separated components.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, EmbeddingError> {
        let mut words = HashMap::new();
        let mut vectors = Vec::new();
        let mut dim = 0;
        let mut rows = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            if line_no == 1 {
                debug!("Model header: {}", line.trim());
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(token) = fields.next() else {
                continue;
            };

            let before = vectors.len();
            for (position, raw) in fields.enumerate() {
                let value: f32 = raw.parse().map_err(|_| EmbeddingError::MalformedRow {
                    line: line_no,
                    reason: format!("component {} ({:?}) is not a number", position + 1, raw),
                })?;
                vectors.push(value);
            }

            let width = vectors.len() - before;
            if width == 0 {
                return Err(EmbeddingError::MalformedRow {
                    line: line_no,
                    reason: format!("token {:?} has no components", token),
                });
            }
            if rows == 0 {
                dim = width;
            } else if width != dim {
                return Err(EmbeddingError::MalformedRow {
                    line: line_no,
                    reason: format!("expected {} components, found {}", dim, width),
                });
            }

            // a repeated token points at its latest row
            words.insert(token.to_string(), rows);
            rows += 1;
        }

        if rows == 0 {
            return Err(EmbeddingError::Empty);
        }

        let norms = vectors
            .chunks_exact(dim)
            .map(|row| {
                row.iter()
                    .map(|&x| (x as f64) * (x as f64))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect();

        Ok(Self {
            words,
            vectors,
            norms,
            dim,
        })
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.words.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn vector(&self, index: usize) -> &[f32] {
        &self.vectors[index * self.dim..(index + 1) * self.dim]
    }

    /// Number of vectors (rows) in the matrix.
    pub fn rows(&self) -> usize {
        self.norms.len()
    }

    /// Number of distinct tokens.
    pub fn vocabulary_len(&self) -> usize {
        self.words.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Cosine similarity of rows `a` and `b`; 0 when either vector has zero length.
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        let denom = self.norms[a] * self.norms[b];
        if denom < f64::EPSILON {
            return 0.0;
        }
        let dot: f64 = self
            .vector(a)
            .iter()
            .zip(self.vector(b))
            .map(|(&x, &y)| (x as f64) * (y as f64))
            .sum();
        dot / denom
    }
}
