use crate::embedding::EmbeddingTable;
use crate::links::{LABEL_DELIMITER, clean_label};
use percent_encoding::percent_decode_str;
use url::Url;

/// Words of the target's final path segment, normalized the same way link labels are.
///
/// The segment is percent-decoded first, so `Z%C3%BCrich` yields `zürich`.
pub fn target_tokens(target: &str) -> Vec<String> {
    let segment = match Url::parse(target) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => target.rsplit('/').next().unwrap_or_default().to_string(),
    };
    let title = percent_decode_str(&segment).decode_utf8_lossy();

    clean_label(&title)
        .split(LABEL_DELIMITER)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rows of `table` for each token it knows; unknown tokens are dropped.
pub fn target_indices(tokens: &[String], table: &EmbeddingTable) -> Vec<usize> {
    tokens
        .iter()
        .filter_map(|token| table.index_of(token))
        .collect()
}

/// Mean cosine similarity between every known word of `label` and every target row.
///
/// Words missing from the table do not count towards the mean. A label with no known words,
/// or an empty target set, scores exactly 0.
pub fn score_label(label: &str, targets: &[usize], table: &EmbeddingTable) -> f64 {
    let words: Vec<&str> = label.split(LABEL_DELIMITER).collect();
    let mut total = 0.0;
    let mut failed_lookups = 0;

    for word in &words {
        match table.index_of(word) {
            Some(row) => {
                for &target in targets {
                    total += table.cosine(row, target);
                }
            }
            None => failed_lookups += 1,
        }
    }

    let total_lookups = words.len() - failed_lookups;
    if total_lookups == 0 || targets.is_empty() {
        return 0.0;
    }
    total / (total_lookups * targets.len()) as f64
}
