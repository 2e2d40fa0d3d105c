//! Parsing the Compiler's free-form ID list (spec §4.12): comma-separated
//! ranges with exclusions, e.g. `1-20,25,!13,!17-19`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdListError {
    #[error("invalid id list token {0:?}")]
    InvalidToken(String),
}

/// Parse a free-form ID list into the sorted, deduplicated set of
/// included ids, with every `!`-prefixed entry removed regardless of the
/// order tokens appear in.
pub fn parse_id_list(input: &str) -> Result<Vec<i64>, IdListError> {
    let mut included = std::collections::BTreeSet::new();
    let mut excluded = std::collections::BTreeSet::new();

    for raw_token in input.split(',') {
        let token = raw_token.trim();
        if token.is_empty() {
            continue;
        }
        let (target, negated) = match token.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        let ids = parse_range(target).ok_or_else(|| IdListError::InvalidToken(token.to_string()))?;
        for id in ids {
            if negated {
                excluded.insert(id);
            } else {
                included.insert(id);
            }
        }
    }

    Ok(included.difference(&excluded).copied().collect())
}

fn parse_range(token: &str) -> Option<Vec<i64>> {
    if let Some((start, end)) = token.split_once('-') {
        let start: i64 = start.parse().ok()?;
        let end: i64 = end.parse().ok()?;
        if start > end {
            return None;
        }
        Some((start..=end).collect())
    } else {
        Some(vec![token.parse().ok()?])
    }
}
