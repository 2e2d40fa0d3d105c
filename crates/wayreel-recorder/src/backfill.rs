//! Missing-asset backfill (spec §4.9 step 12): the proxy reports a URL
//! the archive never captured; probe sibling filenames that differ only
//! in a trailing numeric component and archive whichever ones are live.

/// Replace the trailing run of ASCII digits in the last path segment with
/// `n`, e.g. `level3.dat` → `level2.dat` for `n = 2`. Returns `None` if the
/// last segment has no trailing digit run to replace.
pub fn with_trailing_number(url: &str, n: u64) -> Option<String> {
    let (prefix, last_segment) = match url.rsplit_once('/') {
        Some((p, l)) => (format!("{p}/"), l),
        None => (String::new(), url),
    };
    let digit_start = last_segment.rfind(|c: char| !c.is_ascii_digit()).map(|i| i + 1).unwrap_or(0);
    if digit_start == last_segment.len() {
        return None;
    }
    let (stem, digits) = last_segment.split_at(digit_start);
    if digits.is_empty() {
        return None;
    }
    Some(format!("{prefix}{stem}{n}"))
}

/// Candidate levels to probe around the original, per spec: `level0..level9`
/// style sweep, stopping after `max_consecutive_save_tries` consecutive
/// misses or `max_total_save_tries` total attempts.
pub fn candidate_levels(url: &str, max_total_save_tries: usize) -> Vec<String> {
    (0..max_total_save_tries as u64).filter_map(|n| with_trailing_number(url, n)).collect()
}

/// Decide which probed candidates to keep, given their liveness in probe
/// order, honoring the consecutive-miss cutoff.
pub fn select_live_candidates(
    candidates: &[String],
    is_live: impl Fn(&str) -> bool,
    max_consecutive_misses: usize,
) -> Vec<String> {
    let mut live = Vec::new();
    let mut consecutive_misses = 0;
    for candidate in candidates {
        if is_live(candidate) {
            live.push(candidate.clone());
            consecutive_misses = 0;
        } else {
            consecutive_misses += 1;
            if consecutive_misses >= max_consecutive_misses {
                break;
            }
        }
    }
    live
}
