//! C4 Ranker (spec §4.4): pure scoring and weighted-random ranking.
//!
//! `rank_snapshot_by_points` is one of the two SQL scalar callbacks spec §4.2
//! calls for. `sqlx`'s SQLite driver has no `create_function` equivalent, so
//! per the documented fallback in spec §9 / SPEC_FULL §4, it's computed here
//! in application code over the bounded candidate slice a Selector query
//! returns (see `wayreel_store::selector`).

use rand::Rng;

/// Points per the scoring rules in spec §4.4: `None` means QUEUED/unscored.
pub type Points = Option<f64>;

/// `rank(points, offset)`:
/// - `offset = None` -> uniform random in `[0, 1)`.
/// - `offset = Some(_)`, `points = None` -> `0.0` (unscouted parents push
///   their children to the back).
/// - otherwise -> `sign(points) * u^(1 / (|points| + 1 + offset))`, `u ~
///   Uniform(0, 1)`.
pub fn rank(points: Points, offset: Option<f64>, rng: &mut impl Rng) -> f64 {
    let Some(offset) = offset else {
        return rng.gen::<f64>();
    };
    let Some(points) = points else {
        return 0.0;
    };
    let u: f64 = rng.gen();
    let sign = if points < 0.0 { -1.0 } else { 1.0 };
    let exponent = 1.0 / (points.abs() + 1.0 + offset.max(0.0));
    sign * u.powf(exponent)
}

/// Score a snapshot per spec §4.4:
/// - `is_media` -> `media_points`.
/// - else if any matched word is tagged -> `sum(count * points)` over tag
///   matches.
/// - else -> `sum(min(count, 1) * points)` over non-tag matches (so
///   repeating a plain word does not compound its score).
#[derive(Debug, Clone, Copy)]
pub struct WordMatch {
    pub count: i64,
    pub points: f64,
    pub is_tag: bool,
}

pub fn score_snapshot(is_media: bool, media_points: f64, matches: &[WordMatch]) -> f64 {
    if is_media {
        return media_points;
    }
    let has_tag = matches.iter().any(|m| m.is_tag);
    if has_tag {
        matches
            .iter()
            .filter(|m| m.is_tag)
            .map(|m| m.count as f64 * m.points)
            .sum()
    } else {
        matches
            .iter()
            .map(|m| m.count.min(1) as f64 * m.points)
            .sum()
    }
}

/// Is a snapshot sensitive, per spec §4.4: the per-snapshot override wins;
/// absent an override, true if any matched word is sensitive.
pub fn is_sensitive(override_flag: Option<bool>, matched_sensitive_words: &[bool]) -> bool {
    override_flag.unwrap_or_else(|| matched_sensitive_words.iter().any(|&s| s))
}

/// Sort a candidate slice by `(priority DESC, rank(points, offset) DESC)`
/// and return the top `limit` items. Selector queries fetch a bounded
/// window (`rank_window`) ordered by priority, then call this to apply the
/// weighted-random tiebreak the way a registered SQL function would.
pub fn rank_and_take<T>(
    mut candidates: Vec<T>,
    priority: impl Fn(&T) -> i64,
    points: impl Fn(&T) -> Points,
    offset: Option<f64>,
    limit: usize,
    rng: &mut impl Rng,
) -> Vec<T> {
    let mut scored: Vec<(i64, f64, T)> = candidates
        .drain(..)
        .map(|item| {
            let p = priority(&item);
            let r = rank(points(&item), offset, rng);
            (p, r, item)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
    });
    scored.into_iter().take(limit).map(|(_, _, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn null_offset_is_uniform() {
        let mut rng = StdRng::seed_from_u64(1);
        let r = rank(Some(5.0), None, &mut rng);
        assert!((0.0..1.0).contains(&r));
    }

    #[test]
    fn null_points_with_offset_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(rank(None, Some(2.0), &mut rng), 0.0);
    }

    #[test]
    fn higher_points_trend_higher_in_expectation() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 2000;
        let mut low_sum = 0.0;
        let mut high_sum = 0.0;
        for _ in 0..trials {
            low_sum += rank(Some(1.0), Some(0.0), &mut rng);
            high_sum += rank(Some(50.0), Some(0.0), &mut rng);
        }
        assert!(high_sum / trials as f64 > low_sum / trials as f64);
    }

    #[test]
    fn negative_points_preserve_sign() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(rank(Some(-3.0), Some(1.0), &mut rng) <= 0.0);
        }
    }

    #[test]
    fn tag_words_compound_non_tag_words_do_not() {
        let tag_matches = [
            WordMatch { count: 3, points: 2.0, is_tag: true },
            WordMatch { count: 1, points: 1.0, is_tag: false },
        ];
        assert_eq!(score_snapshot(false, 100.0, &tag_matches), 6.0);

        let plain_matches = [
            WordMatch { count: 3, points: 2.0, is_tag: false },
            WordMatch { count: 5, points: 1.0, is_tag: false },
        ];
        assert_eq!(score_snapshot(false, 100.0, &plain_matches), 3.0);
    }

    #[test]
    fn media_uses_configured_constant() {
        assert_eq!(score_snapshot(true, 42.0, &[]), 42.0);
    }

    #[test]
    fn override_wins_over_matched_sensitivity() {
        assert!(!is_sensitive(Some(false), &[true, true]));
        assert!(is_sensitive(None, &[false, true]));
        assert!(!is_sensitive(None, &[false, false]));
    }

    #[test]
    fn rank_and_take_orders_by_priority_then_rank() {
        let mut rng = StdRng::seed_from_u64(3);
        let candidates = vec![(1000i64, Some(1.0)), (2000, Some(1.0)), (2000, Some(100.0))];
        let top = rank_and_take(candidates, |c| c.0, |c| c.1, Some(0.0), 1, &mut rng);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, 2000);
    }
}
