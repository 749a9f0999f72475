// =============================================================================
// base_date.rs — WHICH DATE ACTUALLY STARTS THE CLOCK
// =============================================================================
//
// A legal document usually contains several calendar dates: the incident,
// the filing, the day the letter was served. Only one of them starts the
// statutory clock, and it's almost always the service/notification date.
// Full syntactic parsing is out of scope, so we approximate "the date
// attached to the phrase describing service" two ways:
//
// 1. The DEFAULT picker: take the most recent date inside a plausibility
//    window of six months back to two weeks forward. Documents land on a
//    lawyer's desk shortly after the triggering event, so recency inside
//    that window is a decent prior.
//
// 2. The ANCHOR-PROXIMITY picker: when the template knows what the
//    triggering event is called ("zugestellt", "notifié"), score every
//    candidate by textual distance to the nearest anchor occurrence, with
//    bonuses for falling in a realistic legal window. Nearest-to-anchor
//    wins; ties go to the more recent date.
//
// The two pickers use DIFFERENT plausibility windows (6 months/2 weeks vs
// 3 years/60 days). The asymmetry is deliberate: a date confirmed by anchor
// proximity earns trust over a much wider range than a bare guess.
// Preserve both constant pairs; do not unify them.
// =============================================================================

use chrono::{Duration, Months, NaiveDate};
use tracing::trace;

use crate::models::DateCandidate;

// Default picker window: 6 months back, 2 weeks forward.
const DEFAULT_WINDOW_BACK_MONTHS: u32 = 6;
const DEFAULT_WINDOW_FORWARD_DAYS: i64 = 14;

// Anchored picker window: 3 years back, 60 days forward.
const ANCHOR_WINDOW_BACK_MONTHS: u32 = 36;
const ANCHOR_WINDOW_FORWARD_DAYS: i64 = 60;

/// Bonus for a candidate inside the realistic legal window.
const ANCHOR_PLAUSIBLE_BONUS: i64 = 900;
/// Extra bonus for a candidate no more than 7 days in the future.
const ANCHOR_NEAR_NOW_BONUS: i64 = 120;
const ANCHOR_NEAR_NOW_FORWARD_DAYS: i64 = 7;

/// Distance stand-in when the template's anchors never occur in the text.
/// Large enough that the plausibility bonuses still order the candidates.
const NO_ANCHOR_DISTANCE: i64 = 1_000_000;

/// The default base-date strategy: most recent date inside the plausibility
/// window; failing that, the latest date found anywhere; failing that, now.
pub fn pick_base_date(candidates: &[DateCandidate], now: NaiveDate) -> NaiveDate {
    let lower = now
        .checked_sub_months(Months::new(DEFAULT_WINDOW_BACK_MONTHS))
        .unwrap_or(now);
    let upper = now + Duration::days(DEFAULT_WINDOW_FORWARD_DAYS);

    let in_window = candidates
        .iter()
        .map(|c| c.date)
        .filter(|d| *d >= lower && *d <= upper)
        .max();

    if let Some(date) = in_window {
        return date;
    }

    candidates.iter().map(|c| c.date).max().unwrap_or(now)
}

/// The anchor-proximity strategy. Scores every candidate as
/// `-(min distance in bytes to any anchor)` plus plausibility bonuses,
/// ranks descending, breaks ties toward the more recent date.
///
/// Returns `None` when there are no candidates at all, in which case the
/// caller falls back to [`pick_base_date`]'s result.
pub fn pick_event_anchored_base_date(
    candidates: &[DateCandidate],
    anchor_offsets: &[usize],
    now: NaiveDate,
) -> Option<NaiveDate> {
    if candidates.is_empty() {
        return None;
    }

    let lower = now
        .checked_sub_months(Months::new(ANCHOR_WINDOW_BACK_MONTHS))
        .unwrap_or(now);
    let upper = now + Duration::days(ANCHOR_WINDOW_FORWARD_DAYS);
    let near_now = now + Duration::days(ANCHOR_NEAR_NOW_FORWARD_DAYS);

    let best = candidates
        .iter()
        .map(|c| {
            let distance = anchor_offsets
                .iter()
                .map(|a| (c.index as i64 - *a as i64).abs())
                .min()
                .unwrap_or(NO_ANCHOR_DISTANCE);

            let mut score = -distance;
            if c.date >= lower && c.date <= upper {
                score += ANCHOR_PLAUSIBLE_BONUS;
            }
            if c.date <= near_now {
                score += ANCHOR_NEAR_NOW_BONUS;
            }
            (score, c.date)
        })
        // max_by_key on (score, date): score first, recency breaks ties.
        .max_by_key(|(score, date)| (*score, *date))
        .map(|(score, date)| {
            trace!(score, %date, "Anchored base date selected");
            date
        });

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cand(date: NaiveDate, index: usize) -> DateCandidate {
        DateCandidate { date, index }
    }

    fn now() -> NaiveDate {
        d(2026, 2, 20)
    }

    #[test]
    fn default_picker_prefers_recent_in_window() {
        let candidates = vec![
            cand(d(2025, 11, 3), 10),
            cand(d(2026, 2, 10), 50),
            cand(d(2023, 1, 1), 90), // ancient, out of window
        ];
        assert_eq!(pick_base_date(&candidates, now()), d(2026, 2, 10));
    }

    #[test]
    fn default_picker_rejects_far_future() {
        // Two weeks forward is the limit; a date three months out is more
        // likely a hearing date than a past trigger event.
        let candidates = vec![cand(d(2026, 5, 20), 0), cand(d(2026, 2, 1), 10)];
        assert_eq!(pick_base_date(&candidates, now()), d(2026, 2, 1));
    }

    #[test]
    fn default_picker_falls_back_to_latest_anywhere() {
        let candidates = vec![cand(d(2020, 6, 1), 0), cand(d(2021, 3, 3), 10)];
        assert_eq!(pick_base_date(&candidates, now()), d(2021, 3, 3));
    }

    #[test]
    fn default_picker_falls_back_to_now_when_empty() {
        assert_eq!(pick_base_date(&[], now()), now());
    }

    #[test]
    fn anchored_picker_prefers_proximity_over_recency() {
        // The irrelevant date is MORE recent but far from the anchor.
        let candidates = vec![
            cand(d(2026, 2, 18), 900), // recent, far from anchor
            cand(d(2026, 2, 14), 52),  // near the anchor at 40
        ];
        let picked = pick_event_anchored_base_date(&candidates, &[40], now());
        assert_eq!(picked, Some(d(2026, 2, 14)));
    }

    #[test]
    fn plausibility_bonus_outweighs_small_distance_edge() {
        // A slightly-closer date far outside the legal window loses to a
        // slightly-farther date inside it: 900 points buy a lot of bytes.
        let candidates = vec![
            cand(d(2015, 1, 1), 45),  // closest, but ancient
            cand(d(2026, 2, 10), 400), // in window
        ];
        let picked = pick_event_anchored_base_date(&candidates, &[40], now());
        assert_eq!(picked, Some(d(2026, 2, 10)));
    }

    #[test]
    fn ties_break_toward_the_more_recent_date() {
        let candidates = vec![
            cand(d(2026, 2, 10), 30), // distance 10
            cand(d(2026, 2, 12), 50), // distance 10
        ];
        let picked = pick_event_anchored_base_date(&candidates, &[40], now());
        assert_eq!(picked, Some(d(2026, 2, 12)));
    }

    #[test]
    fn anchored_picker_yields_none_without_candidates() {
        assert_eq!(pick_event_anchored_base_date(&[], &[40], now()), None);
    }

    #[test]
    fn missing_anchors_still_rank_by_plausibility() {
        // Template has hints, text never uses them: everyone gets the
        // sentinel distance and the window bonuses decide.
        let candidates = vec![cand(d(2010, 1, 1), 0), cand(d(2026, 2, 1), 10)];
        let picked = pick_event_anchored_base_date(&candidates, &[], now());
        assert_eq!(picked, Some(d(2026, 2, 1)));
    }
}
