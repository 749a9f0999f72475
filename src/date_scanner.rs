// =============================================================================
// date_scanner.rs — THE DATE CANDIDATE EXTRACTOR
// =============================================================================
//
// Legal documents are full of dates: the incident date, the filing date, the
// date the clerk's coffee machine broke. This module's job is NOT to decide
// which one matters — that's the base-date selector's problem. This module
// just finds every date-shaped substring and remembers where it was.
//
// Three literal shapes are recognized:
//   DD.MM.YYYY / DD.MM.YY   (German-style dotted)
//   DD/MM/YYYY / DD/MM/YY   (slash)
//   YYYY-MM-DD              (ISO)
//
// Two-digit years are expanded with a 20xx prefix. Calendar-impossible
// strings like 32.13.2024 are silently discarded. A date matched by more
// than one shape stays duplicated — permissiveness here is intentional,
// deduplication happens much later and by deadline id, not by date.
//
// The scan is bounded to the first ~30,000 characters. A 400-page scanned
// lease does not get to make candidate extraction a hot spot; the deadline-
// relevant dates of a legal document live near the front anyway.
// =============================================================================

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::models::DateCandidate;

/// How much of the document the extractor reads. Characters, not bytes.
pub const SCAN_WINDOW_CHARS: usize = 30_000;

static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})\b").expect("dotted date regex"));
static SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").expect("slash date regex"));
static ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("iso date regex"));

/// Truncate a document to the bounded scan window, respecting char
/// boundaries. Everything downstream (candidate offsets, anchor offsets,
/// trigger matching) operates on this window so offsets stay comparable.
pub fn scan_window(text: &str) -> &str {
    match text.char_indices().nth(SCAN_WINDOW_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Find every date-shaped substring in `text` with its byte offset.
/// Unsorted, duplicates allowed, invalid dates dropped without ceremony.
pub fn extract_date_candidates(text: &str) -> Vec<DateCandidate> {
    // Cheap SIMD prefilter: no separator byte, no date, no regex work.
    if memchr::memchr3(b'.', b'/', b'-', text.as_bytes()).is_none() {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    // Dotted and slash shapes are day-first.
    for re in [&*DOTTED, &*SLASH] {
        for caps in re.captures_iter(text) {
            let m = caps.get(0).expect("capture group 0 always exists");
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            if let Some(date) = build_date(year, month, day) {
                candidates.push(DateCandidate { date, index: m.start() });
            }
        }
    }

    // ISO is year-first.
    for caps in ISO.captures_iter(text) {
        let m = caps.get(0).expect("capture group 0 always exists");
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = build_date(year, month, day) {
            candidates.push(DateCandidate { date, index: m.start() });
        }
    }

    trace!(candidates = candidates.len(), "Date candidate extraction complete");
    candidates
}

/// Expand two-digit years to 20xx and validate against the real calendar.
/// `from_ymd_opt` is the validity filter: 32.13.2024 comes back as `None`
/// and is never heard from again.
fn build_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let year = if year < 100 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}
