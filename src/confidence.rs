// =============================================================================
// confidence.rs — HOW SURE ARE WE, REALLY?
// =============================================================================
//
// The engine never asserts a legal deadline with unjustified certainty.
// Instead of throwing on ambiguity, it converts the selection evidence into
// a bounded confidence value and lets the review gate decide whether a
// human needs to look. A flagged, lower-confidence answer always beats
// silence or an exception — that's the error-handling philosophy of the
// whole engine, condensed into one module.
//
// The scoring is additive with named bonuses, capped hard at 0.97: the top
// of the scale is "very confident", never "certain", because the engine
// matches patterns, not law.
// =============================================================================

use tracing::trace;

/// Baseline before any evidence is considered.
const BASELINE: f64 = 0.56;
/// An anchored (not merely default) base date was found.
const ANCHORED_BONUS: f64 = 0.25;
/// The template declares event hints at all.
const HINTS_DECLARED_BONUS: f64 = 0.10;
/// At least one date candidate exists in the document.
const ANY_CANDIDATE_BONUS: f64 = 0.07;
/// Two or more candidates: the anchor disambiguation actually did work.
const MULTI_CANDIDATE_BONUS: f64 = 0.03;

/// Hard bounds on every confidence value the engine emits.
pub const MIN_CONFIDENCE: f64 = 0.35;
pub const MAX_CONFIDENCE: f64 = 0.97;

/// The single tunable boundary between "auto-trust" and "flag for human
/// verification". Behavioral contract with the review UI; changing it
/// reclassifies every borderline deadline in every existing workspace.
pub const REVIEW_THRESHOLD: f64 = 0.78;

/// Evidence gathered during base-date selection, as input to scoring.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    /// The anchor-proximity picker produced the base date (as opposed to
    /// the default most-plausible-recent fallback).
    pub anchored_base_date: bool,
    /// How many date candidates the extractor found.
    pub date_candidate_count: usize,
    /// Whether the template declares base-event hints.
    pub has_event_hints: bool,
}

/// Convert selection evidence into a bounded confidence value.
pub fn compute_detection_confidence(inputs: ConfidenceInputs) -> f64 {
    let mut confidence = BASELINE;

    if inputs.anchored_base_date {
        confidence += ANCHORED_BONUS;
    }
    if inputs.has_event_hints {
        confidence += HINTS_DECLARED_BONUS;
    }
    if inputs.date_candidate_count > 0 {
        confidence += ANY_CANDIDATE_BONUS;
    }
    if inputs.date_candidate_count >= 2 {
        confidence += MULTI_CANDIDATE_BONUS;
    }

    let clamped = confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    trace!(confidence = clamped, ?inputs, "Detection confidence computed");
    clamped
}

/// The review gate: anything below the threshold goes to a human.
pub fn requires_review(confidence: f64) -> bool {
    confidence < REVIEW_THRESHOLD
}
