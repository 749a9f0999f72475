// =============================================================================
// synthesizer.rs — THE DEADLINE SYNTHESIZER
// =============================================================================
//
// Per-document orchestration of the whole pipeline: truncate, extract date
// candidates, match templates, select base dates, compute due dates, score
// confidence, collect evidence, mint deterministic ids, deduplicate.
//
// `derive_deadlines_from_documents` is a PURE function: no I/O, no clock
// reads (the caller supplies `now`), no randomness. Same input, same
// output, every time — that purity is what makes re-derivation an
// idempotent upsert instead of a duplicate-generating machine, and it is
// load-bearing for every test in this crate. Keep it that way.
//
// Malformed input never throws: empty documents are skipped, unparseable
// dates were already dropped by the extractor, and uncertainty is expressed
// through confidence + requiresReview instead of errors. A flagged guess
// beats an exception.
//
// One non-template special case lives here: the §§ 195/199 BGB regular
// limitation period (three years, running from year-end). It is a known
// legal-drafting heuristic, deliberately separate from the template
// machinery, permanently low-confidence, and always flagged for review.
// =============================================================================

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::RegexBuilder;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::base_date::{pick_base_date, pick_event_anchored_base_date};
use crate::business_days::{add_duration, normalize_to_business_day};
use crate::confidence::{compute_detection_confidence, requires_review, ConfidenceInputs};
use crate::date_scanner::{extract_date_candidates, scan_window};
use crate::evidence::collect_evidence_snippets;
use crate::models::{
    CaseDeadline, DateCandidate, DeadlineStatus, DerivedFrom, Jurisdiction, LegalDocumentRecord,
    Priority,
};
use crate::templates::{match_templates, CompiledTemplate};

/// Broad trigger for the German regular limitation period. Kenntnis
/// (knowledge of the claim) and claim accrual are the § 199 BGB clock
/// starters; any of these words in a DE document is worth a flagged hint.
static LIMITATION_TRIGGER: LazyLock<regex::Regex> = LazyLock::new(|| {
    RegexBuilder::new("verjährung|kenntnis|anspruch entstanden")
        .case_insensitive(true)
        .build()
        .expect("limitation trigger regex")
});

const LIMITATION_ID_SUFFIX: &str = "verjaehrung-195-bgb";
const LIMITATION_TITLE: &str = "Regelverjährung (§§ 195, 199 BGB)";
const LIMITATION_CONFIDENCE: f64 = 0.74;
const LIMITATION_EVIDENCE: &str = "Regelverjährung nach §§ 195, 199 BGB: drei Jahre ab \
     Schluss des Jahres, in dem der Anspruch entstanden ist und der Gläubiger Kenntnis \
     erlangt hat. Automatisch abgeleitete Schätzung, bitte prüfen.";
const LIMITATION_YEARS: i32 = 3;
const LIMITATION_REMINDERS: &[i64] = &[129_600, 43_200, 10_080]; // 90d 30d 7d

/// Derive deadlines for a case from a set of documents, against a fixed
/// `now`. Pure and deterministic; the returned order is unspecified (the
/// records are unique by id, which is the only contract).
pub fn derive_deadlines_from_documents(
    case_id: &str,
    documents: &[LegalDocumentRecord],
    now: DateTime<Utc>,
) -> Vec<CaseDeadline> {
    let today = now.date_naive();
    let mut by_id: HashMap<String, CaseDeadline> = HashMap::new();

    for doc in documents {
        let text = doc.text();
        if text.trim().is_empty() {
            debug!(doc_id = %doc.id, "Skipping document with no usable text");
            continue;
        }

        let window = scan_window(text);
        let candidates = extract_date_candidates(window);
        let default_base = pick_base_date(&candidates, today);
        let matched = match_templates(window, doc.detected_jurisdiction);

        debug!(
            doc_id = %doc.id,
            candidates = candidates.len(),
            templates = matched.len(),
            "Document scanned"
        );

        for template in matched {
            let deadline = synthesize_for_template(
                case_id,
                doc,
                template,
                window,
                &candidates,
                default_base,
                today,
                now,
            );
            by_id.insert(deadline.id.clone(), deadline);
        }

        if let Some(deadline) = limitation_rule_deadline(case_id, doc, window, default_base, now) {
            by_id.insert(deadline.id.clone(), deadline);
        }
    }

    info!(
        case_id = %case_id,
        documents = documents.len(),
        deadlines = by_id.len(),
        "Deadline derivation complete"
    );
    by_id.into_values().collect()
}

/// Convenience wrapper for callers without a frozen clock.
pub fn derive_deadlines_from_documents_now(
    case_id: &str,
    documents: &[LegalDocumentRecord],
) -> Vec<CaseDeadline> {
    derive_deadlines_from_documents(case_id, documents, Utc::now())
}

#[allow(clippy::too_many_arguments)]
fn synthesize_for_template(
    case_id: &str,
    doc: &LegalDocumentRecord,
    template: &CompiledTemplate,
    window: &str,
    candidates: &[DateCandidate],
    default_base: NaiveDate,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> CaseDeadline {
    // Anchored selection first; the default pick is the fallback when the
    // document simply contains no dates.
    let anchor_offsets = template.anchor_offsets(window);
    let anchored = pick_event_anchored_base_date(candidates, &anchor_offsets, today);
    let (base, was_anchored) = match anchored {
        Some(date) => (date, true),
        None => (default_base, false),
    };

    let due = normalize_to_business_day(add_duration(
        base,
        template.def.add_days,
        template.def.add_months,
    ));

    let confidence = compute_detection_confidence(ConfidenceInputs {
        anchored_base_date: was_anchored,
        date_candidate_count: candidates.len(),
        has_event_hints: template.has_event_hints(),
    });

    let deadline = CaseDeadline {
        id: CaseDeadline::deterministic_id(case_id, &doc.id, template.def.id_suffix, due),
        title: template.def.title.to_string(),
        due_at: at_midnight(due),
        derived_from: DerivedFrom::AutoTemplate,
        base_event_at: at_midnight(base),
        detection_confidence: confidence,
        requires_review: requires_review(confidence),
        evidence_snippets: collect_evidence_snippets(template, window),
        source_doc_ids: vec![doc.id.clone()],
        status: DeadlineStatus::Open,
        priority: template.def.priority,
        reminder_offsets_in_minutes: template.def.reminder_offsets_in_minutes.to_vec(),
        created_at: now,
        updated_at: now,
    };

    debug!(
        template = template.def.id_suffix,
        due = %due,
        anchored = was_anchored,
        confidence = %format!("{:.2}", confidence),
        "Deadline synthesized"
    );
    deadline
}

/// The §§ 195/199 BGB special case: three years from the END of the year
/// of the base date. Applies to German documents and documents with no
/// detected jurisdiction; always low confidence, always review.
///
/// The due date is pinned to December 31st and deliberately NOT rolled to
/// a business day — the statutory year-end is a fixed calendar fact, and
/// the permanent review flag hands the fine print to a human anyway.
fn limitation_rule_deadline(
    case_id: &str,
    doc: &LegalDocumentRecord,
    window: &str,
    default_base: NaiveDate,
    now: DateTime<Utc>,
) -> Option<CaseDeadline> {
    let jurisdiction_applies = matches!(doc.detected_jurisdiction, None | Some(Jurisdiction::DE));
    if !jurisdiction_applies || !LIMITATION_TRIGGER.is_match(window) {
        return None;
    }

    let due = NaiveDate::from_ymd_opt(default_base.year() + LIMITATION_YEARS, 12, 31)?;

    Some(CaseDeadline {
        id: CaseDeadline::deterministic_id(case_id, &doc.id, LIMITATION_ID_SUFFIX, due),
        title: LIMITATION_TITLE.to_string(),
        due_at: at_midnight(due),
        derived_from: DerivedFrom::LimitationRule,
        base_event_at: at_midnight(default_base),
        detection_confidence: LIMITATION_CONFIDENCE,
        requires_review: true,
        evidence_snippets: vec![LIMITATION_EVIDENCE.to_string()],
        source_doc_ids: vec![doc.id.clone()],
        status: DeadlineStatus::Open,
        priority: Priority::High,
        reminder_offsets_in_minutes: LIMITATION_REMINDERS.to_vec(),
        created_at: now,
        updated_at: now,
    })
}

fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frozen_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap()
    }

    /// Opt-in log output for test runs: `RUST_LOG=debug cargo test`.
    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn doc(id: &str, text: &str, jurisdiction: Option<Jurisdiction>) -> LegalDocumentRecord {
        LegalDocumentRecord {
            id: id.to_string(),
            title: format!("doc {}", id),
            normalized_text: Some(text.to_string()),
            raw_text: None,
            detected_jurisdiction: jurisdiction,
        }
    }

    #[test]
    fn fortfuehrungsantrag_scenario() {
        init_logging();
        let docs = vec![doc(
            "doc-1",
            "Der Einstellungsbescheid der Staatsanwaltschaft wurde am 10.02.2026 \
             zugestellt. Ein Fortführungsantrag wird geprüft.",
            Some(Jurisdiction::DE),
        )];
        let deadlines = derive_deadlines_from_documents("case-1", &docs, frozen_now());

        let fortfuehrung = deadlines
            .iter()
            .find(|d| d.title.contains("Fortführungsantrag"))
            .expect("Fortführungsantrag deadline derived");

        assert!(fortfuehrung.due_at.to_rfc3339().starts_with("2026-02-24"));
        assert_eq!(fortfuehrung.derived_from, DerivedFrom::AutoTemplate);
        assert!(fortfuehrung.detection_confidence >= 0.85);
        assert!(!fortfuehrung.requires_review);
        assert!(!fortfuehrung.evidence_snippets.is_empty());
    }

    #[test]
    fn strafbefehl_anchors_on_service_date_not_incident_date() {
        init_logging();
        let docs = vec![doc(
            "doc-2",
            "Am 01.01.2024 kam es zum Vorfall auf der Landstraße. \
             Der Strafbefehl wurde am 14.02.2026 zugestellt.",
            Some(Jurisdiction::DE),
        )];
        let deadlines = derive_deadlines_from_documents("case-2", &docs, frozen_now());

        let strafbefehl = deadlines
            .iter()
            .find(|d| d.id.contains("strafbefehl-einspruch-410-stpo"))
            .expect("Strafbefehl deadline derived");

        // Anchored on 14.02., not 01.01.: +14 days lands on Saturday
        // 28.02., which rolls to Monday 02.03.
        assert!(strafbefehl.base_event_at.to_rfc3339().starts_with("2026-02-14"));
        assert!(strafbefehl.due_at.to_rfc3339().starts_with("2026-03-02"));
    }

    #[test]
    fn derivation_is_idempotent_and_deterministic() {
        let docs = vec![doc(
            "doc-3",
            "Der Strafbefehl wurde am 14.02.2026 zugestellt. Kündigung vom \
             03.02.2026 liegt bei.",
            Some(Jurisdiction::DE),
        )];
        let mut a = derive_deadlines_from_documents("case-3", &docs, frozen_now());
        let mut b = derive_deadlines_from_documents("case-3", &docs, frozen_now());
        a.sort_by(|x, y| x.id.cmp(&y.id));
        b.sort_by(|x, y| x.id.cmp(&y.id));

        assert!(!a.is_empty());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.due_at, y.due_at);
            assert_eq!(x.detection_confidence, y.detection_confidence);
        }
    }

    #[test]
    fn confidence_bounds_and_review_coupling_hold() {
        let docs = vec![
            doc("doc-4", "Strafbefehl zugestellt am 14.02.2026.", Some(Jurisdiction::DE)),
            doc("doc-5", "Eine Anhörung ist angesetzt.", Some(Jurisdiction::DE)),
            doc("doc-6", "Verjährung droht.", None),
        ];
        let deadlines = derive_deadlines_from_documents("case-4", &docs, frozen_now());
        assert!(!deadlines.is_empty());
        for d in &deadlines {
            assert!((0.35..=0.97).contains(&d.detection_confidence), "{}", d);
            assert_eq!(d.requires_review, d.detection_confidence < 0.78, "{}", d);
        }
    }

    #[test]
    fn template_cap_limits_deadlines_per_document() {
        let soup = "Strafbefehl zugestellt, Urteil verkündet, Berufung und Revision \
                    erwogen, Mahnbescheid und Vollstreckungsbescheid liegen vor, \
                    Kündigung erhalten, Bußgeldbescheid und Steuerbescheid eingegangen, \
                    Anhörung angesetzt, Verfassungsbeschwerde geprüft, Widerspruch \
                    eingelegt, alles am 10.02.2026.";
        let docs = vec![doc("doc-7", soup, Some(Jurisdiction::DE))];
        let deadlines = derive_deadlines_from_documents("case-5", &docs, frozen_now());

        let from_templates = deadlines
            .iter()
            .filter(|d| d.derived_from == DerivedFrom::AutoTemplate)
            .count();
        assert_eq!(from_templates, 8);
    }

    #[test]
    fn jurisdiction_overlay_applies_but_foreign_national_rules_do_not() {
        // An FR-tagged document mentioning a German Strafbefehl: the DE
        // template must stay out, the EU overlay template must stay in.
        let docs = vec![doc(
            "doc-8",
            "Strafbefehl erwähnt. Auskunftsersuchen nach Art. 15 DSGVO am \
             10.02.2026 eingegangen.",
            Some(Jurisdiction::FR),
        )];
        let deadlines = derive_deadlines_from_documents("case-6", &docs, frozen_now());

        assert!(deadlines.iter().any(|d| d.id.contains("eu-dsgvo-auskunft")));
        assert!(!deadlines.iter().any(|d| d.id.contains("strafbefehl")));
    }

    #[test]
    fn limitation_rule_is_a_separate_low_confidence_path() {
        let docs = vec![doc(
            "doc-9",
            "Die Verjährung des Anspruchs ist zu prüfen. Schadensereignis vom \
             15.03.2024.",
            Some(Jurisdiction::DE),
        )];
        let deadlines = derive_deadlines_from_documents("case-7", &docs, frozen_now());

        let limitation = deadlines
            .iter()
            .find(|d| d.derived_from == DerivedFrom::LimitationRule)
            .expect("limitation deadline derived");

        // Base date falls back to the latest date anywhere (out of the
        // default window), so year-end + 3 = 2027-12-31.
        assert!(limitation.due_at.to_rfc3339().starts_with("2027-12-31"));
        assert_eq!(limitation.detection_confidence, 0.74);
        assert!(limitation.requires_review);
        assert_eq!(limitation.priority, Priority::High);
        assert!(!limitation.evidence_snippets.is_empty());
    }

    #[test]
    fn limitation_rule_skips_foreign_jurisdictions() {
        let docs = vec![doc(
            "doc-10",
            "La prescription (Verjährung) est à vérifier.",
            Some(Jurisdiction::FR),
        )];
        let deadlines = derive_deadlines_from_documents("case-8", &docs, frozen_now());
        assert!(deadlines
            .iter()
            .all(|d| d.derived_from != DerivedFrom::LimitationRule));
    }

    #[test]
    fn empty_documents_are_skipped_not_fatal() {
        let docs = vec![
            doc("doc-11", "   \n\t  ", Some(Jurisdiction::DE)),
            LegalDocumentRecord {
                id: "doc-12".into(),
                title: "empty".into(),
                normalized_text: None,
                raw_text: None,
                detected_jurisdiction: None,
            },
            doc("doc-13", "Strafbefehl zugestellt am 14.02.2026.", Some(Jurisdiction::DE)),
        ];
        let deadlines = derive_deadlines_from_documents("case-9", &docs, frozen_now());
        assert!(deadlines.iter().all(|d| d.source_doc_ids == vec!["doc-13"]));
        assert!(!deadlines.is_empty());
    }

    #[test]
    fn all_caps_service_hint_still_anchors_the_base_date() {
        // Scanned French mail in shouting case: the SIGNIFIÉ hint must
        // anchor the service date 10.02., not let the picker drift to the
        // more recent hearing date 18.02.
        let docs = vec![doc(
            "doc-15",
            "LE JUGEMENT A ÉTÉ SIGNIFIÉ LE 10.02.2026. \
             PROCHAINE AUDIENCE LE 18.02.2026.",
            Some(Jurisdiction::FR),
        )];
        let deadlines = derive_deadlines_from_documents("case-11", &docs, frozen_now());

        let appel = deadlines
            .iter()
            .find(|d| d.id.contains("fr-appel-538-cpc"))
            .expect("Appel deadline derived");

        assert!(appel.base_event_at.to_rfc3339().starts_with("2026-02-10"));
        // One month from 10.02. is Tuesday 10.03., no weekend shift.
        assert!(appel.due_at.to_rfc3339().starts_with("2026-03-10"));
    }

    #[test]
    fn deadlines_are_unique_by_id() {
        let docs = vec![doc(
            "doc-14",
            "Strafbefehl zugestellt am 14.02.2026. Nochmals: Strafbefehl \
             zugestellt am 14.02.2026.",
            Some(Jurisdiction::DE),
        )];
        let deadlines = derive_deadlines_from_documents("case-10", &docs, frozen_now());
        let mut ids: Vec<&str> = deadlines.iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len());
    }
}
