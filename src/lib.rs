// =============================================================================
// fristen_engine — THE LEGAL DEADLINE DERIVATION ENGINE
// =============================================================================
//
// Scans normalized legal document text, matches jurisdiction-specific
// deadline templates, figures out which of the document's many dates is the
// one that legally starts the clock, computes the due date under
// business-day rules, scores how confident it is, and emits deduplicated
// deadline records linked back to a case.
//
//   Documents  ──▶ date candidates
//                  ──▶ matched templates (registry × jurisdiction)
//                      ──▶ base date (anchored or default)
//                          ──▶ due date + confidence + evidence
//                              ──▶ dedup by deterministic id
//                                  ──▶ upsert + case linking
//
// Design pillars:
//   * Derivation is PURE: fixed `now` in, identical output out, forever.
//   * Ids are deterministic, so re-derivation is an idempotent upsert.
//   * Uncertainty is a confidence score and a review flag, not an error.
//
// This crate owns no CLI, no network protocol, no file format. Document
// ingestion/OCR lives upstream; persistence lives behind the injected
// `CaseAssistantStore` trait; everything in between lives here.
// =============================================================================

pub mod base_date;
pub mod business_days;
pub mod confidence;
pub mod date_scanner;
pub mod evidence;
pub mod models;
pub mod store;
pub mod synthesizer;
pub mod templates;

pub use confidence::{MAX_CONFIDENCE, MIN_CONFIDENCE, REVIEW_THRESHOLD};
pub use models::{
    CaseDeadline, CaseFile, DateCandidate, DeadlineStatus, DerivedFrom, Jurisdiction,
    LegalDocumentRecord, Priority,
};
pub use store::{upsert_auto_deadlines, CaseAssistantStore, StoreError};
pub use synthesizer::{derive_deadlines_from_documents, derive_deadlines_from_documents_now};
pub use templates::{
    match_templates, template_matches_jurisdiction, DeadlineTemplate, MAX_TEMPLATES_PER_DOC,
};
