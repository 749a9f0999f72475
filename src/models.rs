// =============================================================================
// models.rs — THE SACRED DATA STRUCTURES OF PROCEDURAL DOOM
// =============================================================================
//
// These structs represent the fundamental building blocks of the deadline
// derivation engine. A legal document goes in, deadline records come out,
// and everything in between is described by the types in this file.
//
// The wire format is camelCase JSON because the persistence collaborator is
// the TypeScript side of the product. They get `requiresReview`, we get to
// keep our snake_case dignity inside the crate. Everyone wins.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A jurisdiction code as detected by the document-ingestion pipeline.
///
/// National codes tag a document's primary legal system. `EU` and `ECHR`
/// are overlay markers: supranational deadlines (EU court filings, ECHR
/// complaints) can start ticking regardless of which national system the
/// document itself belongs to, so templates carrying an overlay code stay
/// in play for every document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Jurisdiction {
    /// Germany. Home of the Frist, the Notfrist, and the Ausschlussfrist.
    DE,
    /// Austria
    AT,
    /// Switzerland
    CH,
    /// France
    FR,
    /// Italy
    IT,
    /// Poland
    PL,
    /// Portugal
    PT,
    /// Spain
    ES,
    /// Netherlands
    NL,
    /// European Union overlay. Always a candidate, never the whole story.
    EU,
    /// European Court of Human Rights overlay. The court of last resort
    /// has a deadline too, and it does not care which country you lost in.
    ECHR,
}

impl Jurisdiction {
    /// Overlay jurisdictions remain applicable in any national case.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Jurisdiction::EU | Jurisdiction::ECHR)
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Jurisdiction::DE => "DE",
            Jurisdiction::AT => "AT",
            Jurisdiction::CH => "CH",
            Jurisdiction::FR => "FR",
            Jurisdiction::IT => "IT",
            Jurisdiction::PL => "PL",
            Jurisdiction::PT => "PT",
            Jurisdiction::ES => "ES",
            Jurisdiction::NL => "NL",
            Jurisdiction::EU => "EU",
            Jurisdiction::ECHR => "ECHR",
        };
        write!(f, "{}", code)
    }
}

/// How urgent a deadline is. Not all procedural doom is created equal:
/// missing a Notfrist ends the case, missing a Stellungnahmefrist merely
/// annoys a judge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Miss this and the matter is over. Emergency-restoration territory.
    Critical,
    /// Serious procedural consequences, usually still recoverable.
    High,
    /// Standard response windows.
    Medium,
    /// Housekeeping.
    Low,
}

impl Priority {
    /// Ordinal score used for sorting matched templates.
    /// critical=4 beats high=3 beats medium=2 beats low=1.
    pub fn score(&self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Provenance tag: which code path produced a deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DerivedFrom {
    /// Produced by a template from the registry matching a trigger pattern.
    #[serde(rename = "auto_template")]
    AutoTemplate,
    /// Produced by the standalone §§ 195/199 BGB limitation heuristic.
    /// Always low confidence, always flagged for review.
    #[serde(rename = "limitation_rule")]
    LimitationRule,
}

impl fmt::Display for DerivedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedFrom::AutoTemplate => write!(f, "auto_template"),
            DerivedFrom::LimitationRule => write!(f, "limitation_rule"),
        }
    }
}

/// Workflow status of a deadline. The engine only ever creates `Open`
/// records; the external case workflow owns every transition after that.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineStatus {
    Open,
    Completed,
    Cancelled,
}

/// A legal document as handed to us by the ingestion/OCR pipeline.
/// Immutable input from this engine's point of view: we read it, we never
/// write it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalDocumentRecord {
    /// Stable document id from the document store.
    pub id: String,

    /// Human-readable title, e.g. "Einstellungsbescheid StA München I".
    pub title: String,

    /// OCR-normalized text. Preferred over `raw_text` when present,
    /// because the normalizer has already cleaned up ligatures, hyphen
    /// breaks and the other OCR indignities.
    #[serde(default)]
    pub normalized_text: Option<String>,

    /// The raw extracted text, used when normalization hasn't run.
    #[serde(default)]
    pub raw_text: Option<String>,

    /// Jurisdiction detected upstream. Absent means "no idea", which makes
    /// every template a candidate — better to over-suggest and flag for
    /// review than to miss a real deadline.
    #[serde(default)]
    pub detected_jurisdiction: Option<Jurisdiction>,
}

impl LegalDocumentRecord {
    /// The text this engine scans: normalized if available, raw otherwise.
    pub fn text(&self) -> &str {
        match self.normalized_text.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => self.raw_text.as_deref().unwrap_or(""),
        }
    }
}

/// A date-shaped substring found in a document, with the byte offset where
/// it was found. The offset exists solely so the anchor-proximity picker
/// can measure "how close is this date to the word 'zugestellt'".
/// Ephemeral: lives for one derivation call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCandidate {
    pub date: NaiveDate,
    pub index: usize,
}

/// The main output record. One derived legal deadline, linked back to the
/// case and the documents it was derived from.
///
/// The `id` is fully deterministic — case + document + template + due date.
/// Re-deriving from unchanged input produces the identical id, so repeated
/// runs are idempotent upserts rather than duplicate rows. A changed due
/// date (the document text changed, a different date anchored) produces a
/// NEW id instead of silently overwriting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDeadline {
    /// Deterministic id: `deadline:auto:{case}:{doc}:{template}:{due}`.
    pub id: String,

    /// Display title, e.g. "Einspruch gegen Strafbefehl (§ 410 StPO)".
    pub title: String,

    /// When the deadline falls due. Already normalized to a business day
    /// for template-derived deadlines.
    pub due_at: DateTime<Utc>,

    /// Which code path produced this record.
    pub derived_from: DerivedFrom,

    /// The anchoring event date used as day zero for the duration math.
    pub base_event_at: DateTime<Utc>,

    /// How sure the engine is, bounded to [0.35, 0.97]. The engine never
    /// claims certainty about the law; 0.97 is as confident as it gets.
    pub detection_confidence: f64,

    /// True whenever `detection_confidence` < 0.78. The single gate
    /// between "auto-trust" and "a human must look at this".
    pub requires_review: bool,

    /// Up to three text excerpts supporting the match, for the review UI.
    pub evidence_snippets: Vec<String>,

    /// The documents this deadline was derived from.
    pub source_doc_ids: Vec<String>,

    /// Always `Open` at creation; the case workflow takes it from there.
    pub status: DeadlineStatus,

    pub priority: Priority,

    /// Reminder lead times in minutes before `due_at`, largest first.
    pub reminder_offsets_in_minutes: Vec<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseDeadline {
    /// Build the deterministic deadline id.
    ///
    /// This embeds exactly enough state that idempotence falls out for
    /// free: same case, same document, same template, same computed due
    /// date — same id, same upsert target.
    pub fn deterministic_id(
        case_id: &str,
        doc_id: &str,
        template_suffix: &str,
        due: NaiveDate,
    ) -> String {
        format!(
            "deadline:auto:{}:{}:{}:{}",
            case_id,
            doc_id,
            template_suffix,
            due.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for CaseDeadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} due {} via {} (confidence: {:.0}%{})",
            self.id,
            self.title,
            self.due_at.format("%Y-%m-%d"),
            self.derived_from,
            self.detection_confidence * 100.0,
            if self.requires_review { ", review" } else { "" }
        )
    }
}

/// The case file as held by the external graph store. The engine only ever
/// touches `deadline_ids`, and only to append newly derived ids as an
/// order-preserving, duplicate-free union.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFile {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub deadline_ids: Vec<String>,
}
