// =============================================================================
// templates.rs — THE DEADLINE TEMPLATE REGISTRY
// =============================================================================
//
// A fixed, compiled-in catalog of statutory deadline rules. Each template
// says: if the document talks about X (the trigger pattern), then a clock of
// N days/months is probably running, anchored at the event described by the
// base-event hints (usually service of process — "zugestellt", "notifié",
// "doręczono", pick your jurisdiction).
//
// The registry is a process-wide immutable table behind a LazyLock: triggers
// are compiled to case-insensitive Unicode regexes once, hint lists are
// compiled to case-insensitive alternation regexes once, and everything is
// shared read-only after that. Nothing here mutates at runtime; changing the
// rules means shipping a new build, which for statutory deadlines is a
// feature.
//
// Both triggers AND hints case-fold beyond ASCII: scanned legal mail loves
// all-caps headings, and "SIGNIFIÉ", "DORĘCZONO", "VERKÜNDET" must anchor
// exactly like their lowercase forms.
//
// Jurisdiction matching is deliberately asymmetric: a document tagged FR
// will never match a DE-only template, but EU and ECHR templates match
// EVERY document, because supranational deadlines coexist with national
// ones no matter what the letterhead says.
// =============================================================================

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::models::{Jurisdiction, Priority};

use Jurisdiction::*;
use Priority::*;

/// A single deadline rule as authored. Static data only; the runtime works
/// with the compiled form below.
#[derive(Debug)]
pub struct DeadlineTemplate {
    /// Stable identifier fragment, embedded into every derived deadline id.
    /// Renaming one of these silently breaks idempotence, so don't.
    pub id_suffix: &'static str,

    /// Display title for the derived deadline.
    pub title: &'static str,

    /// Regex matched against the whole (truncated) document text to decide
    /// whether this rule applies at all. Compiled case-insensitive.
    pub trigger: &'static str,

    /// Literal phrases marking the event that starts the clock. When
    /// non-empty, the anchor-proximity picker hunts for the date closest
    /// to one of these. When empty, the trigger itself serves as anchor.
    pub base_event_hints: &'static [&'static str],

    /// Jurisdictions this rule belongs to. EU/ECHR entries are overlays
    /// and stay applicable everywhere.
    pub jurisdictions: &'static [Jurisdiction],

    /// Duration: months are applied first, then days.
    pub add_days: i64,
    pub add_months: u32,

    pub priority: Priority,

    /// Reminder lead times in minutes, largest first.
    pub reminder_offsets_in_minutes: &'static [i64],
}

// Reminder ladders, in minutes. Largest first, per the reminder scheduler's
// contract on the consuming side.
const REM_CRITICAL: &[i64] = &[20_160, 10_080, 4_320, 1_440, 120]; // 14d 7d 3d 1d 2h
const REM_HIGH: &[i64] = &[10_080, 4_320, 1_440]; //  7d 3d 1d
const REM_MEDIUM: &[i64] = &[4_320, 1_440]; //  3d 1d
const REM_LONG: &[i64] = &[129_600, 43_200, 10_080]; // 90d 30d 7d

// Shared hint vocabularies. Service of process is the clock-starter in
// almost every national system, it just wears different words.
const HINTS_DE_SERVICE: &[&str] = &["zugestellt", "zustellung", "bekannt gegeben", "bescheid"];
const HINTS_FR_SERVICE: &[&str] = &["signifié", "notifié", "notification"];
const HINTS_IT_SERVICE: &[&str] = &["notificato", "notificata", "notifica"];
const HINTS_PL_SERVICE: &[&str] = &["doręczono", "doręczenia", "doręczony"];
const HINTS_PT_SERVICE: &[&str] = &["citado", "citada", "notificado", "notificada"];

/// The registry. Order matters: ties in priority are broken by position in
/// this table, so the more specific rule of two equals goes first.
static TEMPLATE_DEFS: &[DeadlineTemplate] = &[
    // =========================================================================
    // GERMANY — where this product started, hence the deepest catalog
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "fortfuehrungsantrag-172-stpo",
        title: "Fortführungsantrag (§ 172 StPO)",
        trigger: "einstellungsbescheid|fortführungsantrag|klageerzwingung",
        base_event_hints: &["zugestellt", "einstellungsbescheid", "bescheid"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "strafbefehl-einspruch-410-stpo",
        title: "Einspruch gegen Strafbefehl (§ 410 StPO)",
        trigger: "strafbefehl",
        base_event_hints: &["zugestellt", "strafbefehl"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "revision-341-stpo",
        title: "Revision (§ 341 StPO)",
        trigger: "revision",
        base_event_hints: &["verkündet", "verkündung", "urteil"],
        jurisdictions: &[DE],
        add_days: 7,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "berufung-517-zpo",
        title: "Berufung (§ 517 ZPO)",
        trigger: "berufung|urteil",
        base_event_hints: &["zugestellt", "urteil"],
        jurisdictions: &[DE],
        add_days: 0,
        add_months: 1,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "berufungsbegruendung-520-zpo",
        title: "Berufungsbegründung (§ 520 ZPO)",
        trigger: "berufungsbegründung|begründungsfrist",
        base_event_hints: &["zugestellt", "urteil"],
        jurisdictions: &[DE],
        add_days: 0,
        add_months: 2,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "widerspruch-70-vwgo",
        title: "Widerspruch gegen Bescheid (§ 70 VwGO)",
        trigger: "widerspruch|verwaltungsakt|bescheid",
        base_event_hints: HINTS_DE_SERVICE,
        jurisdictions: &[DE],
        add_days: 0,
        add_months: 1,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "mahnbescheid-widerspruch-694-zpo",
        title: "Widerspruch gegen Mahnbescheid (§ 694 ZPO)",
        trigger: "mahnbescheid",
        base_event_hints: &["zugestellt", "mahnbescheid"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "vollstreckungsbescheid-einspruch-700-zpo",
        title: "Einspruch gegen Vollstreckungsbescheid (§ 700 ZPO)",
        trigger: "vollstreckungsbescheid",
        base_event_hints: &["zugestellt", "vollstreckungsbescheid"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "kuendigungsschutzklage-4-kschg",
        title: "Kündigungsschutzklage (§ 4 KSchG)",
        trigger: "kündigung",
        base_event_hints: &["zugegangen", "zugang", "kündigung", "erhalten"],
        jurisdictions: &[DE],
        add_days: 21,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "bussgeldbescheid-einspruch-67-owig",
        title: "Einspruch gegen Bußgeldbescheid (§ 67 OWiG)",
        trigger: "bußgeldbescheid|bussgeldbescheid",
        base_event_hints: &["zugestellt", "bußgeldbescheid"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "einspruch-steuerbescheid-355-ao",
        title: "Einspruch gegen Steuerbescheid (§ 355 AO)",
        trigger: "steuerbescheid",
        base_event_hints: &["bekannt gegeben", "bekanntgabe", "zugestellt", "steuerbescheid"],
        jurisdictions: &[DE],
        add_days: 0,
        add_months: 1,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "klageerwiderung-277-zpo",
        title: "Klageerwiderungsfrist (§ 277 ZPO)",
        trigger: "klageerwiderung|frist zur stellungnahme|stellungnahmefrist",
        base_event_hints: &["zugestellt", "klageschrift"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: Medium,
        reminder_offsets_in_minutes: REM_MEDIUM,
    },
    DeadlineTemplate {
        id_suffix: "anhoerung-28-vwvfg",
        title: "Stellungnahme zur Anhörung (§ 28 VwVfG)",
        trigger: "anhörung",
        base_event_hints: &["anhörung", "gelegenheit zur stellungnahme"],
        jurisdictions: &[DE],
        add_days: 14,
        add_months: 0,
        priority: Medium,
        reminder_offsets_in_minutes: REM_MEDIUM,
    },
    DeadlineTemplate {
        id_suffix: "verfassungsbeschwerde-93-bverfgg",
        title: "Verfassungsbeschwerde (§ 93 BVerfGG)",
        trigger: "verfassungsbeschwerde|grundrechtsverletzung",
        base_event_hints: &["zugestellt", "rechtskräftig", "entscheidung"],
        jurisdictions: &[DE],
        add_days: 0,
        add_months: 1,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "erbausschlagung-1944-bgb",
        title: "Ausschlagung der Erbschaft (§ 1944 BGB)",
        trigger: "erbschaft|ausschlagung|nachlass",
        base_event_hints: &["kenntnis", "erbfall", "verstorben"],
        jurisdictions: &[DE],
        add_days: 42,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "wiedereinsetzung-44-stpo",
        title: "Wiedereinsetzung in den vorigen Stand (§ 44 StPO)",
        trigger: "wiedereinsetzung|frist versäumt|fristversäumnis",
        base_event_hints: &["hindernis", "weggefallen", "versäumt"],
        jurisdictions: &[DE],
        add_days: 7,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    // =========================================================================
    // AUSTRIA
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "at-einspruch-strafverfuegung-49-vstg",
        title: "Einspruch gegen Strafverfügung (§ 49 VStG)",
        trigger: "strafverfügung",
        base_event_hints: &["zugestellt", "strafverfügung"],
        jurisdictions: &[AT],
        add_days: 14,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "at-beschwerde-bescheid-7-vwgvg",
        title: "Beschwerde gegen Bescheid (§ 7 VwGVG)",
        trigger: "bescheid",
        base_event_hints: HINTS_DE_SERVICE,
        jurisdictions: &[AT],
        add_days: 28,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "at-einspruch-zahlungsbefehl-248-zpo",
        title: "Einspruch gegen Zahlungsbefehl (§ 248 öZPO)",
        trigger: "zahlungsbefehl",
        base_event_hints: &["zugestellt", "zahlungsbefehl"],
        jurisdictions: &[AT],
        add_days: 28,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    // =========================================================================
    // SWITZERLAND
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "ch-einsprache-strafbefehl-354-stpo",
        title: "Einsprache gegen Strafbefehl (Art. 354 StPO)",
        trigger: "strafbefehl",
        base_event_hints: &["zugestellt", "eröffnet", "strafbefehl"],
        jurisdictions: &[CH],
        add_days: 10,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "ch-beschwerde-verfuegung-50-vwvg",
        title: "Beschwerde gegen Verfügung (Art. 50 VwVG)",
        trigger: "verfügung",
        base_event_hints: &["eröffnet", "zugestellt", "verfügung"],
        jurisdictions: &[CH],
        add_days: 30,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "ch-rechtsvorschlag-74-schkg",
        title: "Rechtsvorschlag (Art. 74 SchKG)",
        trigger: "zahlungsbefehl|betreibung",
        base_event_hints: &["zugestellt", "zahlungsbefehl"],
        jurisdictions: &[CH],
        add_days: 10,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    // =========================================================================
    // FRANCE
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "fr-appel-538-cpc",
        title: "Appel (art. 538 CPC)",
        trigger: "jugement|appel",
        base_event_hints: HINTS_FR_SERVICE,
        jurisdictions: &[FR],
        add_days: 0,
        add_months: 1,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "fr-opposition-injonction-1416-cpc",
        title: "Opposition à injonction de payer (art. 1416 CPC)",
        trigger: "injonction de payer",
        base_event_hints: HINTS_FR_SERVICE,
        jurisdictions: &[FR],
        add_days: 0,
        add_months: 1,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "fr-recours-exces-pouvoir",
        title: "Recours pour excès de pouvoir",
        trigger: "décision administrative|excès de pouvoir|recours contentieux",
        base_event_hints: HINTS_FR_SERVICE,
        jurisdictions: &[FR],
        add_days: 0,
        add_months: 2,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    // =========================================================================
    // ITALY
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "it-opposizione-decreto-641-cpc",
        title: "Opposizione a decreto ingiuntivo (art. 641 c.p.c.)",
        trigger: "decreto ingiuntivo",
        base_event_hints: HINTS_IT_SERVICE,
        jurisdictions: &[IT],
        add_days: 40,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "it-appello-325-cpc",
        title: "Appello (art. 325 c.p.c.)",
        trigger: "sentenza",
        base_event_hints: HINTS_IT_SERVICE,
        jurisdictions: &[IT],
        add_days: 30,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    // =========================================================================
    // POLAND
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "pl-sprzeciw-nakaz-zaplaty",
        title: "Sprzeciw od nakazu zapłaty (art. 480² KPC)",
        trigger: "nakaz zapłaty",
        base_event_hints: HINTS_PL_SERVICE,
        jurisdictions: &[PL],
        add_days: 14,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "pl-apelacja-369-kpc",
        title: "Apelacja (art. 369 KPC)",
        trigger: "wyrok|apelacja",
        base_event_hints: HINTS_PL_SERVICE,
        jurisdictions: &[PL],
        add_days: 14,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    // =========================================================================
    // PORTUGAL
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "pt-contestacao-569-cpc",
        title: "Contestação (art. 569.º CPC)",
        trigger: "citação|contestação",
        base_event_hints: HINTS_PT_SERVICE,
        jurisdictions: &[PT],
        add_days: 30,
        add_months: 0,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "pt-recurso-apelacao-638-cpc",
        title: "Recurso de apelação (art. 638.º CPC)",
        trigger: "sentença",
        base_event_hints: HINTS_PT_SERVICE,
        jurisdictions: &[PT],
        add_days: 30,
        add_months: 0,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    // =========================================================================
    // EU / ECHR OVERLAYS — candidates in every national case
    // =========================================================================
    DeadlineTemplate {
        id_suffix: "eu-nichtigkeitsklage-263-aeuv",
        title: "Nichtigkeitsklage zum EuG (Art. 263 AEUV)",
        trigger: "nichtigkeitsklage|beschluss der kommission|europäische kommission",
        base_event_hints: &["bekannt gegeben", "veröffentlicht", "zugestellt"],
        jurisdictions: &[EU],
        // Two months plus the ten-day distance extension, Art. 51 of the
        // Rules of Procedure. Yes, the extension still exists. No, nobody
        // knows why.
        add_days: 10,
        add_months: 2,
        priority: Critical,
        reminder_offsets_in_minutes: REM_CRITICAL,
    },
    DeadlineTemplate {
        id_suffix: "eu-dsgvo-auskunft-12-dsgvo",
        title: "Beantwortung Auskunftsersuchen (Art. 12 DSGVO)",
        trigger: "auskunftsersuchen|betroffenenanfrage|auskunftsanspruch",
        base_event_hints: &["eingegangen", "erhalten", "antrag"],
        jurisdictions: &[EU],
        add_days: 0,
        add_months: 1,
        priority: High,
        reminder_offsets_in_minutes: REM_HIGH,
    },
    DeadlineTemplate {
        id_suffix: "echr-individualbeschwerde-35-emrk",
        title: "Individualbeschwerde zum EGMR (Art. 35 EMRK)",
        trigger: "egmr|menschenrechte|letztinstanzlich|innerstaatlicher rechtsweg",
        base_event_hints: &["zugestellt", "rechtskräftig", "entscheidung"],
        jurisdictions: &[ECHR],
        add_days: 0,
        add_months: 4,
        priority: Critical,
        reminder_offsets_in_minutes: REM_LONG,
    },
];

/// A template with its patterns compiled and ready to scan. The hints are
/// an escaped `(?i)` alternation so Unicode case folding applies to them
/// the same way it applies to the trigger.
pub struct CompiledTemplate {
    pub def: &'static DeadlineTemplate,
    trigger: Regex,
    hints: Option<Regex>,
}

impl CompiledTemplate {
    fn compile(def: &'static DeadlineTemplate) -> Self {
        let trigger = RegexBuilder::new(def.trigger)
            .case_insensitive(true)
            .build()
            .expect("static template trigger failed to compile");
        let hints = if def.base_event_hints.is_empty() {
            None
        } else {
            let pattern = def
                .base_event_hints
                .iter()
                .map(|h| regex::escape(h))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("static template hints failed to compile"),
            )
        };
        Self { def, trigger, hints }
    }

    pub fn trigger_matches(&self, text: &str) -> bool {
        self.trigger.is_match(text)
    }

    /// Byte range of the first trigger hit, for the evidence fallback
    /// window.
    pub fn first_trigger_match(&self, text: &str) -> Option<(usize, usize)> {
        self.trigger.find(text).map(|m| (m.start(), m.end()))
    }

    /// Whether this template declares explicit base-event hints.
    pub fn has_event_hints(&self) -> bool {
        !self.def.base_event_hints.is_empty()
    }

    /// Every byte offset in `text` where an anchor occurs. With hints, each
    /// hint occurrence is an anchor; without, the trigger pattern itself
    /// marks the event.
    pub fn anchor_offsets(&self, text: &str) -> Vec<usize> {
        match &self.hints {
            Some(re) => re.find_iter(text).map(|m| m.start()).collect(),
            None => self.trigger.find_iter(text).map(|m| m.start()).collect(),
        }
    }

    /// Does a single line of text match the trigger or any hint? Used by
    /// the evidence collector.
    pub fn line_matches(&self, line: &str) -> bool {
        if self.trigger.is_match(line) {
            return true;
        }
        match &self.hints {
            Some(re) => re.is_match(line),
            None => false,
        }
    }
}

/// The compiled registry. Built once on first use, shared read-only across
/// every derivation call and every thread thereafter.
pub static REGISTRY: LazyLock<Vec<CompiledTemplate>> =
    LazyLock::new(|| TEMPLATE_DEFS.iter().map(CompiledTemplate::compile).collect());

/// One document may not bury the case in deadlines. Eight matched templates
/// is the noise ceiling; anything beyond that is almost certainly trigger
/// soup from a long document, not eight genuine concurrent clocks.
pub const MAX_TEMPLATES_PER_DOC: usize = 8;

/// Does a template apply to a document's detected jurisdiction?
///
/// Permissive by design in two directions: a document with NO detected
/// jurisdiction matches everything (over-suggesting beats missing a real
/// deadline, and low confidence will flag the result anyway), and EU/ECHR
/// overlay templates match every document regardless of its national tag.
pub fn template_matches_jurisdiction(
    template: &DeadlineTemplate,
    detected: Option<Jurisdiction>,
) -> bool {
    let Some(detected) = detected else {
        return true;
    };
    template
        .jurisdictions
        .iter()
        .any(|j| *j == detected || j.is_overlay())
}

/// All templates applicable to this document: jurisdiction filter, trigger
/// filter, stable sort by descending priority (ties keep registry order),
/// capped at [`MAX_TEMPLATES_PER_DOC`].
pub fn match_templates(
    text: &str,
    detected: Option<Jurisdiction>,
) -> Vec<&'static CompiledTemplate> {
    let mut matched: Vec<&'static CompiledTemplate> = REGISTRY
        .iter()
        .filter(|t| template_matches_jurisdiction(t.def, detected))
        .filter(|t| t.trigger_matches(text))
        .collect();

    // Stable sort: equal priorities keep their registry order, which puts
    // the more specific of two equal rules first.
    matched.sort_by(|a, b| b.def.priority.score().cmp(&a.def.priority.score()));
    matched.truncate(MAX_TEMPLATES_PER_DOC);

    tracing::debug!(
        matched = matched.len(),
        jurisdiction = %detected.map(|j| j.to_string()).unwrap_or_else(|| "unknown".into()),
        "Template matching complete"
    );
    matched
}
