// =============================================================================
// evidence.rs — SHOW YOUR WORK
// =============================================================================
//
// Every derived deadline carries up to three text excerpts so a human
// reviewer can verify the match without opening the source document. The
// engine's credibility with its users rests entirely on this module: a
// deadline with no visible justification gets ignored, and an ignored
// deadline engine is worse than none.
//
// Strategy: walk the first 220 non-empty lines and keep the ones matching
// the template's trigger or anchor hints, truncated to 240 chars each. If
// nothing matches line-wise (triggers can span line breaks in badly
// OCR'd documents), fall back to a whitespace-collapsed window around the
// first trigger hit in the raw text.
// =============================================================================

use crate::templates::CompiledTemplate;

/// At most this many snippets per deadline.
pub const MAX_SNIPPETS: usize = 3;
/// Only the front of the document is searched line-wise.
const MAX_SCANNED_LINES: usize = 220;
/// Each snippet line is truncated to this many characters.
const MAX_LINE_CHARS: usize = 240;
/// Fallback window around the first trigger match, in bytes (snapped to
/// char boundaries).
const FALLBACK_BEFORE_CHARS: usize = 80;
const FALLBACK_AFTER_CHARS: usize = 160;

/// Collect up to [`MAX_SNIPPETS`] human-readable excerpts supporting a
/// template match. May return an empty vec for degenerate inputs; the
/// deadline still ships, just with nothing to show.
pub fn collect_evidence_snippets(template: &CompiledTemplate, text: &str) -> Vec<String> {
    let mut snippets: Vec<String> = Vec::new();

    for line in text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(MAX_SCANNED_LINES)
    {
        if template.line_matches(line) {
            snippets.push(truncate_chars(line, MAX_LINE_CHARS).to_string());
            if snippets.len() == MAX_SNIPPETS {
                return snippets;
            }
        }
    }

    if snippets.is_empty() {
        if let Some(snippet) = fallback_window(template, text) {
            snippets.push(snippet);
        }
    }

    snippets
}

/// A window of text around the first trigger hit, whitespace-collapsed so
/// a line-break-riddled OCR artifact still reads as one sentence.
fn fallback_window(template: &CompiledTemplate, text: &str) -> Option<String> {
    let (start, end) = template.first_trigger_match(text)?;

    let from = floor_char_boundary(text, start.saturating_sub(FALLBACK_BEFORE_CHARS));
    let to = ceil_char_boundary(text, (end + FALLBACK_AFTER_CHARS).min(text.len()));

    let collapsed = text[from..to].split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::REGISTRY;

    fn strafbefehl_template() -> &'static CompiledTemplate {
        REGISTRY
            .iter()
            .find(|t| t.def.id_suffix == "strafbefehl-einspruch-410-stpo")
            .unwrap()
    }

    #[test]
    fn matching_lines_become_snippets() {
        let text = "Aktenzeichen 12 Cs 123/24\n\
                    Der Strafbefehl wurde am 14.02.2026 zugestellt.\n\
                    Mit freundlichen Grüßen";
        let snippets = collect_evidence_snippets(strafbefehl_template(), text);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("Strafbefehl"));
    }

    #[test]
    fn at_most_three_snippets() {
        let text = "Strafbefehl eins\nStrafbefehl zwei\nStrafbefehl drei\nStrafbefehl vier";
        let snippets = collect_evidence_snippets(strafbefehl_template(), text);
        assert_eq!(snippets.len(), MAX_SNIPPETS);
    }

    #[test]
    fn long_lines_are_truncated() {
        let long_tail = "x".repeat(500);
        let text = format!("Strafbefehl {}", long_tail);
        let snippets = collect_evidence_snippets(strafbefehl_template(), &text);
        assert_eq!(snippets[0].chars().count(), 240);
    }

    #[test]
    fn fallback_window_collapses_whitespace() {
        // The trigger sits past the line-scan horizon, so only the
        // fallback path can produce evidence.
        let mut filler = String::new();
        for i in 0..300 {
            filler.push_str(&format!("Zeile {}\n", i));
        }
        let text = format!("{}Der   Strafbefehl\n\twurde    zugestellt.", filler);
        let snippets = collect_evidence_snippets(strafbefehl_template(), &text);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("Der Strafbefehl wurde zugestellt."));
    }

    #[test]
    fn degenerate_input_yields_no_snippets_not_a_panic() {
        let snippets = collect_evidence_snippets(strafbefehl_template(), "");
        assert!(snippets.is_empty());
    }

    #[test]
    fn umlauts_near_window_edges_do_not_break_slicing() {
        let text = format!("{}Strafbefehl{}", "ä".repeat(100), "ö".repeat(200));
        let snippets = collect_evidence_snippets(strafbefehl_template(), &text);
        assert_eq!(snippets.len(), 1);
    }
}
