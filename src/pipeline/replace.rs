//! Placeholder substitution: turn the record into an ordered rule batch.
//!
//! One rule per field, in field order: the literal text `$<key>` maps to
//! the string form of the value. Matching is case-sensitive and
//! exact-substring; values are inserted verbatim, with no escaping. The
//! engine never checks that a placeholder actually occurs in the template —
//! rules that match nothing are silent no-ops, and placeholders without a
//! field stay in the document untouched.
//!
//! [`apply_replacements`] is the local application of the same semantics
//! the remote batch call promises; the in-memory store and the idempotence
//! tests both run on it.

use crate::document::Document;
use crate::record::FieldRecord;
use serde::{Deserialize, Serialize};

/// One exact-text replace-all rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    /// Literal text to find, e.g. `$ma_tram`.
    pub find: String,
    /// Verbatim replacement.
    pub replace: String,
}

/// Build the substitution batch for a record, one rule per field in field
/// order.
pub fn build_replacements(record: &FieldRecord) -> Vec<ReplaceRule> {
    record
        .iter()
        .map(|(key, value)| ReplaceRule {
            find: format!("${key}"),
            replace: value.to_string(),
        })
        .collect()
}

/// Apply a rule batch to the local document model: every rule, over every
/// text container, replace-all.
pub fn apply_replacements(document: &mut Document, rules: &[ReplaceRule]) {
    for rule in rules {
        document.replace_text(&rule.find, &rule.replace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Cell, Paragraph, Row, Table};
    use crate::record::Value;

    fn record() -> FieldRecord {
        let mut r = FieldRecord::new();
        r.insert("ma_tram", "ABC123");
        r.insert("tongtienky", Value::Number(1500.0));
        r.insert("Ghi_chu", Value::Empty);
        r
    }

    #[test]
    fn one_rule_per_field_in_field_order() {
        let rules = build_replacements(&record());
        let finds: Vec<&str> = rules.iter().map(|r| r.find.as_str()).collect();
        assert_eq!(finds, vec!["$ma_tram", "$tongtienky", "$Ghi_chu"]);
        assert_eq!(rules[1].replace, "1500");
        assert_eq!(rules[2].replace, "");
    }

    #[test]
    fn values_are_inserted_verbatim() {
        let mut r = FieldRecord::new();
        r.insert("Dia_chi", "12 Lê Lợi <Quận 1> & \"chợ\"");
        let rules = build_replacements(&r);
        assert_eq!(rules[0].replace, "12 Lê Lợi <Quận 1> & \"chợ\"");
    }

    #[test]
    fn apply_hits_paragraphs_and_cells() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::text("Trạm $ma_tram nộp $tongtienky"));
        doc.push_table(Table {
            rows: vec![Row {
                cells: vec![Cell::text("$ma_tram")],
            }],
        });

        apply_replacements(&mut doc, &build_replacements(&record()));
        assert!(doc.contains_text("Trạm ABC123 nộp 1500"));
        assert!(!doc.contains_text("$ma_tram"));
    }

    #[test]
    fn unmatched_rules_are_silent_noops() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::text("no placeholders here"));
        let before = doc.clone();
        apply_replacements(&mut doc, &build_replacements(&record()));
        assert_eq!(doc, before);
    }

    #[test]
    fn reapplying_a_batch_is_a_noop() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::text("Trạm $ma_tram"));
        let rules = build_replacements(&record());

        apply_replacements(&mut doc, &rules);
        let once = doc.clone();
        apply_replacements(&mut doc, &rules);
        assert_eq!(doc, once);
    }

    #[test]
    fn replaces_every_occurrence() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::text("$ma_tram / $ma_tram"));
        apply_replacements(&mut doc, &build_replacements(&record()));
        assert!(doc.contains_text("ABC123 / ABC123"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::text("$MA_TRAM stays"));
        apply_replacements(&mut doc, &build_replacements(&record()));
        assert!(doc.contains_text("$MA_TRAM"));
    }
}
