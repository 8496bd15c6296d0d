// Field extraction: run the rule table over flattened document text.
use crate::scan::fields::{FieldSet, FieldValue};
use crate::scan::rules::{rules, ValueParser};

/// Apply every extraction rule to `text` and collect the matches.
///
/// Per field, patterns are tried in priority order and the first match ends
/// the search for that field, even when its captured value fails to parse.
/// A field whose value cannot be parsed is simply omitted.
pub fn extract_fields(text: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    for rule in rules() {
        for (pattern, confidence) in &rule.patterns {
            let Some(captures) = pattern.captures(text) else {
                continue;
            };
            let raw = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            match rule.parser {
                ValueParser::Text => {
                    if !raw.is_empty() {
                        fields.insert(rule.field, FieldValue::Text(raw.to_string()), *confidence);
                    }
                }
                ValueParser::Currency => {
                    if let Some(amount) = parse_amount(raw) {
                        fields.insert(rule.field, FieldValue::Amount(amount), *confidence);
                    } else {
                        log::debug!("{:?}: unparseable amount {raw:?}, skipping", rule.field);
                    }
                }
            }
            break;
        }
    }
    fields
}

/// Indian-format currency capture to f64: strips commas and spaces, rejects
/// anything non-finite or non-positive.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}
