// Declarative extraction rule table
//
// One rule per field: prioritized patterns, a value parser, and a fixed
// confidence per pattern. Confidences are heuristic constants carried over
// from the shipped product (0.80..=0.95); they are intentionally not derived
// from OCR engine output, so downstream low-confidence highlighting keeps
// behaving the same.
use crate::scan::fields::Field;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueParser {
    /// Trimmed capture text, kept verbatim.
    Text,
    /// Thousands separators stripped, parsed as f64; non-positive and NaN
    /// parses are discarded.
    Currency,
}

pub struct Rule {
    pub field: Field,
    pub parser: ValueParser,
    /// Tried in order; the first match wins.
    pub patterns: Vec<(Regex, f32)>,
}

impl Rule {
    fn new<S: AsRef<str>>(field: Field, parser: ValueParser, patterns: &[(S, f32)]) -> Self {
        let patterns = patterns
            .iter()
            .map(|(pattern, confidence)| {
                let regex = Regex::new(pattern.as_ref()).expect("extraction pattern compiles");
                (regex, *confidence)
            })
            .collect();
        Self { field, parser, patterns }
    }
}

const AMOUNT: &str = r"([0-9][0-9,]*(?:\.\d{1,2})?)";

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            Field::EmployeeName,
            ValueParser::Text,
            &[(
                r"(?i:name\s+(?:and\s+address\s+)?of\s+(?:the\s+)?employee)\s*[:\-]?\s*([A-Za-z][A-Za-z .]{2,60})",
                0.80,
            )],
        ),
        Rule::new(
            Field::Pan,
            ValueParser::Text,
            &[
                (
                    r"(?i:PAN(?:\s+of(?:\s+the)?\s+employee)?(?:\s*(?:no\.?|number))?)\s*[:\-]?\s*([A-Z]{5}\d{4}[A-Z])",
                    0.95,
                ),
                (r"\b([A-Z]{5}\d{4}[A-Z])\b", 0.85),
            ],
        ),
        Rule::new(
            Field::EmployerTan,
            ValueParser::Text,
            &[(
                r"(?i:TAN(?:\s*(?:no\.?|of\s+(?:the\s+)?deductor))?)\s*[:\-]?\s*([A-Z]{4}\d{5}[A-Z])",
                0.90,
            )],
        ),
        Rule::new(
            Field::AssessmentYear,
            ValueParser::Text,
            &[(
                r"(?i:assessment\s+year)\s*[:\-]?\s*(20\d{2}\s*-\s*\d{2,4})",
                0.90,
            )],
        ),
        Rule::new(
            Field::GrossSalary,
            ValueParser::Currency,
            &[(
                format!(
                    r"(?i:gross\s+salary(?:\s*\([^)]*\))?)\s*[:\-]?\s*(?i:rs\.?|inr|₹)?\s*{AMOUNT}"
                ),
                0.85,
            )],
        ),
        Rule::new(
            Field::StandardDeduction,
            ValueParser::Currency,
            &[(format!(r"(?i:standard\s+deduction)[^0-9\n]*{AMOUNT}"), 0.85)],
        ),
        Rule::new(
            Field::Section80c,
            ValueParser::Currency,
            &[(format!(r"(?i:(?:section\s*)?80\s*C\b)[^0-9\n]*{AMOUNT}"), 0.80)],
        ),
        Rule::new(
            Field::Section80d,
            ValueParser::Currency,
            &[(format!(r"(?i:(?:section\s*)?80\s*D\b)[^0-9\n]*{AMOUNT}"), 0.80)],
        ),
        Rule::new(
            Field::Section80ccd1b,
            ValueParser::Currency,
            &[(
                format!(r"(?i:(?:section\s*)?80\s*CCD\s*\(?\s*1B\s*\)?)[^0-9\n]*{AMOUNT}"),
                0.80,
            )],
        ),
        Rule::new(
            Field::ProfessionalTax,
            ValueParser::Currency,
            &[(
                format!(r"(?i:(?:professional|employment)\s+tax)[^0-9\n]*{AMOUNT}"),
                0.80,
            )],
        ),
        Rule::new(
            Field::TdsTotal,
            ValueParser::Currency,
            &[
                (
                    format!(r"(?i:total\s+(?:tax\s+deducted|TDS))[^0-9\n]*{AMOUNT}"),
                    0.90,
                ),
                (
                    format!(r"(?i:tax\s+deducted\s+at\s+source)[^0-9\n]*{AMOUNT}"),
                    0.85,
                ),
            ],
        ),
    ]
});

pub fn rules() -> &'static [Rule] {
    &RULES
}
