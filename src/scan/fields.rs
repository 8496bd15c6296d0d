// Extracted field model
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed set of semantic Form-16 fields the scanner knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    EmployeeName,
    Pan,
    EmployerTan,
    AssessmentYear,
    GrossSalary,
    StandardDeduction,
    Section80c,
    Section80d,
    Section80ccd1b,
    ProfessionalTax,
    TdsTotal,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::EmployeeName => "Employee name",
            Field::Pan => "PAN",
            Field::EmployerTan => "Employer TAN",
            Field::AssessmentYear => "Assessment year",
            Field::GrossSalary => "Gross salary",
            Field::StandardDeduction => "Standard deduction",
            Field::Section80c => "Section 80C",
            Field::Section80d => "Section 80D",
            Field::Section80ccd1b => "Section 80CCD(1B)",
            Field::ProfessionalTax => "Professional tax",
            Field::TdsTotal => "Total TDS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Amount(_) => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

/// One extracted value with its heuristic confidence. Confidences are fixed
/// per pattern (0.80..=0.95), not derived from OCR output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: FieldValue,
    pub confidence: f32,
}

/// Sparse mapping from fields to extracted values: a field is present only
/// if one of its patterns matched. Absent means absent, never null or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<Field, ExtractedField>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, value: FieldValue, confidence: f32) {
        self.0.insert(field, ExtractedField { value, confidence });
    }

    pub fn get(&self, field: Field) -> Option<&ExtractedField> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &ExtractedField)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_stay_out_of_json() {
        let mut set = FieldSet::new();
        set.insert(Field::Pan, FieldValue::Text("ABCDE1234F".into()), 0.95);
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("pan"));
        assert!(!json.contains("gross_salary"));
    }

    #[test]
    fn amounts_serialize_as_numbers() {
        let mut set = FieldSet::new();
        set.insert(Field::GrossSalary, FieldValue::Amount(1250000.0), 0.85);
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("1250000"));
    }
}
