// Filing wizard: an explicit state machine over the form steps.
//
// Each forward transition has a guard over the form contents; a failed guard
// returns a typed error naming what is missing instead of silently staying
// put. Backward navigation never validates.
use crate::scan::{Field, FieldSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SECTION_80C_CAP: f64 = 150_000.0;
pub const SECTION_80CCD_1B_CAP: f64 = 50_000.0;

static PAN_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{5}\d{4}[A-Z]$").expect("PAN pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    PersonalInfo,
    Income,
    Deductions,
    TaxReview,
    Complete,
}

#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("cannot leave {step:?}: {reason}")]
    Blocked { step: WizardStep, reason: String },
    #[error("already at the first step")]
    AtStart,
    #[error("filing is already complete")]
    Finished,
}

/// The working copy of the filing. Scanned fields pre-fill it; the user can
/// overwrite anything before review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilingForm {
    pub employee_name: String,
    pub pan: String,
    pub employer_tan: Option<String>,
    pub assessment_year: Option<String>,
    pub gross_salary: f64,
    pub standard_deduction: f64,
    pub section_80c: f64,
    pub section_80d: f64,
    pub section_80ccd_1b: f64,
    pub professional_tax: f64,
    pub tds_total: f64,
}

impl FilingForm {
    /// Pre-fill from a scan. Only fields the scan produced are touched.
    pub fn apply_fields(&mut self, fields: &FieldSet) {
        for (field, extracted) in fields.iter() {
            match field {
                Field::EmployeeName => {
                    if let Some(v) = extracted.value.as_text() {
                        self.employee_name = v.to_string();
                    }
                }
                Field::Pan => {
                    if let Some(v) = extracted.value.as_text() {
                        self.pan = v.to_string();
                    }
                }
                Field::EmployerTan => {
                    self.employer_tan = extracted.value.as_text().map(str::to_string);
                }
                Field::AssessmentYear => {
                    self.assessment_year = extracted.value.as_text().map(str::to_string);
                }
                Field::GrossSalary => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.gross_salary = v;
                    }
                }
                Field::StandardDeduction => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.standard_deduction = v;
                    }
                }
                Field::Section80c => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.section_80c = v;
                    }
                }
                Field::Section80d => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.section_80d = v;
                    }
                }
                Field::Section80ccd1b => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.section_80ccd_1b = v;
                    }
                }
                Field::ProfessionalTax => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.professional_tax = v;
                    }
                }
                Field::TdsTotal => {
                    if let Some(v) = extracted.value.as_amount() {
                        self.tds_total = v;
                    }
                }
            }
        }
    }

    pub fn has_valid_pan(&self) -> bool {
        PAN_FORMAT.is_match(&self.pan)
    }
}

pub struct FilingWizard {
    step: WizardStep,
    pub form: FilingForm,
}

impl Default for FilingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl FilingWizard {
    pub fn new() -> Self {
        Self { step: WizardStep::PersonalInfo, form: FilingForm::default() }
    }

    pub fn with_form(form: FilingForm) -> Self {
        Self { step: WizardStep::PersonalInfo, form }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step == WizardStep::Complete
    }

    /// Move forward one step if the current step's guard passes.
    pub fn advance(&mut self) -> Result<WizardStep, StepError> {
        let next = match self.step {
            WizardStep::PersonalInfo => {
                if self.form.employee_name.trim().is_empty() {
                    return self.blocked("employee name is required");
                }
                if !self.form.has_valid_pan() {
                    return self.blocked("a valid PAN is required");
                }
                WizardStep::Income
            }
            WizardStep::Income => {
                if self.form.gross_salary <= 0.0 {
                    return self.blocked("gross salary must be positive");
                }
                WizardStep::Deductions
            }
            WizardStep::Deductions => {
                if self.form.section_80c > SECTION_80C_CAP {
                    return self.blocked("section 80C claim exceeds the statutory cap");
                }
                if self.form.section_80ccd_1b > SECTION_80CCD_1B_CAP {
                    return self.blocked("section 80CCD(1B) claim exceeds the statutory cap");
                }
                WizardStep::TaxReview
            }
            WizardStep::TaxReview => WizardStep::Complete,
            WizardStep::Complete => return Err(StepError::Finished),
        };
        self.step = next;
        Ok(next)
    }

    /// Move back one step. Completion is final.
    pub fn back(&mut self) -> Result<WizardStep, StepError> {
        let previous = match self.step {
            WizardStep::PersonalInfo => return Err(StepError::AtStart),
            WizardStep::Income => WizardStep::PersonalInfo,
            WizardStep::Deductions => WizardStep::Income,
            WizardStep::TaxReview => WizardStep::Deductions,
            WizardStep::Complete => return Err(StepError::Finished),
        };
        self.step = previous;
        Ok(previous)
    }

    fn blocked(&self, reason: &str) -> Result<WizardStep, StepError> {
        Err(StepError::Blocked { step: self.step, reason: reason.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::FieldValue;

    fn filled_form() -> FilingForm {
        FilingForm {
            employee_name: "A Sharma".into(),
            pan: "ABCDE1234F".into(),
            gross_salary: 1_250_000.0,
            section_80c: 150_000.0,
            ..FilingForm::default()
        }
    }

    #[test]
    fn missing_pan_blocks_the_first_step() {
        let mut wizard = FilingWizard::new();
        wizard.form.employee_name = "A Sharma".into();
        let err = wizard.advance().unwrap_err();
        assert!(matches!(err, StepError::Blocked { step: WizardStep::PersonalInfo, .. }));
        assert_eq!(wizard.step(), WizardStep::PersonalInfo);
    }

    #[test]
    fn lowercase_pan_is_not_valid() {
        let mut form = filled_form();
        form.pan = "abcde1234f".into();
        assert!(!form.has_valid_pan());
    }

    #[test]
    fn happy_path_reaches_completion() {
        let mut wizard = FilingWizard::with_form(filled_form());
        assert_eq!(wizard.advance().unwrap(), WizardStep::Income);
        assert_eq!(wizard.advance().unwrap(), WizardStep::Deductions);
        assert_eq!(wizard.advance().unwrap(), WizardStep::TaxReview);
        assert_eq!(wizard.advance().unwrap(), WizardStep::Complete);
        assert!(wizard.is_complete());
        assert_eq!(wizard.advance().unwrap_err(), StepError::Finished);
    }

    #[test]
    fn over_cap_80c_blocks_deductions() {
        let mut form = filled_form();
        form.section_80c = 200_000.0;
        let mut wizard = FilingWizard::with_form(form);
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        let err = wizard.advance().unwrap_err();
        assert!(matches!(err, StepError::Blocked { step: WizardStep::Deductions, .. }));
    }

    #[test]
    fn back_never_validates() {
        let mut form = filled_form();
        form.section_80c = 999_999.0;
        let mut wizard = FilingWizard::with_form(form);
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.back().unwrap(), WizardStep::Income);
        assert_eq!(wizard.back().unwrap(), WizardStep::PersonalInfo);
        assert_eq!(wizard.back().unwrap_err(), StepError::AtStart);
    }

    #[test]
    fn scan_results_prefill_the_form() {
        let mut fields = FieldSet::new();
        fields.insert(Field::Pan, FieldValue::Text("ABCDE1234F".into()), 0.95);
        fields.insert(Field::GrossSalary, FieldValue::Amount(900_000.0), 0.85);
        let mut form = FilingForm::default();
        form.apply_fields(&fields);
        assert_eq!(form.pan, "ABCDE1234F");
        assert_eq!(form.gross_salary, 900_000.0);
        assert!(form.employer_tan.is_none());
    }
}
