// Rule-table extraction over realistic Form-16 text fragments.
use chronyx::scan::{extract_fields, Field};
use rstest::rstest;

const SAMPLE: &str = "\
FORM NO. 16
Certificate under Section 203 of the Income-tax Act, 1961
Name and address of the employee: Asha Verma
PAN of the employee: ABCDE1234F
TAN of the deductor: DELA12345B
Assessment Year: 2025-26
Gross Salary Rs. 12,50,000
Standard Deduction 50,000
Deduction under section 80C 1,50,000
Deduction under section 80D 25,000
Deduction under section 80CCD(1B) 50,000
Professional Tax 2,400
Total tax deducted at source 1,17,000
";

#[test]
fn full_document_yields_every_field() {
    let fields = extract_fields(SAMPLE);
    for field in [
        Field::EmployeeName,
        Field::Pan,
        Field::EmployerTan,
        Field::AssessmentYear,
        Field::GrossSalary,
        Field::StandardDeduction,
        Field::Section80c,
        Field::Section80d,
        Field::Section80ccd1b,
        Field::ProfessionalTax,
        Field::TdsTotal,
    ] {
        assert!(fields.contains(field), "missing {field:?}");
    }
}

#[test]
fn amounts_parse_without_separators() {
    let fields = extract_fields(SAMPLE);
    assert_eq!(fields.get(Field::GrossSalary).unwrap().value.as_amount(), Some(1_250_000.0));
    assert_eq!(fields.get(Field::Section80c).unwrap().value.as_amount(), Some(150_000.0));
    assert_eq!(fields.get(Field::TdsTotal).unwrap().value.as_amount(), Some(117_000.0));
}

#[test]
fn labeled_pan_outranks_the_bare_fallback() {
    let fields = extract_fields(SAMPLE);
    assert_eq!(fields.get(Field::Pan).unwrap().confidence, 0.95);
    // TAN must not be mistaken for a bare PAN: formats differ.
    assert_eq!(fields.get(Field::EmployerTan).unwrap().value.as_text(), Some("DELA12345B"));
}

#[test]
fn empty_text_produces_an_empty_set() {
    assert!(extract_fields("").is_empty());
}

#[rstest]
#[case("PAN: ABCDE1234F", Field::Pan, Some("ABCDE1234F"))]
#[case("PAN No. XYZAB9876K", Field::Pan, Some("XYZAB9876K"))]
#[case("pan number : ABCDE1234F", Field::Pan, Some("ABCDE1234F"))]
#[case("PAN: ABC1234567", Field::Pan, None)]
#[case("TAN of deductor MUMB12345C", Field::EmployerTan, Some("MUMB12345C"))]
#[case("Assessment Year: 2024-25", Field::AssessmentYear, Some("2024-25"))]
#[case("Assessment Year 2024 - 2025", Field::AssessmentYear, Some("2024 - 2025"))]
fn text_cases(#[case] text: &str, #[case] field: Field, #[case] expected: Option<&str>) {
    let fields = extract_fields(text);
    let got = fields.get(field).and_then(|f| f.value.as_text());
    assert_eq!(got, expected, "text: {text:?}");
}

#[rstest]
#[case("Gross Salary: Rs. 12,50,000", Field::GrossSalary, Some(1_250_000.0))]
#[case("Gross Salary INR 9,00,000.50", Field::GrossSalary, Some(900_000.5))]
#[case("Gross Salary 840000", Field::GrossSalary, Some(840_000.0))]
#[case("Standard Deduction 50,000", Field::StandardDeduction, Some(50_000.0))]
#[case("80C 1,50,000", Field::Section80c, Some(150_000.0))]
#[case("Section 80D : 25,000", Field::Section80d, Some(25_000.0))]
#[case("80CCD(1B) 50,000", Field::Section80ccd1b, Some(50_000.0))]
#[case("Professional Tax 2,400", Field::ProfessionalTax, Some(2_400.0))]
#[case("Total TDS 1,17,000", Field::TdsTotal, Some(117_000.0))]
#[case("Net Salary: 8,00,000", Field::GrossSalary, None)]
fn amount_cases(#[case] text: &str, #[case] field: Field, #[case] expected: Option<f64>) {
    let fields = extract_fields(text);
    let got = fields.get(field).and_then(|f| f.value.as_amount());
    assert_eq!(got, expected, "text: {text:?}");
}
