use super::{REQUIRED_FIELDS, TransactionRecord, ValidationError};

use std::str::FromStr;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::hashing;

fn create_row() -> Vec<String> {
    let fields = [
        "1001", "КБ7", "Платіжне доручення", "DOC-17", "2024-01-15", "2024-01-16",
        "2024-01-17", "1500.50", "150050", "UAH", "12345678", "Payer LLC",
        "UA120000000001", "300001", "Bank A", "", "", "87654321", "Recipient LLC",
        "UA540000000002", "300002", "Bank B", "", "", "Payment for services",
        "", "5", "regular", "", "2", "Treasury", "2240", "KPK-1", "C-77",
        "CN-88", "BC-9", "SK-1", "SKFF-2",
    ];

    fields.iter().map(|field| field.to_string()).collect()
}

#[test]
fn test_parse_decodes_typed_fields() -> Result<()> {
    let record = TransactionRecord::parse(&create_row())?;

    assert_eq!(record.id, Some(1001));
    assert_eq!(record.doc_date, Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
    assert_eq!(record.amount, Some(Decimal::from_str("1500.50")?));
    assert_eq!(record.currency.as_deref(), Some("UAH"));
    assert_eq!(record.region_id, Some(5));
    assert_eq!(record.kekv, Some(2240));
    assert!(record.hash.is_none());

    Ok(())
}

#[test]
fn test_parse_trims_surrounding_whitespace() -> Result<()> {
    let mut row = create_row();
    row[0] = "  1001  ".to_string();
    row[9] = "\tUAH ".to_string();

    let record = TransactionRecord::parse(&row)?;

    assert_eq!(record.id, Some(1001));
    assert_eq!(record.currency.as_deref(), Some("UAH"));

    Ok(())
}

#[test]
fn test_parse_decodes_blank_fields_as_absent() -> Result<()> {
    let mut row = create_row();
    row[0] = String::new();
    row[4] = "   ".to_string();
    row[7] = String::new();
    row[11] = " ".to_string();

    let record = TransactionRecord::parse(&row)?;

    assert!(record.id.is_none());
    assert!(record.doc_date.is_none());
    assert!(record.amount.is_none());
    assert!(record.payer_name.is_none());

    Ok(())
}

#[test]
fn test_parse_preserves_decimal_scale_exactly() -> Result<()> {
    let mut row = create_row();
    row[7] = "10.5000".to_string();

    let record = TransactionRecord::parse(&row)?;

    assert_eq!(record.canonical_fields()[7], "10.5000");

    Ok(())
}

#[test]
fn test_parse_rejects_row_with_too_few_fields() {
    let row = create_row()[..REQUIRED_FIELDS - 1].to_vec();
    let result = TransactionRecord::parse(&row);

    assert!(matches!(result, Err(ValidationError::TooFewFields { got: 37, .. })));
}

#[test]
fn test_parse_rejects_non_numeric_amount() {
    let mut row = create_row();
    row[7] = "not-a-number".to_string();

    let result = TransactionRecord::parse(&row);

    assert!(matches!(result, Err(ValidationError::MalformedField { index: 7, .. })));
}

#[test]
fn test_parse_rejects_malformed_date() {
    let mut row = create_row();
    row[6] = "15.01.2024".to_string();

    let result = TransactionRecord::parse(&row);

    assert!(matches!(result, Err(ValidationError::MalformedField { name: "trans_date", .. })));
}

#[test]
fn test_parse_rejects_fractional_integer_field() {
    let mut row = create_row();
    row[26] = "5.5".to_string();

    let result = TransactionRecord::parse(&row);

    assert!(matches!(result, Err(ValidationError::MalformedField { name: "region_id", .. })));
}

#[test]
fn test_parse_ignores_fields_beyond_the_38th() -> Result<()> {
    let mut row = create_row();
    row.push("extra".to_string());

    let record = TransactionRecord::parse(&row)?;

    assert_eq!(record.canonical_fields().len(), REQUIRED_FIELDS);

    Ok(())
}

#[test]
fn test_canonical_fields_render_absent_values_as_empty_strings() -> Result<()> {
    let mut row = create_row();
    row[0] = String::new();
    row[7] = String::new();

    let record = TransactionRecord::parse(&row)?;
    let fields = record.canonical_fields();

    assert_eq!(fields.len(), REQUIRED_FIELDS);
    assert_eq!(fields[0], "");
    assert_eq!(fields[7], "");
    assert!(fields.iter().all(|field| field != "null"));

    Ok(())
}

#[test]
fn test_attach_hash_digests_the_canonical_fields() -> Result<()> {
    let mut record = TransactionRecord::parse(&create_row())?;
    let expected = hashing::hash_fields(&record.canonical_fields());

    record.attach_hash();

    assert_eq!(record.hash.as_deref(), Some(expected.as_str()));

    Ok(())
}

#[test]
fn test_hash_is_stable_under_re_derivation() -> Result<()> {
    // Re-parsing the emitted canonical fields and recomputing the hash must
    // reproduce the original digest.
    let mut record = TransactionRecord::parse(&create_row())?;
    record.attach_hash();

    let mut reparsed = TransactionRecord::parse(&record.canonical_fields())?;
    reparsed.attach_hash();

    assert_eq!(reparsed.hash, record.hash);

    Ok(())
}
