use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::hashing;
use crate::models::errors::ValidationError;

/// Number of positional fields a source row must carry.
pub const REQUIRED_FIELDS: usize = 38;

/// The structured decoding of one source CSV row.
///
/// Every field is independently nullable: blank or whitespace-only input
/// decodes to `None`, and `None` serializes back to an empty field, never
/// the literal word "null". The `hash` field is absent until
/// [`TransactionRecord::attach_hash`] computes it.
///
/// A record lives for exactly one row's processing: built from the raw
/// fields, hashed once, serialized to the output, then dropped.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub id: Option<i64>,
    pub doc_vob: Option<String>,
    pub doc_vob_name: Option<String>,
    pub doc_number: Option<String>,
    pub doc_date: Option<NaiveDate>,
    pub doc_v_date: Option<NaiveDate>,
    pub trans_date: Option<NaiveDate>,
    /// Transaction amount, parsed with exact decimal precision.
    pub amount: Option<Decimal>,
    pub amount_cop: Option<Decimal>,
    pub currency: Option<String>,
    pub payer_edrpou: Option<String>,
    pub payer_name: Option<String>,
    pub payer_account: Option<String>,
    pub payer_mfo: Option<String>,
    pub payer_bank: Option<String>,
    pub payer_edrpou_fact: Option<String>,
    pub payer_name_fact: Option<String>,
    pub recipient_edrpou: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_account: Option<String>,
    pub recipient_mfo: Option<String>,
    pub recipient_bank: Option<String>,
    pub recipient_edrpou_fact: Option<String>,
    pub recipient_name_fact: Option<String>,
    pub payment_details: Option<String>,
    pub doc_add_attr: Option<String>,
    pub region_id: Option<i32>,
    pub payment_type: Option<String>,
    pub payment_data: Option<String>,
    pub source_id: Option<i32>,
    pub source_name: Option<String>,
    pub kekv: Option<i32>,
    pub kpk: Option<String>,
    pub contract_id: Option<String>,
    pub contract_number: Option<String>,
    pub budget_code: Option<String>,
    pub system_key: Option<String>,
    pub system_key_ff: Option<String>,
    /// Content hash over the 38 canonical field values, appended last.
    pub hash: Option<String>,
}

impl TransactionRecord {
    /// Decodes a raw row of at least [`REQUIRED_FIELDS`] positional fields.
    ///
    /// Fields beyond the 38th are ignored. Numeric fields take a decimal
    /// parse of the trimmed content, amounts an exact-precision decimal
    /// parse, dates an ISO `YYYY-MM-DD` parse. The first field that fails
    /// to parse fails the whole row.
    ///
    /// # Errors
    /// Returns `ValidationError` if the row has fewer than 38 fields or any
    /// field content is malformed for its target type.
    pub fn parse(fields: &[String]) -> Result<Self, ValidationError> {
        if fields.len() < REQUIRED_FIELDS {
            return Err(ValidationError::too_few_fields(fields.len()));
        }

        Ok(Self {
            id: parse_value(fields, 0, "id")?,
            doc_vob: parse_text(fields, 1),
            doc_vob_name: parse_text(fields, 2),
            doc_number: parse_text(fields, 3),
            doc_date: parse_value(fields, 4, "doc_date")?,
            doc_v_date: parse_value(fields, 5, "doc_v_date")?,
            trans_date: parse_value(fields, 6, "trans_date")?,
            amount: parse_value(fields, 7, "amount")?,
            amount_cop: parse_value(fields, 8, "amount_cop")?,
            currency: parse_text(fields, 9),
            payer_edrpou: parse_text(fields, 10),
            payer_name: parse_text(fields, 11),
            payer_account: parse_text(fields, 12),
            payer_mfo: parse_text(fields, 13),
            payer_bank: parse_text(fields, 14),
            payer_edrpou_fact: parse_text(fields, 15),
            payer_name_fact: parse_text(fields, 16),
            recipient_edrpou: parse_text(fields, 17),
            recipient_name: parse_text(fields, 18),
            recipient_account: parse_text(fields, 19),
            recipient_mfo: parse_text(fields, 20),
            recipient_bank: parse_text(fields, 21),
            recipient_edrpou_fact: parse_text(fields, 22),
            recipient_name_fact: parse_text(fields, 23),
            payment_details: parse_text(fields, 24),
            doc_add_attr: parse_text(fields, 25),
            region_id: parse_value(fields, 26, "region_id")?,
            payment_type: parse_text(fields, 27),
            payment_data: parse_text(fields, 28),
            source_id: parse_value(fields, 29, "source_id")?,
            source_name: parse_text(fields, 30),
            kekv: parse_value(fields, 31, "kekv")?,
            kpk: parse_text(fields, 32),
            contract_id: parse_text(fields, 33),
            contract_number: parse_text(fields, 34),
            budget_code: parse_text(fields, 35),
            system_key: parse_text(fields, 36),
            system_key_ff: parse_text(fields, 37),
            hash: None,
        })
    }

    /// Computes the content hash over the canonical field values and stores
    /// it on the record. Must run before serialization so the emitted row
    /// carries the digest of its own first 38 fields.
    pub fn attach_hash(&mut self) {
        self.hash = Some(hashing::hash_fields(&self.canonical_fields()));
    }

    /// The canonical string form of the 38 data fields, in output order.
    /// Absent values render as empty strings.
    pub fn canonical_fields(&self) -> Vec<String> {
        vec![
            canonical(&self.id),
            canonical(&self.doc_vob),
            canonical(&self.doc_vob_name),
            canonical(&self.doc_number),
            canonical(&self.doc_date),
            canonical(&self.doc_v_date),
            canonical(&self.trans_date),
            canonical(&self.amount),
            canonical(&self.amount_cop),
            canonical(&self.currency),
            canonical(&self.payer_edrpou),
            canonical(&self.payer_name),
            canonical(&self.payer_account),
            canonical(&self.payer_mfo),
            canonical(&self.payer_bank),
            canonical(&self.payer_edrpou_fact),
            canonical(&self.payer_name_fact),
            canonical(&self.recipient_edrpou),
            canonical(&self.recipient_name),
            canonical(&self.recipient_account),
            canonical(&self.recipient_mfo),
            canonical(&self.recipient_bank),
            canonical(&self.recipient_edrpou_fact),
            canonical(&self.recipient_name_fact),
            canonical(&self.payment_details),
            canonical(&self.doc_add_attr),
            canonical(&self.region_id),
            canonical(&self.payment_type),
            canonical(&self.payment_data),
            canonical(&self.source_id),
            canonical(&self.source_name),
            canonical(&self.kekv),
            canonical(&self.kpk),
            canonical(&self.contract_id),
            canonical(&self.contract_number),
            canonical(&self.budget_code),
            canonical(&self.system_key),
            canonical(&self.system_key_ff),
        ]
    }
}

fn canonical<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn parse_text(fields: &[String], index: usize) -> Option<String> {
    let trimmed = fields[index].trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_value<T: FromStr>(fields: &[String], index: usize, name: &'static str) -> Result<Option<T>, ValidationError> {
    let trimmed = fields[index].trim();

    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed.parse()
        .map(Some)
        .map_err(|_| ValidationError::malformed_field(index, name, trimmed))
}
