use std::io::Write;
use std::process::Command;

use anyhow::{Result, anyhow};
use tempfile::NamedTempFile;

const HEADER: &str = "id,doc_vob,doc_vob_name,doc_number,doc_date,doc_v_date,trans_date,\
amount,amount_cop,currency,payer_edrpou,payer_name,payer_account,payer_mfo,payer_bank,\
payer_edrpou_fact,payer_name_fact,recipient_edrpou,recipient_name,recipient_account,\
recipient_mfo,recipient_bank,recipient_edrpou_fact,recipient_name_fact,payment_details,\
doc_add_attr,region_id,payment_type,payment_data,source_id,source_name,kekv,kpk,\
contract_id,contract_number,budget_code,system_key,system_key_ff";

fn sample_row(id: usize, amount: &str) -> String {
    format!(
        "{id},VB,PaymentOrder,DOC-{id},2024-01-15,2024-01-16,2024-01-17,{amount},0,UAH,\
         12345678,PayerLLC,UA1200000001,300001,BankA,,,87654321,RecipientLLC,\
         UA5400000002,300002,BankB,,,Services,,5,regular,,2,Treasury,2240,\
         KPK-1,C-77,CN-88,BC-9,SK-{id},SKFF-{id}"
    )
}

fn create_temporary_csv(rows: &[String]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;

    writeln!(file, "{}", HEADER)?;

    for row in rows {
        writeln!(file, "{}", row)?;
    }

    Ok(file)
}

#[test]
fn test_cli_appends_hash_column_to_every_row() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_transaction-hash-stream");
    let file = create_temporary_csv(&[
        sample_row(1, "1500.50"),
        sample_row(2, "not-a-number"),
        sample_row(3, "0.01"),
    ])?;

    let output = Command::new(binary_path)
        .arg(file.path())
        .output()?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let mut lines = stdout.lines();

    let header = lines.next().ok_or_else(|| anyhow!("Header line missing from output"))?;

    assert_eq!(header, format!("{},hash", HEADER));

    let mut rows = 0;

    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        let hash = fields.last().ok_or_else(|| anyhow!("Row has no fields"))?;

        assert_eq!(fields.len(), 39);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        rows += 1;
    }

    assert_eq!(rows, 3);

    Ok(())
}

#[test]
fn test_cli_fails_on_empty_input() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_transaction-hash-stream");
    let file = NamedTempFile::new()?;

    let output = Command::new(binary_path)
        .arg(file.path())
        .output()?;

    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_cli_fails_on_missing_input_file() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_transaction-hash-stream");

    let output = Command::new(binary_path)
        .arg("missing.csv")
        .output()?;

    assert!(!output.status.success());

    Ok(())
}
