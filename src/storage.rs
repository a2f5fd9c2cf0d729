//! CSV and JSON file access for the pipeline's inputs and outputs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::InputConfig;
use crate::error::Result;
use crate::report::Table;
use crate::types::{RawDatasets, RawProduct, RawSale, RawStock};

/// Read every deserializable record from a headed CSV source. Records that
/// cannot be read at all are skipped with a warning.
pub fn read_records<T, R>(source: R, label: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (i, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(source = label, record = i + 1, "Skipping malformed CSV record: {}", e);
            }
        }
    }

    debug!(source = label, read = records.len(), skipped, "Read CSV records");
    Ok(records)
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)?;
    let label = path.display().to_string();
    let records = read_records(file, &label)?;
    info!("📥 Read {} rows from {}", records.len(), label);
    Ok(records)
}

pub fn read_products(path: &Path) -> Result<Vec<RawProduct>> {
    read_csv(path)
}

pub fn read_stock(path: &Path) -> Result<Vec<RawStock>> {
    read_csv(path)
}

pub fn read_sales(path: &Path) -> Result<Vec<RawSale>> {
    read_csv(path)
}

/// Load the three raw datasets named by the input configuration
pub fn read_datasets(input: &InputConfig) -> Result<RawDatasets> {
    Ok(RawDatasets {
        products: read_products(&input.products)?,
        stock: read_stock(&input.stock)?,
        sales: read_sales(&input.sales)?,
    })
}

/// Write a table as `<dir>/<name>.csv`, creating the directory if needed
pub fn write_table(dir: &Path, table: &Table) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.csv", table.name));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = table.len(), "Wrote table");
    Ok(path)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_original_headers() {
        let data = "Código,Descrição,Categoria,Preço Venda,Custo Aquisição,Fornecedor\n\
                    P1, Teclado ,Periféricos,200.0,120.0,Acme\n\
                    P2,Mouse,Periféricos,abc,20.0,Acme\n";
        let rows: Vec<RawProduct> = read_records(data.as_bytes(), "inline").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code.as_deref(), Some("P1"));
        assert_eq!(rows[0].description.as_deref(), Some("Teclado"));
        assert_eq!(rows[0].sale_price, Some(200.0));
        // Unparseable numbers reach the validator as absent
        assert_eq!(rows[1].sale_price, None);
    }

    #[test]
    fn test_read_english_headers_and_blank_cells() {
        let data = "transaction_id,product_code,date,quantity,total_value,time\n\
                    V1,P1,01/01/2024,2,50.5,10:00\n\
                    V2,P1,02/01/2024,,,\n";
        let rows: Vec<RawSale> = read_records(data.as_bytes(), "inline").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity, Some(2));
        assert_eq!(rows[0].total_value, Some(50.5));
        assert_eq!(rows[1].date.as_deref(), Some("02/01/2024"));
        assert_eq!(rows[1].quantity, None);
        assert_eq!(rows[1].total_value, None);
    }

    #[test]
    fn test_write_table_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::new("sample", &["a", "b"]);
        table.push(vec!["1".to_string(), "x,y".to_string()]);

        let path = write_table(dir.path(), &table).unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, "a,b\n1,\"x,y\"\n");

        let json_path = dir.path().join("nested").join("doc.json");
        write_json(&json_path, &serde_json::json!({ "ok": true })).unwrap();
        assert!(fs::read_to_string(json_path).unwrap().contains("\"ok\": true"));
    }
}
