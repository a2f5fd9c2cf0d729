use anyhow::Result;
use sales_etl::config::{AnalysisConfig, InputConfig};
use sales_etl::constants::*;
use sales_etl::pipeline::Pipeline;
use sales_etl::report::{self, Report};
use sales_etl::storage;
use sales_etl::types::{RawDatasets, RawSale};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PRODUCTS_CSV: &str = "\
Código,Descrição,Categoria,Preço Venda,Custo Aquisição,Fornecedor
P001,Mouse sem fio,Periféricos,80.00,45.00,Distribuidora Sul
P002,Headset,Áudio,250.00,150.00,Som & Cia
P003,Cabo HDMI,Cabos,-5.00,2.00,Cabos BR
";

const STOCK_CSV: &str = "\
Código Produto,Produto,Filial,Quantidade Disponível,Estoque Mínimo,Última Entrada,Lote
P001,Mouse sem fio,Filial Centro,4,10,10/01/2024,L-01
P002,Headset,Filial Centro,25,10,,
P002,Headset,Filial Norte,10,10,05/01/2024,L-07
";

const SALES_CSV: &str = "\
ID Venda,Data,Hora,Filial,Cód. Produto,Produto,Categoria,Qtd,Preço Unit.,Desconto,Valor Total
V001,05/01/2024,09:10,Filial Centro,P001,Mouse sem fio,Periféricos,2,80.00,10,144.00
V002,06/01/2024,14:30,Filial Norte,P002,Headset,Áudio,1,250.00,0,250.00
V003,31/02/2024,15:00,Filial Norte,P002,Headset,Áudio,1,250.00,0,250.00
V004,03/02/2024,19:45,Filial Centro,P777,Adaptador,Cabos,3,10.00,,30.00
V005,04/02/2024,abc,Filial Centro,P001,Mouse sem fio,Periféricos,1,80.00,0,80.00
";

fn write_inputs(dir: &Path) -> Result<InputConfig> {
    let input = InputConfig {
        products: dir.join("produtos.csv"),
        stock: dir.join("estoque_filiais.csv"),
        sales: dir.join("vendas.csv"),
    };
    fs::write(&input.products, PRODUCTS_CSV)?;
    fs::write(&input.stock, STOCK_CSV)?;
    fs::write(&input.sales, SALES_CSV)?;
    Ok(input)
}

#[test]
fn test_read_original_spreadsheet_exports() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_inputs(temp_dir.path())?;

    let raw = storage::read_datasets(&input)?;

    assert_eq!(raw.products.len(), 3);
    assert_eq!(raw.stock.len(), 3);
    assert_eq!(raw.sales.len(), 5);
    assert_eq!(raw.products[1].supplier.as_deref(), Some("Som & Cia"));
    assert_eq!(raw.stock[1].lot, None);
    assert_eq!(raw.sales[0].discount_percent, Some(10.0));
    assert_eq!(raw.sales[3].discount_percent, None);
    Ok(())
}

#[test]
fn test_missing_input_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let result = storage::read_products(&temp_dir.path().join("missing.csv"));
    assert!(result.is_err());
}

#[test]
fn test_full_run_writes_every_sheet() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_inputs(temp_dir.path())?;
    let out_dir = temp_dir.path().join("output");

    let raw = storage::read_datasets(&input)?;
    let analysis = AnalysisConfig::default();
    let output = Pipeline::with_config(&analysis).run(&raw)?;
    let report = Report::build(&output, &analysis);

    for table in report::all_tables(&output, &report) {
        storage::write_table(&out_dir, &table)?;
    }
    storage::write_json(&out_dir.join(KPIS_FILE), &report)?;

    for name in [
        TABLE_ENRICHED_SALES,
        TABLE_PRODUCTS,
        TABLE_STOCK,
        TABLE_BY_PRODUCT,
        TABLE_BY_BRANCH,
        TABLE_BY_CATEGORY,
        TABLE_BY_PERIOD,
        TABLE_OUTLIERS,
        TABLE_MONTHLY,
        TABLE_TOP_PRODUCTS,
        TABLE_STOCK_ALERTS,
        TABLE_STOCK_BY_BRANCH,
    ] {
        assert!(out_dir.join(format!("{}.csv", name)).exists(), "missing {}", name);
    }

    // Header plus one row per valid sale (V003 has an impossible date)
    let processed = fs::read_to_string(out_dir.join(format!("{}.csv", TABLE_ENRICHED_SALES)))?;
    assert_eq!(processed.lines().count(), 5);
    assert!(!processed.contains("V003"));

    let kpis: serde_json::Value = serde_json::from_str(&fs::read_to_string(out_dir.join(KPIS_FILE))?)?;
    assert_eq!(kpis["kpis"]["transactions"], 4);
    assert_eq!(kpis["kpis"]["unmatched_sales"], 1);
    assert_eq!(kpis["kpis"]["total_revenue"], 504.0);
    Ok(())
}

#[test]
fn test_derived_fields_from_csv() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_inputs(temp_dir.path())?;
    let output = Pipeline::new().run(&storage::read_datasets(&input)?)?;

    let first = &output.enriched_sales[0];
    assert_eq!(first.sale.discounted_unit_price, Some(72.0));
    assert_eq!(first.sale_profit, Some(54.0));
    assert_eq!(first.sale_margin_percent, Some(37.5));

    // Unparseable time keeps the sale without a period
    let no_time = output
        .enriched_sales
        .iter()
        .find(|s| s.sale.transaction_id == "V005")
        .expect("V005 kept");
    assert_eq!(no_time.sale.day_period, None);

    let unmatched = output
        .enriched_sales
        .iter()
        .find(|s| s.sale.transaction_id == "V004")
        .expect("V004 kept");
    assert!(!unmatched.is_matched());
    assert_eq!(unmatched.sale.discount_percent, 0.0);

    let centro_stock: Vec<_> = output
        .stock
        .rows()
        .iter()
        .filter(|s| s.branch == "Filial Centro")
        .collect();
    assert_eq!(centro_stock[1].last_restock, NO_RESTOCK_RECORD);
    assert_eq!(centro_stock[1].lot, NO_LOT);
    Ok(())
}

#[test]
fn test_infinite_totals_do_not_hide_outliers() -> Result<()> {
    let data = "\
ID Venda,Data,Cód. Produto,Qtd,Valor Total
V1,01/03/2024,P001,1,10.00
V2,02/03/2024,P001,1,11.00
V3,03/03/2024,P001,1,12.00
V4,04/03/2024,P001,1,13.00
V5,05/03/2024,P001,1,1000.00
V6,06/03/2024,P001,1,inf
V7,07/03/2024,P001,1,inf
V8,15/03/24,P001,1,12.00
";
    let sales: Vec<RawSale> = storage::read_records(data.as_bytes(), "inline")?;
    assert_eq!(sales.len(), 8);

    let raw = RawDatasets {
        sales,
        ..Default::default()
    };
    let output = Pipeline::new().run(&raw)?;

    assert_eq!(output.sales.len(), 5);
    assert_eq!(output.sales.report().rejections.get("non_positive_total"), Some(&2));
    assert_eq!(output.sales.report().rejections.get("invalid_date"), Some(&1));
    assert!(output.sales.rows().iter().all(|s| s.year == 2024));

    let fences = output.fences.expect("fences over finite totals");
    assert!(fences.upper.is_finite());
    assert_eq!(output.outliers.len(), 1);
    assert_eq!(output.outliers[0].sale.sale.transaction_id, "V5");
    Ok(())
}
