use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::anomaly::AnomalyRow;
use crate::distribution::DistributionFeatureRow;
use crate::persist::{aggregate_header, aggregate_rows, anomaly_rows, feature_rows};
use crate::pipeline::FeatureTables;

pub struct WorkbookReport {
    pub feature_rows: usize,
    pub anomaly_rows: usize,
}

pub fn export_workbook(path: &Path, tables: &FeatureTables) -> Result<WorkbookReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Features")?;
        write_rows(sheet, &DistributionFeatureRow::COLUMNS, &feature_rows(&tables.features))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Aggregates")?;
        write_rows(sheet, &aggregate_header(), &aggregate_rows(&tables.aggregates))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Anomalies")?;
        write_rows(sheet, &AnomalyRow::COLUMNS, &anomaly_rows(&tables.anomalies))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(WorkbookReport {
        feature_rows: tables.features.len(),
        anomaly_rows: tables.anomalies.len(),
    })
}

/// Header as strings, body cells as numbers wherever they parse.
fn write_rows(worksheet: &mut Worksheet, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    for (col_idx, value) in header.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *value)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let written = match value.parse::<f64>() {
                Ok(num) => worksheet.write_number(excel_row, col_idx as u16, num),
                Err(_) => worksheet.write_string(excel_row, col_idx as u16, value),
            };
            written.with_context(|| format!("write cell ({excel_row},{col_idx})"))?;
        }
    }
    Ok(())
}
