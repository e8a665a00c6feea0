use crate::domain::model::{OutageRow, Stage};
use crate::domain::ports::PageElement;
use crate::utils::error::{Result, ScrapeError};
use std::time::Duration;

/// Reads location listings rendered as a table whose first row is the
/// column header and whose last row holds the totals.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    row_selector: String,
    cell_selector: String,
}

impl TableExtractor {
    pub fn new(row_selector: impl Into<String>, cell_selector: impl Into<String>) -> Self {
        Self {
            row_selector: row_selector.into(),
            cell_selector: cell_selector.into(),
        }
    }

    pub async fn extract_rows<E: PageElement>(
        &self,
        table: &E,
        stage: Stage,
    ) -> Result<Vec<OutageRow>> {
        let rows = table.find_elements(&self.row_selector, Duration::ZERO).await?;
        let body = data_rows(&rows, stage)?;

        let mut cells = Vec::with_capacity(body.len());
        for row in body {
            let mut texts = Vec::new();
            for cell in row.find_elements(&self.cell_selector, Duration::ZERO).await? {
                texts.push(cell.text().await?);
            }
            cells.push(texts);
        }

        rows_from_cells(cells, stage)
    }
}

/// Drops the header and totals rows.
fn data_rows<T>(rows: &[T], stage: Stage) -> Result<&[T]> {
    if rows.len() < 2 {
        return Err(ScrapeError::mismatch(
            stage,
            format!(
                "location table has {} rows, expected a header and a totals row",
                rows.len()
            ),
        ));
    }
    Ok(&rows[1..rows.len() - 1])
}

pub(crate) fn rows_from_cells(cells: Vec<Vec<String>>, stage: Stage) -> Result<Vec<OutageRow>> {
    cells
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let mut row = row.into_iter().map(|text| text.trim().to_string());
            match (row.next(), row.next(), row.next()) {
                (Some(name), _, _) if name.is_empty() => Err(ScrapeError::mismatch(
                    stage,
                    format!("location table row {} has a blank name", index + 1),
                )),
                (Some(name), Some(a), Some(b)) => Ok(OutageRow::new(name, a, b)),
                _ => Err(ScrapeError::mismatch(
                    stage,
                    format!("location table row {} has fewer than 3 cells", index + 1),
                )),
            }
        })
        .collect()
}

/// Rows whose indicators report an outage.
pub fn outage_rows(rows: Vec<OutageRow>) -> impl Iterator<Item = OutageRow> {
    rows.into_iter().filter(OutageRow::has_outage)
}
