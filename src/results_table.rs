use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use tracing::debug;

use crate::config::MAIN_NUMBERS;
use crate::draw::{DrawHistory, DrawId, DrawRecord, normalize_digit};
use crate::html_table::{Table, extract_tables};

const DATE_LABELS: [&str; 2] = ["抽せん日", "抽選日"];
const FIRST_PRIZE_LABEL: &str = "1等";
const DRAW_ID_LABEL: &str = "回号";
const MAIN_LABEL: &str = "本数字";
const BONUS_LABEL: &str = "ボーナス数字";
const LIST_ROW_CELLS: usize = 2 + MAIN_NUMBERS + 1;

pub fn parse_results_page(html: &str) -> Result<Vec<DrawRecord>> {
    normalize_tables(&extract_tables(html))
}

/// Turn the tables of one page into draws. Tables mentioning a draw date are
/// the result tables; when none do, every table is tried.
pub fn normalize_tables(tables: &[Table]) -> Result<Vec<DrawRecord>> {
    let mut targets: Vec<&Table> = tables
        .iter()
        .filter(|t| table_contains(t, &DATE_LABELS))
        .collect();
    if targets.is_empty() {
        targets = tables.iter().collect();
    }

    let mut out = Vec::new();
    for table in targets {
        if table_contains(table, &[FIRST_PRIZE_LABEL]) {
            out.push(parse_detail_table(table)?);
        } else {
            out.extend(parse_list_table(table)?);
        }
    }
    Ok(out)
}

/// Merge the draws of many pages; a draw seen again replaces the earlier copy.
pub fn merge_pages<I>(pages: I) -> Result<DrawHistory>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut by_id: BTreeMap<DrawId, DrawRecord> = BTreeMap::new();
    for (label, html) in pages {
        let draws = parse_results_page(&html).with_context(|| format!("page {label}"))?;
        debug!(page = %label, draws = draws.len(), "parsed results page");
        for draw in draws {
            by_id.insert(draw.draw_id, draw);
        }
    }
    Ok(DrawHistory::new(by_id.into_values().collect())?)
}

fn table_contains(table: &Table, needles: &[&str]) -> bool {
    table
        .iter()
        .flatten()
        .any(|cell| needles.iter().any(|n| cell.contains(n)))
}

fn parse_detail_table(table: &Table) -> Result<DrawRecord> {
    let draw_id = table
        .iter()
        .find(|row| row.first().is_some_and(|c| c == DRAW_ID_LABEL))
        .and_then(|row| row.iter().skip(1).find_map(|c| DrawId::parse(c)))
        .or_else(|| table.iter().flatten().find_map(|c| labelled_draw_id(c)))
        .ok_or_else(|| anyhow!("detail table has no draw id"))?;

    let date_row = labelled_row(table, &DATE_LABELS)
        .ok_or_else(|| anyhow!("draw {draw_id}: missing date row"))?;
    let draw_date = date_row
        .iter()
        .skip(1)
        .find_map(|c| parse_draw_date(c))
        .ok_or_else(|| anyhow!("draw {draw_id}: unreadable date {:?}", date_row.get(1)))?;

    let main_row = labelled_row(table, &[MAIN_LABEL])
        .ok_or_else(|| anyhow!("draw {draw_id}: missing main numbers row"))?;
    let main = main_row
        .iter()
        .skip(1)
        .take(MAIN_NUMBERS)
        .map(|c| parse_number_cell(c))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("draw {draw_id}: main numbers"))?;

    let bonus = match labelled_row(table, &[BONUS_LABEL]).and_then(|row| row.get(1)) {
        Some(cell) => parse_number_cell(cell).with_context(|| format!("draw {draw_id}: bonus"))?,
        None => None,
    };

    Ok(DrawRecord::new(draw_id, draw_date, main, bonus)?)
}

/// One draw per row: `回号, 抽せん日, n1..n6, ボーナス数字`.
fn parse_list_table(table: &Table) -> Result<Vec<DrawRecord>> {
    let mut out = Vec::new();
    for row in table {
        if row.len() < LIST_ROW_CELLS {
            continue;
        }
        let Some(draw_id) = DrawId::parse(&row[0]) else {
            continue;
        };
        let draw_date = parse_draw_date(&row[1])
            .ok_or_else(|| anyhow!("draw {draw_id}: unreadable date {:?}", row[1]))?;
        let main = row[2..2 + MAIN_NUMBERS]
            .iter()
            .map(|c| parse_number_cell(c))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("draw {draw_id}: main numbers"))?;
        let bonus = parse_number_cell(&row[2 + MAIN_NUMBERS])
            .with_context(|| format!("draw {draw_id}: bonus"))?;
        out.push(DrawRecord::new(draw_id, draw_date, main, bonus)?);
    }
    Ok(out)
}

fn labelled_row<'a>(table: &'a Table, labels: &[&str]) -> Option<&'a Vec<String>> {
    table.iter().find(|row| {
        row.first()
            .is_some_and(|c| labels.iter().any(|l| c.contains(l)))
    })
}

fn labelled_draw_id(cell: &str) -> Option<DrawId> {
    let trimmed = cell.trim();
    if trimmed.starts_with('第') && trimmed.ends_with('回') {
        DrawId::parse(trimmed)
    } else {
        None
    }
}

/// `2024/01/04`, `2024-01-04`, `2024年1月4日`, optionally followed by a
/// weekday such as `(木)`.
pub fn parse_draw_date(cell: &str) -> Option<NaiveDate> {
    let head: String = cell
        .trim()
        .chars()
        .take_while(|c| !matches!(c, '(' | '（' | ' '))
        .map(|c| normalize_digit(c).unwrap_or(c))
        .map(|c| if c == '／' { '/' } else { c })
        .collect();
    ["%Y/%m/%d", "%Y-%m-%d", "%Y年%m月%d日", "%Y.%m.%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&head, fmt).ok())
}

/// Blank or dash means missing. Digits (half or full width, optionally in
/// parentheses) are a number. Anything else rejects the page.
pub fn parse_number_cell(cell: &str) -> Result<Option<u8>> {
    let trimmed = cell
        .trim()
        .trim_start_matches(['(', '（'])
        .trim_end_matches([')', '）'])
        .trim();
    if trimmed.is_empty() || matches!(trimmed, "-" | "－" | "—" | "ー" | "―") {
        return Ok(None);
    }
    let digits: Option<String> = trimmed.chars().map(normalize_digit).collect();
    let Some(digits) = digits else {
        bail!("not a number: {cell:?}");
    };
    let value = digits
        .parse::<u8>()
        .with_context(|| format!("number out of range: {cell:?}"))?;
    Ok(Some(value))
}
