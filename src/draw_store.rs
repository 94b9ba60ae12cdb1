use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};

use crate::config::MAIN_NUMBERS;
use crate::draw::{DrawHistory, DrawId, DrawRecord};

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub run_id: i64,
    pub draws_upserted: usize,
    pub latest_draw: Option<DrawId>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS draws (
            draw_id INTEGER PRIMARY KEY,
            draw_date TEXT NOT NULL,
            nm1 INTEGER NULL,
            nm2 INTEGER NULL,
            nm3 INTEGER NULL,
            nm4 INTEGER NULL,
            nm5 INTEGER NULL,
            nm6 INTEGER NULL,
            bonus_number INTEGER NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_draws_date ON draws(draw_date);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            pages INTEGER NOT NULL,
            draws_upserted INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_draws(conn: &mut Connection, history: &DrawHistory, pages: usize) -> Result<IngestSummary> {
    let started_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, pages, draws_upserted)
         VALUES (?1, NULL, ?2, 0)",
        params![started_at, pages as i64],
    )
    .context("insert ingest run")?;
    let run_id = conn.last_insert_rowid();

    let tx = conn.transaction().context("begin ingest transaction")?;
    for draw in history.draws() {
        upsert_draw(&tx, draw)?;
    }
    tx.commit().context("commit ingest transaction")?;

    conn.execute(
        "UPDATE ingest_runs SET finished_at = ?1, draws_upserted = ?2 WHERE run_id = ?3",
        params![Utc::now().to_rfc3339(), history.len() as i64, run_id],
    )
    .context("update ingest run")?;

    let latest_draw = conn
        .query_row("SELECT MAX(draw_id) FROM draws", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .context("query latest draw")?
        .map(DrawId);

    Ok(IngestSummary {
        run_id,
        draws_upserted: history.len(),
        latest_draw,
    })
}

fn upsert_draw(tx: &rusqlite::Transaction<'_>, d: &DrawRecord) -> Result<()> {
    let n = |idx: usize| d.main_numbers.get(idx).copied();
    tx.execute(
        r#"
        INSERT INTO draws (
            draw_id, draw_date, nm1, nm2, nm3, nm4, nm5, nm6, bonus_number, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(draw_id) DO UPDATE SET
            draw_date = excluded.draw_date,
            nm1 = excluded.nm1,
            nm2 = excluded.nm2,
            nm3 = excluded.nm3,
            nm4 = excluded.nm4,
            nm5 = excluded.nm5,
            nm6 = excluded.nm6,
            bonus_number = excluded.bonus_number,
            updated_at = excluded.updated_at
        "#,
        params![
            d.draw_id.0,
            d.draw_date.format("%Y-%m-%d").to_string(),
            n(0),
            n(1),
            n(2),
            n(3),
            n(4),
            n(5),
            d.bonus_number,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert draw {}", d.draw_id))?;
    Ok(())
}

pub fn load_draws(conn: &Connection) -> Result<DrawHistory> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT draw_id, draw_date, nm1, nm2, nm3, nm4, nm5, nm6, bonus_number
            FROM draws
            ORDER BY draw_id ASC
            "#,
        )
        .context("prepare load draws query")?;

    let rows = stmt
        .query_map([], |row| {
            let mut main = Vec::with_capacity(MAIN_NUMBERS);
            for idx in 0..MAIN_NUMBERS {
                main.push(row.get::<_, Option<u8>>(2 + idx)?);
            }
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                main,
                row.get::<_, Option<u8>>(8)?,
            ))
        })
        .context("query load draws")?;

    let mut out = Vec::new();
    for row in rows {
        let (id, date, main, bonus) = row.context("decode draw row")?;
        let draw_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|err| anyhow!("draw {id}: bad stored date {date:?}: {err}"))?;
        out.push(DrawRecord::new(DrawId(id), draw_date, main, bonus)?);
    }
    Ok(DrawHistory::new(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_load() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let date = NaiveDate::from_ymd_opt(2010, 5, 6).unwrap();
        let first = DrawHistory::new(vec![
            DrawRecord::new(DrawId(10), date, [Some(1), Some(2)], Some(3)).unwrap(),
            DrawRecord::new(DrawId(9), date, (10..=15).map(Some), None).unwrap(),
        ])
        .unwrap();
        let summary = upsert_draws(&mut conn, &first, 1).unwrap();
        assert_eq!(summary.draws_upserted, 2);
        assert_eq!(summary.latest_draw, Some(DrawId(10)));

        let fixed = DrawHistory::new(vec![
            DrawRecord::new(DrawId(10), date, (1..=6).map(Some), Some(7)).unwrap(),
        ])
        .unwrap();
        upsert_draws(&mut conn, &fixed, 1).unwrap();

        let loaded = load_draws(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.draws()[0].draw_id, DrawId(9));
        assert_eq!(loaded.draws()[1].main_numbers, vec![1, 2, 3, 4, 5, 6]);
    }
}
