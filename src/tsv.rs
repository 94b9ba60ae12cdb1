use std::io::{self, Write};
use std::mem::take;

pub const TAB: char = '\t';

pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

pub fn write_row<W, S>(mut w: W, row: &[S], sep: char) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    for (idx, cell) in row.iter().enumerate() {
        if idx > 0 {
            write!(w, "{sep}")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}

pub fn render_table<S: AsRef<str>>(header: &[S], rows: &[Vec<String>], sep: char) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writes into a Vec cannot fail.
    let _ = write_row(&mut buf, header, sep);
    for row in rows {
        let _ = write_row(&mut buf, row, sep);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields_survive() {
        let rows = vec![vec!["a\tb".to_string(), "say \"hi\"".to_string(), "x".to_string()]];
        let buf = render_table(&["h1", "h2", "h3"], &rows, TAB);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "h1\th2\th3\n\"a\tb\"\t\"say \"\"hi\"\"\"\tx\n");
        let parsed = parse_rows(&text, TAB);
        assert_eq!(parsed[1], rows[0]);
    }

    #[test]
    fn crlf_and_blank_lines() {
        let parsed = parse_rows("a\tb\r\n\r\nc\t\n", TAB);
        assert_eq!(parsed, vec![vec!["a", "b"], vec!["c", ""]]);
    }
}
