//! Minimal `<table>` extraction. Result pages are static server-rendered
//! HTML, so a scanner over tag offsets is enough.

pub type Table = Vec<Vec<String>>;

const MAX_COLSPAN: usize = 32;

pub fn extract_tables(html: &str) -> Vec<Table> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(block) = next_block(&lower, "table", from, None) {
        let rows = extract_rows(html, &lower, block.content_start, block.content_end);
        if !rows.is_empty() {
            out.push(rows);
        }
        from = block.end;
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Block {
    open_start: usize,
    content_start: usize,
    content_end: usize,
    end: usize,
}

fn find_open(lower: &str, name: &str, from: usize) -> Option<usize> {
    let pat = format!("<{name}");
    let mut pos = from;
    loop {
        let idx = lower.get(pos..)?.find(&pat)? + pos;
        let after = lower.as_bytes().get(idx + pat.len()).copied();
        match after {
            Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r') | None => return Some(idx),
            _ => pos = idx + pat.len(),
        }
    }
}

/// Next `<name ...>...</name>` block starting at or after `from`. Nested
/// blocks of the same name are skipped over. Without a closing tag the block
/// ends at the next sibling open tag or at `limit`.
fn next_block(lower: &str, name: &str, from: usize, limit: Option<usize>) -> Option<Block> {
    let limit = limit.unwrap_or(lower.len());
    let open_start = find_open(lower, name, from).filter(|&i| i < limit)?;
    let content_start = lower[open_start..limit].find('>')? + open_start + 1;
    let close_pat = format!("</{name}");

    let mut depth = 1usize;
    let mut pos = content_start;
    loop {
        let next_close = lower[pos..limit].find(&close_pat).map(|i| i + pos);
        let next_open = find_open(lower, name, pos).filter(|&i| i < limit);
        match (next_open, next_close) {
            (Some(open), Some(close)) if open < close => {
                if name != "table" {
                    // Unclosed row/cell: the next sibling starts a new block.
                    return Some(Block {
                        open_start,
                        content_start,
                        content_end: open,
                        end: open,
                    });
                }
                depth += 1;
                pos = open + 1;
            }
            (_, Some(close)) => {
                depth -= 1;
                if depth == 0 {
                    let end = lower[close..limit]
                        .find('>')
                        .map(|i| i + close + 1)
                        .unwrap_or(limit);
                    return Some(Block {
                        open_start,
                        content_start,
                        content_end: close,
                        end,
                    });
                }
                pos = close + 1;
            }
            (Some(open), None) if name != "table" => {
                return Some(Block {
                    open_start,
                    content_start,
                    content_end: open,
                    end: open,
                });
            }
            _ => {
                return Some(Block {
                    open_start,
                    content_start,
                    content_end: limit,
                    end: limit,
                });
            }
        }
    }
}

fn extract_rows(html: &str, lower: &str, start: usize, end: usize) -> Table {
    let mut rows = Vec::new();
    let mut from = start;
    while let Some(row) = next_block(lower, "tr", from, Some(end)) {
        let cells = extract_cells(html, lower, row.content_start, row.content_end);
        if !cells.is_empty() {
            rows.push(cells);
        }
        from = row.end.max(row.content_start);
    }
    rows
}

fn extract_cells(html: &str, lower: &str, start: usize, end: usize) -> Vec<String> {
    let mut cells = Vec::new();
    let mut from = start;
    loop {
        let td = next_block(lower, "td", from, Some(end));
        let th = next_block(lower, "th", from, Some(end));
        let cell = match (td, th) {
            (Some(a), Some(b)) => {
                if a.open_start < b.open_start {
                    clip(a, b.open_start)
                } else {
                    clip(b, a.open_start)
                }
            }
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => break,
        };
        let open_tag = &lower[cell.open_start..cell.content_start];
        let text = cell_text(&html[cell.content_start..cell.content_end]);
        for _ in 0..colspan(open_tag) {
            cells.push(text.clone());
        }
        from = cell.end.max(cell.content_start);
    }
    cells
}

/// A `<td>` left open right before a `<th>` (or the reverse) ends there.
fn clip(block: Block, next_open: usize) -> Block {
    if block.content_end > next_open {
        Block {
            content_end: next_open,
            end: next_open,
            ..block
        }
    } else {
        block
    }
}

fn colspan(open_tag: &str) -> usize {
    let Some(idx) = open_tag.find("colspan") else {
        return 1;
    };
    let rest = open_tag[idx + "colspan".len()..].trim_start();
    let Some(rest) = rest.strip_prefix('=') else {
        return 1;
    };
    let digits: String = rest
        .trim_start()
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .map(|n| n.min(MAX_COLSPAN))
        .unwrap_or(1)
}

pub fn cell_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag.trim_start_matches('/').to_ascii_lowercase();
                if name.starts_with("br") || name.starts_with('p') || name.starts_with("div") {
                    out.push(' ');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => out.push(ch),
        }
    }
    decode_entities(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cells_with_colspan_and_entities() {
        let html = r#"
            <html><body>
            <TABLE class="x">
              <tr><th>回号</th><th colspan="2">第1850回</th></tr>
              <tr><td>A&amp;B</td><td><span>1</span>2</td><td>x<br>y</td></tr>
            </TABLE>
            <table><tr><td>only</td></tr></table>
            </body></html>
        "#;
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][0], vec!["回号", "第1850回", "第1850回"]);
        assert_eq!(tables[0][1], vec!["A&B", "12", "x y"]);
        assert_eq!(tables[1], vec![vec!["only".to_string()]]);
    }

    #[test]
    fn tolerates_unclosed_cells_and_rows() {
        let html = "<table><tr><td>1<td>2<tr><td>3</table>";
        let tables = extract_tables(html);
        assert_eq!(tables, vec![vec![vec!["1", "2"], vec!["3"]]]);
    }

    #[test]
    fn skips_nested_table_boundaries() {
        let html = "<table><tr><td><table><tr><td>in</td></tr></table></td></tr></table><table><tr><td>next</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1], vec![vec!["next".to_string()]]);
    }

    #[test]
    fn numeric_entities_and_fullwidth_space() {
        assert_eq!(cell_text("&#49;&#x32;\u{3000}x&nbsp;&bogus;"), "12 x &bogus;");
    }
}
