//! Table layout: renders a logical grid of (possibly spanning) cells as
//! aligned textual columns.

use std::collections::HashSet;
use std::str::FromStr;

use unicode_width::UnicodeWidthStr;

use crate::Error;

/// Marker substituted for hard paragraph breaks inside a table cell.
const LINE_BREAK_MARKER: &str = "<br>";

/// Minimum width of a header separator dash run.
const MIN_SEPARATOR_WIDTH: usize = 3;

/// How a cell spanning several rows or columns is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanPolicy {
    /// Print the cell's text in every slot it occupies.
    #[default]
    Repeat,
    /// Print the text once, in the first occupied slot; blanks elsewhere.
    First,
    /// Print the text once per column it occupies.
    FirstCol,
    /// Print the text once per row it occupies.
    FirstRow,
    /// Print the text once with an explicit span marker replacing the
    /// preceding column separator.  Not applicable to every table.
    Tag,
}

impl FromStr for SpanPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<SpanPolicy, Error> {
        match s {
            "repeat" => Ok(SpanPolicy::Repeat),
            "first" => Ok(SpanPolicy::First),
            "firstCol" => Ok(SpanPolicy::FirstCol),
            "firstRow" => Ok(SpanPolicy::FirstRow),
            "tag" => Ok(SpanPolicy::Tag),
            other => Err(Error::UnknownSpanPolicy(other.to_string())),
        }
    }
}

/// A completed cell as recorded by the builder.
#[derive(Debug, Clone)]
pub(crate) struct TableCell {
    pub colspan: usize,
    pub rowspan: usize,
    pub text: String,
    pub header: bool,
}

impl TableCell {
    fn spans(&self) -> bool {
        self.colspan > 1 || self.rowspan > 1
    }
}

/// Render `rows` into aligned columns, `col_spacing` spaces between
/// columns and `row_spacing` blank lines between rows.
///
/// Returns `None` only for [`SpanPolicy::Tag`] on a table it cannot
/// express; callers fall back to another policy.
pub(crate) fn render_table(
    rows: &[Vec<TableCell>],
    col_spacing: usize,
    row_spacing: usize,
    policy: SpanPolicy,
) -> Option<String> {
    if rows.iter().all(|row| row.is_empty()) {
        return Some(String::new());
    }
    if policy == SpanPolicy::Tag
        && rows
            .iter()
            .any(|row| row.first().is_some_and(TableCell::spans))
    {
        // The marker replaces the separator before the cell, and there is
        // no separator before column zero.
        return None;
    }

    let (cells, matrix, num_cols) = build_layout(rows);
    let lin: Vec<String> = cells.iter().map(|cell| linearize(&cell.text)).collect();
    let transposed = transpose(&matrix, num_cols);
    let num_rows = matrix.len();

    let mut display = vec![vec![String::new(); num_cols]; num_rows];
    let mut markers: Vec<Vec<Option<String>>> = vec![vec![None; num_cols]; num_rows];
    match policy {
        SpanPolicy::Repeat => {
            for (c, col) in transposed.iter().enumerate() {
                for (r, slot) in col.iter().enumerate() {
                    if let Some(id) = *slot {
                        display[r][c] = lin[id].clone();
                    }
                }
            }
        }
        SpanPolicy::First | SpanPolicy::Tag => {
            let mut rendered = vec![false; cells.len()];
            for (c, col) in transposed.iter().enumerate() {
                for (r, slot) in col.iter().enumerate() {
                    if let Some(id) = *slot {
                        if !rendered[id] {
                            rendered[id] = true;
                            display[r][c] = lin[id].clone();
                            if policy == SpanPolicy::Tag && cells[id].spans() {
                                markers[r][c] = Some(format!(
                                    "<cell cols={} rows={}>",
                                    cells[id].colspan, cells[id].rowspan
                                ));
                            }
                        }
                    }
                }
            }
        }
        SpanPolicy::FirstCol => {
            let mut seen = HashSet::new();
            for (c, col) in transposed.iter().enumerate() {
                for (r, slot) in col.iter().enumerate() {
                    if let Some(id) = *slot {
                        if seen.insert((id, c)) {
                            display[r][c] = lin[id].clone();
                        }
                    }
                }
            }
        }
        SpanPolicy::FirstRow => {
            let mut seen = HashSet::new();
            for (c, col) in transposed.iter().enumerate() {
                for (r, slot) in col.iter().enumerate() {
                    if let Some(id) = *slot {
                        if seen.insert((id, r)) {
                            display[r][c] = lin[id].clone();
                        }
                    }
                }
            }
        }
    }

    let col_widths: Vec<usize> = (0..num_cols)
        .map(|c| {
            display
                .iter()
                .map(|row| UnicodeWidthStr::width(row[c].as_str()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let sep = " ".repeat(col_spacing);
    let mut out_rows: Vec<String> = Vec::with_capacity(num_rows + 2);
    for r in 0..num_rows {
        let mut line = String::new();
        for c in 0..num_cols {
            if c > 0 {
                match &markers[r][c] {
                    Some(marker) => {
                        line.push_str(marker);
                        for _ in UnicodeWidthStr::width(marker.as_str())..col_spacing {
                            line.push(' ');
                        }
                    }
                    None => line.push_str(&sep),
                }
            }
            let text = &display[r][c];
            line.push_str(text);
            for _ in UnicodeWidthStr::width(text.as_str())..col_widths[c] {
                line.push(' ');
            }
        }
        out_rows.push(line.trim_end().to_string());
    }

    let dash_row = col_widths
        .iter()
        .map(|w| "-".repeat((*w).max(MIN_SEPARATOR_WIDTH)))
        .collect::<Vec<_>>()
        .join(&sep);
    let has_header = rows.iter().flatten().any(|cell| cell.header);
    if has_header {
        out_rows.insert(1, dash_row);
    } else {
        // No header; prepend placeholder rows so header-expecting
        // consumers still see a structurally valid table.
        out_rows.insert(0, dash_row);
        out_rows.insert(0, String::new());
    }

    Some(out_rows.join(&"\n".repeat(row_spacing + 1)))
}

/// Place every cell into a row-major matrix of slot references, honouring
/// spans and cells from earlier rows still occupying the current row.
#[allow(clippy::type_complexity)]
fn build_layout(rows: &[Vec<TableCell>]) -> (Vec<&TableCell>, Vec<Vec<Option<usize>>>, usize) {
    let mut cells: Vec<&TableCell> = Vec::new();
    let mut matrix: Vec<Vec<Option<usize>>> = vec![Vec::new(); rows.len()];
    let mut num_cols = 0;
    for (r, row) in rows.iter().enumerate() {
        let mut cursor = 0;
        for cell in row {
            let colspan = cell.colspan.max(1);
            let rowspan = cell.rowspan.max(1);
            let mut col = cursor;
            while matrix[r].get(col).is_some_and(Option::is_some) {
                col += 1;
            }
            let id = cells.len();
            cells.push(cell);
            for rr in r..r + rowspan {
                if rr >= matrix.len() {
                    // A rowspan may extend past the last supplied row.
                    matrix.push(Vec::new());
                }
                let matrix_row = &mut matrix[rr];
                if matrix_row.len() < col + colspan {
                    matrix_row.resize(col + colspan, None);
                }
                for slot in &mut matrix_row[col..col + colspan] {
                    if slot.is_none() {
                        *slot = Some(id);
                    }
                }
            }
            cursor = col + colspan;
            num_cols = num_cols.max(cursor);
        }
    }
    (cells, matrix, num_cols)
}

/// Row-major to column-major, tolerating ragged rows.
fn transpose(matrix: &[Vec<Option<usize>>], num_cols: usize) -> Vec<Vec<Option<usize>>> {
    let mut out = vec![vec![None; matrix.len()]; num_cols];
    for (r, row) in matrix.iter().enumerate() {
        for (c, slot) in row.iter().enumerate() {
            out[c][r] = *slot;
        }
    }
    out
}

/// Flatten a cell's multi-line text to one display line: hard paragraph
/// breaks (2+ newlines) become explicit markers, soft breaks a space.
fn linearize(text: &str) -> String {
    let mut out = String::new();
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
        } else {
            flush_newline_run(&mut out, run);
            run = 0;
            out.push(c);
        }
    }
    flush_newline_run(&mut out, run);
    out
}

fn flush_newline_run(out: &mut String, run: usize) {
    if run == 1 {
        out.push(' ');
    } else if run >= 2 {
        for _ in 0..run - 1 {
            out.push_str(LINE_BREAK_MARKER);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> TableCell {
        TableCell {
            colspan: 1,
            rowspan: 1,
            text: text.to_string(),
            header: false,
        }
    }

    fn span_cell(text: &str, colspan: usize, rowspan: usize) -> TableCell {
        TableCell {
            colspan,
            rowspan,
            text: text.to_string(),
            header: false,
        }
    }

    /// The 2x2 span grid used below:
    ///   d e e
    ///   g e e
    ///   k
    fn spanning_rows() -> Vec<Vec<TableCell>> {
        vec![
            vec![cell("d"), span_cell("e", 2, 2)],
            vec![cell("g")],
            vec![cell("k")],
        ]
    }

    #[test]
    fn linearize_soft_and_hard_breaks() {
        assert_eq!(linearize("a\nb"), "a b");
        assert_eq!(linearize("a\n\nb"), "a<br>b");
        assert_eq!(linearize("a\n\n\nb"), "a<br><br>b");
        assert_eq!(linearize("plain"), "plain");
    }

    #[test]
    fn empty_table_renders_empty() {
        assert_eq!(
            render_table(&[], 3, 0, SpanPolicy::Repeat).as_deref(),
            Some("")
        );
        assert_eq!(
            render_table(&[Vec::new()], 3, 0, SpanPolicy::First).as_deref(),
            Some("")
        );
    }

    #[test]
    fn trivial_grid_identical_under_all_policies() {
        let rows = vec![
            vec![cell("a"), cell("bb")],
            vec![cell("ccc"), cell("d")],
        ];
        let expected = render_table(&rows, 3, 0, SpanPolicy::Repeat);
        for policy in [
            SpanPolicy::First,
            SpanPolicy::FirstCol,
            SpanPolicy::FirstRow,
            SpanPolicy::Tag,
        ] {
            assert_eq!(render_table(&rows, 3, 0, policy), expected);
        }
    }

    #[test]
    fn repeat_fills_every_spanned_slot() {
        let out = render_table(&spanning_rows(), 3, 0, SpanPolicy::Repeat).unwrap();
        assert_eq!(out, "\n---   ---   ---\nd   e   e\ng   e   e\nk");
    }

    #[test]
    fn first_renders_span_once() {
        let out = render_table(&spanning_rows(), 3, 0, SpanPolicy::First).unwrap();
        assert_eq!(out, "\n---   ---   ---\nd   e\ng\nk");
    }

    #[test]
    fn first_col_prints_once_per_column() {
        let out = render_table(&spanning_rows(), 3, 0, SpanPolicy::FirstCol).unwrap();
        assert_eq!(out, "\n---   ---   ---\nd   e   e\ng\nk");
    }

    #[test]
    fn first_row_prints_once_per_row() {
        let out = render_table(&spanning_rows(), 3, 0, SpanPolicy::FirstRow).unwrap();
        assert_eq!(out, "\n---   ---   ---\nd   e\ng   e\nk");
    }

    #[test]
    fn tag_mode_marks_spans() {
        let rows = vec![
            vec![cell("a"), span_cell("bb", 2, 1)],
            vec![cell("c"), cell("d"), cell("e")],
        ];
        let out = render_table(&rows, 3, 0, SpanPolicy::Tag).unwrap();
        assert!(out.contains("<cell cols=2 rows=1>bb"));
    }

    #[test]
    fn tag_mode_rejects_leading_span() {
        let rows = vec![
            vec![span_cell("a", 1, 2), cell("b")],
            vec![cell("c")],
        ];
        assert_eq!(render_table(&rows, 3, 0, SpanPolicy::Tag), None);
    }

    #[test]
    fn header_separator_follows_first_row() {
        let rows = vec![
            vec![
                TableCell {
                    colspan: 1,
                    rowspan: 1,
                    text: "x".to_string(),
                    header: true,
                },
                TableCell {
                    colspan: 1,
                    rowspan: 1,
                    text: "y".to_string(),
                    header: true,
                },
            ],
            vec![cell("1"), cell("2")],
        ];
        let out = render_table(&rows, 3, 0, SpanPolicy::Repeat).unwrap();
        assert_eq!(out, "x   y\n---   ---\n1   2");
    }

    #[test]
    fn rowspan_overflowing_last_row_extends_grid() {
        let rows = vec![vec![cell("a"), span_cell("b", 1, 3)]];
        let out = render_table(&rows, 3, 0, SpanPolicy::Repeat).unwrap();
        assert_eq!(out, "\n---   ---\na   b\n    b\n    b");
    }

    #[test]
    fn row_spacing_inserts_blank_lines() {
        let rows = vec![vec![cell("a")], vec![cell("b")]];
        let out = render_table(&rows, 3, 1, SpanPolicy::Repeat).unwrap();
        assert_eq!(out, "\n\n---\n\na\n\nb");
    }

    #[test]
    fn column_widths_use_display_width() {
        let rows = vec![vec![cell("日本"), cell("x")], vec![cell("ab"), cell("y")]];
        let out = render_table(&rows, 3, 0, SpanPolicy::Repeat).unwrap();
        assert_eq!(out, "\n----   ---\n日本   x\nab     y");
    }

    #[test]
    fn unknown_policy_name_is_an_error() {
        assert!(matches!(
            "diagonal".parse::<SpanPolicy>(),
            Err(Error::UnknownSpanPolicy(name)) if name == "diagonal"
        ));
        assert_eq!("firstCol".parse::<SpanPolicy>().unwrap(), SpanPolicy::FirstCol);
    }
}
