//! Plain-text table rendering for `drover status`.

/// Lays `rows` out under `headers` in left-aligned columns.
///
/// The last column is never padded so lines carry no trailing whitespace.
#[must_use]
pub fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> Vec<String> {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; N]| -> String {
        let mut line = String::new();
        for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if index + 1 == N {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  "));
            }
        }
        line.trim_end().to_owned()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(headers));
    for row in rows {
        lines.push(render(row.each_ref().map(String::as_str)));
    }
    lines
}
