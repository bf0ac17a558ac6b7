//! Fixed-width text tables for terminal output.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub align: Align,
    /// Flexible columns give up width first when the table must fit.
    pub flexible: bool,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
            flexible: false,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
            flexible: false,
        }
    }

    pub fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }
}

const GAP: &str = "  ";
const MIN_FLEX_WIDTH: usize = 4;

pub struct TextTable {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    max_width: Option<usize>,
    plain: bool,
}

impl TextTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            max_width: None,
            plain: false,
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Caps the rendered line width by shrinking flexible columns.
    pub fn fit_to(mut self, width: Option<usize>) -> Self {
        self.max_width = width;
        self
    }

    /// Uses `-` instead of box-drawing characters for the rule.
    pub fn plain(mut self, plain: bool) -> Self {
        self.plain = plain;
        self
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(column.header.chars().count(), usize::max)
            })
            .collect();

        if let Some(limit) = self.max_width {
            let gaps = GAP.len() * widths.len().saturating_sub(1);
            let mut overflow = (widths.iter().sum::<usize>() + gaps).saturating_sub(limit);
            for (idx, column) in self.columns.iter().enumerate() {
                if overflow == 0 {
                    break;
                }
                if column.flexible {
                    let spare = widths[idx].saturating_sub(MIN_FLEX_WIDTH);
                    let cut = spare.min(overflow);
                    widths[idx] -= cut;
                    overflow -= cut;
                }
            }
        }
        widths
    }

    fn line(&self, cells: &[&str], widths: &[usize]) -> String {
        self.columns
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (column, width))| {
                let text = cells.get(idx).copied().unwrap_or("");
                pad(&truncate(text, *width), *width, column.align)
            })
            .collect::<Vec<_>>()
            .join(GAP)
            .trim_end()
            .to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let headers: Vec<&str> = self
            .columns
            .iter()
            .map(|column| column.header.as_str())
            .collect();
        let rule_width = widths.iter().sum::<usize>() + GAP.len() * widths.len().saturating_sub(1);
        let rule = if self.plain { "-" } else { "─" }.repeat(rule_width);

        let mut lines = vec![self.line(&headers, &widths), rule];
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            lines.push(self.line(&cells, &widths));
        }
        lines.join("\n")
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(text.chars().count()));
    match align {
        Align::Left => format!("{text}{fill}"),
        Align::Right => format!("{fill}{text}"),
    }
}
