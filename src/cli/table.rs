use crate::cli::output;

/// Column alignment for [`Table`] cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub align: Align,
}

impl TableColumn {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
        }
    }
}

/// Read-only table sized to its widest cell per column.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.rows
            .push(cells.into_iter().map(|value| value.into()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Renders header, rule and rows as lines without trailing whitespace.
    pub fn render_lines(&self) -> Vec<String> {
        let widths = self.widths();
        let format_row = |cells: Vec<&str>| -> String {
            let line = self
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(idx, (column, width))| {
                    let cell = cells.get(idx).copied().unwrap_or("");
                    match column.align {
                        Align::Left => format!("{:<width$}", cell, width = width),
                        Align::Right => format!("{:>width$}", cell, width = width),
                    }
                })
                .collect::<Vec<_>>()
                .join("  ");
            line.trim_end().to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(
            self.columns.iter().map(|c| c.header.as_str()).collect(),
        ));
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        lines.push("-".repeat(total));
        for row in &self.rows {
            lines.push(format_row(row.iter().map(String::as_str).collect()));
        }
        lines
    }

    pub fn print(&self) {
        for text in self.render_lines() {
            output::line(text);
        }
    }
}
