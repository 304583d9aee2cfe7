//! Plain-text plan table for terminals.

use unicode_width::UnicodeWidthStr;

use crate::command::WipeCommand;
use crate::coordinator::WipeStep;

/// Column layout for the plan table.
pub struct PlanReport {
    pub gap: usize,
    pub show_statements: bool,
}

impl Default for PlanReport {
    fn default() -> Self {
        Self {
            gap: 2,
            show_statements: false,
        }
    }
}

impl PlanReport {
    pub fn render(&self, steps: &[WipeStep]) -> String {
        let mut rows: Vec<Vec<String>> = vec![header(self.show_statements)];
        for (i, step) in steps.iter().enumerate() {
            let (action, column) = match &step.command {
                WipeCommand::ClearTable { .. } => ("clear", ""),
                WipeCommand::NullColumn { column, .. } => ("null", column.as_str()),
            };
            let mut row = vec![
                (i + 1).to_string(),
                action.to_string(),
                step.command.table().to_string(),
                column.to_string(),
            ];
            if self.show_statements {
                row.push(step.statement.clone());
            }
            rows.push(row);
        }

        let widths = column_widths(&rows);
        let mut out = String::new();
        for row in &rows {
            let mut line = String::new();
            for (idx, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if idx + 1 < row.len() {
                    let pad = widths[idx] - UnicodeWidthStr::width(cell.as_str()) + self.gap;
                    line.push_str(&" ".repeat(pad));
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

fn header(show_statements: bool) -> Vec<String> {
    let mut cols = vec!["#", "action", "table", "column"];
    if show_statements {
        cols.push("statement");
    }
    cols.into_iter().map(str::to_string).collect()
}

/// Display width of the widest cell per column.
fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let width = UnicodeWidthStr::width(cell.as_str());
            match widths.get_mut(idx) {
                Some(w) => *w = (*w).max(width),
                None => widths.push(width),
            }
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(command: WipeCommand) -> WipeStep {
        WipeStep {
            statement: command.to_string(),
            command,
        }
    }

    #[test]
    fn test_render_aligns_columns() {
        let steps = vec![
            step(WipeCommand::null_column("a", "ForeignId")),
            step(WipeCommand::clear_table("orders")),
        ];
        let out = PlanReport::default().render(&steps);

        assert_eq!(
            out,
            "#  action  table   column\n\
             1  null    a       ForeignId\n\
             2  clear   orders\n"
        );
    }

    #[test]
    fn test_wide_characters_count_double() {
        let steps = vec![step(WipeCommand::clear_table("ユーザー"))];
        let out = PlanReport::default().render(&steps);

        // "ユーザー" is 8 columns wide, so "column" starts after 8 + 2
        assert_eq!(out.lines().next(), Some("#  action  table     column"));
    }

    #[test]
    fn test_render_with_statements() {
        let report = PlanReport {
            show_statements: true,
            ..Default::default()
        };
        let out = report.render(&[step(WipeCommand::clear_table("t"))]);

        assert!(out.lines().nth(1).unwrap().ends_with("clear t"));
    }
}
