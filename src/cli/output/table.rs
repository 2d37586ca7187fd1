//! Table output for campaign and evaluation summaries using comfy-table.

use crate::application::{CampaignSummary, EvalStats, PassAtK};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;
use std::path::PathBuf;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per pass of a campaign run.
    pub fn format_campaign(&self, summary: &CampaignSummary) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Pass",
            "Problems",
            "Already Done",
            "Completed",
            "Succeeded",
            "Errored",
            "Output",
        ]));

        for pass in &summary.passes {
            table.add_row(vec![
                Cell::new(pass.pass),
                Cell::new(pass.total),
                Cell::new(pass.already_done),
                Cell::new(pass.completed),
                self.count_cell(pass.succeeded, Color::Green),
                self.count_cell(pass.errored, Color::Red),
                Cell::new(pass.output_dir.display()),
            ]);
        }

        table.to_string()
    }

    /// One row per evaluated result directory.
    pub fn format_eval(&self, rows: &[(PathBuf, EvalStats)]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Directory",
            "Total",
            "First Try",
            "Success",
            "Exhausted",
            "Parse Error",
            "Error",
            "Rate",
        ]));

        for (dir, stats) in rows {
            table.add_row(vec![
                Cell::new(dir.display()),
                Cell::new(stats.total),
                Cell::new(stats.first_try_success),
                self.count_cell(stats.success, Color::Green),
                Cell::new(stats.exhausted),
                Cell::new(stats.parse_error),
                self.count_cell(stats.errored, Color::Red),
                Cell::new(format!("{:.1}%", stats.success_rate() * 100.0)),
            ]);
        }

        table.to_string()
    }

    pub fn format_pass_at_k(&self, result: &PassAtK) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["k", "Problems", "Solved", "pass@k"]));
        table.add_row(vec![
            Cell::new(result.k),
            Cell::new(result.problems),
            self.count_cell(result.solved, Color::Green),
            Cell::new(format!("{:.1}%", result.rate() * 100.0)),
        ]);
        table.to_string()
    }

    fn count_cell(&self, count: usize, color: Color) -> Cell {
        if self.use_colors && count > 0 {
            Cell::new(count).fg(color)
        } else {
            Cell::new(count)
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(u16::try_from(width).unwrap_or(u16::MAX));
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PassSummary;

    #[test]
    fn test_format_campaign() {
        let formatter = TableFormatter::with_config(false, None);
        let summary = CampaignSummary {
            passes: vec![PassSummary {
                pass: 1,
                output_dir: PathBuf::from("out/pass_1"),
                total: 156,
                already_done: 6,
                completed: 150,
                succeeded: 97,
                errored: 2,
            }],
        };

        let output = formatter.format_campaign(&summary);
        assert!(output.contains("Succeeded"));
        assert!(output.contains("156"));
        assert!(output.contains("out/pass_1"));
    }

    #[test]
    fn test_format_eval_rate() {
        let formatter = TableFormatter::with_config(false, None);
        let stats = EvalStats {
            total: 4,
            success: 1,
            ..EvalStats::default()
        };
        let output = formatter.format_eval(&[(PathBuf::from("out/pass_1"), stats)]);
        assert!(output.contains("25.0%"));
    }

    #[test]
    fn test_format_pass_at_k() {
        let formatter = TableFormatter::with_config(false, Some(60));
        let output = formatter.format_pass_at_k(&PassAtK {
            k: 3,
            problems: 10,
            solved: 7,
        });
        assert!(output.contains("70.0%"));
    }
}
