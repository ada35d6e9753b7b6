use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{CellAlignment, ContentArrangement, Table};

use crate::report::{AnalysisReport, LanguageStat};

const HEADER: [&str; 6] = ["Language", "Files", "Blanks", "Comments", "Code", "Lines"];

/// Table with fixed layout and no styling.
///
/// Width never depends on the terminal, so the same input always renders to
/// the same bytes.
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled)
        .force_no_tty();
    table
}

fn stat_row(stat: &LanguageStat) -> Vec<String> {
    vec![
        stat.name.clone(),
        stat.file_count.to_string(),
        stat.blank_lines.to_string(),
        stat.comment_lines.to_string(),
        stat.code_lines.to_string(),
        stat.total_lines.to_string(),
    ]
}

/// Renders the report as a fenced markdown block captioned with `source`.
pub fn render_report(report: &AnalysisReport, source: &str) -> String {
    let mut table = create_table();
    table.set_header(HEADER.to_vec());

    for language in &report.languages {
        table.add_row(stat_row(language));
    }
    table.add_row(stat_row(&report.total));

    for index in 1..HEADER.len() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    format!("```md\n{table}\nSource line count from: {source}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(line: &str) -> Vec<String> {
        line.trim()
            .trim_matches('|')
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect()
    }

    fn go_report() -> AnalysisReport {
        AnalysisReport::new(vec![LanguageStat {
            name: "Go".to_string(),
            file_count: 3,
            blank_lines: 10,
            comment_lines: 10,
            code_lines: 100,
            total_lines: 120,
        }])
    }

    #[test]
    fn test_renders_header_rows_and_total() {
        let rendered = render_report(&go_report(), "https://example.com/org/repo.git");
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.first(), Some(&"```md"));
        assert_eq!(lines.last(), Some(&"```"));
        assert_eq!(cells(lines[1]), HEADER);

        let go = lines.iter().find(|l| l.contains("Go")).unwrap();
        assert_eq!(cells(go), ["Go", "3", "10", "10", "100", "120"]);

        let total = lines.iter().find(|l| l.contains("Total")).unwrap();
        assert_eq!(cells(total), ["Total", "3", "10", "10", "100", "120"]);

        assert!(rendered.contains("Source line count from: https://example.com/org/repo.git"));
    }

    #[test]
    fn test_total_is_last_table_row() {
        let report = AnalysisReport::new(vec![
            LanguageStat {
                name: "Go".to_string(),
                file_count: 2,
                code_lines: 100,
                total_lines: 100,
                ..LanguageStat::default()
            },
            LanguageStat {
                name: "Markdown".to_string(),
                file_count: 1,
                code_lines: 10,
                total_lines: 10,
                ..LanguageStat::default()
            },
        ]);

        let rendered = render_report(&report, "repo");
        let rows: Vec<&str> = rendered.lines().filter(|l| l.starts_with('|')).collect();

        let names: Vec<String> = rows.iter().map(|row| cells(row)[0].clone()).collect();
        assert_eq!(names.last().map(String::as_str), Some("Total"));
        assert!(names.iter().position(|n| n == "Go") < names.iter().position(|n| n == "Markdown"));
        assert_eq!(cells(rows.last().unwrap()), ["Total", "3", "0", "0", "110", "110"]);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let report = go_report();
        assert_eq!(render_report(&report, "repo"), render_report(&report, "repo"));
    }

    #[test]
    fn test_empty_report_still_has_total() {
        let rendered = render_report(&AnalysisReport::new(Vec::new()), "repo");
        let total = rendered.lines().find(|l| l.contains("Total")).unwrap();
        assert_eq!(cells(total), ["Total", "0", "0", "0", "0", "0"]);
    }
}
