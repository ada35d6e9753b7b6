use serde::{Deserialize, Serialize};

/// Label of the synthesized row that sums every language.
pub const TOTAL_LABEL: &str = "Total";

/// Per-language counts as reported by the line counting tool.
///
/// Field names follow the tool's JSON output (`Name`, `Count`, `Blank`,
/// `Comment`, `Code`, `Lines`); any other fields it emits are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStat {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Count")]
    pub file_count: u64,
    #[serde(rename = "Blank")]
    pub blank_lines: u64,
    #[serde(rename = "Comment")]
    pub comment_lines: u64,
    #[serde(rename = "Code")]
    pub code_lines: u64,
    #[serde(rename = "Lines")]
    pub total_lines: u64,
}

impl LanguageStat {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Adds `other` field by field, clamping at `u64::MAX`.
    fn accumulate(mut self, other: &Self) -> Self {
        self.file_count = self.file_count.saturating_add(other.file_count);
        self.blank_lines = self.blank_lines.saturating_add(other.blank_lines);
        self.comment_lines = self.comment_lines.saturating_add(other.comment_lines);
        self.code_lines = self.code_lines.saturating_add(other.code_lines);
        self.total_lines = self.total_lines.saturating_add(other.total_lines);
        self
    }
}

/// Languages in the order the tool reported them, plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub languages: Vec<LanguageStat>,
    pub total: LanguageStat,
}

impl AnalysisReport {
    pub fn new(languages: Vec<LanguageStat>) -> Self {
        let total = languages
            .iter()
            .fold(LanguageStat::named(TOTAL_LABEL), LanguageStat::accumulate);

        Self { languages, total }
    }
}
