//! Output formatting for command results.

use gts_core::{Classification, Effect, ExtractedId, Query, Segment, Selector, ValidationReport};
use serde::{Deserialize, Serialize};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

/// Plain-text rendering for the `table` format.
pub trait Tabular {
    fn to_table(&self) -> String;
}

/// Formats a command result in the requested output format.
pub fn format_output<T>(value: &T, format: OutputFormat) -> Result<String, String>
where
    T: Serialize + Tabular + ?Sized,
{
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(value.to_table()),
    }
}

/// Result of `gts parse`.
#[derive(Debug, Serialize)]
pub struct ParsedView {
    pub canonical: String,
    pub classification: Classification,
    pub chained: bool,
    pub segments: Vec<Segment>,
}

/// One candidate tested by `gts match`.
#[derive(Debug, Serialize)]
pub struct MatchRow {
    pub candidate: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One identifier evaluated by `gts check`.
#[derive(Debug, Serialize)]
pub struct CheckRow {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One identifier mapped by `gts uuid`.
#[derive(Debug, Serialize)]
pub struct UuidRow {
    pub identifier: String,
    pub uuid: String,
}

/// One entry of `gts examples`.
#[derive(Debug, Serialize)]
pub struct ExampleRow {
    pub label: &'static str,
    pub value: &'static str,
}

impl Tabular for [ValidationReport] {
    fn to_table(&self) -> String {
        let mut out = String::new();
        for report in self {
            let status = if report.is_valid { "VALID" } else { "INVALID" };
            out.push_str(&format!("{status:<9}{}\n", report.input));
            out.push_str(&format!("{:9}{}\n", "", report.message));
            if let Some(classification) = report.classification {
                out.push_str(&format!("{:9}classification: {}\n", "", classification.label()));
            }
            for (index, segment) in report.segments.iter().enumerate() {
                out.push_str(&format!("{:9}segment {}: {segment}\n", "", index + 1));
            }
            if let Some(err) = &report.error {
                out.push_str(&format!("{:9}{}\n", "", err.kind));
                out.push_str(&format!("{:9}{}\n", "", report.input));
                out.push_str(&format!("{:9}{}\n", "", caret_line(&report.input, err.offset)));
            }
        }
        out
    }
}

/// Underlines the character at `offset` (counted in chars) with `^`.
///
/// Whitespace before the offset is echoed as-is so tabs and wide spaces take
/// the same columns as in the input line above. Everything else the parser
/// accepts before an error is ASCII, one column per character.
fn caret_line(input: &str, offset: usize) -> String {
    let mut line: String = input
        .chars()
        .take(offset)
        .map(|c| if c.is_whitespace() { c } else { ' ' })
        .collect();
    line.push('^');
    line
}

impl Tabular for ParsedView {
    fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Identifier: {}\n", self.canonical));
        out.push_str(&format!(
            "Classification: {}  Segments: {}\n",
            self.classification.label(),
            self.segments.len()
        ));

        out.push_str(&format!(
            "\n{:<3} {:<16} {:<16} {:<16} {:<20} {:<8} {}\n",
            "#", "VENDOR", "PACKAGE", "NAMESPACE", "TYPE", "VERSION", "KIND"
        ));
        for (index, segment) in self.segments.iter().enumerate() {
            let kind = if segment.is_schema() { "schema" } else { "instance" };
            out.push_str(&format!(
                "{:<3} {:<16} {:<16} {:<16} {:<20} {:<8} {kind}\n",
                index + 1,
                segment.vendor(),
                segment.package(),
                segment.namespace(),
                segment.type_name(),
                segment.version_string(),
            ));
        }
        out
    }
}

impl Tabular for [MatchRow] {
    fn to_table(&self) -> String {
        let mut out = String::new();
        for row in self {
            let verdict = match (&row.error, row.matched) {
                (Some(_), _) => "INVALID",
                (None, true) => "MATCH",
                (None, false) => "NO MATCH",
            };
            out.push_str(&format!("{verdict:<9}{}", row.candidate));
            if let Some(err) = &row.error {
                out.push_str(&format!("  ({err})"));
            }
            out.push('\n');
        }
        out
    }
}

impl Tabular for Query {
    fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Target: {}\n", self.target));
        out.push_str(&format!(
            "Wildcard: {}\n",
            if self.target.has_wildcard() { "yes" } else { "no" }
        ));
        match &self.selector {
            Some(Selector::Predicate(text)) => {
                out.push_str(&format!(
                    "Predicate (unvalidated): {}\n",
                    text.as_unvalidated_str()
                ));
            }
            Some(selector @ Selector::Attribute(text)) => {
                out.push_str(&format!(
                    "Attribute (unvalidated): {}\n",
                    text.as_unvalidated_str()
                ));
                if let Some(path) = selector.attribute_path() {
                    out.push_str(&format!("Attribute path: {}\n", path.join(" > ")));
                }
            }
            None => out.push_str("Selector: none\n"),
        }
        out
    }
}

impl Tabular for [CheckRow] {
    fn to_table(&self) -> String {
        let mut out = String::new();
        for row in self {
            let verdict = match row.effect {
                Some(Effect::Allow) => "ALLOW",
                Some(Effect::Deny) => "DENY",
                None => "INVALID",
            };
            out.push_str(&format!("{verdict:<9}{}", row.identifier));
            match (row.rule, &row.pattern, &row.error) {
                (Some(rule), Some(pattern), _) => {
                    out.push_str(&format!("  (rule {rule}: {pattern})"));
                }
                (_, _, Some(err)) => out.push_str(&format!("  ({err})")),
                _ => out.push_str("  (no matching rule)"),
            }
            out.push('\n');
        }
        out
    }
}

impl Tabular for [ExtractedId] {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No GTS identifiers found.\n".to_string();
        }
        let width = self.iter().map(|found| found.text.len()).max().unwrap_or(0);
        let mut out = String::new();
        for found in self {
            out.push_str(&format!(
                "{:>8}  {:<width$}  {}\n",
                found.offset,
                found.text,
                found.identifier.classification(),
            ));
        }
        out
    }
}

impl Tabular for [UuidRow] {
    fn to_table(&self) -> String {
        self.iter()
            .map(|row| format!("{}  {}\n", row.uuid, row.identifier))
            .collect()
    }
}

impl Tabular for [ExampleRow] {
    fn to_table(&self) -> String {
        let width = self.iter().map(|row| row.label.len()).max().unwrap_or(0);
        self.iter()
            .map(|row| format!("{:<width$}  {}\n", row.label, row.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use gts_core::{parse_query, validate};

    use super::*;

    #[test]
    fn test_validation_table_marks_error_offset() {
        let reports = [validate("gts.x.core.events.Type.v1~")];
        let table = reports.to_table();
        assert!(table.starts_with("INVALID  gts.x.core.events.Type.v1~\n"));
        let caret = table.lines().last().unwrap();
        assert_eq!(caret.find('^'), Some(9 + 18));
    }

    #[test]
    fn test_caret_keeps_leading_whitespace_columns() {
        let reports = [validate("\t\u{3000}gts.x.core.events.Type.v1~")];
        let report = &reports[0];
        assert_eq!(report.error.as_ref().unwrap().offset, 20);

        let table = reports.to_table();
        let caret = table.lines().last().unwrap();
        assert_eq!(caret, format!("{:9}\t\u{3000}{}^", "", " ".repeat(18)));
    }

    #[test]
    fn test_caret_line_at_start() {
        assert_eq!(caret_line("", 0), "^");
        assert_eq!(caret_line("x.core", 2), "  ^");
    }

    #[test]
    fn test_validation_json_is_array() {
        let reports = [validate("gts.x.core.events.type.v1~")];
        let json = format_output(&reports[..], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["classification"], "schema");
    }

    #[test]
    fn test_query_table_flags_unvalidated_text() {
        let query = parse_query("gts.x.y.z.message.v1.0@foo.bar").unwrap();
        let table = query.to_table();
        assert!(table.contains("Attribute (unvalidated): foo.bar"));
        assert!(table.contains("Attribute path: foo > bar"));
    }

    #[test]
    fn test_yaml_output() {
        let rows = [ExampleRow {
            label: "Instance",
            value: "gts.vendor.app.user.profile.v2.1",
        }];
        let yaml = format_output(&rows[..], OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("label: Instance"));
    }

    #[test]
    fn test_empty_extraction_table() {
        let found: Vec<ExtractedId> = Vec::new();
        assert_eq!(found.to_table(), "No GTS identifiers found.\n");
    }
}
