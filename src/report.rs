use crate::project_diff::{Finding, ProjectComparison};
use crate::reconcile::{ReconciliationSummary, ReportLine};
use crate::text_diff::RenderedDiff;
use std::path::Path;

const SEPARATOR: &str = "----------------------------------------";

pub fn print_difference(line: &ReportLine, local_path: &Path, diff: &RenderedDiff) {
    for l in format_difference(line, local_path, diff) {
        println!("{l}");
    }
}

pub fn print_reconciliation_summary(summary: &ReconciliationSummary) {
    for l in format_reconciliation_summary(summary) {
        println!("{l}");
    }
}

pub fn print_comparison(comparison: &ProjectComparison, project_a: &str, project_b: &str) {
    for l in format_comparison(comparison, project_a, project_b) {
        println!("{l}");
    }
}

fn format_difference(line: &ReportLine, local_path: &Path, diff: &RenderedDiff) -> Vec<String> {
    let mut lines = vec![
        SEPARATOR.to_string(),
        format!("Diff found!: {line}"),
        format!("   file: {}", local_path.display()),
        String::new(),
    ];
    lines.extend(diff.as_str().lines().map(str::to_string));
    lines.push(SEPARATOR.to_string());
    lines
}

fn format_reconciliation_summary(summary: &ReconciliationSummary) -> Vec<String> {
    let mut lines = vec![String::new(), "SUMMARY".to_string()];
    if summary.lines.is_empty() {
        lines.push("   no differences".to_string());
    }
    lines.extend(summary.lines.iter().map(|l| format!("   {l}")));
    lines.push(String::new());
    lines.push(format!("scripts compared: {}", summary.scripts_compared));
    lines.extend(summary.errors.to_string().lines().map(str::to_string));
    lines
}

fn format_comparison(comparison: &ProjectComparison, project_a: &str, project_b: &str) -> Vec<String> {
    let mut lines = vec![format!("A: {project_a}"), format!("B: {project_b}")];
    for (title, findings) in [
        ("Settings", &comparison.settings),
        ("Functions", &comparison.functions),
        ("Actions", &comparison.actions),
    ] {
        lines.push(String::new());
        lines.push(format!("{title}:"));
        if findings.is_empty() {
            lines.push("   no differences".to_string());
        }
        for finding in findings {
            lines.extend(format_finding(finding));
        }
    }
    lines
}

fn format_finding(finding: &Finding) -> Vec<String> {
    let mut lines = vec![format!("   {finding}")];
    if let Some(diff) = finding.diff() {
        lines.extend(diff.as_str().lines().map(|l| format!("      {l}")));
    }
    lines
}
