//! Output formatting for bridgegen runs.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticReport, Severity};
use crate::generate::{OutputStatus, Summary};

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub command: &'a str,
    pub config: &'a str,
    pub passed: bool,
    pub files_scanned: usize,
    pub methods: usize,
    pub namespaces: &'a [String],
    pub outputs: Vec<JsonOutput>,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
pub struct JsonOutput {
    pub name: String,
    pub path: String,
    pub status: OutputStatus,
}

/// Build the JSON report of a finished run.
pub fn json_report<'a>(
    command: &'a str,
    config: &'a str,
    diagnostics: &'a DiagnosticReport,
    summary: &'a Summary,
    passed: bool,
) -> JsonReport<'a> {
    JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        command,
        config,
        passed,
        files_scanned: summary.files,
        methods: summary.methods,
        namespaces: &summary.namespaces,
        outputs: summary
            .outputs
            .iter()
            .map(|o| JsonOutput {
                name: o.name.to_string(),
                path: o.path.display().to_string(),
                status: o.status,
            })
            .collect(),
        errors: diagnostics.count(Severity::Error),
        warnings: diagnostics.count(Severity::Warning),
        diagnostics: &diagnostics.diagnostics,
    }
}

/// Write results in JSON format.
pub fn write_json(
    command: &str,
    config: &str,
    diagnostics: &DiagnosticReport,
    summary: &Summary,
    passed: bool,
) -> anyhow::Result<()> {
    let report = json_report(command, config, diagnostics, summary, passed);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in colored terminal format.
pub fn write_pretty(
    command: &str,
    config: &str,
    diagnostics: &DiagnosticReport,
    summary: &Summary,
    passed: bool,
) {
    // Header
    println!();
    print!("  ");
    print!("{}", "bridgegen".cyan().bold());
    println!(" v{}  {}", env!("CARGO_PKG_VERSION"), command.dimmed());
    println!();

    print!("  {}", "Config:     ".dimmed());
    println!("{}", config);
    print!("  {}", "Scanned:    ".dimmed());
    println!("{} files", summary.files);
    print!("  {}", "Exposed:    ".dimmed());
    println!(
        "{} methods in {} namespaces",
        summary.methods,
        summary.namespaces.len()
    );
    println!();

    if !diagnostics.is_empty() {
        write_diagnostics(&diagnostics.diagnostics);
        println!();
    }

    write_outputs(summary);
    println!();

    write_final_status(diagnostics, passed);
    println!();
}

fn write_diagnostics(diagnostics: &[Diagnostic]) {
    println!("  {} ({}):", "Diagnostics".bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        write_severity_tag(&d.severity);
        print!("   ");
        print!("{:<26}", d.code.as_str().dimmed());
        print!("{}", d.file.blue());
        if d.line > 0 {
            print!("{}", format!(":{}", d.line).dimmed());
        }
        println!();

        // Message on next line, indented
        match &d.qualifier {
            Some(q) => println!("            {}: {}", q.bold(), d.message),
            None => println!("            {}", d.message),
        }
        println!();
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_outputs(summary: &Summary) {
    println!("  {}", "Outputs:".bold());
    for output in &summary.outputs {
        let status = match output.status {
            OutputStatus::Written => "written  ".green(),
            OutputStatus::Unchanged => "unchanged".dimmed(),
            OutputStatus::Stale => "stale    ".red(),
        };
        println!("    {:<8} {} {}", output.name, status, output.path.display());
    }
}

fn write_final_status(diagnostics: &DiagnosticReport, passed: bool) {
    let errors = diagnostics.count(Severity::Error);
    let warnings = diagnostics.count(Severity::Warning);
    print!(
        "  {}",
        format!("{} errors, {} warnings", errors, warnings).dimmed()
    );
    print!("  ");

    if passed {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
    use crate::generate::OutputReport;
    use std::path::PathBuf;

    #[test]
    fn test_json_report() {
        let mut diagnostics = DiagnosticReport::new();
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::InvalidNamespace, "/app/src/a.ts", 4, "bad namespace")
                .with_qualifier("getUser"),
        );
        let summary = Summary {
            files: 3,
            methods: 2,
            namespaces: vec!["systemAPI".into(), "userAPI".into()],
            outputs: vec![OutputReport {
                name: "backend",
                path: PathBuf::from("/app/src/main/bridge.generated.ts"),
                status: OutputStatus::Written,
            }],
        };

        let report = json_report("generate", "bridgegen.yaml", &diagnostics, &summary, true);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["command"], "generate");
        assert_eq!(value["files_scanned"], 3);
        assert_eq!(value["warnings"], 1);
        assert_eq!(value["errors"], 0);
        assert_eq!(value["outputs"][0]["status"], "written");
        assert_eq!(value["diagnostics"][0]["code"], "invalid_namespace");
        assert_eq!(value["diagnostics"][0]["qualifier"], "getUser");
        assert_eq!(value["namespaces"][1], "userAPI");
    }
}
