//! The output sink (component I): the only seam between commands and the
//! process's standard streams, so `--json`, `--quiet`, `--dry-run`, and
//! `--no-color` compose coherently regardless of which command is running.
//!
//! Nothing outside this crate writes to stdout; verbose HTTP logging (the
//! transport's concern) is routed through `tracing` to stderr instead, so
//! the two never interleave on the same stream.

use std::io::IsTerminal;

use core_batch::Report as BatchReport;
use core_error::ClientError;
use core_width::pad_to;
use serde_json::Value;

/// Flags resolved once from the global CLI arguments and threaded through
/// every command handler.
#[derive(Debug, Clone, Copy)]
pub struct Sink {
    json: bool,
    quiet: bool,
    no_color: bool,
    dry_run: bool,
}

impl Sink {
    pub fn new(json: bool, quiet: bool, no_color: bool, dry_run: bool) -> Self {
        Self {
            json,
            quiet,
            no_color,
            dry_run,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Colour is only sanctioned when the caller hasn't forced it off and
    /// stdout is actually a terminal; a pipe or redirect disables it
    /// unconditionally, independent of `--no-color`.
    pub fn color_enabled(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }

    /// Emit a successful result to stdout. `human` is only invoked when
    /// `--json` is not set, so callers can defer any non-trivial rendering.
    /// Suppressed entirely under `--quiet`.
    pub fn success(&self, value: Value, human: impl FnOnce() -> String) {
        if self.quiet {
            return;
        }
        if self.json {
            println!("{value}");
        } else {
            println!("{}", human());
        }
    }

    /// Emit a dry-run descriptor in place of a mutating call's result.
    /// Dry-run output is still a success payload, so it honours the same
    /// `--json`/`--quiet` duality as [`Sink::success`].
    pub fn dry_run_descriptor(&self, value: Value, human: impl FnOnce() -> String) {
        self.success(value, human)
    }

    /// Emit a failure to stderr. Diagnostics are never suppressed by
    /// `--quiet` (§6: "errors to stderr remain").
    pub fn error(&self, err: &ClientError) {
        if self.json {
            eprintln!("{}", err.to_json());
        } else {
            eprintln!("{}", err.display_line());
        }
    }

    /// Render a batch [`BatchReport`]: one line per key, then the summary
    /// line, honouring `--json`/`--quiet` as any other success payload.
    pub fn batch_report(&self, report: &BatchReport) {
        if self.quiet {
            return;
        }
        if self.json {
            let records: Vec<Value> = report
                .records
                .iter()
                .map(|r| match &r.outcome {
                    core_batch::Outcome::Success => serde_json::json!({
                        "key": r.key,
                        "success": true,
                    }),
                    core_batch::Outcome::Failure(err) => serde_json::json!({
                        "key": r.key,
                        "success": false,
                        "message": err.display_line(),
                    }),
                })
                .collect();
            let value = serde_json::json!({
                "records": records,
                "processed": report.records.len(),
                "succeeded": report.succeeded(),
                "failed": report.failed(),
            });
            println!("{value}");
        } else {
            for record in &report.records {
                println!("{}", record.display_line());
            }
            println!("{}", report.summary_line());
        }
    }

    /// Render a dry-run batch preview list.
    pub fn batch_previews(&self, previews: &[core_batch::Preview]) {
        if self.quiet {
            return;
        }
        if self.json {
            let items: Vec<Value> = previews
                .iter()
                .map(|p| serde_json::json!({"key": p.key, "description": p.description}))
                .collect();
            println!("{}", serde_json::json!({"previews": items}));
        } else {
            for preview in previews {
                println!("{}", preview.display_line());
            }
        }
    }

    /// Print a width-aware, padded table: a header row, then data rows,
    /// with each column padded to the widest cell's terminal column count
    /// (see `core_width`, the only sanctioned way to align output that may
    /// contain CJK or emoji content). No-op under `--json` or `--quiet`.
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.quiet || self.json {
            return;
        }
        let mut widths: Vec<usize> = headers.iter().map(|h| core_width::string_width(h)).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(core_width::string_width(cell));
                }
            }
        }

        let header_line: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| pad_to(h, widths[i]))
            .collect();
        println!("{}", header_line.join("  "));

        for row in rows {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| pad_to(cell, widths.get(i).copied().unwrap_or(0)))
                .collect();
            println!("{}", line.join("  "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_batch::{Outcome, Record};

    #[test]
    fn quiet_suppresses_success_but_not_error() {
        let sink = Sink::new(false, true, true, false);
        assert!(sink.quiet);
        // error() always writes regardless of quiet; nothing to assert on
        // stdout capture here beyond the flag itself, covered by the
        // batch/table no-ops below.
    }

    #[test]
    fn json_mode_is_reported() {
        let sink = Sink::new(true, false, false, false);
        assert!(sink.is_json());
    }

    #[test]
    fn dry_run_flag_is_reported() {
        let sink = Sink::new(false, false, false, true);
        assert!(sink.is_dry_run());
    }

    #[test]
    fn color_disabled_when_no_color_flag_set() {
        let sink = Sink::new(false, false, true, false);
        assert!(!sink.color_enabled());
    }

    #[test]
    fn batch_report_summary_matches_format() {
        let report = BatchReport {
            records: vec![
                Record { key: "A".into(), outcome: Outcome::Success },
                Record { key: "B".into(), outcome: Outcome::Failure(ClientError::User("nope".into())) },
            ],
        };
        assert_eq!(report.summary_line(), "2 processed: 1 succeeded, 1 failed");
    }
}
