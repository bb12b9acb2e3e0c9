use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use linbin_common::Result;

use crate::binner::BinReport;

pub fn print_summary(report: &BinReport) {
    let t = &report.tally;
    println!("{:<16} [{}, {}]", "Range:", report.grid.a(), report.grid.b());
    println!("{:<16} {}", "Grid points:", report.grid.m());
    println!("{:<16} {}", "Spacing:", report.grid.delta());
    println!("{:<16} {}", "Binned:", t.binned);
    println!("{:<16} {}", "Clipped:", t.clipped);
    println!("{:<16} {}", "Discarded:", t.discarded);
    if t.skipped_non_finite > 0 {
        println!("{:<16} {}", "Non-finite:", t.skipped_non_finite);
    }
    println!("{:<16} {}", "Total mass:", report.total_mass());
}

/// One `point<TAB>count` line per grid point.
pub fn render_text(report: &BinReport, precision: usize) -> String {
    let mut out = String::new();
    for (p, c) in report.points().iter().zip(&report.gcounts) {
        let _ = writeln!(out, "{p:.precision$}\t{c:.precision$}");
    }
    out
}

pub fn render_csv(report: &BinReport) -> String {
    let mut out = String::from("index,point,count\n");
    for (i, (p, c)) in report.points().iter().zip(&report.gcounts).enumerate() {
        let _ = writeln!(out, "{i},{p},{c}");
    }
    out
}

pub fn report_json(report: &BinReport) -> serde_json::Value {
    serde_json::json!({
        "grid": report.grid,
        "delta": report.grid.delta(),
        "points": report.points(),
        "gcounts": report.gcounts,
        "tally": report.tally,
        "warnings": report.warnings,
    })
}

pub fn export_json(output_path: &Path, report: &BinReport) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    serde_json::to_writer_pretty(&mut file, &report_json(report))?;
    writeln!(file)?;
    Ok(())
}

pub fn export_csv(output_path: &Path, report: &BinReport) -> Result<()> {
    std::fs::write(output_path, render_csv(report))?;
    Ok(())
}
