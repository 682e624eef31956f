// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::element::{Element, SliceResult};
use crate::geometry::GeometryStats;
use crate::kernel::{ElementSlice, InsideSummary, PickHit};
use crate::loader::LoadReport;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report the outcome of loading a scene
    pub fn report_load(file: &str, report: &LoadReport, duration: Duration) {
        println!();
        Self::rule();
        println!("{} {}", "Scene:".bold(), file.cyan());
        Self::rule();
        println!(
            "  {} {}   {} {}   {} {}",
            "Loaded:".bright_black(),
            report.loaded.len().to_string().green(),
            "Failed:".bright_black(),
            if report.failed.is_empty() {
                "0".green()
            } else {
                report.failed.len().to_string().red()
            },
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        for (name, error) in &report.failed {
            println!("  {} {}: {}", "✗".red(), name.yellow(), error);
        }
    }

    /// One line per element
    pub fn report_element(element: &Element) {
        let bbox = element.bounding_box();
        let extent = if bbox.is_empty() {
            "-".to_string()
        } else {
            format!(
                "[{:.2}, {:.2}, {:.2}] .. [{:.2}, {:.2}, {:.2}]",
                bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
            )
        };
        println!(
            "  {:>4}  {:<6} {:<24} {:>8}  {}",
            element.id().to_string().cyan(),
            element.kind_name().bold(),
            element.name(),
            element.vertex_count(),
            extent.bright_black()
        );
    }

    pub fn report_stats(id: i64, name: &str, stats: &GeometryStats) {
        println!("\n{} {} {}", "Mesh".bold(), id.to_string().cyan(), name);
        for line in stats.summary().lines() {
            println!("  {}", line);
        }
        if !stats.is_watertight {
            Self::report_warning("mesh is not watertight; volume is unreliable");
        }
    }

    pub fn report_slice(slices: &[ElementSlice]) {
        for slice in slices {
            match &slice.result {
                SliceResult::Polylines(loops) => {
                    let length: f64 = loops.iter().map(|l| l.length()).sum();
                    println!(
                        "  {:>4}  {} loops, perimeter {:.4}",
                        slice.id.to_string().cyan(),
                        loops.len(),
                        length
                    );
                }
                SliceResult::Selection(selection) => {
                    println!(
                        "  {:>4}  {} entries selected",
                        slice.id.to_string().cyan(),
                        selection.len()
                    );
                }
                SliceResult::Unsupported => {}
            }
        }
    }

    pub fn report_pick(hit: Option<&PickHit>) {
        match hit {
            Some(hit) => println!(
                "{} element {} at [{:.4}, {:.4}, {:.4}] (distance {:.4})",
                "Hit".green().bold(),
                hit.id.to_string().cyan(),
                hit.point.x,
                hit.point.y,
                hit.point.z,
                hit.distance
            ),
            None => println!("{}", "No hit".yellow()),
        }
    }

    pub fn report_inside(summary: &InsideSummary) {
        println!(
            "{} {} of element {} inside mesh {}",
            "Inside:".bold(),
            summary.count.to_string().cyan(),
            summary.target_id,
            summary.mesh_id
        );
        println!("  {} {:.4}", "Value sum:".bright_black(), summary.value_sum);
        println!("  {} {:.4}", "Volume:".bright_black(), summary.volume);
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }
}
