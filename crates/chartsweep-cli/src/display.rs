//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - The release list shown before `delete-all` asks for confirmation
//! - Workflow summaries and per-item failures

use chartsweep_repo::{
    DeleteAllOptions, DeleteAllReport, DeleteChangedReport, FailedItem, IndexUpdate, Release,
};
use console::style;

/// List the releases `delete-all` is about to remove
pub fn print_release_preview(releases: &[Release], options: &DeleteAllOptions) {
    println!("{}", style("The following releases will be deleted:").bold());
    for release in releases {
        println!(
            "  - {} (tag: {})",
            style(release.display_name()).cyan(),
            release.tag_name
        );
    }
    println!();
    println!("Total: {} release(s)", style(releases.len()).bold());
    if options.with_tags {
        println!("{} Their tags will also be deleted", style("⚠").yellow());
    }
    if options.clean_index {
        println!("{} All chart index entries will be removed", style("⚠").yellow());
    }
}

pub fn print_delete_all_summary(report: &DeleteAllReport) {
    if report.releases_found == 0 {
        println!("{} No releases found", style("✓").green().bold());
        return;
    }
    if report.cancelled {
        println!("{} Deletion cancelled", style("→").blue().bold());
        return;
    }

    println!(
        "{} Deleted {} of {} release(s)",
        style("✓").green().bold(),
        report.releases_deleted.len(),
        report.releases_found
    );
    if !report.tags_deleted.is_empty() {
        println!("  Deleted {} tag(s)", report.tags_deleted.len());
    }
    if let Some(update) = &report.index {
        print_index_update(update);
    }
    print_failures(&report.failures);
}

pub fn print_delete_changed_summary(report: &DeleteChangedReport) {
    if report.changed_files == 0 {
        println!("{} No chart changes found", style("✓").green().bold());
        return;
    }
    if report.charts.is_empty() {
        println!("{} No changed charts to delete", style("✓").green().bold());
        return;
    }

    println!("{}", style("Charts:").bold());
    for chart in &report.charts {
        let tag = chart.release_name();
        let state = if report.releases_deleted.contains(&tag) {
            style("release deleted").green()
        } else if report.releases_missing.contains(&tag) {
            style("no release").dim()
        } else {
            style("release kept").red()
        };
        println!("  - {} ({})", style(chart).cyan(), state);
    }

    if !report.tags_deleted.is_empty() {
        println!("  Deleted {} tag(s)", report.tags_deleted.len());
    }
    for chart in &report.index_missing {
        println!("  {} {} was not in the index", style("•").dim(), chart);
    }
    if let Some(update) = &report.index {
        print_index_update(update);
    }
    print_failures(&report.failures);
}

pub fn print_index_update(update: &IndexUpdate) {
    match update {
        IndexUpdate::Unchanged => {
            println!("{} Index unchanged", style("✓").green().bold());
        }
        IndexUpdate::Committed { message } => {
            let subject = message.lines().next().unwrap_or_default();
            println!(
                "{} Index updated: {}",
                style("✓").green().bold(),
                style(subject).cyan()
            );
        }
    }
}

fn print_failures(failures: &[FailedItem]) {
    if failures.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{}", style(format!("{} failure(s):", failures.len())).red().bold());
    for failure in failures {
        eprintln!("  {} {}: {}", style("✗").red(), failure.item, failure.error);
    }
}
