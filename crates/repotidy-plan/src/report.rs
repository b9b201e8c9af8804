//! Markdown report rendering.

use std::fmt::Write;

use humansize::{DECIMAL, format_size};
use itertools::Itertools;

use repotidy_core::{CleanupPlan, UnreferencedCandidate};

/// Render a plan as a markdown report listing every proposed action.
pub fn render_report(plan: &CleanupPlan) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, plan);
    out
}

fn write_report(out: &mut String, plan: &CleanupPlan) -> std::fmt::Result {
    let summary = &plan.summary;

    writeln!(out, "# Cleanup plan")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated {} for `{}`.",
        plan.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        plan.root.display()
    )?;
    writeln!(out)?;

    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "| | |")?;
    writeln!(out, "|---|---|")?;
    writeln!(
        out,
        "| Files scanned | {} ({}) |",
        summary.total_files,
        format_size(summary.total_bytes, DECIMAL)
    )?;
    writeln!(out, "| Duplicate groups | {} |", summary.duplicate_groups.len())?;
    writeln!(out, "| Temporary files | {} |", summary.temp_files.len())?;
    writeln!(out, "| Unnecessary docs | {} |", summary.unnecessary_docs.len())?;
    writeln!(out, "| Unused assets | {} |", summary.unused_assets.len())?;
    writeln!(
        out,
        "| Unreferenced components | {} |",
        summary.unreferenced_components.len()
    )?;
    if summary.scan_warnings > 0 {
        writeln!(out, "| Unreadable paths skipped | {} |", summary.scan_warnings)?;
    }
    writeln!(out)?;

    if !summary.by_category.is_empty() {
        let line = summary
            .by_category
            .iter()
            .map(|(category, count)| format!("{category}: {count}"))
            .join(", ");
        writeln!(out, "By category: {line}.")?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "## Proposed actions ({} delete, {} move, {} archive)",
        plan.count_kind("delete"),
        plan.count_kind("move"),
        plan.count_kind("archive")
    )?;
    writeln!(out)?;
    if plan.actions.is_empty() {
        writeln!(out, "Nothing to do.")?;
    }
    for (i, action) in plan.actions.iter().enumerate() {
        match action.target() {
            Some(target) => writeln!(
                out,
                "{}. **{}** `{}` -> `{}`: {}",
                i + 1,
                action.kind(),
                action.source(),
                target,
                action.reason()
            )?,
            None => writeln!(
                out,
                "{}. **{}** `{}`: {}",
                i + 1,
                action.kind(),
                action.source(),
                action.reason()
            )?,
        }
    }
    writeln!(out)?;

    if !summary.duplicate_groups.is_empty() {
        writeln!(out, "## Duplicate groups")?;
        writeln!(out)?;
        for group in &summary.duplicate_groups {
            writeln!(
                out,
                "- {} copies of {}: {}",
                group.count(),
                format_size(group.size, DECIMAL),
                group.paths.iter().map(|p| format!("`{p}`")).join(", ")
            )?;
        }
        writeln!(out)?;
    }

    if !summary.unreferenced_components.is_empty() || !summary.unused_assets.is_empty() {
        writeln!(out, "## Review candidates")?;
        writeln!(out)?;
        writeln!(
            out,
            "Found by a plain text search. Nothing below is proposed for removal."
        )?;
        writeln!(out)?;
        write_candidates(out, "Unreferenced components", &summary.unreferenced_components)?;
        write_candidates(out, "Unused assets", &summary.unused_assets)?;
    }

    Ok(())
}

fn write_candidates(
    out: &mut String,
    title: &str,
    candidates: &[UnreferencedCandidate],
) -> std::fmt::Result {
    if candidates.is_empty() {
        return Ok(());
    }
    writeln!(out, "### {title}")?;
    writeln!(out)?;
    for candidate in candidates {
        writeln!(out, "- `{}` (`{}`)", candidate.path, candidate.name)?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use repotidy_core::{Category, CleanupAction, ContentHash, PLAN_VERSION, PlanSummary, ScannedFile};

    #[test]
    fn test_report_lists_every_action() {
        let log = ScannedFile {
            path: "debug.log".to_string(),
            size: 12,
            content_hash: ContentHash::new([1; 32]),
            last_modified: Utc::now(),
        }
        .into_record(Category::Temp);

        let mut summary = PlanSummary {
            total_files: 1,
            total_bytes: 12,
            temp_files: vec!["debug.log".to_string()],
            ..Default::default()
        };
        summary.unreferenced_components.push(UnreferencedCandidate {
            path: "components/Button.tsx".to_string(),
            name: "Button".to_string(),
        });

        let plan = CleanupPlan {
            version: PLAN_VERSION,
            timestamp: Utc::now(),
            root: "/repo".into(),
            summary,
            actions: vec![
                CleanupAction::delete(&log, "temporary file."),
                CleanupAction::move_to(&log, "out/debug.log", "consolidate documentation."),
            ],
        };

        let report = render_report(&plan);
        assert!(report.contains("1. **delete** `debug.log`: temporary file."));
        assert!(report.contains("2. **move** `debug.log` -> `out/debug.log`"));
        assert!(report.contains("(1 delete, 1 move, 0 archive)"));
        assert!(report.contains("`components/Button.tsx` (`Button`)"));
        assert!(!report.contains("Unused assets\n"));
    }
}
