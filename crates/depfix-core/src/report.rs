//! Human and machine renderings of conflicts and plans. The JSON form is
//! the authoritative interface for automation; the text form mirrors the
//! CLI's historical layout.

use std::fmt::Write;

use serde_json::{json, Value};

use crate::conflict::Conflict;
use crate::resolution::{Plan, ResolutionItem, Unsolvable};

/// Machine-readable report document. Inputs arrive sorted, so the output
/// is byte-identical across runs on the same graph.
pub fn render_json(conflicts: &[Conflict], plan: Option<&Plan>) -> Value {
    let items: &[ResolutionItem] = plan.map(|p| p.items.as_slice()).unwrap_or(&[]);
    let unsolvable: &[Unsolvable] = plan.map(|p| p.unsolvable.as_slice()).unwrap_or(&[]);
    let resolvable_count: usize = items.iter().map(|item| item.satisfies.len()).sum();
    json!({
        "conflicts": conflicts,
        "plan": items,
        "unsolvable": unsolvable,
        "summary": {
            "conflict_count": conflicts.len(),
            "resolvable_count": resolvable_count,
        },
    })
}

/// Human-readable report.
pub fn render_text(conflicts: &[Conflict], plan: Option<&Plan>) -> String {
    let mut out = String::new();
    if conflicts.is_empty() {
        out.push_str("[OK] No dependency conflicts found!\n");
    } else {
        let _ = writeln!(out, "[ERROR] Found {} dependency conflicts:", conflicts.len());
        out.push('\n');
        for (index, conflict) in conflicts.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. Package: {} (v{})",
                index + 1,
                conflict.parent,
                conflict.parent_version
            );
            let _ = writeln!(out, "   Dependency: {}", conflict.dependency);
            match &conflict.installed {
                Some(installed) => {
                    let _ = writeln!(out, "   Installed: {}", installed);
                }
                None => out.push_str("   Installed: (not installed)\n"),
            }
            let _ = writeln!(out, "   Required: {}", conflict.required);
            let _ = writeln!(out, "   Type: {}", conflict.kind);
            out.push('\n');
        }
    }

    if let Some(plan) = plan {
        if !plan.items.is_empty() {
            let _ = writeln!(
                out,
                "[FIX] Resolution plan ({} packages to update):",
                plan.items.len()
            );
            out.push('\n');
            for (index, item) in plan.items.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", index + 1, item.name);
                match &item.current {
                    Some(current) => {
                        let _ = writeln!(out, "   Current: {}", current);
                    }
                    None => out.push_str("   Current: (not installed)\n"),
                }
                match &item.target {
                    Some(target) => {
                        let _ = writeln!(out, "   Target:  {}", target);
                    }
                    None => out.push_str("   Target:  (uninstall)\n"),
                }
                let _ = writeln!(out, "   Resolves: {} conflicts", item.satisfies.len());
                out.push('\n');
            }
        }
        for unsolvable in &plan.unsolvable {
            let _ = writeln!(
                out,
                "[WARN] Unresolvable: {} ({})",
                unsolvable.name, unsolvable.reason
            );
        }
    }

    out
}
