use std::io::Write;

use tracing::info;

use depfix_core::{report, CancelToken, DepfixConfig, DepfixResult};
use depfix_pip::PlanExecutor;
use depfix_resolver::ConflictResolver;

/// Execute the fix command: scan, resolve, confirm, apply.
pub async fn execute(config: &DepfixConfig, json: bool, dry_run: bool, yes: bool) -> DepfixResult<i32> {
    let (pip, map) = super::load_environment(config).await?;
    let conflicts = super::detect_all(&pip, &map).await;
    if conflicts.is_empty() {
        if !json {
            println!("[OK] No conflicts to fix!");
        }
        return Ok(crate::EXIT_OK);
    }

    let index = depfix_resolver::create_index(config)?;
    let resolver = ConflictResolver::new(index);
    let cancel = CancelToken::new();
    let plan = resolver.resolve(&map, &conflicts, &cancel).await?;

    if json {
        let document = report::render_json(&conflicts, Some(&plan));
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", report::render_text(&conflicts, Some(&plan)));
    }

    if plan.items.is_empty() {
        return Ok(crate::EXIT_CONFLICTS);
    }

    if !yes && !dry_run && !confirm("Proceed with applying fixes?")? {
        info!("fix application cancelled");
        return Ok(crate::EXIT_OK);
    }

    let executor = PlanExecutor::new(pip).dry_run(dry_run);
    let outcome = executor.execute(&plan, &cancel).await;
    if !outcome.success() {
        return Ok(crate::EXIT_ERROR);
    }
    Ok(if plan.fully_resolved() {
        crate::EXIT_OK
    } else {
        crate::EXIT_CONFLICTS
    })
}

fn confirm(prompt: &str) -> DepfixResult<bool> {
    print!("{} (y/N): ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
