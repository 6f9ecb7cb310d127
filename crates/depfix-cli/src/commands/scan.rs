use depfix_core::{report, DepfixConfig, DepfixResult};

/// Execute the scan command.
pub async fn execute(config: &DepfixConfig, json: bool) -> DepfixResult<i32> {
    let (pip, map) = super::load_environment(config).await?;
    let conflicts = super::detect_all(&pip, &map).await;

    if json {
        let document = report::render_json(&conflicts, None);
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", report::render_text(&conflicts, None));
    }

    Ok(if conflicts.is_empty() {
        crate::EXIT_OK
    } else {
        crate::EXIT_CONFLICTS
    })
}
