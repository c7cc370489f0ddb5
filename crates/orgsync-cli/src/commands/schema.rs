use orgsync_config::DesiredState;

/// Handle `orgsync schema`.
pub fn handle() -> anyhow::Result<()> {
    let schema = serde_json::to_string_pretty(&DesiredState::json_schema())?;
    println!("{schema}");
    Ok(())
}
