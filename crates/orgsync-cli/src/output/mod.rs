use std::io::Write;

use orgsync_engine::{OutputFormat, Report};

/// Render a report to a string in the requested format.
pub fn render<R: Report>(report: &R, format: OutputFormat) -> anyhow::Result<String> {
    Ok(report.render(format)?)
}

/// Print a report to stdout in the requested format.
pub fn output<R: Report>(report: &R, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(report, format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
