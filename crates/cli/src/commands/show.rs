// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use sentinel_core::Incident;

use crate::cli::OutputFormat;
use crate::colors;
use crate::config::Config;
use crate::display::format_incident_details;
use crate::error::Result;
use crate::sync::SnapshotSource;

use super::snapshot_source;

pub async fn run(config: &Config, tenant: &str, id: &str, format: OutputFormat) -> Result<()> {
    let source = snapshot_source(config)?;
    let incident = source.incident(tenant, id).await?;
    let mut out = std::io::stdout().lock();
    write_incident(&mut out, &incident, format, colors::should_colorize())
}

/// Internal implementation that accepts a writer for testing.
pub(crate) fn write_incident(
    out: &mut impl Write,
    incident: &Incident,
    format: OutputFormat,
    color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, incident)?;
            writeln!(out)?;
        }
        OutputFormat::Text => writeln!(out, "{}", format_incident_details(incident, color))?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
