// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use sentinel_core::Incident;

use crate::cli::OutputFormat;
use crate::colors;
use crate::config::Config;
use crate::display::{format_incident_line, format_list_summary};
use crate::error::Result;
use crate::sync::SnapshotSource;

use super::snapshot_source;

pub async fn run(config: &Config, tenant: &str, format: OutputFormat) -> Result<()> {
    let source = snapshot_source(config)?;
    let incidents = source.incidents(tenant).await?;
    let mut out = std::io::stdout().lock();
    write_list(&mut out, &incidents, format, colors::should_colorize())
}

/// Internal implementation that accepts a writer for testing.
pub(crate) fn write_list(
    out: &mut impl Write,
    incidents: &[Incident],
    format: OutputFormat,
    color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, incidents)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(out, "{}", format_list_summary(incidents))?;
            for incident in incidents {
                writeln!(out, "{}", format_incident_line(incident, color))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
