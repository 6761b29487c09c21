// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod list;
pub mod show;
pub mod watch;

use crate::config::Config;
use crate::error::Result;
use crate::sync::HttpSnapshotSource;

/// Helper to build the REST snapshot source from the current config.
pub fn snapshot_source(config: &Config) -> Result<HttpSnapshotSource> {
    let source = HttpSnapshotSource::new(config.api_base(), config.request_timeout())?;
    Ok(source)
}
