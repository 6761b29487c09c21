// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Tenant used when none is given.
pub const DEFAULT_TENANT: &str = "default-tenant";

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  sentinel list                       List incidents for the default tenant
  sentinel show INC-1                 Show an incident with its timeline
  sentinel watch default-tenant       Follow a tenant's incidents live";

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(version)]
#[command(about = "Follow security incidents and agent decisions in real time")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Config file (default: $SENTINEL_CONFIG, then <config dir>/sentinel/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log sync activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow a tenant's incidents over the push channel
    #[command(after_help = "Examples:\n  \
        sentinel watch default-tenant                 Print every incident update\n  \
        sentinel watch default-tenant -i INC-1        Start from INC-1's snapshot\n  \
        sentinel watch default-tenant -f json         One JSON object per change")]
    Watch {
        /// Tenant whose channel to subscribe to
        tenant: String,

        /// Seed the view with this incident's snapshot instead of the list
        #[arg(long, short)]
        incident: Option<String>,

        /// Output format (text, json)
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List a tenant's incidents
    List {
        /// Tenant to list incidents for
        #[arg(long, short, default_value = DEFAULT_TENANT)]
        tenant: String,

        /// Output format (text, json)
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show incident details with hypotheses and decision timeline
    #[command(arg_required_else_help = true)]
    Show {
        /// Incident ID
        id: String,

        /// Tenant the incident belongs to
        #[arg(long, short, default_value = DEFAULT_TENANT)]
        tenant: String,

        /// Output format (text, json)
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
