// CLI definitions for sfmeta - shared between the binary and build.rs.
//
// This module contains ONLY clap-derived types with no dependencies on
// the sfmeta library internals. This allows build.rs to `include!()` this
// file for build-time man page and shell completion generation.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sfmeta")]
#[command(about = "Salesforce report metadata CLI & MCP Server")]
#[command(version)]
#[command(propagate_version = true)]
#[command(after_help = "Connection settings come from ~/.sfmeta/config.json, then\n\
    SF_INSTANCE_URL / SF_ACCESS_TOKEN / SF_API_VERSION / SF_TIMEOUT_SECS,\n\
    then the flags below.\n\
    Run 'sfmeta man [dir]' to generate man pages.\n\
    Run 'sfmeta completions <shell>' to generate shell completions.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Org base URL (e.g. https://acme.my.salesforce.com)
    #[arg(long, global = true)]
    pub instance_url: Option<String>,

    /// OAuth access token or session id
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// REST API version (e.g. 60.0)
    #[arg(long, global = true)]
    pub api_version: Option<String>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    // ==================== Reports ====================

    /// Read report metadata: columns, filters, groupings, chart
    #[command(name = "read-report")]
    ReadReport {
        /// Full report name (e.g. 'unfiled$public/Report_Name' or 'Report_Name')
        report_name: String,
    },

    /// List reports in a folder (defaults to unfiled$public and Private Reports)
    #[command(name = "list-reports")]
    ListReports {
        /// Folder to list
        #[arg(short, long)]
        folder: Option<String>,
        /// Case-insensitive filter on report name or namespace
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List report folders
    #[command(name = "list-folders")]
    ListFolders,

    // ==================== Server ====================

    /// Start MCP server over stdio (for Claude Desktop, etc.)
    Mcp,

    /// List all available tools
    Tools,

    // ==================== Meta ====================

    /// Generate man pages for sfmeta and all subcommands
    Man {
        /// Output directory for generated man pages
        #[arg(default_value = "man")]
        output_dir: String,
    },

    /// Generate shell completions and print to stdout
    Completions {
        /// Target shell (bash, zsh, fish, elvish, powershell)
        shell: clap_complete::Shell,
    },
}
