//! sfmeta CLI

#[path = "../cli.rs"]
mod cli;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OutputFormat};
use sfmeta::config::Config;
use sfmeta::mcp::McpServer;
use sfmeta::tools::{self, ListReportFoldersTool, ListReportsTool, ReadReportTool};
use sfmeta::{observability, Connection, SalesforceConnection, Tool, ToolResult};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { command, output, instance_url, access_token, api_version } = Cli::parse();
    observability::init_tracing();

    let connect = move || -> anyhow::Result<Arc<dyn Connection>> {
        let mut config = Config::load()?;
        config.apply_flags(instance_url, access_token, api_version);
        Ok(Arc::new(SalesforceConnection::from_config(&config)?))
    };

    let result: ToolResult = match command {
        Commands::ReadReport { report_name } => {
            ReadReportTool::new(connect()?)
                .execute(serde_json::json!({"reportName": report_name}))
                .await
        }

        Commands::ListReports { folder, search } => {
            ListReportsTool::new(connect()?)
                .execute(serde_json::json!({"folder": folder, "searchPattern": search}))
                .await
        }

        Commands::ListFolders => {
            ListReportFoldersTool::new(connect()?)
                .execute(serde_json::json!({}))
                .await
        }

        Commands::Mcp => {
            let server = McpServer::new(tools::all_tools(connect()?));
            server.run().await?;
            return Ok(());
        }

        Commands::Tools => {
            for descriptor in tools::descriptors() {
                let summary = descriptor.description.lines().next().unwrap_or_default();
                println!("{}: {}", descriptor.name, summary);
            }
            return Ok(());
        }

        Commands::Man { output_dir } => {
            write_man_pages(Path::new(&output_dir))?;
            println!("Man pages written to {output_dir}");
            return Ok(());
        }

        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sfmeta", &mut std::io::stdout());
            return Ok(());
        }
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            if result.success {
                print!("{}", result.output);
                if !result.output.ends_with('\n') { println!(); }
            } else {
                eprintln!("Error: {}", result.error.unwrap_or_default());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn write_man_pages(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let cmd = Cli::command();

    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buf)?;
    std::fs::write(dir.join("sfmeta.1"), buf)?;

    for sub in cmd.get_subcommands() {
        if sub.get_name() == "help" {
            continue;
        }
        let name = format!("sfmeta-{}", sub.get_name());
        let name_static: &'static str = name.clone().leak();
        let mut buf = Vec::new();
        clap_mangen::Man::new(sub.clone().name(name_static)).render(&mut buf)?;
        std::fs::write(dir.join(format!("{name}.1")), buf)?;
    }
    Ok(())
}
