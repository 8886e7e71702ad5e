use crate::cli::{Cli, Commands};
use crate::commands::{IssueArgs, build_ledger, document_extractor};
use crate::config::Config;
use crate::json::ErrorJson;
use crate::server::{AppState, serve};
use anyhow::Result;
use certproof_core::IssueOptions;
use console::style;
use std::process::ExitCode;
use std::sync::Arc;

pub fn run(cli: Cli) -> Result<ExitCode> {
    let json = cli.json;

    let result = Config::load_or_default(cli.config.as_deref()).and_then(|config| {
        dispatch(&config, cli.command, json)
    });

    if let Err(e) = &result {
        if json {
            let causes: Vec<String> = e.chain().skip(1).map(|c| c.to_string()).collect();
            let payload = ErrorJson {
                status: "error",
                error: e.to_string(),
                causes,
            };
            println!("{}", serde_json::to_string(&payload)?);
        } else {
            eprintln!("\n{} {}", style("[ERROR]").red().bold(), style(&e).red());

            for (i, cause) in e.chain().skip(1).enumerate() {
                if i == 0 {
                    eprintln!("\n    Caused by:");
                }
                eprintln!("      - {}", style(cause).red());
            }
            eprintln!();
        }
    }

    result
}

fn dispatch(config: &Config, command: Commands, json: bool) -> Result<ExitCode> {
    match command {
        Commands::Fingerprint { fields } => {
            crate::commands::fingerprint(fields, json)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Issue {
            fields,
            ledger,
            qr_out,
            pdf,
            output,
        } => {
            let args = IssueArgs {
                fields,
                ledger,
                qr_out,
                pdf,
                output,
            };
            crate::commands::issue(config, args, json)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Verify { input, ledger } => {
            let valid = crate::commands::verify(config, input, ledger, json)?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Serve { bind, ledger } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let state = AppState {
                ledger: build_ledger(config, &ledger)?,
                extractor: Arc::new(document_extractor()),
                issue_options: IssueOptions {
                    explorer_tx_url: config.ledger.explorer_tx_url.clone(),
                },
            };
            let max_upload_bytes = config.server.max_upload_mb * 1024 * 1024;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(&bind, state, max_upload_bytes))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
