mod cli;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use serde_json::json;

use binprep::{Diagnostic, InstallStatus, Outcome, PrepareError};

fn main() {
    let args = cli::Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    match rt.block_on(real_main(args)) {
        Ok(outcome) => {
            let body = match outcome.status {
                InstallStatus::Installed => format!("installed {}", outcome.path.display()),
                InstallStatus::AlreadyPresent => {
                    format!("{} is already up to date", outcome.path.display())
                }
            };
            println!(
                "{}",
                json!({
                    "status": "success",
                    "body": body,
                    "result": outcome.status,
                    "tag": outcome.tag,
                    "asset": outcome.asset,
                    "path": outcome.path,
                    "manifest_patched": outcome.manifest_patched,
                })
            );
        }
        Err(e) => {
            let diagnostic = match e.downcast_ref::<PrepareError>() {
                Some(prepare_error) => prepare_error.diagnostic(),
                None => Diagnostic {
                    status: "ConfigError",
                    http_status: None,
                    body: format!("{e:#}"),
                },
            };
            debug!("{e:?}");
            eprintln!(
                "{}",
                serde_json::to_string(&diagnostic).unwrap_or_else(|_| format!("{e:#}"))
            );
            std::process::exit(1);
        }
    }
}

async fn real_main(args: cli::Args) -> Result<Outcome> {
    let options = args.into_options()?;
    info!(
        "Preparing {} from {}/{}",
        options.binary, options.author, options.repository
    );
    Ok(binprep::prepare(&options).await?)
}
