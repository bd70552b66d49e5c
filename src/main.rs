use anyhow::Result;
use is_terminal::IsTerminal;
use std::io;
use std::process::ExitCode;

use flexcode::cli::{Cli, Commands};
use flexcode::config::Config;
use flexcode::handlers;
use flexcode::logging;
use flexcode::printer::TextPrinter;

#[tokio::main]
async fn main() -> ExitCode {
    let printer = TextPrinter { color: io::stderr().is_terminal() };
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            printer.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Cli::parse();

    let mut cfg = Config::load();
    // CLI overrides config
    if let Some(host) = &args.host {
        cfg.set("FLEXCODE_GATEWAY_HOST", host.clone());
    }
    if let Some(port) = args.port {
        cfg.set("FLEXCODE_GATEWAY_PORT", port.to_string());
    }

    if let Err(e) = logging::init(&cfg) {
        // Logging is best effort; the editor still works without it.
        eprintln!("warning: {e:#}");
    }

    match args.command {
        Some(Commands::Run { file, raw }) => {
            let text = handlers::run::run(&cfg, file.as_deref(), raw).await?;
            TextPrinter { color: io::stdout().is_terminal() }.print(&text);
            Ok(())
        }
        Some(Commands::Config) => {
            let printer = TextPrinter { color: io::stdout().is_terminal() };
            let source = if cfg.exists_on_disk() { "" } else { " (not present)" };
            printer.info("# config file:", &format!("{}{}", cfg.config_path.display(), source));
            for (k, v) in cfg.entries() {
                println!("{k}={v}");
            }
            Ok(())
        }
        None => handlers::editor::run(&cfg, args.file).await,
    }
}
