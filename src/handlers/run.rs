//! Headless run: one program in, one result out.

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::execution::{self, ExecutionResult};
use crate::gateway::{EntryPoint, GatewayClient, RemoteExecution};
use crate::store::BufferStore;

pub async fn run(cfg: &Config, file: Option<&Path>, raw: bool) -> Result<String> {
    let program = read_program(cfg, file)?;
    let addr = cfg.gateway_addr();
    let mut client = GatewayClient::connect(&addr, EntryPoint::from_config(cfg)).await?;
    run_with(&mut client, &program, raw).await
}

/// Submit `program` and return the text to print.
pub async fn run_with<R: RemoteExecution>(remote: &mut R, program: &str, raw: bool) -> Result<String> {
    let ExecutionResult { raw: reply, output } = execution::execute(remote, program)
        .await
        .with_context(|| format!("running program via {}", remote.describe()))?;
    Ok(if raw { reply } else { output })
}

fn read_program(cfg: &Config, file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => {
            let text = BufferStore::new(cfg.default_extension()).open(path)?;
            Ok(execution::program_text(&text))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading program from stdin")?;
            Ok(execution::program_text(&buf))
        }
    }
}
