//! Interactive editor entry point.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::Config;
use crate::gateway::{EntryPoint, GatewayClient};
use crate::store::BufferStore;
use crate::tui::run_editor;

/// Connect once, then hand the client to the editor for its whole lifetime.
pub async fn run(cfg: &Config, file: Option<PathBuf>) -> Result<()> {
    let addr = cfg.gateway_addr();
    let mut client = GatewayClient::connect_or_offline(&addr, EntryPoint::from_config(cfg)).await;
    let store = BufferStore::new(cfg.default_extension());
    run_editor(&mut client, &store, file).await
}
