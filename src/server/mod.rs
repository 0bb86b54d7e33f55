pub mod api;

use crate::agent::ChatProxy;
use crate::cli::Args;
use crate::voice::VapiClient;
use self::api::AppState;
use log::{ info, warn };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    addr: String,
    proxy: Arc<ChatProxy>,
    voice: Arc<VapiClient>,
    args: Args,
}

impl Server {
    pub fn new(
        addr: String,
        proxy: Arc<ChatProxy>,
        voice: Arc<VapiClient>,
        args: Args,
    ) -> Self {
        Self {
            addr,
            proxy,
            voice,
            args,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            proxy: self.proxy.clone(),
            voice: self.voice.clone(),
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()
            .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;

        if self.args.enable_tls && self.args.tls_paths().is_none() {
            warn!("--enable-tls was set but certificate/key paths are incomplete; serving plain HTTP.");
        }
        let tls = self.args
            .tls_paths()
            .map(|(cert, key)| (cert.to_string(), key.to_string()));
        let protocol = if tls.is_some() { "https" } else { "http" };
        info!("{} server listening on: {}", protocol.to_uppercase(), addr);

        api::start_http_server(addr, self.state(), tls).await
    }
}
