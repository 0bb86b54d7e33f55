pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod session;
pub mod voice;
pub mod widget;

use agent::ChatProxy;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;
use voice::{ VapiClient, VoiceConfig };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat API Key Set: {}", args.resolved_chat_api_key().is_some());
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or(llm::DEFAULT_CHAT_MODEL));
    info!("Chat URL: {}", args.chat_base_url.as_deref().unwrap_or(llm::DEFAULT_CHAT_BASE_URL));
    info!("Site URL: {}", args.site_url.as_deref().unwrap_or(llm::DEFAULT_SITE_URL));
    info!("Upstream Timeout (s): {}", args.upstream_timeout_secs);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Voice API Key Set: {}", args.vapi_api_key.is_some());
    info!("Voice URL: {}", args.vapi_base_url);
    info!("TLS Enabled: {}", args.tls_paths().is_some());
    info!("-------------------------");

    let proxy = Arc::new(ChatProxy::from_args(&args)?);
    let voice = Arc::new(VapiClient::new(VoiceConfig::from_args(&args))?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, proxy, voice, args);
    server.run().await?;

    Ok(())
}
