// ABOUTME: Shared helper for building an engine from the Portainer config.
// ABOUTME: Resolves the API key and wires the HTTP transport into the client.

use rollcall::api::PortainerClient;
use rollcall::config::Config;
use rollcall::engine::Engine;
use rollcall::error::Result;
use rollcall::output::Output;
use rollcall::transport::HttpTransport;
use tokio_util::sync::CancellationToken;

pub type PortainerEngine = Engine<PortainerClient<HttpTransport>>;

/// Engine talking to the configured Portainer instance.
pub fn connect(
    config: &Config,
    cancel: CancellationToken,
    output: &Output,
) -> Result<PortainerEngine> {
    let api_key = config.portainer.api_key.resolve()?;
    let transport = HttpTransport::new(&config.portainer.url, &api_key, config.portainer.timeout)?;

    output.progress(&format!(
        "  → Using {} (environment {})",
        transport.base_url(),
        config.environment
    ));

    Ok(Engine::new(PortainerClient::new(transport)).with_cancellation(cancel))
}
