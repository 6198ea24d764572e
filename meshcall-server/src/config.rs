use clap::Parser;
use meshcall_core::IceServerConfig;
use meshcall_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "meshcall-server", about = "Signaling relay for mesh audio rooms")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "MESHCALL_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// STUN/TURN urls handed to clients in `welcome`.
    #[arg(
        long = "ice-server",
        env = "MESHCALL_ICE_SERVERS",
        value_delimiter = ',',
        default_values = [DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2]
    )]
    pub ice_servers: Vec<String>,

    #[arg(long, env = "MESHCALL_TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "MESHCALL_TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,
}

impl ServerConfig {
    pub fn ice_server_configs(&self) -> Vec<IceServerConfig> {
        if self.ice_servers.is_empty() {
            return Vec::new();
        }
        vec![IceServerConfig {
            urls: self.ice_servers.clone(),
            username: self.turn_username.clone(),
            credential: self.turn_credential.clone(),
        }]
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ice_servers: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
            turn_username: None,
            turn_credential: None,
        }
    }
}
