pub mod mesh_tests;
pub mod ws_tests;

use meshcall_server::{RoomRegistry, SignalingRelay};
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_relay() -> SignalingRelay {
    SignalingRelay::new(RoomRegistry::new(), Vec::new())
}
