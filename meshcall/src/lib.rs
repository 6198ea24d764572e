pub use meshcall_core::model::{MemberId, RoomId, SignalMessage};

pub mod model {
    pub use meshcall_core::model::*;
    pub use meshcall_core::utils::MAX_USERS;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshcall_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}
