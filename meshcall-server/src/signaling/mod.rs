mod member_channel;
mod relay;
mod ws_handler;

pub use member_channel::*;
pub use relay::*;
pub use ws_handler::*;
