mod rooms_api;

pub use rooms_api::*;
