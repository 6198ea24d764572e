pub mod test_client_over_websocket;
pub mod test_rooms_client;
