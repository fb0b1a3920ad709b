mod websocket_transport;

pub use websocket_transport::*;
