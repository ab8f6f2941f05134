//! REST and WebSocket surface of the console

pub mod handlers;
pub mod serve;
pub mod state;
pub mod ws;
