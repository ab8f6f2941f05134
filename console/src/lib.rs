//! DeployHub Console Library
//!
//! Deployment orchestration core of the DeployHub console: project and
//! deployment records, the deployment driver and its strategies, and live
//! console streaming to connected clients.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod logstream;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
