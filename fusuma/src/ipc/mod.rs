mod client;
mod server;

pub use client::IpcClient;
#[cfg_attr(not(target_os = "macos"), allow(unused_imports))]
pub use server::IpcServer;
