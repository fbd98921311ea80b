pub mod codec;
pub mod command;

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

pub use codec::{decode, encode};
pub use command::{ApplicationInfo, BindingInfo, Command, Response};

/// Overrides the control socket location.
pub const SOCKET_ENV: &str = "FUSUMA_SOCKET";

const SOCKET_NAME: &str = "fusuma.sock";

/// Control socket of the running daemon: `$FUSUMA_SOCKET`, else `fusuma.sock`
/// in the per-user `$TMPDIR`, else in `/tmp`.
pub fn socket_path() -> PathBuf {
    resolve_socket_path(env::var_os(SOCKET_ENV), env::var_os("TMPDIR"))
}

pub fn resolve_socket_path(explicit: Option<OsString>, tmpdir: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    tmpdir
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(SOCKET_NAME)
}
