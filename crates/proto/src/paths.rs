//! Socket path resolution for the daemon.

use std::path::PathBuf;

/// Returns the default socket path for the resourced daemon.
///
/// Prioritizes writable directories so the daemon can bind its IPC socket
/// even in restricted environments (containers, sandboxed sessions).
///
/// # Resolution Order
///
/// 1. `RESOURCED_SOCKET` environment variable.
/// 2. System runtime directory (e.g., `$XDG_RUNTIME_DIR`).
/// 3. System temp directory (e.g., `/tmp`).
///
/// The default file name is `resourced.sock`.
#[must_use]
pub fn default_socket_path() -> PathBuf {
	if let Ok(p) = std::env::var("RESOURCED_SOCKET") {
		return PathBuf::from(p);
	}

	// Try runtime dir first (XDG_RUNTIME_DIR), falling back to /tmp if unwritable.
	dirs::runtime_dir()
		.filter(|p| std::fs::create_dir_all(p).is_ok())
		.unwrap_or_else(std::env::temp_dir)
		.join("resourced.sock")
}
