//! Sender authorization policy.
//!
//! The arbitration core consults the policy before accepting a
//! registration; a rejection is a registration failure, never a silent
//! grant. The policy body is intentionally small: the daemon only
//! consumes the yes/no verdict.

use std::collections::HashSet;

/// Decides whether a transport-level caller may register clients.
pub trait SenderPolicy: Send + Sync + 'static {
	/// Whether the sender is allowed to register a client.
	fn is_allowed_sender(&self, caller: &str) -> bool;
}

/// Permissive policy: every sender may register.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl SenderPolicy for AllowAll {
	fn is_allowed_sender(&self, _caller: &str) -> bool {
		true
	}
}

/// Allowlist policy: only explicitly listed callers may register.
#[derive(Debug, Default, Clone)]
pub struct Allowlist {
	allowed: HashSet<String>,
}

impl Allowlist {
	/// Build an allowlist from caller identities.
	#[must_use]
	pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
		Self {
			allowed: allowed.into_iter().collect(),
		}
	}
}

impl SenderPolicy for Allowlist {
	fn is_allowed_sender(&self, caller: &str) -> bool {
		self.allowed.contains(caller)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allowlist_admits_only_listed_callers() {
		let policy = Allowlist::new([":1.7".to_string()]);
		assert!(policy.is_allowed_sender(":1.7"));
		assert!(!policy.is_allowed_sender(":1.8"));
		assert!(!policy.is_allowed_sender(""));
	}
}
