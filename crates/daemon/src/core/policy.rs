//! Priority comparison policy.

use super::client::ResourceClient;

/// Pure preemption decision between two competing clients.
///
/// Deliberately a simple total order with no tie-break, no aging, and no
/// resource-specific override: equal priority never preempts, so a
/// resource sticks with its first claimant until released voluntarily or
/// claimed by a strictly higher priority.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityPolicy;

impl PriorityPolicy {
	/// Whether `challenger` may take `resource` from `incumbent`.
	///
	/// Absent or unresolved parties never preempt.
	#[must_use]
	pub fn can_preempt(
		&self,
		challenger: Option<&ResourceClient>,
		incumbent: Option<&ResourceClient>,
		_resource: &str,
	) -> bool {
		let (Some(challenger), Some(incumbent)) = (challenger, incumbent) else {
			return false;
		};

		// Strictly higher priority preempts; equal or lower never does.
		challenger.priority() > incumbent.priority()
	}
}
