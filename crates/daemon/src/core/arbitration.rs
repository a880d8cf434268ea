//! Ownership ledger mutation and the arbitration decision.
//!
//! Grant, preemption, denial, and release. Every step is fully applied
//! (owners map + owned set + notification) before the next resource name
//! in the same request is considered.

use resourced_proto::types::{ClientId, RTYPE_GRANT, RTYPE_REPLY, STATUS_ACTIVE};

use super::{ManagerCore, ManagerState};

/// Per-resource outcomes of one arbitration pass, in request order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
	/// Names granted to the requesting client during this pass.
	pub granted: Vec<String>,
	/// Names denied because the incumbent could not be preempted.
	pub denied: Vec<String>,
}

impl ManagerCore {
	/// Arbitrate the named resources for a client.
	///
	/// Each name is processed independently, in the order given, with no
	/// rollback across entries: a free resource is granted outright, an
	/// already-owned resource is skipped without re-notifying, and an
	/// occupied one is either preempted or denied per [`super::PriorityPolicy`].
	///
	/// Unknown client ids arbitrate nothing and return an empty outcome.
	pub fn request_resources(&self, id: ClientId, resources: &[String]) -> RequestOutcome {
		let mut outcome = RequestOutcome::default();

		let mut state = self.state.lock().unwrap();
		let state = &mut *state;
		if !state.clients.contains_key(&id) {
			return outcome;
		}

		for resource in resources {
			let owner = state.owners.get(resource).copied();

			// free resource
			let Some(owner) = owner else {
				Self::grant(state, id, resource);
				outcome.granted.push(resource.clone());
				continue;
			};

			// already owns
			if owner == id {
				continue;
			}

			if self
				.policy
				.can_preempt(state.clients.get(&id), state.clients.get(&owner), resource)
			{
				Self::preempt(state, owner, id, resource);
				outcome.granted.push(resource.clone());
			} else {
				if let Some(client) = state.clients.get(&id) {
					client.notify_denied(resource);
				}
				tracing::debug!(client = %id, resource, "denied");
				outcome.denied.push(resource.clone());
			}
		}

		outcome
	}

	/// Release every resource a client holds.
	///
	/// Used for explicit release and as part of destruction. The releasing
	/// client is not notified about its own release.
	pub fn release_all(&self, id: ClientId) {
		let mut state = self.state.lock().unwrap();
		let state = &mut *state;
		let Some(client) = state.clients.get_mut(&id) else {
			return;
		};

		for resource in client.take_resources() {
			state.owners.remove(&resource);
			tracing::debug!(client = %id, resource, "released");
		}
	}

	/// Whether the owners map currently maps `resource` to `id`.
	#[must_use]
	pub fn is_owner(&self, resource: &str, id: ClientId) -> bool {
		let state = self.state.lock().unwrap();
		state.owners.get(resource) == Some(&id)
	}

	/// Whether the client currently owns at least one resource.
	#[must_use]
	pub fn owns_any(&self, id: ClientId) -> bool {
		let state = self.state.lock().unwrap();
		state
			.clients
			.get(&id)
			.is_some_and(|c| !c.resources().is_empty())
	}

	/// Issue the out-of-band grant call that follows a successful acquire.
	///
	/// Skipped with a log line when the client's outbound address is
	/// unknown; the acquisition itself already succeeded and stands.
	pub fn send_grant(&self, id: ClientId, reqno: u32, mask: u32) {
		let state = self.state.lock().unwrap();
		let Some(client) = state.clients.get(&id) else {
			return;
		};
		if client.caller().is_empty() {
			tracing::warn!(client = %id, "no outbound address, skipping grant call");
			return;
		}

		client.sink().grant(RTYPE_GRANT, id.0, reqno, mask);
		tracing::info!(client = %id, reqno, mask, "sent grant call");
	}

	/// Grant a free resource: owners map entry, owned-set entry, `granted`
	/// notification, and the parallel ACTIVE `status` notification. Both
	/// signals are a wire-compat requirement.
	fn grant(state: &mut ManagerState, id: ClientId, resource: &str) {
		state.owners.insert(resource.to_string(), id);

		let Some(client) = state.clients.get_mut(&id) else {
			return;
		};
		client.add_resource(resource);
		client.notify_granted(resource);

		let reqno = client.next_reqno();
		client
			.sink()
			.status(RTYPE_REPLY, id.0, reqno, STATUS_ACTIVE);

		tracing::info!(client = %id, resource, "granted");
	}

	/// Revoke `resource` from `owner` and grant it to `challenger`.
	fn preempt(state: &mut ManagerState, owner: ClientId, challenger: ClientId, resource: &str) {
		tracing::info!(from = %owner, to = %challenger, resource, "preempting");

		if let Some(old) = state.clients.get_mut(&owner) {
			old.remove_resource(resource);
			old.notify_lost(resource);
		}
		state.owners.remove(resource);

		Self::grant(state, challenger, resource);
	}
}
