//! Arbitration core: who owns which device resource, and who may take it.
//!
//! # Purpose
//!
//! - Define the manager that tracks registered resource clients and the exclusive ownership of named device resources (audio playback, display, hardware keys, ...).
//! - Describe the priority-based preemption decision: a strictly higher-priority request revokes the incumbent's ownership; equal or lower priority is denied.
//! - Define the notification side effects (`granted` / `lost` / `denied` / `status`) emitted once per ownership change, in the order changes occur.
//! - Exclude wire framing, connection setup, and sender policy bodies; see the `ipc`, `service`, and `security` modules.
//!
//! # Mental model
//!
//! - The manager is process-wide state created at daemon start and torn down at exit.
//! - Each registered caller becomes a [`ResourceClient`] with an assigned id, an opaque handle for outbound routing, a priority, and a set of owned resource names.
//! - The owners map (resource name to client id) is the single source of truth for ownership; per-client owned sets are its exact inverse image.
//! - Multi-resource requests are processed name by name with no rollback; partial success is normal.
//! - Preemption is synchronous and unconditional once decided; the incumbent is not asked to confirm.
//! - Every mutating operation runs to completion under one lock, so no two arbitration decisions ever interleave.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`ManagerCore`] | Authoritative arbitration state machine | MUST be the only owner of client/ownership maps | `ManagerCore::*` |
//! | [`ResourceClient`] | One registered caller | MUST keep its owned set matching the owners map | `ManagerCore::register_client`, `ManagerCore::request_resources` |
//! | [`PriorityPolicy`] | Pure preemption decision | MUST NOT hold state | `ManagerCore::request_resources` |
//! | [`NotificationSink`] | Outbound notification capability | MUST NOT block | `service::ManagerService` |
//! | [`RequestOutcome`] | Per-resource results of one arbitration pass | Order follows the request | `ManagerCore::request_resources` |
//!
//! # Invariants
//!
//! 1. A resource name MUST appear in at most one client's owned set, and the owners map entry (if present) MUST name exactly that client.
//!    - Enforced in: `ManagerCore::request_resources`, `ManagerCore::release_all`
//!    - Tested by: `core::tests::arbitration::exclusivity_held_across_preemption_chain`
//!    - Failure symptom: two processes drive the same audio sink at once.
//!
//! 2. Requesting a resource the client already owns MUST NOT change the ledger or re-notify.
//!    - Enforced in: `ManagerCore::request_resources`
//!    - Tested by: `core::tests::arbitration::reacquire_is_idempotent`
//!    - Failure symptom: duplicate `granted` signals confuse client-side state machines.
//!
//! 3. Strictly higher priority MUST preempt; equal or lower MUST be denied with the incumbent untouched.
//!    - Enforced in: `PriorityPolicy::can_preempt`
//!    - Tested by: `core::tests::arbitration::higher_priority_preempts_incumbent`, `core::tests::arbitration::equal_priority_is_denied`
//!    - Failure symptom: resources oscillate between equal-priority clients, or background apps steal the call audio path.
//!
//! 4. Client destruction MUST release every owned resource before the record is discarded.
//!    - Enforced in: `ManagerCore::destroy_client`
//!    - Tested by: `core::tests::registry::destroy_client_releases_resources`
//!    - Failure symptom: the owners map references a dead client and the resource is stuck forever.
//!
//! 5. Client ids MUST be non-zero and MUST NOT be reused while the process runs.
//!    - Enforced in: `ManagerCore::register_client`
//!    - Tested by: `core::tests::registry::ids_are_nonzero_and_monotonic`
//!    - Failure symptom: a late reply addressed to a recycled id reaches the wrong process.
//!
//! # Data flow
//!
//! 1. Registration: the dispatcher authenticates the sender via [`crate::security::SenderPolicy`], then [`ManagerCore::register_client`] allocates id + handle and stores the client with its notification sink.
//! 2. Request: [`ManagerCore::request_resources`] walks the requested names in order; each name is granted, skipped (already owned), preempted, or denied, with notifications emitted as each step completes.
//! 3. Grant: owners map insert, owned-set insert, `granted` notification, and a parallel `status` (ACTIVE) notification carrying the client's id and a fresh sequence number. Both signals are a wire-compat requirement.
//! 4. Release / destruction: every owned name is dropped from both the map and the set; the releasing client is not notified about its own release.
//!
//! # Concurrency and ordering
//!
//! - All state lives behind one mutex; every operation locks for its full duration and never across an await point. Sequential execution is the concurrency discipline.
//! - Sink calls are non-blocking channel pushes and may happen under the lock.
//! - A later name in the same request observes ownership changes made by earlier names of that request.
//!
//! # Failure modes and recovery
//!
//! - Unknown client id on any operation: a no-op (reported to the caller by the dispatcher where the protocol defines a reply).
//! - Outbound delivery failure: the ownership change stands; delivery is best-effort and the transport cleans up dead connections.

mod arbitration;
mod client;
mod policy;
mod registry;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicU32;
use std::sync::{Arc, Mutex};

pub use arbitration::RequestOutcome;
pub use client::ResourceClient;
pub use policy::PriorityPolicy;
pub use registry::RegisterError;
use resourced_proto::types::{ClientHandle, ClientId};

use crate::security::SenderPolicy;

/// Outbound notification capability for one registered client.
///
/// The engine calls these synchronously, once per state change, in the
/// order changes occur. Implementations must not block; delivery is
/// best-effort and never rolls back a committed ownership change.
pub trait NotificationSink: Send + Sync + 'static {
	/// The named resource was granted to the client.
	fn granted(&self, resource: &str);
	/// The named resource was revoked in favor of a higher-priority client.
	fn lost(&self, resource: &str);
	/// The request for the named resource was denied.
	fn denied(&self, resource: &str);
	/// Resource-set status change (status 1 = ACTIVE).
	fn status(&self, rtype: i32, id: u32, reqno: u32, status: u32);
	/// Out-of-band grant call after a successful acquire.
	fn grant(&self, rtype: i32, id: u32, reqno: u32, mask: u32);
}

/// Shared state for the arbitration manager.
pub struct ManagerCore {
	state: Mutex<ManagerState>,
	next_client_id: AtomicU32,
	policy: PriorityPolicy,
	security: Arc<dyn SenderPolicy>,
}

#[derive(Default)]
struct ManagerState {
	clients: HashMap<ClientId, ResourceClient>,
	handles: HashMap<ClientHandle, ClientId>,
	/// Resource name to owning client id; the single source of truth.
	owners: HashMap<String, ClientId>,
}

impl ManagerCore {
	/// Create a new manager with the given sender-authorization policy.
	#[must_use]
	pub fn new(security: Arc<dyn SenderPolicy>) -> Arc<Self> {
		Arc::new(Self {
			state: Mutex::new(ManagerState::default()),
			// Client ids start at 1; 0 is never a valid client.
			next_client_id: AtomicU32::new(1),
			policy: PriorityPolicy,
			security,
		})
	}

	/// Retrieves a snapshot of the live clients and the owners map for
	/// debugging or testing.
	#[doc(hidden)]
	pub fn get_state(&self) -> (HashSet<ClientId>, HashMap<String, ClientId>) {
		let state = self.state.lock().unwrap();
		let clients = state.clients.keys().copied().collect();
		let owners = state.owners.clone();
		(clients, owners)
	}
}

#[cfg(test)]
mod tests;
