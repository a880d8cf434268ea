//! Client lifecycle management.
//!
//! Methods for registering, destroying, and resolving resource clients.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use resourced_proto::types::{ClientHandle, ClientId, Registration};

use super::{ManagerCore, NotificationSink, ResourceClient};

/// Why a registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
	/// The sender is not allowed to register clients.
	NotAuthorized,
}

impl ManagerCore {
	/// Register a new client for the given caller identity.
	///
	/// The sender-authorization policy is consulted first; rejection never
	/// creates a client. On success a fresh id and handle are allocated and
	/// `make_sink` is invoked with them to build the client's outbound
	/// notification capability.
	///
	/// # Errors
	///
	/// Returns [`RegisterError::NotAuthorized`] when the policy rejects the
	/// caller.
	pub fn register_client<F>(
		&self,
		caller: &str,
		registration: Registration,
		make_sink: F,
	) -> Result<(ClientId, ClientHandle), RegisterError>
	where
		F: FnOnce(ClientId, &ClientHandle) -> Arc<dyn NotificationSink>,
	{
		if !self.security.is_allowed_sender(caller) {
			tracing::warn!(caller, "registration denied by sender policy");
			return Err(RegisterError::NotAuthorized);
		}

		let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
		let handle = ClientHandle::for_client(id);
		let sink = make_sink(id, &handle);
		let client = ResourceClient::new(id, handle.clone(), caller.to_string(), registration, sink);

		let mut state = self.state.lock().unwrap();
		state.handles.insert(handle.clone(), id);
		state.clients.insert(id, client);

		tracing::info!(%id, %handle, caller, "client registered");
		Ok((id, handle))
	}

	/// Destroy a client, releasing every resource it holds.
	///
	/// No-op for an unknown id.
	pub fn destroy_client(&self, id: ClientId) {
		self.release_all(id);

		let mut state = self.state.lock().unwrap();
		if let Some(client) = state.clients.remove(&id) {
			state.handles.remove(client.handle());
			tracing::info!(%id, handle = %client.handle(), "client destroyed");
		}
	}

	/// Resolve a routing handle to a client id.
	#[must_use]
	pub fn find_by_handle(&self, handle: &ClientHandle) -> Option<ClientId> {
		let state = self.state.lock().unwrap();
		state.handles.get(handle).copied()
	}

	/// Whether the id names a live client.
	#[must_use]
	pub fn contains_client(&self, id: ClientId) -> bool {
		let state = self.state.lock().unwrap();
		state.clients.contains_key(&id)
	}

	/// Caller identity of a live client.
	#[must_use]
	pub fn client_caller(&self, id: ClientId) -> Option<String> {
		let state = self.state.lock().unwrap();
		state.clients.get(&id).map(|c| c.caller().to_string())
	}

	/// Routing handle of a live client.
	#[must_use]
	pub fn client_handle(&self, id: ClientId) -> Option<ClientHandle> {
		let state = self.state.lock().unwrap();
		state.clients.get(&id).map(|c| c.handle().clone())
	}

	/// Number of live clients.
	#[must_use]
	pub fn client_count(&self) -> usize {
		let state = self.state.lock().unwrap();
		state.clients.len()
	}

	/// Read and advance a client's sequence counter.
	pub fn next_reqno(&self, id: ClientId) -> Option<u32> {
		let mut state = self.state.lock().unwrap();
		state.clients.get_mut(&id).map(ResourceClient::next_reqno)
	}

	/// Replace a client's declared resource set.
	pub fn set_declared(&self, id: ClientId, resources: Vec<String>) {
		let mut state = self.state.lock().unwrap();
		if let Some(client) = state.clients.get_mut(&id) {
			client.set_declared(resources);
		}
	}

	/// A client's declared resource names, in request order.
	#[must_use]
	pub fn declared_resources(&self, id: ClientId) -> Vec<String> {
		let state = self.state.lock().unwrap();
		state
			.clients
			.get(&id)
			.map(|c| c.declared().to_vec())
			.unwrap_or_default()
	}

	/// Resource names currently granted to a client.
	#[must_use]
	pub fn owned_resources(&self, id: ClientId) -> Vec<String> {
		let state = self.state.lock().unwrap();
		state
			.clients
			.get(&id)
			.map(|c| c.resources().iter().cloned().collect())
			.unwrap_or_default()
	}
}
