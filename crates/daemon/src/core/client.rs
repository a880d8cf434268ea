//! Client entity bookkeeping.
//!
//! One client == one accepted registration on a transport connection.

use std::collections::HashSet;
use std::sync::Arc;

use resourced_proto::types::{ClientHandle, ClientId, Registration};

use super::NotificationSink;

/// One registered resource client.
pub struct ResourceClient {
	id: ClientId,
	handle: ClientHandle,
	caller: String,
	registration: Registration,
	/// Per-client sequence counter; incremented on every read.
	reqno: u32,
	/// Resource names declared by the client's latest request, in order.
	declared: Vec<String>,
	/// Resource names currently granted to this client.
	resources: HashSet<String>,
	sink: Arc<dyn NotificationSink>,
}

impl ResourceClient {
	pub(super) fn new(
		id: ClientId,
		handle: ClientHandle,
		caller: String,
		registration: Registration,
		sink: Arc<dyn NotificationSink>,
	) -> Self {
		Self {
			id,
			handle,
			caller,
			registration,
			reqno: 0,
			declared: Vec::new(),
			resources: HashSet::new(),
			sink,
		}
	}

	/// Assigned client id.
	#[must_use]
	pub fn id(&self) -> ClientId {
		self.id
	}

	/// Opaque routing handle.
	#[must_use]
	pub fn handle(&self) -> &ClientHandle {
		&self.handle
	}

	/// Transport-level sender identity of the registering caller.
	#[must_use]
	pub fn caller(&self) -> &str {
		&self.caller
	}

	/// Arbitration priority; immutable after registration.
	#[must_use]
	pub fn priority(&self) -> u32 {
		self.registration.priority
	}

	/// Client-declared classification.
	#[must_use]
	pub fn client_type(&self) -> i32 {
		self.registration.client_type
	}

	/// The opaque registration data, stored verbatim.
	#[must_use]
	pub fn registration(&self) -> &Registration {
		&self.registration
	}

	/// Read and advance the sequence counter.
	///
	/// Strictly increasing; the first read yields 1.
	pub fn next_reqno(&mut self) -> u32 {
		self.reqno += 1;
		self.reqno
	}

	/// Resource names currently granted to this client.
	#[must_use]
	pub fn resources(&self) -> &HashSet<String> {
		&self.resources
	}

	/// Whether the named resource is currently granted to this client.
	#[must_use]
	pub fn has_resource(&self, resource: &str) -> bool {
		self.resources.contains(resource)
	}

	/// Declared resource names, in request order.
	#[must_use]
	pub fn declared(&self) -> &[String] {
		&self.declared
	}

	pub(super) fn set_declared(&mut self, resources: Vec<String>) {
		self.declared = resources;
	}

	pub(super) fn add_resource(&mut self, resource: &str) {
		self.resources.insert(resource.to_string());
	}

	pub(super) fn remove_resource(&mut self, resource: &str) {
		self.resources.remove(resource);
	}

	pub(super) fn take_resources(&mut self) -> HashSet<String> {
		std::mem::take(&mut self.resources)
	}

	pub(super) fn sink(&self) -> &Arc<dyn NotificationSink> {
		&self.sink
	}

	pub(super) fn notify_granted(&self, resource: &str) {
		self.sink.granted(resource);
	}

	pub(super) fn notify_lost(&self, resource: &str) {
		self.sink.lost(resource);
	}

	pub(super) fn notify_denied(&self, resource: &str) {
		self.sink.denied(resource);
	}
}

impl std::fmt::Debug for ResourceClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResourceClient")
			.field("id", &self.id)
			.field("handle", &self.handle)
			.field("caller", &self.caller)
			.field("priority", &self.registration.priority)
			.field("resources", &self.resources)
			.finish_non_exhaustive()
	}
}
