//! Common test utilities and helpers.

use std::sync::{Arc, Mutex};

use resourced_proto::types::{ClientHandle, ClientId, Registration};

use crate::core::{ManagerCore, NotificationSink, ResourceClient};
use crate::security::AllowAll;

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
	Granted(String),
	Lost(String),
	Denied(String),
	Status {
		rtype: i32,
		id: u32,
		reqno: u32,
		status: u32,
	},
	Grant {
		rtype: i32,
		id: u32,
		reqno: u32,
		mask: u32,
	},
}

/// Records every notification the engine emits for one client.
#[derive(Debug, Default)]
pub struct RecordingSink {
	calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
	/// Drain and return the recorded calls.
	pub fn take(&self) -> Vec<SinkCall> {
		std::mem::take(&mut self.calls.lock().unwrap())
	}
}

impl NotificationSink for RecordingSink {
	fn granted(&self, resource: &str) {
		self.calls
			.lock()
			.unwrap()
			.push(SinkCall::Granted(resource.to_string()));
	}

	fn lost(&self, resource: &str) {
		self.calls
			.lock()
			.unwrap()
			.push(SinkCall::Lost(resource.to_string()));
	}

	fn denied(&self, resource: &str) {
		self.calls
			.lock()
			.unwrap()
			.push(SinkCall::Denied(resource.to_string()));
	}

	fn status(&self, rtype: i32, id: u32, reqno: u32, status: u32) {
		self.calls.lock().unwrap().push(SinkCall::Status {
			rtype,
			id,
			reqno,
			status,
		});
	}

	fn grant(&self, rtype: i32, id: u32, reqno: u32, mask: u32) {
		self.calls.lock().unwrap().push(SinkCall::Grant {
			rtype,
			id,
			reqno,
			mask,
		});
	}
}

pub fn test_core() -> Arc<ManagerCore> {
	ManagerCore::new(Arc::new(AllowAll))
}

pub fn registration(priority: u32) -> Registration {
	Registration {
		klass: "player".to_string(),
		priority,
		..Registration::default()
	}
}

pub fn register(
	core: &ManagerCore,
	caller: &str,
	priority: u32,
	sink: &Arc<RecordingSink>,
) -> ClientId {
	let s: Arc<dyn NotificationSink> = sink.clone();
	let (id, _handle) = core
		.register_client(caller, registration(priority), move |_, _| s)
		.expect("registration accepted");
	id
}

pub fn res(names: &[&str]) -> Vec<String> {
	names.iter().map(|n| (*n).to_string()).collect()
}

/// Standalone client entity for policy tests.
pub fn standalone_client(id: u32, priority: u32) -> ResourceClient {
	ResourceClient::new(
		ClientId(id),
		ClientHandle::for_client(ClientId(id)),
		format!(":1.{id}"),
		registration(priority),
		Arc::new(RecordingSink::default()),
	)
}
