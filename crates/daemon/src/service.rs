//! Per-connection protocol dispatcher.
//!
//! Each IPC connection to the daemon is handled by an instance of this
//! service. It validates method-call arguments, drives the shared
//! [`ManagerCore`], and writes replies and follow-up events onto the
//! connection's outbound channel.

use std::sync::Arc;

use resourced_proto::types::{
	ArgValue, ClientHandle, ClientId, Event, IpcFrame, MethodCall, NotifyEvent, Registration,
	ReplyTuple, Request, Response,
};
use tokio::sync::mpsc;

use crate::core::{ManagerCore, NotificationSink, RegisterError};

/// Dispatcher for one IPC connection.
///
/// Tracks the clients registered over the connection so that dropping the
/// service (transport disconnect) forces their teardown.
pub struct ManagerService {
	/// Shared arbitration core.
	core: Arc<ManagerCore>,
	/// Transport-assigned sender identity for this connection.
	sender: String,
	/// Outbound frame channel for this connection.
	outbound: mpsc::UnboundedSender<IpcFrame>,
	/// Clients registered over this connection.
	clients: Vec<ClientId>,
	/// Grant follow-up queued by `acquire`, issued after the reply.
	pending_grant: Option<(ClientId, u32, u32)>,
}

impl std::fmt::Debug for ManagerService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ManagerService")
			.field("sender", &self.sender)
			.field("clients", &self.clients)
			.finish_non_exhaustive()
	}
}

impl ManagerService {
	/// Create a dispatcher for a connection with the given sender identity.
	#[must_use]
	pub fn new(
		core: Arc<ManagerCore>,
		sender: String,
		outbound: mpsc::UnboundedSender<IpcFrame>,
	) -> Self {
		Self {
			core,
			sender,
			outbound,
			clients: Vec::new(),
			pending_grant: None,
		}
	}

	/// Handle one inbound request.
	///
	/// Writes the reply (if the method produces one) and then any queued
	/// follow-up onto the outbound channel. The acquire reply always
	/// precedes its grant follow-up.
	pub fn handle_request(&mut self, req: Request) {
		let reply = self.dispatch(&req.call);

		if let Some(reply) = reply {
			let _ = self.outbound.send(IpcFrame::Response(Response {
				request_id: req.id,
				reply,
			}));
		}

		if let Some((id, reqno, mask)) = self.pending_grant.take() {
			self.core.send_grant(id, reqno, mask);
		}
	}

	fn dispatch(&mut self, call: &MethodCall) -> Option<ReplyTuple> {
		match call.member.as_str() {
			"register" => Some(self.register(&call.args)),
			"request" => Some(self.request(&call.args)),
			"acquire" => Some(self.acquire(&call.args)),
			"release" => Some(self.release(&call.args)),
			"unregister" => self.unregister(&call.args),
			other => {
				tracing::warn!(sender = %self.sender, member = other, "unknown method");
				None
			}
		}
	}

	/// `register(type, id, reqno, mandatory, optional, share, mask, klass, mode, priority)`
	fn register(&mut self, args: &[ArgValue]) -> ReplyTuple {
		if args.len() != 10 {
			tracing::error!(sender = %self.sender, count = args.len(), "register: wrong argument count");
			return ReplyTuple::failed("Invalid argument count");
		}

		let parsed = (|| {
			let client_type = arg_i32(args, 0)?;
			// args[1] is the caller-side resource-set id; accepted, unused.
			let _rset_id = arg_u32(args, 1)?;
			let reqno = arg_u32(args, 2)?;
			let registration = Registration {
				client_type,
				mandatory: arg_u32(args, 3)?,
				optional: arg_u32(args, 4)?,
				share: arg_u32(args, 5)?,
				mask: arg_u32(args, 6)?,
				klass: arg_str(args, 7)?.to_string(),
				mode: arg_str(args, 8)?.to_string(),
				priority: arg_u32(args, 9)?,
			};
			Some((reqno, registration))
		})();
		let Some((reqno, registration)) = parsed else {
			tracing::error!(sender = %self.sender, "register: malformed arguments");
			return ReplyTuple::failed("Invalid argument");
		};

		let outbound = self.outbound.clone();
		let result = self
			.core
			.register_client(&self.sender, registration, move |_, handle| {
				let sink: Arc<dyn NotificationSink> = Arc::new(ConnectionSink {
					handle: handle.clone(),
					outbound,
				});
				sink
			});

		match result {
			Ok((id, _handle)) => {
				self.clients.push(id);
				ReplyTuple::ok(id.0, reqno)
			}
			Err(RegisterError::NotAuthorized) => ReplyTuple::failed("Sender not authorized"),
		}
	}

	/// `request(type, id, reqno, resources)`
	///
	/// Replaces the client's declared resource set and arbitrates it
	/// immediately; per-resource outcomes are delivered as notify events.
	fn request(&mut self, args: &[ArgValue]) -> ReplyTuple {
		if args.len() != 4 {
			tracing::error!(sender = %self.sender, count = args.len(), "request: wrong argument count");
			return ReplyTuple::failed("Invalid argument count");
		}
		let parsed = (|| {
			let _ty = arg_i32(args, 0)?;
			let id = arg_u32(args, 1)?;
			let reqno = arg_u32(args, 2)?;
			let resources = arg_str_list(args, 3)?.to_vec();
			Some((id, reqno, resources))
		})();
		let Some((id, reqno, resources)) = parsed else {
			tracing::error!(sender = %self.sender, "request: malformed arguments");
			return ReplyTuple::failed("Invalid argument");
		};

		let id = ClientId(id);
		if !self.core.contains_client(id) {
			tracing::warn!(%id, "request: unknown client");
			return ReplyTuple::error(id.0, reqno, "Unknown client");
		}

		self.core.set_declared(id, resources.clone());
		let outcome = self.core.request_resources(id, &resources);
		tracing::debug!(
			%id,
			granted = outcome.granted.len(),
			denied = outcome.denied.len(),
			"request arbitrated"
		);

		ReplyTuple::ok(id.0, reqno)
	}

	/// `acquire(type, id, reqno, mask)`
	///
	/// Re-arbitrates the client's declared set, replies, and queues the
	/// out-of-band grant call when the client ends up owning anything.
	fn acquire(&mut self, args: &[ArgValue]) -> ReplyTuple {
		if args.len() != 4 {
			tracing::error!(sender = %self.sender, count = args.len(), "acquire: wrong argument count");
			return ReplyTuple::failed("Invalid argument count");
		}
		let parsed = (|| {
			let _ty = arg_i32(args, 0)?;
			let id = arg_u32(args, 1)?;
			let reqno = arg_u32(args, 2)?;
			let mask = arg_u32(args, 3)?;
			Some((id, reqno, mask))
		})();
		let Some((id, reqno, mask)) = parsed else {
			tracing::error!(sender = %self.sender, "acquire: malformed arguments");
			return ReplyTuple::failed("Invalid argument");
		};

		let id = ClientId(id);
		if !self.core.contains_client(id) {
			tracing::warn!(%id, "acquire: unknown client");
			return ReplyTuple::error(id.0, reqno, "Unknown client");
		}

		let declared = self.core.declared_resources(id);
		self.core.request_resources(id, &declared);

		if self.core.owns_any(id) {
			self.pending_grant = Some((id, reqno, mask));
		}

		ReplyTuple::ok(id.0, reqno)
	}

	/// `release(type, id, reqno)`
	fn release(&mut self, args: &[ArgValue]) -> ReplyTuple {
		if args.len() != 3 {
			tracing::error!(sender = %self.sender, count = args.len(), "release: wrong argument count");
			return ReplyTuple::failed("Invalid argument count");
		}
		let parsed = (|| {
			let _ty = arg_i32(args, 0)?;
			let id = arg_u32(args, 1)?;
			let reqno = arg_u32(args, 2)?;
			Some((id, reqno))
		})();
		let Some((id, reqno)) = parsed else {
			tracing::error!(sender = %self.sender, "release: malformed arguments");
			return ReplyTuple::failed("Invalid argument");
		};

		let id = ClientId(id);
		if !self.core.contains_client(id) {
			tracing::warn!(%id, "release: unknown client");
			return ReplyTuple::error(id.0, reqno, "Unknown client");
		}

		self.core.release_all(id);
		ReplyTuple::ok(id.0, reqno)
	}

	/// `unregister(type, id, reqno)`
	///
	/// Only the registering caller may unregister its client; any other
	/// sender (and any unknown id) is a silent no-op.
	fn unregister(&mut self, args: &[ArgValue]) -> Option<ReplyTuple> {
		if args.len() != 3 {
			tracing::error!(sender = %self.sender, count = args.len(), "unregister: wrong argument count");
			return Some(ReplyTuple::failed("Invalid argument count"));
		}
		let parsed = (|| {
			let _ty = arg_i32(args, 0)?;
			let id = arg_u32(args, 1)?;
			let reqno = arg_u32(args, 2)?;
			Some((id, reqno))
		})();
		let Some((id, reqno)) = parsed else {
			tracing::error!(sender = %self.sender, "unregister: malformed arguments");
			return Some(ReplyTuple::failed("Invalid argument"));
		};

		let id = ClientId(id);
		let Some(owner) = self.core.client_caller(id) else {
			tracing::warn!(%id, "unregister: unknown client");
			return None;
		};
		if owner != self.sender {
			tracing::warn!(%id, sender = %self.sender, "unregister denied for sender");
			return None;
		}

		self.core.destroy_client(id);
		self.clients.retain(|c| *c != id);
		Some(ReplyTuple::ok(id.0, reqno))
	}
}

impl Drop for ManagerService {
	/// Authoritatively tears down this connection's clients when the
	/// transport drops.
	fn drop(&mut self) {
		for id in self.clients.drain(..) {
			tracing::info!(%id, sender = %self.sender, "connection gone, destroying client");
			self.core.destroy_client(id);
		}
	}
}

/// Notification sink that forwards engine events onto a connection's
/// outbound frame channel.
struct ConnectionSink {
	handle: ClientHandle,
	outbound: mpsc::UnboundedSender<IpcFrame>,
}

impl ConnectionSink {
	fn send(&self, event: Event) {
		// Best-effort: a closed connection is cleaned up by the reader loop.
		let _ = self.outbound.send(IpcFrame::Event(event));
	}

	fn notify(&self, event: NotifyEvent, resource: &str) {
		self.send(Event::Notify {
			handle: self.handle.clone(),
			event,
			resource: resource.to_string(),
		});
	}
}

impl NotificationSink for ConnectionSink {
	fn granted(&self, resource: &str) {
		self.notify(NotifyEvent::Granted, resource);
	}

	fn lost(&self, resource: &str) {
		self.notify(NotifyEvent::Lost, resource);
	}

	fn denied(&self, resource: &str) {
		self.notify(NotifyEvent::Denied, resource);
	}

	fn status(&self, rtype: i32, id: u32, reqno: u32, status: u32) {
		self.send(Event::Status {
			handle: self.handle.clone(),
			rtype,
			id,
			reqno,
			status,
		});
	}

	fn grant(&self, rtype: i32, id: u32, reqno: u32, mask: u32) {
		self.send(Event::Grant {
			handle: self.handle.clone(),
			rtype,
			id,
			reqno,
			mask,
		});
	}
}

fn arg_i32(args: &[ArgValue], index: usize) -> Option<i32> {
	match args.get(index) {
		Some(ArgValue::I32(v)) => Some(*v),
		_ => None,
	}
}

fn arg_u32(args: &[ArgValue], index: usize) -> Option<u32> {
	match args.get(index) {
		Some(ArgValue::U32(v)) => Some(*v),
		_ => None,
	}
}

fn arg_str(args: &[ArgValue], index: usize) -> Option<&str> {
	match args.get(index) {
		Some(ArgValue::Str(v)) => Some(v.as_str()),
		_ => None,
	}
}

fn arg_str_list(args: &[ArgValue], index: usize) -> Option<&[String]> {
	match args.get(index) {
		Some(ArgValue::StrList(v)) => Some(v.as_slice()),
		_ => None,
	}
}
