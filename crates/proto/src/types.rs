//! Wire types for the resourced IPC protocol.
//!
//! This module defines the core data structures used for communication
//! between client processes and the resourced daemon: method calls on the
//! manager surface, reply tuples, and the per-client event stream.

use serde::{Deserialize, Serialize};

/// Reply type carried in method replies and status events.
pub const RTYPE_REPLY: i32 = 9;

/// Reply type carried in the out-of-band grant call to a client.
pub const RTYPE_GRANT: i32 = 5;

/// Status value denoting an active (granted) resource set.
pub const STATUS_ACTIVE: u32 = 1;

/// Error code for a successful reply.
pub const ERROR_NONE: i32 = 0;

/// Error code for a failed reply.
pub const ERROR_FAILED: i32 = -1;

/// Unique identifier for requests and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Unique identifier for registered resource clients.
///
/// Assigned by the daemon at registration. Non-zero, monotonically
/// increasing, never reused while the daemon runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl std::fmt::Display for ClientId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Opaque routing token for a registered client.
///
/// Assigned at registration, unique per client, never reused. The
/// transport layer uses it to address outbound calls to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientHandle(pub String);

impl ClientHandle {
	/// Derive the canonical handle for a client id.
	#[must_use]
	pub fn for_client(id: ClientId) -> Self {
		Self(format!("/client/{}", id.0))
	}

	/// Returns the handle as a string slice.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ClientHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// A single method-call argument.
///
/// Mirrors the signed/unsigned/string signature alphabet of the manager
/// surface; the dispatcher validates count and type per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgValue {
	/// Signed 32-bit integer (`i`).
	I32(i32),
	/// Unsigned 32-bit integer (`u`).
	U32(u32),
	/// String (`s`).
	Str(String),
	/// Array of strings (`as`).
	StrList(Vec<String>),
}

/// A method call on the manager surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
	/// Method name (`register`, `request`, `acquire`, `release`, `unregister`).
	pub member: String,
	/// Positional arguments.
	pub args: Vec<ArgValue>,
}

impl MethodCall {
	/// Builds a method call from a member name and arguments.
	#[must_use]
	pub fn new(member: impl Into<String>, args: Vec<ArgValue>) -> Self {
		Self {
			member: member.into(),
			args,
		}
	}
}

/// The five-field reply tuple every manager method answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTuple {
	/// Reply type; [`RTYPE_REPLY`] on success, 0 on failure.
	pub rtype: i32,
	/// Client id the reply concerns (0 when unresolved).
	pub id: u32,
	/// Request sequence number echoed from the call.
	pub reqno: u32,
	/// [`ERROR_NONE`] on success, [`ERROR_FAILED`] otherwise.
	pub error: i32,
	/// Human-readable status message.
	pub message: String,
}

impl ReplyTuple {
	/// Successful reply for a client and request number.
	#[must_use]
	pub fn ok(id: u32, reqno: u32) -> Self {
		Self {
			rtype: RTYPE_REPLY,
			id,
			reqno,
			error: ERROR_NONE,
			message: "OK".to_string(),
		}
	}

	/// Failure reply with no resolved client.
	#[must_use]
	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			rtype: 0,
			id: 0,
			reqno: 0,
			error: ERROR_FAILED,
			message: message.into(),
		}
	}

	/// Failure reply for a resolved id/reqno pair.
	#[must_use]
	pub fn error(id: u32, reqno: u32, message: impl Into<String>) -> Self {
		Self {
			rtype: 0,
			id,
			reqno,
			error: ERROR_FAILED,
			message: message.into(),
		}
	}
}

/// Opaque registration data carried by the `register` call.
///
/// The mask fields are stored and forwarded verbatim; the daemon never
/// interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
	/// Client-declared classification.
	pub client_type: i32,
	/// Mandatory resource bits (opaque).
	pub mandatory: u32,
	/// Optional resource bits (opaque).
	pub optional: u32,
	/// Share bits (opaque).
	pub share: u32,
	/// Combined mask (opaque).
	pub mask: u32,
	/// Application class (e.g. `"player"`).
	pub klass: String,
	/// Requested mode string.
	pub mode: String,
	/// Arbitration priority; higher strictly wins.
	pub priority: u32,
}

/// Per-client notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyEvent {
	/// The resource was granted to the client.
	Granted,
	/// The resource was revoked in favor of a higher-priority client.
	Lost,
	/// The request was denied; the incumbent keeps the resource.
	Denied,
}

impl NotifyEvent {
	/// Wire name of the event.
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Granted => "granted",
			Self::Lost => "lost",
			Self::Denied => "denied",
		}
	}
}

/// Classification of frames transmitted over the IPC socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IpcFrame {
	/// A method call initiated by a client process.
	Request(Request),
	/// A reply from the daemon.
	Response(Response),
	/// An asynchronous event from the daemon.
	Event(Event),
}

/// A method call from a client process to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request identifier for correlation.
	pub id: RequestId,
	/// The method call payload.
	pub call: MethodCall,
}

/// A reply from the daemon to a client process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Corresponding request identifier.
	pub request_id: RequestId,
	/// The reply tuple.
	pub reply: ReplyTuple,
}

/// Asynchronous event from the daemon to a client process.
///
/// Every event carries the client handle so a process hosting several
/// clients can route it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
	/// Out-of-band grant call after a successful acquire.
	Grant {
		/// Target client handle.
		handle: ClientHandle,
		/// Reply type ([`RTYPE_GRANT`]).
		rtype: i32,
		/// Client id.
		id: u32,
		/// Request sequence number of the acquire.
		reqno: u32,
		/// Mask forwarded opaquely from the acquire.
		mask: u32,
	},
	/// Resource-set status change.
	Status {
		/// Target client handle.
		handle: ClientHandle,
		/// Reply type ([`RTYPE_REPLY`]).
		rtype: i32,
		/// Client id.
		id: u32,
		/// Client request sequence number.
		reqno: u32,
		/// Status value; [`STATUS_ACTIVE`] denotes active.
		status: u32,
	},
	/// Per-resource arbitration outcome.
	Notify {
		/// Target client handle.
		handle: ClientHandle,
		/// Outcome kind.
		event: NotifyEvent,
		/// Resource name the outcome concerns.
		resource: String,
	},
}
