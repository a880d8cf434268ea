//! Tests for client registration, destruction, and lookups.

use std::sync::Arc;

use resourced_proto::resources::{AUDIO_PLAYBACK, DISPLAY};
use resourced_proto::types::{ClientHandle, ClientId};

use super::helpers::{RecordingSink, register, registration, res, test_core};
use crate::core::{ManagerCore, NotificationSink, RegisterError};
use crate::security::Allowlist;

#[test]
fn ids_are_nonzero_and_monotonic() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());

	let a = register(&core, ":1.1", 5, &sink);
	let b = register(&core, ":1.2", 5, &sink);
	let c = register(&core, ":1.3", 5, &sink);

	assert!(a.0 > 0);
	assert!(a < b);
	assert!(b < c);
}

#[test]
fn ids_are_not_reused_after_destroy() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());

	let a = register(&core, ":1.1", 5, &sink);
	core.destroy_client(a);
	let b = register(&core, ":1.2", 5, &sink);

	assert_ne!(a, b);
	assert!(b > a);
}

#[test]
fn handles_resolve_and_are_unique() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());

	let a = register(&core, ":1.1", 5, &sink);
	let b = register(&core, ":1.2", 5, &sink);

	let a_handle = core.client_handle(a).unwrap();
	let b_handle = core.client_handle(b).unwrap();
	assert_ne!(a_handle, b_handle);
	assert_eq!(core.find_by_handle(&a_handle), Some(a));
	assert_eq!(core.find_by_handle(&b_handle), Some(b));
	assert_eq!(core.find_by_handle(&ClientHandle("/client/999".to_string())), None);
}

#[test]
fn destroy_unknown_client_is_noop() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());
	register(&core, ":1.1", 5, &sink);

	core.destroy_client(ClientId(42));

	assert_eq!(core.client_count(), 1);
}

#[test]
fn destroy_client_releases_resources() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());
	let a = register(&core, ":1.1", 5, &sink);

	core.request_resources(a, &res(&[AUDIO_PLAYBACK, DISPLAY]));
	core.destroy_client(a);

	assert!(!core.contains_client(a));
	assert_eq!(core.client_count(), 0);
	let (_, owners) = core.get_state();
	assert!(owners.is_empty());
}

#[test]
fn denied_sender_cannot_register() {
	let core = ManagerCore::new(Arc::new(Allowlist::new([":1.5".to_string()])));
	let sink: Arc<dyn NotificationSink> = Arc::new(RecordingSink::default());

	let result = core.register_client(":1.6", registration(5), move |_, _| sink);

	assert_eq!(result.unwrap_err(), RegisterError::NotAuthorized);
	assert_eq!(core.client_count(), 0);
}

#[test]
fn sequence_counter_strictly_increases() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());
	let a = register(&core, ":1.1", 5, &sink);

	assert_eq!(core.next_reqno(a), Some(1));
	assert_eq!(core.next_reqno(a), Some(2));
	assert_eq!(core.next_reqno(a), Some(3));
	assert_eq!(core.next_reqno(ClientId(99)), None);
}

#[test]
fn declared_set_is_replaced_not_merged() {
	let core = test_core();
	let sink = Arc::new(RecordingSink::default());
	let a = register(&core, ":1.1", 5, &sink);

	core.set_declared(a, res(&[AUDIO_PLAYBACK, DISPLAY]));
	assert_eq!(core.declared_resources(a), res(&[AUDIO_PLAYBACK, DISPLAY]));

	core.set_declared(a, res(&[DISPLAY]));
	assert_eq!(core.declared_resources(a), res(&[DISPLAY]));
}
