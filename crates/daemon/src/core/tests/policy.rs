//! Tests for the priority preemption policy.

use resourced_proto::resources::AUDIO_PLAYBACK;

use super::helpers::standalone_client;
use crate::core::PriorityPolicy;

#[test]
fn absent_parties_never_preempt() {
	let policy = PriorityPolicy;
	let client = standalone_client(1, 10);

	assert!(!policy.can_preempt(None, Some(&client), AUDIO_PLAYBACK));
	assert!(!policy.can_preempt(Some(&client), None, AUDIO_PLAYBACK));
	assert!(!policy.can_preempt(None, None, AUDIO_PLAYBACK));
}

#[test]
fn strictly_higher_priority_preempts() {
	let policy = PriorityPolicy;
	let challenger = standalone_client(1, 10);
	let incumbent = standalone_client(2, 5);

	assert!(policy.can_preempt(Some(&challenger), Some(&incumbent), AUDIO_PLAYBACK));
}

#[test]
fn equal_priority_never_preempts() {
	let policy = PriorityPolicy;
	let challenger = standalone_client(1, 5);
	let incumbent = standalone_client(2, 5);

	assert!(!policy.can_preempt(Some(&challenger), Some(&incumbent), AUDIO_PLAYBACK));
}

#[test]
fn lower_priority_never_preempts() {
	let policy = PriorityPolicy;
	let challenger = standalone_client(1, 3);
	let incumbent = standalone_client(2, 5);

	assert!(!policy.can_preempt(Some(&challenger), Some(&incumbent), AUDIO_PLAYBACK));
}
