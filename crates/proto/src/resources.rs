//! Common resource names recognized by the daemon.
//!
//! The vocabulary is string-based; arbitration itself accepts any name,
//! so these constants are the recognized set rather than a hard filter.

/// Hardware keys (volume, power, etc.).
pub const HARDWARE_KEYS: &str = "HardwareKeys";

/// Audio playback (music, media apps).
pub const AUDIO_PLAYBACK: &str = "AudioPlayback";

/// Audio recording / microphone.
pub const AUDIO_CAPTURE: &str = "AudioCapture";

/// Alarm / system notifications.
pub const ALARM: &str = "Alarm";

/// Phone call (voice call).
pub const VOICE_CALL: &str = "VoiceCall";

/// Video playback / camera output.
pub const VIDEO_OUTPUT: &str = "VideoOutput";

/// Touchscreen / input events.
pub const TOUCH_INPUT: &str = "TouchInput";

/// GPS / location access.
pub const LOCATION: &str = "Location";

/// Network / cellular data usage.
pub const NETWORK: &str = "Network";

/// Display / screen brightness / backlight.
pub const DISPLAY: &str = "Display";

/// The full recognized vocabulary.
pub const ALL: [&str; 10] = [
	HARDWARE_KEYS,
	AUDIO_PLAYBACK,
	AUDIO_CAPTURE,
	ALARM,
	VOICE_CALL,
	VIDEO_OUTPUT,
	TOUCH_INPUT,
	LOCATION,
	NETWORK,
	DISPLAY,
];

/// Whether a name belongs to the recognized vocabulary.
#[must_use]
pub fn is_known(name: &str) -> bool {
	ALL.contains(&name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vocabulary_is_closed() {
		assert!(is_known(AUDIO_PLAYBACK));
		assert!(is_known(DISPLAY));
		assert!(!is_known("CoffeeMachine"));
		assert!(!is_known("audioplayback"));
	}
}
