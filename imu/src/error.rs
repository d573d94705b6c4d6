use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
	#[error("Invalid axis rotation code {0} (expected 0 to 23)")]
	InvalidAxisRotation(u8),
	#[error("Invalid gyroscope learning alpha {0} (expected a value in [0, 1))")]
	InvalidLearningAlpha(f64),
	#[error("Invalid slerp power {0} (expected a value in [0, 1])")]
	InvalidSlerpPower(f64),
	#[error("Invalid sample rate {0} Hz")]
	InvalidSampleRate(u32),
}
