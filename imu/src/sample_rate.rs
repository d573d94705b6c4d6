use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Counts samples over fixed one second windows.
#[derive(Debug, Clone)]
pub struct SampleRateCounter {
	window_start: Instant,
	count: u32,
	rate: u32,
}

impl SampleRateCounter {
	pub fn new(now: Instant) -> Self {
		SampleRateCounter {
			window_start: now,
			count: 0,
			rate: 0,
		}
	}

	pub fn tick(&mut self) {
		self.count = self.count.saturating_add(1);
	}

	/// Rate measured over the last closed window, in samples per second.
	pub fn rate(&self) -> u32 {
		self.rate
	}

	/// Closes the current window if it is over, returning the new rate.
	pub fn poll(&mut self, now: Instant) -> Option<u32> {
		if now.saturating_duration_since(self.window_start) < WINDOW {
			return None;
		}

		self.rate = self.count;
		self.count = 0;
		self.window_start = now;

		Some(self.rate)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rate_is_published_once_per_window() {
		let start = Instant::now();
		let mut counter = SampleRateCounter::new(start);

		for _ in 0..250 {
			counter.tick();
		}

		assert_eq!(counter.poll(start + Duration::from_millis(999)), None);
		assert_eq!(counter.rate(), 0);

		assert_eq!(counter.poll(start + WINDOW), Some(250));
		assert_eq!(counter.rate(), 250);
	}

	#[test]
	fn empty_window_resets_rate() {
		let start = Instant::now();
		let mut counter = SampleRateCounter::new(start);

		counter.tick();
		assert_eq!(counter.poll(start + WINDOW), Some(1));
		assert_eq!(counter.poll(start + 2 * WINDOW), Some(0));
	}

	#[test]
	fn window_restarts_when_closed() {
		let start = Instant::now();
		let mut counter = SampleRateCounter::new(start);

		// Closed late: the next window starts at the closing instant.
		assert_eq!(counter.poll(start + Duration::from_millis(1500)), Some(0));
		assert_eq!(counter.poll(start + Duration::from_millis(2400)), None);
		assert_eq!(counter.poll(start + Duration::from_millis(2500)), Some(0));
	}
}
