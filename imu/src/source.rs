use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::sample::RawSample;

/// Provider of sensor samples, polled by the sampling thread.
pub trait ImuSource
where
	Self: Send + 'static,
{
	/// Called once before the sampling thread starts.
	fn init(&mut self) -> anyhow::Result<()> {
		Ok(())
	}

	/// Nominal output data rate, in Hz.
	fn sample_rate(&self) -> u32;

	/// Must not block. `None` when no new sample is ready, including after a read failure.
	fn try_read_next(&mut self) -> Option<RawSample>;
}

/// Source fed through a channel, for acquisition done in another thread.
pub struct ChannelSource {
	sample_rate: u32,
	sender: Sender<RawSample>,
	receiver: Receiver<RawSample>,
}

impl ChannelSource {
	pub fn new(sample_rate: u32) -> Self {
		let (sender, receiver) = unbounded::<RawSample>();
		ChannelSource { sample_rate, sender, receiver }
	}

	pub fn sender(&self) -> Sender<RawSample> {
		self.sender.clone()
	}
}

impl ImuSource for ChannelSource {
	fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	fn try_read_next(&mut self) -> Option<RawSample> {
		self.receiver.try_recv().ok()
	}
}
