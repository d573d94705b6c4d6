use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::{
	sync::Arc,
	thread,
	time::{Duration, Instant},
};

use crate::config::ImuConfig;
use crate::estimate::PublishedEstimate;
use crate::processor::ImuProcessor;
use crate::sample_rate::SampleRateCounter;
use crate::source::ImuSource;

const THREAD_NAME: &str = "imu-sampler";

/// Read access to the latest estimate. Every call copies a complete record out under the lock.
#[derive(Debug, Clone)]
pub struct EstimateReader {
	shared: Arc<Mutex<PublishedEstimate>>,
}

impl EstimateReader {
	pub fn latest_estimate(&self) -> PublishedEstimate {
		*self.shared.lock()
	}

	pub fn sample_rate(&self) -> u32 {
		self.shared.lock().sample_rate
	}

	pub fn gyro_bias_valid(&self) -> bool {
		self.shared.lock().gyro_bias_valid
	}

	pub fn mag_cal_valid(&self) -> bool {
		self.shared.lock().mag_cal_valid
	}
}

/// Background thread polling an `ImuSource` and publishing an estimate after every sample.
///
/// Dropping the handle stops the thread.
pub struct SampleThread {
	reader: EstimateReader,
	stop_sender: Sender<()>,
	handle: Option<thread::JoinHandle<()>>,
}

impl SampleThread {
	pub fn spawn<S: ImuSource>(mut source: S, config: &ImuConfig) -> anyhow::Result<Self> {
		config.validate()?;

		source.init()?;

		let sample_rate = source.sample_rate();
		let processor = ImuProcessor::new(config, sample_rate)?;

		let shared = Arc::new(Mutex::new(PublishedEstimate::default()));
		let (stop_sender, stop_receiver) = bounded::<()>(1);

		let slerp_power = processor.fusion().slerp_power();

		let mut worker = Worker {
			source,
			processor,
			counter: SampleRateCounter::new(Instant::now()),
			shared: shared.clone(),
			poll_interval: config.poll_interval(),
		};

		let handle = thread::Builder::new()
			.name(String::from(THREAD_NAME))
			.spawn(move || worker.run(stop_receiver))?;

		info!("Sampling started ({} Hz nominal, slerp power {})", sample_rate, slerp_power);

		Ok(SampleThread {
			reader: EstimateReader { shared },
			stop_sender,
			handle: Some(handle),
		})
	}

	pub fn reader(&self) -> EstimateReader {
		self.reader.clone()
	}

	pub fn latest_estimate(&self) -> PublishedEstimate {
		self.reader.latest_estimate()
	}

	pub fn sample_rate(&self) -> u32 {
		self.reader.sample_rate()
	}

	pub fn gyro_bias_valid(&self) -> bool {
		self.reader.gyro_bias_valid()
	}

	pub fn mag_cal_valid(&self) -> bool {
		self.reader.mag_cal_valid()
	}

	/// Signals the thread and waits for it to return.
	pub fn stop(mut self) -> anyhow::Result<()> {
		self.shutdown()
	}

	fn shutdown(&mut self) -> anyhow::Result<()> {
		if let Some(handle) = self.handle.take() {
			// A full channel means a stop request is already pending.
			let _ = self.stop_sender.try_send(());

			handle.join().map_err(|_| anyhow!("Sampling thread panicked"))?;

			info!("Sampling stopped");
		}

		Ok(())
	}
}

impl Drop for SampleThread {
	fn drop(&mut self) {
		if let Err(e) = self.shutdown() {
			error!("{}", e);
		}
	}
}

struct Worker<S: ImuSource> {
	source: S,
	processor: ImuProcessor,
	counter: SampleRateCounter,
	shared: Arc<Mutex<PublishedEstimate>>,
	poll_interval: Duration,
}

impl<S: ImuSource> Worker<S> {
	fn run(&mut self, stop_receiver: Receiver<()>) {
		'sampling: loop {
			while let Some(sample) = self.source.try_read_next() {
				let estimate = self.processor.process(sample);
				self.publish(estimate);

				// A fast source could keep this loop busy forever.
				match stop_receiver.try_recv() {
					Err(TryRecvError::Empty) => {}
					Ok(()) | Err(TryRecvError::Disconnected) => break 'sampling,
				}
			}

			// Without samples the window still has to close for the rate to drop.
			if self.poll_rate() {
				self.shared.lock().sample_rate = self.counter.rate();
			}

			match stop_receiver.recv_timeout(self.poll_interval) {
				Err(RecvTimeoutError::Timeout) => {}
				Ok(()) | Err(RecvTimeoutError::Disconnected) => break 'sampling,
			}
		}
	}

	fn poll_rate(&mut self) -> bool {
		match self.counter.poll(Instant::now()) {
			Some(rate) => {
				debug!("{} samples/s", rate);
				true
			}
			None => false,
		}
	}

	fn publish(&mut self, mut estimate: PublishedEstimate) {
		self.counter.tick();
		self.poll_rate();
		estimate.sample_rate = self.counter.rate();

		trace!(
			"{} roll {:.3} pitch {:.3} yaw {:.3}",
			estimate.timestamp,
			estimate.fusion_pose.x,
			estimate.fusion_pose.y,
			estimate.fusion_pose.z
		);

		*self.shared.lock() = estimate;
	}
}
