use chrono::{DateTime, TimeZone};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{
	collections::VecDeque,
	fmt::Display,
	fs::{File, OpenOptions},
	io::{self, Write},
	thread,
	thread::JoinHandle,
	time::{Duration, Instant},
};

lazy_static! {
	static ref BLACK_BOX_CHANNEL: (Sender<Message>, Receiver<Message>) = unbounded::<Message>();
	static ref BLACK_BOX_LOGGER: BlackBoxLogger = BlackBoxLogger {
		start_instant: Instant::now()
	};
}

enum Message {
	Log(String),
	Flush,
}

/// Log backend writing every record to stdout and to a file named after the start time.
///
/// Records are formatted by the logging thread and written in batches by a dedicated thread, so
/// that logging from the sampling loop never waits on the file system.
pub struct BlackBox {
	file: File,
	buffer: VecDeque<String>,
	last_flush_instant: Instant,
}

impl BlackBox {
	/// Creates `<prefix>_<H-M-S>_<d-m-Y>.log` in the working directory.
	pub fn new(prefix: &str) -> io::Result<Self> {
		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(log_file_name(prefix, &chrono::offset::Local::now()))?;

		Ok(BlackBox {
			file,
			buffer: VecDeque::<String>::new(),
			last_flush_instant: Instant::now(),
		})
	}

	fn try_flush(&mut self) {
		match self.flush() {
			Ok(()) => self.last_flush_instant = Instant::now(),
			Err(e) => {
				self.buffer.push_back(format!("Failed to flush black box: {}", e));
			}
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		while let Some(message) = self.buffer.pop_front() {
			println!("{}", message);
			writeln!(self.file, "{}", message)?;
		}

		self.file.flush()
	}

	fn receive_loop(&mut self) {
		const RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);
		const MAX_BUFFER_LEN: usize = 8;
		const MAX_FLUSH_PERIOD: Duration = Duration::from_secs(1);

		while let Ok(message) = BLACK_BOX_CHANNEL.1.recv_timeout(RECEIVE_TIMEOUT) {
			match message {
				Message::Log(content) => self.buffer.push_back(content),
				Message::Flush => self.try_flush(),
			}

			if self.buffer.len() > MAX_BUFFER_LEN || self.last_flush_instant.elapsed() > MAX_FLUSH_PERIOD {
				self.try_flush();
			}
		}

		if !self.buffer.is_empty() {
			self.try_flush();
		}
	}

	/// Installs the global logger and starts the writing thread.
	pub fn spawn(mut self, level_filter: LevelFilter) -> Result<JoinHandle<()>, SetLoggerError> {
		log::set_logger(&*BLACK_BOX_LOGGER)?;
		log::set_max_level(level_filter);

		Ok(thread::spawn(move || loop {
			self.receive_loop()
		}))
	}
}

fn log_file_name<Tz: TimeZone>(prefix: &str, now: &DateTime<Tz>) -> String
where
	Tz::Offset: Display,
{
	format!("{}_{}.log", prefix, now.format("%H-%M-%S_%d-%m-%Y"))
}

fn format_record(record: &Record, elapsed: Duration) -> String {
	if record.level() == Level::Error {
		format!(
			"[{:.3}][{:?}][{}] {} ({}:{})",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
			record.file().unwrap_or("unknown"),
			record.line().unwrap_or(0)
		)
	} else {
		format!(
			"[{:.3}][{:?}][{}] {}",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
		)
	}
}

struct BlackBoxLogger {
	start_instant: Instant,
}

impl Log for BlackBoxLogger {
	fn enabled(&self, _: &Metadata) -> bool {
		true
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			let formatted = format_record(record, self.start_instant.elapsed());

			// The receiving end is static and never dropped.
			let _ = BLACK_BOX_CHANNEL.0.send(Message::Log(formatted));
		}
	}

	fn flush(&self) {
		let _ = BLACK_BOX_CHANNEL.0.send(Message::Flush);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	#[test]
	fn file_name_carries_start_time() {
		let start = Utc.with_ymd_and_hms(2021, 3, 7, 14, 5, 9).unwrap();
		assert_eq!(log_file_name("drive", &start), "drive_14-05-09_07-03-2021.log");
	}

	#[test]
	fn errors_carry_their_location() {
		let record = Record::builder()
			.level(Level::Error)
			.module_path(Some("imu::sample_thread"))
			.file(Some("imu/src/sample_thread.rs"))
			.line(Some(42))
			.args(format_args!("Sampling thread panicked"))
			.build();

		assert_eq!(
			format_record(&record, Duration::from_millis(1500)),
			"[1.500][Error][imu::sample_thread] Sampling thread panicked (imu/src/sample_thread.rs:42)"
		);
	}

	#[test]
	fn other_levels_are_short() {
		let record = Record::builder()
			.level(Level::Info)
			.module_path(Some("drive"))
			.args(format_args!("Drive 0.1.0"))
			.build();

		assert_eq!(format_record(&record, Duration::from_millis(20)), "[0.020][Info][drive] Drive 0.1.0");
	}
}
