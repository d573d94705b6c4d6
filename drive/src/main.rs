#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

use crossbeam_channel::{bounded, RecvTimeoutError};
use imu::{PublishedEstimate, SampleThread};
use std::{thread, time::Duration};

use crate::drive_config::TryIntoLevelFilter;
use crate::simulated_imu::SimulatedImu;
use black_box::BlackBox;

mod drive_config;
mod simulated_imu;

fn report(estimate: &PublishedEstimate) {
	let pose = estimate.fusion_pose;

	info!(
		"roll {:7.2} pitch {:7.2} yaw {:7.2} | height {:.1} m | gyro bias {} | mag {} | {} samples/s",
		pose.x.to_degrees(),
		pose.y.to_degrees(),
		pose.z.to_degrees(),
		estimate.height.unwrap_or(0.),
		if estimate.gyro_bias_valid { "valid" } else { "learning" },
		if estimate.mag_cal_valid { "calibrated" } else { "uncalibrated" },
		estimate.sample_rate
	);
}

fn main() -> anyhow::Result<()> {
	// Command line arguments
	const CONFIG_ARG: &str = "config";
	const DURATION_ARG: &str = "duration";

	let args = clap::Command::new("Drive")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Vincent Leporcher <vincent.leporcher@telecom-paris.fr>")
		.about("Attitude estimation on a simulated sensor board")
		.arg(clap::Arg::new(CONFIG_ARG)
			.long("config")
			.short('c')
			.value_name("FILE")
			.help("JSON configuration file (defaults are used without one)")
			.takes_value(true))
		.arg(clap::Arg::new(DURATION_ARG)
			.long("duration")
			.short('d')
			.value_name("SECONDS")
			.help("Stops after this many seconds instead of waiting for enter")
			.takes_value(true))
		.get_matches();

	let duration = match args.value_of(DURATION_ARG) {
		Some(seconds) => {
			let seconds: f64 = seconds
				.parse()
				.map_err(|_| anyhow!("Invalid duration \"{}\"", seconds))?;

			if !seconds.is_finite() || seconds < 0. {
				return Err(anyhow!("Invalid duration \"{}\"", seconds));
			}

			Some(Duration::from_secs_f64(seconds))
		}
		None => None,
	};

	// Configuration
	let config = drive_config::read(args.value_of(CONFIG_ARG))?;

	// Log
	let level_filter = config.log_level_filter
		.try_into_level_filter()
		.map_err(|_| anyhow!("Failed to parse log level filter \"{}\"", config.log_level_filter))?;

	BlackBox::new("drive")?
		.spawn(level_filter)
		.map_err(|e| anyhow!("Failed to install logger: {}", e))?;

	info!("Drive {}", env!("CARGO_PKG_VERSION"));

	// Sampling
	let source = SimulatedImu::new(config.sample_rate, config.simulation.clone());
	let sampler = SampleThread::spawn(source, &config.imu)?;

	// Report
	let reader = sampler.reader();
	let report_period = Duration::from_millis(config.report_period_ms.max(1));
	let (stop_sender, stop_receiver) = bounded::<()>(1);

	let reporter = thread::spawn(move || {
		while let Err(RecvTimeoutError::Timeout) = stop_receiver.recv_timeout(report_period) {
			report(&reader.latest_estimate());
		}
	});

	match duration {
		Some(duration) => thread::sleep(duration),
		None => {
			info!("Press enter to stop");
			std::io::stdin().read_line(&mut String::new())?;
		}
	}

	stop_sender.send(())?;
	reporter.join().map_err(|_| anyhow!("Report thread panicked"))?;

	sampler.stop()?;

	log::logger().flush();
	thread::sleep(Duration::from_millis(100));

	Ok(())
}
