use lms_util::{chrono, log, Mutex};
use std::{
	fs::{File, OpenOptions},
	io::Write,
};

struct LmsLogger {
	level: log::LevelFilter,
	/// `lms.log` in the temp dir, when `--dump-logs` is given
	file: Option<Mutex<File>>,
}
impl log::Log for LmsLogger {
	#[inline]
	fn enabled(&self, metadata: &log::Metadata) -> bool {
		metadata.level() <= self.level
	}

	fn log(&self, record: &log::Record) {
		if !self.enabled(record.metadata()) {
			return;
		}

		let text = format!("[{}] [{}] {}", record.level(), record.module_path().unwrap_or("?"), record.args());

		println!("{text}");

		if let Some(file) = &self.file {
			writeln!(&mut *file.lock(), "{} {text}", chrono::Local::now().format("%H:%M:%S%.3f")).ok();
		}
	}

	fn flush(&self) {
		if let Some(file) = &self.file {
			file.lock().flush().ok();
		}
	}
}

fn open_log_file() -> Option<Mutex<File>> {
	let path = std::env::temp_dir().join("lms.log");
	match OpenOptions::new().append(true).create(true).open(&path) {
		Ok(mut f) => {
			writeln!(f, "============ LMS LOG {} ============", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).ok();
			Some(Mutex::new(f))
		}
		Err(err) => {
			eprintln!("Failed to open {}: {err}", path.display());
			None
		}
	}
}

pub fn init(dump_logs: bool, verbose: bool) {
	let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };

	let logger = LmsLogger {
		level,
		file: if dump_logs { open_log_file() } else { None },
	};

	if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
		log::set_max_level(level);
	}
}
