/// Runs `$code` and logs how long it took under `$label`
#[macro_export]
macro_rules! timed {
	($label:expr => $code:expr) => {{
		let start = std::time::Instant::now();
		let ret = $code;
		$crate::log::info!("{} took {:?}", $label, start.elapsed());
		ret
	}};
}

/// Per-test scratch directory under the system temp dir, removed on drop
pub struct ScratchDir(std::path::PathBuf);
impl ScratchDir {
	pub fn new(name: &str) -> std::io::Result<Self> {
		static COUNT: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

		let id = COUNT.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
		let path = std::env::temp_dir().join(format!("lms-{name}-{}-{id}", std::process::id()));
		if path.exists() {
			std::fs::remove_dir_all(&path)?;
		}
		std::fs::create_dir_all(&path)?;
		Ok(Self(path))
	}

	#[inline]
	pub fn path(&self) -> &std::path::Path {
		&self.0
	}
}
impl Drop for ScratchDir {
	fn drop(&mut self) {
		std::fs::remove_dir_all(&self.0).ok();
	}
}

#[test]
fn test_scratch_dir() {
	let path = {
		let dir = ScratchDir::new("scratch").unwrap();
		assert!(dir.path().is_dir());
		std::fs::write(dir.path().join("a.txt"), "a").unwrap();
		dir.path().to_path_buf()
	};
	assert!(!path.exists());
	assert_eq!(timed!("noop" => 1 + 1), 2);
}
