pub use image::{GenericImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage};
pub use parking_lot::Mutex;
pub use rayon::prelude::*;

pub type AnyError = anyhow::Error;

pub use std::{
	collections::{BTreeMap, BTreeSet, VecDeque},
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::Duration,
};

pub use crossbeam_channel as crossbeam;
pub use rayon;
pub use image;
pub use imageproc;
pub use parking_lot;
pub use anyhow;
pub use log;
pub use chrono;

mod geometry;
pub use geometry::*;

mod debug;
pub use debug::*;

#[path = "image.rs"]
mod util_image;
pub use util_image::*;
