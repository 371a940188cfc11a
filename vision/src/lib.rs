pub use lms_util::*;

pub mod prelude {
	pub use crate::{
		colors::{self, GrayBand},
		error::Error,
		matching::{MatchResult, MatchResultList},
		register::{CutRange, Direction},
	};

	pub use lms_util::*;
}

pub mod consts;
pub mod error;
pub mod colors;
mod fft;
pub mod matching;
pub mod empty;
pub mod register;
pub mod expand;
pub mod reconcile;
pub mod catalogue;
pub mod locate;

pub use error::Error;
