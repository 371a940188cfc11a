use crate::prelude::*;
use lms_vision::{empty::is_empty_tile, register::register};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblyState {
	Uninitialized,
	/// The canvas holds the seed tile, or everything placed by a previous run
	Seeded,
	Expanding,
	Converged,
}

/// Breadth-first assembly of a region floor's tiles into one canvas
///
/// Starting from the seed (or a checkpoint), each placed tile's neighbours are registered against it
/// and merged into the canvas. The checkpoint is saved after every decision so that an interrupted
/// run resumes exactly where it stopped.
pub struct Assembler<'a, S: TileStore + CheckpointStore + ?Sized> {
	store: &'a S,
	region: &'a RegionFloor,
	params: &'a RegistrarParams,
	rows: i32,
	cols: i32,
	interrupt: Option<&'a AtomicBool>,

	state: AssemblyState,
	checkpoint: Checkpoint,
	canvas: Canvas,
	frontier: VecDeque<GridPos>,
}
impl<'a, S: TileStore + CheckpointStore + ?Sized> Assembler<'a, S> {
	pub fn new(store: &'a S, region: &'a RegionFloor, params: &'a RegistrarParams, rows: i32, cols: i32) -> Self {
		Self {
			store,
			region,
			params,
			rows,
			cols,
			interrupt: None,

			state: AssemblyState::Uninitialized,
			checkpoint: Checkpoint::default(),
			canvas: Canvas::blank(0, 0),
			frontier: VecDeque::new(),
		}
	}

	/// Stop with [`Error::Interrupted`] at the next step once `flag` is set
	pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
		self.interrupt = Some(flag);
		self
	}

	#[inline]
	pub fn state(&self) -> AssemblyState {
		self.state
	}

	#[inline]
	pub fn canvas(&self) -> &Canvas {
		&self.canvas
	}

	#[inline]
	pub fn checkpoint(&self) -> &Checkpoint {
		&self.checkpoint
	}

	#[inline]
	fn in_grid(&self, pos: GridPos) -> bool {
		(1..=self.rows).contains(&pos.row) && (1..=self.cols).contains(&pos.col)
	}

	fn save_checkpoint(&mut self) -> Result<(), Error> {
		let (width, height) = self.canvas.dimensions();
		self.checkpoint.canvas_width = width;
		self.checkpoint.canvas_height = height;
		self.store.save(self.region, &self.checkpoint)?;
		log::debug!("{}: checkpoint saved ({} done, {} placed)", self.region, self.checkpoint.done.len(), self.checkpoint.placements.len());
		Ok(())
	}

	/// Resumes from the saved checkpoint, or places the tile with the most road at the origin
	pub fn seed(&mut self) -> Result<(), Error> {
		if self.state != AssemblyState::Uninitialized {
			return Ok(());
		}

		match self.store.load(self.region)? {
			Some(checkpoint) => self.resume(checkpoint)?,
			None => self.place_seed()?,
		}

		self.state = AssemblyState::Seeded;
		Ok(())
	}

	fn resume(&mut self, checkpoint: Checkpoint) -> Result<(), Error> {
		if let Some((pos, _)) = checkpoint.placements.iter().find(|(pos, _)| !checkpoint.done.contains(pos)) {
			return Err(Error::InvalidCheckpoint { region: self.region.clone(), pos: *pos });
		}

		log::info!(
			"{}: resuming from checkpoint ({}x{}, {} done, {} placed)",
			self.region,
			checkpoint.canvas_width,
			checkpoint.canvas_height,
			checkpoint.done.len(),
			checkpoint.placements.len()
		);

		self.canvas = Canvas::blank(checkpoint.canvas_width, checkpoint.canvas_height);
		for (pos, at) in &checkpoint.placements {
			match self.store.get(self.region, *pos) {
				Some(tile) => self.canvas.paint(&tile, *at),
				None => log::warn!("{}: placed tile {pos} is gone, leaving its area blank", self.region),
			}
		}

		self.checkpoint = checkpoint;
		Ok(())
	}

	fn place_seed(&mut self) -> Result<(), Error> {
		let mut first = None;
		let mut best: Option<(GridPos, usize, RgbImage)> = None;

		for pos in GridPos::grid(self.rows, self.cols) {
			let tile = match self.store.get(self.region, pos) {
				Some(tile) => tile,
				None => continue,
			};
			first.get_or_insert(pos);

			let road = colors::count_road(&tile);
			if road > 0 && best.as_ref().map(|(_, best, _)| road > *best).unwrap_or(true) {
				best = Some((pos, road, tile));
			}
		}

		let (pos, tile) = match (best, first) {
			(Some((pos, road, tile)), _) => {
				log::info!("{}: seeding with {pos} ({road} road pixels)", self.region);
				(pos, tile)
			}
			(None, Some(pos)) => {
				log::warn!("{}: no tile shows any road, seeding with {pos}", self.region);
				match self.store.get(self.region, pos) {
					Some(tile) => (pos, tile),
					None => return Err(Error::NoTiles(self.region.clone())),
				}
			}
			(None, None) => return Err(Error::NoTiles(self.region.clone())),
		};

		self.canvas = Canvas::from_tile(tile);
		self.checkpoint = Checkpoint::default();
		self.checkpoint.placements.push((pos, Point::new(0, 0)));
		self.checkpoint.done.insert(pos);
		self.save_checkpoint()
	}

	/// Explores the neighbours of the next frontier tile
	///
	/// Returns `false` once the frontier is exhausted.
	pub fn step(&mut self) -> Result<bool, Error> {
		match self.state {
			AssemblyState::Uninitialized => self.seed()?,
			AssemblyState::Converged => return Ok(false),
			_ => {}
		}

		if self.state == AssemblyState::Seeded {
			self.frontier = self.checkpoint.placements.iter().map(|(pos, _)| *pos).collect();
			self.state = AssemblyState::Expanding;
		}

		if self.interrupt.map(|flag| flag.load(Ordering::Acquire)).unwrap_or(false) {
			log::warn!("{}: interrupted, progress is saved in the checkpoint", self.region);
			return Err(Error::Interrupted);
		}

		let current = match self.frontier.pop_front() {
			Some(current) => current,
			None => {
				self.converge();
				return Ok(false);
			}
		};

		let current_tile = match self.store.get(self.region, current) {
			Some(tile) => tile,
			None => {
				log::warn!("{}: placed tile {current} is gone, not exploring its neighbours", self.region);
				return Ok(true);
			}
		};

		for direction in Direction::ALL {
			let next = current.neighbour(direction);
			if !self.in_grid(next) || self.checkpoint.done.contains(&next) {
				continue;
			}

			let tile = match self.store.get(self.region, next) {
				Some(tile) => tile,
				None => continue,
			};

			if is_empty_tile(&tile) {
				log::info!("{}: {next} is blank, skipping", self.region);
				self.checkpoint.done.insert(next);
				self.save_checkpoint()?;
				continue;
			}

			let offset = match register(&current_tile, &tile, direction, self.params) {
				Some(offset) => offset,
				None => {
					log::info!("{}: could not register {next} {direction} of {current}", self.region);
					continue;
				}
			};

			// placed tiles always have a placement
			let anchor = self.checkpoint.placement(current).unwrap_or_default();
			let at = anchor + offset;

			let shift = self.canvas.merge(&tile, at);
			if shift != Point::new(0, 0) {
				self.checkpoint.shift(shift);
			}
			let at = at + shift;

			log::info!("{}: placed {next} {direction} of {current} at {at:?} (offset {offset:?})", self.region);

			self.checkpoint.placements.push((next, at));
			self.checkpoint.done.insert(next);
			self.save_checkpoint()?;
			self.frontier.push_back(next);
		}

		Ok(true)
	}

	fn converge(&mut self) {
		self.state = AssemblyState::Converged;

		let unresolved = GridPos::grid(self.rows, self.cols)
			.filter(|pos| !self.checkpoint.done.contains(pos) && self.store.contains(self.region, *pos))
			.map(|pos| pos.to_string())
			.collect::<Vec<_>>();

		let (width, height) = self.canvas.dimensions();
		if unresolved.is_empty() {
			log::info!("{}: assembled {} tiles into {width}x{height}", self.region, self.checkpoint.placements.len());
		} else {
			log::warn!(
				"{}: assembled {} tiles into {width}x{height}, {} could not be placed: {}",
				self.region,
				self.checkpoint.placements.len(),
				unresolved.len(),
				unresolved.join(", ")
			);
		}
	}

	/// Runs until the frontier is exhausted and returns the canvas
	pub fn run(mut self) -> Result<Canvas, Error> {
		self.seed()?;
		while self.step()? {}
		Ok(self.canvas)
	}
}
