mod logs;
mod pipeline;
mod settings;

use clap::{Args, Parser, Subcommand};
use lms_stitch::{store::FsStore, Stitcher};
use lms_util::{anyhow::Context, log, AnyError, Arc, AtomicBool, Ordering, PathBuf};
use lms_vision::catalogue::TemplateCatalogue;
use pipeline::Floors;
use settings::Settings;

#[derive(Parser)]
#[command(name = "lms", version)]
#[command(about = "Stitches captured map tiles into whole maps and finds points of interest on them")]
struct Cli {
	/// Settings file, created with `lms settings`
	#[arg(long, default_value = "settings.json", global = true)]
	settings: PathBuf,

	/// Also append logs to lms.log in the temp directory
	#[arg(long, global = true)]
	dump_logs: bool,

	/// Log every registration attempt and checkpoint save
	#[arg(long, short, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Args)]
struct RegionArgs {
	/// Region name, as used in the work directory
	#[arg(long)]
	region: String,

	/// Floors to process, e.g. `-1,0,1`
	#[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0")]
	floors: Vec<i32>,

	/// The region was captured through the larger sub-region map window
	#[arg(long)]
	sub_region: bool,
}
impl RegionArgs {
	fn floors(&self) -> Floors {
		Floors::new(&self.region, &self.floors, self.sub_region)
	}
}

#[derive(Args)]
struct GridArgs {
	/// Rows of the capture grid
	#[arg(long)]
	rows: i32,

	/// Columns of the capture grid
	#[arg(long)]
	cols: i32,
}

#[derive(Subcommand)]
enum Command {
	/// Assemble each floor's tiles into a canvas, resuming from its checkpoint
	Assemble {
		#[command(flatten)]
		region: RegionArgs,
		#[command(flatten)]
		grid: GridArgs,
	},

	/// Pad each floor's canvas so road keeps clear of the edges
	Expand {
		#[command(flatten)]
		region: RegionArgs,
	},

	/// Align the floors of a region and pad them to a common size
	Reconcile {
		#[command(flatten)]
		region: RegionArgs,
	},

	/// Print the points of interest found on each floor as JSON
	Locate {
		#[command(flatten)]
		region: RegionArgs,
	},

	/// Locate points of interest and save the final maps, masks and points
	Finalize {
		#[command(flatten)]
		region: RegionArgs,
	},

	/// Every stage in order
	Run {
		#[command(flatten)]
		region: RegionArgs,
		#[command(flatten)]
		grid: GridArgs,
	},

	/// Write the effective settings to the settings file
	Settings,
}

fn main() {
	let cli = Cli::parse();

	logs::init(cli.dump_logs, cli.verbose);

	if let Err(err) = start(cli) {
		log::error!("{err:?}");
		std::process::exit(1);
	}
}

fn start(cli: Cli) -> Result<(), AnyError> {
	let settings = Settings::load(&cli.settings);

	let shutdown = Arc::new(AtomicBool::new(false));
	{
		let shutdown = shutdown.clone();
		let handler = ctrlc::set_handler(move || {
			log::warn!("stopping after the current step...");
			shutdown.store(true, Ordering::Release);
		});
		if handler.is_err() {
			log::error!("Failed to set CTRL+C handler, stopping will lose the step in progress");
		}
	}

	let catalogue = || {
		TemplateCatalogue::load_dir(&settings.templates_dir, &settings.template_prefixes)
			.with_context(|| format!("loading templates from {}", settings.templates_dir.display()))
	};

	let stitcher = Stitcher::new(FsStore::new(&settings.work_dir), settings.stitch).with_interrupt(shutdown);

	match cli.command {
		Command::Assemble { region, grid } => pipeline::assemble(&stitcher, &region.floors(), grid.rows, grid.cols),
		Command::Expand { region } => pipeline::expand(&stitcher, &region.floors()),
		Command::Reconcile { region } => pipeline::reconcile(&stitcher, &region.floors()),

		Command::Locate { region } => {
			for (floor, points) in pipeline::locate(&stitcher, &region.floors(), &catalogue()?)? {
				println!("{floor}: {}", serde_json::to_string(&points)?);
			}
			Ok(())
		}

		Command::Finalize { region } => pipeline::finalize(&stitcher, &region.floors(), &catalogue()?),
		Command::Run { region, grid } => pipeline::run(&stitcher, &region.floors(), grid.rows, grid.cols, &catalogue()?),

		Command::Settings => {
			settings.save(&cli.settings).with_context(|| format!("writing {}", cli.settings.display()))?;
			log::info!("settings written to {}", cli.settings.display());
			Ok(())
		}
	}
}
