//! Quarry command line importer
//!
//! Stages source files the way a drop onto the content browser would, then
//! imports them into a folder of the project's content root.
//!
//! Run with: cargo run --bin quarry -- [--config FILE] <content-root> <destination> <files...>
//!
//! Destination is relative to the content root or absolute inside it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use quarry_content::{
    ImportDispatcher, ImportEvent, ImportStatus, ProjectContext, RawCopyRunner, StagingArea, StagingConfig,
    StagingError, StagingResult,
};

const USAGE: &str = "usage: quarry [--config FILE] <content-root> <destination> <files...>";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    content_root: PathBuf,
    destination: String,
    files: Vec<PathBuf>,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut config = None;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or("--config needs a file")?;
                    config = Some(PathBuf::from(path));
                }
                "--help" | "-h" => return Err(USAGE.to_string()),
                flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
                _ => positional.push(arg),
            }
        }

        if positional.len() < 3 {
            return Err(USAGE.to_string());
        }
        let mut positional = positional.into_iter();
        let content_root = positional.next().map(PathBuf::from).unwrap_or_default();
        let destination = positional.next().unwrap_or_default();
        Ok(Self {
            config,
            content_root,
            destination,
            files: positional.map(PathBuf::from).collect(),
        })
    }

    /// Destination as an absolute folder under the content root
    fn destination_folder(&self) -> String {
        let destination = Path::new(&self.destination);
        if destination.is_absolute() {
            self.destination.clone()
        } else {
            self.content_root.join(destination).to_string_lossy().into_owned()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::error!("{} import(s) failed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Stage and import every file; returns the number of failed imports
fn run(args: &Args) -> StagingResult<usize> {
    let config = StagingConfig::load_or_default(args.config.as_deref())?;
    log::info!("Staging Configuration:");
    log::info!("  Workers: {}", config.import.worker_threads);
    log::info!("  Manifests: {}", config.import.write_manifest);
    match config.to_toml() {
        Ok(text) => log::debug!("Effective config:\n{}", text),
        Err(e) => log::warn!("{}", e),
    }

    let project = ProjectContext::new(&args.content_root)?;
    let mut staging = StagingArea::with_extensions(project, config.extensions.clone());
    staging.add_files(args.files.as_slice(), &args.destination_folder())?;
    if staging.file_count() == 0 {
        return Err(StagingError::Config("no importable files were given".to_string()));
    }
    log::info!("Staged {} file(s)", staging.file_count());

    let runner = Arc::new(RawCopyRunner::new(config.import.write_manifest));
    let dispatcher = ImportDispatcher::new(runner, config.import.worker_threads)?;
    let batches = staging.import(&dispatcher);
    log::info!("Dispatched {} batch(es)", batches.len());

    let events = dispatcher.events();
    while staging.importing().has_pending() {
        match events.recv_timeout(Duration::from_millis(250)) {
            Ok(event) => {
                if let ImportEvent::BatchFinished {
                    batch,
                    kind,
                    succeeded,
                    failed,
                } = &event
                {
                    log::info!("{} ({}) finished: {} ok, {} failed", batch, kind, succeeded, failed);
                }
                staging.importing_mut().apply(&event);
            }
            Err(RecvTimeoutError::Timeout) => {
                log::debug!("{} job(s) in flight", dispatcher.in_flight());
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let mut failed = 0;
    for item in staging.importing().items() {
        match &item.status {
            ImportStatus::Succeeded => println!("imported  {}", item.source.display()),
            ImportStatus::Failed(message) => {
                failed += 1;
                println!("FAILED    {}: {}", item.source.display(), message);
            }
            status => println!("{:?}  {}", status, item.source.display()),
        }
    }
    Ok(failed)
}
