//! One load -> smash -> save cycle.

use std::path::PathBuf;

use crate::arch::x86::X86;
use crate::config::Config;
use crate::error::Result;
use crate::loader;
use crate::smasher::{PadSmasher, SmashReport};
use crate::writer;

/// What a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: SmashReport,
    /// `None` for a dry run.
    pub output: Option<PathBuf>,
}

/// Smashes the image named by `config`.
///
/// Any fatal error aborts before the output is written.
pub fn run(config: &Config) -> Result<RunOutcome> {
    config.validate()?;

    let image = loader::load_image(&config.file)?;
    let mut smasher = PadSmasher::new(X86, image)?;

    let map_text = loader::load_map_text(&config.map_path())?;
    smasher.add_map(&map_text);
    smasher.scan();
    smasher.patch();

    let (image, report) = smasher.finish();
    tracing::info!("{}", report);

    if config.dry_run {
        return Ok(RunOutcome { report, output: None });
    }

    let output = config.output_path();
    writer::write_image(&output, &image, &config.file)?;
    Ok(RunOutcome {
        report,
        output: Some(output),
    })
}
