//! The reconstruction command.

use evrecon::Reconstructor;
use tracing::info;

use crate::cli::Cli;
use crate::error::CliError;

/// Run a reconstruction for the parsed arguments and print a summary.
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    let config = cli.to_config();
    let reconstructor = Reconstructor::new(config)?;

    info!(
        events = %cli.events_path.display(),
        output = %cli.out_path.display(),
        "Reconstructing"
    );

    let summary = reconstructor.run_file(&cli.events_path, &cli.out_path)?;

    println!(
        "Wrote {} frames to {}",
        summary.frames.len(),
        cli.out_path.display()
    );
    println!("  Events read:    {}", summary.events_read);
    println!("  Events dropped: {}", summary.dropped_events);
    if let (Some(first), Some(last)) = (summary.frames.first(), summary.frames.last()) {
        println!("  Windows:        {} .. {}", first.window_end, last.window_end);
    }

    Ok(())
}
