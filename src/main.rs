use clap::Parser;
use wavsort::cli::{Args, OrganizeCommand, run_cli_with_config};
use wavsort::output::OutputFormatter;
use wavsort::picker::{DirectorySelection, select_directories};

fn main() {
    let args = Args::parse();

    OutputFormatter::header("Welcome to the File Organizer!");
    OutputFormatter::plain(
        "This tool will organize recordings in a source directory into subdirectories based on a specified naming format.",
    );

    let command = if let Some(destination) = args.undo.clone() {
        OrganizeCommand::Undo { destination }
    } else {
        // The picker only lives for the two prompts.
        let selection = {
            let mut picker = args.picker();
            select_directories(picker.as_mut(), args.source.clone(), args.destination.clone())
        };

        match selection {
            Ok(DirectorySelection::Selected {
                source,
                destination,
            }) => OrganizeCommand::Organize {
                source,
                destination,
                dry_run: args.dry_run,
                verify_wav: args.verify_wav,
                record_history: args.record_history,
            },
            Ok(DirectorySelection::SourceCanceled) => {
                OutputFormatter::plain("Source directory selection canceled. Exiting...");
                return;
            }
            Ok(DirectorySelection::DestinationCanceled) => {
                OutputFormatter::plain("Destination directory selection canceled. Exiting...");
                return;
            }
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                std::process::exit(1);
            }
        }
    };

    let is_organize = matches!(command, OrganizeCommand::Organize { .. });

    match run_cli_with_config(command, args.config.as_deref()) {
        Ok(()) if is_organize => {
            OutputFormatter::success("File organization completed successfully!")
        }
        Ok(()) => {}
        Err(e) => {
            OutputFormatter::error(&e);
            std::process::exit(1);
        }
    }
}
