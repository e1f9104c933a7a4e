pub mod transcribe;

use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use eleven_stt_core::errors::Result;

#[derive(Debug, Parser)]
#[command(
    name = "eleven-stt",
    version,
    about = "Speech-to-text with ElevenLabs",
    long_about = "Upload a local audio/video file or point at a remote URL, wait for the \
                  ElevenLabs transcription job to finish and print the transcript.",
    arg_required_else_help = true
)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["file", "url"])
))]
pub struct Cli {
    #[command(flatten)]
    pub transcribe: transcribe::TranscribeArgs,
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    transcribe::run(&cli.transcribe).await
}

/// Help and version are successful exits; every usage error is 1.
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

/// Print a parse failure and return the exit code. clap routes the usage
/// shown for a bare invocation to stderr; it goes to stdout here, the same
/// as `--help`.
pub fn report_parse_error(err: &clap::Error) -> i32 {
    let printed = match err.kind() {
        ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => Cli::command().print_help(),
        _ => err.print(),
    };
    if let Err(e) = printed {
        tracing::debug!("Failed to print usage: {e}");
    }
    exit_code(err.kind())
}
