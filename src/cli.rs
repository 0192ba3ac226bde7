use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "msetools")]
#[command(author, version, about = "Media Source Extensions bytestream tools")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a WebM or ISO-BMFF bytestream
    Validate {
        /// Stream to validate ("-" for stdin)
        #[arg(required = true)]
        input: PathBuf,

        /// MIME type of the stream, e.g. 'video/webm; codecs="vp8"' (detected if not specified)
        #[arg(short = 't', long = "type")]
        mime_type: Option<String>,

        /// Bytes passed to the validator per append
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Print the element tree of a stream
    Dump {
        /// Stream to dump ("-" for stdin)
        #[arg(required = true)]
        input: PathBuf,

        /// Bytes passed to the parser per append
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Print the init and media segment index of a stream as JSON
    Index {
        /// Stream to index ("-" for stdin)
        #[arg(required = true)]
        input: PathBuf,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,

        /// Bytes passed to the parser per append
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Validate configuration file
    CheckConfig {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
