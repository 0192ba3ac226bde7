mod cli;

use msetools::{
    config::{self, StreamFormat},
    detect::{self, Container},
    dump,
    segment_index::build_index,
    session::MediaSourceSession,
};
use msetools_validator::{IsoBmff, Webm};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

type Input = BufReader<Box<dyn Read>>;

fn open_input(path: &Path) -> Result<Input> {
    let reader: Box<dyn Read> = if path == Path::new("-") {
        Box::new(std::io::stdin())
    } else {
        if !path.exists() {
            anyhow::bail!("File does not exist: {:?}", path);
        }
        Box::new(File::open(path).with_context(|| format!("Failed to open {:?}", path))?)
    };
    Ok(BufReader::new(reader))
}

/// Pick the container from config, magic bytes, or the file extension.
fn resolve_container(input: &mut Input, path: &Path, format: StreamFormat) -> Result<Container> {
    match format {
        StreamFormat::Webm => Ok(Container::Webm),
        StreamFormat::Isobmff => Ok(Container::IsoBmff),
        StreamFormat::Auto => {
            let magic = input.fill_buf().context("Failed to read input")?;
            detect::detect_container_from_bytes(magic)
                .or_else(|| detect::container_from_extension(path))
                .with_context(|| {
                    format!(
                        "Unable to detect container format of {:?}; set stream.format in the config",
                        path
                    )
                })
        }
    }
}

fn validate_stream(
    path: &Path,
    mime_type: Option<String>,
    chunk_size: usize,
    format: StreamFormat,
) -> Result<()> {
    anyhow::ensure!(chunk_size > 0, "Chunk size must be greater than 0");
    let mut input = open_input(path)?;
    let mime_type = match mime_type {
        Some(mime_type) => mime_type,
        None => resolve_container(&mut input, path, format)?
            .default_type_info()
            .to_string(),
    };

    let mut session = MediaSourceSession::new("ms");
    let id = session.add_source_buffer(&mime_type)?;

    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;
    let mut failed = false;
    while !failed {
        let n = input.read(&mut buf).context("Failed to read input")?;
        if n == 0 {
            break;
        }
        total += n as u64;
        // Later appends would only repeat the first error.
        failed = !session.append(&id, &buf[..n])?.is_empty();
    }
    if !failed {
        session.end_of_stream(None)?;
    }

    let errors = session
        .source_buffer(&id)
        .map(|buffer| buffer.errors().to_vec())
        .unwrap_or_default();

    if errors.is_empty() {
        println!("{}: OK ({} bytes, {})", path.display(), total, mime_type);
        return Ok(());
    }
    for error in &errors {
        println!("{}: {}", path.display(), error);
    }
    anyhow::bail!("{} error(s) in {}", errors.len(), path.display())
}

fn dump_stream(path: &Path, chunk_size: usize, format: StreamFormat) -> Result<()> {
    let mut input = open_input(path)?;
    let container = resolve_container(&mut input, path, format)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match container {
        Container::Webm => dump::dump::<Webm, _, _>(input, &mut out, chunk_size)?,
        Container::IsoBmff => dump::dump::<IsoBmff, _, _>(input, &mut out, chunk_size)?,
    };
    Ok(())
}

fn index_stream(path: &Path, compact: bool, chunk_size: usize, format: StreamFormat) -> Result<()> {
    let mut input = open_input(path)?;
    let container = resolve_container(&mut input, path, format)?;
    let index = build_index(container, input, chunk_size)?;

    let json = if compact {
        serde_json::to_string(&index)?
    } else {
        serde_json::to_string_pretty(&index)?
    };
    println!("{}", json);
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };
    println!("  Chunk size: {}", config.stream.chunk_size);
    println!("  Format: {:?}", config.stream.format);
    println!(
        "  Log filter: {}",
        config.log.filter.as_deref().unwrap_or("(default)")
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::CheckConfig { .. } | Commands::Version => config::Config::default(),
        _ => config::load_config_or_default(cli.config.as_deref())?,
    };

    // Initialize logging
    // Respect RUST_LOG env var if set, then the config filter, otherwise use
    // defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if let Some(filter) = &config.log.filter {
            filter.clone()
        } else if cli.verbose {
            "msetools=trace,msetools_validator=trace,msetools_parser=trace".to_string()
        } else {
            "msetools=info,msetools_validator=warn,msetools_parser=warn".to_string()
        }
    });

    // stdout carries dump and index output.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let format = config.stream.format;
    match cli.command {
        Commands::Validate {
            input,
            mime_type,
            chunk_size,
        } => validate_stream(
            &input,
            mime_type,
            chunk_size.unwrap_or(config.stream.chunk_size),
            format,
        ),
        Commands::Dump { input, chunk_size } => dump_stream(
            &input,
            chunk_size.unwrap_or(config.stream.chunk_size),
            format,
        ),
        Commands::Index {
            input,
            compact,
            chunk_size,
        } => index_stream(
            &input,
            compact,
            chunk_size.unwrap_or(config.stream.chunk_size),
            format,
        ),
        Commands::CheckConfig {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            check_config(path.as_deref())
        }
        Commands::Version => {
            println!("msetools {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
