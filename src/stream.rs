//! Feeding a reader through an element parser in fixed-size chunks.

use std::io::{ErrorKind, Read};

use anyhow::{Context, Result};
use msetools_parser::{ElementListParser, ParserClient};

/// Parse everything `reader` yields, `chunk_size` bytes at a time.
///
/// `after_chunk` runs after every append, including the one that failed,
/// so callers can flush output produced up to the error. Returns the number
/// of bytes read. Ending inside an element is an error.
pub fn parse_reader<C, R, F>(
    client: &mut C,
    mut reader: R,
    chunk_size: usize,
    mut after_chunk: F,
) -> Result<u64>
where
    C: ParserClient,
    R: Read,
    F: FnMut(&mut C) -> Result<()>,
{
    anyhow::ensure!(chunk_size > 0, "Chunk size must be greater than 0");

    let mut parser = ElementListParser::new();
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        let result = parser.append(client, &buf[..n]);
        after_chunk(client)?;
        let status = result.with_context(|| format!("Parse error before offset {}", total + n as u64))?;
        tracing::trace!(offset = total, len = n, ?status, "chunk parsed");
        total += n as u64;
    }

    if let Some(list) = parser.open_lists().last() {
        anyhow::bail!(
            "Stream ended inside {} (offset {}) with {} bytes of its body missing",
            list.id,
            list.start_position,
            list.bytes_left
        );
    }
    if parser.pending_bytes() > 0 {
        anyhow::bail!(
            "Stream ended with {} bytes of an incomplete element at offset {}",
            parser.pending_bytes(),
            parser.position()
        );
    }

    Ok(total)
}
