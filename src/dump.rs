//! Element tree dump.
//!
//! Prints one line per element, indented by nesting depth:
//!
//! ```text
//! <EBMLHeader offset="0">
//!   <EBMLVersion size="1" value="1"/>
//! </EBMLHeader>
//! ```

use std::io::{Read, Write};
use std::marker::PhantomData;

use anyhow::Result;
use msetools_parser::{ElementHeader, ParserClient, ParserStatus};
use msetools_validator::ContainerFormat;

use crate::stream::parse_reader;

/// Parser client that renders elements as text lines.
pub struct DumpClient<F: ContainerFormat> {
    depth: usize,
    lines: Vec<String>,
    _format: PhantomData<F>,
}

impl<F: ContainerFormat> Default for DumpClient<F> {
    fn default() -> Self {
        Self {
            depth: 0,
            lines: Vec::new(),
            _format: PhantomData,
        }
    }
}

impl<F: ContainerFormat> DumpClient<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lines rendered so far.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    fn push(&mut self, line: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), line));
    }
}

impl<F: ContainerFormat> ParserClient for DumpClient<F> {
    type Id = F::Id;

    fn decode_header(&mut self, buf: &[u8]) -> msetools_parser::Result<Option<ElementHeader<F::Id>>> {
        F::decode_header(buf)
    }

    fn is_container(&self, id: &F::Id) -> bool {
        F::is_container(id)
    }

    fn on_container_start(
        &mut self,
        id: &F::Id,
        element_position: u64,
        _body_position: u64,
    ) -> msetools_parser::Result<ParserStatus> {
        self.push(format!("<{} offset=\"{}\">", id, element_position));
        self.depth += 1;
        Ok(ParserStatus::Ok)
    }

    fn on_container_end(&mut self, id: &F::Id, _size: u64) -> msetools_parser::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.push(format!("</{}>", id));
        Ok(())
    }

    fn on_leaf(&mut self, id: &F::Id, value: &[u8]) -> msetools_parser::Result<()> {
        let line = match F::describe_leaf(id, value) {
            Some(described) => format!(
                "<{} size=\"{}\" value=\"{}\"/>",
                id,
                value.len(),
                escape(&described)
            ),
            None => format!("<{} size=\"{}\"/>", id, value.len()),
        };
        self.push(line);
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

/// Dump every element of `reader` to `out`. Returns the bytes read.
///
/// Lines are written as each chunk is parsed, so a parse error still leaves
/// the elements before it in `out`.
pub fn dump<F, R, W>(reader: R, out: &mut W, chunk_size: usize) -> Result<u64>
where
    F: ContainerFormat,
    R: Read,
    W: Write,
{
    let mut client = DumpClient::<F>::new();
    let total = parse_reader(&mut client, reader, chunk_size, |client| {
        for line in client.take_lines() {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    })?;
    out.flush()?;
    tracing::debug!(format = F::NAME, bytes = total, "dump complete");
    Ok(total)
}
