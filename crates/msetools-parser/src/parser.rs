//! Push-based element list parser.

use std::fmt;

use bytes::{Buf, BytesMut};

use crate::client::{ElementHeader, ParserClient, ParserStatus};
use crate::{Error, Result};

/// A list element that has been started but not yet closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry<Id> {
    /// List element identifier.
    pub id: Id,
    /// Absolute offset of the list header.
    pub start_position: u64,
    /// Header plus payload length.
    pub size: u64,
    /// Payload bytes not yet accounted for by completed children.
    pub bytes_left: u64,
}

/// Incremental parser for nested, length-prefixed elements.
///
/// Bytes are pushed in with [`append`](Self::append) in chunks of any size.
/// Leaf elements are handed to the client only once their whole payload is
/// buffered; list elements are reported as soon as their header is parsed
/// and closed once their declared size has been consumed.
#[derive(Debug)]
pub struct ElementListParser<Id> {
    buffer: BytesMut,
    list_stack: Vec<ListEntry<Id>>,
    byte_position: u64,
}

impl<Id> Default for ElementListParser<Id> {
    fn default() -> Self {
        Self {
            buffer: BytesMut::new(),
            list_stack: Vec::new(),
            byte_position: 0,
        }
    }
}

impl<Id: Clone + fmt::Display> ElementListParser<Id> {
    /// Create a parser positioned at offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop buffered bytes and open lists, and restart counting at `position`.
    pub fn reset(&mut self, position: u64) {
        self.buffer.clear();
        self.list_stack.clear();
        self.byte_position = position;
    }

    /// Absolute offset of the first byte not yet consumed.
    pub fn position(&self) -> u64 {
        self.byte_position
    }

    /// Number of currently open lists.
    pub fn depth(&self) -> usize {
        self.list_stack.len()
    }

    /// Bytes held back waiting for the rest of an element.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Open lists, outermost first.
    pub fn open_lists(&self) -> &[ListEntry<Id>] {
        &self.list_stack
    }

    /// Append `data` and parse as many complete elements as possible.
    ///
    /// Returns `ParserStatus::Ok` only when every byte has been consumed and
    /// no list is left open. After an error the parser state is unspecified
    /// until [`reset`](Self::reset) is called.
    pub fn append<C>(&mut self, client: &mut C, data: &[u8]) -> Result<ParserStatus>
    where
        C: ParserClient<Id = Id>,
    {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.extend_from_slice(data);

        let (consumed, status) = self.parse_buffer(client, &buffer)?;
        buffer.advance(consumed);
        self.buffer = buffer;

        if status == ParserStatus::Ok && (!self.list_stack.is_empty() || !self.buffer.is_empty())
        {
            return Ok(ParserStatus::NeedMoreData);
        }
        Ok(status)
    }

    fn parse_buffer<C>(&mut self, client: &mut C, buf: &[u8]) -> Result<(usize, ParserStatus)>
    where
        C: ParserClient<Id = Id>,
    {
        let mut i = 0;
        while i < buf.len() {
            let window = &buf[i..];
            let Some(header) = client.decode_header(window)? else {
                return Ok((i, ParserStatus::NeedMoreData));
            };

            if client.is_container(&header.id) {
                let start = self.start_list(client, header)?;
                i += start.header_len;
                if start.status == ParserStatus::NeedMoreData {
                    return Ok((i, ParserStatus::NeedMoreData));
                }
                continue;
            }

            let Some(whole_size) = header.whole_size() else {
                return Err(Error::UnknownSizeLeaf {
                    id: header.id.to_string(),
                    position: self.byte_position,
                });
            };
            self.check_fits(whole_size)?;

            if (window.len() as u64) < whole_size {
                return Ok((i, ParserStatus::NeedMoreData));
            }

            // Bounded by window.len() above.
            let whole_size = whole_size as usize;
            client.on_leaf(&header.id, &window[header.bytes_used..whole_size])?;

            i += whole_size;
            self.byte_position += whole_size as u64;
            self.handle_list_end(client, whole_size as u64)?;
        }

        Ok((i, ParserStatus::Ok))
    }

    fn start_list<C>(&mut self, client: &mut C, header: ElementHeader<Id>) -> Result<ListStart>
    where
        C: ParserClient<Id = Id>,
    {
        let element_position = self.byte_position;
        let Some(payload_size) = header.size.known() else {
            return Err(Error::UnknownSizeList {
                id: header.id.to_string(),
                position: element_position,
            });
        };
        let whole_size = header.bytes_used as u64 + payload_size;
        self.check_fits(whole_size)?;

        let body_position = element_position + header.bytes_used as u64;
        let status = client.on_container_start(&header.id, element_position, body_position)?;

        tracing::trace!(
            id = %header.id,
            position = element_position,
            size = whole_size,
            depth = self.list_stack.len(),
            "list start"
        );

        self.list_stack.push(ListEntry {
            id: header.id,
            start_position: element_position,
            size: whole_size,
            bytes_left: payload_size,
        });
        self.byte_position = body_position;

        if payload_size == 0 {
            self.handle_list_end(client, 0)?;
        }

        Ok(ListStart {
            header_len: header.bytes_used,
            status,
        })
    }

    /// Reject an element that cannot fit in what is left of the innermost list.
    fn check_fits(&self, whole_size: u64) -> Result<()> {
        match self.list_stack.last() {
            Some(list) if whole_size > list.bytes_left => Err(Error::ListOverrun {
                id: list.id.to_string(),
                position: list.start_position,
                overrun: whole_size - list.bytes_left,
            }),
            _ => Ok(()),
        }
    }

    /// Charge `bytes_used` against the innermost list and close every list
    /// that becomes complete, cascading outwards.
    fn handle_list_end<C>(&mut self, client: &mut C, bytes_used: u64) -> Result<()>
    where
        C: ParserClient<Id = Id>,
    {
        let mut consumed = bytes_used;
        while let Some(list) = self.list_stack.last_mut() {
            let Some(left) = list.bytes_left.checked_sub(consumed) else {
                return Err(Error::ListOverrun {
                    id: list.id.to_string(),
                    position: list.start_position,
                    overrun: consumed - list.bytes_left,
                });
            };
            list.bytes_left = left;
            if left > 0 {
                break;
            }

            let size = self.byte_position - list.start_position;
            client.on_container_end(&list.id, size)?;
            tracing::trace!(id = %list.id, size, "list end");

            consumed = list.size;
            self.list_stack.pop();
        }
        Ok(())
    }
}

struct ListStart {
    header_len: usize,
    status: ParserStatus,
}
