// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::mem::size_of;

use crate::DecodeError;

/// Cell value used in place of a payload index when an optional buffer is
/// absent (for example `glTexImage2D` with a null pointer).
pub const NO_PAYLOAD: u32 = u32::MAX;

/// A variable-length buffer owned by a display list.
///
/// Instructions refer to payloads by their index in the list's [`Payloads`]
/// table; the buffer is released together with the list.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Bytes(Box<[u8]>),
    Floats(Box<[f32]>),
    Text(Box<str>),
}

impl Payload {
    /// Heap bytes held by this payload.
    pub fn heap_size(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.len(),
            Self::Floats(floats) => floats.len() * size_of::<f32>(),
            Self::Text(text) => text.len(),
        }
    }
}

/// The side table of buffers referenced by one display list.
#[derive(Clone, Debug, Default)]
pub struct Payloads {
    entries: Vec<Payload>,
}

impl Payloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index the next pushed payload will receive.
    pub fn next_index(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn push(&mut self, payload: Payload) -> u32 {
        let index = self.next_index();
        self.entries.push(payload);
        index
    }

    pub fn get(&self, index: u32) -> Option<&Payload> {
        self.entries.get(index as usize)
    }

    pub fn bytes(&self, index: u32) -> Result<&[u8], DecodeError> {
        match self.get(index) {
            Some(Payload::Bytes(bytes)) => Ok(bytes),
            Some(_) => Err(DecodeError::PayloadKind(index)),
            None => Err(DecodeError::MissingPayload(index)),
        }
    }

    pub fn floats(&self, index: u32) -> Result<&[f32], DecodeError> {
        match self.get(index) {
            Some(Payload::Floats(floats)) => Ok(floats),
            Some(_) => Err(DecodeError::PayloadKind(index)),
            None => Err(DecodeError::MissingPayload(index)),
        }
    }

    pub fn text(&self, index: u32) -> Result<&str, DecodeError> {
        match self.get(index) {
            Some(Payload::Text(text)) => Ok(text),
            Some(_) => Err(DecodeError::PayloadKind(index)),
            None => Err(DecodeError::MissingPayload(index)),
        }
    }

    /// Total heap bytes held by all payloads.
    pub fn heap_size(&self) -> usize {
        self.entries.iter().map(Payload::heap_size).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Payload> {
        self.entries.iter()
    }
}

impl Extend<Payload> for Payloads {
    fn extend<T: IntoIterator<Item = Payload>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
