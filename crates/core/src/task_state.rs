// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task payload codec.
//!
//! A task node's value is a single opaque blob carrying both the task state
//! and the identity of whoever wrote it: `tag byte, separator byte, writer
//! identity as UTF-8`. State classification reads only the tag, so racing
//! observers never need to parse the writer suffix to decide what happened.

use crate::server::ServerName;
use thiserror::Error;

/// Byte between the state tag and the writer identity.
const TAG_SEPARATOR: u8 = b' ';

/// State tag carried in the first payload byte. Tag values are part of the
/// wire format and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Published by the manager; up for grabs.
    Unassigned,
    /// A worker is running the split.
    Owned,
    /// The split succeeded; awaiting the finisher and node deletion.
    Done,
    /// The split failed terminally for the writing worker.
    Err,
    /// The worker gave up voluntarily; reassign later.
    Resigned,
}

impl TaskState {
    pub fn tag(self) -> u8 {
        match self {
            TaskState::Unassigned => 0x00,
            TaskState::Owned => 0x01,
            TaskState::Done => 0x02,
            TaskState::Err => 0x03,
            TaskState::Resigned => 0x04,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(TaskState::Unassigned),
            0x01 => Some(TaskState::Owned),
            0x02 => Some(TaskState::Done),
            0x03 => Some(TaskState::Err),
            0x04 => Some(TaskState::Resigned),
            _ => None,
        }
    }
}

/// Decoded task node value: state plus the producer of the most recent
/// transition (the manager for `Unassigned`, a worker for the rest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPayload {
    pub state: TaskState,
    pub writer: ServerName,
}

impl TaskPayload {
    pub fn new(state: TaskState, writer: impl Into<ServerName>) -> Self {
        Self { state, writer: writer.into() }
    }

    pub fn unassigned(writer: impl Into<ServerName>) -> Self {
        Self::new(TaskState::Unassigned, writer)
    }

    pub fn owned(writer: impl Into<ServerName>) -> Self {
        Self::new(TaskState::Owned, writer)
    }

    pub fn done(writer: impl Into<ServerName>) -> Self {
        Self::new(TaskState::Done, writer)
    }

    pub fn err(writer: impl Into<ServerName>) -> Self {
        Self::new(TaskState::Err, writer)
    }

    pub fn resigned(writer: impl Into<ServerName>) -> Self {
        Self::new(TaskState::Resigned, writer)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let writer = self.writer.as_str().as_bytes();
        let mut buf = Vec::with_capacity(2 + writer.len());
        buf.push(self.state.tag());
        buf.push(TAG_SEPARATOR);
        buf.extend_from_slice(writer);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PayloadDecodeError> {
        let (&tag, rest) = data.split_first().ok_or(PayloadDecodeError::Empty)?;
        let state = TaskState::from_tag(tag).ok_or(PayloadDecodeError::UnknownTag(tag))?;
        let (&sep, writer) = rest.split_first().ok_or(PayloadDecodeError::MissingSeparator)?;
        if sep != TAG_SEPARATOR {
            return Err(PayloadDecodeError::MissingSeparator);
        }
        let writer =
            std::str::from_utf8(writer).map_err(|_| PayloadDecodeError::WriterNotUtf8)?;
        Ok(Self { state, writer: ServerName::new(writer) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadDecodeError {
    #[error("empty task payload")]
    Empty,
    #[error("unknown task state tag {0:#04x}")]
    UnknownTag(u8),
    #[error("task payload missing separator")]
    MissingSeparator,
    #[error("task payload writer is not utf-8")]
    WriterNotUtf8,
}

#[cfg(test)]
#[path = "task_state_tests.rs"]
mod tests;
