// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw display list encoding.
//!
//! A compiled list is a stream of 32-bit [`Node`] cells. Each instruction
//! starts with a header cell (opcode and size) followed by its operands.
//! Streams are stored in fixed-size blocks linked by `CONTINUE`
//! instructions; variable-length buffers live in a per-list [`Payloads`]
//! table and are referenced by index.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::exhaustive_enums,
    reason = "Deferred"
)]

mod batch;
mod block;
pub mod codec;
mod command;
mod disasm;
pub mod gl;
mod node;
mod opcode;
mod payload;
pub mod stream;

pub use batch::{VertexBatch, VERTEX_BATCH_CELLS};
pub use block::{AllocError, BlockChain, Cursor, BLOCK_SIZE, CONTINUE_SIZE, MAX_INSTRUCTION_SIZE};
pub use codec::{decode, encode, DecodeError, Instruction};
pub use command::{material_param_count, Command};
pub use disasm::disassemble;
pub use node::{join_f64, join_i64, join_u64, split_f64, split_i64, split_u64, Node};
pub use opcode::Opcode;
pub use payload::{Payload, Payloads, NO_PAYLOAD};
pub use stream::{read_instruction, Instructions, RawInstruction, Segments};
