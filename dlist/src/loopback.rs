// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Switching a list's vertex batches to loopback replay.

use std::collections::BTreeSet;

use dlist_encoding::{decode, Command, Cursor, Instructions, Opcode};

use crate::exec::translate_ids;
use crate::ListTable;

/// Retags every vertex list reachable from `root` as
/// [`Opcode::VertexListLoopback`], following `CALL_LIST` and `CALL_LISTS`
/// into other lists. Each list is visited once and missing lists are
/// skipped. Returns the number of instructions retagged.
pub(crate) fn rewrite(table: &mut ListTable, root: u32, list_base: u32) -> usize {
    let mut pending = vec![root];
    let mut visited = BTreeSet::new();
    let mut retagged = 0;
    while let Some(name) = pending.pop() {
        if !visited.insert(name) {
            continue;
        }
        let headers = scan(table, name, list_base, &mut pending);
        for cursor in headers {
            if let Some(cell) = table.cell_mut(name, cursor) {
                cell.set_opcode(Opcode::VertexListLoopback as u16);
                retagged += 1;
            }
        }
    }
    retagged
}

/// Finds the vertex lists of list `name` that still need retagging and
/// queues the lists it calls.
fn scan(table: &ListTable, name: u32, list_base: u32, pending: &mut Vec<u32>) -> Vec<Cursor> {
    let Some(list) = table.get(name) else {
        return Vec::new();
    };
    let (cells, head) = table.cells(list);
    let mut headers = Vec::new();
    for inst in Instructions::new(&cells, head) {
        let inst = match inst {
            Ok(inst) => inst,
            Err(err) => {
                log::error!("list {name}: {err}");
                break;
            }
        };
        match inst.opcode {
            Opcode::VertexList | Opcode::VertexListCopyCurrent => headers.push(inst.cursor),
            Opcode::CallList | Opcode::CallLists => {
                match decode(inst.opcode, inst.operands, list.payloads()) {
                    Ok(Command::CallList(target)) => pending.push(target),
                    Ok(Command::CallLists { ty, lists, .. }) => pending.extend(
                        translate_ids(ty, &lists)
                            .into_iter()
                            .map(|id| id.wrapping_add(list_base)),
                    ),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use dlist_encoding::{
        encode, gl, read_instruction, BlockChain, Instruction, Payloads, VertexBatch,
    };

    use super::*;
    use crate::store::DisplayList;

    fn install(table: &mut ListTable, name: u32, insts: Vec<Instruction>) {
        let mut chain = BlockChain::new(usize::MAX).unwrap();
        let mut payloads = Payloads::new();
        for inst in insts {
            inst.commit(&mut chain, &mut payloads).unwrap();
        }
        chain.seal();
        table.install(DisplayList::from_chain(name, chain, payloads), true);
    }

    fn vertex_list() -> Instruction {
        Instruction::vertex_list(
            Opcode::VertexList,
            &VertexBatch {
                vertex_count: 3,
                prim_count: 1,
                ..VertexBatch::default()
            },
        )
    }

    fn opcodes(table: &ListTable, name: u32) -> Vec<Opcode> {
        let list = table.get(name).unwrap();
        let (cells, head) = table.cells(list);
        Instructions::new(&cells, head)
            .map(|inst| inst.unwrap().opcode)
            .filter(|op| op.is_vertex_list())
            .collect()
    }

    #[test]
    fn follows_calls() {
        let mut table = ListTable::new();
        install(&mut table, 1, vec![vertex_list(), encode(&Command::CallList(2), 0)]);
        // List 3 is reached through glCallLists with a base of 2.
        install(
            &mut table,
            2,
            vec![
                vertex_list(),
                encode(
                    &Command::CallLists {
                        n: 1,
                        ty: gl::UNSIGNED_BYTE,
                        lists: Cow::Borrowed(&[1]),
                    },
                    0,
                ),
            ],
        );
        install(&mut table, 3, vec![vertex_list()]);
        install(&mut table, 4, vec![vertex_list()]);

        assert_eq!(rewrite(&mut table, 1, 2), 3);
        for name in 1..=3 {
            assert_eq!(opcodes(&table, name), [Opcode::VertexListLoopback]);
        }
        assert_eq!(opcodes(&table, 4), [Opcode::VertexList]);
    }

    #[test]
    fn cycles_and_missing_lists() {
        let mut table = ListTable::new();
        install(
            &mut table,
            1,
            vec![
                encode(&Command::CallList(1), 0),
                encode(&Command::CallList(99), 0),
                vertex_list(),
            ],
        );
        assert_eq!(rewrite(&mut table, 1, 0), 1);
        // Already retagged instructions are left alone.
        assert_eq!(rewrite(&mut table, 1, 0), 0);
        let list = table.get(1).unwrap();
        let (cells, head) = table.cells(list);
        assert_eq!(read_instruction(&cells, head).unwrap().opcode, Opcode::CallList);
    }
}
