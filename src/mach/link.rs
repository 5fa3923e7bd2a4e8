use super::{Address, Opcode, Symbol};
use crate::error;
use crate::lang::{Error, LineNumber};
use std::collections::{BTreeMap, HashMap};

type Result<T> = std::result::Result<T, Error>;

/// ## Jump label resolution
///
/// Code generation emits jumps to symbols before their address is known.
/// `link` patches every recorded jump once all symbols are placed.

#[derive(Debug, Default)]
pub struct Link {
    current_symbol: Symbol,
    symbols: BTreeMap<Symbol, Address>,
    unlinked: HashMap<Address, (LineNumber, Symbol)>,
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    pub fn clear(&mut self) {
        self.current_symbol = 0;
        self.symbols.clear();
        self.unlinked.clear();
    }

    pub fn next_symbol(&mut self) -> Symbol {
        self.current_symbol += 1;
        self.current_symbol
    }

    pub fn insert(&mut self, sym: Symbol, addr: Address) {
        self.symbols.insert(sym, addr);
    }

    pub fn link_addr_to_symbol(&mut self, addr: Address, line: LineNumber, symbol: Symbol) {
        self.unlinked.insert(addr, (line, symbol));
    }

    pub fn link(&mut self, ops: &mut [Opcode]) -> Result<()> {
        let mut pending: Vec<_> = std::mem::take(&mut self.unlinked).into_iter().collect();
        pending.sort_by_key(|(addr, _)| *addr);
        for (op_addr, (line, symbol)) in pending {
            let dest = match self.symbols.get(&symbol) {
                Some(dest) => *dest,
                None => return Err(error!(InternalError, line; "UNDEFINED JUMP LABEL")),
            };
            let new_op = match ops.get(op_addr) {
                Some(Opcode::Jump(_)) => Opcode::Jump(dest),
                Some(Opcode::JumpIfFalse(_)) => Opcode::JumpIfFalse(dest),
                Some(Opcode::JumpIfTrue(_)) => Opcode::JumpIfTrue(dest),
                _ => return Err(error!(InternalError, line; "LINK FAILURE")),
            };
            ops[op_addr] = new_op;
        }
        Ok(())
    }
}
