//! Branch Target Buffer (BTB).
//!
//! A direct-mapped table of the last resolved target of each register-indirect
//! jump (`JR`, `JALR`). Fetch uses it to follow a jump whose target register
//! has not been read yet.

/// An entry in the Branch Target Buffer.
#[derive(Clone, Copy, Debug, Default)]
struct BtbEntry {
    /// Full address of the jump, used as the tag.
    tag: u64,
    /// The predicted target address.
    target: u64,
    /// Indicates if this entry contains valid data.
    valid: bool,
}

/// Branch Target Buffer structure.
#[derive(Clone, Debug)]
pub struct Btb {
    table: Vec<BtbEntry>,
}

impl Btb {
    /// Creates a BTB with `size` entries (a power of two).
    pub fn new(size: usize) -> Self {
        Self {
            table: vec![BtbEntry::default(); size.max(1)],
        }
    }

    /// Word-aligned PC masked to the table size.
    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) & (self.table.len() - 1)
    }

    /// The recorded target of the jump at `pc`, if its entry matches.
    pub fn lookup(&self, pc: u64) -> Option<u64> {
        let e = self.table[self.index(pc)];
        (e.valid && e.tag == pc).then_some(e.target)
    }

    /// Records `target` as the destination of the jump at `pc`, replacing
    /// whatever shared its slot.
    pub fn update(&mut self, pc: u64, target: u64) {
        let idx = self.index(pc);
        self.table[idx] = BtbEntry {
            tag: pc,
            target,
            valid: true,
        };
    }
}
