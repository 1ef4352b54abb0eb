use crate::table::{Table, TableKey};
use compact_str::{CompactString, CompactStringExt};

const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// FNV-1a over the raw bytes. Every heap string carries this hash.
pub fn hash_str(text: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in text.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A non-owning handle to a string owned by a [`StringHeap`].
///
/// Interning guarantees one handle per byte content, so handle equality is
/// string equality. The hash rides along so table probes never need the
/// heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringRef {
    index: u32,
    hash: u32,
}

impl StringRef {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }
}

impl TableKey for StringRef {
    fn key_hash(&self) -> u32 {
        self.hash
    }
}

/// Owns every string the compiler and machine allocate: literals, global
/// names and runtime concatenations. All storage is released when the heap
/// drops. The intern set maps byte content to the one canonical handle.
#[derive(Debug)]
pub struct StringHeap {
    strings: Vec<CompactString>,
    intern: Table<StringRef, ()>,
}

impl StringHeap {
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            intern: Table::new(),
        }
    }

    /// The canonical handle for `text`, allocating only if no string with
    /// the same bytes is live.
    pub fn intern(&mut self, text: &str) -> StringRef {
        let hash = hash_str(text);
        let strings = &self.strings;
        if let Some(existing) = self
            .intern
            .find_key(hash, |handle| strings[handle.index()].as_str() == text)
        {
            return existing;
        }

        let handle = StringRef {
            index: self.strings.len() as u32,
            hash,
        };
        self.strings.push(CompactString::from(text));
        self.intern.set(handle, ());
        handle
    }

    pub fn get(&self, handle: StringRef) -> &str {
        self.strings
            .get(handle.index())
            .expect("String handles are only created by the heap that resolves them.")
    }

    /// Builds the concatenation in a single buffer, then interns it.
    pub fn concatenate(&mut self, lhs: StringRef, rhs: StringRef) -> StringRef {
        let text: CompactString = [self.get(lhs), self.get(rhs)].concat_compact();
        self.intern(&text)
    }

    /// The number of distinct live strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringHeap {
    fn default() -> Self {
        Self::new()
    }
}
