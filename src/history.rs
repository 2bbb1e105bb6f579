// history.rs

/// Number of command lines the shell remembers.
pub const HISTORY_CAPACITY: usize = 10;

/// Longest command line (in bytes, terminator included) the history stores.
pub const MAX_LINE: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: u64,
    pub text: String,
}

/// Fixed-capacity log of command lines, addressed by a sequence id.
///
/// Slots form a ring: `oldest` is the physical index of the oldest resident
/// entry and `len` counts resident entries. Once the ring is full every
/// `append` overwrites the oldest slot and advances `oldest`, so physical
/// order starting at `oldest` is always id order.
pub struct History<const N: usize = HISTORY_CAPACITY> {
    slots: [Option<HistoryEntry>; N],
    oldest: usize,
    len: usize,
    next_id: u64,
}

impl<const N: usize> History<N> {
    const NONZERO: () = assert!(N > 0, "history capacity must be non-zero");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONZERO;
        Self {
            slots: std::array::from_fn(|_| None),
            oldest: 0,
            len: 0,
            next_id: 1,
        }
    }

    /// Records `text` under the next id and returns that id.
    ///
    /// Text longer than `MAX_LINE - 1` bytes is cut at the nearest character
    /// boundary below the limit.
    pub fn append(&mut self, text: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let entry = HistoryEntry {
            id,
            text: truncate_line(text).to_string(),
        };
        if self.len < N {
            self.slots[(self.oldest + self.len) % N] = Some(entry);
            self.len += 1;
        } else {
            self.slots[self.oldest] = Some(entry);
            self.oldest = (self.oldest + 1) % N;
        }
        id
    }

    /// Resident entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        (0..self.len).filter_map(move |i| self.slots[(self.oldest + i) % N].as_ref())
    }

    /// Snapshot of the resident entries, oldest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.iter().cloned().collect()
    }

    pub fn find(&self, id: u64) -> Option<&str> {
        self.iter().find(|e| e.id == id).map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Id the next `append` will hand out.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

impl<const N: usize> Default for History<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cuts `text` to at most `MAX_LINE - 1` bytes on a character boundary.
pub fn truncate_line(text: &str) -> &str {
    let limit = MAX_LINE - 1;
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
