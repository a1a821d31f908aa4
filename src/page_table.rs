/// One page-table row. An entry is valid exactly when it holds a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    page: u64,
    frame: Option<usize>,
}

impl PageTableEntry {
    pub fn invalid(page: u64) -> Self {
        PageTableEntry { page, frame: None }
    }

    pub fn mapped(page: u64, frame: usize) -> Self {
        PageTableEntry {
            page,
            frame: Some(frame),
        }
    }

    #[inline]
    pub fn page(&self) -> u64 {
        self.page
    }

    #[inline]
    pub fn frame(&self) -> Option<usize> {
        self.frame
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.frame.is_some()
    }
}

impl std::fmt::Display for PageTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.frame {
            Some(frame) => write!(f, "Page {} -> Frame {}", self.page, frame),
            None => write!(f, "Page {} -> Invalid", self.page),
        }
    }
}

/// Single-level page table, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a page without touching the table
    pub fn try_lookup(&self, page: u64) -> Option<&PageTableEntry> {
        self.entries.iter().find(|entry| entry.page == page)
    }

    /// Look up a page, inserting an invalid entry the first time it is seen
    pub fn lookup_or_create(&mut self, page: u64) -> &PageTableEntry {
        let idx = self.index_or_insert(page);
        &self.entries[idx]
    }

    pub fn invalidate(&mut self, page: u64) {
        let idx = self.index_or_insert(page);
        self.entries[idx].frame = None;
    }

    pub fn bind(&mut self, page: u64, frame: usize) {
        let idx = self.index_or_insert(page);
        self.entries[idx].frame = Some(frame);
    }

    /// Valid entries pointing at `frame`. More than one means some are stale.
    pub fn pages_mapped_to(&self, frame: usize) -> impl Iterator<Item = u64> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.frame == Some(frame))
            .map(|entry| entry.page)
    }

    pub fn entries(&self) -> &[PageTableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index_or_insert(&mut self, page: u64) -> usize {
        match self.entries.iter().position(|entry| entry.page == page) {
            Some(idx) => idx,
            None => {
                self.entries.push(PageTableEntry::invalid(page));
                self.entries.len() - 1
            }
        }
    }
}

impl FromIterator<PageTableEntry> for PageTable {
    fn from_iter<I: IntoIterator<Item = PageTableEntry>>(iter: I) -> Self {
        let mut table = PageTable::new();
        for entry in iter {
            match entry.frame {
                Some(frame) => table.bind(entry.page, frame),
                None => table.invalidate(entry.page),
            }
        }
        table
    }
}
