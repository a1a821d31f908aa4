use crate::replacement::VictimSelector;

/// A physical frame and the page currently loaded into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub index: usize,
    pub occupant: Option<u64>,
}

impl Frame {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.occupant {
            Some(page) => write!(f, "Frame {} (Page {})", self.index, page),
            None => write!(f, "Frame {} (Empty)", self.index),
        }
    }
}

/// Fixed-size pool of physical frames
#[derive(Debug, Clone)]
pub struct FramePool {
    frames: Vec<Frame>,
}

impl FramePool {
    /// Create a pool of empty frames
    pub fn new(count: usize) -> Self {
        let frames = (0..count)
            .map(|index| Frame {
                index,
                occupant: None,
            })
            .collect();
        FramePool { frames }
    }

    pub fn first_free(&self) -> Option<usize> {
        self.frames.iter().position(Frame::is_free)
    }

    pub fn occupant(&self, frame: usize) -> Option<u64> {
        self.frames.get(frame).and_then(|f| f.occupant)
    }

    /// Load `page` into `frame`, returning the page it replaced
    ///
    /// # Panics
    /// Panics if `frame` is outside the pool.
    pub(crate) fn load(&mut self, frame: usize, page: u64) -> Option<u64> {
        self.frames[frame].occupant.replace(page)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn free_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_free()).count()
    }
}

/// Where a faulting page is going to land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Free(usize),
    Evict { frame: usize, victim: u64 },
}

impl Allocation {
    #[inline]
    pub fn frame(&self) -> usize {
        match *self {
            Allocation::Free(frame) => frame,
            Allocation::Evict { frame, .. } => frame,
        }
    }

    #[inline]
    pub fn victim(&self) -> Option<u64> {
        match *self {
            Allocation::Free(_) => None,
            Allocation::Evict { victim, .. } => Some(victim),
        }
    }
}

/// Picks frames for faulting pages: empty frames first, then whatever the
/// victim selector chooses
pub struct FrameAllocator<V: VictimSelector> {
    selector: V,
}

impl<V: VictimSelector> FrameAllocator<V> {
    pub fn new(selector: V) -> Self {
        FrameAllocator { selector }
    }

    /// Returns `None` only when the pool has no frames at all
    pub fn allocate(&mut self, pool: &FramePool) -> Option<Allocation> {
        if let Some(frame) = pool.first_free() {
            return Some(Allocation::Free(frame));
        }
        if pool.is_empty() {
            return None;
        }

        let frame = self.selector.pick_victim(pool.len()) % pool.len();
        Some(match pool.occupant(frame) {
            Some(victim) => Allocation::Evict { frame, victim },
            None => Allocation::Free(frame),
        })
    }

    pub fn selector(&self) -> &V {
        &self.selector
    }
}

/// A page stored on the simulated disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    pub page: u64,
    pub payload: String,
}

/// Read-only backing store for pages that are not resident
#[derive(Debug, Clone, Default)]
pub struct DiskStore {
    entries: Vec<DiskEntry>,
}

impl DiskStore {
    pub fn new(entries: Vec<DiskEntry>) -> Self {
        DiskStore { entries }
    }

    /// Disk holding the given pages with their default payload
    pub fn with_pages<I: IntoIterator<Item = u64>>(pages: I) -> Self {
        let entries = pages
            .into_iter()
            .map(|page| DiskEntry {
                page,
                payload: format!("Page {} Data", page),
            })
            .collect();
        DiskStore { entries }
    }

    pub fn find(&self, page: u64) -> Option<&DiskEntry> {
        self.entries.iter().find(|entry| entry.page == page)
    }

    pub fn pages(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.page)
    }

    pub fn entries(&self) -> &[DiskEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
