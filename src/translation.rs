use log::{debug, info, warn};

use crate::address::{PageSize, VirtualAddress};
use crate::error::TranslateError;
use crate::memory::{Allocation, DiskStore, FrameAllocator, FramePool};
use crate::page_table::PageTable;
use crate::replacement::{RandomVictim, VictimSelector};

/// What happens to the evicted page's table entry when its frame is reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictedMapping {
    /// Leave the entry valid. It keeps pointing at a frame that now holds
    /// another page.
    #[default]
    Retain,
    /// Invalidate the entry so the evicted page faults on its next access.
    Invalidate,
}

/// How a page fault was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultResolution {
    pub page: u64,
    pub allocation: Allocation,
    pub payload: String,
}

impl FaultResolution {
    #[inline]
    pub fn frame(&self) -> usize {
        self.allocation.frame()
    }
}

/// Outcome of a successful translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub address: VirtualAddress,
    pub frame: usize,
    pub physical_address: u64,
    pub fault: Option<FaultResolution>,
}

impl TranslationResult {
    #[inline]
    pub fn page_number(&self) -> u64 {
        self.address.page
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.address.offset
    }

    #[inline]
    pub fn faulted(&self) -> bool {
        self.fault.is_some()
    }
}

/// PA = frame * page_size + offset
pub fn physical_address(
    frame: usize,
    page_size: PageSize,
    offset: u64,
) -> Result<u64, TranslateError> {
    (frame as u64)
        .checked_mul(page_size.bytes())
        .and_then(|base| base.checked_add(offset))
        .ok_or(TranslateError::AddressOverflow {
            frame,
            page_size: page_size.bytes(),
            offset,
        })
}

/// Owns the page table, frame pool and disk of one simulated address space
/// and resolves translations against them one at a time.
pub struct Translator<V: VictimSelector = RandomVictim> {
    page_table: PageTable,
    frames: FramePool,
    disk: DiskStore,
    allocator: FrameAllocator<V>,
    evicted_mapping: EvictedMapping,
}

impl<V: VictimSelector> Translator<V> {
    pub fn new(page_table: PageTable, frames: FramePool, disk: DiskStore, selector: V) -> Self {
        Translator {
            page_table,
            frames,
            disk,
            allocator: FrameAllocator::new(selector),
            evicted_mapping: EvictedMapping::default(),
        }
    }

    pub fn with_evicted_mapping(mut self, evicted_mapping: EvictedMapping) -> Self {
        self.evicted_mapping = evicted_mapping;
        self
    }

    /// Translate an address string (decimal or `0x` hex) for the given page size
    ///
    /// With `force_fault`, the page is treated as not resident and is reloaded
    /// from disk. A failed translation leaves the table and frames unchanged.
    pub fn translate(
        &mut self,
        input: &str,
        page_size: u64,
        force_fault: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let page_size = PageSize::new(page_size)?;
        let address = VirtualAddress::parse(input, page_size)?;
        debug!("{} with {} pages: binary {}", address, page_size, address.binary());
        self.translate_address(address, force_fault)
    }

    /// Translate an address that has already been split
    pub fn translate_address(
        &mut self,
        address: VirtualAddress,
        force_fault: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let page = address.page;

        let resident = if force_fault {
            debug!("forcing fault on page {}", page);
            None
        } else {
            self.page_table.try_lookup(page).and_then(|e| e.frame())
        };

        if let Some(frame) = resident {
            debug!("page {} found in frame {}", page, frame);
            return Ok(TranslationResult {
                address,
                frame,
                physical_address: physical_address(frame, address.page_size, address.offset)?,
                fault: None,
            });
        }

        info!("page fault on page {}", page);
        let (allocation, payload) = self.plan_fault(page)?;
        // Nothing is mutated until the fault is known to succeed
        let physical_address =
            physical_address(allocation.frame(), address.page_size, address.offset)?;
        let resolution = self.commit(page, allocation, payload);

        Ok(TranslationResult {
            address,
            frame: resolution.frame(),
            physical_address,
            fault: Some(resolution),
        })
    }

    /// Bring `page` in from disk, regardless of its current mapping
    pub fn resolve_fault(&mut self, page: u64) -> Result<FaultResolution, TranslateError> {
        let (allocation, payload) = self.plan_fault(page)?;
        Ok(self.commit(page, allocation, payload))
    }

    /// The page-fault walkthrough: mark `page` invalid, then resolve it.
    /// Unseen pages get an invalid entry even if the fault cannot be resolved.
    pub fn demonstrate_fault(&mut self, page: u64) -> Result<FaultResolution, TranslateError> {
        self.page_table.invalidate(page);
        self.resolve_fault(page)
    }

    /// Translate addresses in order; table and frame state carry over
    pub fn translate_batch<S: AsRef<str>>(
        &mut self,
        inputs: &[S],
        page_size: u64,
    ) -> Vec<Result<TranslationResult, TranslateError>> {
        inputs
            .iter()
            .map(|input| self.translate(input.as_ref(), page_size, false))
            .collect()
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn frames(&self) -> &FramePool {
        &self.frames
    }

    pub fn disk(&self) -> &DiskStore {
        &self.disk
    }

    pub fn evicted_mapping(&self) -> EvictedMapping {
        self.evicted_mapping
    }

    /// Disk check and frame choice. Nothing is mutated here apart from the
    /// victim selector's own state.
    fn plan_fault(&mut self, page: u64) -> Result<(Allocation, String), TranslateError> {
        let payload = match self.disk.find(page) {
            Some(entry) => entry.payload.clone(),
            None => {
                warn!("page {} not found on disk: segmentation fault", page);
                return Err(TranslateError::SegFault { page });
            }
        };

        let allocation = self
            .allocator
            .allocate(&self.frames)
            .ok_or(TranslateError::NoFrames)?;
        Ok((allocation, payload))
    }

    fn commit(&mut self, page: u64, allocation: Allocation, payload: String) -> FaultResolution {
        let frame = allocation.frame();

        match allocation {
            Allocation::Free(_) => info!("loading page {} into free frame {}", page, frame),
            Allocation::Evict { victim, .. } => {
                warn!("all frames occupied: evicting page {} from frame {}", victim, frame);
                let victim_still_mapped = self
                    .page_table
                    .try_lookup(victim)
                    .is_some_and(|entry| entry.frame() == Some(frame));
                if self.evicted_mapping == EvictedMapping::Invalidate
                    && victim != page
                    && victim_still_mapped
                {
                    self.page_table.invalidate(victim);
                }
            }
        }

        self.frames.load(frame, page);
        self.page_table.bind(page, frame);

        FaultResolution {
            page,
            allocation,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::InitData;
    use crate::page_table::PageTableEntry;
    use crate::replacement::ScriptedVictim;

    fn reference(picks: &[usize]) -> Translator<ScriptedVictim> {
        InitData::reference().build_translator(ScriptedVictim::new(picks.iter().copied()))
    }

    /// Reference config with the two empty frames (2 and 6) filled by pages 2 and 5
    fn reference_full(picks: &[usize]) -> Translator<ScriptedVictim> {
        let mut translator = reference(picks);
        translator.resolve_fault(2).unwrap();
        translator.resolve_fault(5).unwrap();
        assert_eq!(translator.frames().free_count(), 0);
        translator
    }

    // =========================================================================
    // Physical address arithmetic
    // =========================================================================

    #[test]
    fn test_physical_address_formula() {
        let size = PageSize::new(4096).unwrap();
        assert_eq!(physical_address(7, size, 564), Ok(29236));
        assert_eq!(physical_address(0, size, 0), Ok(0));
    }

    #[test]
    fn test_physical_address_overflow() {
        let size = PageSize::new(1 << 63).unwrap();
        assert_eq!(
            physical_address(3, size, 0),
            Err(TranslateError::AddressOverflow {
                frame: 3,
                page_size: 1 << 63,
                offset: 0
            })
        );
    }

    // =========================================================================
    // Hits
    // =========================================================================

    #[test]
    fn test_translate_hit_reference_example() {
        let mut translator = reference(&[]);
        let result = translator.translate("0x1234", 4096, false).unwrap();

        assert_eq!(result.page_number(), 1);
        assert_eq!(result.offset(), 564);
        assert_eq!(result.frame, 7);
        assert_eq!(result.physical_address, 29236);
        assert_eq!(result.physical_address, 0x7234);
        assert!(!result.faulted());
    }

    #[test]
    fn test_translate_hit_decimal_input() {
        let mut translator = reference(&[]);
        // page 6 -> frame 0, small pages
        let result = translator.translate("100", 16, false).unwrap();
        assert_eq!(result.page_number(), 6);
        assert_eq!(result.offset(), 4);
        assert_eq!(result.physical_address, 4);
    }

    // =========================================================================
    // Faults
    // =========================================================================

    #[test]
    fn test_translate_fault_loads_into_first_free_frame() {
        let mut translator = reference(&[]);
        let result = translator.translate("0x2010", 4096, false).unwrap();

        let fault = result.fault.as_ref().unwrap();
        assert_eq!(fault.allocation, Allocation::Free(2));
        assert_eq!(fault.payload, "Page 2 Data");
        assert_eq!(result.physical_address, 2 * 4096 + 0x10);
        assert_eq!(
            translator.page_table().try_lookup(2),
            Some(&PageTableEntry::mapped(2, 2))
        );
        assert_eq!(translator.frames().occupant(2), Some(2));

        let again = translator.translate("0x2010", 4096, false).unwrap();
        assert!(!again.faulted());
        assert_eq!(again.physical_address, result.physical_address);
    }

    #[test]
    fn test_translate_unseen_page_on_disk() {
        let mut translator = reference(&[]);
        let before = translator.page_table().len();

        let result = translator.translate("0x9000", 4096, false).unwrap();
        assert!(result.faulted());
        assert_eq!(result.frame, 2);
        assert_eq!(translator.page_table().len(), before + 1);
        assert_eq!(
            translator.page_table().try_lookup(9),
            Some(&PageTableEntry::mapped(9, 2))
        );
    }

    #[test]
    fn test_forced_fault_rebinds_page() {
        // page 3 -> frame 1, with a disk copy of page 3
        let mut init = InitData::reference();
        init.disk_pages.push(3);
        let mut translator = init.build_translator(ScriptedVictim::default());

        let result = translator.translate("0x3004", 4096, true).unwrap();
        assert!(result.faulted());
        assert_eq!(result.frame, 2);
        assert_eq!(result.physical_address, 2 * 4096 + 4);
        // Frame 1 still names page 3 as occupant
        assert_eq!(translator.frames().occupant(1), Some(3));

        let again = translator.translate("0x3004", 4096, false).unwrap();
        assert!(!again.faulted());
    }

    #[test]
    fn test_forced_fault_without_disk_copy() {
        let mut translator = reference(&[]);
        assert_eq!(
            translator.translate("0x3004", 4096, true),
            Err(TranslateError::SegFault { page: 3 })
        );
        // The failed request keeps the existing mapping
        assert_eq!(
            translator.page_table().try_lookup(3),
            Some(&PageTableEntry::mapped(3, 1))
        );
        assert!(!translator.translate("0x3004", 4096, false).unwrap().faulted());
    }

    #[test]
    fn test_forced_fault_on_unseen_page_creates_nothing() {
        let mut translator = reference(&[]);
        let before = translator.page_table().len();
        assert_eq!(
            translator.translate("0xF000", 4096, true),
            Err(TranslateError::SegFault { page: 15 })
        );
        assert_eq!(translator.page_table().len(), before);
    }

    #[test]
    fn test_segfault_leaves_state_unchanged() {
        let mut translator = reference(&[]);
        let table_before = translator.page_table().entries().to_vec();
        let frames_before = translator.frames().frames().to_vec();

        assert_eq!(
            translator.translate("0xA000", 4096, false),
            Err(TranslateError::SegFault { page: 10 })
        );
        assert_eq!(translator.page_table().entries(), table_before.as_slice());
        assert_eq!(translator.frames().frames(), frames_before.as_slice());

        // Later requests still work
        assert!(translator.translate("0x1234", 4096, false).is_ok());
    }

    // =========================================================================
    // Eviction
    // =========================================================================

    #[test]
    fn test_eviction_keeps_stale_entry() {
        let mut translator = reference_full(&[7]);
        let result = translator.translate("0x8123", 4096, false).unwrap();

        let fault = result.fault.unwrap();
        assert_eq!(fault.allocation, Allocation::Evict { frame: 7, victim: 1 });
        assert_eq!(result.physical_address, 7 * 4096 + 0x123);
        assert_eq!(translator.frames().occupant(7), Some(8));

        // Page 1 still claims frame 7
        assert_eq!(
            translator.page_table().try_lookup(1),
            Some(&PageTableEntry::mapped(1, 7))
        );
        let mapped: Vec<u64> = translator.page_table().pages_mapped_to(7).collect();
        assert_eq!(mapped, vec![1, 8]);

        // and keeps translating without a fault
        assert!(!translator.translate("0x1234", 4096, false).unwrap().faulted());
    }

    #[test]
    fn test_eviction_can_invalidate_victim() {
        let mut translator =
            reference_full(&[7]).with_evicted_mapping(EvictedMapping::Invalidate);
        translator.translate("0x8123", 4096, false).unwrap();

        assert_eq!(
            translator.page_table().try_lookup(1),
            Some(&PageTableEntry::invalid(1))
        );
        // Page 1 is not on disk, so touching it again is fatal
        assert_eq!(
            translator.translate("0x1234", 4096, false),
            Err(TranslateError::SegFault { page: 1 })
        );
    }

    #[test]
    fn test_invalidate_skips_victim_remapped_elsewhere() {
        let mut init = InitData::reference();
        init.disk_pages.extend([0, 1]);
        let mut translator = init
            .build_translator(ScriptedVictim::new([0, 3]))
            .with_evicted_mapping(EvictedMapping::Invalidate);
        translator.resolve_fault(2).unwrap();
        translator.resolve_fault(5).unwrap();

        // Page 0 moves from frame 3 to frame 0, leaving frame 3 naming page 0
        translator.resolve_fault(0).unwrap();
        assert_eq!(
            translator.page_table().try_lookup(0),
            Some(&PageTableEntry::mapped(0, 0))
        );

        // Evicting frame 3 must not touch page 0's live mapping
        let resolution = translator.resolve_fault(8).unwrap();
        assert_eq!(resolution.allocation, Allocation::Evict { frame: 3, victim: 0 });
        assert_eq!(
            translator.page_table().try_lookup(0),
            Some(&PageTableEntry::mapped(0, 0))
        );
    }

    #[test]
    fn test_no_frames() {
        let mut translator = Translator::new(
            PageTable::new(),
            FramePool::new(0),
            DiskStore::with_pages([0]),
            ScriptedVictim::default(),
        );
        assert_eq!(
            translator.translate("0", 4096, false),
            Err(TranslateError::NoFrames)
        );
        assert!(translator.page_table().is_empty());
    }

    // =========================================================================
    // Input errors
    // =========================================================================

    #[test]
    fn test_invalid_inputs_surface() {
        let mut translator = reference(&[]);
        assert_eq!(
            translator.translate("0x1234", 3000, false),
            Err(TranslateError::InvalidPageSize(3000))
        );
        assert_eq!(
            translator.translate("0x1234", 0, false),
            Err(TranslateError::InvalidPageSize(0))
        );
        assert_eq!(
            translator.translate("zz", 4096, false),
            Err(TranslateError::InvalidAddress {
                input: "zz".to_string()
            })
        );
        assert_eq!(translator.page_table().len(), 8);
    }

    #[test]
    fn test_overflow_does_not_mutate() {
        let mut translator = reference(&[]);
        // page 0 -> frame 3
        assert!(matches!(
            translator.translate("0", 1 << 63, false),
            Err(TranslateError::AddressOverflow { frame: 3, .. })
        ));

        // page 0 with huge pages faulting into frame 2 would also overflow
        let mut init = InitData::reference();
        init.page_table.retain(|&(page, _)| page != 0);
        init.disk_pages.push(0);
        let mut translator = init.build_translator(ScriptedVictim::default());
        assert!(matches!(
            translator.translate("1", 1 << 63, false),
            Err(TranslateError::AddressOverflow { frame: 2, .. })
        ));
        assert_eq!(translator.frames().occupant(2), None);
        assert_eq!(translator.page_table().try_lookup(0), None);
    }

    #[test]
    fn test_forced_fault_overflow_keeps_mapping() {
        let mut init = InitData::reference();
        init.disk_pages.push(0);
        let mut translator = init.build_translator(ScriptedVictim::default());

        // page 0 is resident in frame 3; the reload would land in frame 2
        assert!(matches!(
            translator.translate("0", 1 << 63, true),
            Err(TranslateError::AddressOverflow { frame: 2, .. })
        ));
        assert_eq!(
            translator.page_table().try_lookup(0),
            Some(&PageTableEntry::mapped(0, 3))
        );
        assert_eq!(translator.frames().occupant(2), None);
    }

    // =========================================================================
    // Demo and batch
    // =========================================================================

    #[test]
    fn test_demonstrate_fault() {
        let mut translator = reference(&[]);
        let resolution = translator.demonstrate_fault(2).unwrap();
        assert_eq!(resolution.page, 2);
        assert_eq!(resolution.frame(), 2);
        assert_eq!(resolution.payload, "Page 2 Data");

        // Unknown page: entry is created, resolution fails
        assert_eq!(
            translator.demonstrate_fault(11),
            Err(TranslateError::SegFault { page: 11 })
        );
        assert_eq!(
            translator.page_table().try_lookup(11),
            Some(&PageTableEntry::invalid(11))
        );
    }

    #[test]
    fn test_translate_batch_accumulates_state() {
        let mut translator = reference(&[]);
        let inputs = ["0x1234", "0x2000", "0x2001", "0xA000", "0x5000", "bogus"];
        let results = translator.translate_batch(&inputs, 4096);

        assert_eq!(results.len(), 6);
        assert_eq!(results[0].as_ref().unwrap().physical_address, 29236);
        assert!(results[1].as_ref().unwrap().faulted());
        assert!(!results[2].as_ref().unwrap().faulted());
        assert_eq!(results[3], Err(TranslateError::SegFault { page: 10 }));
        assert_eq!(results[4].as_ref().unwrap().frame, 6);
        assert!(matches!(results[5], Err(TranslateError::InvalidAddress { .. })));
    }

    #[test]
    fn test_translate_batch_empty() {
        let mut translator = reference(&[]);
        let results = translator.translate_batch::<&str>(&[], 4096);
        assert!(results.is_empty());
    }
}
