pub mod address;
pub mod constants;
pub mod error;
pub mod io;
pub mod memory;
pub mod page_table;
pub mod replacement;
pub mod translation;

// Re-export commonly used items for convenience
pub use address::{PageSize, VirtualAddress, parse_address};
pub use constants::*;
pub use error::{InitError, TranslateError};
pub use io::InitData;
pub use memory::{Allocation, DiskStore, FrameAllocator, FramePool};
pub use page_table::{PageTable, PageTableEntry};
pub use replacement::{RandomVictim, ScriptedVictim, VictimSelector};
pub use translation::{EvictedMapping, FaultResolution, TranslationResult, Translator};
