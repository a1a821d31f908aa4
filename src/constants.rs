/// Width of the rendered virtual address.
pub const ADDRESS_BITS: u32 = 16;

/// Number of physical frames in the reference configuration.
pub const FRAME_COUNT: usize = 8;

pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Page used by the page-fault walkthrough.
pub const DEMO_PAGE: u64 = 2;

/// Written to batch output in place of a physical address when translation fails.
pub const INVALID_ADDRESS: i64 = -1;
