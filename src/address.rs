use crate::constants::ADDRESS_BITS;
use crate::error::TranslateError;

/// Page size in bytes, always a positive power of two
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageSize(u64);

impl PageSize {
    pub fn new(bytes: u64) -> Result<Self, TranslateError> {
        if bytes.is_power_of_two() {
            Ok(PageSize(bytes))
        } else {
            Err(TranslateError::InvalidPageSize(bytes))
        }
    }

    #[inline]
    pub fn bytes(self) -> u64 {
        self.0
    }

    /// Number of low-order address bits that form the offset
    #[inline]
    pub fn offset_bits(self) -> u32 {
        self.0.trailing_zeros()
    }

    #[inline]
    pub fn offset_mask(self) -> u64 {
        self.0 - 1
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes (2^{})", self.0, self.offset_bits())
    }
}

/// Parse a virtual address written in decimal or as `0x`-prefixed hex
pub fn parse_address(input: &str) -> Result<u64, TranslateError> {
    let invalid = || TranslateError::InvalidAddress {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (trimmed, 10),
    };

    // from_str_radix tolerates a leading '+'
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    u64::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// A virtual address split into page number and offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub raw: u64,
    pub page: u64,
    pub offset: u64,
    pub page_size: PageSize,
}

impl VirtualAddress {
    /// Decompose a raw address for the given page size
    pub fn split(raw: u64, page_size: PageSize) -> Self {
        let page = raw >> page_size.offset_bits();
        let offset = raw & page_size.offset_mask();

        VirtualAddress {
            raw,
            page,
            offset,
            page_size,
        }
    }

    pub fn parse(input: &str, page_size: PageSize) -> Result<Self, TranslateError> {
        Ok(Self::split(parse_address(input)?, page_size))
    }

    /// Binary form, zero-padded to `ADDRESS_BITS` (never truncated)
    pub fn binary(&self) -> String {
        format!("{:0width$b}", self.raw, width = ADDRESS_BITS as usize)
    }

    /// The binary form cut into its page-number and offset halves
    pub fn split_binary(&self) -> (String, String) {
        let binary = self.binary();
        let offset_len = (self.page_size.offset_bits() as usize).min(binary.len());
        let (page_bits, offset_bits) = binary.split_at(binary.len() - offset_len);
        (page_bits.to_string(), offset_bits.to_string())
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VA({:#x}) = (page={}, offset={})",
            self.raw, self.page, self.offset
        )
    }
}
