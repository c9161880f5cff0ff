/// Per-page details from embedded metadata or computed from the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageInfo {
    /// Zero-based page position (the reading "leaf")
    pub index: usize,
    /// Size of the page image in bytes
    pub size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
impl PageInfo {
    pub fn new(index: usize) -> Self {
        Self { index, ..Default::default() }
    }
}
