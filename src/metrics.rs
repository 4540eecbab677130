//! Byte accounting collected while a PDF streams out. Surfaced through the
//! builder API and logged by the CLI; never required for correctness.

#[derive(Debug, Clone, Default)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    /// Total size of the finished PDF in bytes.
    pub total_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PageMetrics {
    /// 1-based page number in output order.
    pub page_number: usize,
    /// Size of the page's content stream, before stream framing.
    pub content_bytes: usize,
    /// Encoded size of the image data embedded for this page.
    pub image_bytes: usize,
}

impl DocumentMetrics {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn image_bytes_total(&self) -> usize {
        self.pages.iter().map(|p| p.image_bytes).sum()
    }
}
