//! Print pagination for price lists
//!
//! Splits an ordered item list into fixed-size pages that fit one A4 sheet.
//! Row heights are estimates, so the page size is computed once from the
//! first page geometry (logo + title header) and used for every page, even
//! though continuation pages carry a shorter header.

/// Page geometry in CSS pixels at 96 DPI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLayout {
    pub page_height: u32,
    /// Applied at the top and at the bottom.
    pub margin: u32,
    pub header_height: u32,
    pub footer_height: u32,
    pub row_height: u32,
}

impl PageLayout {
    /// Rows that fit between header and footer; never less than one so
    /// pagination always makes progress.
    pub fn items_per_page(&self) -> usize {
        let reserved = self
            .margin
            .saturating_mul(2)
            .saturating_add(self.header_height)
            .saturating_add(self.footer_height);
        let available = self.page_height.saturating_sub(reserved);
        match available.checked_div(self.row_height) {
            Some(n) => (n as usize).max(1),
            None => 1,
        }
    }

    /// Paginate `items` and number the pages.
    pub fn pages<'a, T>(&self, items: &'a [T]) -> Vec<Page<'a, T>> {
        let chunks = paginate(items, self.items_per_page());
        let total = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, items)| Page { number: i + 1, total, items })
            .collect()
    }
}

impl Default for PageLayout {
    /// A4 (297mm = 1122px) with 20mm margins.
    fn default() -> Self {
        Self { page_height: 1122, margin: 76, header_height: 150, footer_height: 80, row_height: 28 }
    }
}

/// One printed sheet.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    /// 1-based
    pub number: usize,
    pub total: usize,
    pub items: &'a [T],
}

impl<T> Page<'_, T> {
    /// The first page carries the logo and the full title.
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total
    }

    /// "Page X of Y" is only printed for multi-page lists.
    pub fn show_page_indicator(&self) -> bool {
        self.total > 1
    }
}

/// Split `items` into consecutive chunks of `per_page` (the last may be
/// shorter). A zero page size is treated as one.
pub fn paginate<T>(items: &[T], per_page: usize) -> Vec<&[T]> {
    items.chunks(per_page.max(1)).collect()
}
