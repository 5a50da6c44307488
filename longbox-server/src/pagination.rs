//! The `{ total, page, size, items }` envelope every listing endpoint
//! returns (§6). `size` defaults to and is capped at 100; callers that need
//! a higher cap (search, §4.9) validate their own limit instead of going
//! through `PageParams`.

use serde::{Deserialize, Serialize};

const DEFAULT_SIZE: u32 = 50;
const MAX_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    DEFAULT_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: default_page(), size: default_size() }
    }
}

impl PageParams {
    pub fn normalized(self) -> Self {
        Self { page: self.page.max(1), size: self.size.clamp(1, MAX_SIZE) }
    }

    /// Slice `items` (already fetched in full) down to this page's window.
    pub fn paginate<T>(self, items: Vec<T>) -> Page<T> {
        let params = self.normalized();
        let total = items.len();
        let start = ((params.page - 1) as usize * params.size as usize).min(total);
        let end = (start + params.size as usize).min(total);
        Page {
            total,
            page: params.page,
            size: params.size,
            items: items.into_iter().skip(start).take(end - start).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: usize,
    pub page: u32,
    pub size: u32,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_slices_past_the_first() {
        let params = PageParams { page: 2, size: 2 };
        let page = params.paginate(vec![1, 2, 3, 4, 5]);
        assert_eq!(page.items, vec![3, 4]);
        assert_eq!(page.total, 5);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let params = PageParams { page: 10, size: 2 };
        let page = params.paginate(vec![1, 2, 3]);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn size_is_capped_even_if_the_caller_asks_for_more() {
        let params = PageParams { page: 1, size: 10_000 }.normalized();
        assert_eq!(params.size, MAX_SIZE);
    }
}
