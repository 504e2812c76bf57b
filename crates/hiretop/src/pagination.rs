use serde::{Deserialize, Serialize};

const MAX_PER_PAGE: u32 = 100;

/// 1-based page selector. Out-of-range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn first(per_page: u32) -> Self {
        Self::new(1, per_page)
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            per_page: request.per_page,
            current_page: request.page,
            last_page: 1,
        }
    }

    /// Slices an already filtered and ordered result set.
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let per_page = u64::from(request.per_page);
        let last_page = total.div_ceil(per_page).max(1) as u32;
        let data = items
            .into_iter()
            .skip(request.offset())
            .take(request.per_page as usize)
            .collect();

        Self {
            data,
            total,
            per_page: request.per_page,
            current_page: request.page,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_reports_last_page() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10));
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn empty_results_still_have_one_page() {
        let page: Page<u8> = Page::paginate(Vec::new(), PageRequest::new(0, 0));
        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.last_page, 1);
        assert!(page.data.is_empty());
    }

    #[test]
    fn serializes_camel_case_envelope() {
        let page = Page::paginate(vec!["a"], PageRequest::first(12));
        let value = serde_json::to_value(&page).expect("serializes");
        assert_eq!(value["perPage"], 12);
        assert_eq!(value["currentPage"], 1);
        assert_eq!(value["lastPage"], 1);
    }
}
