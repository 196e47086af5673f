use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T: Clone> PaginatedResponse<T> {
    /// Slices `all` into one page; out-of-range offsets give an empty page.
    pub fn page(all: &[T], limit: Option<usize>, offset: Option<usize>) -> Self {
        let total = all.len();
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
        let offset = offset.unwrap_or(0);
        let start = offset.min(total);
        let end = start.saturating_add(limit).min(total);
        Self {
            items: all[start..end].to_vec(),
            total,
            limit,
            offset,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PaginationQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_clamp_to_bounds() {
        let all: Vec<u32> = (0..7).collect();
        let page = PaginatedResponse::page(&all, Some(3), Some(5));
        assert_eq!(page.items, vec![5, 6]);
        assert_eq!(page.total, 7);

        assert!(PaginatedResponse::page(&all, None, Some(70)).items.is_empty());
        assert_eq!(PaginatedResponse::page(&all, Some(0), None).items, vec![0]);
    }
}
