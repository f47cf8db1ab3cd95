use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const PER_PAGE: usize = 30;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<usize>,
    pub total: usize,
}

/// Pages are 1-based. An empty first page is fine, anything past the end
/// is not.
pub fn paginate<T>(items: Vec<T>, page: Option<usize>) -> Result<Page<T>, AppError> {
    let page = page.unwrap_or(1);
    let total = items.len();
    let offset = page
        .checked_sub(1)
        .and_then(|previous| previous.checked_mul(PER_PAGE))
        .ok_or_else(page_not_found)?;

    if page > 1 && offset >= total {
        return Err(page_not_found());
    }

    // offset < total here, or offset == 0
    let end = offset + PER_PAGE;
    let data = items.into_iter().skip(offset).take(PER_PAGE).collect();
    Ok(Page {
        data,
        current_page: page,
        next_page: (end < total).then(|| page + 1),
        total,
    })
}

fn page_not_found() -> AppError {
    AppError::NotFound("page not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::{paginate, PER_PAGE};
    use crate::error::AppError;

    #[test]
    fn splits_into_pages() {
        let items: Vec<usize> = (0..PER_PAGE + 5).collect();

        let first = paginate(items.clone(), None).unwrap();
        assert_eq!(first.data.len(), PER_PAGE);
        assert_eq!(first.next_page, Some(2));
        assert_eq!(first.total, PER_PAGE + 5);

        let second = paginate(items.clone(), Some(2)).unwrap();
        assert_eq!(second.data, vec![30, 31, 32, 33, 34]);
        assert_eq!(second.next_page, None);

        assert!(matches!(paginate(items, Some(3)), Err(AppError::NotFound(_))));
    }

    #[test]
    fn empty_first_page_is_not_an_error() {
        let page = paginate(Vec::<u8>::new(), Some(1)).unwrap();
        assert!(page.data.is_empty());
        assert!(matches!(paginate(Vec::<u8>::new(), Some(0)), Err(AppError::NotFound(_))));
    }

    #[test]
    fn huge_page_numbers_are_not_found() {
        let items: Vec<usize> = (0..PER_PAGE * 2).collect();

        assert!(matches!(paginate(items.clone(), Some(usize::MAX)), Err(AppError::NotFound(_))));
        assert!(matches!(
            paginate(items, Some(usize::MAX / PER_PAGE + 2)),
            Err(AppError::NotFound(_))
        ));
    }
}
