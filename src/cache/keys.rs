//! Cache key layout.
//!
//! - `product:{id}` holds one product snapshot.
//! - `products:list:{params}` holds one page of a listing. `{params}` is the
//!   form-urlencoded request in a fixed field order, so equal requests share a
//!   key and different requests never do.

use url::form_urlencoded;

use crate::application::pagination::PageRequest;
use crate::application::repos::{ProductQueryFilter, ProductSort};
use crate::domain::ids::ProductId;

pub const ENTITY_PREFIX: &str = "product:";
pub const LIST_PREFIX: &str = "products:list:";

pub fn entity_key(id: &ProductId) -> String {
    format!("{ENTITY_PREFIX}{id}")
}

pub fn list_key(filter: &ProductQueryFilter, sort: ProductSort, page: PageRequest) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params
        .append_pair("page", &page.page.to_string())
        .append_pair("page_size", &page.page_size.to_string())
        .append_pair("sort_by", sort.field.as_str())
        .append_pair("sort_dir", sort.direction.as_str());
    for (name, value) in filter.canonical_pairs() {
        params.append_pair(name, &value);
    }
    format!("{LIST_PREFIX}{}", params.finish())
}

#[cfg(test)]
mod tests {
    use catalog_api_types::{SortDirection, SortField};

    use super::*;
    use crate::application::pagination::PageLimits;

    fn page(page: i64, size: i64) -> PageRequest {
        PageRequest::new(Some(page), Some(size), PageLimits::default()).expect("valid page")
    }

    #[test]
    fn entity_key_embeds_id() {
        let id = ProductId::parse("65920080abcdef0123456789").expect("valid id");
        assert_eq!(entity_key(&id), "product:65920080abcdef0123456789");
    }

    #[test]
    fn list_key_is_deterministic() {
        let filter = ProductQueryFilter {
            search: Some("widget".to_string()),
            price_max: Some(20.0),
            ..Default::default()
        };
        let first = list_key(&filter, ProductSort::default(), page(1, 10));
        let second = list_key(&filter.clone(), ProductSort::default(), page(1, 10));
        assert_eq!(first, second);
        assert!(first.starts_with(LIST_PREFIX));
        assert_eq!(
            first,
            "products:list:page=1&page_size=10&sort_by=created_at&sort_dir=desc&search=widget&price_max=20"
        );
    }

    #[test]
    fn differing_parameters_yield_distinct_keys() {
        let base = ProductQueryFilter::default();
        let sorted = ProductSort {
            field: SortField::Price,
            direction: SortDirection::Asc,
        };
        let keys = [
            list_key(&base, ProductSort::default(), page(1, 10)),
            list_key(&base, ProductSort::default(), page(2, 10)),
            list_key(&base, ProductSort::default(), page(1, 20)),
            list_key(&base, sorted, page(1, 10)),
            list_key(
                &ProductQueryFilter {
                    is_active: Some(true),
                    ..Default::default()
                },
                ProductSort::default(),
                page(1, 10),
            ),
        ];
        for (i, left) in keys.iter().enumerate() {
            for right in keys.iter().skip(i + 1) {
                assert_ne!(left, right);
            }
        }
    }

    #[test]
    fn separators_inside_values_cannot_forge_other_fields() {
        let injected = ProductQueryFilter {
            search: Some("a&name=b".to_string()),
            ..Default::default()
        };
        let split = ProductQueryFilter {
            search: Some("a".to_string()),
            name: Some("b".to_string()),
            ..Default::default()
        };
        assert_ne!(
            list_key(&injected, ProductSort::default(), page(1, 10)),
            list_key(&split, ProductSort::default(), page(1, 10))
        );
    }
}
