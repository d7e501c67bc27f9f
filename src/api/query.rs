use crate::{
    actions::RecipeFilter,
    config::PaginationConfig,
    error::{Error, FieldErrors, Result},
    pagination::PageRequest,
    schema::Uuid,
};

/// Raw query string pairs, kept in order so repeated keys such as
/// `?tags=breakfast&tags=lunch` survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(pub Vec<(String, String)>);

impl QueryPairs {
    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    fn integer(&self, key: &str, errors: &mut FieldErrors) -> Option<i64> {
        let value = self.first(key)?.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse() {
            Ok(number) => Some(number),
            Err(_) => {
                errors.add(key, "A valid integer is required.");
                None
            }
        }
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.first(key), Some("1") | Some("true"))
    }

    pub fn page_request(&self, config: &PaginationConfig) -> Result<PageRequest> {
        let mut errors = FieldErrors::new();
        let page = self.integer("page", &mut errors);
        let limit = self.integer("limit", &mut errors);
        errors.into_result()?;

        Ok(PageRequest::resolve(page, limit, config))
    }

    pub fn recipe_filter(&self) -> Result<RecipeFilter> {
        let mut errors = FieldErrors::new();
        let author = self.integer("author", &mut errors);
        errors.into_result()?;

        let author = match author.map(Uuid::try_from) {
            Some(Ok(id)) => Some(id),
            Some(Err(_)) => {
                return Err(Error::validation("author", "Unknown author."));
            }
            None => None,
        };

        let mut tags: Vec<String> = Vec::new();
        for slug in self.all("tags").map(str::trim).filter(|s| !s.is_empty()) {
            if !tags.iter().any(|tag| tag == slug) {
                tags.push(slug.to_owned());
            }
        }

        Ok(RecipeFilter {
            tags,
            author,
            is_favorited: self.flag("is_favorited"),
            is_in_shopping_cart: self.flag("is_in_shopping_cart"),
        })
    }

    /// Preview cap for subscription views. Zero or negative means no cap.
    pub fn recipes_limit(&self) -> Result<Option<i64>> {
        let mut errors = FieldErrors::new();
        let limit = self.integer("recipes_limit", &mut errors);
        errors.into_result()?;

        Ok(limit.filter(|limit| *limit > 0))
    }

    pub fn search(&self) -> Option<&str> {
        self.first("name")
            .or_else(|| self.first("search"))
            .map(str::trim)
            .filter(|search| !search.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> QueryPairs {
        QueryPairs(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn recipe_filter_collects_repeated_tags() {
        let filter = pairs(&[
            ("tags", "breakfast"),
            ("tags", "lunch"),
            ("tags", "breakfast"),
            ("author", "3"),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
        ])
        .recipe_filter()
        .unwrap();

        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
        assert_eq!(filter.author, Some(3));
        assert!(filter.is_favorited);
        assert!(!filter.is_in_shopping_cart);
    }

    #[test]
    fn empty_query_is_unfiltered() {
        assert_eq!(
            QueryPairs::default().recipe_filter().unwrap(),
            RecipeFilter::default()
        );
    }

    #[test]
    fn malformed_numbers_are_keyed_errors() {
        let query = pairs(&[("page", "two"), ("limit", "x")]);

        match query.page_request(&PaginationConfig::default()) {
            Err(Error::Validation(errors)) => {
                assert!(errors.contains("page"));
                assert!(errors.contains("limit"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_recipes_limit_means_uncapped() {
        assert_eq!(pairs(&[("recipes_limit", "3")]).recipes_limit().unwrap(), Some(3));
        assert_eq!(pairs(&[("recipes_limit", "0")]).recipes_limit().unwrap(), None);
        assert_eq!(pairs(&[("recipes_limit", "-1")]).recipes_limit().unwrap(), None);
        assert_eq!(QueryPairs::default().recipes_limit().unwrap(), None);
    }

    #[test]
    fn search_accepts_name_or_search_key() {
        assert_eq!(pairs(&[("name", " sug ")]).search(), Some("sug"));
        assert_eq!(pairs(&[("search", "flo")]).search(), Some("flo"));
        assert_eq!(pairs(&[("name", "  ")]).search(), None);
    }
}
