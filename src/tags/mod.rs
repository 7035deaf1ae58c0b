//! Per-user tag registry.
//!
//! Each user has one vocabulary per category (film stock, people, event),
//! kept as a deduplicated set in the `userTags` collection and grown
//! monotonically — there is no removal. The registry feeds the
//! creatable-select inputs while photo metadata is edited: existing tags are
//! suggested, a new value is unioned in.

use std::sync::Arc;

use crate::store::{Photo, Store, StoreError, UserId};

/// One of the independent per-user tag vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    FilmStock,
    People,
    Event,
}

impl TagCategory {
    pub const ALL: [TagCategory; 3] = [
        TagCategory::FilmStock,
        TagCategory::People,
        TagCategory::Event,
    ];

    /// Field name in the `userTags` document.
    pub fn wire_name(&self) -> &'static str {
        match self {
            TagCategory::FilmStock => "filmStock",
            TagCategory::People => "people",
            TagCategory::Event => "event",
        }
    }
}

pub struct TagRegistry {
    store: Arc<Store>,
}

impl TagRegistry {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Every tag the user has ever added in this category, duplicate-free.
    /// Order unspecified. A user with no backing document gets an empty list,
    /// never an error.
    pub fn list(&self, user: &UserId, category: TagCategory) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .user_tags(user)?
            .map(|doc| doc.category(category).to_vec())
            .unwrap_or_default())
    }

    /// Union one tag into the user's vocabulary. Idempotent: a tag that is
    /// already present is a no-op.
    ///
    /// The first tag a user ever adds has no backing document to merge into;
    /// the store answers `NotFound` and the document is created with the
    /// singleton set instead. Any other store error propagates.
    pub fn add(&self, user: &UserId, category: TagCategory, tag: &str) -> Result<(), StoreError> {
        match self.store.merge_user_tag(user, category, tag) {
            Err(StoreError::NotFound { .. }) => {
                tracing::debug!(user = %user, category = category.wire_name(), "creating tag document");
                self.store.create_user_tags(user, category, tag)
            }
            other => other,
        }
    }

    /// Suggestions for a creatable-select input: the user's vocabulary,
    /// minus values already selected, filtered case-insensitively by the
    /// typed input. Empty input suggests the whole remaining vocabulary.
    pub fn suggestions(
        &self,
        user: &UserId,
        category: TagCategory,
        input: &str,
        selected: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let needle = input.trim().to_lowercase();
        let tags = self.list(user, category)?;
        Ok(tags
            .into_iter()
            .filter(|tag| !selected.contains(tag))
            .filter(|tag| needle.is_empty() || tag.to_lowercase().contains(&needle))
            .collect())
    }

    /// Union every tag a photo carries into the user's vocabularies. Called
    /// whenever photo metadata is edited, so the registry tracks everything
    /// the user has ever typed.
    pub fn record_photo_tags(&self, user: &UserId, photo: &Photo) -> Result<(), StoreError> {
        for category in TagCategory::ALL {
            for tag in photo.category_tags(category) {
                self.add(user, category, tag)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TagRegistry {
        TagRegistry::new(Arc::new(Store::in_memory()))
    }

    fn sorted(mut tags: Vec<String>) -> Vec<String> {
        tags.sort();
        tags
    }

    #[test]
    fn list_is_empty_for_a_user_with_no_tags() {
        let registry = registry();
        let tags = registry.list(&UserId::new("u1"), TagCategory::People).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn first_add_falls_back_to_creating_the_document() {
        let registry = registry();
        let u1 = UserId::new("u1");

        registry.add(&u1, TagCategory::People, "Sam").unwrap();
        assert_eq!(registry.list(&u1, TagCategory::People).unwrap(), ["Sam"]);
    }

    #[test]
    fn add_is_idempotent() {
        let registry = registry();
        let u1 = UserId::new("u1");

        registry.add(&u1, TagCategory::People, "Sam").unwrap();
        registry.add(&u1, TagCategory::People, "Sam").unwrap();

        let tags = registry.list(&u1, TagCategory::People).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags, ["Sam"]);
    }

    #[test]
    fn list_returns_the_exact_set_regardless_of_add_order() {
        let registry = registry();
        let u1 = UserId::new("u1");
        let u2 = UserId::new("u2");

        for tag in ["Portra 400", "HP5", "Portra 400", "Ektar 100"] {
            registry.add(&u1, TagCategory::FilmStock, tag).unwrap();
        }
        for tag in ["Ektar 100", "Portra 400", "HP5", "HP5"] {
            registry.add(&u2, TagCategory::FilmStock, tag).unwrap();
        }

        let expected = ["Ektar 100", "HP5", "Portra 400"];
        assert_eq!(sorted(registry.list(&u1, TagCategory::FilmStock).unwrap()), expected);
        assert_eq!(sorted(registry.list(&u2, TagCategory::FilmStock).unwrap()), expected);
    }

    #[test]
    fn categories_are_independent_vocabularies() {
        let registry = registry();
        let u1 = UserId::new("u1");

        registry.add(&u1, TagCategory::People, "Sam").unwrap();
        registry.add(&u1, TagCategory::Event, "Wedding").unwrap();

        assert_eq!(registry.list(&u1, TagCategory::People).unwrap(), ["Sam"]);
        assert_eq!(registry.list(&u1, TagCategory::Event).unwrap(), ["Wedding"]);
        assert!(registry.list(&u1, TagCategory::FilmStock).unwrap().is_empty());
    }

    #[test]
    fn tags_are_case_sensitive_exact_matches() {
        let registry = registry();
        let u1 = UserId::new("u1");

        registry.add(&u1, TagCategory::People, "Sam").unwrap();
        registry.add(&u1, TagCategory::People, "sam").unwrap();

        assert_eq!(registry.list(&u1, TagCategory::People).unwrap().len(), 2);
    }

    #[test]
    fn suggestions_filter_by_input_and_skip_selected() {
        let registry = registry();
        let u1 = UserId::new("u1");
        for tag in ["Portra 400", "Portra 800", "HP5"] {
            registry.add(&u1, TagCategory::FilmStock, tag).unwrap();
        }

        let selected = vec!["Portra 800".to_string()];
        let hits = registry
            .suggestions(&u1, TagCategory::FilmStock, "portra", &selected)
            .unwrap();
        assert_eq!(hits, ["Portra 400"]);

        let all = registry
            .suggestions(&u1, TagCategory::FilmStock, "", &[])
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn record_photo_tags_unions_every_category() {
        let registry = registry();
        let u1 = UserId::new("u1");

        let photo = Photo {
            url: "https://b/1.jpg".to_string(),
            film_stock: vec!["HP5".to_string()],
            people: vec!["Sam".to_string(), "Alex".to_string()],
            event: vec!["Wedding".to_string()],
            ..Default::default()
        };
        registry.record_photo_tags(&u1, &photo).unwrap();
        registry.record_photo_tags(&u1, &photo).unwrap();

        assert_eq!(registry.list(&u1, TagCategory::FilmStock).unwrap(), ["HP5"]);
        assert_eq!(
            sorted(registry.list(&u1, TagCategory::People).unwrap()),
            ["Alex", "Sam"]
        );
        assert_eq!(registry.list(&u1, TagCategory::Event).unwrap(), ["Wedding"]);
    }
}
