//! Display partitioning of a photobook's photo list.
//!
//! The single-book view offers a grouping selector; this module computes the
//! named buckets it renders. A multi-valued field contributes one composite
//! key (the values joined with `", "`), so a photo always lands in exactly
//! one bucket — it is never fanned out across its tags.

use crate::store::Photo;

/// Label for the single bucket when no grouping is selected.
pub const ALL_PHOTOS: &str = "All Photos";

/// Label for photos with no value under the selected metric.
pub const UNSPECIFIED: &str = "Unspecified";

/// The field a photo list is partitioned by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupMetric {
    #[default]
    None,
    FilmStock,
    People,
    Event,
    Location,
}

impl GroupMetric {
    /// The selector value this metric corresponds to.
    pub fn name(&self) -> &'static str {
        match self {
            GroupMetric::None => "none",
            GroupMetric::FilmStock => "filmStock",
            GroupMetric::People => "people",
            GroupMetric::Event => "event",
            GroupMetric::Location => "location",
        }
    }
}

/// One display bucket: its label and the photos in it, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoGroup {
    pub label: String,
    pub photos: Vec<Photo>,
}

/// Partition `photos` into named buckets by `metric`.
///
/// Buckets appear in order of first occurrence of their key; photos keep
/// their input order within a bucket. `GroupMetric::None` yields the single
/// "All Photos" bucket, even for an empty input.
pub fn group_photos(photos: &[Photo], metric: GroupMetric) -> Vec<PhotoGroup> {
    if metric == GroupMetric::None {
        return vec![PhotoGroup {
            label: ALL_PHOTOS.to_string(),
            photos: photos.to_vec(),
        }];
    }

    let mut groups: Vec<PhotoGroup> = Vec::new();
    for photo in photos {
        let label = group_label(photo, metric);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.photos.push(photo.clone()),
            None => groups.push(PhotoGroup {
                label,
                photos: vec![photo.clone()],
            }),
        }
    }
    groups
}

fn group_label(photo: &Photo, metric: GroupMetric) -> String {
    let key = match metric {
        GroupMetric::None => ALL_PHOTOS.to_string(),
        GroupMetric::FilmStock => photo.film_stock.join(", "),
        GroupMetric::People => photo.people.join(", "),
        GroupMetric::Event => photo.event.join(", "),
        GroupMetric::Location => photo.location.clone(),
    };
    if key.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_people(url: &str, people: &[&str]) -> Photo {
        Photo {
            url: url.to_string(),
            people: people.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    fn with_location(url: &str, location: &str) -> Photo {
        Photo {
            url: url.to_string(),
            location: location.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn no_metric_is_a_single_group_in_original_order() {
        let photos = vec![
            with_people("1", &["B"]),
            with_people("2", &["A"]),
            with_people("3", &[]),
        ];

        let groups = group_photos(&photos, GroupMetric::None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, ALL_PHOTOS);
        assert_eq!(groups[0].photos, photos);
    }

    #[test]
    fn no_metric_on_an_empty_list_still_yields_the_group() {
        let groups = group_photos(&[], GroupMetric::None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, ALL_PHOTOS);
        assert!(groups[0].photos.is_empty());
    }

    #[test]
    fn multi_valued_tags_form_one_composite_group() {
        let photos = vec![
            with_people("1", &["A", "B"]),
            with_people("2", &["A", "B"]),
            with_people("3", &[]),
        ];

        let groups = group_photos(&photos, GroupMetric::People);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "A, B");
        assert_eq!(groups[0].photos.len(), 2);
        assert_eq!(groups[1].label, UNSPECIFIED);
        assert_eq!(groups[1].photos[0].url, "3");
    }

    #[test]
    fn a_photo_lands_in_exactly_one_group() {
        let photos = vec![with_people("1", &["A", "B", "C"])];

        let groups = group_photos(&photos, GroupMetric::People);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "A, B, C");
        let total: usize = groups.iter().map(|g| g.photos.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn string_metric_uses_the_value_or_unspecified() {
        let photos = vec![with_location("1", "Paris"), with_location("2", "")];

        let groups = group_photos(&photos, GroupMetric::Location);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Paris");
        assert_eq!(groups[0].photos[0].url, "1");
        assert_eq!(groups[1].label, UNSPECIFIED);
        assert_eq!(groups[1].photos[0].url, "2");
    }

    #[test]
    fn buckets_follow_first_occurrence_and_keep_input_order() {
        let photos = vec![
            with_location("1", "Lisbon"),
            with_location("2", "Paris"),
            with_location("3", "Lisbon"),
            with_location("4", "Oslo"),
        ];

        let groups = group_photos(&photos, GroupMetric::Location);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Lisbon", "Paris", "Oslo"]);

        let lisbon: Vec<&str> = groups[0].photos.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(lisbon, ["1", "3"]);
    }

    #[test]
    fn grouping_by_film_stock_uses_that_field() {
        let mut photo = with_people("1", &["A"]);
        photo.film_stock = vec!["HP5".to_string()];

        let groups = group_photos(&[photo], GroupMetric::FilmStock);
        assert_eq!(groups[0].label, "HP5");
    }
}
