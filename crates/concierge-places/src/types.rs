// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Places details response types and their mapping onto [`BusinessDetails`].

use concierge_core::{BusinessDetails, Review};
use serde::Deserialize;

/// Fields requested through `X-Goog-FieldMask`. Must stay in sync with [`Place`].
pub const FIELD_MASK: &str = "id,displayName,formattedAddress,nationalPhoneNumber,\
internationalPhoneNumber,websiteUri,rating,userRatingCount,regularOpeningHours,\
photos,reviews,googleMapsUri,types";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<LocalizedText>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub national_phone_number: Option<String>,
    #[serde(default)]
    pub international_phone_number: Option<String>,
    #[serde(default)]
    pub website_uri: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_rating_count: Option<u32>,
    #[serde(default)]
    pub regular_opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub reviews: Vec<PlaceReview>,
    #[serde(default)]
    pub google_maps_uri: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizedText {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_descriptions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    /// Resource name, e.g. `places/<id>/photos/<ref>`.
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceReview {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: Option<LocalizedText>,
    #[serde(default)]
    pub relative_publish_time_description: Option<String>,
    #[serde(default)]
    pub author_attribution: Option<AuthorAttribution>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAttribution {
    #[serde(default)]
    pub display_name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<Place> for BusinessDetails {
    fn from(place: Place) -> Self {
        let reviews = place
            .reviews
            .into_iter()
            .filter_map(|r| {
                let text = r.text.map(|t| t.text).unwrap_or_default();
                let author = r
                    .author_attribution
                    .and_then(|a| a.display_name)
                    .unwrap_or_default();
                // A review with neither author nor text carries nothing useful.
                if text.is_empty() && author.is_empty() {
                    return None;
                }
                Some(Review {
                    author,
                    rating: r.rating,
                    text,
                    relative_time: r.relative_publish_time_description,
                })
            })
            .collect();

        BusinessDetails {
            name: non_empty(place.display_name.map(|n| n.text)),
            address: non_empty(place.formatted_address),
            phone: non_empty(place.national_phone_number)
                .or_else(|| non_empty(place.international_phone_number)),
            website: non_empty(place.website_uri),
            rating: place.rating,
            rating_count: place.user_rating_count,
            opening_hours: place
                .regular_opening_hours
                .map(|h| h.weekday_descriptions)
                .unwrap_or_default(),
            photos: place.photos.into_iter().map(|p| p.name).collect(),
            reviews,
            maps_url: non_empty(place.google_maps_uri),
            categories: place.types,
        }
    }
}
