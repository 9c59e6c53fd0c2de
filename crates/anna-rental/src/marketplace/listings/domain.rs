use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::deserialize_optional_date;
use crate::identity::UserId;
use crate::storage::StoredRecord;

/// Stable identifier assigned when a listing is first published.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Amenity tags a landlord can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Amenity {
    #[serde(rename = "Wi-Fi")]
    WiFi,
    #[serde(rename = "AC")]
    AirConditioning,
    #[serde(rename = "TV")]
    Television,
    Kitchen,
    Parking,
    Washer,
    Generator,
}

impl Amenity {
    pub const ALL: [Amenity; 7] = [
        Amenity::WiFi,
        Amenity::AirConditioning,
        Amenity::Television,
        Amenity::Kitchen,
        Amenity::Parking,
        Amenity::Washer,
        Amenity::Generator,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Amenity::WiFi => "Wi-Fi",
            Amenity::AirConditioning => "AC",
            Amenity::Television => "TV",
            Amenity::Kitchen => "Kitchen",
            Amenity::Parking => "Parking",
            Amenity::Washer => "Washer",
            Amenity::Generator => "Generator",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    Active,
    Paused,
}

impl ListingStatus {
    pub const fn toggled(self) -> Self {
        match self {
            ListingStatus::Active => ListingStatus::Paused,
            ListingStatus::Paused => ListingStatus::Active,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Active => "Active",
            ListingStatus::Paused => "Paused",
        }
    }
}

/// Nightly price, kept in the textual form the landlord entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    /// Accepts any finite, non-negative decimal.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let amount = trimmed.parse::<f64>().ok()?;
        if amount.is_finite() && amount >= 0.0 {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value used by price filters. Records written by older clients may hold text
    /// that no longer parses; those compare as absent.
    pub fn amount(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok().filter(|value| value.is_finite())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive window during which the apartment can be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// A published apartment advertisement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub amenities: BTreeSet<Amenity>,
    pub price: Price,
    pub availability: Availability,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ListingStatus,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn summary(&self) -> ListingSummary {
        ListingSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            location: self.location.clone(),
            price: self.price.clone(),
            cover_image: self.cover_image().map(str::to_string),
            excerpt: excerpt(&self.description, EXCERPT_CHARS),
            status: self.status,
        }
    }
}

impl StoredRecord for Listing {
    type Key = ListingId;

    fn key(&self) -> ListingId {
        self.id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

const EXCERPT_CHARS: usize = 60;

/// Card shown in browse and search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    pub location: String,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub excerpt: String,
    pub status: ListingStatus,
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Editor input. Everything is optional here; the editor decides what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub amenities: BTreeSet<Amenity>,
    pub price: String,
    pub availability: AvailabilityForm,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityForm {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
}

impl From<&Listing> for ListingForm {
    fn from(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            location: listing.location.clone(),
            amenities: listing.amenities.clone(),
            price: listing.price.as_str().to_string(),
            availability: AvailabilityForm {
                from: Some(listing.availability.from),
                to: Some(listing.availability.to),
            },
            images: listing.images.clone(),
        }
    }
}
