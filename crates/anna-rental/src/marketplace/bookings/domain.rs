use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::deserialize_optional_date;
use crate::identity::UserId;
use crate::marketplace::listings::{Availability, Listing, ListingId, Price};
use crate::storage::StoredRecord;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub Uuid);

impl BookingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Copy of the listing as it looked when the booking was made. Later edits or deletion of the
/// listing do not change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub listing_id: ListingId,
    pub captured_at: DateTime<Utc>,
    pub title: String,
    pub location: String,
    pub price: Price,
    pub availability: Availability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl ListingSnapshot {
    pub fn capture(listing: &Listing, captured_at: DateTime<Utc>) -> Self {
        Self {
            listing_id: listing.id.clone(),
            captured_at,
            title: listing.title.clone(),
            location: listing.location.clone(),
            price: listing.price.clone(),
            availability: listing.availability,
            cover_image: listing.cover_image().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub tenant: UserId,
    pub listing: ListingSnapshot,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u16,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Upcoming while `today` is strictly before check-in.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        today < self.check_in
    }
}

impl StoredRecord for Booking {
    type Key = BookingId;

    fn key(&self) -> BookingId {
        self.id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn default_guests() -> u16 {
    1
}

/// Booking form as submitted by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub check_in: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub check_out: Option<NaiveDate>,
    #[serde(default = "default_guests")]
    pub guests: u16,
}

impl BookingRequest {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in: Some(check_in),
            check_out: Some(check_out),
            guests: default_guests(),
        }
    }

    /// Checked dates and guest count, in that order.
    pub fn validate(&self) -> Result<(NaiveDate, NaiveDate, u16), BookingValidationError> {
        let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) else {
            return Err(BookingValidationError::MissingDates);
        };
        if check_out <= check_in {
            return Err(BookingValidationError::DateOrder {
                check_in,
                check_out,
            });
        }
        if self.guests == 0 {
            return Err(BookingValidationError::NoGuests);
        }
        Ok((check_in, check_out, self.guests))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    #[error("please select check-in and check-out dates")]
    MissingDates,
    #[error("check-out date must be after check-in date")]
    DateOrder {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    #[error("at least one guest is required")]
    NoGuests,
}

/// A tenant's bookings split around `today`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingPartition {
    pub today: NaiveDate,
    pub upcoming: Vec<Booking>,
    pub past: Vec<Booking>,
}

impl BookingPartition {
    pub fn split(bookings: Vec<Booking>, today: NaiveDate) -> Self {
        let (upcoming, past): (Vec<Booking>, Vec<Booking>) = bookings
            .into_iter()
            .partition(|booking| booking.is_upcoming(today));
        Self {
            today,
            upcoming,
            past,
        }
    }

    pub fn counts(&self) -> BookingCounts {
        BookingCounts {
            total: self.upcoming.len() + self.past.len(),
            upcoming: self.upcoming.len(),
            past: self.past.len(),
        }
    }
}

/// Counts shown on the tenant dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingCounts {
    pub total: usize,
    pub upcoming: usize,
    pub past: usize,
}
