//! Two-step listing editor: a draft is validated into a preview, and a preview is published.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{Amenity, Availability, Listing, ListingForm, ListingId, Price};
use crate::identity::UserId;

pub const MIN_IMAGES: usize = 3;

/// Where an editing session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorStage {
    Draft,
    Preview,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("please fill all required fields (missing {0})")]
    MissingField(&'static str),
    #[error("price must be a non-negative number, got '{0}'")]
    InvalidPrice(String),
    #[error("availability ends ({to}) before it starts ({from})")]
    AvailabilityOrder { from: NaiveDate, to: NaiveDate },
    #[error("please upload at least {required} images (found {found})")]
    NotEnoughImages { required: usize, found: usize },
}

/// Collected editor input, optionally tied to the listing being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    editing: Option<ListingId>,
    form: ListingForm,
}

impl ListingDraft {
    pub fn new(form: ListingForm) -> Self {
        Self {
            editing: None,
            form,
        }
    }

    /// Pre-fill a draft from an existing listing.
    pub fn editing(listing: &Listing) -> Self {
        Self {
            editing: Some(listing.id.clone()),
            form: ListingForm::from(listing),
        }
    }

    /// Replace the collected fields while keeping the edit target.
    pub fn with_form(self, form: ListingForm) -> Self {
        Self {
            editing: self.editing,
            form,
        }
    }

    pub fn stage(&self) -> EditorStage {
        EditorStage::Draft
    }

    pub fn target(&self) -> Option<&ListingId> {
        self.editing.as_ref()
    }

    pub fn form(&self) -> &ListingForm {
        &self.form
    }

    /// Validate the draft. Required fields are checked before the image count.
    pub fn preview(self) -> Result<ListingPreview, ListingValidationError> {
        let form = &self.form;

        let title = required(&form.title, "title")?;
        let description = required(&form.description, "description")?;
        let location = required(&form.location, "location")?;
        let raw_price = required(&form.price, "price")?;
        let from = form
            .availability
            .from
            .ok_or(ListingValidationError::MissingField("availability.from"))?;
        let to = form
            .availability
            .to
            .ok_or(ListingValidationError::MissingField("availability.to"))?;

        let price = Price::parse(&raw_price)
            .ok_or_else(|| ListingValidationError::InvalidPrice(raw_price.clone()))?;
        if to < from {
            return Err(ListingValidationError::AvailabilityOrder { from, to });
        }

        let images: Vec<String> = form
            .images
            .iter()
            .map(|image| image.trim())
            .filter(|image| !image.is_empty())
            .map(str::to_string)
            .collect();
        if images.len() < MIN_IMAGES {
            return Err(ListingValidationError::NotEnoughImages {
                required: MIN_IMAGES,
                found: images.len(),
            });
        }

        Ok(ListingPreview {
            editing: self.editing,
            title,
            description,
            location,
            amenities: form.amenities.clone(),
            price,
            availability: Availability { from, to },
            images,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ListingValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ListingValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Validated listing as it will be published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPreview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing: Option<ListingId>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub amenities: BTreeSet<Amenity>,
    pub price: Price,
    pub availability: Availability,
    pub images: Vec<String>,
}

impl ListingPreview {
    pub fn stage(&self) -> EditorStage {
        EditorStage::Preview
    }

    /// Go back and keep editing.
    pub fn back_to_draft(self) -> ListingDraft {
        ListingDraft {
            editing: self.editing.clone(),
            form: ListingForm {
                title: self.title,
                description: self.description,
                location: self.location,
                amenities: self.amenities,
                price: self.price.as_str().to_string(),
                availability: super::domain::AvailabilityForm {
                    from: Some(self.availability.from),
                    to: Some(self.availability.to),
                },
                images: self.images,
            },
        }
    }

    /// Publish as a brand new listing owned by `owner`.
    pub fn publish_new(self, owner: &UserId, now: DateTime<Utc>) -> Listing {
        Listing {
            id: ListingId::generate(),
            owner: owner.clone(),
            title: self.title,
            description: self.description,
            location: self.location,
            amenities: self.amenities,
            price: self.price,
            availability: self.availability,
            images: self.images,
            created_at: now,
            updated_at: None,
            status: Default::default(),
        }
    }

    /// Publish over `existing`, keeping its identity, owner, status and creation time.
    pub fn publish_over(self, existing: Listing, now: DateTime<Utc>) -> Listing {
        Listing {
            title: self.title,
            description: self.description,
            location: self.location,
            amenities: self.amenities,
            price: self.price,
            availability: self.availability,
            images: self.images,
            updated_at: Some(now),
            ..existing
        }
    }
}
