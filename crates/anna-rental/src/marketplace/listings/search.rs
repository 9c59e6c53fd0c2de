use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Amenity, Listing};
use crate::dates::deserialize_optional_date;

/// Filters submitted from the search form. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub location: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub min_price: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub max_price: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub date_to: Option<NaiveDate>,
    pub amenities: BTreeSet<Amenity>,
}

impl SearchCriteria {
    /// True when `listing` passes every provided filter. Status is not considered here.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_location(listing)
            && self.matches_price(listing)
            && self.matches_dates(listing)
            && self.amenities.is_subset(&listing.amenities)
    }

    fn matches_location(&self, listing: &Listing) -> bool {
        match self.location.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => listing
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    fn matches_price(&self, listing: &Listing) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return true;
        }
        let Some(amount) = listing.price.amount() else {
            return false;
        };
        self.min_price.map_or(true, |min| amount >= min)
            && self.max_price.map_or(true, |max| amount <= max)
    }

    fn matches_dates(&self, listing: &Listing) -> bool {
        let window = listing.availability;
        self.date_from.map_or(true, |from| window.from <= from)
            && self.date_to.map_or(true, |to| window.to >= to)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountInput {
    Number(f64),
    Text(String),
}

/// Price bounds arrive either as JSON numbers or as the raw text of a number input; blank text
/// means no bound.
fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let amount = match Option::<AmountInput>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(AmountInput::Number(amount)) => amount,
        Some(AmountInput::Text(raw)) if raw.trim().is_empty() => return Ok(None),
        Some(AmountInput::Text(raw)) => raw.trim().parse::<f64>().map_err(|err| {
            serde::de::Error::custom(format!("failed to parse '{raw}' as a price ({err})"))
        })?,
    };
    if !amount.is_finite() {
        return Err(serde::de::Error::custom("price bounds must be finite numbers"));
    }
    Ok(Some(amount))
}

/// Active listings that pass `criteria`, in the order given.
pub fn search<'a, I>(listings: I, criteria: &SearchCriteria) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .filter(|listing| listing.is_active())
        .filter(|listing| criteria.matches(listing))
        .collect()
}
