use std::collections::BTreeSet;

use super::common::*;

use crate::identity::UserId;
use crate::marketplace::listings::domain::{Amenity, Listing, ListingStatus};
use crate::marketplace::listings::{search, SearchCriteria};

fn catalogue() -> Vec<Listing> {
    let owner = UserId::generate();
    vec![
        listing_from(lekki_form(), &owner, 0),
        listing_from(ikeja_form(), &owner, 1),
    ]
}

fn titles(found: Vec<&Listing>) -> Vec<&str> {
    found.into_iter().map(|listing| listing.title.as_str()).collect()
}

#[test]
fn empty_criteria_returns_every_active_listing_in_order() {
    let listings = catalogue();
    let found = search(&listings, &SearchCriteria::default());
    assert_eq!(titles(found), vec!["Lekki Studio", "Ikeja Two Bedroom"]);
}

#[test]
fn paused_listings_never_appear() {
    let mut listings = catalogue();
    listings[0].status = ListingStatus::Paused;

    let found = search(&listings, &SearchCriteria::default());
    assert_eq!(titles(found), vec!["Ikeja Two Bedroom"]);
}

#[test]
fn location_matches_case_insensitive_substring() {
    let listings = catalogue();
    let criteria = SearchCriteria {
        location: Some("lekki".to_string()),
        ..SearchCriteria::default()
    };
    assert_eq!(titles(search(&listings, &criteria)), vec!["Lekki Studio"]);

    let blank = SearchCriteria {
        location: Some("   ".to_string()),
        ..SearchCriteria::default()
    };
    assert_eq!(search(&listings, &blank).len(), 2);
}

#[test]
fn price_bounds_are_inclusive() {
    let listings = catalogue();
    let criteria = SearchCriteria {
        min_price: Some(15000.0),
        max_price: Some(15000.0),
        ..SearchCriteria::default()
    };
    assert_eq!(titles(search(&listings, &criteria)), vec!["Lekki Studio"]);

    let too_cheap = SearchCriteria {
        max_price: Some(10000.0),
        ..SearchCriteria::default()
    };
    assert!(search(&listings, &too_cheap).is_empty());
}

#[test]
fn dates_must_fall_inside_availability_window() {
    let listings = catalogue();
    let inside = SearchCriteria {
        date_from: Some(date(2024, 4, 1)),
        date_to: Some(date(2024, 4, 10)),
        ..SearchCriteria::default()
    };
    assert_eq!(search(&listings, &inside).len(), 2);

    let late_checkout = SearchCriteria {
        date_to: Some(date(2024, 8, 10)),
        ..SearchCriteria::default()
    };
    assert_eq!(titles(search(&listings, &late_checkout)), vec!["Lekki Studio"]);

    let early_checkin = SearchCriteria {
        date_from: Some(date(2024, 2, 1)),
        ..SearchCriteria::default()
    };
    assert_eq!(titles(search(&listings, &early_checkin)), vec!["Lekki Studio"]);
}

#[test]
fn every_selected_amenity_is_required() {
    let listings = catalogue();
    let criteria = SearchCriteria {
        amenities: BTreeSet::from([Amenity::WiFi, Amenity::AirConditioning]),
        ..SearchCriteria::default()
    };
    assert_eq!(titles(search(&listings, &criteria)), vec!["Lekki Studio"]);

    let mixed = SearchCriteria {
        amenities: BTreeSet::from([Amenity::WiFi, Amenity::Generator]),
        ..SearchCriteria::default()
    };
    assert!(search(&listings, &mixed).is_empty());
}

#[test]
fn criteria_deserialize_from_search_form_with_blank_dates() {
    let criteria: SearchCriteria = serde_json::from_value(serde_json::json!({
        "location": "Lagos",
        "date_from": "",
        "date_to": "2024-05-01",
        "amenities": ["Wi-Fi"],
    }))
    .expect("deserializes");

    assert_eq!(criteria.date_from, None);
    assert_eq!(criteria.date_to, Some(date(2024, 5, 1)));
    assert!(criteria.amenities.contains(&Amenity::WiFi));
    assert_eq!(criteria.min_price, None);
}

#[test]
fn price_bounds_accept_form_text() {
    let criteria: SearchCriteria = serde_json::from_value(serde_json::json!({
        "min_price": " 15000 ",
        "max_price": "",
    }))
    .expect("deserializes");
    assert_eq!(criteria.min_price, Some(15000.0));
    assert_eq!(criteria.max_price, None);

    let numeric: SearchCriteria =
        serde_json::from_value(serde_json::json!({ "min_price": 9000, "max_price": 12000.5 }))
            .expect("deserializes");
    assert_eq!(numeric.min_price, Some(9000.0));
    assert_eq!(numeric.max_price, Some(12000.5));

    let err = serde_json::from_value::<SearchCriteria>(serde_json::json!({
        "max_price": "cheap",
    }))
    .unwrap_err();
    assert!(err.to_string().contains("as a price"));
}
