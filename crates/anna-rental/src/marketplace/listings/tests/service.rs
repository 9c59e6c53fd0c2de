use std::sync::Arc;

use chrono::Duration;

use super::common::*;

use crate::identity::UserId;
use crate::marketplace::listings::domain::ListingStatus;
use crate::marketplace::listings::{
    ListingCounts, ListingDraft, ListingService, ListingServiceError, ListingValidationError,
    SearchCriteria,
};
use crate::storage::RepositoryError;

#[test]
fn publish_stores_validated_listing() {
    let (service, repository) = build_service();
    let owner = UserId::generate();

    let listing = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");

    assert_eq!(repository.snapshot(), vec![listing.clone()]);
    assert_eq!(listing.status, ListingStatus::Active);
    assert_eq!(service.get(&listing.id).expect("found"), listing);
}

#[test]
fn invalid_form_is_not_persisted() {
    let (service, repository) = build_service();
    let mut form = lekki_form();
    form.images.truncate(2);

    let err = service
        .publish(&UserId::generate(), form, published_at())
        .expect_err("rejected");

    assert!(matches!(
        err,
        ListingServiceError::Validation(ListingValidationError::NotEnoughImages { found: 2, .. })
    ));
    assert!(repository.snapshot().is_empty());
}

#[test]
fn preview_does_not_touch_the_store() {
    let (service, repository) = build_service();
    let preview = service
        .preview(ListingDraft::new(lekki_form()))
        .expect("previews");

    assert_eq!(preview.title, "Lekki Studio");
    assert!(repository.snapshot().is_empty());
}

#[test]
fn update_replaces_fields_in_place() {
    let (service, repository) = build_service();
    let owner = UserId::generate();
    let first = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");
    let second = service
        .publish(&owner, ikeja_form(), published_at() + Duration::minutes(5))
        .expect("publishes");

    let mut form = service
        .draft_for_edit(&owner, &first.id)
        .expect("draft")
        .form()
        .clone();
    form.title = "Lekki Studio (renovated)".to_string();
    let edited_at = published_at() + Duration::days(1);
    let updated = service
        .update(&owner, &first.id, form, edited_at)
        .expect("updates");

    let stored = repository.snapshot();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], updated);
    assert_eq!(stored[1], second);
    assert_eq!(updated.title, "Lekki Studio (renovated)");
    assert_eq!(updated.updated_at, Some(edited_at));
    assert_eq!(updated.created_at, first.created_at);
}

#[test]
fn invalid_update_keeps_the_stored_listing() {
    let (service, repository) = build_service();
    let owner = UserId::generate();
    let listing = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");

    let mut form = lekki_form();
    form.title.clear();
    let err = service
        .update(&owner, &listing.id, form, published_at())
        .expect_err("rejected");

    assert!(matches!(err, ListingServiceError::Validation(_)));
    assert_eq!(repository.snapshot(), vec![listing]);
}

#[test]
fn toggle_status_flips_between_active_and_paused() {
    let (service, _) = build_service();
    let owner = UserId::generate();
    let listing = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");

    let paused = service.toggle_status(&owner, &listing.id).expect("pauses");
    assert_eq!(paused.status, ListingStatus::Paused);
    assert!(service.browse().expect("browses").is_empty());

    let active = service.toggle_status(&owner, &listing.id).expect("resumes");
    assert_eq!(active.status, ListingStatus::Active);
    assert_eq!(service.browse().expect("browses").len(), 1);
}

#[test]
fn delete_removes_only_the_addressed_listing() {
    let (service, repository) = build_service();
    let owner = UserId::generate();
    let lekki = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");
    let ikeja = service
        .publish(&owner, ikeja_form(), published_at() + Duration::minutes(1))
        .expect("publishes");

    let removed = service.delete(&owner, &lekki.id).expect("deletes");
    assert_eq!(removed.id, lekki.id);
    assert_eq!(repository.snapshot(), vec![ikeja]);

    let err = service.delete(&owner, &lekki.id).expect_err("already gone");
    assert!(matches!(err, ListingServiceError::NotFound(id) if id == lekki.id));
}

#[test]
fn other_landlords_cannot_manage_a_listing() {
    let (service, repository) = build_service();
    let owner = UserId::generate();
    let intruder = UserId::generate();
    let listing = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");

    assert!(matches!(
        service.toggle_status(&intruder, &listing.id),
        Err(ListingServiceError::NotOwner(_))
    ));
    assert!(matches!(
        service.delete(&intruder, &listing.id),
        Err(ListingServiceError::NotOwner(_))
    ));
    assert!(matches!(
        service.draft_for_edit(&intruder, &listing.id),
        Err(ListingServiceError::NotOwner(_))
    ));
    assert_eq!(repository.snapshot(), vec![listing]);
}

#[test]
fn listings_for_scopes_to_owner_and_counts_statuses() {
    let (service, _) = build_service();
    let owner = UserId::generate();
    let other = UserId::generate();
    let lekki = service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");
    service
        .publish(&owner, ikeja_form(), published_at() + Duration::minutes(1))
        .expect("publishes");
    service
        .publish(&other, ikeja_form(), published_at() + Duration::minutes(2))
        .expect("publishes");
    service.toggle_status(&owner, &lekki.id).expect("pauses");

    let mine = service.listings_for(&owner).expect("lists");
    assert_eq!(mine.len(), 2);
    assert_eq!(
        ListingCounts::tally(&mine),
        ListingCounts {
            total: 2,
            active: 1,
            paused: 1,
        }
    );
}

#[test]
fn search_reads_through_the_repository() {
    let (service, _) = build_service();
    let owner = UserId::generate();
    service
        .publish(&owner, lekki_form(), published_at())
        .expect("publishes");
    service
        .publish(&owner, ikeja_form(), published_at() + Duration::minutes(1))
        .expect("publishes");

    let criteria = SearchCriteria {
        location: Some("ikeja".to_string()),
        ..SearchCriteria::default()
    };
    let found = service.search(&criteria).expect("searches");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Ikeja Two Bedroom");
}

#[test]
fn repository_failures_surface_as_repository_errors() {
    let service = ListingService::new(Arc::new(UnavailableRepository));

    let err = service
        .publish(&UserId::generate(), lekki_form(), published_at())
        .expect_err("fails");
    assert!(matches!(
        err,
        ListingServiceError::Repository(RepositoryError::Unavailable(_))
    ));
    assert!(matches!(
        service.browse(),
        Err(ListingServiceError::Repository(_))
    ));
}
