use std::collections::BTreeSet;
use std::sync::Arc;

use anna_rental::dates::parse_date;
use anna_rental::error::AppError;
use anna_rental::identity::{
    Credentials, IdentityProvider, LocalIdentityProvider, Role, Session,
};
use anna_rental::marketplace::bookings::{BookingPartition, BookingRequest};
use anna_rental::marketplace::listings::{
    Amenity, AvailabilityForm, ListingDraft, ListingForm, SearchCriteria,
};
use anna_rental::marketplace::Marketplace;
use anna_rental::storage::{BookingStore, JsonCollection, ListingStore};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date used to split bookings into upcoming and past (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

type DemoMarketplace = Marketplace<ListingStore, BookingStore>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let identity = Arc::new(LocalIdentityProvider::default());
    let listings: Arc<ListingStore> = Arc::new(JsonCollection::in_memory());
    let bookings: Arc<BookingStore> = Arc::new(JsonCollection::in_memory());
    let marketplace = Marketplace::new(identity.clone(), listings, bookings);

    println!("Rental marketplace demo (today = {today})");

    let Some(landlord) = demo_account(&identity, "landlord@example.com", Role::Landlord) else {
        return Ok(());
    };
    let Some(tenant) = demo_account(&identity, "tenant@example.com", Role::Tenant) else {
        return Ok(());
    };

    println!("\nListing editor");
    let mut short_form = lekki_studio_form();
    short_form.images.truncate(2);
    if let Err(err) = marketplace.listings.preview(ListingDraft::new(short_form)) {
        println!("- Draft with two images rejected: {err}");
    }
    let preview = match marketplace
        .listings
        .preview(ListingDraft::new(lekki_studio_form()))
    {
        Ok(preview) => preview,
        Err(err) => {
            println!("- Preview failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- Preview: {} | {} | {} per night | {} images",
        preview.title,
        preview.location,
        preview.price,
        preview.images.len()
    );
    let listing = match marketplace
        .listings
        .publish(landlord.user_id(), lekki_studio_form(), Utc::now())
    {
        Ok(listing) => listing,
        Err(err) => {
            println!("- Publish failed: {err}");
            return Ok(());
        }
    };
    println!("- Published {} ({})", listing.title, listing.id);

    println!("\nLandlord management");
    render_landlord_listings(&marketplace, &landlord);
    match marketplace
        .listings
        .toggle_status(landlord.user_id(), &listing.id)
    {
        Ok(paused) => println!("- Toggled to {}", paused.status.label()),
        Err(err) => println!("- Toggle failed: {err}"),
    }
    render_search(&marketplace, "after pausing");
    render_landlord_listings(&marketplace, &landlord);
    if let Err(err) = marketplace
        .listings
        .toggle_status(landlord.user_id(), &listing.id)
    {
        println!("- Resume failed: {err}");
        return Ok(());
    }
    render_search(&marketplace, "after resuming");

    println!("\nTenant bookings");
    let (Some(check_in), Some(check_out)) = (
        NaiveDate::from_ymd_opt(2024, 2, 1),
        NaiveDate::from_ymd_opt(2024, 2, 5),
    ) else {
        return Ok(());
    };
    let stay = BookingRequest::new(check_in, check_out);
    match marketplace
        .bookings
        .book(tenant.user_id(), &listing.id, &stay, Utc::now())
    {
        Ok(booking) => println!(
            "- Booked {} from {} to {} ({} nights)",
            booking.listing.title,
            booking.check_in,
            booking.check_out,
            booking.nights()
        ),
        Err(err) => println!("- Booking failed: {err}"),
    }

    let reversed = BookingRequest::new(check_out, check_in);
    if let Err(err) = marketplace
        .bookings
        .book(tenant.user_id(), &listing.id, &reversed, Utc::now())
    {
        println!("- Reversed dates rejected: {err}");
    }

    match marketplace.bookings.bookings_for(tenant.user_id(), today) {
        Ok(partition) => render_partition(&partition),
        Err(err) => println!("- Unable to list bookings: {err}"),
    }

    Ok(())
}

fn demo_account(
    identity: &LocalIdentityProvider,
    email: &str,
    role: Role,
) -> Option<Session> {
    let password = "demo-pass";
    let signed_in = identity
        .register(email, password, role)
        .and_then(|registration| identity.verify_email(&registration.verification_code))
        .and_then(|_| {
            identity.sign_in(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
        });

    match signed_in {
        Ok(session) => {
            println!("- {} signed in as {}", email, session.role().label());
            Some(session)
        }
        Err(err) => {
            println!("- Unable to sign in {email}: {err}");
            None
        }
    }
}

fn lekki_studio_form() -> ListingForm {
    ListingForm {
        title: "Lekki Studio".to_string(),
        description: "Bright self-contained studio a short walk from the beach".to_string(),
        location: "Lekki, Lagos".to_string(),
        amenities: BTreeSet::from([Amenity::WiFi, Amenity::AirConditioning, Amenity::Generator]),
        price: "15000".to_string(),
        availability: AvailabilityForm {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 12, 31),
        },
        images: vec![
            "lekki-studio-1.jpg".to_string(),
            "lekki-studio-2.jpg".to_string(),
            "lekki-studio-3.jpg".to_string(),
        ],
    }
}

fn render_landlord_listings(marketplace: &DemoMarketplace, landlord: &Session) {
    match marketplace.listings.listings_for(landlord.user_id()) {
        Ok(listings) => {
            for listing in listings {
                println!("  - {} [{}]", listing.title, listing.status.label());
            }
        }
        Err(err) => println!("  Unable to list landlord listings: {err}"),
    }
}

fn render_search(marketplace: &DemoMarketplace, label: &str) {
    let criteria = SearchCriteria {
        location: Some("lekki".to_string()),
        ..SearchCriteria::default()
    };
    match marketplace.listings.search(&criteria) {
        Ok(found) => println!("- Search for 'lekki' {label}: {} result(s)", found.len()),
        Err(err) => println!("- Search failed: {err}"),
    }
}

fn render_partition(partition: &BookingPartition) {
    let counts = partition.counts();
    println!(
        "- As of {}: {} upcoming, {} past",
        partition.today, counts.upcoming, counts.past
    );
    for booking in &partition.upcoming {
        println!("  upcoming: {} ({})", booking.listing.title, booking.check_in);
    }
    for booking in &partition.past {
        println!("  past: {} ({})", booking.listing.title, booking.check_in);
    }
}
