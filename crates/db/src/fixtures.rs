use tourbook_core::catalog::Catalog;
use tourbook_core::domain::booking::{BookingRequest, FormField};
use tourbook_core::validate_booking;

use crate::connection::DbPool;
use crate::repositories::{BookingRepository, RepositoryError, SqlBookingRepository};

struct DemoBooking {
    tour_id: i64,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    phone: &'static str,
    date: &'static str,
    guests: i64,
    special_requests: &'static str,
}

/// The last entry re-uses the first traveller's email so seeding exercises the
/// update-in-place path.
const DEMO_BOOKINGS: &[DemoBooking] = &[
    DemoBooking {
        tour_id: 1,
        first_name: "Amelia",
        last_name: "Hart",
        email: "amelia.hart@example.com",
        phone: "+1 555 0101",
        date: "2025-07-20",
        guests: 2,
        special_requests: "Vegetarian meals",
    },
    DemoBooking {
        tour_id: 4,
        first_name: "Kenji",
        last_name: "Sato",
        email: "kenji.sato@example.com",
        phone: "+81 90 0000 0002",
        date: "2025-04-01",
        guests: 4,
        special_requests: "",
    },
    DemoBooking {
        tour_id: 5,
        first_name: "Zawadi",
        last_name: "Otieno",
        email: "zawadi.otieno@example.com",
        phone: "+254 700 000003",
        date: "2025-08-20",
        guests: 3,
        special_requests: "Airport pickup",
    },
    DemoBooking {
        tour_id: 10,
        first_name: "Amelia",
        last_name: "Hart-Lee",
        email: "Amelia.Hart@example.com",
        phone: "+1 555 0199",
        date: "2025-07-05",
        guests: 1,
        special_requests: "",
    },
];

/// Deterministic demo bookings used by `tourbook seed`.
pub struct DemoBookingDataset;

impl DemoBookingDataset {
    pub fn len() -> usize {
        DEMO_BOOKINGS.len()
    }

    /// Validates each demo request against `catalog` and books it. Requests that
    /// no longer fit the catalog are skipped and reported.
    pub async fn load(pool: &DbPool, catalog: &Catalog) -> Result<SeedResult, RepositoryError> {
        let repo = SqlBookingRepository::new(pool.clone());
        let mut bookings_created = 0;
        let mut skipped = Vec::new();

        for demo in DEMO_BOOKINGS {
            let request = BookingRequest {
                tour_id: Some(FormField::from(demo.tour_id)),
                first_name: Some(FormField::from(demo.first_name)),
                last_name: Some(FormField::from(demo.last_name)),
                email: Some(FormField::from(demo.email)),
                phone: Some(FormField::from(demo.phone)),
                date: Some(FormField::from(demo.date)),
                guests: Some(FormField::from(demo.guests)),
                special_requests: Some(FormField::from(demo.special_requests)),
            };

            match validate_booking(catalog, &request) {
                Ok(draft) => {
                    repo.create(draft).await?;
                    bookings_created += 1;
                }
                Err(error) => skipped.push(format!("{}: {error}", demo.email)),
            }
        }

        let users_total = repo.count_users().await?;
        Ok(SeedResult { bookings_created, users_total, skipped })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub bookings_created: usize,
    pub users_total: i64,
    pub skipped: Vec<String>,
}
