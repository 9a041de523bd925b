use crate::catalog::Catalog;
use crate::domain::booking::{BookingDraft, BookingRequest, FormField};
use crate::domain::tour::TourId;
use crate::errors::BookingError;

/// Checks a raw submission against the catalog, in the order clients expect
/// errors to be reported, and prices the accepted booking.
pub fn validate_booking(
    catalog: &Catalog,
    request: &BookingRequest,
) -> Result<BookingDraft, BookingError> {
    let tour = request
        .tour_id
        .as_ref()
        .and_then(FormField::as_i64)
        .and_then(|id| u32::try_from(id).ok())
        .and_then(|id| catalog.find(TourId(id)))
        .ok_or(BookingError::InvalidTour)?;

    let first_name = required(&request.first_name);
    let last_name = required(&request.last_name);
    let (Some(first_name), Some(last_name)) = (first_name, last_name) else {
        return Err(BookingError::MissingName);
    };

    let email = normalize_email(&required(&request.email).unwrap_or_default());
    if email.is_empty() || !email.contains('@') {
        return Err(BookingError::InvalidEmail);
    }

    let phone = required(&request.phone).ok_or(BookingError::MissingPhone)?;

    let date = request
        .date
        .as_ref()
        .and_then(FormField::as_str)
        .filter(|date| tour.offers_date(date))
        .ok_or(BookingError::InvalidDate)?;

    let guests = request
        .guests
        .as_ref()
        .and_then(FormField::as_i64)
        .filter(|guests| *guests >= 1)
        .ok_or(BookingError::InvalidGuests)?;
    if guests > i64::from(tour.max_group_size) {
        return Err(BookingError::TooManyGuests { max: tour.max_group_size });
    }
    let guests = u32::try_from(guests).map_err(|_| BookingError::InvalidGuests)?;

    Ok(BookingDraft {
        tour_id: tour.id,
        tour_title: tour.title.clone(),
        first_name,
        last_name,
        email,
        phone,
        date: date.to_owned(),
        guests,
        // Stored as sent.
        special_requests: request
            .special_requests
            .as_ref()
            .and_then(FormField::raw)
            .unwrap_or_default(),
        total_price: tour.total_price(guests),
    })
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn required(value: &Option<FormField>) -> Option<String> {
    value.as_ref().and_then(FormField::text)
}

#[cfg(test)]
mod tests {
    use super::validate_booking;
    use crate::catalog::Catalog;
    use crate::domain::booking::{BookingRequest, FormField};
    use crate::domain::tour::TourId;
    use crate::errors::BookingError;

    fn catalog() -> Catalog {
        Catalog::builtin().expect("built-in catalog should parse")
    }

    fn valid_request() -> BookingRequest {
        BookingRequest {
            tour_id: Some(FormField::from(1)),
            first_name: Some(FormField::from("Ada")),
            last_name: Some(FormField::from("Lovelace")),
            email: Some(FormField::from("  Ada@Example.COM ")),
            phone: Some(FormField::from("+1 555 0100")),
            date: Some(FormField::from("2025-07-20")),
            guests: Some(FormField::from(3)),
            special_requests: None,
        }
    }

    #[test]
    fn valid_request_is_priced_and_normalized() {
        let draft = validate_booking(&catalog(), &valid_request()).expect("request should validate");

        assert_eq!(draft.tour_id, TourId(1));
        assert_eq!(draft.tour_title, "Explore the Swiss Alps");
        assert_eq!(draft.email, "ada@example.com");
        assert_eq!(draft.total_price, 2499 * 3);
        assert_eq!(draft.special_requests, "");
    }

    #[test]
    fn string_ids_and_guest_counts_are_accepted() {
        let request = BookingRequest {
            tour_id: Some(FormField::from("4")),
            date: Some(FormField::from("2025-04-01")),
            guests: Some(FormField::from("2")),
            ..valid_request()
        };
        let draft = validate_booking(&catalog(), &request).expect("request should validate");
        assert_eq!(draft.total_price, 4199 * 2);
    }

    #[test]
    fn unknown_tour_is_reported_first() {
        let request = BookingRequest {
            tour_id: Some(FormField::from(99)),
            first_name: None,
            email: None,
            ..valid_request()
        };
        assert_eq!(validate_booking(&catalog(), &request), Err(BookingError::InvalidTour));
    }

    #[test]
    fn each_field_failure_uses_its_own_error() {
        let catalog = catalog();
        let cases = [
            (BookingRequest { last_name: Some(FormField::from("   ")), ..valid_request() }, BookingError::MissingName),
            (BookingRequest { email: Some(FormField::from("not-an-email")), ..valid_request() }, BookingError::InvalidEmail),
            (BookingRequest { phone: None, ..valid_request() }, BookingError::MissingPhone),
            (BookingRequest { date: Some(FormField::from("2030-01-01")), ..valid_request() }, BookingError::InvalidDate),
            (BookingRequest { guests: Some(FormField::from(0)), ..valid_request() }, BookingError::InvalidGuests),
            (BookingRequest { guests: Some(FormField::from("many")), ..valid_request() }, BookingError::InvalidGuests),
        ];

        for (request, expected) in cases {
            assert_eq!(validate_booking(&catalog, &request), Err(expected));
        }
    }

    #[test]
    fn group_size_limit_names_the_tour_maximum() {
        let catalog = catalog();
        for tour in catalog.tours() {
            let request = BookingRequest {
                tour_id: Some(FormField::from(i64::from(tour.id.0))),
                date: tour.dates.first().map(|date| FormField::from(date.as_str())),
                guests: Some(FormField::from(i64::from(tour.max_group_size) + 1)),
                ..valid_request()
            };
            let error = validate_booking(&catalog, &request).expect_err("over capacity");
            assert_eq!(
                error.to_string(),
                format!("Maximum guests for this tour is {}.", tour.max_group_size)
            );
        }
    }

    #[test]
    fn every_valid_booking_prices_price_times_guests_on_an_offered_date() {
        let catalog = catalog();
        for tour in catalog.tours() {
            for date in &tour.dates {
                for guests in 1..=tour.max_group_size {
                    let request = BookingRequest {
                        tour_id: Some(FormField::from(i64::from(tour.id.0))),
                        date: Some(FormField::from(date.as_str())),
                        guests: Some(FormField::from(i64::from(guests))),
                        ..valid_request()
                    };
                    let draft = validate_booking(&catalog, &request).expect("valid booking");
                    assert_eq!(draft.total_price, tour.price * i64::from(guests));
                    assert!(tour.offers_date(&draft.date));
                }
            }
        }
    }

    #[test]
    fn mistyped_values_fail_on_their_own_field() {
        let catalog = catalog();
        let cases = [
            (BookingRequest { tour_id: Some(FormField::from(serde_json::json!(true))), ..valid_request() }, BookingError::InvalidTour),
            (BookingRequest { first_name: Some(FormField::from(serde_json::json!(false))), ..valid_request() }, BookingError::MissingName),
            (BookingRequest { date: Some(FormField::from(20250720)), ..valid_request() }, BookingError::InvalidDate),
            (BookingRequest { guests: Some(FormField::from(serde_json::json!(true))), ..valid_request() }, BookingError::InvalidGuests),
        ];

        for (request, expected) in cases {
            assert_eq!(validate_booking(&catalog, &request), Err(expected));
        }
    }

    #[test]
    fn numeric_phone_is_accepted_as_text() {
        let request = BookingRequest { phone: Some(FormField::from(5_550_100)), ..valid_request() };
        let draft = validate_booking(&catalog(), &request).expect("numeric phone should validate");
        assert_eq!(draft.phone, "5550100");
    }

    #[test]
    fn special_requests_are_kept_verbatim() {
        let request = BookingRequest {
            special_requests: Some(FormField::from("  window seat, please  ")),
            ..valid_request()
        };
        let draft = validate_booking(&catalog(), &request).expect("request should validate");
        assert_eq!(draft.special_requests, "  window seat, please  ");
    }
}
