use sqlx::Row;

use tourbook_core::domain::booking::{
    Booking, BookingContact, BookingDraft, BookingId, BookingSummary, UserId,
};
use tourbook_core::domain::tour::TourId;

use super::{BookingRepository, RepositoryError};
use crate::{timestamp_now, DbPool};

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn to_u32(value: i64, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("{column} out of range: {value}")))
}

fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<BookingSummary, RepositoryError> {
    let tour_id: i64 = decode(row.try_get("tour_id"))?;
    let guests: i64 = decode(row.try_get("guests"))?;

    Ok(BookingSummary {
        id: BookingId(decode(row.try_get("id"))?),
        tour_id: TourId(to_u32(tour_id, "tour_id")?),
        tour_title: decode(row.try_get("tour_title"))?,
        date: decode(row.try_get("date"))?,
        guests: to_u32(guests, "guests")?,
        special_requests: decode(row.try_get("special_requests"))?,
        total_price: decode(row.try_get("total_price"))?,
        created_at: decode(row.try_get("created_at"))?,
        user_id: UserId(decode(row.try_get("user_id"))?),
        first_name: decode(row.try_get("first_name"))?,
        last_name: decode(row.try_get("last_name"))?,
        email: decode(row.try_get("email"))?,
        phone: decode(row.try_get("phone"))?,
    })
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn create(&self, draft: BookingDraft) -> Result<Booking, RepositoryError> {
        let created_at = timestamp_now();
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, phone, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 phone = excluded.phone
             RETURNING id",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&created_at)
        .fetch_one(&mut *tx)
        .await?;

        let booking_id = sqlx::query(
            "INSERT INTO bookings (user_id, tour_id, tour_title, date, guests,
                                   special_requests, total_price, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(i64::from(draft.tour_id.0))
        .bind(&draft.tour_title)
        .bind(&draft.date)
        .bind(i64::from(draft.guests))
        .bind(&draft.special_requests)
        .bind(draft.total_price)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        Ok(Booking {
            id: BookingId(booking_id),
            user_id: UserId(user_id),
            tour_id: draft.tour_id,
            tour_title: draft.tour_title,
            date: draft.date,
            guests: draft.guests,
            special_requests: draft.special_requests,
            total_price: draft.total_price,
            created_at,
            user: BookingContact {
                id: UserId(user_id),
                first_name: draft.first_name,
                last_name: draft.last_name,
                email: draft.email,
                phone: draft.phone,
            },
        })
    }

    async fn list(&self) -> Result<Vec<BookingSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT b.id, b.tour_id, b.tour_title, b.date, b.guests, b.special_requests,
                    b.total_price, b.created_at,
                    u.id AS user_id, u.first_name, u.last_name, u.email, u.phone
             FROM bookings b
             JOIN users u ON u.id = b.user_id
             ORDER BY b.created_at DESC, b.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_summary).collect()
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<BookingContact>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, email, phone FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(BookingContact {
                id: UserId(decode(r.try_get("id"))?),
                first_name: decode(r.try_get("first_name"))?,
                last_name: decode(r.try_get("last_name"))?,
                email: decode(r.try_get("email"))?,
                phone: decode(r.try_get("phone"))?,
            })),
            None => Ok(None),
        }
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?;
        Ok(count)
    }
}
