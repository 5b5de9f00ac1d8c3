use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use gigroute_core::{
    PromoterExpense, TicketTier, TourStop, TourStopRepository, TourStopStatus, VenueRef,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub struct PgTourStopRepository {
    pool: PgPool,
}

impl PgTourStopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TOUR_STOP_COLUMNS: &str = r#"
    ts.id, ts.organization_id, ts.tour_id, ts.band_id, ts.date,
    ts.ticket_price, ts.ticket_fee_percent, ts.currency, ts.guarantee, ts.door_deal_percent,
    ts.tickets_sold, ts.status,
    ts.confirmed_at, ts.played_at, ts.settled_at, ts.canceled_at, ts.created_at, ts.updated_at,
    v.id AS venue_id, v.name AS venue_name, v.city AS venue_city, v.country AS venue_country,
    v.capacity AS venue_capacity
"#;

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TourStopRow {
    id: Uuid,
    organization_id: Uuid,
    tour_id: Option<Uuid>,
    band_id: Option<Uuid>,
    date: NaiveDate,
    ticket_price: Option<Decimal>,
    ticket_fee_percent: Option<Decimal>,
    currency: Option<String>,
    guarantee: Option<Decimal>,
    door_deal_percent: Option<Decimal>,
    tickets_sold: Option<i32>,
    status: String,
    confirmed_at: Option<DateTime<Utc>>,
    played_at: Option<DateTime<Utc>>,
    settled_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    venue_id: Option<Uuid>,
    venue_name: Option<String>,
    venue_city: Option<String>,
    venue_country: Option<String>,
    venue_capacity: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct TicketTierRow {
    id: Uuid,
    tour_stop_id: Uuid,
    name: String,
    price: Decimal,
    quantity_available: Option<i32>,
    sold: i32,
    sort_order: i32,
}

#[derive(sqlx::FromRow)]
struct PromoterExpenseRow {
    id: Uuid,
    tour_stop_id: Uuid,
    label: String,
    category: String,
    amount: Decimal,
    currency: String,
}

fn count(value: i32) -> Result<u32, Box<dyn std::error::Error + Send + Sync>> {
    u32::try_from(value).map_err(|_| format!("negative count in database: {}", value).into())
}

impl TicketTierRow {
    fn into_tier(self) -> Result<TicketTier, Box<dyn std::error::Error + Send + Sync>> {
        Ok(TicketTier {
            id: self.id,
            name: self.name,
            price: self.price,
            quantity_available: self.quantity_available.map(count).transpose()?,
            sold: count(self.sold)?,
            sort_order: self.sort_order,
        })
    }
}

impl TourStopRow {
    fn into_tour_stop(
        self,
        tiers: Vec<TicketTier>,
    ) -> Result<TourStop, Box<dyn std::error::Error + Send + Sync>> {
        let venue = match self.venue_name {
            Some(name) => Some(VenueRef {
                id: self.venue_id,
                name,
                city: self.venue_city,
                country: self.venue_country,
                capacity: self.venue_capacity.map(count).transpose()?,
            }),
            None => None,
        };

        Ok(TourStop {
            id: self.id,
            organization_id: self.organization_id,
            tour_id: self.tour_id,
            band_id: self.band_id,
            venue,
            date: self.date,
            ticket_price: self.ticket_price,
            ticket_fee_percent: self.ticket_fee_percent,
            currency: self.currency,
            guarantee: self.guarantee,
            door_deal_percent: self.door_deal_percent,
            tickets_sold: count(self.tickets_sold.unwrap_or(0))?,
            tiers,
            status: self.status.parse::<TourStopStatus>()?,
            confirmed_at: self.confirmed_at,
            played_at: self.played_at,
            settled_at: self.settled_at,
            canceled_at: self.canceled_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PgTourStopRepository {
    async fn tiers_by_stop(
        &self,
        stop_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TicketTier>>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<TicketTierRow> = sqlx::query_as(
            "SELECT id, tour_stop_id, name, price, quantity_available, sold, sort_order FROM ticket_tiers WHERE tour_stop_id = ANY($1) ORDER BY sort_order, name",
        )
        .bind(stop_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<TicketTier>> = HashMap::new();
        for row in rows {
            let stop_id = row.tour_stop_id;
            grouped.entry(stop_id).or_default().push(row.into_tier()?);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl TourStopRepository for PgTourStopRepository {
    async fn get_tour_stop(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TourStop>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "SELECT {} FROM tour_stops ts LEFT JOIN venues v ON v.id = ts.venue_id WHERE ts.id = $1 AND ts.organization_id = $2",
            TOUR_STOP_COLUMNS
        );
        let row: Option<TourStopRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut tiers = self.tiers_by_stop(&[id]).await?;
        let stop = row.into_tour_stop(tiers.remove(&id).unwrap_or_default())?;
        Ok(Some(stop))
    }

    async fn list_tour_stops(
        &self,
        organization_id: Uuid,
        tour_id: Uuid,
    ) -> Result<Vec<TourStop>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "SELECT {} FROM tour_stops ts LEFT JOIN venues v ON v.id = ts.venue_id WHERE ts.tour_id = $1 AND ts.organization_id = $2 ORDER BY ts.date, ts.created_at",
            TOUR_STOP_COLUMNS
        );
        let rows: Vec<TourStopRow> = sqlx::query_as(&sql)
            .bind(tour_id)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut tiers = self.tiers_by_stop(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let stop_tiers = tiers.remove(&row.id).unwrap_or_default();
                row.into_tour_stop(stop_tiers)
            })
            .collect()
    }

    async fn list_promoter_expenses(
        &self,
        tour_stop_id: Uuid,
    ) -> Result<Vec<PromoterExpense>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<PromoterExpenseRow> = sqlx::query_as(
            "SELECT id, tour_stop_id, label, category, amount, currency FROM promoter_expenses WHERE tour_stop_id = $1 ORDER BY created_at, id",
        )
        .bind(tour_stop_id)
        .fetch_all(&self.pool)
        .await?;

        let mut expenses = Vec::with_capacity(rows.len());
        for row in rows {
            expenses.push(PromoterExpense {
                id: row.id,
                tour_stop_id: row.tour_stop_id,
                label: row.label,
                category: row.category.parse()?,
                amount: row.amount,
                currency: row.currency,
            });
        }
        Ok(expenses)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: TourStopStatus,
        to: TourStopStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            UPDATE tour_stops SET
                status = $2,
                updated_at = $3,
                confirmed_at = CASE WHEN $2 = 'confirmed' THEN $3 ELSE confirmed_at END,
                played_at = CASE WHEN $2 = 'played' THEN $3 ELSE played_at END,
                settled_at = CASE WHEN $2 = 'settled' THEN $3 ELSE settled_at END,
                canceled_at = CASE WHEN $2 = 'canceled' THEN $3 ELSE canceled_at END
            WHERE id = $1 AND status = $4
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(changed_at)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(tour_stop_id = %id, %from, %to, "Status transition matched no row");
            return Ok(false);
        }

        tracing::debug!(tour_stop_id = %id, %from, %to, "Tour stop status updated");
        Ok(true)
    }
}
