use chrono::NaiveDate;
use gigroute_core::{TourStop, TourStopStatus};
use gigroute_shared::format_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Settlement;
use crate::tour::TourReport;

/// A settlement together with the show it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementSheet {
    pub tour_stop_id: Uuid,
    pub tour_id: Option<Uuid>,
    pub date: NaiveDate,
    pub venue_name: Option<String>,
    pub venue_city: Option<String>,
    pub venue_country: Option<String>,
    pub status: TourStopStatus,
    pub settlement: Settlement,
}

impl SettlementSheet {
    pub fn new(stop: &TourStop, settlement: Settlement) -> Self {
        let venue = stop.venue.as_ref();
        Self {
            tour_stop_id: stop.id,
            tour_id: stop.tour_id,
            date: stop.date,
            venue_name: venue.map(|v| v.name.clone()),
            venue_city: venue.and_then(|v| v.city.clone()),
            venue_country: venue.and_then(|v| v.country.clone()),
            status: stop.status,
            settlement,
        }
    }

    /// "2026-05-02 La Cigale, Paris"
    pub fn title(&self) -> String {
        let mut title = self.date.to_string();
        if let Some(name) = &self.venue_name {
            title.push(' ');
            title.push_str(name);
        }
        if let Some(city) = &self.venue_city {
            title.push_str(", ");
            title.push_str(city);
        }
        title
    }

    /// One-line outcome, e.g. for logs and notifications
    pub fn headline(&self) -> String {
        let s = &self.settlement;
        format!(
            "{}: artist {} ({}), promoter net {}",
            self.title(),
            format_money(s.artist_payment, &s.currency),
            s.payment_type.as_str(),
            format_money(s.promoter_net, &s.currency),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to flush export buffer: {0}")]
    Io(String),
}

/// Renders settlement sheets into a downloadable document
pub trait SettlementExporter: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn export_sheet(&self, sheet: &SettlementSheet) -> Result<Vec<u8>, ExportError>;

    fn export_tour(&self, report: &TourReport) -> Result<Vec<u8>, ExportError>;
}

/// Two-decimal rendering used in every exported amount
fn amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn optional(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Spreadsheet-friendly CSV.
///
/// A single sheet is written as `line,amount,currency` rows. A tour report
/// is one row per stop followed by a `TOTAL` row per currency.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
        writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.error().to_string()))
    }
}

impl SettlementExporter for CsvExporter {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn export_sheet(&self, sheet: &SettlementSheet) -> Result<Vec<u8>, ExportError> {
        let s = &sheet.settlement;
        let currency = s.currency.as_str();
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());

        wtr.write_record(["line", "amount", "currency"])?;
        wtr.write_record(["show", sheet.title().as_str(), ""])?;
        wtr.write_record(["tickets_sold", s.tickets_sold.to_string().as_str(), ""])?;
        wtr.write_record(["capacity", s.capacity.to_string().as_str(), ""])?;
        wtr.write_record(["fill_rate_percent", s.fill_rate.to_string().as_str(), ""])?;
        for tier in &s.tiers {
            let line = format!("tier:{} ({} x {})", tier.name, tier.sold, amount(tier.price));
            wtr.write_record([line.as_str(), amount(tier.revenue).as_str(), currency])?;
        }
        wtr.write_record(["gbor", amount(s.gbor).as_str(), currency])?;
        wtr.write_record(["ticketing_fees", amount(s.ticketing_fees).as_str(), currency])?;
        wtr.write_record(["nbor", amount(s.nbor).as_str(), currency])?;
        wtr.write_record(["guaranteed_fee", amount(s.guaranteed_fee).as_str(), currency])?;
        wtr.write_record(["door_deal_payout", amount(s.door_deal_payout).as_str(), currency])?;
        wtr.write_record(["artist_payment", amount(s.artist_payment).as_str(), currency])?;
        wtr.write_record(["payment_type", s.payment_type.as_str(), ""])?;
        for expense in &s.expenses {
            let line = format!("expense:{} [{}]", expense.label, expense.category);
            wtr.write_record([line.as_str(), amount(expense.amount).as_str(), currency])?;
        }
        wtr.write_record(["total_promoter_expenses", amount(s.total_promoter_expenses).as_str(), currency])?;
        wtr.write_record(["promoter_net", amount(s.promoter_net).as_str(), currency])?;
        wtr.write_record(["split_point_tickets", optional(s.split_point_tickets).as_str(), ""])?;
        wtr.write_record(["break_even_tickets", optional(s.break_even_tickets).as_str(), ""])?;

        Self::finish(wtr)
    }

    fn export_tour(&self, report: &TourReport) -> Result<Vec<u8>, ExportError> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());

        wtr.write_record([
            "date",
            "venue",
            "city",
            "status",
            "tickets_sold",
            "capacity",
            "fill_rate_percent",
            "gbor",
            "ticketing_fees",
            "nbor",
            "artist_payment",
            "payment_type",
            "promoter_expenses",
            "promoter_net",
            "currency",
        ])?;

        for sheet in &report.stops {
            let s = &sheet.settlement;
            wtr.write_record([
                sheet.date.to_string().as_str(),
                sheet.venue_name.as_deref().unwrap_or(""),
                sheet.venue_city.as_deref().unwrap_or(""),
                sheet.status.as_str(),
                s.tickets_sold.to_string().as_str(),
                s.capacity.to_string().as_str(),
                s.fill_rate.to_string().as_str(),
                amount(s.gbor).as_str(),
                amount(s.ticketing_fees).as_str(),
                amount(s.nbor).as_str(),
                amount(s.artist_payment).as_str(),
                s.payment_type.as_str(),
                amount(s.total_promoter_expenses).as_str(),
                amount(s.promoter_net).as_str(),
                s.currency.as_str(),
            ])?;
        }

        for (currency, totals) in &report.summary.by_currency {
            wtr.write_record([
                "TOTAL",
                format!("{} stops", totals.stops).as_str(),
                "",
                "",
                totals.tickets_sold.to_string().as_str(),
                totals.capacity.to_string().as_str(),
                totals.fill_rate.to_string().as_str(),
                amount(totals.gbor).as_str(),
                amount(totals.ticketing_fees).as_str(),
                amount(totals.nbor).as_str(),
                amount(totals.artist_payments).as_str(),
                "",
                amount(totals.promoter_expenses).as_str(),
                amount(totals.promoter_net).as_str(),
                currency.as_str(),
            ])?;
        }

        Self::finish(wtr)
    }
}

/// Pretty-printed JSON of the same structures the API returns
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl SettlementExporter for JsonExporter {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn export_sheet(&self, sheet: &SettlementSheet) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(sheet)?)
    }

    fn export_tour(&self, report: &TourReport) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SettlementCalculator, SettlementInput};
    use gigroute_core::{ExpenseCategory, VenueRef};
    use rust_decimal_macros::dec;

    fn sheet() -> SettlementSheet {
        let mut stop = TourStop::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 5, 2).unwrap());
        stop.venue = Some(VenueRef {
            id: None,
            name: "La Cigale".to_string(),
            city: Some("Paris".to_string()),
            country: Some("FR".to_string()),
            capacity: Some(250),
        });
        let input = SettlementInput::flat(dec!(30), 200, 250, dec!(10), dec!(2000), dec!(80), "EUR")
            .with_expense("Security, stewards", ExpenseCategory::Security, dec!(500), "EUR");
        let settlement = SettlementCalculator::default().calculate(&input).unwrap();
        SettlementSheet::new(&stop, settlement)
    }

    fn csv_rows(bytes: &[u8]) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(bytes)
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn find<'a>(rows: &'a [Vec<String>], line: &str) -> &'a Vec<String> {
        rows.iter().find(|r| r[0] == line).unwrap()
    }

    #[test]
    fn test_sheet_title() {
        assert_eq!(sheet().title(), "2026-05-02 La Cigale, Paris");
    }

    #[test]
    fn test_sheet_headline() {
        assert_eq!(
            sheet().headline(),
            "2026-05-02 La Cigale, Paris: artist €4,320.00 (door_deal), promoter net €580.00"
        );
    }

    #[test]
    fn test_csv_sheet_lines() {
        let bytes = CsvExporter.export_sheet(&sheet()).unwrap();
        let rows = csv_rows(&bytes);

        assert_eq!(rows[0], vec!["line", "amount", "currency"]);
        assert_eq!(find(&rows, "gbor"), &vec!["gbor", "6000.00", "EUR"]);
        assert_eq!(find(&rows, "nbor")[1], "5400.00");
        assert_eq!(find(&rows, "artist_payment")[1], "4320.00");
        assert_eq!(find(&rows, "payment_type")[1], "door_deal");
        assert_eq!(find(&rows, "promoter_net")[1], "580.00");
        // the comma in the label is quoted, not split
        assert_eq!(find(&rows, "expense:Security, stewards [security]")[1], "500.00");
    }

    #[test]
    fn test_csv_tour_report_has_total_per_currency() {
        let paris = sheet();
        let mut london = sheet();
        let input = SettlementInput::flat(dec!(20), 150, 200, dec!(5), dec!(1500), dec!(75), "GBP");
        london.settlement = SettlementCalculator::default().calculate(&input).unwrap();

        let report = TourReport::new(Uuid::new_v4(), vec![paris, london], Vec::new()).unwrap();
        let rows = csv_rows(&CsvExporter.export_tour(&report).unwrap());

        // header, two stops, two totals
        assert_eq!(rows.len(), 5);
        let totals: Vec<_> = rows.iter().filter(|r| r[0] == "TOTAL").collect();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0][14], "EUR");
        assert_eq!(totals[1][14], "GBP");
        assert_eq!(totals[1][7], "3000.00");
    }

    #[test]
    fn test_json_sheet_round_trips() {
        let sheet = sheet();
        let bytes = JsonExporter.export_sheet(&sheet).unwrap();
        let back: SettlementSheet = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(back, sheet);
        assert_eq!(JsonExporter.content_type(), "application/json");
    }
}
