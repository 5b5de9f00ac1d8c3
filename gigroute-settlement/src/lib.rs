pub mod calculator;
pub mod error;
pub mod export;
pub mod input;
pub mod models;
mod projection;
pub mod service;
pub mod tour;

pub use calculator::{SettlementCalculator, SettlementConfig};
pub use error::{SettlementError, SettlementResult};
pub use export::{CsvExporter, ExportError, JsonExporter, SettlementExporter, SettlementSheet};
pub use input::{BoxOffice, ExpenseInput, SettlementInput, TierSales};
pub use models::{ExpenseLine, PaymentType, Settlement, TierLine};
pub use service::{ServiceError, ServiceResult, SettlementService};
pub use tour::{CurrencyTotals, SkippedStop, TourReport, TourSummary};
