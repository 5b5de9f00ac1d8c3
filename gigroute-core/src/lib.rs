pub mod tour_stop;
pub mod expense;
pub mod repository;

pub use tour_stop::{TicketTier, TourStop, TourStopStatus, VenueRef};
pub use expense::{ExpenseCategory, PromoterExpense};
pub use repository::TourStopRepository;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Tour stop cannot move from {from} to {to}")]
    InvalidTransition {
        from: TourStopStatus,
        to: TourStopStatus,
    },
    #[error("Unknown value for {field}: {value:?}")]
    UnknownVariant {
        field: &'static str,
        value: String,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
