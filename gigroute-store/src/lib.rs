pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod tour_stop_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory_repo::MemoryTourStopRepository;
pub use tour_stop_repo::PgTourStopRepository;
