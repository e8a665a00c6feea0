pub mod catalog;
pub mod crawler;
pub mod detail;
pub mod scraper_loop;
pub mod screenshot;
pub mod shutdown;
pub mod snapshot;
pub mod table;

pub use crate::domain::model::{CycleState, OutageRecord, OutageRow, RegionId, Snapshot};
pub use crate::domain::ports::{PageElement, PageSession, Storage};
pub use crate::utils::error::Result;
