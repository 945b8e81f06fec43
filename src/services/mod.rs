//! Business operations over the stores.
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod events;
pub mod inventory;

pub use analytics::{Analytics, Summary};
pub use auth::{Accounts, Claims, TokenKeys};
pub use catalog::Catalog;
pub use events::EventBus;
pub use inventory::{Inventory, Purchase};
