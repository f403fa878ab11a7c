//! API handlers for the Vendora backend

pub mod admin;
pub mod disputes;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;
pub mod wallets;

pub use admin::*;
pub use disputes::*;
pub use inventory::*;
pub use orders::*;
pub use payments::*;
pub use products::*;
pub use users::*;
pub use wallets::*;
