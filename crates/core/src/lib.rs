//! Core business logic for inkwell.
//!
//! Services sit between the HTTP layer and the repositories in
//! `inkwell-db`. Every write follows the same shape: mutate the store,
//! refresh any cached counters from the source table, then hand the
//! event to the [`NotificationService`], which persists the record and
//! pushes it through the [`Dispatcher`].

pub mod services;
pub mod views;

pub use services::*;
pub use views::{BlogSummary, NotificationView, UserSummary};
