//! Application layer: the checkout flow and the notification handler.
//!
//! Components receive their collaborators (order processor, gateway client,
//! signature validator) through their constructors as boxed port objects.

pub mod callback;
pub mod order_builder;
pub mod payment_link;
