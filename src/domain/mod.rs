//! Domain types and the ports the application layer depends on.

pub mod basket;
pub mod money;
pub mod notification;
pub mod order;
pub mod ports;
