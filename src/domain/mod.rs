//! Pricing domain: value objects, aggregates and the resolver service.
pub mod value_objects;
pub mod aggregates;
pub mod services;
