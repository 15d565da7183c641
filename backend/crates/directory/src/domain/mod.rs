//! Domain Layer

pub mod catalog;

pub use catalog::{Catalog, CategoryGroup, Service, ServiceAccess, ServiceCategory};
