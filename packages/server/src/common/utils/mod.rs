// Shared utility functions

pub mod geo;

pub use geo::distance_km;
