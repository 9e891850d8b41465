//! Controller layer: generic list/detail services, relation resolution, and
//! the entity cache, all driven by the schema registry.

pub mod services;
