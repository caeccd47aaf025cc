//! HTTP-facing layer: routes, controllers and wire types

pub mod controller;
pub mod dto;
pub mod routes;
pub mod util;
