//! API route declarations (e.g., /deployments/*)

pub mod deployment_routes;
