//! API DTOs

pub mod replica_dto;
