pub mod replica_service;
