pub mod digest;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod scan;
pub mod scheduler;
pub mod state;
