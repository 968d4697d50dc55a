pub mod builder;
pub mod composition;
pub mod dedup;
pub mod dto;
pub mod errors;
pub mod gc;
pub mod ports;
pub mod use_cases;
pub mod validation;
