pub mod dto;
pub mod model;
pub mod script;
pub mod service;
