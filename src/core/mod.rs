pub mod persistence;
pub mod state;
pub mod store;
pub mod util;
