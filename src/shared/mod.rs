pub mod errors;
pub mod schema;
pub mod state;
pub mod utils;
