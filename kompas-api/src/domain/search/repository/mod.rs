mod mock;
mod postgres;

pub use mock::MockSearchStore;
pub use postgres::PgSearchStore;
