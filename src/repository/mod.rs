//! PostgreSQL access
//!
//! Plain query functions returning materialized rows. Multi-row writes run in a
//! transaction; child rows are deleted explicitly before their parent even
//! though the schema also cascades.

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod policies;
pub mod reviews;
pub mod stores;
