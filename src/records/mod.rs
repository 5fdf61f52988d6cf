pub mod filter;
pub mod store;
pub mod table;

pub use filter::{display_price, filter_records};
pub use store::{PriceRecord, RecordField, RecordStore};
pub use table::render_table;
