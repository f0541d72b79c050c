mod bookkeeping;
mod events;
mod rent;

pub use bookkeeping::BookkeepingSystem;
pub use events::{apply_event, MarketEventSystem};
pub use rent::RentSystem;
