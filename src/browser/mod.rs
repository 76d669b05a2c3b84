pub mod connection;
pub mod page_events;

pub use connection::connect_to_browser_and_page;
pub use page_events::watch_page_events;
