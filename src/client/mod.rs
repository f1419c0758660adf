pub mod channel;
pub mod driver;
pub mod http;
pub mod tui;

pub use channel::SessionChannel;
pub use driver::SessionDriver;
pub use http::HistoryClient;
pub use tui::ValidationTui;
