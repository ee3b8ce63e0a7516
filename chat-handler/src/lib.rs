pub mod error;
pub mod event;
pub mod handler;
pub mod handler_state;
pub mod response;

pub use event::ChatEvent;
pub use handler::{handle, handle_options};
pub use handler_state::HandlerState;
pub use response::HandlerResponse;
