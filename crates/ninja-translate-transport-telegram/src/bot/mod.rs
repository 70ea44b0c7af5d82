/// Live channel-membership checks through the Bot API
pub mod channels;
/// Execution of dispatcher replies against the Bot API
pub mod delivery;
/// Command definitions and the mapping from updates to inbound events
pub mod handlers;

pub use channels::TelegramChannelDirectory;
