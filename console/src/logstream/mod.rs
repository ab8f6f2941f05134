//! Live deployment console streaming
//!
//! [`ChannelRegistry`] tracks which observers watch which deployment,
//! [`Broadcaster`] records each console line and fans it out, and
//! [`SubscriptionSession`] speaks the subscribe/log message protocol on behalf
//! of one connected observer.

pub mod broadcaster;
pub mod observer;
pub mod protocol;
pub mod registry;

pub use broadcaster::Broadcaster;
pub use observer::{ChannelObserver, Observer};
pub use protocol::{ClientMessage, ServerMessage, SubscriptionSession};
pub use registry::ChannelRegistry;
