pub mod api;
pub mod errors;
pub mod link;
pub mod types;

pub use api::{ApiClient, HistorySource, LoginResponse};
pub use errors::{MalformedEvent, TransportError};
pub use link::{ConnectRequest, Connector, LinkEvent, LinkHandle, NoopConnector, WsConnector};
pub use types::{Channel, ChannelId, ConnState, Member, MessageLine, Mode, Target};
