//! Presence protocol selection by server version

mod decision;

pub use decision::{
    ProtocolDecision, ProtocolGeneration, StatusChannel, EXPLICIT_IDS_SINCE,
    PRESENCE_ENDPOINT_SINCE, PRESENCE_STREAM_SINCE,
};
