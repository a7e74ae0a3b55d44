use norns_edit::channel::{OutgoingCommand, QueuedChannel};
use norns_edit::transport::MemoryTransport;
use norns_edit::{Category, EditSession};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const AWAKE: &str = "/scripts/awake/awake.lua";
pub const NOTES: &str = "/scripts/awake/lib/notes.lua";
pub const LIB: &str = "/scripts/awake/lib";
pub const MLR: &str = "/scripts/mlr/mlr.lua";

pub fn dust_host() -> Arc<MemoryTransport> {
    Arc::new(
        MemoryTransport::new()
            .with_file(AWAKE, "-- awake")
            .with_file(NOTES, "return {}")
            .with_file(MLR, "-- mlr")
            .with_file("/data/awake/pset-01.pset", "bpm: 98"),
    )
}

pub fn session_on(host: &Arc<MemoryTransport>) -> (EditSession, UnboundedReceiver<OutgoingCommand>) {
    let (channel, rx) = QueuedChannel::new();
    (EditSession::new(host.clone(), Arc::new(channel)), rx)
}

/// Session with the scripts category already listed
pub async fn listed_session(
    host: &Arc<MemoryTransport>,
) -> (EditSession, UnboundedReceiver<OutgoingCommand>) {
    let (session, rx) = session_on(host);
    session.list(Category::Scripts).await.unwrap();
    (session, rx)
}
