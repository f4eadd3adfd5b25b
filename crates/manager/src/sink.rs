use async_trait::async_trait;
use log::debug;
use playground_protocol::{PlaygroundState, RevealTarget, ServerMessage};
use tokio::sync::mpsc;

/// Outbound side of the playground: the UI and the editor.
///
/// Fire-and-forget; a sink that cannot deliver drops the message.
#[async_trait]
pub trait PlaygroundSink: Send + Sync {
    async fn send_state(&self, state: &PlaygroundState);

    /// Asks the editor to bring a prompt into view. Hosts without an editor ignore it.
    async fn reveal(&self, _target: RevealTarget) {}
}

/// Forwards everything as [`ServerMessage`]s over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl PlaygroundSink for ChannelSink {
    async fn send_state(&self, state: &PlaygroundState) {
        if self
            .tx
            .send(ServerMessage::StateUpdate(state.clone()))
            .is_err()
        {
            debug!("State update dropped: receiver closed");
        }
    }

    async fn reveal(&self, target: RevealTarget) {
        if self.tx.send(ServerMessage::Reveal(target)).is_err() {
            debug!("Reveal request dropped: receiver closed");
        }
    }
}
