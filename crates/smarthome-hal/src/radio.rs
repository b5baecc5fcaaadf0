//! Radio adapters: [`Emitter`] and [`Receiver`].
//!
//! Radio traffic is partitioned by an integer channel fixed at construction.
//! Payloads are opaque bytes; the robot layer uses UTF-8 text on top.

use smarthome_types::SmarthomeError;
use tracing::debug;

use crate::engine::{Engine, RawEmitter, RawReceiver};

/// Fire-and-forget transmitter bound to one channel.
pub struct Emitter {
    name: String,
    channel: i32,
    raw: Box<dyn RawEmitter>,
}

impl Emitter {
    /// Bind the transmitter `name` and tune it to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the engine has no
    /// emitter called `name`.
    pub fn new(engine: &dyn Engine, name: &str, channel: i32) -> Result<Self, SmarthomeError> {
        let mut raw = engine.bind_emitter(name)?;
        raw.set_channel(channel);
        debug!(device = name, channel, "emitter bound");
        Ok(Self {
            name: name.to_string(),
            channel,
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> i32 {
        self.channel
    }

    /// Push `payload` on the channel.  No acknowledgement and no retry: a
    /// packet the engine refuses is dropped.
    pub fn send(&mut self, payload: &[u8]) {
        if !self.raw.send(payload) {
            debug!(device = %self.name, len = payload.len(), "emitter dropped packet");
        }
    }
}

/// Queued receiver bound to one channel, sampling once per tick.
pub struct Receiver {
    name: String,
    channel: i32,
    raw: Box<dyn RawReceiver>,
}

impl Receiver {
    /// Bind the receiver `name`, enable it with `time_step` and tune it to
    /// `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the engine has no
    /// receiver called `name`.
    pub fn new(
        engine: &dyn Engine,
        name: &str,
        time_step: u32,
        channel: i32,
    ) -> Result<Self, SmarthomeError> {
        let mut raw = engine.bind_receiver(name)?;
        raw.set_channel(channel);
        raw.enable(time_step);
        debug!(device = name, channel, time_step, "receiver bound");
        Ok(Self {
            name: name.to_string(),
            channel,
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> i32 {
        self.channel
    }

    pub fn queue_length(&self) -> usize {
        self.raw.queue_length()
    }

    /// The head packet decoded as text, left in the queue.  Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn peek_text(&self) -> Option<String> {
        self.raw
            .data()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Discard the head packet.
    pub fn next_packet(&mut self) {
        self.raw.next_packet();
    }

    /// Read the head packet as text and advance past it.
    pub fn read_next(&mut self) -> Option<String> {
        let text = self.peek_text()?;
        self.raw.next_packet();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimEngine;
    use smarthome_types::{BROADCAST_CHANNEL, DeviceKind};

    fn radio_engine() -> SimEngine {
        SimEngine::builder()
            .with_emitter("emitter")
            .with_receiver("receiver")
            .build()
    }

    #[test]
    fn emitter_assigns_channel_and_sends() {
        let engine = radio_engine();
        let mut tx = Emitter::new(&engine, "emitter", 4).unwrap();
        assert_eq!(tx.channel(), 4);
        assert_eq!(engine.channel("emitter"), Some(4));

        tx.send(b"hello");
        assert_eq!(engine.sent_messages("emitter"), vec![b"hello".to_vec()]);
    }

    #[test]
    fn emitter_drops_refused_packet_silently() {
        let engine = SimEngine::builder()
            .send_capacity(0)
            .with_emitter("emitter")
            .build();
        let mut tx = Emitter::new(&engine, "emitter", 1).unwrap();
        tx.send(b"lost");
        assert!(engine.sent_messages("emitter").is_empty());
    }

    #[test]
    fn receiver_enables_with_time_step() {
        let engine = radio_engine();
        let rx = Receiver::new(&engine, "receiver", 64, 2).unwrap();
        assert_eq!(engine.enabled_period("receiver"), Some(64));
        assert_eq!(engine.channel("receiver"), Some(2));
        assert_eq!(rx.channel(), 2);
        assert_eq!(rx.name(), "receiver");
    }

    #[test]
    fn receiver_only_hears_its_channel() {
        let engine = radio_engine();
        let rx = Receiver::new(&engine, "receiver", 32, 3).unwrap();
        engine.deliver(1, "other channel");
        assert_eq!(rx.queue_length(), 0);
        engine.deliver(3, "ours");
        engine.deliver(BROADCAST_CHANNEL, "everyone");
        assert_eq!(rx.queue_length(), 2);
    }

    #[test]
    fn peek_is_non_destructive_and_read_next_advances() {
        let engine = radio_engine();
        let mut rx = Receiver::new(&engine, "receiver", 32, 1).unwrap();
        engine.deliver(1, "a");
        engine.deliver(1, "b");

        assert_eq!(rx.peek_text().as_deref(), Some("a"));
        assert_eq!(rx.queue_length(), 2);

        assert_eq!(rx.read_next().as_deref(), Some("a"));
        assert_eq!(rx.queue_length(), 1);

        rx.next_packet();
        assert_eq!(rx.read_next(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let engine = radio_engine();
        let rx = Receiver::new(&engine, "receiver", 32, 1).unwrap();
        engine.deliver(1, [0x34, 0xff]);
        assert_eq!(rx.peek_text().as_deref(), Some("4\u{fffd}"));
    }

    #[test]
    fn binding_wrong_kind_fails() {
        let engine = radio_engine();
        let err = Receiver::new(&engine, "emitter", 32, 1).err().unwrap();
        assert_eq!(
            err,
            SmarthomeError::DeviceNotFound {
                name: "emitter".to_string(),
                kind: DeviceKind::Receiver,
            }
        );
    }
}
