//! Thread boundary between an engine thread and its callers.
//!
//! The engine runs on a dedicated thread and is driven through
//! `EngineCommand`s. Results come back as `EngineMessage`s. Either a
//! caller sends `Tick` for single steps, or `Start` lets the thread tick on
//! its own at the configured rate until `Stop`.

use crate::error::{EngineError, Result};
use crate::graph::engine::Engine;
use crate::graph::id::{InputId, NodeId, OutputId};
use crate::graph::node::AnyNode;
use crate::graph::scheduler::PassReport;
use crate::graph::value::PortValue;
use crate::pool::PoolStats;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Commands sent to the engine thread.
#[derive(Debug)]
pub enum EngineCommand {
    /// Add a node; answered with `NodeAdded`.
    AddNode(AnyNode),
    /// Run exactly one tick.
    Tick,
    /// Tick continuously at the configured rate.
    Start,
    /// Stop continuous ticking.
    Stop,
    MarkDirty(NodeId),
    SetInputDefault {
        input: InputId,
        value: Option<PortValue>,
    },
    ConfigureNode {
        node: NodeId,
        key: String,
        value: PortValue,
    },
    /// Connect; answered with `Connected`.
    Connect {
        from: OutputId,
        to: InputId,
    },
    DisconnectInput(InputId),
    DisconnectOutput(OutputId),
    RemoveNode(NodeId),
    /// Answered with `PoolStats`.
    RequestStats,
    /// Drop idle pooled buffers.
    ForceCleanup,
    /// Shut down the engine thread.
    Shutdown,
}

/// Messages sent back from the engine thread.
#[derive(Debug)]
pub enum EngineMessage {
    NodeAdded(NodeId),
    PassCompleted(PassReport),
    Connected {
        from: OutputId,
        to: InputId,
        accepted: bool,
    },
    PoolStats(PoolStats),
    Error(EngineError),
    /// The engine thread is exiting.
    Shutdown,
}

/// Channel capacity for commands (caller → engine).
const CMD_CHANNEL_CAPACITY: usize = 256;
/// Channel capacity for messages (engine → caller).
const MSG_CHANNEL_CAPACITY: usize = 1024;

/// Engine-thread side: drains commands and ticks.
pub struct EngineRunner {
    engine: Engine,
    cmd_rx: Receiver<EngineCommand>,
    msg_tx: Sender<EngineMessage>,
    running: Arc<AtomicBool>,
    active: bool,
    last_tick_time: Option<Instant>,
}

impl EngineRunner {
    pub fn new(
        engine: Engine,
        cmd_rx: Receiver<EngineCommand>,
        msg_tx: Sender<EngineMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            engine,
            cmd_rx,
            msg_tx,
            running,
            active: false,
            last_tick_time: None,
        }
    }

    /// Run until `running` is cleared or `Shutdown` arrives. Returns the engine.
    pub fn run(mut self) -> Engine {
        tracing::info!("Engine thread started");

        while self.running.load(Ordering::Relaxed) {
            self.process_commands();

            if self.active {
                self.tick();
            }

            self.rate_limit();
        }

        let _ = self.msg_tx.try_send(EngineMessage::Shutdown);
        tracing::info!("Engine thread exiting");
        self.engine
    }

    fn process_commands(&mut self) {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                EngineCommand::AddNode(node) => {
                    let id = self.engine.add_node(node);
                    self.send(EngineMessage::NodeAdded(id));
                }
                EngineCommand::Tick => self.tick(),
                EngineCommand::Start => {
                    if !self.active {
                        tracing::info!("Continuous ticking started");
                        self.active = true;
                    }
                }
                EngineCommand::Stop => {
                    if self.active {
                        tracing::info!("Continuous ticking stopped");
                        self.active = false;
                        self.last_tick_time = None;
                    }
                }
                EngineCommand::MarkDirty(id) => {
                    self.engine.mark_dirty(id);
                }
                EngineCommand::SetInputDefault { input, value } => {
                    self.engine.set_input_default(input, value);
                }
                EngineCommand::ConfigureNode { node, key, value } => {
                    if let Err(e) = self.engine.configure_node(node, &key, &value) {
                        self.send(EngineMessage::Error(e));
                    }
                }
                EngineCommand::Connect { from, to } => {
                    let accepted = self.engine.connect(from, to);
                    self.send(EngineMessage::Connected { from, to, accepted });
                }
                EngineCommand::DisconnectInput(input) => {
                    self.engine.disconnect_input(input);
                }
                EngineCommand::DisconnectOutput(output) => {
                    self.engine.disconnect_output(output);
                }
                EngineCommand::RemoveNode(id) => {
                    self.engine.remove_node(id);
                }
                EngineCommand::RequestStats => {
                    let stats = self.engine.pool_stats();
                    self.send(EngineMessage::PoolStats(stats));
                }
                EngineCommand::ForceCleanup => {
                    self.engine.force_cleanup();
                }
                EngineCommand::Shutdown => {
                    self.running.store(false, Ordering::Relaxed);
                    return;
                }
            }
        }
    }

    fn tick(&mut self) {
        let report = self.engine.tick();
        self.last_tick_time = Some(Instant::now());

        // Pass reports are dropped while the channel is full
        match self.msg_tx.try_send(EngineMessage::PassCompleted(report)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Message channel full, dropping pass report");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.running.store(false, Ordering::Relaxed);
            }
        }
    }

    /// Send a reply without blocking. Replies are dropped while the channel is full.
    fn send(&self, msg: EngineMessage) {
        match self.msg_tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                tracing::warn!("Message channel full, dropping reply {:?}", msg);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.running.store(false, Ordering::Relaxed);
            }
        }
    }

    // ── Rate limiting ──

    fn rate_limit(&self) {
        if !self.active {
            // Idle: just wait for commands
            std::thread::sleep(Duration::from_millis(1));
            return;
        }

        // 0 Hz means free-running
        let tick_rate_hz = self.engine.config().scheduler.tick_rate_hz;
        if tick_rate_hz == 0 {
            return;
        }

        let target_interval = Duration::from_nanos(1_000_000_000 / tick_rate_hz as u64);

        if let Some(last) = self.last_tick_time {
            let elapsed = last.elapsed();
            if elapsed < target_interval {
                let remaining = target_interval - elapsed;
                // Spin for sub-millisecond accuracy, sleep for larger waits
                if remaining > Duration::from_millis(2) {
                    std::thread::sleep(remaining - Duration::from_millis(1));
                }
                while last.elapsed() < target_interval {
                    std::hint::spin_loop();
                }
            }
        }
    }
}

/// Caller-side handle for an engine running on its own thread.
pub struct EngineBridge {
    cmd_tx: Sender<EngineCommand>,
    msg_rx: Receiver<EngineMessage>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Engine>>,
}

impl EngineBridge {
    /// Move `engine` onto a new thread and return a handle to it.
    pub fn spawn(engine: Engine) -> Result<Self> {
        let (cmd_tx, cmd_rx) = bounded(CMD_CHANNEL_CAPACITY);
        let (msg_tx, msg_rx) = bounded(MSG_CHANNEL_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));

        let runner = EngineRunner::new(engine, cmd_rx, msg_tx, running.clone());
        let handle = std::thread::Builder::new()
            .name("tickgraph-engine".into())
            .spawn(move || runner.run())?;

        Ok(Self {
            cmd_tx,
            msg_rx,
            running,
            handle: Some(handle),
        })
    }

    pub fn send(&self, cmd: EngineCommand) -> Result<()> {
        self.cmd_tx.send(cmd).map_err(|_| EngineError::ChannelSend)
    }

    pub fn add_node(&self, node: impl Into<AnyNode>) -> Result<()> {
        self.send(EngineCommand::AddNode(node.into()))
    }

    pub fn connect(&self, from: OutputId, to: InputId) -> Result<()> {
        self.send(EngineCommand::Connect { from, to })
    }

    pub fn tick(&self) -> Result<()> {
        self.send(EngineCommand::Tick)
    }

    pub fn start(&self) -> Result<()> {
        self.send(EngineCommand::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(EngineCommand::Stop)
    }

    pub fn mark_dirty(&self, id: NodeId) -> Result<()> {
        self.send(EngineCommand::MarkDirty(id))
    }

    pub fn request_stats(&self) -> Result<()> {
        self.send(EngineCommand::RequestStats)
    }

    /// Try to receive a single message without blocking.
    pub fn try_recv(&self) -> Option<EngineMessage> {
        self.msg_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineMessage> {
        match self.msg_rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drain all pending messages.
    pub fn drain(&self) -> Vec<EngineMessage> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the engine thread and take the engine back.
    ///
    /// Returns `None` if the thread was already joined or panicked.
    pub fn shutdown(&mut self) -> Option<Engine> {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        self.running.store(false, Ordering::Relaxed);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(engine) => Some(engine),
            Err(_) => {
                tracing::error!("Engine thread panicked");
                None
            }
        }
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, PoolConfig};
    use crate::graph::nodes::{ConstantNode, PassthroughNode};
    use crate::graph::value::ValueKind;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            pool: PoolConfig::with_budget(1 << 20),
            ..EngineConfig::default()
        })
    }

    fn expect_node(bridge: &EngineBridge) -> NodeId {
        match bridge.recv_timeout(TIMEOUT) {
            Some(EngineMessage::NodeAdded(id)) => id,
            other => panic!("expected NodeAdded, got {:?}", other),
        }
    }

    #[test]
    fn test_tick_over_bridge() {
        let mut bridge = EngineBridge::spawn(engine()).unwrap();

        bridge.add_node(ConstantNode::new(3.0)).unwrap();
        let a = expect_node(&bridge);
        bridge.add_node(PassthroughNode::new(ValueKind::Scalar)).unwrap();
        let b = expect_node(&bridge);

        bridge.connect(OutputId::new(a, 0), InputId::new(b, 0)).unwrap();
        match bridge.recv_timeout(TIMEOUT) {
            Some(EngineMessage::Connected { accepted, .. }) => assert!(accepted),
            other => panic!("expected Connected, got {:?}", other),
        }

        bridge.tick().unwrap();
        match bridge.recv_timeout(TIMEOUT) {
            Some(EngineMessage::PassCompleted(report)) => {
                assert_eq!(report.tick, 1);
                assert_eq!(report.evaluated, vec![a, b]);
            }
            other => panic!("expected PassCompleted, got {:?}", other),
        }

        let engine = bridge.shutdown().unwrap();
        assert_eq!(
            engine
                .output_value(OutputId::new(b, 0))
                .and_then(PortValue::as_scalar),
            Some(3.0)
        );
        assert!(bridge.shutdown().is_none());
    }

    #[test]
    fn test_configure_unknown_node_reports_error() {
        let bridge = EngineBridge::spawn(engine()).unwrap();
        bridge
            .send(EngineCommand::ConfigureNode {
                node: NodeId(7),
                key: "value".into(),
                value: PortValue::Scalar(1.0),
            })
            .unwrap();

        match bridge.recv_timeout(TIMEOUT) {
            Some(EngineMessage::Error(EngineError::UnknownNode(id))) => assert_eq!(id, NodeId(7)),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn test_request_stats() {
        let bridge = EngineBridge::spawn(engine()).unwrap();
        bridge.request_stats().unwrap();
        match bridge.recv_timeout(TIMEOUT) {
            Some(EngineMessage::PoolStats(stats)) => {
                assert_eq!(stats.budget_bytes, 1 << 20);
                assert_eq!(stats.bytes_outstanding, 0);
            }
            other => panic!("expected PoolStats, got {:?}", other),
        }
    }

    #[test]
    fn test_shutdown_with_unread_messages() {
        let mut config = EngineConfig {
            pool: PoolConfig::with_budget(1 << 20),
            ..EngineConfig::default()
        };
        config.scheduler.tick_rate_hz = 0;
        let bridge = EngineBridge::spawn(Engine::new(config)).unwrap();

        // Free-running ticks fill the message channel while nobody reads
        bridge.start().unwrap();
        let deadline = Instant::now() + TIMEOUT;
        while !bridge.msg_rx.is_full() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(bridge.msg_rx.is_full());

        bridge.add_node(ConstantNode::new(1.0)).unwrap();
        bridge.request_stats().unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let (done_tx, done_rx) = bounded(1);
        std::thread::spawn(move || {
            let mut bridge = bridge;
            let _ = done_tx.send(bridge.shutdown().is_some());
        });
        assert_eq!(done_rx.recv_timeout(TIMEOUT), Ok(true));
    }

    #[test]
    fn test_shutdown_message() {
        let mut bridge = EngineBridge::spawn(engine()).unwrap();
        bridge.send(EngineCommand::Shutdown).unwrap();
        assert!(matches!(
            bridge.recv_timeout(TIMEOUT),
            Some(EngineMessage::Shutdown)
        ));
        assert!(bridge.shutdown().is_some());
        assert!(!bridge.is_running());
    }
}
