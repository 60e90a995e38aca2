//! Links carry protocol messages between the two peers.
//!
//! The coordinator only sees the [`Link`] trait: a non-blocking queue of
//! [`LinkEvent`]s plus fire-and-forget sends. [`TcpLink`] runs the sockets on a
//! private tokio runtime and bridges to the frame loop through channels, so the
//! game loop never awaits. [`LoopbackLink`] connects two coordinators inside
//! one process and is what the synchronization tests drive.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arrayvec::ArrayVec;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::NetConfig;
use crate::error::{NetError, Result};
use crate::protocol::{decode, encode, Message, MAX_MESSAGE_LEN};

/// Largest payload a one-byte length prefix can announce.
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;

const MAX_WIRE_LEN: usize = MAX_MESSAGE_LEN + 1;

/// Something that happened on a link since the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A peer is now attached.
    Connected,
    /// A message arrived from the peer.
    Message(Message),
    /// The peer went away, or a dial attempt failed.
    Disconnected,
}

/// A reliable, ordered channel to at most one peer.
pub trait Link: Send {
    /// Next already-arrived event, without blocking.
    fn poll(&mut self) -> Option<LinkEvent>;

    /// Queue a message. Dropped silently when no peer is attached.
    fn send(&mut self, message: &Message);

    /// Wait (bounded) until queued messages have been handed to the OS.
    fn flush(&mut self);

    /// Gracefully detach the current peer. No event is reported for it.
    fn disconnect(&mut self);

    /// Try to reach the peer again. Only meaningful for dialing links.
    fn redial(&mut self);

    /// Address of the listening endpoint, if this link listens.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Write one length-prefixed message.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &Message) -> io::Result<()> {
    let frame = encode(message);
    let mut wire = ArrayVec::<u8, MAX_WIRE_LEN>::new();
    wire.push(frame.len() as u8);
    wire.extend(frame);
    writer.write_all(&wire).await
}

/// Read one length-prefixed frame into `buf`.
///
/// Returns `Ok(None)` on a clean end of stream before a new frame starts.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8; MAX_FRAME_LEN],
) -> io::Result<Option<usize>> {
    let mut len = [0u8; 1];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = len[0] as usize;
    reader.read_exact(&mut buf[..len]).await?;
    Ok(Some(len))
}

enum Command {
    Send(Message),
    Flush(std::sync::mpsc::Sender<()>),
    Disconnect,
    Redial,
}

/// TCP link backed by a private single-worker tokio runtime.
pub struct TcpLink {
    rt: Option<Runtime>,
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    local_addr: Option<SocketAddr>,
    flush_timeout: Duration,
}

impl TcpLink {
    /// Listen on `addr` and accept a single peer at a time.
    pub fn listen(addr: SocketAddr, config: &NetConfig) -> Result<Self> {
        let std_listener =
            std::net::TcpListener::bind(addr).map_err(|source| NetError::Bind { addr, source })?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let rt = build_runtime()?;
        let listener = {
            let _guard = rt.enter();
            TcpListener::from_std(std_listener)?
        };
        info!(%local_addr, "listening for a peer");
        Ok(Self::spawn(rt, Some(listener), None, Some(local_addr), config))
    }

    /// Dial `target` right away; later attempts go through [`Link::redial`].
    pub fn dial(target: SocketAddr, config: &NetConfig) -> Result<Self> {
        let rt = build_runtime()?;
        let mut link = Self::spawn(rt, None, Some(target), None, config);
        link.redial();
        Ok(link)
    }

    fn spawn(
        rt: Runtime,
        listener: Option<TcpListener>,
        target: Option<SocketAddr>,
        local_addr: Option<SocketAddr>,
        config: &NetConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let hub = Hub::new(listener, target, config.connect_timeout(), event_tx);
        rt.spawn(hub.run(cmd_rx));
        Self {
            rt: Some(rt),
            commands: cmd_tx,
            events: event_rx,
            local_addr,
            flush_timeout: config.flush_timeout(),
        }
    }
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("tetris-ng-link")
        .enable_all()
        .build()
        .map_err(NetError::Runtime)
}

impl Link for TcpLink {
    fn poll(&mut self) -> Option<LinkEvent> {
        self.events.try_recv().ok()
    }

    fn send(&mut self, message: &Message) {
        let _ = self.commands.send(Command::Send(*message));
    }

    fn flush(&mut self) {
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        if self.commands.send(Command::Flush(done_tx)).is_ok()
            && done_rx.recv_timeout(self.flush_timeout).is_err()
        {
            debug!("flush did not complete in time");
        }
    }

    fn disconnect(&mut self) {
        let _ = self.commands.send(Command::Disconnect);
        self.flush();
    }

    fn redial(&mut self) {
        let _ = self.commands.send(Command::Redial);
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        if let Some(rt) = self.rt.take() {
            rt.shutdown_background();
        }
    }
}

struct Session {
    id: u64,
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

/// Owns the sockets. Runs on the link's runtime until the link is dropped.
struct Hub {
    listener: Option<TcpListener>,
    target: Option<SocketAddr>,
    connect_timeout: Duration,
    events: mpsc::UnboundedSender<LinkEvent>,
    session: Option<Session>,
    next_session: u64,
    dialing: bool,
    closed_tx: mpsc::UnboundedSender<u64>,
    closed_rx: mpsc::UnboundedReceiver<u64>,
    dialed_tx: mpsc::UnboundedSender<io::Result<TcpStream>>,
    dialed_rx: mpsc::UnboundedReceiver<io::Result<TcpStream>>,
}

async fn accept_next(listener: Option<&TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

impl Hub {
    fn new(
        listener: Option<TcpListener>,
        target: Option<SocketAddr>,
        connect_timeout: Duration,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let (dialed_tx, dialed_rx) = mpsc::unbounded_channel();
        Self {
            listener,
            target,
            connect_timeout,
            events,
            session: None,
            next_session: 0,
            dialing: false,
            closed_tx,
            closed_rx,
            dialed_tx,
            dialed_rx,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                accepted = accept_next(self.listener.as_ref()) => match accepted {
                    Ok((stream, peer)) => self.on_accept(stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                },
                Some(id) = self.closed_rx.recv() => self.on_closed(id),
                Some(dialed) = self.dialed_rx.recv() => self.on_dialed(dialed),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => break,
                },
            }
        }
        self.close_session().await;
    }

    fn on_accept(&mut self, stream: TcpStream, peer: SocketAddr) {
        if self.session.is_some() {
            debug!(%peer, "already paired, turning away extra peer");
            return;
        }
        info!(%peer, "peer connected");
        self.start_session(stream);
    }

    fn on_dialed(&mut self, dialed: io::Result<TcpStream>) {
        self.dialing = false;
        match dialed {
            Ok(stream) if self.session.is_none() => {
                info!(target = ?self.target, "connected to authority");
                self.start_session(stream);
            }
            Ok(_) => {}
            Err(e) => {
                debug!(target = ?self.target, error = %e, "dial failed");
                let _ = self.events.send(LinkEvent::Disconnected);
            }
        }
    }

    fn start_session(&mut self, stream: TcpStream) {
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();
        self.next_session += 1;
        let id = self.next_session;
        let reader = tokio::spawn(read_loop(
            id,
            reader,
            self.events.clone(),
            self.closed_tx.clone(),
        ));
        self.session = Some(Session { id, writer, reader });
        let _ = self.events.send(LinkEvent::Connected);
    }

    fn on_closed(&mut self, id: u64) {
        if self.session.as_ref().map(|s| s.id) != Some(id) {
            return;
        }
        self.session = None;
        info!("peer disconnected");
        let _ = self.events.send(LinkEvent::Disconnected);
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Send(message) => {
                let Some(session) = self.session.as_mut() else {
                    trace!(kind = ?message.kind(), "no peer attached, dropping message");
                    return;
                };
                if let Err(e) = write_frame(&mut session.writer, &message).await {
                    warn!(error = %e, "write failed, dropping peer");
                    if let Some(session) = self.session.take() {
                        session.reader.abort();
                    }
                    let _ = self.events.send(LinkEvent::Disconnected);
                }
            }
            Command::Flush(done) => {
                if let Some(session) = self.session.as_mut() {
                    let _ = session.writer.flush().await;
                }
                let _ = done.send(());
            }
            Command::Disconnect => self.close_session().await,
            Command::Redial => self.start_dial(),
        }
    }

    fn start_dial(&mut self) {
        let Some(target) = self.target else {
            return;
        };
        if self.dialing || self.session.is_some() {
            return;
        }
        self.dialing = true;
        debug!(%target, "dialing");
        let dialed = self.dialed_tx.clone();
        let timeout = self.connect_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, TcpStream::connect(target)).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
            };
            let _ = dialed.send(result);
        });
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = session.writer.shutdown().await;
            session.reader.abort();
            debug!("session closed locally");
        }
    }
}

async fn read_loop(
    id: u64,
    mut reader: OwnedReadHalf,
    events: mpsc::UnboundedSender<LinkEvent>,
    closed: mpsc::UnboundedSender<u64>,
) {
    let mut buf = [0u8; MAX_FRAME_LEN];
    loop {
        match read_frame(&mut reader, &mut buf).await {
            Ok(Some(len)) => match decode(&buf[..len]) {
                Ok(message) => {
                    if events.send(LinkEvent::Message(message)).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "dropping malformed message"),
            },
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "read failed");
                break;
            }
        }
    }
    let _ = closed.send(id);
}

struct WireState {
    inboxes: [mpsc::UnboundedSender<LinkEvent>; 2],
    up: AtomicBool,
    redials: AtomicUsize,
}

/// Test handle on a loopback pair: cut or restore the connection.
#[derive(Clone)]
pub struct LoopbackWire {
    state: Arc<WireState>,
}

impl LoopbackWire {
    /// Drop the connection; both ends see `Disconnected`.
    pub fn sever(&self) {
        if self.state.up.swap(false, Ordering::SeqCst) {
            for inbox in &self.state.inboxes {
                let _ = inbox.send(LinkEvent::Disconnected);
            }
        }
    }

    /// Re-establish the connection; both ends see `Connected`.
    pub fn restore(&self) {
        if !self.state.up.swap(true, Ordering::SeqCst) {
            for inbox in &self.state.inboxes {
                let _ = inbox.send(LinkEvent::Connected);
            }
        }
    }

    pub fn is_up(&self) -> bool {
        self.state.up.load(Ordering::SeqCst)
    }

    /// How many times either end asked to redial.
    pub fn redials(&self) -> usize {
        self.state.redials.load(Ordering::SeqCst)
    }
}

/// One end of an in-process link. Messages still go through the codec.
pub struct LoopbackLink {
    side: usize,
    inbox: mpsc::UnboundedReceiver<LinkEvent>,
    wire: LoopbackWire,
}

impl LoopbackLink {
    /// Two connected ends. Each starts with a pending `Connected` event.
    pub fn pair() -> (LoopbackLink, LoopbackLink) {
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        let _ = tx_a.send(LinkEvent::Connected);
        let _ = tx_b.send(LinkEvent::Connected);
        let wire = LoopbackWire {
            state: Arc::new(WireState {
                inboxes: [tx_a, tx_b],
                up: AtomicBool::new(true),
                redials: AtomicUsize::new(0),
            }),
        };
        (
            LoopbackLink {
                side: 0,
                inbox: rx_a,
                wire: wire.clone(),
            },
            LoopbackLink {
                side: 1,
                inbox: rx_b,
                wire,
            },
        )
    }

    pub fn wire(&self) -> LoopbackWire {
        self.wire.clone()
    }

    fn peer_inbox(&self) -> &mpsc::UnboundedSender<LinkEvent> {
        &self.wire.state.inboxes[1 - self.side]
    }
}

impl Link for LoopbackLink {
    fn poll(&mut self) -> Option<LinkEvent> {
        self.inbox.try_recv().ok()
    }

    fn send(&mut self, message: &Message) {
        if !self.wire.is_up() {
            return;
        }
        match decode(&encode(message)) {
            Ok(decoded) => {
                let _ = self.peer_inbox().send(LinkEvent::Message(decoded));
            }
            Err(e) => warn!(error = %e, "message failed to round-trip"),
        }
    }

    fn flush(&mut self) {}

    fn disconnect(&mut self) {
        if self.wire.state.up.swap(false, Ordering::SeqCst) {
            let _ = self.peer_inbox().send(LinkEvent::Disconnected);
        }
    }

    fn redial(&mut self) {
        self.wire.state.redials.fetch_add(1, Ordering::SeqCst);
    }
}
