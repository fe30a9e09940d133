//! Signal registrar: forwards OS signal deliveries to a notification channel.
//!
//! A [`SignalSet`] maps each watched [`Signal`] to a handler. The first
//! handler registered for a signal wins; later registrations are ignored.
//! The dispatch loop waits for the next delivery, runs the matching handler,
//! and silently drops signals that have no handler. The bundled
//! [`notify_handler`] logs the signal and sends [`DONE`] to the caller's
//! channel, waiting for capacity if the channel is full.
//!
//! The OS source subscribes to every [`Signal`] variant, not only the
//! registered ones, so watched and unwatched signals alike stop having their
//! default disposition while it runs.

use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Message written to the notification channel for every handled signal.
pub const DONE: &str = "done";

/// Default capacity of the channel carrying OS deliveries to the loop.
pub const DEFAULT_DELIVERY_CAPACITY: usize = 32;

/// Catchable process signals the registrar knows about.
///
/// Covers every signal a process can catch on all Unix targets. Fault
/// signals (`SIGSEGV`, `SIGBUS`, `SIGFPE`, `SIGILL`, `SIGTRAP`), `SIGABRT`
/// and the uncatchable `SIGKILL`/`SIGSTOP` are left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Signal {
    Hangup,
    Interrupt,
    Quit,
    Terminate,
    User1,
    User2,
    Alarm,
    Child,
    Pipe,
    WindowChange,
    VirtualAlarm,
    Profile,
    TerminalStop,
    TerminalInput,
    TerminalOutput,
    Continue,
    Urgent,
    Io,
    CpuLimit,
    FileSizeLimit,
    BadSyscall,
}

impl Signal {
    /// Every signal the OS source subscribes to.
    pub const ALL: [Signal; 21] = [
        Signal::Hangup,
        Signal::Interrupt,
        Signal::Quit,
        Signal::Terminate,
        Signal::User1,
        Signal::User2,
        Signal::Alarm,
        Signal::Child,
        Signal::Pipe,
        Signal::WindowChange,
        Signal::VirtualAlarm,
        Signal::Profile,
        Signal::TerminalStop,
        Signal::TerminalInput,
        Signal::TerminalOutput,
        Signal::Continue,
        Signal::Urgent,
        Signal::Io,
        Signal::CpuLimit,
        Signal::FileSizeLimit,
        Signal::BadSyscall,
    ];

    /// Conventional name, e.g. `SIGINT`.
    pub fn name(self) -> &'static str {
        match self {
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Terminate => "SIGTERM",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
            Signal::Alarm => "SIGALRM",
            Signal::Child => "SIGCHLD",
            Signal::Pipe => "SIGPIPE",
            Signal::WindowChange => "SIGWINCH",
            Signal::VirtualAlarm => "SIGVTALRM",
            Signal::Profile => "SIGPROF",
            Signal::TerminalStop => "SIGTSTP",
            Signal::TerminalInput => "SIGTTIN",
            Signal::TerminalOutput => "SIGTTOU",
            Signal::Continue => "SIGCONT",
            Signal::Urgent => "SIGURG",
            Signal::Io => "SIGIO",
            Signal::CpuLimit => "SIGXCPU",
            Signal::FileSizeLimit => "SIGXFSZ",
            Signal::BadSyscall => "SIGSYS",
        }
    }

    pub fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal as Nix;
        match self {
            Signal::Hangup => Nix::SIGHUP,
            Signal::Interrupt => Nix::SIGINT,
            Signal::Quit => Nix::SIGQUIT,
            Signal::Terminate => Nix::SIGTERM,
            Signal::User1 => Nix::SIGUSR1,
            Signal::User2 => Nix::SIGUSR2,
            Signal::Alarm => Nix::SIGALRM,
            Signal::Child => Nix::SIGCHLD,
            Signal::Pipe => Nix::SIGPIPE,
            Signal::WindowChange => Nix::SIGWINCH,
            Signal::VirtualAlarm => Nix::SIGVTALRM,
            Signal::Profile => Nix::SIGPROF,
            Signal::TerminalStop => Nix::SIGTSTP,
            Signal::TerminalInput => Nix::SIGTTIN,
            Signal::TerminalOutput => Nix::SIGTTOU,
            Signal::Continue => Nix::SIGCONT,
            Signal::Urgent => Nix::SIGURG,
            Signal::Io => Nix::SIGIO,
            Signal::CpuLimit => Nix::SIGXCPU,
            Signal::FileSizeLimit => Nix::SIGXFSZ,
            Signal::BadSyscall => Nix::SIGSYS,
        }
    }

    /// Platform signal number.
    pub fn raw(self) -> i32 {
        self.to_nix() as i32
    }

    /// Parse a signal name.
    ///
    /// Accepts descriptive names (`interrupt`, `user1`), conventional names
    /// with or without the `SIG` prefix (`SIGINT`, `int`), case-insensitively.
    pub fn parse(name: &str) -> Option<Signal> {
        let lower = name.trim().to_ascii_lowercase();
        let short = lower.strip_prefix("sig").unwrap_or(&lower);
        let signal = match short {
            "hup" | "hangup" => Signal::Hangup,
            "int" | "interrupt" => Signal::Interrupt,
            "quit" => Signal::Quit,
            "term" | "terminate" => Signal::Terminate,
            "usr1" | "user1" => Signal::User1,
            "usr2" | "user2" => Signal::User2,
            "alrm" | "alarm" => Signal::Alarm,
            "chld" | "child" => Signal::Child,
            "pipe" => Signal::Pipe,
            "winch" | "windowchange" | "window-change" => Signal::WindowChange,
            "vtalrm" | "virtualalarm" | "virtual-alarm" => Signal::VirtualAlarm,
            "prof" | "profile" => Signal::Profile,
            "tstp" | "terminalstop" | "terminal-stop" => Signal::TerminalStop,
            "ttin" | "terminalinput" | "terminal-input" => Signal::TerminalInput,
            "ttou" | "terminaloutput" | "terminal-output" => Signal::TerminalOutput,
            "cont" | "continue" => Signal::Continue,
            "urg" | "urgent" => Signal::Urgent,
            "io" => Signal::Io,
            "xcpu" | "cpulimit" | "cpu-limit" => Signal::CpuLimit,
            "xfsz" | "filesizelimit" | "file-size-limit" => Signal::FileSizeLimit,
            "sys" | "badsyscall" | "bad-syscall" => Signal::BadSyscall,
            _ => return None,
        };
        Some(signal)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signal::parse(s).ok_or_else(|| SignalError::UnknownName(s.to_string()))
    }
}

impl TryFrom<String> for Signal {
    type Error = SignalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Errors produced by the registrar.
#[derive(Debug)]
pub enum SignalError {
    /// A delivered signal has no registered handler.
    Unhandled(Signal),
    /// Subscribing to OS delivery of a signal failed.
    Subscribe {
        signal: Signal,
        source: std::io::Error,
    },
    /// A signal name could not be parsed.
    UnknownName(String),
}

impl std::fmt::Display for SignalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalError::Unhandled(signal) => {
                write!(f, "no handler available for signal {signal}")
            }
            SignalError::Subscribe { signal, source } => {
                write!(f, "failed to subscribe to {signal}: {source}")
            }
            SignalError::UnknownName(name) => write!(f, "unknown signal name: {name:?}"),
        }
    }
}

impl std::error::Error for SignalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignalError::Subscribe { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Future returned by a [`SignalHandler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback run when a registered signal is delivered.
///
/// Anything the handler needs beyond the signal itself is captured by the
/// closure.
pub type SignalHandler = Arc<dyn Fn(Signal) -> HandlerFuture + Send + Sync>;

/// Handler table keyed by signal. First registration wins.
#[derive(Default, Clone)]
pub struct SignalSet {
    handlers: HashMap<Signal, SignalHandler>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `signal` unless one is already present.
    ///
    /// Returns `true` if the handler was inserted, `false` if the signal was
    /// already registered (the existing handler is kept).
    pub fn register(&mut self, signal: Signal, handler: SignalHandler) -> bool {
        match self.handlers.entry(signal) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handler);
                true
            }
        }
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.handlers.contains_key(&signal)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler registered for `signal`.
    pub async fn handle(&self, signal: Signal) -> Result<(), SignalError> {
        let handler = self
            .handlers
            .get(&signal)
            .ok_or(SignalError::Unhandled(signal))?;
        handler(signal).await;
        Ok(())
    }
}

impl std::fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut signals: Vec<_> = self.handlers.keys().map(|s| s.name()).collect();
        signals.sort_unstable();
        f.debug_struct("SignalSet")
            .field("signals", &signals)
            .finish()
    }
}

/// Handler that logs the signal and sends [`DONE`] on `notify`.
pub fn notify_handler(notify: mpsc::Sender<String>) -> SignalHandler {
    Arc::new(move |signal: Signal| -> HandlerFuture {
        let notify = notify.clone();
        Box::pin(async move {
            tracing::info!(%signal, "handle signal");
            if notify.send(DONE.to_string()).await.is_err() {
                tracing::warn!(%signal, "notification receiver dropped");
            }
        })
    })
}

/// Build a table with one shared [`notify_handler`] for every signal in
/// `signals`. Duplicates are ignored.
pub fn build_signal_set(signals: &[Signal], notify: mpsc::Sender<String>) -> SignalSet {
    let handler = notify_handler(notify);
    let mut set = SignalSet::new();
    for &signal in signals {
        if !set.register(signal, Arc::clone(&handler)) {
            tracing::debug!(%signal, "signal already registered, ignoring");
        }
    }
    set
}

/// Subscribe to every [`Signal`] and forward deliveries into a channel.
///
/// Each subscription is drained by its own task; the returned receiver sees
/// deliveries from all of them. The tasks exit once the receiver is dropped.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
#[cfg(unix)]
pub fn os_deliveries(capacity: usize) -> Result<mpsc::Receiver<Signal>, SignalError> {
    use tokio::signal::unix::{signal, SignalKind};

    let (tx, rx) = mpsc::channel(capacity.max(1));
    for sig in Signal::ALL {
        let mut stream = signal(SignalKind::from_raw(sig.raw()))
            .map_err(|e| SignalError::Subscribe { signal: sig, source: e })?;
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Dispatch loop went away; drop the subscription with it
                    _ = tx.closed() => break,
                    delivered = stream.recv() => {
                        if delivered.is_none() || tx.send(sig).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
    tracing::debug!(count = Signal::ALL.len(), "subscribed to OS signals");
    Ok(rx)
}

/// Dispatch deliveries to `set` until `stop` resolves or the source closes.
async fn dispatch<F>(set: SignalSet, mut deliveries: mpsc::Receiver<Signal>, stop: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(stop);
    loop {
        tokio::select! {
            _ = &mut stop => {
                tracing::debug!("signal registrar stopping");
                break;
            }
            delivered = deliveries.recv() => match delivered {
                // Unregistered signals are dropped without a log line
                Some(signal) => {
                    let _ = set.handle(signal).await;
                }
                None => {
                    tracing::debug!("signal delivery source closed");
                    break;
                }
            },
        }
    }
}

/// A running dispatch loop on its own tokio task.
///
/// Dropping the registrar detaches the task; call [`Registrar::stop`] to end
/// it.
pub struct Registrar {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Registrar {
    /// Register `signals` against one shared notify handler and start
    /// dispatching deliveries read from `deliveries`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(
        signals: &[Signal],
        notify: mpsc::Sender<String>,
        deliveries: mpsc::Receiver<Signal>,
    ) -> Registrar {
        let set = build_signal_set(signals, notify);
        tracing::info!(?set, "signal registrar starting");

        let (stop_tx, stop_rx) = oneshot::channel();
        let stop = async move {
            // A dropped sender means detached, not stopped
            if stop_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let task = tokio::spawn(dispatch(set, deliveries, stop));
        Registrar {
            stop: stop_tx,
            task,
        }
    }

    /// Like [`Registrar::spawn`], fed by OS signal delivery. Must be called
    /// inside a tokio runtime.
    #[cfg(unix)]
    pub fn spawn_os(
        signals: &[Signal],
        notify: mpsc::Sender<String>,
        delivery_capacity: usize,
    ) -> Result<Registrar, SignalError> {
        let deliveries = os_deliveries(delivery_capacity)?;
        Ok(Self::spawn(signals, notify, deliveries))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the loop to exit and wait for it.
    pub async fn stop(self) {
        let Registrar { stop, task } = self;
        let _ = stop.send(());
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "signal registrar task failed");
        }
    }

    /// Wait for the loop to exit on its own (delivery source closed).
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "signal registrar task failed");
        }
    }
}

/// Watch `signals` for the lifetime of the process, sending [`DONE`] on
/// `notify` for each one delivered.
///
/// Only returns early if subscribing to OS signals fails.
#[cfg(unix)]
pub async fn register_signal(
    signals: &[Signal],
    notify: mpsc::Sender<String>,
) -> Result<(), SignalError> {
    let set = build_signal_set(signals, notify);
    let deliveries = os_deliveries(DEFAULT_DELIVERY_CAPACITY)?;
    dispatch(set, deliveries, std::future::pending()).await;
    Ok(())
}
