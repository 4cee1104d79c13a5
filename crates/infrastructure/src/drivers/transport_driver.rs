use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use domain::driver::{
    ConnectionState, ConnectionStateMachine, DeviceDriver, StateNotifier, Transport,
    TransportError,
};
use domain::error::Result;
use domain::{ConnectResult, DataQuality, DataType, DomainError, PointValue, ReadResult, WriteResult};

const NOT_CONNECTED: &str = "not connected";

/// Timeouts applied around the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverOptions {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_request_timeout_ms() -> u64 {
    1000
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl DriverOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

struct Session<T> {
    transport: T,
    /// `open` was attempted and `close` has not run since
    needs_close: bool,
    disposed: bool,
}

/// Resets a Connecting state left behind by a connect future that was dropped
/// mid-handshake.
///
/// Drop cannot run async code, so a half-opened transport is not closed here.
/// `Session::needs_close` stays set and the transport is closed by the next
/// `connect` or by `dispose`.
struct ConnectingGuard<'a> {
    machine: &'a ConnectionStateMachine,
    armed: bool,
}

impl ConnectingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.machine.transition_from(
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
                Some("connect abandoned".to_string()),
            );
        }
    }
}

/// [`DeviceDriver`] over any [`Transport`].
///
/// All transport access goes through one async mutex, so at most one request
/// is on the wire per instance and concurrent callers queue. The connection
/// state lives outside that mutex and can be read at any time.
///
/// A lost connection or a request timeout fails the current operation,
/// releases the transport and moves the driver to `Faulted`. Nothing is
/// retried here.
pub struct TransportDriver<T: Transport> {
    name: String,
    kind: String,
    options: DriverOptions,
    machine: ConnectionStateMachine,
    session: Mutex<Session<T>>,
}

impl<T: Transport> TransportDriver<T> {
    pub fn new(name: impl Into<String>, transport: T, options: DriverOptions) -> Self {
        let kind = transport.kind().to_string();
        Self {
            name: name.into(),
            kind,
            options,
            machine: ConnectionStateMachine::new(),
            session: Mutex::new(Session {
                transport,
                needs_close: false,
                disposed: false,
            }),
        }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    async fn lock_session(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, Session<T>>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::Cancelled),
            guard = self.session.lock() => Ok(guard),
        }
    }

    /// Close the transport if anything is held. Not cancellable.
    async fn release(&self, session: &mut Session<T>) {
        if !session.needs_close {
            return;
        }
        session.needs_close = false;
        match tokio::time::timeout(self.options.request_timeout(), session.transport.close()).await {
            Ok(Ok(())) => debug!(driver = %self.name, "Transport closed"),
            Ok(Err(e)) => warn!(driver = %self.name, error = %e, "Transport close failed"),
            Err(_) => warn!(driver = %self.name, "Transport close timed out"),
        }
    }

    async fn fault(&self, session: &mut Session<T>, reason: String) {
        warn!(driver = %self.name, %reason, "Transport fault");
        self.machine
            .transition_from(ConnectionState::Connected, ConnectionState::Faulted, Some(reason));
        self.release(session).await;
    }

    /// Turn a request-level transport error into a failure message, faulting
    /// the session when the error is fatal.
    async fn request_failed(&self, session: &mut Session<T>, error: TransportError) -> String {
        let message = error.to_string();
        if error.is_fatal() {
            self.fault(session, message.clone()).await;
        }
        message
    }

    /// A request abandoned mid-flight may still be answered later, so the
    /// session cannot carry another request.
    async fn request_cancelled(&self, session: &mut Session<T>, address: &str) -> DomainError {
        self.fault(session, format!("request to {address} cancelled")).await;
        DomainError::Cancelled
    }

    async fn request_timed_out(&self, session: &mut Session<T>, address: &str) -> String {
        let message = format!(
            "request to {address} timed out after {}ms",
            self.options.request_timeout_ms
        );
        self.fault(session, message.clone()).await;
        message
    }
}

fn require_address(address: &str) -> Result<()> {
    if address.trim().is_empty() {
        return Err(DomainError::invalid_argument("address cannot be empty"));
    }
    Ok(())
}

#[async_trait]
impl<T: Transport + 'static> DeviceDriver for TransportDriver<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver_type(&self) -> &str {
        &self.kind
    }

    fn connection_state(&self) -> ConnectionState {
        self.machine.state()
    }

    fn state_changes(&self) -> &StateNotifier {
        self.machine.notifier()
    }

    async fn connect(&self, cancel: &CancellationToken) -> Result<ConnectResult> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let mut session = self.lock_session(cancel).await?;

        if session.disposed {
            return Ok(ConnectResult::failure("driver disposed"));
        }
        match self.machine.state() {
            ConnectionState::Connected => return Ok(ConnectResult::success()),
            ConnectionState::Disconnected | ConnectionState::Faulted => {}
            other => return Ok(ConnectResult::failure(format!("cannot connect while {other}"))),
        }

        // Leftovers of an abandoned attempt
        self.release(&mut session).await;

        if let Err(e) = self.machine.transition(ConnectionState::Connecting, None) {
            return Ok(ConnectResult::failure(e.to_string()));
        }
        let guard = ConnectingGuard {
            machine: &self.machine,
            armed: true,
        };
        info!(driver = %self.name, kind = %self.kind, "Connecting");

        session.needs_close = true;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = tokio::time::timeout(self.options.connect_timeout(), session.transport.open()) => Some(res),
        };
        guard.disarm();

        let reason = match outcome {
            Some(Ok(Ok(()))) => {
                self.machine.transition_from(
                    ConnectionState::Connecting,
                    ConnectionState::Connected,
                    None,
                );
                info!(driver = %self.name, "Connected");
                return Ok(ConnectResult::success());
            }
            None => {
                self.release(&mut session).await;
                self.machine.transition_from(
                    ConnectionState::Connecting,
                    ConnectionState::Disconnected,
                    Some("connect cancelled".to_string()),
                );
                info!(driver = %self.name, "Connect cancelled");
                return Err(DomainError::Cancelled);
            }
            Some(Ok(Err(e))) => e.to_string(),
            Some(Err(_)) => format!(
                "connect timed out after {}ms",
                self.options.connect_timeout_ms
            ),
        };

        self.release(&mut session).await;
        self.machine.transition_from(
            ConnectionState::Connecting,
            ConnectionState::Faulted,
            Some(reason.clone()),
        );
        warn!(driver = %self.name, %reason, "Connect failed");
        Ok(ConnectResult::failure(reason))
    }

    async fn disconnect(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let mut session = self.lock_session(cancel).await?;

        if self.machine.state() == ConnectionState::Connected {
            self.machine.transition(ConnectionState::Disconnecting, None)?;
            self.release(&mut session).await;
            self.machine.transition_from(
                ConnectionState::Disconnecting,
                ConnectionState::Disconnected,
                Some("disconnect requested".to_string()),
            );
            info!(driver = %self.name, "Disconnected");
        } else {
            // Disconnected: no-op. Faulted: drop what is left, stay Faulted.
            self.release(&mut session).await;
        }
        Ok(())
    }

    async fn read(
        &self,
        address: &str,
        data_type: DataType,
        cancel: &CancellationToken,
    ) -> Result<ReadResult> {
        require_address(address)?;
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if !self.machine.state().is_connected() {
            return Ok(ReadResult::failure(NOT_CONNECTED));
        }

        let mut session = self.lock_session(cancel).await?;
        if !self.machine.state().is_connected() {
            return Ok(ReadResult::failure(NOT_CONNECTED));
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = tokio::time::timeout(
                self.options.request_timeout(),
                session.transport.read(address, data_type),
            ) => Some(res),
        };
        let Some(outcome) = outcome else {
            return Err(self.request_cancelled(&mut session, address).await);
        };

        let result = match outcome {
            Ok(Ok(sample)) if !sample.value.is_type(data_type) => {
                ReadResult::failure(
                    TransportError::TypeMismatch {
                        address: address.to_string(),
                        expected: data_type,
                        actual: sample.value.data_type(),
                    }
                    .to_string(),
                )
            }
            Ok(Ok(sample)) if sample.quality == DataQuality::Bad => {
                ReadResult::failure(format!("device reported bad quality for {address}"))
            }
            Ok(Ok(sample)) => ReadResult::success(sample.value, sample.quality),
            Ok(Err(e)) => ReadResult::failure(self.request_failed(&mut session, e).await),
            Err(_) => ReadResult::failure(self.request_timed_out(&mut session, address).await),
        };
        debug!(driver = %self.name, %address, success = result.is_success(), "Read");
        Ok(result)
    }

    async fn write(
        &self,
        address: &str,
        value: PointValue,
        cancel: &CancellationToken,
    ) -> Result<WriteResult> {
        require_address(address)?;
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if !self.machine.state().is_connected() {
            return Ok(WriteResult::failure(NOT_CONNECTED));
        }

        let mut session = self.lock_session(cancel).await?;
        if !self.machine.state().is_connected() {
            return Ok(WriteResult::failure(NOT_CONNECTED));
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = tokio::time::timeout(
                self.options.request_timeout(),
                session.transport.write(address, &value),
            ) => Some(res),
        };
        let Some(outcome) = outcome else {
            return Err(self.request_cancelled(&mut session, address).await);
        };

        let result = match outcome {
            Ok(Ok(())) => WriteResult::success(),
            Ok(Err(e)) => WriteResult::failure(self.request_failed(&mut session, e).await),
            Err(_) => WriteResult::failure(self.request_timed_out(&mut session, address).await),
        };
        debug!(driver = %self.name, %address, %value, success = result.is_success(), "Write");
        Ok(result)
    }

    async fn dispose(&self) {
        let mut session = self.session.lock().await;
        if session.disposed {
            return;
        }

        let disconnecting = self
            .machine
            .transition_from(ConnectionState::Connected, ConnectionState::Disconnecting, None);
        self.release(&mut session).await;
        if disconnecting {
            self.machine.transition_from(
                ConnectionState::Disconnecting,
                ConnectionState::Disconnected,
                Some("driver disposed".to_string()),
            );
        }
        session.disposed = true;
        info!(driver = %self.name, "Disposed");
    }
}
