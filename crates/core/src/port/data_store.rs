// Data Store Port
// Abstraction over the store driver: the probe only needs open, query-scalar, close

use crate::domain::{ProbeError, ScalarValue};
use async_trait::async_trait;

/// Opens connections to one kind of data store
///
/// Implementations:
/// - SqliteConnector / PostgresConnector (pulsecheck-infra-sqlx)
/// - MockConnector (tests)
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Driver-specific connect options, exposed to the customization hook
    type Options: Send + 'static;

    type Connection: StoreConnection;

    /// Turn the opaque target address into connect options
    ///
    /// # Errors
    /// - ProbeError::InvalidAddress if the address cannot be parsed
    fn prepare(&self, address: &str) -> Result<Self::Options, ProbeError>;

    /// Open a new, unpooled connection
    ///
    /// # Errors
    /// - ProbeError::Connectivity if the store cannot be reached or rejects us
    async fn open(&self, options: Self::Options) -> Result<Self::Connection, ProbeError>;
}

/// A single open connection
///
/// Dropping the connection must release it; `close` is the graceful path.
#[async_trait]
pub trait StoreConnection: Send + 'static {
    /// Execute `command` and return the first column of the first row
    ///
    /// # Errors
    /// - ProbeError::Execution if the command fails or its result cannot be decoded
    async fn execute_scalar(&mut self, command: &str) -> Result<ScalarValue, ProbeError>;

    /// Gracefully close the connection
    async fn close(self) -> Result<(), ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock connector behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Open succeeds and the command returns this value
        Return(ScalarValue),
        /// Open fails with message
        RefuseConnection(String),
        /// Open succeeds, the command fails with message
        FailCommand(String),
        /// Open never completes
        HangOnOpen,
        /// Open succeeds, the command never completes
        HangOnCommand,
        /// The command returns the value, closing the connection fails
        FailClose(ScalarValue),
    }

    /// Connect options seen by the mock, tunable through the configure hook
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct MockOptions {
        pub address: String,
        pub timeout_ms: Option<u64>,
        pub application_name: Option<String>,
    }

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        live: AtomicUsize,
        closed: AtomicUsize,
    }

    /// Mock Connector for testing
    ///
    /// Tracks live connections so tests can assert nothing leaks.
    pub struct MockConnector {
        behavior: Arc<Mutex<MockBehavior>>,
        counters: Arc<Counters>,
        last_options: Arc<Mutex<Option<MockOptions>>>,
        last_command: Arc<Mutex<Option<String>>>,
    }

    impl MockConnector {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                counters: Arc::new(Counters::default()),
                last_options: Arc::new(Mutex::new(None)),
                last_command: Arc::new(Mutex::new(None)),
            }
        }
        pub fn returning(value: ScalarValue) -> Self {
            Self::new(MockBehavior::Return(value))
        }
        pub fn refusing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::RefuseConnection(message.into()))
        }
        pub fn failing_command(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::FailCommand(message.into()))
        }
        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }
        pub fn opened(&self) -> usize {
            self.counters.opened.load(Ordering::SeqCst)
        }
        pub fn live_connections(&self) -> usize {
            self.counters.live.load(Ordering::SeqCst)
        }
        pub fn closed(&self) -> usize {
            self.counters.closed.load(Ordering::SeqCst)
        }
        pub fn last_options(&self) -> Option<MockOptions> {
            self.last_options.lock().unwrap().clone()
        }
        pub fn last_command(&self) -> Option<String> {
            self.last_command.lock().unwrap().clone()
        }
    }

    /// Connection handed out by [`MockConnector`]
    pub struct MockConnection {
        behavior: MockBehavior,
        counters: Arc<Counters>,
        last_command: Arc<Mutex<Option<String>>>,
    }

    impl Drop for MockConnection {
        fn drop(&mut self) {
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        type Options = MockOptions;
        type Connection = MockConnection;

        fn prepare(&self, address: &str) -> Result<MockOptions, ProbeError> {
            if address.contains(' ') {
                return Err(ProbeError::InvalidAddress(format!(
                    "unexpected whitespace in '{}'",
                    address
                )));
            }
            Ok(MockOptions {
                address: address.to_string(),
                ..Default::default()
            })
        }

        async fn open(&self, options: MockOptions) -> Result<MockConnection, ProbeError> {
            *self.last_options.lock().unwrap() = Some(options.clone());
            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::RefuseConnection(msg) => Err(ProbeError::Connectivity(msg)),
                MockBehavior::HangOnOpen => std::future::pending().await,
                behavior => {
                    self.counters.opened.fetch_add(1, Ordering::SeqCst);
                    self.counters.live.fetch_add(1, Ordering::SeqCst);
                    Ok(MockConnection {
                        behavior,
                        counters: Arc::clone(&self.counters),
                        last_command: Arc::clone(&self.last_command),
                    })
                }
            }
        }
    }

    #[async_trait]
    impl StoreConnection for MockConnection {
        async fn execute_scalar(&mut self, command: &str) -> Result<ScalarValue, ProbeError> {
            *self.last_command.lock().unwrap() = Some(command.to_string());

            match &self.behavior {
                MockBehavior::Return(value) | MockBehavior::FailClose(value) => Ok(value.clone()),
                MockBehavior::FailCommand(msg) => Err(ProbeError::Execution(msg.clone())),
                MockBehavior::HangOnCommand => std::future::pending().await,
                MockBehavior::RefuseConnection(_) | MockBehavior::HangOnOpen => {
                    Err(ProbeError::Execution("connection was never opened".to_string()))
                }
            }
        }

        async fn close(self) -> Result<(), ProbeError> {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                MockBehavior::FailClose(_) => {
                    Err(ProbeError::Connectivity("connection reset on close".to_string()))
                }
                _ => Ok(()),
            }
        }
    }
}
