//! Scriptable broker client for publisher tests.
//!
//! [`MockBroker`] implements [`BrokerClient`] without a broker. Tests choose how
//! `produce` behaves, inject delivery reports by hand and inspect what was
//! produced, flushed and closed.

use flights_core::broker::{
    BrokerClient, BrokerError, DeliveryReport, DeliveryReports, OutboundMessage,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// What `produce` does with the next message.
#[derive(Clone, Debug)]
pub enum ProduceBehavior {
    /// Accept the message
    Accept,
    /// Refuse the message with this error
    Reject(BrokerError),
    /// Block the calling thread for a while, then accept
    Block(Duration),
    /// Block until [`MockBroker::release`] or [`MockBroker::close`] is called, then
    /// report a full queue
    Hang,
}

#[derive(Debug)]
struct Inner {
    behavior: Mutex<ProduceBehavior>,
    produced: Mutex<Vec<OutboundMessage>>,
    report_tx: Mutex<Option<mpsc::UnboundedSender<DeliveryReport>>>,
    report_rx: Mutex<Option<DeliveryReports>>,
    auto_deliver: AtomicBool,
    released: Mutex<bool>,
    release_signal: Condvar,
    next_offset: AtomicUsize,
    flush_calls: AtomicUsize,
    flush_failure: Mutex<Option<String>>,
    closed: AtomicBool,
}

/// In-memory [`BrokerClient`].
///
/// # Example
///
/// ```
/// use flights_testing::{MockBroker, ProduceBehavior};
/// use flights_core::broker::BrokerError;
///
/// let broker = MockBroker::new().with_auto_delivery();
/// broker.set_behavior(ProduceBehavior::Reject(BrokerError::QueueFull));
/// assert_eq!(broker.produced().len(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct MockBroker {
    inner: Arc<Inner>,
}

impl MockBroker {
    /// Create a broker that accepts everything and reports nothing on its own
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                behavior: Mutex::new(ProduceBehavior::Accept),
                produced: Mutex::new(Vec::new()),
                report_tx: Mutex::new(Some(tx)),
                report_rx: Mutex::new(Some(rx)),
                auto_deliver: AtomicBool::new(false),
                released: Mutex::new(false),
                release_signal: Condvar::new(),
                next_offset: AtomicUsize::new(0),
                flush_calls: AtomicUsize::new(0),
                flush_failure: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Emit a `Delivered` report for every accepted message.
    #[must_use]
    pub fn with_auto_delivery(self) -> Self {
        self.inner.auto_deliver.store(true, Ordering::SeqCst);
        self
    }

    /// Change how subsequent `produce` calls behave.
    pub fn set_behavior(&self, behavior: ProduceBehavior) {
        *self.inner.behavior.lock().unwrap() = behavior;
    }

    /// Make subsequent flushes fail.
    pub fn fail_flush_with(&self, reason: impl Into<String>) {
        *self.inner.flush_failure.lock().unwrap() = Some(reason.into());
    }

    /// Unblock every thread stuck in a [`ProduceBehavior::Hang`] produce.
    pub fn release(&self) {
        *self.inner.released.lock().unwrap() = true;
        self.inner.release_signal.notify_all();
    }

    /// Push a delivery report as if it came from the broker.
    ///
    /// Returns `false` once the broker is closed.
    pub fn emit(&self, report: DeliveryReport) -> bool {
        self.inner
            .report_tx
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| tx.send(report).is_ok())
    }

    /// Messages accepted so far, in order
    #[must_use]
    pub fn produced(&self) -> Vec<OutboundMessage> {
        self.inner.produced.lock().unwrap().clone()
    }

    /// How many times `flush` was called
    #[must_use]
    pub fn flush_calls(&self) -> usize {
        self.inner.flush_calls.load(Ordering::SeqCst)
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn wait_for_release(&self) {
        let mut released = self.inner.released.lock().unwrap();
        while !*released {
            released = self.inner.release_signal.wait(released).unwrap();
        }
    }

    fn accept(&self, message: OutboundMessage) {
        if self.inner.auto_deliver.load(Ordering::SeqCst) {
            let offset = self.inner.next_offset.fetch_add(1, Ordering::SeqCst);
            self.emit(DeliveryReport::Delivered {
                topic: message.topic.clone(),
                partition: 0,
                offset: i64::try_from(offset).unwrap_or(i64::MAX),
                key: Some(message.key.clone()),
            });
        }
        self.inner.produced.lock().unwrap().push(message);
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerClient for MockBroker {
    fn produce(&self, message: OutboundMessage) -> Result<(), BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }

        let behavior = self.inner.behavior.lock().unwrap().clone();
        match behavior {
            ProduceBehavior::Accept => {
                self.accept(message);
                Ok(())
            }
            ProduceBehavior::Reject(error) => Err(error),
            ProduceBehavior::Block(duration) => {
                std::thread::sleep(duration);
                self.accept(message);
                Ok(())
            }
            ProduceBehavior::Hang => {
                self.wait_for_release();
                Err(BrokerError::QueueFull)
            }
        }
    }

    fn take_delivery_reports(&self) -> Option<DeliveryReports> {
        self.inner.report_rx.lock().unwrap().take()
    }

    fn flush(&self, _timeout: Duration) -> Result<(), BrokerError> {
        self.inner.flush_calls.fetch_add(1, Ordering::SeqCst);
        match self.inner.flush_failure.lock().unwrap().clone() {
            Some(reason) => Err(BrokerError::Flush(reason)),
            None => Ok(()),
        }
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.report_tx.lock().unwrap().take();
        self.release();
    }
}
