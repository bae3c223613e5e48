// SyncCallBridge - Synchronous calls over the helper pipe without freezing the host UI
//
// The host's dialog interface is synchronous, but its UI thread must keep
// dispatching its own events while the user sits in the helper's modal dialog.
// The bridge reconciles the two:
// 1. The blocking response read runs on a tokio blocking worker
// 2. The calling thread polls for the result at a fine interval and runs one
//    slice of the host event pump between polls
//
// Only one read is ever in flight, so the reader is moved into the worker and
// handed back with the decoded value instead of being shared behind a lock.

use crate::metrics::Metrics;
use crate::protocol::ProtocolError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// One slice of host UI work.
///
/// Implemented by the host application: typically a non-blocking iteration of
/// its main loop (repaint, input dispatch, timers).
pub trait EventPump {
    fn pump(&self);
}

/// Pump for hosts without an event loop of their own
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPump;

impl EventPump for NoopPump {
    fn pump(&self) {}
}

impl<P: EventPump + ?Sized> EventPump for Box<P> {
    fn pump(&self) {
        (**self).pump()
    }
}

impl<P: EventPump + ?Sized> EventPump for Arc<P> {
    fn pump(&self) {
        (**self).pump()
    }
}

/// Makes a blocking exchange look synchronous to the caller while the host
/// event pump keeps running.
///
/// # Example
/// ```ignore
/// let runtime = tokio::runtime::Runtime::new()?;
/// let bridge = SyncCallBridge::new(
///     runtime.handle().clone(),
///     Box::new(HostPump::new()),
///     Duration::from_millis(1),
///     Arc::new(Metrics::new()),
/// );
///
/// // Runs the read on a worker, pumping the host UI until it finishes
/// let (reader, accepted) = bridge.call(reader, |r| bool::decode(r))?;
/// ```
pub struct SyncCallBridge {
    /// Runtime whose blocking pool hosts the response reads
    tokio_handle: tokio::runtime::Handle,

    /// Host UI pump re-entered while waiting
    pump: Box<dyn EventPump>,

    /// Sleep between polls
    poll_interval: Duration,

    metrics: Arc<Metrics>,
}

impl SyncCallBridge {
    pub fn new(
        tokio_handle: tokio::runtime::Handle,
        pump: Box<dyn EventPump>,
        poll_interval: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            tokio_handle,
            pump,
            poll_interval,
            metrics,
        }
    }

    /// Run `read` against `reader` on a worker and wait for it.
    ///
    /// On success the reader comes back with the value so the next exchange can
    /// use it. On failure the reader is dropped: a stream that failed mid-value
    /// cannot be read again.
    pub fn call<R, T, F>(&self, reader: R, read: F) -> Result<(R, T), ProtocolError>
    where
        R: Send + 'static,
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, ProtocolError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let started = Instant::now();

        self.tokio_handle.spawn_blocking(move || {
            let mut reader = reader;
            let result = read(&mut reader).map(|value| (reader, value));
            // The caller only stops listening if it is itself unwinding
            let _ = tx.send(result);
        });

        let result = self.wait_on(rx)?;
        if result.is_ok() {
            self.metrics.record_response_read(started.elapsed());
        }
        result
    }

    /// Wait for `rx` while re-entering the host event pump.
    ///
    /// Never times out; a modal dialog can sit on user input for as long as it
    /// likes. A sender dropped without a value yields `WorkerLost`.
    pub fn wait_on<T>(&self, mut rx: oneshot::Receiver<T>) -> Result<T, ProtocolError> {
        loop {
            match rx.try_recv() {
                Ok(value) => return Ok(value),
                Err(TryRecvError::Closed) => {
                    tracing::error!("Response worker dropped without a result");
                    return Err(ProtocolError::WorkerLost);
                }
                Err(TryRecvError::Empty) => {}
            }

            self.pump.pump();
            self.metrics.record_pump();
            std::thread::sleep(self.poll_interval);
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WireValue;
    use std::io::{self, BufReader, Cursor, Read};
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    /// Pump that records when it was entered
    #[derive(Clone, Default)]
    struct RecordingPump {
        calls: Arc<Mutex<Vec<Instant>>>,
    }

    impl EventPump for RecordingPump {
        fn pump(&self) {
            self.calls.lock().unwrap().push(Instant::now());
        }
    }

    /// Reader that stalls before yielding its bytes, like a helper waiting on the user
    struct SlowReader {
        delay: Option<Duration>,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for SlowReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(delay) = self.delay.take() {
                std::thread::sleep(delay);
            }
            self.inner.read(buf)
        }
    }

    fn bridge_with(pump: Box<dyn EventPump>, rt: &tokio::runtime::Runtime) -> SyncCallBridge {
        SyncCallBridge::new(
            rt.handle().clone(),
            pump,
            Duration::from_millis(1),
            Arc::new(Metrics::new()),
        )
    }

    #[test]
    fn test_call_returns_value_and_reader() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let bridge = bridge_with(Box::new(NoopPump), &rt);

        let reader = BufReader::new(Cursor::new(b"1 5 hello ".to_vec()));
        let (reader, accepted) = bridge.call(reader, |r| bool::decode(r)).unwrap();
        assert!(accepted);

        // The returned reader continues where the first read stopped
        let (_, text) = bridge.call(reader, |r| String::decode(r)).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(bridge.metrics().responses_read.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_pump_is_reentered_while_waiting() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let pump = RecordingPump::default();
        let calls = pump.calls.clone();
        let bridge = bridge_with(Box::new(pump), &rt);

        let reader = BufReader::new(SlowReader {
            delay: Some(Duration::from_millis(150)),
            inner: Cursor::new(b"0 ".to_vec()),
        });

        let started = Instant::now();
        let (_, accepted) = bridge.call(reader, |r| bool::decode(r)).unwrap();
        assert!(!accepted);

        let calls = calls.lock().unwrap();
        // 1 ms polling over 150 ms; leave room for a loaded scheduler
        assert!(calls.len() >= 50, "pump entered only {} times", calls.len());
        assert!(calls[0].duration_since(started) < Duration::from_millis(10));

        let mut gaps: Vec<Duration> = calls
            .windows(2)
            .map(|w| w[1].duration_since(w[0]))
            .collect();
        gaps.sort();
        let p95 = gaps[gaps.len() * 95 / 100];
        let max_gap = gaps[gaps.len() - 1];
        assert!(p95 < Duration::from_millis(10), "p95 gap {:?}", p95);
        assert!(max_gap < Duration::from_millis(50), "max gap {:?}", max_gap);
    }

    #[test]
    fn test_read_error_is_propagated() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let bridge = bridge_with(Box::new(NoopPump), &rt);

        let reader = BufReader::new(Cursor::new(Vec::new()));
        let err = bridge.call(reader, |r| bool::decode(r)).unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
        assert_eq!(bridge.metrics().responses_read.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_dropped_sender_is_worker_lost() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let bridge = bridge_with(Box::new(NoopPump), &rt);

        let (tx, rx) = oneshot::channel::<u32>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            drop(tx);
        });

        let err = bridge.wait_on(rx).unwrap_err();
        assert!(matches!(err, ProtocolError::WorkerLost));
    }

    #[test]
    fn test_wait_on_delivers_value_from_other_thread() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let bridge = bridge_with(Box::new(NoopPump), &rt);

        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            let _ = tx.send(7u32);
        });

        assert_eq!(bridge.wait_on(rx).unwrap(), 7);
        assert!(bridge.metrics().pump_iterations.load(Ordering::Relaxed) > 0);
    }
}
