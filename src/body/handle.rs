//! Shared state between a connection and the request body it feeds.
//!
//! The connection decodes body bytes only while the reader has expressed
//! demand, which is the pause/resume seam of the engine: a handler that is
//! not reading leaves the socket untouched. Dropping the reader detaches it
//! without affecting the connection, the remaining body is drained by the
//! connection itself before the next request.
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use crate::body::error::ReadError;

/// Create a connected feeder/reader pair.
pub(crate) fn channel() -> (Feeder, Reader) {
    let shared = Arc::new(Mutex::new(Shared {
        queue: VecDeque::new(),
        terminal: Terminal::Streaming,
        demand: false,
        detached: false,
        reader: None,
        feeder: None,
    }));
    (Feeder { shared: shared.clone() }, Reader { shared })
}

/// Connection side handle, pushes decoded chunks.
pub(crate) struct Feeder {
    shared: Arc<Mutex<Shared>>,
}

/// Body side handle, pulls decoded chunks.
pub(crate) struct Reader {
    shared: Arc<Mutex<Shared>>,
}

struct Shared {
    queue: VecDeque<Bytes>,
    terminal: Terminal,
    /// reader awaits data
    demand: bool,
    /// reader is dropped or closed
    detached: bool,
    reader: Option<Waker>,
    feeder: Option<Waker>,
}

enum Terminal {
    Streaming,
    Ended,
    /// the error is delivered once, further reads observe end
    Errored(Option<ReadError>),
}

/// What the feeder should do next, see [`Feeder::poll_demand`].
pub(crate) enum Demand {
    /// The reader awaits data.
    Data,
    /// The reader is gone, stop forwarding.
    Detached,
}

impl Shared {
    fn wake_reader(&mut self) {
        if let Some(waker) = self.reader.take() {
            waker.wake();
        }
    }

    fn wake_feeder(&mut self) {
        if let Some(waker) = self.feeder.take() {
            waker.wake();
        }
    }
}

impl Feeder {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Check whether the reader awaits data.
    ///
    /// When it does not, the feeder waker is registered and woken on the next
    /// demand or detach.
    pub(crate) fn poll_demand(&self, cx: &mut Context) -> Poll<Demand> {
        let mut shared = self.lock();
        if shared.detached {
            return Poll::Ready(Demand::Detached);
        }
        if shared.demand {
            return Poll::Ready(Demand::Data);
        }
        shared.feeder = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Push one decoded chunk, consuming the current demand.
    pub(crate) fn data(&self, data: Bytes) {
        let mut shared = self.lock();
        if shared.detached {
            return;
        }
        shared.queue.push_back(data);
        shared.demand = false;
        shared.wake_reader();
    }

    /// Signal the single terminal end event.
    pub(crate) fn end(&self) {
        let mut shared = self.lock();
        if matches!(shared.terminal, Terminal::Streaming) {
            shared.terminal = Terminal::Ended;
            shared.wake_reader();
        }
    }

    /// Signal the single terminal error event.
    pub(crate) fn fail(&self, error: ReadError) {
        let mut shared = self.lock();
        if matches!(shared.terminal, Terminal::Streaming) {
            shared.terminal = Terminal::Errored(Some(error));
            shared.wake_reader();
        }
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        let mut shared = self.lock();
        // a feeder dropped mid stream means the connection died
        if matches!(shared.terminal, Terminal::Streaming) {
            shared.terminal = Terminal::Errored(Some(std::io::ErrorKind::ConnectionAborted.into()));
        }
        shared.wake_reader();
    }
}

impl Reader {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Pull the next chunk, registering demand when none is buffered.
    pub(crate) fn poll_data(&mut self, cx: &mut Context) -> Poll<Option<Result<Bytes, ReadError>>> {
        let mut shared = self.lock();

        if let Some(data) = shared.queue.pop_front() {
            return Poll::Ready(Some(Ok(data)));
        }

        match &mut shared.terminal {
            Terminal::Ended => Poll::Ready(None),
            Terminal::Errored(error) => match error.take() {
                Some(error) => Poll::Ready(Some(Err(error))),
                // the terminal error was already observed
                None => Poll::Ready(None),
            },
            Terminal::Streaming => {
                shared.demand = true;
                shared.reader = Some(cx.waker().clone());
                shared.wake_feeder();
                Poll::Pending
            }
        }
    }

    /// Detach from the connection.
    ///
    /// Buffered and further body bytes are discarded, the connection itself
    /// is unaffected.
    pub(crate) fn close(&mut self) {
        let mut shared = self.lock();
        shared.detached = true;
        shared.demand = false;
        shared.queue.clear();
        shared.wake_feeder();
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Feeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feeder").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader").finish_non_exhaustive()
    }
}
