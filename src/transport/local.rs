//! In-process binding transport.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::{Delivery, TransportConfig};
use crate::error::NotifyError;
use crate::task::TaskId;
use crate::worker::WorkerRef;

use super::{Binding, BindingTransport, ConnectionEvent, ConnectionListener};

struct Bindings {
    running: bool,
    next: u64,
    listeners: HashMap<Binding, Arc<dyn ConnectionListener>>,
}

struct PendingEvent {
    listener: Arc<dyn ConnectionListener>,
    event: ConnectionEvent,
}

/// FIFO of connection events, drained by one thread at a time.
struct EventQueue {
    receiver: Mutex<Receiver<PendingEvent>>,
    in_flight: Mutex<usize>,
    idle: Condvar,
}

impl EventQueue {
    fn in_flight(&self) -> MutexGuard<'_, usize> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, pending: PendingEvent) {
        pending.listener.on_connection_event(pending.event);

        let mut in_flight = self.in_flight();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }

    /// Deliver everything queued so far on the calling thread.
    fn drain(&self) {
        let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        while let Ok(pending) = receiver.try_recv() {
            self.deliver(pending);
        }
    }

    /// Dispatcher loop. Ends once the transport, which owns the only sender,
    /// is dropped and the queue is empty.
    fn run(&self) {
        loop {
            let next = self
                .receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();
            match next {
                Ok(pending) => self.deliver(pending),
                Err(_) => break,
            }
        }
    }
}

/// Transport that hosts a single worker inside the current process.
///
/// The worker is "running" or not; while it runs, every bound listener holds a
/// connection to it. Stopping or crashing the worker disconnects everyone, and
/// starting it again reconnects every binding still registered.
///
/// Events are queued in the order the worker's state changes and delivered in
/// that order: on the calling thread with [`Delivery::Inline`], or on a single
/// `binding-callback` thread with [`Delivery::Threaded`]. Inline listeners must
/// not connect, start, stop or crash from inside a callback.
pub struct LocalTransport {
    worker: WorkerRef,
    auto_create: bool,
    threaded: bool,
    bindings: Mutex<Bindings>,
    events: Sender<PendingEvent>,
    queue: Arc<EventQueue>,
}

impl LocalTransport {
    /// Host `worker` with the given settings.
    pub fn new(worker: WorkerRef, config: TransportConfig) -> Self {
        let (events, receiver) = mpsc::channel();
        let queue = Arc::new(EventQueue {
            receiver: Mutex::new(receiver),
            in_flight: Mutex::new(0),
            idle: Condvar::new(),
        });

        let threaded = match config.delivery {
            Delivery::Inline => false,
            Delivery::Threaded => {
                let dispatcher = queue.clone();
                let spawned = std::thread::Builder::new()
                    .name("binding-callback".into())
                    .spawn(move || dispatcher.run());
                match spawned {
                    Ok(_) => true,
                    Err(err) => {
                        log::warn!("Could not spawn callback thread, delivering inline: {}", err);
                        false
                    }
                }
            }
        };

        Self {
            worker,
            auto_create: config.auto_create,
            threaded,
            bindings: Mutex::new(Bindings {
                running: false,
                next: 1,
                listeners: HashMap::new(),
            }),
            events,
            queue,
        }
    }

    /// Host `worker`, delivering events on the caller's thread.
    pub fn inline(worker: WorkerRef) -> Self {
        Self::new(
            worker,
            TransportConfig {
                delivery: Delivery::Inline,
                ..Default::default()
            },
        )
    }

    /// Whether the hosted worker is running.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Number of live bindings.
    pub fn bound_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Whether every queued connection event has been delivered.
    pub fn is_idle(&self) -> bool {
        *self.queue.in_flight() == 0
    }

    /// Block until every queued connection event has been delivered.
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let in_flight = self.queue.in_flight();
        let (_in_flight, result) = self
            .queue
            .idle
            .wait_timeout_while(in_flight, timeout, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
        !result.timed_out()
    }

    /// Start the worker and connect every registered binding.
    pub fn start_worker(&self) {
        {
            let mut bindings = self.lock();
            if bindings.running {
                return;
            }
            bindings.running = true;

            log::info!("Worker started, connecting {} binding(s)", bindings.listeners.len());
            for listener in bindings.listeners.values() {
                self.enqueue(listener, ConnectionEvent::Connected(self.worker.clone()));
            }
        }
        self.flush();
    }

    /// Stop the worker normally. Bindings stay registered.
    pub fn stop_worker(&self) {
        self.shut_down(ConnectionEvent::Disconnected);
    }

    /// Simulate the worker dying. Bindings stay registered and receive a
    /// connection-lost failure.
    pub fn crash_worker(&self) {
        self.shut_down(ConnectionEvent::Failed(NotifyError::ConnectionLost(
            "worker crashed".into(),
        )));
    }

    fn shut_down(&self, event: ConnectionEvent) {
        {
            let mut bindings = self.lock();
            if !bindings.running {
                return;
            }
            bindings.running = false;

            log::info!(
                "Worker stopped ({:?}), {} binding(s) affected",
                event,
                bindings.listeners.len()
            );
            for listener in bindings.listeners.values() {
                self.enqueue(listener, event.clone());
            }
        }
        self.flush();
    }

    /// Queue `event` for `listener`. Called with the bindings lock held so the
    /// queue order matches the order of state changes.
    fn enqueue(&self, listener: &Arc<dyn ConnectionListener>, event: ConnectionEvent) {
        let mut in_flight = self.queue.in_flight();
        let pending = PendingEvent {
            listener: listener.clone(),
            event,
        };
        match self.events.send(pending) {
            Ok(()) => *in_flight += 1,
            Err(_) => log::error!("Connection event queue closed, event dropped"),
        }
    }

    /// Deliver queued events on this thread unless a dispatcher does it.
    fn flush(&self) {
        if !self.threaded {
            self.queue.drain();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Bindings> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BindingTransport for LocalTransport {
    fn connect(&self, task_id: TaskId, listener: Arc<dyn ConnectionListener>) -> Binding {
        let binding = {
            let mut bindings = self.lock();
            let binding = Binding::new(bindings.next);
            bindings.next += 1;
            bindings.listeners.insert(binding, listener.clone());

            if !bindings.running && self.auto_create {
                log::info!("Creating worker for {}", task_id);
                bindings.running = true;
            }
            if bindings.running {
                self.enqueue(&listener, ConnectionEvent::Connected(self.worker.clone()));
            } else {
                log::debug!("{} bound, waiting for worker to start", task_id);
            }
            binding
        };

        self.flush();
        binding
    }

    fn disconnect(&self, binding: Binding) {
        if self.lock().listeners.remove(&binding).is_none() {
            log::warn!("Disconnect of unknown binding {}", binding.get());
        }
    }

    fn stop_task(&self, task_id: TaskId) {
        self.worker.stop_task(task_id);
    }
}
