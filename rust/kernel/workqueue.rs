// SPDX-License-Identifier: GPL-2.0

//! Work queues.
//!
//! A [`Queue`] owns one worker thread running queued work items in order. Work items are plain
//! closures; a recurring poll is a work item that enqueues its successor through a
//! [`QueueHandle`] before it returns.
//!
//! Dropping the [`Queue`] stops it: work still queued is discarded, the item currently running
//! completes, and further enqueues fail.

use crate::error::{code::*, Result};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
};

type Work = Box<dyn FnOnce() + Send + 'static>;

enum Msg {
    Run(Work),
    Stop,
}

/// A work queue with a dedicated worker thread.
pub struct Queue {
    name: String,
    handle: QueueHandle,
    worker: Option<thread::JoinHandle<()>>,
}

/// A cloneable reference used to enqueue work on a [`Queue`], e.g. from a running work item.
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<Msg>,
    stopped: Arc<AtomicBool>,
}

impl Queue {
    /// Allocates a work queue called `name`, the name also being given to its worker thread.
    pub fn alloc(name: &str) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Msg>();
        let stopped = Arc::new(AtomicBool::new(false));

        let worker_stopped = stopped.clone();
        let worker = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                for msg in rx {
                    match msg {
                        Msg::Run(work) if !worker_stopped.load(Ordering::Acquire) => work(),
                        Msg::Run(_) => {}
                        Msg::Stop => break,
                    }
                }
            })
            .map_err(|_| ENOMEM)?;

        Ok(Self {
            name: name.to_owned(),
            handle: QueueHandle { tx, stopped },
            worker: Some(worker),
        })
    }

    /// Name of the queue.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to enqueue work with.
    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// Enqueues a work item.
    pub fn enqueue<F>(&self, work: F) -> Result
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.enqueue(work)
    }
}

impl QueueHandle {
    /// Enqueues a work item.
    ///
    /// Fails with `ENODEV` once the queue has been stopped.
    pub fn enqueue<F>(&self, work: F) -> Result
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_stopped() {
            return Err(ENODEV);
        }
        self.tx.send(Msg::Run(Box::new(work))).map_err(|_| ENODEV)
    }

    /// Returns whether the queue has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.handle.stopped.store(true, Ordering::Release);
        let _ = self.handle.tx.send(Msg::Stop);

        if let Some(worker) = self.worker.take() {
            // The last reference may be dropped by a work item; the worker exits on its own then.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{atomic::AtomicUsize, mpsc::channel};
    use std::time::Duration;

    #[test]
    fn runs_work_in_order() {
        let queue = Queue::alloc("test_wq").unwrap();
        assert_eq!(queue.name(), "test_wq");
        let (tx, rx) = channel();
        for i in 0..3 {
            let tx = tx.clone();
            queue.enqueue(move || tx.send(i).unwrap()).unwrap();
        }
        let got: Vec<i32> = rx.iter().take(3).collect();
        assert_eq!(got, vec![0, 1, 2]);
    }

    fn rearm(count: Arc<AtomicUsize>, handle: QueueHandle) {
        count.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        let next = handle.clone();
        let _ = handle.enqueue(move || rearm(count, next));
    }

    #[test]
    fn self_rearming_work_stops_on_drop() {
        let queue = Queue::alloc("rearm_wq").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = queue.handle();
        {
            let count = count.clone();
            let next = handle.clone();
            queue.enqueue(move || rearm(count, next)).unwrap();
        }

        while count.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        drop(queue);

        let after = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after);
        assert!(handle.is_stopped());
        assert_eq!(handle.enqueue(|| {}), Err(ENODEV));
    }

    #[test]
    fn dropped_from_its_own_worker() {
        let queue = Arc::new(crate::sync::Mutex::new(Some(Queue::alloc("self_wq").unwrap())));
        let (tx, rx) = channel();
        let q = queue.clone();
        let work = move || {
            let own = q.lock().take();
            drop(own);
            tx.send(()).unwrap();
        };
        let handle = queue.lock().as_ref().unwrap().handle();
        handle.enqueue(work).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(handle.is_stopped());
    }
}
