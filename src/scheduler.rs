// src/scheduler.rs
//! Periodic update scheduling
//!
//! Two independent timing concerns: a recurring update tick and a one-shot
//! deferred reconnect. Both run as spawned tokio tasks whose handles are
//! kept, so stopping is a deterministic abort rather than a flag check.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

pub type SchedulerCallback = Box<dyn Fn() + Send + Sync>;

struct Inner {
    update_interval: Mutex<Duration>,
    reconnect_interval: Mutex<Duration>,
    update_task: Mutex<Option<JoinHandle<()>>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
    update_callback: Arc<dyn Fn() + Send + Sync>,
    reconnect_callback: Arc<dyn Fn() + Send + Sync>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(mut task) = self.update_task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
        if let Ok(mut task) = self.reconnect_task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}

/// Drives the recurring read cycle and deferred reconnect attempts.
///
/// Callbacks are supplied at construction; the builder closure receives a
/// [`WeakScheduler`] so a callback can re-schedule without keeping the
/// scheduler alive. Clones share the same timers.
#[derive(Clone)]
pub struct UpdateScheduler {
    inner: Arc<Inner>,
}

/// Non-owning handle for use inside scheduler callbacks.
#[derive(Clone)]
pub struct WeakScheduler(Weak<Inner>);

impl WeakScheduler {
    pub fn upgrade(&self) -> Option<UpdateScheduler> {
        self.0.upgrade().map(|inner| UpdateScheduler { inner })
    }
}

impl UpdateScheduler {
    /// Must be called within a tokio runtime; the timers spawn onto it.
    pub fn new<F>(update_interval: Duration, reconnect_interval: Duration, build: F) -> Self
    where
        F: FnOnce(WeakScheduler) -> (SchedulerCallback, SchedulerCallback),
    {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let (update_callback, reconnect_callback) = build(WeakScheduler(weak.clone()));
            Inner {
                update_interval: Mutex::new(update_interval),
                reconnect_interval: Mutex::new(reconnect_interval),
                update_task: Mutex::new(None),
                reconnect_task: Mutex::new(None),
                update_callback: Arc::from(update_callback),
                reconnect_callback: Arc::from(reconnect_callback),
            }
        });
        Self { inner }
    }

    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler(Arc::downgrade(&self.inner))
    }

    /// Start the recurring update timer. Already running is a no-op. The
    /// first tick fires one full period after the start.
    pub fn start(&self) {
        let mut task = self.inner.update_task.lock().unwrap();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let period = *self.inner.update_interval.lock().unwrap();
        let callback = Arc::clone(&self.inner.update_callback);
        *task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                callback();
            }
        }));
        info!("GPS update scheduler started with {:?} interval", period);
    }

    /// Stop the recurring timer. No update callback fires after this
    /// returns (a callback already executing runs to completion).
    pub fn stop(&self) {
        let mut task = self.inner.update_task.lock().unwrap();
        if let Some(task) = task.take() {
            task.abort();
            info!("GPS update scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .update_task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Change the update period. A running timer restarts with the new
    /// period; a stopped one stays stopped.
    pub fn set_update_interval(&self, interval: Duration) {
        let was_running = self.is_running();
        self.stop();
        *self.inner.update_interval.lock().unwrap() = interval;
        if was_running {
            self.start();
        }
        info!("Update interval changed to {:?}", interval);
    }

    pub fn set_reconnect_interval(&self, interval: Duration) {
        *self.inner.reconnect_interval.lock().unwrap() = interval;
        info!("Reconnect interval changed to {:?}", interval);
    }

    pub fn update_interval(&self) -> Duration {
        *self.inner.update_interval.lock().unwrap()
    }

    pub fn reconnect_interval(&self) -> Duration {
        *self.inner.reconnect_interval.lock().unwrap()
    }

    /// Arm the one-shot reconnect timer. Idempotent: while an undelivered
    /// timer is pending, further calls are no-ops, so repeated failures
    /// cannot stack attempts.
    pub fn schedule_reconnect(&self) {
        let mut task = self.inner.reconnect_task.lock().unwrap();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Reconnection already scheduled");
            return;
        }

        let delay = *self.inner.reconnect_interval.lock().unwrap();
        let callback = Arc::clone(&self.inner.reconnect_callback);
        *task = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            callback();
        }));
        debug!("Reconnection scheduled in {:?}", delay);
    }

    /// Abort a pending reconnect timer, if any.
    pub fn cancel_reconnect(&self) {
        let mut task = self.inner.reconnect_task.lock().unwrap();
        if let Some(task) = task.take() {
            task.abort();
            debug!("Pending reconnection cancelled");
        }
    }

    pub fn reconnect_pending(&self) -> bool {
        self.inner
            .reconnect_task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_scheduler(
        update_interval: Duration,
        reconnect_interval: Duration,
    ) -> (UpdateScheduler, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let updates = Arc::new(AtomicUsize::new(0));
        let reconnects = Arc::new(AtomicUsize::new(0));
        let (u, r) = (Arc::clone(&updates), Arc::clone(&reconnects));
        let scheduler = UpdateScheduler::new(update_interval, reconnect_interval, move |_| {
            (
                Box::new(move || {
                    u.fetch_add(1, Ordering::SeqCst);
                }),
                Box::new(move || {
                    r.fetch_add(1, Ordering::SeqCst);
                }),
            )
        });
        (scheduler, updates, reconnects)
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_timer_fires_every_interval() {
        let (scheduler, updates, _) =
            counting_scheduler(Duration::from_millis(100), Duration::from_secs(5));
        scheduler.start();
        assert!(scheduler.is_running());

        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let (scheduler, updates, _) =
            counting_scheduler(Duration::from_millis(100), Duration::from_secs(5));
        scheduler.start();
        time::sleep(Duration::from_millis(150)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        let seen = updates.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(updates.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_single_timer() {
        let (scheduler, updates, _) =
            counting_scheduler(Duration::from_millis(100), Duration::from_secs(5));
        scheduler.start();
        scheduler.start();
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_restarts_running_timer() {
        let (scheduler, updates, _) =
            counting_scheduler(Duration::from_millis(100), Duration::from_secs(5));
        scheduler.start();
        scheduler.set_update_interval(Duration::from_millis(500));
        assert!(scheduler.is_running());

        time::sleep(Duration::from_millis(450)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_keeps_stopped_timer_stopped() {
        let (scheduler, _, _) =
            counting_scheduler(Duration::from_millis(100), Duration::from_secs(5));
        scheduler.set_update_interval(Duration::from_millis(50));
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_fires_once_after_delay() {
        let (scheduler, _, reconnects) =
            counting_scheduler(Duration::from_millis(100), Duration::from_millis(500));
        scheduler.schedule_reconnect();
        assert!(scheduler.reconnect_pending());

        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(reconnects.load(Ordering::SeqCst), 1);
        assert!(!scheduler.reconnect_pending());

        // One-shot: nothing further without an explicit re-schedule.
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(reconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_reconnect_is_idempotent_while_pending() {
        let (scheduler, _, reconnects) =
            counting_scheduler(Duration::from_millis(100), Duration::from_millis(500));
        scheduler.schedule_reconnect();
        scheduler.schedule_reconnect();
        scheduler.schedule_reconnect();

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(reconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reconnect_aborts_pending_timer() {
        let (scheduler, _, reconnects) =
            counting_scheduler(Duration::from_millis(100), Duration::from_millis(500));
        scheduler.schedule_reconnect();
        scheduler.cancel_reconnect();

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(reconnects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_can_reschedule_through_weak_handle() {
        let reconnects = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&reconnects);
        let scheduler = UpdateScheduler::new(
            Duration::from_millis(100),
            Duration::from_millis(200),
            move |weak| {
                let update: SchedulerCallback = Box::new(move || {
                    if let Some(scheduler) = weak.upgrade() {
                        scheduler.schedule_reconnect();
                    }
                });
                let reconnect: SchedulerCallback = Box::new(move || {
                    r.fetch_add(1, Ordering::SeqCst);
                });
                (update, reconnect)
            },
        );

        scheduler.start();
        time::sleep(Duration::from_millis(350)).await;
        scheduler.stop();
        assert!(reconnects.load(Ordering::SeqCst) >= 1);
    }
}
