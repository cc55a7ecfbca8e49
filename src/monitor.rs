// src/monitor.rs
//! Top-level GPS monitor facade
//!
//! Wires the data controller and update scheduler together and exposes the
//! connect/refresh/settings/query surface the presentation layer consumes.
//! Clones share the same underlying state.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::Settings;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::controller::{DataController, PositionInfo, SatelliteInfo};
use crate::error::ValidationError;
use crate::gps::data::GpsFix;
use crate::gps::device::GpsDevice;
use crate::scheduler::{SchedulerCallback, UpdateScheduler};
use crate::status::{status_channel, StatusEvent, StatusKind, StatusSender};

#[derive(Clone)]
pub struct GpsMonitor {
    controller: Arc<Mutex<DataController>>,
    scheduler: UpdateScheduler,
    status: StatusSender,
}

impl GpsMonitor {
    /// Build a monitor and the status event receiver for it. Must be called
    /// within a tokio runtime.
    pub fn new(settings: &Settings) -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (status, rx) = status_channel();
        (Self::with_status(settings, status), rx)
    }

    /// Build a monitor that reports status through an existing sender.
    pub fn with_status(settings: &Settings, status: StatusSender) -> Self {
        let connection =
            ConnectionManager::new(settings.port.as_str(), settings.baudrate, status.clone());
        let controller = Arc::new(Mutex::new(DataController::new(connection, status.clone())));

        // Each scheduler tick runs one read cycle. A tick that finds the
        // session gone, or loses it mid-read, arms the one-shot reconnect;
        // the tick that fires while the reconnect is pending does not arm
        // another.
        let scheduler = UpdateScheduler::new(
            settings.update_interval(),
            settings.reconnect_interval(),
            |weak| {
                let tick_controller = Arc::clone(&controller);
                let tick_weak = weak.clone();
                let update: SchedulerCallback = Box::new(move || {
                    let mut controller = tick_controller.lock().unwrap();
                    if !controller.is_connected() {
                        if !controller.is_reconnecting() {
                            if let Some(scheduler) = tick_weak.upgrade() {
                                scheduler.schedule_reconnect();
                            }
                        }
                        return;
                    }
                    if !controller.update_gps_data() {
                        if let Some(scheduler) = tick_weak.upgrade() {
                            scheduler.schedule_reconnect();
                        }
                    }
                });

                let reconnect_controller = Arc::clone(&controller);
                let reconnect: SchedulerCallback = Box::new(move || {
                    reconnect_controller
                        .lock()
                        .unwrap()
                        .connection_mut()
                        .reconnect();
                });

                (update, reconnect)
            },
        );

        Self {
            controller,
            scheduler,
            status,
        }
    }

    // Connection operations

    pub fn connect(&self) -> bool {
        self.controller.lock().unwrap().connection_mut().connect()
    }

    pub fn disconnect(&self) {
        self.controller.lock().unwrap().connection_mut().disconnect();
    }

    pub fn reconnect(&self) -> bool {
        self.controller.lock().unwrap().connection_mut().reconnect()
    }

    pub fn state(&self) -> ConnectionState {
        self.controller.lock().unwrap().connection().state()
    }

    pub fn is_connected(&self) -> bool {
        self.controller.lock().unwrap().is_connected()
    }

    /// Install a pre-built session, bypassing `connect()`. For tests.
    pub fn inject_device(&self, device: GpsDevice) {
        self.controller
            .lock()
            .unwrap()
            .connection_mut()
            .inject_device(device);
    }

    // Polling operations

    pub fn start_updates(&self) {
        self.scheduler.start();
    }

    pub fn stop_updates(&self) {
        self.scheduler.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn schedule_reconnect(&self) {
        self.scheduler.schedule_reconnect();
    }

    // Data operations

    pub fn update_gps_data(&self) -> bool {
        self.controller.lock().unwrap().update_gps_data()
    }

    pub fn manual_refresh(&self) -> bool {
        self.controller.lock().unwrap().manual_refresh()
    }

    pub fn current_data(&self) -> Option<GpsFix> {
        self.controller.lock().unwrap().current_data()
    }

    pub fn position_info(&self) -> Option<PositionInfo> {
        self.controller.lock().unwrap().position_info()
    }

    pub fn satellite_info(&self) -> Option<SatelliteInfo> {
        self.controller.lock().unwrap().satellite_info()
    }

    pub fn validate_export_data(&self) -> Result<(), ValidationError> {
        self.controller.lock().unwrap().validate_export_data()
    }

    pub fn last_error(&self) -> Option<String> {
        self.controller
            .lock()
            .unwrap()
            .last_error()
            .map(str::to_string)
    }

    // Settings

    /// Push interval changes to the scheduler and connection changes to the
    /// manager (forcing a fresh connection), then report completion. One
    /// transaction from the caller's point of view.
    pub fn apply_settings(&self, settings: &Settings) {
        self.scheduler.set_update_interval(settings.update_interval());
        self.scheduler
            .set_reconnect_interval(settings.reconnect_interval());
        self.controller
            .lock()
            .unwrap()
            .connection_mut()
            .update_params(Some(settings.port.as_str()), Some(settings.baudrate));
        self.status
            .emit(StatusKind::SettingsApplied, "Settings applied successfully!");
    }

    /// Stop timers and release the device.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.scheduler.cancel_reconnect();
        self.disconnect();
    }
}
