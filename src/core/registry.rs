//! Device registry shared between the logger API and the dispatcher
//!
//! Every slot remembers the message sequence number that was current when
//! it was registered (its epoch). A device receives exactly the messages
//! whose sequence is at or after its epoch, so a device added after a
//! `log` call never sees that message, no matter how far behind the
//! dispatcher is.

use super::{
    device::{Delivery, DeviceHandle, GatedDevice, SeverityThreshold},
    error::{LoggerError, Result},
    message::Message,
    severity::Severity,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) struct DeviceSlot {
    handle: DeviceHandle,
    epoch: u64,
    name: String,
    threshold: Arc<SeverityThreshold>,
    device: Mutex<GatedDevice>,
}

impl DeviceSlot {
    pub(crate) fn handle(&self) -> DeviceHandle {
        self.handle
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Whether the message was submitted after this device was registered
    #[inline]
    pub(crate) fn covers(&self, message: &Message) -> bool {
        message.sequence() >= self.epoch
    }

    pub(crate) fn deliver(&self, message: &Message) -> Result<Delivery> {
        self.device.lock().deliver(message)
    }

    pub(crate) fn flush(&self) -> Result<()> {
        self.device.lock().flush()
    }
}

pub(crate) type Snapshot = Arc<Vec<Arc<DeviceSlot>>>;

struct RegistryInner {
    slots: Snapshot,
    next_handle: u64,
}

pub(crate) struct DeviceRegistry {
    inner: RwLock<RegistryInner>,
}

impl DeviceRegistry {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                slots: Arc::new(Vec::new()),
                next_handle: 0,
            }),
        }
    }

    /// Insert a device. `sequence` is the logger's next message sequence; it
    /// is read under the write lock so the dispatcher cannot observe a
    /// message the new slot should cover before the slot is visible.
    pub(crate) fn register(&self, device: GatedDevice, sequence: &AtomicU64) -> DeviceHandle {
        let mut inner = self.inner.write();
        let handle = DeviceHandle::from_raw(inner.next_handle);
        inner.next_handle += 1;

        let slot = Arc::new(DeviceSlot {
            handle,
            epoch: sequence.load(Ordering::SeqCst),
            name: device.name().to_string(),
            threshold: Arc::clone(device.threshold()),
            device: Mutex::new(device),
        });

        let mut slots = Vec::with_capacity(inner.slots.len() + 1);
        slots.extend(inner.slots.iter().cloned());
        slots.push(slot);
        inner.slots = Arc::new(slots);

        handle
    }

    /// Devices registered right now, in handle order
    pub(crate) fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.inner.read().slots)
    }

    fn find(&self, handle: DeviceHandle) -> Result<Arc<DeviceSlot>> {
        self.inner
            .read()
            .slots
            .iter()
            .find(|slot| slot.handle == handle)
            .cloned()
            .ok_or_else(|| LoggerError::unknown_device(handle))
    }

    pub(crate) fn set_severity(&self, handle: DeviceHandle, severity: Severity) -> Result<()> {
        self.find(handle)?.threshold.set(severity);
        Ok(())
    }

    pub(crate) fn set_all(&self, severity: Severity) {
        for slot in self.snapshot().iter() {
            slot.threshold.set(severity);
        }
    }

    pub(crate) fn severity(&self, handle: DeviceHandle) -> Result<Severity> {
        Ok(self.find(handle)?.threshold.get())
    }

    pub(crate) fn handles(&self) -> Vec<DeviceHandle> {
        self.snapshot().iter().map(|slot| slot.handle).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().slots.len()
    }
}
