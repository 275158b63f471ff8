//! Proximity zones that run a callback while another entity overlaps them.

use std::fmt;
use std::sync::Arc;

use haven_core::Rectangle;

pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;

/// A box relative to the owning entity plus an optional callback.
///
/// Not `Clone`: use `duplicate`, which copies the box and shares the
/// callback.
pub struct Trigger {
    bounding_box: Rectangle,
    callback: Option<TriggerCallback>,
}

impl Trigger {
    pub fn new(bounding_box: Rectangle) -> Self {
        Self {
            bounding_box,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn set_callback(&mut self, callback: TriggerCallback) {
        self.callback = Some(callback);
    }

    pub fn bounding_box(&self) -> Rectangle {
        self.bounding_box
    }

    pub fn set_bounding_box(&mut self, bounding_box: Rectangle) {
        self.bounding_box = bounding_box;
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Independent box, same callback instance.
    pub fn duplicate(&self) -> Self {
        Self {
            bounding_box: self.bounding_box,
            callback: self.callback.clone(),
        }
    }

    /// Runs the callback, if any. No edge detection: the caller fires this on
    /// every tick an overlap is observed.
    pub fn fire(&self) {
        if let Some(callback) = &self.callback {
            callback();
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("bounding_box", &self.bounding_box)
            .field("has_callback", &self.has_callback())
            .finish()
    }
}
