//! Frame-based, multi-layer animation sequencing.
//!
//! An `Animation` holds one or more *layers*, each an equally long sequence of
//! frames. All layers advance together; `current_frame()` yields the stack of
//! layer frames for the current index, bottom layer first, so a caller can
//! composite paper-doll style (body, clothing, hair, ...).
//!
//! Timing is integer nanoseconds (`u64`). A frame advances once the
//! accumulated time *exceeds* the frame time; the accumulator then restarts
//! from zero rather than carrying the remainder. A non-looping animation that
//! wraps past its last frame is marked done and stays on frame 0.
//!
//! The frame type is generic so the core stays independent of any image
//! representation; the game crate instantiates it with shared image handles.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("animation has no layers")]
    NoLayers,
    #[error("animation layer {layer} has no frames")]
    EmptyLayer { layer: usize },
    #[error("animation layer {layer} has {found} frames, expected {expected}")]
    LayerLengthMismatch {
        layer: usize,
        expected: usize,
        found: usize,
    },
    #[error("animation frame time must be > 0")]
    ZeroFrameTime,
}

#[derive(Debug, Clone)]
pub struct Animation<F> {
    name: String,
    /// frames[i] is the layer stack shown at frame index i.
    frames: Vec<Vec<F>>,
    frame_time_ns: u64,
    looping: bool,
    cancellable: bool,
    current_frame: usize,
    elapsed_ns: u64,
    done: bool,
}

impl<F> Animation<F> {
    /// Build an animation from layer-major frame lists. Every layer must have
    /// the same, non-zero number of frames.
    pub fn new(
        name: impl Into<String>,
        layers: Vec<Vec<F>>,
        frame_time_ns: u64,
        looping: bool,
    ) -> Result<Self, AnimationError> {
        if layers.is_empty() {
            return Err(AnimationError::NoLayers);
        }
        if frame_time_ns == 0 {
            return Err(AnimationError::ZeroFrameTime);
        }
        let frame_count = layers[0].len();
        for (layer, frames) in layers.iter().enumerate() {
            if frames.is_empty() {
                return Err(AnimationError::EmptyLayer { layer });
            }
            if frames.len() != frame_count {
                return Err(AnimationError::LayerLengthMismatch {
                    layer,
                    expected: frame_count,
                    found: frames.len(),
                });
            }
        }

        let mut frames: Vec<Vec<F>> = (0..frame_count)
            .map(|_| Vec::with_capacity(layers.len()))
            .collect();
        for layer in layers {
            for (index, frame) in layer.into_iter().enumerate() {
                frames[index].push(frame);
            }
        }

        Ok(Self {
            name: name.into(),
            frames,
            frame_time_ns,
            looping,
            cancellable: true,
            current_frame: 0,
            elapsed_ns: 0,
            done: false,
        })
    }

    /// Mark this animation as uninterruptible while it is running.
    #[must_use]
    pub fn uncancellable(mut self) -> Self {
        self.cancellable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn layer_count(&self) -> usize {
        self.frames[0].len()
    }

    pub fn frame_time_ns(&self) -> u64 {
        self.frame_time_ns
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn can_cancel(&self) -> bool {
        self.cancellable
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn current_index(&self) -> usize {
        self.current_frame
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed_ns
    }

    /// Advance playback by `dt_ns`. At most one frame is advanced per call.
    pub fn update(&mut self, dt_ns: u64) {
        if self.done {
            return;
        }
        self.elapsed_ns = self.elapsed_ns.saturating_add(dt_ns);
        if self.elapsed_ns > self.frame_time_ns {
            self.current_frame += 1;
            if self.current_frame == self.frames.len() {
                self.current_frame = 0;
                if !self.looping {
                    self.done = true;
                }
            }
            self.elapsed_ns = 0;
        }
    }

    /// Return to the first frame with a cleared accumulator and done flag.
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.elapsed_ns = 0;
        self.done = false;
    }

    /// Layer stack for the current frame, bottom layer first.
    pub fn current_frame(&self) -> &[F] {
        &self.frames[self.current_frame]
    }

    /// Layer stack of the first frame, used as a still image.
    pub fn first_frame(&self) -> &[F] {
        &self.frames[0]
    }
}
