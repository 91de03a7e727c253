//! Viewer input, carried from the window thread to the render loop.
//!
//! The window side holds an [`InputSender`]; the render loop owns the
//! [`InputReceiver`]. Both share the abort flag of the progressive
//! renderer: any event that should change the picture raises it, so an
//! in-flight refinement cycle stops early and the next one starts from
//! the new view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use lumen_math::{normalize, Vec3};

use crate::config::InputConfig;
use crate::error::InputError;

/// A viewer input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse travel in pixels while looking around
    Look { dx: f64, dy: f64 },
    /// Held movement keys: `x` strafes right, `y` moves forward, each in
    /// [-1, 1]. Sent whenever the held set changes.
    Movement { x: f64, y: f64, slow: bool },
    /// New display size in pixels
    Resize { width: u32, height: u32 },
    Shutdown,
}

impl InputEvent {
    /// Whether the event invalidates the image being refined.
    fn interrupts(&self) -> bool {
        match *self {
            InputEvent::Movement { x, y, .. } => x != 0.0 || y != 0.0,
            _ => true,
        }
    }
}

/// Create a connected sender/receiver pair with a fresh abort flag.
pub fn channel(config: InputConfig) -> (InputSender, InputReceiver) {
    let (tx, rx) = channel::unbounded();
    let abort = Arc::new(AtomicBool::new(false));

    let sender = InputSender {
        tx,
        abort: Arc::clone(&abort),
    };
    let receiver = InputReceiver {
        rx,
        abort,
        config,
        look: (0.0, 0.0),
        movement: Vec3::ZERO,
        size: None,
        shutdown: false,
        changed: false,
    };
    (sender, receiver)
}

/// Producer half, held by the window thread.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: Sender<InputEvent>,
    abort: Arc<AtomicBool>,
}

impl InputSender {
    /// Queue an event, raising the abort flag if it changes the view.
    pub fn send(&self, event: InputEvent) -> Result<(), InputError> {
        self.tx.send(event).map_err(|_| InputError::Disconnected)?;
        if event.interrupts() {
            self.abort.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn look(&self, dx: f64, dy: f64) -> Result<(), InputError> {
        self.send(InputEvent::Look { dx, dy })
    }

    pub fn movement(&self, x: f64, y: f64, slow: bool) -> Result<(), InputError> {
        self.send(InputEvent::Movement { x, y, slow })
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<(), InputError> {
        self.send(InputEvent::Resize { width, height })
    }

    pub fn shutdown(&self) -> Result<(), InputError> {
        self.send(InputEvent::Shutdown)
    }
}

/// Consumer half: folds events into the state the render loop reads
/// between cycles.
#[derive(Debug)]
pub struct InputReceiver {
    rx: Receiver<InputEvent>,
    abort: Arc<AtomicBool>,
    config: InputConfig,
    /// Mouse travel since the last `take_look`
    look: (f64, f64),
    /// Camera movement per cycle, already speed scaled
    movement: Vec3,
    /// Latest requested display size, until taken
    size: Option<(u32, u32)>,
    shutdown: bool,
    /// Events applied since the render loop last consumed them
    changed: bool,
}

impl InputReceiver {
    /// The abort flag raised by the senders.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Apply every queued event without blocking.
    ///
    /// Returns `Err` only once all senders are gone and the queue is empty.
    pub fn poll(&mut self) -> Result<(), InputError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err(InputError::Disconnected),
            }
        }
    }

    /// Block until an event arrives, then apply everything queued.
    ///
    /// Returns at once while the viewer is moving, or when events were
    /// already applied that the render loop has not picked up yet.
    pub fn wait(&mut self) -> Result<(), InputError> {
        if !self.changed && !self.is_moving() && !self.shutdown {
            let event = self.rx.recv().map_err(|_| InputError::Disconnected)?;
            self.apply(event);
        }
        self.poll()
    }

    /// Whether events are queued but not yet applied.
    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Whether applied events have not been consumed by the render loop.
    pub fn has_changes(&self) -> bool {
        self.changed
    }

    /// Note that the render loop has picked up every applied event.
    pub fn mark_applied(&mut self) {
        self.changed = false;
    }

    /// Whether any movement key is held.
    pub fn is_moving(&self) -> bool {
        self.movement != Vec3::ZERO
    }

    /// Camera movement to apply this cycle.
    pub fn movement(&self) -> Vec3 {
        self.movement
    }

    /// Accumulated mouse travel, in pixels, since the last call.
    pub fn take_look(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.look)
    }

    /// Requested display size, if it changed since the last call.
    pub fn take_size(&mut self) -> Option<(u32, u32)> {
        self.size.take()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Look { dx, dy } => {
                self.look.0 += dx;
                self.look.1 += dy;
                self.changed = true;
            }
            InputEvent::Movement { x, y, slow } => {
                let mut movement = normalize(Vec3::new(x, y, 0.0)) * self.config.move_speed;
                if slow {
                    movement *= self.config.slow_factor;
                }
                if movement != self.movement {
                    self.movement = movement;
                    self.changed = true;
                }
            }
            InputEvent::Resize { width, height } => {
                self.size = Some((width, height));
                self.changed = true;
            }
            InputEvent::Shutdown => {
                log::debug!("Shutdown requested");
                self.shutdown = true;
                self.changed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_raised(flag: &Arc<AtomicBool>) -> bool {
        flag.swap(false, Ordering::Relaxed)
    }

    #[test]
    fn test_events_accumulate() {
        let (tx, mut rx) = channel(InputConfig::default());
        tx.look(3.0, -1.0).expect("send");
        tx.look(2.0, 4.0).expect("send");
        tx.resize(640, 480).expect("send");
        tx.resize(800, 600).expect("send");
        rx.poll().expect("poll");

        assert_eq!(rx.take_look(), (5.0, 3.0));
        assert_eq!(rx.take_look(), (0.0, 0.0));
        assert_eq!(rx.take_size(), Some((800, 600)));
        assert_eq!(rx.take_size(), None);
        assert!(!rx.is_moving());
    }

    #[test]
    fn test_movement_is_normalized_and_scaled() {
        let config = InputConfig::default();
        let (tx, mut rx) = channel(config.clone());

        tx.movement(1.0, 1.0, false).expect("send");
        rx.poll().expect("poll");
        assert!(rx.is_moving());
        assert!((rx.movement().length() - config.move_speed).abs() < 1e-12);
        assert!(rx.movement().x > 0.0 && rx.movement().y > 0.0);

        tx.movement(0.0, -1.0, true).expect("send");
        rx.poll().expect("poll");
        let expected = Vec3::new(0.0, -config.move_speed * config.slow_factor, 0.0);
        assert!((rx.movement() - expected).length() < 1e-12);

        tx.movement(0.0, 0.0, false).expect("send");
        rx.poll().expect("poll");
        assert!(!rx.is_moving());
    }

    #[test]
    fn test_interrupting_events_raise_abort() {
        let (tx, mut rx) = channel(InputConfig::default());
        let abort = rx.abort_flag();

        tx.look(1.0, 0.0).expect("send");
        assert!(is_raised(&abort));
        tx.movement(0.0, 1.0, false).expect("send");
        assert!(is_raised(&abort));
        tx.resize(10, 10).expect("send");
        assert!(is_raised(&abort));

        // Releasing every key lets the current cycle keep refining.
        tx.movement(0.0, 0.0, false).expect("send");
        assert!(!is_raised(&abort));

        tx.shutdown().expect("send");
        assert!(is_raised(&abort));
        rx.poll().expect("poll");
        assert!(rx.is_shutdown());
    }

    #[test]
    fn test_wait_blocks_for_event() {
        let (tx, mut rx) = channel(InputConfig::default());
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            tx.look(1.0, 1.0).expect("send");
            tx
        });

        rx.wait().expect("wait");
        assert_eq!(rx.take_look(), (1.0, 1.0));
        drop(handle.join().expect("sender thread"));
    }

    #[test]
    fn test_wait_returns_immediately_while_moving() {
        let (tx, mut rx) = channel(InputConfig::default());
        tx.movement(1.0, 0.0, false).expect("send");
        rx.poll().expect("poll");

        rx.wait().expect("moving never blocks");
        assert!(rx.is_moving());
    }

    #[test]
    fn test_wait_returns_for_unconsumed_events() {
        let (tx, mut rx) = channel(InputConfig::default());
        tx.look(4.0, 0.0).expect("send");
        rx.poll().expect("poll");
        assert!(rx.has_changes());

        // Already applied, so nothing is left on the channel to wake on.
        rx.wait().expect("does not block");
        assert_eq!(rx.take_look(), (4.0, 0.0));

        rx.mark_applied();
        assert!(!rx.has_changes());

        // Repeating the held keys changes nothing.
        tx.movement(0.0, 0.0, false).expect("send");
        rx.poll().expect("poll");
        assert!(!rx.has_changes());
        drop(tx);
    }

    #[test]
    fn test_disconnect() {
        let (tx, mut rx) = channel(InputConfig::default());
        tx.look(1.0, 0.0).expect("send");
        drop(tx);

        // Queued events are still delivered first.
        assert_eq!(rx.poll(), Err(InputError::Disconnected));
        assert_eq!(rx.take_look(), (1.0, 0.0));
        assert_eq!(rx.wait(), Err(InputError::Disconnected));

        let (tx, rx) = channel(InputConfig::default());
        drop(rx);
        assert_eq!(tx.look(1.0, 0.0), Err(InputError::Disconnected));
    }
}
