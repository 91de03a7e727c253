//! The progressive render cycle and the viewer main loop around it.

use std::time::Instant;

use lumen_core::Scene;
use lumen_math::Vec3;

use crate::config::RenderConfig;
use crate::error::{InputError, RenderResult};
use crate::input::InputReceiver;
use crate::progressive::{Frame, ProgressiveRenderer};
use crate::shading;

/// Consecutive failed cycles `run` tolerates before giving up.
const MAX_FAILED_CYCLES: u32 = 3;

/// Drives progressive rendering of a scene from viewer input.
pub struct RenderLoop {
    scene: Scene,
    renderer: ProgressiveRenderer,
    input: InputReceiver,
    config: RenderConfig,
}

impl RenderLoop {
    pub fn new(
        scene: Scene,
        width: u32,
        height: u32,
        config: RenderConfig,
        input: InputReceiver,
    ) -> Self {
        let renderer = ProgressiveRenderer::new(width, height, &config, input.abort_flag());
        Self {
            scene,
            renderer,
            input,
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &ProgressiveRenderer {
        &self.renderer
    }

    pub fn input(&self) -> &InputReceiver {
        &self.input
    }

    /// Apply the input gathered since the last cycle: resize, then turn
    /// and move the camera.
    pub fn update(&mut self) {
        if let Some((width, height)) = self.input.take_size() {
            if width > 0 && height > 0 {
                self.renderer.resize(width, height);
            }
        }

        let (dx, dy) = self.input.take_look();
        if dx != 0.0 || dy != 0.0 {
            let sensitivity = self.input.config().look_sensitivity;
            self.scene.camera.rotate(dx * sensitivity, -dy * sensitivity);
        }

        let movement = self.input.movement();
        if movement != Vec3::ZERO {
            self.scene.camera.translate(movement);
        }
        self.input.mark_applied();
    }

    /// Run one progressive cycle: passes of increasing depth, calling
    /// `on_frame` after each pass that changed the image, until the image
    /// is exact or it is time to show a new view.
    ///
    /// While the viewer moves the cycle ends once it has used its frame
    /// budget; while still it refines until aborted. The pixel cache is
    /// reset afterwards, the displayed image is kept. Returns whether the
    /// image was completed.
    pub fn render_progressively<F>(&mut self, on_frame: F) -> RenderResult<bool>
    where
        F: FnMut(&Frame),
    {
        self.cycle(&shading::render_pixel, on_frame)
    }

    /// Render until shutdown or until every input sender is gone.
    ///
    /// Each iteration applies input, runs a cycle and, if the image
    /// completed, sleeps until the next input unless the viewer is moving.
    /// A failed cycle is retried; only repeated failures are returned.
    pub fn run<F>(&mut self, on_frame: F) -> RenderResult<()>
    where
        F: FnMut(&Frame),
    {
        self.run_with(&shading::render_pixel, on_frame)
    }

    fn run_with<S, F>(&mut self, sample: &S, mut on_frame: F) -> RenderResult<()>
    where
        S: Fn(&Scene, u32, u32, u32, u32) -> u32 + Sync,
        F: FnMut(&Frame),
    {
        let mut failures = 0;
        loop {
            if let Err(InputError::Disconnected) = self.input.poll() {
                log::info!("Input closed, stopping render loop");
                return Ok(());
            }
            if self.input.is_shutdown() {
                log::info!("Render loop shut down");
                return Ok(());
            }

            self.update();
            let complete = match self.cycle(sample, &mut on_frame) {
                Ok(complete) => {
                    failures = 0;
                    complete
                }
                Err(e) => {
                    failures += 1;
                    if failures >= MAX_FAILED_CYCLES {
                        return Err(e);
                    }
                    log::warn!("Render cycle failed ({}), retrying", e);
                    continue;
                }
            };
            if complete && self.input.wait().is_err() {
                log::info!("Input closed, stopping render loop");
                return Ok(());
            }
        }
    }

    /// One progressive cycle, with `sample(scene, x, y, width, height)`
    /// computing exact pixel colors.
    fn cycle<S, F>(&mut self, sample: &S, mut on_frame: F) -> RenderResult<bool>
    where
        S: Fn(&Scene, u32, u32, u32, u32) -> u32 + Sync,
        F: FnMut(&Frame),
    {
        self.renderer.clear_abort();
        if self.input.has_pending() {
            self.renderer.abort();
        }

        let budget = self.config.frame_budget();
        let mut depth = self.config.initial_depth;
        let mut elapsed = 0.0;

        let result = loop {
            let start = Instant::now();
            let scene = &self.scene;
            let (width, height) = (self.renderer.width(), self.renderer.height());
            let sampler = |x, y| sample(scene, x, y, width, height);

            if let Err(e) = self.renderer.render_pass(depth, &sampler) {
                break Err(e);
            }
            if self.renderer.cells_painted() > 0 {
                on_frame(&self.renderer.frame());
            }
            elapsed += start.elapsed().as_secs_f64();
            depth += 1;

            // Senders going away is noticed by `run`.
            let _ = self.input.poll();
            let moving = self.input.is_moving();
            let aborted = self.renderer.is_aborted();
            let complete = self.renderer.is_complete();

            let keep_refining = (moving && elapsed <= budget) || (!moving && !aborted);
            if complete || !keep_refining {
                log::debug!(
                    "Cycle ended after {:.1} ms at depth {} (complete: {}, moving: {}, aborted: {})",
                    elapsed * 1000.0,
                    depth - 1,
                    complete,
                    moving,
                    aborted
                );
                break Ok(complete);
            }
        };

        self.renderer.reset();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::config::InputConfig;
    use crate::error::RenderError;
    use crate::input::{self, InputSender};
    use lumen_core::{Entity, Light, Surface};

    fn test_scene() -> Scene {
        let mut scene = Scene::default();
        scene.add_entity(Entity::sphere(Vec3::new(5.0, 0.0, 0.0), 2.0, Surface::Diffuse));
        scene.add_entity(Entity::cube(Vec3::new(5.0, 3.0, 0.0), 1.5, Surface::Specular));
        scene.add_light(Light::new(Vec3::new(0.0, 0.0, 3.0), 0xffffff));
        scene
    }

    fn render_loop(width: u32, height: u32, config: RenderConfig) -> (InputSender, RenderLoop) {
        // RUST_LOG=debug shows per-pass timings.
        let _ = env_logger::builder().is_test(true).try_init();
        let (tx, rx) = input::channel(InputConfig::default());
        (tx, RenderLoop::new(test_scene(), width, height, config, rx))
    }

    #[test]
    fn test_update_applies_input() {
        let (tx, mut lp) = render_loop(8, 8, RenderConfig::default());
        tx.look(10.0, 0.0).expect("send");
        tx.movement(0.0, 1.0, false).expect("send");
        tx.resize(4, 2).expect("send");
        lp.input.poll().expect("poll");
        lp.update();

        let camera = lp.scene().camera;
        // Turned towards screen right, then moved forward.
        assert!(camera.direction().y < 0.0);
        assert!((camera.position().length() - 0.3).abs() < 1e-9);
        assert_eq!((lp.renderer().width(), lp.renderer().height()), (4, 2));

        // Look deltas are consumed, movement persists until released.
        lp.update();
        assert!((lp.scene().camera.position().length() - 0.6).abs() < 1e-9);
        assert_eq!(lp.scene().camera.direction(), camera.direction());
    }

    #[test]
    fn test_stationary_cycle_completes_exactly() {
        let (_tx, mut lp) = render_loop(12, 9, RenderConfig::default());
        let mut last = None;
        let mut frames = 0;

        let complete = lp
            .render_progressively(|frame| {
                frames += 1;
                last = Some(frame.clone());
            })
            .expect("cycle");

        assert!(complete);
        assert!(frames >= 1);
        let frame = last.expect("at least one frame");
        for y in 0..9 {
            for x in 0..12 {
                let expected = shading::render_pixel(lp.scene(), x, y, 12, 9);
                assert_eq!(frame.pixels[(y * 12 + x) as usize], expected);
            }
        }
        // Cache cleared for the next cycle, image kept.
        assert_eq!(lp.renderer().pixels_left(), 12 * 9);
        assert_eq!(lp.renderer().frame(), frame);
    }

    #[test]
    fn test_moving_cycle_stops_at_frame_budget() {
        let config = RenderConfig {
            initial_depth: 1,
            target_fps: 1e12,
            ..RenderConfig::default()
        };
        let (tx, mut lp) = render_loop(64, 64, config);
        tx.movement(1.0, 0.0, false).expect("send");
        lp.input.poll().expect("poll");

        let mut frames = 0;
        let complete = lp.render_progressively(|_| frames += 1).expect("cycle");
        assert!(!complete);
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_input_aborts_stationary_cycle() {
        let config = RenderConfig {
            initial_depth: 1,
            ..RenderConfig::default()
        };
        let (tx, mut lp) = render_loop(64, 64, config);

        let mut frames = 0;
        let complete = lp
            .render_progressively(|_| {
                frames += 1;
                tx.look(1.0, 0.0).expect("send");
            })
            .expect("cycle");
        assert!(!complete);
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let (tx, mut lp) = render_loop(32, 32, RenderConfig::default());
        let mut frames = 0;
        lp.run(|_| {
            frames += 1;
            tx.shutdown().expect("send");
        })
        .expect("run");
        assert!(frames >= 1);
        assert!(lp.input().is_shutdown());
    }

    #[test]
    fn test_run_stops_when_senders_drop() {
        let (tx, mut lp) = render_loop(8, 8, RenderConfig::default());
        drop(tx);
        let mut frames = 0;
        lp.run(|_| frames += 1).expect("run");
        assert_eq!(frames, 0);
    }

    #[test]
    fn test_input_during_final_pass_is_applied() {
        // 4x4 completes in the first pass of every cycle.
        let (tx, mut lp) = render_loop(4, 4, RenderConfig::default());
        let mut frames = 0;
        lp.run(|_| {
            frames += 1;
            if frames == 1 {
                tx.look(30.0, 0.0).expect("send");
            } else {
                tx.shutdown().expect("send");
            }
        })
        .expect("run");

        // The look was picked up by a second cycle instead of waiting for
        // more input.
        assert_eq!(frames, 2);
        assert!(lp.scene().camera.direction().y < 0.0);
    }

    #[test]
    fn test_empty_passes_are_not_presented() {
        let config = RenderConfig {
            target_fps: 10.0,
            ..RenderConfig::default()
        };
        let (tx, mut lp) = render_loop(256, 256, config);
        tx.movement(0.0, 1.0, false).expect("send");
        lp.input.poll().expect("poll");

        // After the first frame the abort flag stays up, so every later
        // pass of the cycle skips all its cells.
        let mut frames = 0;
        let complete = lp
            .render_progressively(|_| {
                frames += 1;
                tx.look(1.0, 0.0).expect("send");
            })
            .expect("cycle");
        assert!(!complete);
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_run_retries_failed_cycle() {
        let (tx, mut lp) = render_loop(8, 8, RenderConfig::default());
        let failed = AtomicBool::new(false);
        let sample = |scene: &Scene, x: u32, y: u32, width: u32, height: u32| {
            if !failed.swap(true, Ordering::Relaxed) {
                panic!("sampler failure");
            }
            shading::render_pixel(scene, x, y, width, height)
        };

        let mut last = None;
        lp.run_with(&sample, |frame| {
            last = Some(frame.clone());
            tx.shutdown().expect("send");
        })
        .expect("failed cycle is retried");

        let frame = last.expect("retried cycle presented a frame");
        for y in 0..8 {
            for x in 0..8 {
                let expected = shading::render_pixel(lp.scene(), x, y, 8, 8);
                assert_eq!(frame.pixels[(y * 8 + x) as usize], expected);
            }
        }
    }

    #[test]
    fn test_run_gives_up_after_repeated_failures() {
        let (_tx, mut lp) = render_loop(8, 8, RenderConfig::default());
        let calls = AtomicUsize::new(0);
        let sample = |_: &Scene, _: u32, _: u32, _: u32, _: u32| -> u32 {
            calls.fetch_add(1, Ordering::Relaxed);
            panic!("sampler failure");
        };

        let err = lp.run_with(&sample, |_| {}).unwrap_err();
        assert!(matches!(err, RenderError::WorkerPanicked { .. }));
        // Every quadrant worker fails on its first cell, once per cycle.
        assert_eq!(
            calls.load(Ordering::Relaxed),
            4 * MAX_FAILED_CYCLES as usize
        );
    }
}
