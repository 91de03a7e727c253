//! Interactive viewer window.
//!
//! The window lives on the main thread and only gathers input and shows
//! frames; the render loop runs on its own thread and talks back through
//! channels.

use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{self, Receiver, Sender};
use lumen_core::Scene;
use lumen_renderer::input::{self, InputSender};
use lumen_renderer::{Frame, InputError, RenderLoop};
use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};

use crate::config::{KeyBindings, ViewerConfig};

/// Input state carried between window updates.
struct Controls {
    keys: KeyBindings,
    size: (usize, usize),
    last_mouse: Option<(f32, f32)>,
    movement: (f64, f64, bool),
}

impl Controls {
    /// Turn the window's current input state into events.
    fn pump(&mut self, window: &Window, tx: &InputSender) -> Result<(), InputError> {
        let size = window.get_size();
        if size != self.size && size.0 > 0 && size.1 > 0 {
            self.size = size;
            tx.resize(size.0 as u32, size.1 as u32)?;
        }

        if window.get_mouse_down(MouseButton::Left) {
            if let Some(pos) = window.get_mouse_pos(MouseMode::Pass) {
                if let Some(last) = self.last_mouse {
                    let (dx, dy) = (pos.0 - last.0, pos.1 - last.1);
                    if dx != 0.0 || dy != 0.0 {
                        tx.look(dx as f64, dy as f64)?;
                    }
                }
                self.last_mouse = Some(pos);
            }
        } else {
            self.last_mouse = None;
        }

        let movement = self.keys.movement(window);
        if movement != self.movement {
            self.movement = movement;
            tx.movement(movement.0, movement.1, movement.2)?;
        }
        Ok(())
    }
}

/// Open the window and render `scene` interactively until it is closed.
pub fn run(scene: Scene, config: ViewerConfig) -> Result<()> {
    let (width, height) = (config.width as usize, config.height as usize);
    let mut window = Window::new(
        "Lumen",
        width,
        height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .context("Failed to create window")?;
    window.set_target_fps(60);
    log::info!("Window created ({}x{})", width, height);

    let (tx, rx) = input::channel(config.input.clone());
    // One slot holding the newest frame.
    let (frame_tx, frame_rx) = channel::bounded::<Frame>(1);
    let stale_rx = frame_rx.clone();

    let render_config = config.render.clone();
    let render_thread = thread::Builder::new()
        .name("lumen-render".to_string())
        .spawn(move || {
            let mut render_loop =
                RenderLoop::new(scene, width as u32, height as u32, render_config, rx);
            render_loop.run(|frame| replace_latest(&frame_tx, &stale_rx, frame))
        })
        .context("Failed to spawn render thread")?;

    let mut controls = Controls {
        keys: config.keys.clone(),
        size: (width, height),
        last_mouse: None,
        movement: (0.0, 0.0, false),
    };
    let mut display = Frame {
        width: width as u32,
        height: height as u32,
        pixels: vec![0; width * height],
    };

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if let Err(e) = controls.pump(&window, &tx) {
            log::error!("Render thread stopped: {}", e);
            break;
        }
        if let Ok(frame) = frame_rx.try_recv() {
            display = frame;
        }
        window
            .update_with_buffer(
                &display.pixels,
                display.width as usize,
                display.height as usize,
            )
            .context("Failed to present frame")?;
    }

    log::info!("Closing viewer");
    // Fails only if the render thread already exited; join reports why.
    let _ = tx.shutdown();
    drop(tx);
    drop(frame_rx);

    render_thread
        .join()
        .map_err(|_| anyhow!("Render thread panicked"))?
        .context("Rendering failed")
}

/// Put `frame` in the one-frame slot, dropping a frame the window has not
/// shown yet. Only the render thread sends, so the slot is free after the
/// drain.
fn replace_latest(tx: &Sender<Frame>, stale: &Receiver<Frame>, frame: &Frame) {
    let _ = stale.try_recv();
    let _ = tx.try_send(frame.clone());
}
