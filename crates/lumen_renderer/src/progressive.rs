//! Progressive, interruptible tile renderer.
//!
//! Each pass splits the image into four quadrants, one worker thread per
//! quadrant, and every worker recursively subdivides its quadrant into
//! cells. Each cell is filled with the color of its center pixel, so a
//! shallow pass gives a blocky preview and every deeper pass refines it.
//! Center colors are cached per pixel, so work done by earlier passes of
//! the same cycle is never repeated; once every pixel has been sampled the
//! image is exact.
//!
//! Workers poll a shared abort flag, but only while working on coarse
//! subdivisions, so the first passes of a cycle always finish.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};

/// Cache marker for a pixel whose color has not been computed.
pub const UNSET: u32 = u32::MAX;

const QUADRANTS: usize = 4;

/// A half-open pixel rectangle `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The whole `width` x `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Split point, rounded towards the top-left.
    pub fn center(&self) -> (u32, u32) {
        (
            self.x1 + (self.x2 - self.x1) / 2,
            self.y1 + (self.y2 - self.y1) / 2,
        )
    }

    /// Top-left, top-right, bottom-left and bottom-right quarters.
    pub fn quadrants(&self) -> [Region; QUADRANTS] {
        let (mx, my) = self.center();
        [
            Region::new(self.x1, self.y1, mx, my),
            Region::new(mx, self.y1, self.x2, my),
            Region::new(self.x1, my, mx, self.y2),
            Region::new(mx, my, self.x2, self.y2),
        ]
    }
}

/// A snapshot of the image, packed 0xRRGGBB, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

/// Image, pixel cache and scheduling state shared by the quadrant workers.
pub struct ProgressiveRenderer {
    width: u32,
    height: u32,
    /// What is displayed, refined each pass
    image: Vec<AtomicU32>,
    /// Exact pixel colors computed this cycle, or `UNSET`
    cache: Vec<AtomicU32>,
    pixels_left: AtomicUsize,
    /// Cells filled during the current or last pass
    painted: AtomicUsize,
    /// Pixels each quadrant computed during the previous pass
    worker_work: [usize; QUADRANTS],
    abort: Arc<AtomicBool>,
    abort_check_depth: u32,
}

impl ProgressiveRenderer {
    /// Create a black image with an empty cache.
    pub fn new(width: u32, height: u32, config: &RenderConfig, abort: Arc<AtomicBool>) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            image: atomic_buffer(len, 0),
            cache: atomic_buffer(len, UNSET),
            pixels_left: AtomicUsize::new(len),
            painted: AtomicUsize::new(0),
            worker_work: [0; QUADRANTS],
            abort,
            abort_check_depth: config.abort_check_depth,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels not yet computed this cycle.
    pub fn pixels_left(&self) -> usize {
        self.pixels_left.load(Ordering::Relaxed)
    }

    pub fn is_complete(&self) -> bool {
        self.pixels_left() == 0
    }

    /// Cells the last pass filled. Zero means the image did not change.
    pub fn cells_painted(&self) -> usize {
        self.painted.load(Ordering::Relaxed)
    }

    /// Pixels each quadrant computed in the last pass, in top-left,
    /// top-right, bottom-left, bottom-right order.
    pub fn worker_work(&self) -> [usize; QUADRANTS] {
        self.worker_work
    }

    /// The abort flag workers poll.
    pub fn abort_flag(&self) -> &Arc<AtomicBool> {
        &self.abort
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Ask in-flight workers to stop at their next check.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn clear_abort(&self) {
        self.abort.store(false, Ordering::Relaxed);
    }

    /// Displayed color at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.image[self.index(x, y)].load(Ordering::Relaxed)
    }

    /// Cached exact color at (`x`, `y`), if computed this cycle.
    pub fn cached(&self, x: u32, y: u32) -> Option<u32> {
        match self.cache[self.index(x, y)].load(Ordering::Relaxed) {
            UNSET => None,
            color => Some(color),
        }
    }

    /// Copy the displayed image.
    pub fn frame(&self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            pixels: self
                .image
                .iter()
                .map(|p| p.load(Ordering::Relaxed))
                .collect(),
        }
    }

    /// Run one pass with recursion budget `depth`.
    ///
    /// Each quadrant is subdivided `depth - 1` times. Quadrants that did
    /// the least work in the previous pass are started first. `sampler`
    /// computes the exact color of a pixel and is called at most once per
    /// pixel per cycle.
    pub fn render_pass<F>(&mut self, depth: u32, sampler: &F) -> RenderResult<()>
    where
        F: Fn(u32, u32) -> u32 + Sync,
    {
        let quadrants = Region::full(self.width, self.height).quadrants();
        let order = start_order(self.worker_work);
        let depth = depth.saturating_sub(1);
        self.painted.store(0, Ordering::Relaxed);

        let this = &*self;
        let (work, failure) = thread::scope(|scope| {
            let mut failure = None;
            let mut handles = Vec::with_capacity(QUADRANTS);
            for quadrant in order {
                let region = quadrants[quadrant];
                let spawned = thread::Builder::new()
                    .name(format!("lumen-quadrant-{}", quadrant))
                    .spawn_scoped(scope, move || this.walk(region, depth, sampler));
                match spawned {
                    Ok(handle) => handles.push((quadrant, handle)),
                    Err(e) => {
                        failure = Some(RenderError::Spawn(e));
                        break;
                    }
                }
            }

            let mut work = [0; QUADRANTS];
            for (quadrant, handle) in handles {
                match handle.join() {
                    Ok(count) => work[quadrant] = count,
                    Err(_) => {
                        failure.get_or_insert(RenderError::WorkerPanicked { quadrant });
                    }
                }
            }
            (work, failure)
        });

        self.worker_work = work;
        log::debug!(
            "Pass depth {}: work {:?}, {} cells, {} pixels left",
            depth + 1,
            work,
            self.cells_painted(),
            self.pixels_left()
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Forget every cached color. The displayed image is kept.
    pub fn reset(&mut self) {
        for slot in &self.cache {
            slot.store(UNSET, Ordering::Relaxed);
        }
        self.pixels_left.store(self.cache.len(), Ordering::Relaxed);
    }

    /// Reallocate for a new size, keeping the overlapping part of the
    /// displayed image. Everything else starts black, and the cache is
    /// reset.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }

        let len = width as usize * height as usize;
        let image = atomic_buffer(len, 0);
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                let color = self.pixel(x, y);
                image[(y * width + x) as usize].store(color, Ordering::Relaxed);
            }
        }

        log::info!(
            "Resized render target {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;
        self.image = image;
        self.cache = atomic_buffer(len, UNSET);
        self.reset();
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Recursively refine `region`. Returns the number of pixels computed.
    fn walk<F>(&self, region: Region, depth: u32, sampler: &F) -> usize
    where
        F: Fn(u32, u32) -> u32 + Sync,
    {
        if depth > self.abort_check_depth && self.is_aborted() {
            return 0;
        }
        if region.is_empty() {
            return 0;
        }
        if depth == 0 {
            return self.render_cell(region, sampler);
        }
        region
            .quadrants()
            .into_iter()
            .map(|quarter| self.walk(quarter, depth - 1, sampler))
            .sum()
    }

    /// Fill `region` with the color of its center pixel.
    fn render_cell<F>(&self, region: Region, sampler: &F) -> usize
    where
        F: Fn(u32, u32) -> u32 + Sync,
    {
        let (cx, cy) = region.center();
        let slot = &self.cache[self.index(cx, cy)];

        let (color, computed) = match slot.load(Ordering::Relaxed) {
            UNSET => {
                let color = sampler(cx, cy) & 0xffffff;
                slot.store(color, Ordering::Relaxed);
                self.pixels_left.fetch_sub(1, Ordering::Relaxed);
                (color, 1)
            }
            color => (color, 0),
        };
        self.painted.fetch_add(1, Ordering::Relaxed);

        for y in region.y1..region.y2 {
            let row = self.index(region.x1, y);
            let cells = (region.x2 - region.x1) as usize;
            for pixel in &self.image[row..row + cells] {
                pixel.store(color, Ordering::Relaxed);
            }
        }
        computed
    }
}

fn atomic_buffer(len: usize, value: u32) -> Vec<AtomicU32> {
    (0..len).map(|_| AtomicU32::new(value)).collect()
}

/// Quadrants ordered by ascending previous work, ties in quadrant order.
fn start_order(work: [usize; QUADRANTS]) -> [usize; QUADRANTS] {
    let mut order = [0, 1, 2, 3];
    order.sort_by_key(|&quadrant| work[quadrant]);
    order
}
