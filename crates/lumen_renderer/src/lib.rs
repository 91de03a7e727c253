//! Lumen renderer - progressive CPU ray tracing.
//!
//! Rays are resolved to colors through mirror reflection, glass
//! refraction and shadowed diffuse lighting. The image is refined
//! progressively by four quadrant worker threads, coarse first, and the
//! refinement can be interrupted whenever viewer input arrives.

mod config;
mod error;
pub mod input;
mod progressive;
mod render_loop;
pub mod shading;

pub use config::{InputConfig, RenderConfig};
pub use error::{InputError, RenderError, RenderResult};
pub use input::{InputEvent, InputReceiver, InputSender};
pub use progressive::{Frame, ProgressiveRenderer, Region, UNSET};
pub use render_loop::RenderLoop;
pub use shading::{ray_color, render_pixel};
