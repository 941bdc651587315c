//! Canvas data model.
//!
//! Every drawable is a [`Canvas`] (CPU pixels + lazily allocated surface)
//! wrapped with the state its role needs:
//! - [`Background`]: full-window base layer, streamed every frame
//! - [`Layer`]: full-window overlay with a [`BlendMode`](crate::surface::BlendMode)
//! - [`Sprite`]: positioned, transformed, z-ordered; uploaded on change
//!
//! Surfaces are owned by a backend. Releasing them is explicit
//! (`release_surface`, [`SpriteCollection`] mutation, window shutdown).

mod background;
mod base;
mod collection;
mod layer;
pub(crate) mod pixel;
mod sprite;

pub use background::Background;
pub use base::Canvas;
pub use collection::SpriteCollection;
pub use layer::Layer;
pub use pixel::Pixel;
pub use sprite::{Flip, Sprite, SpriteId};
