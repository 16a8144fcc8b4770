//! Color-coded GPU picking.
//!
//! Shapes are rendered off-screen with their index encoded as a flat RGB
//! color; the pixel under the cursor is read back and decoded.

mod codec;
mod system;

pub use codec::{index_to_color, index_to_rgb, rgb_to_index, BACKGROUND_INDEX, MAX_PICK_INDEX};
pub use system::PickingSystem;
