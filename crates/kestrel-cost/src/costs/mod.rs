//! Residual cost models
//!
//! | cost | residual |
//! |---|---|
//! | [`CostState`] | `diff(xref, x)` |
//! | [`CostControl`] | `u - uref` |
//! | [`CostComPosition`] | `com - cref` |
//! | [`CostFramePlacement`] | placement error of a frame |
//! | [`CostFrameTranslation`] | `p_frame - pref` |
//! | [`CostFrameVelocity`] | `v_frame - vref` |

mod state;
mod control;
mod com;
mod frame;

pub use state::*;
pub use control::*;
pub use com::*;
pub use frame::*;
