//! Frame rendering: the composite view, the full-screen view and transitions between them.

pub(crate) mod canvas;
pub(crate) mod composite;
pub(crate) mod frame;
pub(crate) mod ring;
pub(crate) mod transition;

pub use composite::{CompositorParams, FrameCompositor};
pub use frame::Frame;
pub use ring::{DEFAULT_RING_CAPACITY, FrameRing};
pub use transition::{TransitionBlender, TransitionParams};
