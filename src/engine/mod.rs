pub mod controller;
pub mod emitter;
pub mod session;
pub mod state;
pub mod transport;

pub use controller::CaptureController;
pub use emitter::{EmitOutcome, FrameEmitter};
pub use session::{epoch_millis, CaptureSession};
pub use state::CaptureState;
pub use transport::{run_transport, ChannelTransport, FrameTransport, NullTransport, OutboundFrame};
