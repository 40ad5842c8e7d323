mod clock;
mod engine;
mod phase;

pub use clock::{ClockState, SessionClock, TickHandler};
pub use engine::{Advance, Looping, PassPlan, PhaseSequencer, PlanProgress, Signal};
pub use phase::{Phase, PhaseKind, PhaseList, EPSILON};
