//! Mission façade crate: segments, the network extension contract, the
//! evaluator, and the conversion of definition files into runtime types.

pub mod evaluate;
pub mod mission;
pub mod segment;

pub use evaluate::{
    BatteryState, ControlPointState, EvaluateError, PropulsorState, Results, SegmentResults,
    evaluate,
};
pub use facade::*;
pub use mission::{Mission, MissionError};
pub use segment::{BatteryCharge, CruiseProfile, Segment, SegmentExtension, SpeedTarget};

mod facade;
