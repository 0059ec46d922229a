mod engine;

pub use engine::{
    next_session, RunState, TimerEngine, TimerSnapshot, TimerState, IDLE_GLYPH,
    LONG_BREAK_EVERY, OVERLAY_WINDOW_SECS,
};
