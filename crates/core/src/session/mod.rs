//! Session state: scrollback, history, the terminal state machine and
//! its async controller

mod buffer;
pub mod controller;
mod history;
mod terminal;

pub use buffer::ScrollbackBuffer;
pub use controller::{
    CloseCallback, LogObserver, SessionObserver, SessionOptions, SessionTiming, TerminalSession,
};
pub use history::{CommandHistory, InputEditor};
pub use terminal::{SessionSnapshot, Terminal};
