pub mod console;
pub mod input_driver;
pub mod output_driver;
pub mod utils;

pub use input_driver::{InputDriver, spawn_input_thread};
pub use output_driver::{OutputDriver, TerminalOutput};
