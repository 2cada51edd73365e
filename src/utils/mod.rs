pub mod logging;
pub mod scroll;
