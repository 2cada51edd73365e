//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop tying keyboard input, the session and the
//!   reader task together.
//! - [`renderer`] and [`view`]: frame layout and screen state.
//! - [`markdown`], [`math`] and [`theme`]: how a normalized reply looks.
//!
//! This layer only presents and captures interaction state; the transcript
//! and streaming live in [`crate::core`].

pub mod chat_loop;
pub mod markdown;
pub mod math;
pub mod renderer;
pub mod theme;
pub mod view;
