//! Control of an 8-channel relay board attached through a USB serial adapter.
//!
//! [`rm8_ctl::Rm8Control`] runs single command transactions against the board,
//! [`rm8::Rm8Board`] adds the remembered relay states and descriptions on top.

pub mod descriptions;
pub mod port_resolver;
pub mod rm8;
pub mod rm8_ctl;
pub mod rm8_frames;
pub mod rm8_types;
pub mod state_store;
