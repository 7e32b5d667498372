//! Cartridge-side coprocessors for the SNES emulation core.
//!
//! Only the Super FX-class vector/RISC coprocessor is implemented; cartridges that require a
//! math coprocessor (DSP-1 through DSP-4, ST010/ST011) or another accelerator are rejected at
//! load time by the engine.

pub mod common;
pub mod superfx;
