pub mod api;
mod apu;
mod audio;
mod bus;
pub mod cheats;
mod constants;
pub mod input;
mod memory;
mod ppu;

pub use api::{
    AudioInterpolationMode, SnesAspectRatio, SnesEmulator, SnesEmulatorConfig, SnesError,
    SnesLoadError, SnesLoadResult,
};
pub use bus::CheatPatch;
pub use cheats::CheatError;
pub use input::{SnesButton, SnesInputDevice, SnesInputs, SnesJoypadState, SuperScopeState};
