//! Fuzz target: console command lines
//!
//! Verifies that `AppCommand::parse` never panics and that a parsed
//! `state <name>` either names a real state or is rejected by the FSM
//! lookup, never anything in between.
//!
//! cargo fuzz run fuzz_console_command

#![no_main]

use filament_dryer::app::commands::AppCommand;
use filament_dryer::fsm::StateId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    if let Some(AppCommand::ForceState(name)) = AppCommand::parse(&line) {
        assert!(!name.is_empty());
        assert!(!name.contains(char::is_whitespace));
        if let Some(state) = StateId::from_name(&name) {
            assert_eq!(state.name(), name);
        }
    }
});
