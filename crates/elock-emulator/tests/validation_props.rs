//! Property tests for entry validation
//!
//! Drives the entry controller directly over a mock board, without the
//! runtime loop, so thousands of codes can be checked quickly.

use std::time::Duration;

use elock_core::{Password, ValidationResult};
use elock_emulator::{Board, DeviceState, EntryController, StepOutcome, VirtualLcd};
use elock_hardware::mock::{MockButton, MockOutput, MockPotentiometer};
use proptest::prelude::*;

fn run_entry(password: [u8; 4], code: [u8; 4]) -> (StepOutcome, usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let (pot, knob) = MockPotentiometer::new();
        let (button, _) = MockButton::new();
        let (success, _) = MockOutput::new("success");
        let (failure, _) = MockOutput::new("failure");
        let (activity, _) = MockOutput::new("activity");
        let mut board = Board::new(VirtualLcd::default(), pot, button, success, failure, activity);
        board.power_on(Duration::from_millis(500));

        let mut state = DeviceState::new();
        let controller = EntryController::new(
            Password::new(password).unwrap(),
            Duration::from_secs(1),
            Duration::from_millis(1),
        );

        let mut outcome = StepOutcome::Idle;
        for digit in code {
            knob.dial(digit).unwrap();
            board.timer_elapsed();
            state.pressed = true;
            outcome = controller.step(&mut board, &mut state).await;
        }
        (outcome, board.lit_indicators())
    })
}

proptest! {
    #[test]
    fn prop_correct_iff_code_matches(
        password in prop::array::uniform4(0u8..=9),
        code in prop::array::uniform4(0u8..=9),
    ) {
        let (outcome, lit) = run_entry(password, code);

        let expected = if password == code {
            ValidationResult::Correct
        } else {
            ValidationResult::Incorrect
        };
        prop_assert_eq!(outcome, StepOutcome::Validated(expected));
        prop_assert_eq!(lit, 1);
    }

    #[test]
    fn prop_own_password_always_unlocks(password in prop::array::uniform4(0u8..=9)) {
        let (outcome, _) = run_entry(password, password);
        prop_assert_eq!(outcome, StepOutcome::Validated(ValidationResult::Correct));
    }
}
