#![no_main]
use kestrel::chess::position::Position;
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(position) = Position::try_from(input) else {
        return;
    };
    // Printing the position back and parsing it again is lossless.
    assert_eq!(Position::from_fen(&position.to_string()).unwrap(), position);
});
