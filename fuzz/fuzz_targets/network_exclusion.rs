//! Fuzz harness for the network exclusion filter

#![no_main]

use codecov_network::is_excluded;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(path) = std::str::from_utf8(data) {
        let excluded = is_excluded(path);
        // Anything under an excluded directory stays excluded
        if excluded && !path.contains('.') {
            assert!(is_excluded(&format!("{path}/child")));
        }
    }
});
