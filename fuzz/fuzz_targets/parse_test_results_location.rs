//! Fuzz harness for the test-result negotiation response
//!
//! Target: `raw_upload_location` JSON bodies

#![no_main]

use codecov_uploader::parse_test_results_location;
use libfuzzer_sys::fuzz_target;

const PREFIX: &str = "https://storage.googleapis.com/codecov-production/";

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(url) = parse_test_results_location(body, PREFIX) {
        assert!(url.starts_with(PREFIX));
    }
});
