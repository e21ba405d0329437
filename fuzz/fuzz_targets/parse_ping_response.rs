//! Fuzz harness for the ping response parser
//!
//! Whatever the API sends back, parsing must not panic, and an accepted URL
//! must come from the body, carry the storage prefix and hold no line break.

#![no_main]

use codecov_uploader::parse_ping_response;
use libfuzzer_sys::fuzz_target;

const PREFIX: &str = "https://storage.googleapis.com/codecov-production/";

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(url) = parse_ping_response(body, PREFIX) {
        assert!(url.starts_with(PREFIX));
        assert!(body.contains(url.as_str()));
        assert!(!url.contains(['\n', '\r', '\u{2028}']));
    }
});
