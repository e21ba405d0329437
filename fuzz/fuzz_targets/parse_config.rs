//! Fuzz harness for configuration files (codecov.yaml)
//!
//! This harness tests the robustness of the configuration parser against
//! malformed input.

#![no_main]

use codecov_config::CodecovConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    if let Ok(config) = serde_yaml::from_str::<CodecovConfig>(input) {
        let _ = config.upload.api_url("/upload/v4");
    }
    let _: Result<CodecovConfig, _> = serde_json::from_str(input);
});
