//! Fuzz harness for test-result packaging
//!
//! Arbitrary file contents and names must package, render as ASCII JSON and
//! decode back to the original bytes.

#![no_main]

use codecov_test_results::{TestResultEntry, test_results_body};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (name, contents) = data.split_at(data.len().min(16));
    let filename = String::from_utf8_lossy(name).into_owned();

    let entry = TestResultEntry::from_bytes(filename, contents).expect("packaging never fails");
    assert_eq!(entry.decode().expect("decodes"), contents);

    let body = test_results_body(std::slice::from_ref(&entry)).expect("serializes");
    assert!(body.is_ascii());
    let parsed: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(parsed["test_results_files"][0]["filename"], entry.filename.as_str());
});
