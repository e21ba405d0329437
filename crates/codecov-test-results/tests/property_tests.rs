//! Property tests for codecov-test-results

use codecov_test_results::{TestResultEntry, test_results_body};
use proptest::prelude::*;

proptest! {
    // Any artifact decodes back to its original bytes.
    #[test]
    fn prop_entry_data_round_trips(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let entry = TestResultEntry::from_bytes("junit.xml", &data).unwrap();
        prop_assert_eq!(entry.decode().unwrap(), data);
    }

    // The PUT body is ASCII and parses back to the same filenames.
    #[test]
    fn prop_body_ascii_and_faithful(names in prop::collection::vec("\\PC{1,16}", 0..4)) {
        let entries: Vec<TestResultEntry> = names
            .iter()
            .map(|n| TestResultEntry::from_bytes(n.as_str(), b"x").unwrap())
            .collect();
        let body = test_results_body(&entries).unwrap();
        prop_assert!(body.is_ascii());

        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        let files = parsed["test_results_files"].as_array().unwrap();
        prop_assert_eq!(files.len(), names.len());
        for (file, name) in files.iter().zip(&names) {
            prop_assert_eq!(file["filename"].as_str().unwrap(), name.as_str());
        }
    }
}
