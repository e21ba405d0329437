use proptest::prelude::*;

/// Strategy for generating relative, `/`-separated file paths
pub fn strategy_file_path() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,12}(/[a-zA-Z0-9_.-]{1,12}){0,3}"
}

/// Strategy for generating tracked file lists, possibly empty
pub fn strategy_file_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(strategy_file_path(), 0..20)
}

/// Strategy for generating report filenames
pub fn strategy_report_filename() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,10}\\.xml"
}

/// Strategy for generating small self-closing XML elements
pub fn strategy_xml_fragment() -> impl Strategy<Value = String> {
    "<[a-z]{1,8}( [a-z]{1,6}=\"[0-9]{1,3}\"){0,3}/>"
}

/// Strategy for generating repository slugs in "owner/repo" format
pub fn strategy_slug() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,20}/[a-zA-Z0-9_-]{1,20}"
}
