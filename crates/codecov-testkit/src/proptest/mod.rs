//! Proptest strategies for codecov-upload property-based testing

mod strategies;

pub use strategies::{
    strategy_file_list, strategy_file_path, strategy_report_filename, strategy_slug,
    strategy_xml_fragment,
};
