pub mod dump_parser;

pub use dump_parser::{
    normalize_line_endings, DumpParser, FileRecord, ParseStatistics, ParsedDump,
};
