mod record;

pub use record::{TaskRecord, decode_line, decode_lines, encode_line, encode_lines};
