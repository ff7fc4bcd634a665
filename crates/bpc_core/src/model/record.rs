use serde::{Deserialize, Serialize};
use tracing::warn;

const FIELD_SEPARATOR: char = '\t';

/// One launched command: history identifier, OS process id and the shell text it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub pid: u32,
    pub command: String,
}

impl TaskRecord {
    pub fn new<C: Into<String>>(id: u64, pid: u32, command: C) -> Self {
        Self {
            id,
            pid,
            command: command.into(),
        }
    }
}

/// Encodes a record as `id\tpid\tcommand` without a line terminator.
pub fn encode_line(record: &TaskRecord) -> String {
    format!(
        "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
        record.id, record.pid, record.command
    )
}

/// Encodes records one per line, each line terminated by `\n`.
pub fn encode_lines(records: &[TaskRecord]) -> String {
    let mut content = String::new();
    for record in records {
        content.push_str(&encode_line(record));
        content.push('\n');
    }
    content
}

/// Only the first two separators split fields, so the command keeps any tabs it carries.
pub fn decode_line(line: &str) -> Option<TaskRecord> {
    let mut fields = line.splitn(3, FIELD_SEPARATOR);
    let id = fields.next()?.trim().parse().ok()?;
    let pid = fields.next()?.trim().parse().ok()?;
    let command = fields.next()?;

    Some(TaskRecord {
        id,
        pid,
        command: command.to_string(),
    })
}

/// Blank lines are ignored; malformed lines, including ones that are not
/// valid UTF-8, are skipped with a warning.
pub fn decode_lines(content: &[u8]) -> Vec<TaskRecord> {
    let mut records = Vec::new();
    for (index, raw) in content.split(|byte| *byte == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let Ok(line) = std::str::from_utf8(raw) else {
            warn!(line = index + 1, "skipping record line that is not valid UTF-8");
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        match decode_line(line) {
            Some(record) => records.push(record),
            None => warn!(line = index + 1, "skipping malformed record line"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::{TaskRecord, decode_line, decode_lines, encode_line, encode_lines};

    #[test]
    fn encode_then_decode_preserves_record() {
        let record = TaskRecord::new(7, 4242, "sleep 100 | tee log.txt > /dev/null");

        let decoded = decode_line(&encode_line(&record));

        assert_eq!(decoded, Some(record));
    }

    #[test]
    fn encode_line_uses_tab_separated_fields() {
        let record = TaskRecord::new(1, 99, "echo hi");
        assert_eq!(encode_line(&record), "1\t99\techo hi");
    }

    #[test]
    fn decode_keeps_tabs_inside_command() {
        let decoded = decode_line("3\t12\tprintf 'a\\tb'\tthen more").unwrap();
        assert_eq!(decoded.command, "printf 'a\\tb'\tthen more");
    }

    #[test]
    fn decode_accepts_empty_command() {
        let decoded = decode_line("2\t5\t").unwrap();
        assert_eq!(decoded, TaskRecord::new(2, 5, ""));
    }

    #[test]
    fn decode_rejects_missing_fields() {
        assert!(decode_line("1\t2").is_none());
        assert!(decode_line("1").is_none());
    }

    #[test]
    fn decode_rejects_non_numeric_identifiers() {
        assert!(decode_line("one\t2\techo").is_none());
        assert!(decode_line("1\tpid\techo").is_none());
        assert!(decode_line("-1\t2\techo").is_none());
    }

    #[test]
    fn decode_lines_skips_blank_and_malformed_lines() {
        let content = "1\t10\tsleep 1\n\ngarbage\n2\tx\techo\n3\t30\techo done\n\n";

        let records = decode_lines(content.as_bytes());

        assert_eq!(
            records,
            vec![
                TaskRecord::new(1, 10, "sleep 1"),
                TaskRecord::new(3, 30, "echo done"),
            ]
        );
    }

    #[test]
    fn decode_lines_skips_line_with_invalid_utf8() {
        let content = b"1\t10\tsleep 5\n2\t5\techo \xff\xfe\n3\t30\techo ok\r\n";

        let records = decode_lines(content);

        assert_eq!(
            records,
            vec![TaskRecord::new(1, 10, "sleep 5"), TaskRecord::new(3, 30, "echo ok")]
        );
    }

    #[test]
    fn encode_lines_terminates_every_line() {
        let records = vec![TaskRecord::new(1, 10, "a"), TaskRecord::new(2, 20, "b")];
        let content = encode_lines(&records);

        assert_eq!(content, "1\t10\ta\n2\t20\tb\n");
        assert_eq!(decode_lines(content.as_bytes()), records);
    }

    #[test]
    fn encode_lines_of_nothing_is_empty() {
        assert_eq!(encode_lines(&[]), "");
    }
}
