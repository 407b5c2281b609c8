use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use cypherload_core::statement::{Statement, StatementAccumulator};

/// Lazy statement source over any buffered reader.
///
/// Lines are consumed one at a time and joined by the shared accumulator,
/// so peak memory is one accumulated statement regardless of script size.
/// The iterator is finite and non-restartable; after an I/O error it
/// yields nothing more.
pub struct StatementReader<R: BufRead> {
    lines: io::Lines<R>,
    accumulator: StatementAccumulator,
    done: bool,
}

impl StatementReader<BufReader<File>> {
    /// Open a script file for streaming.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> StatementReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            accumulator: StatementAccumulator::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for StatementReader<R> {
    type Item = io::Result<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if let Some(statement) = self.accumulator.push_line(&line) {
                        return Some(Ok(statement));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return self.accumulator.finish().map(Ok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};

    use cypherload_core::statement::split_script;

    /// Serves `limit` bytes of the underlying data, then fails.
    struct FailAfter {
        data: Cursor<Vec<u8>>,
        limit: u64,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.position() >= self.limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream interrupted"));
            }
            let remaining = (self.limit - self.data.position()) as usize;
            let n = remaining.min(buf.len());
            self.data.read(&mut buf[..n])
        }
    }

    const SCRIPT: &str = "// people\nCREATE (a:Person {name: 'Alice'});\n\nMATCH (a:Person)\nWHERE a.name = 'Alice'\nSET a.age = 30;\nCREATE (b:Person {name: 'Bob'})\n";

    #[test]
    fn test_reader_yields_same_statements_as_split_script() {
        let streamed: Vec<Statement> = StatementReader::new(Cursor::new(SCRIPT))
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(streamed, split_script(SCRIPT));
        assert_eq!(streamed.len(), 3);
    }

    #[test]
    fn test_reader_joins_multiline_and_tracks_lines() {
        let mut reader = StatementReader::new(Cursor::new(SCRIPT));

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.text(), "CREATE (a:Person {name: 'Alice'})");
        assert_eq!(first.line(), 2);

        let second = reader.next().unwrap().unwrap();
        assert_eq!(
            second.text(),
            "MATCH (a:Person) WHERE a.name = 'Alice' SET a.age = 30"
        );
        assert_eq!(second.line(), 4);

        // Dangling final fragment without a semicolon.
        let third = reader.next().unwrap().unwrap();
        assert_eq!(third.text(), "CREATE (b:Person {name: 'Bob'})");
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_stops_after_io_error() {
        let source = FailAfter {
            data: Cursor::new(b"CREATE (a);\nCREATE (b);\n".to_vec()),
            limit: 12,
        };
        let mut reader = StatementReader::new(BufReader::new(source));

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.text(), "CREATE (a)");

        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_open_missing_file() {
        assert!(StatementReader::open(Path::new("/nonexistent/statements.cypher")).is_err());
    }

    #[test]
    fn test_reader_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CREATE (a);").unwrap();
        writeln!(file, "CREATE (b);").unwrap();

        let reader = StatementReader::open(file.path()).unwrap();
        let statements: Vec<Statement> = reader.map(|item| item.unwrap()).collect();
        assert_eq!(statements.len(), 2);
    }
}
