use crate::{
    line::{is_header, parse_line},
    Error, SplRecord,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

/// An open SNMP trap log, read one line at a time.
///
/// Iterating yields every decodable SPL reading in file order. Header rows and lines that don't
/// decode are skipped. Bytes that aren't valid UTF-8 are replaced rather than failing the file.
/// Lines may end in `\n`, `\r\n` or a lone `\r`.
pub struct TrapLog {
    reader: BufReader<File>,

    path: PathBuf,

    /// 1-based number of the last line read.
    line_number: usize,

    buf: Vec<u8>,
}

impl std::fmt::Debug for TrapLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapLog")
            .field("path", &self.path)
            .field("line_number", &self.line_number)
            .finish()
    }
}

impl Iterator for TrapLog {
    type Item = Result<SplRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl TrapLog {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            line_number: 0,
            buf: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next line into `buf` without its terminator. Returns `false` at end of file.
    fn read_line(&mut self) -> io::Result<bool> {
        self.buf.clear();

        loop {
            let available = self.reader.fill_buf()?;

            if available.is_empty() {
                return Ok(!self.buf.is_empty());
            }

            let Some(end) = available.iter().position(|b| matches!(b, b'\r' | b'\n')) else {
                let len = available.len();

                self.buf.extend_from_slice(available);
                self.reader.consume(len);

                continue;
            };

            let carriage_return = available[end] == b'\r';

            self.buf.extend_from_slice(&available[..end]);
            self.reader.consume(end + 1);

            // `\r\n` is one line break, even when split across reads
            if carriage_return && self.reader.fill_buf()?.first() == Some(&b'\n') {
                self.reader.consume(1);
            }

            return Ok(true);
        }
    }

    pub fn next_record(&mut self) -> Result<Option<SplRecord>, Error> {
        loop {
            let more = self.read_line().map_err(|source| Error::Read {
                path: self.path.clone(),
                source,
            })?;

            if !more {
                return Ok(None);
            }

            self.line_number += 1;

            let line = String::from_utf8_lossy(&self.buf);

            if is_header(&line) {
                continue;
            }

            match parse_line(&line) {
                Some(record) => return Ok(Some(record)),
                None => log::trace!(
                    "{}:{}: no SPL reading",
                    self.path.display(),
                    self.line_number
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_headers_and_noise() {
        let mut file = tempfile::NamedTempFile::new().unwrap();

        writeln!(file, "timestamp,source,oid,type,value").unwrap();
        writeln!(file, "2024-01-01T00:00:00Z,10.0.0.1:161,1.3.6.1.2.1.1.3.0,TimeTicks,1234").unwrap();
        writeln!(file, "2024-01-01T00:00:01Z,10.0.0.1:161,1.3.6.1.4.1.1,OctetString,[91 54 48 93]").unwrap();
        writeln!(file).unwrap();
        write!(file, "2024-01-01T00:00:02Z,10.0.0.2:161,1.3.6.1.4.1.1,OctetString,[91 55 49 93]").unwrap();

        let mut log = TrapLog::open(file.path()).unwrap();

        let first = log.next().unwrap().unwrap();
        let second = log.next().unwrap().unwrap();

        assert_eq!(first.spl, 60);
        assert_eq!(second.ip, "10.0.0.2");
        assert_eq!(second.spl, 71);
        assert!(log.next().is_none());
        assert_eq!(log.line_number, 5);
    }

    #[test]
    fn any_line_ending() {
        let mut file = tempfile::NamedTempFile::new().unwrap();

        let line = |spl: &str| format!("t,10.0.0.1:161,1.2.3,OctetString,[91 {spl} 93]");

        write!(
            file,
            "timestamp,source,oid,type,value\r{}\r{}\r\n{}\n",
            line("54 48"),
            line("54 49"),
            line("54 50")
        )
        .unwrap();

        let mut log = TrapLog::open(file.path()).unwrap();

        let spls = log
            .by_ref()
            .map(|record| record.unwrap().spl)
            .collect::<Vec<_>>();

        assert_eq!(spls, [60, 61, 62]);
        assert_eq!(log.line_number, 4);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();

        file.write_all(b"\xff\xfe garbage\n").unwrap();
        file.write_all(b"t\xe4,10.0.0.1:161,1.2.3,OctetString,[91 54 50 93]\n")
            .unwrap();

        let records = TrapLog::open(file.path())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "t\u{fffd}");
        assert_eq!(records[0].spl, 62);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = TrapLog::open(&dir.path().join("nope.csv")).unwrap_err();

        assert!(matches!(
            err,
            Error::Read { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound
        ));
    }
}
