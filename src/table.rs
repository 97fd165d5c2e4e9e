use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolError};

/// A two-column `key,value` file held in memory.
///
/// Each line is `key,value[,ignored...]`: only the first two columns are
/// kept. Duplicate keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueTable {
    entries: HashMap<String, String>,
}

impl KeyValueTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Reads line by line; a line without a comma aborts the load.
    pub fn from_reader<R: BufRead>(reader: R, origin: &Path) -> Result<Self> {
        let mut entries = HashMap::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ToolError::Io {
                path: origin.to_path_buf(),
                source,
            })?;
            let mut fields = line.split(',');
            let key = fields.next().unwrap_or_default();
            let value = fields.next().ok_or_else(|| ToolError::MalformedLine {
                path: PathBuf::from(origin),
                line_no: idx + 1,
                line: line.clone(),
            })?;
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }

    /// Missing keys read as the empty string.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.entries.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<KeyValueTable> {
        KeyValueTable::from_reader(Cursor::new(text), Path::new("inline.txt"))
    }

    #[test]
    fn test_loads_every_line() {
        let table = parse("common,5\nrare,20\nepic,100\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get_or_empty("rare"), "20");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let table = parse("1,alice\n2,bob\n1,carol").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_or_empty("1"), "carol");
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let table = parse("k,v1,v2\n1,alice,2024-08-19").unwrap();
        assert_eq!(table.get_or_empty("k"), "v1");
        assert_eq!(table.get_or_empty("1"), "alice");
    }

    #[test]
    fn test_missing_comma_is_fatal() {
        let err = parse("1,alice\nbroken\n").unwrap_err();
        match err {
            ToolError::MalformedLine { line_no, line, .. } => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = KeyValueTable::load("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_missing_key_reads_empty() {
        let table = parse("a,1").unwrap();
        assert_eq!(table.get_or_empty("b"), "");
    }
}
