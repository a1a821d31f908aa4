use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::error::{InitError, TranslateError};
use crate::memory::{DiskStore, FramePool};
use crate::page_table::{PageTable, PageTableEntry};
use crate::replacement::VictimSelector;
use crate::translation::{TranslationResult, Translator};

/// Initial state of the simulated address space
///
/// File format, whitespace separated:
///   line 1: page table pairs `page frame`, frame `-1` for an invalid entry
///   line 2: pages stored on disk (optional)
///   line 3: frame count (optional, default `FRAME_COUNT`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    pub page_table: Vec<(u64, Option<usize>)>,
    pub disk_pages: Vec<u64>,
    pub frame_count: usize,
}

impl InitData {
    /// Eight pages, six of them resident, and four pages on disk
    pub fn reference() -> Self {
        InitData {
            page_table: vec![
                (0, Some(3)),
                (1, Some(7)),
                (2, None),
                (3, Some(1)),
                (4, Some(5)),
                (5, None),
                (6, Some(0)),
                (7, Some(4)),
            ],
            disk_pages: vec![2, 5, 8, 9],
            frame_count: FRAME_COUNT,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InitError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, InitError> {
        let lines: Vec<&str> = content.lines().collect();

        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(InitError::parse(1, "init file is empty"));
        }
        if lines.len() > 3 && lines[3..].iter().any(|line| !line.trim().is_empty()) {
            return Err(InitError::parse(4, "unexpected content after frame count"));
        }

        let page_table = Self::parse_pt_line(lines[0])?;
        let disk_pages = match lines.get(1) {
            Some(line) => Self::parse_disk_line(line)?,
            None => Vec::new(),
        };
        let frame_count = match lines.get(2) {
            Some(line) => Self::parse_frame_count(line)?,
            None => FRAME_COUNT,
        };

        let data = InitData {
            page_table,
            disk_pages,
            frame_count,
        };
        data.validate()?;
        Ok(data)
    }

    fn parse_pt_line(line: &str) -> Result<Vec<(u64, Option<usize>)>, InitError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(InitError::parse(
                1,
                format!("page table has {} tokens, expected pairs", tokens.len()),
            ));
        }

        let mut entries = Vec::new();
        for chunk in tokens.chunks(2) {
            let page: u64 = chunk[0]
                .parse()
                .map_err(|_| InitError::parse(1, format!("invalid page number: {}", chunk[0])))?;
            let frame = match chunk[1] {
                "-1" => None,
                token => Some(
                    token
                        .parse::<usize>()
                        .map_err(|_| InitError::parse(1, format!("invalid frame: {}", token)))?,
                ),
            };
            entries.push((page, frame));
        }
        Ok(entries)
    }

    fn parse_disk_line(line: &str) -> Result<Vec<u64>, InitError> {
        line.split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| InitError::parse(2, format!("invalid disk page: {}", token)))
            })
            .collect()
    }

    fn parse_frame_count(line: &str) -> Result<usize, InitError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(FRAME_COUNT);
        }
        let count: usize = trimmed
            .parse()
            .map_err(|_| InitError::parse(3, format!("invalid frame count: {}", trimmed)))?;
        if count == 0 {
            return Err(InitError::parse(3, "frame count must be positive"));
        }
        Ok(count)
    }

    fn validate(&self) -> Result<(), InitError> {
        let mut pages = HashSet::new();
        let mut frames = HashSet::new();
        for &(page, frame) in &self.page_table {
            if !pages.insert(page) {
                return Err(InitError::parse(1, format!("duplicate page {}", page)));
            }
            if let Some(frame) = frame {
                if frame >= self.frame_count {
                    return Err(InitError::parse(
                        1,
                        format!("frame {} exceeds max {}", frame, self.frame_count - 1),
                    ));
                }
                if !frames.insert(frame) {
                    return Err(InitError::parse(1, format!("frame {} mapped twice", frame)));
                }
            }
        }

        let mut disk = HashSet::new();
        for &page in &self.disk_pages {
            if !disk.insert(page) {
                return Err(InitError::parse(2, format!("duplicate disk page {}", page)));
            }
        }
        Ok(())
    }

    /// Build a translator whose frames hold exactly the valid mappings
    pub fn build_translator<V: VictimSelector>(&self, selector: V) -> Translator<V> {
        let page_table: PageTable = self
            .page_table
            .iter()
            .map(|&(page, frame)| match frame {
                Some(frame) => PageTableEntry::mapped(page, frame),
                None => PageTableEntry::invalid(page),
            })
            .collect();

        let mut frames = FramePool::new(self.frame_count);
        for &(page, frame) in &self.page_table {
            if let Some(frame) = frame.filter(|&f| f < self.frame_count) {
                frames.load(frame, page);
            }
        }

        let disk = DiskStore::with_pages(self.disk_pages.iter().copied());
        Translator::new(page_table, frames, disk, selector)
    }
}

impl Default for InitData {
    fn default() -> Self {
        Self::reference()
    }
}

/// Read whitespace-separated address tokens; each is parsed at translation time
pub fn read_virtual_addresses<P: AsRef<Path>>(path: P) -> Result<Vec<String>, InitError> {
    let content = fs::read_to_string(path.as_ref())?;
    Ok(content.split_whitespace().map(str::to_string).collect())
}

/// Physical addresses joined by spaces, `-1` for failed translations
pub fn format_results(results: &[Result<TranslationResult, TranslateError>]) -> String {
    let output: Vec<String> = results
        .iter()
        .map(|result| match result {
            Ok(translation) => translation.physical_address.to_string(),
            Err(_) => INVALID_ADDRESS.to_string(),
        })
        .collect();
    output.join(" ")
}

pub fn write_results<P: AsRef<Path>>(
    path: P,
    results: &[Result<TranslationResult, TranslateError>],
) -> Result<(), InitError> {
    fs::write(path.as_ref(), format_results(results))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacement::ScriptedVictim;

    #[test]
    fn test_reference_matches_parsed_file() {
        let content = "0 3 1 7 2 -1 3 1 4 5 5 -1 6 0 7 4\n2 5 8 9\n8";
        assert_eq!(InitData::parse(content).unwrap(), InitData::reference());
    }

    #[test]
    fn test_parse_defaults() {
        let init = InitData::parse("0 1").unwrap();
        assert_eq!(init.page_table, vec![(0, Some(1))]);
        assert!(init.disk_pages.is_empty());
        assert_eq!(init.frame_count, FRAME_COUNT);

        let init = InitData::parse("\n4 6\n").unwrap();
        assert!(init.page_table.is_empty());
        assert_eq!(init.disk_pages, vec![4, 6]);
        assert_eq!(init.frame_count, FRAME_COUNT);
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("", "empty"),
            ("0 1 2", "pairs"),
            ("x 1", "invalid page number"),
            ("0 -2", "invalid frame"),
            ("0 1\n2 y", "invalid disk page"),
            ("0 1\n\n0", "positive"),
            ("0 1\n\nlots", "invalid frame count"),
            ("0 1 0 2", "duplicate page"),
            ("0 1 3 1", "mapped twice"),
            ("0 8", "exceeds max"),
            ("0 1\n2 2", "duplicate disk page"),
            ("0 1\n\n8\nextra", "unexpected content"),
        ];
        for (content, expected) in cases {
            let err = InitData::parse(content).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{:?}: got {:?}, expected {:?}",
                content,
                err.to_string(),
                expected
            );
        }
    }

    #[test]
    fn test_parse_error_line_numbers() {
        match InitData::parse("0 1\n2 y") {
            Err(InitError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_build_translator_occupies_mapped_frames() {
        let translator = InitData::reference().build_translator(ScriptedVictim::default());

        assert_eq!(translator.page_table().len(), 8);
        assert_eq!(translator.frames().len(), 8);
        assert_eq!(translator.frames().free_count(), 2);
        assert_eq!(translator.frames().first_free(), Some(2));
        assert_eq!(translator.frames().occupant(0), Some(6));
        assert_eq!(translator.frames().occupant(7), Some(1));
        assert_eq!(translator.disk().pages().collect::<Vec<_>>(), vec![2, 5, 8, 9]);
    }

    #[test]
    fn test_build_translator_skips_out_of_range_frames() {
        // Public fields bypass parse-time validation
        let init = InitData {
            page_table: vec![(0, Some(20)), (1, Some(1))],
            disk_pages: vec![],
            frame_count: 2,
        };
        let translator = init.build_translator(ScriptedVictim::default());

        assert_eq!(translator.frames().len(), 2);
        assert_eq!(translator.frames().occupant(0), None);
        assert_eq!(translator.frames().occupant(1), Some(1));
    }

    #[test]
    fn test_format_results() {
        let mut translator = InitData::reference().build_translator(ScriptedVictim::default());
        let results = translator.translate_batch(&["0x1234", "0xA000", "0"], 4096);
        assert_eq!(format_results(&results), "29236 -1 12288");
        assert_eq!(format_results(&[]), "");
    }
}
