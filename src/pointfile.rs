// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Point files: append-only lists of complex numbers, written by the
//! point finder and read back by the plotters.  Each record is 16
//! bytes, the real part then the imaginary part, each a little-endian
//! IEEE-754 double.  A reader skips a truncated final record and any
//! record that does not hold two finite numbers.

use num::Complex;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Bytes per record.
pub const RECORD_SIZE: usize = 16;

/// Anything the point finder can hand accepted points to.
pub trait PointSink {
    /// Persist one point.
    fn save(&mut self, point: Complex<f64>) -> io::Result<()>;

    /// Push anything buffered out to its destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PointSink for Vec<Complex<f64>> {
    fn save(&mut self, point: Complex<f64>) -> io::Result<()> {
        self.push(point);
        Ok(())
    }
}

/// Writes records to any byte stream, buffered.
pub struct PointWriter<W: Write> {
    out: BufWriter<W>,
}

impl PointWriter<File> {
    /// Open `path` for appending, creating it if needed.
    pub fn append<P: AsRef<Path>>(path: P) -> io::Result<PointWriter<File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(PointWriter::new(file))
    }
}

impl<W: Write> PointWriter<W> {
    /// Wrap a byte stream.
    pub fn new(inner: W) -> PointWriter<W> {
        PointWriter {
            out: BufWriter::new(inner),
        }
    }

    /// Flush and hand back the byte stream.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(|err| err.into_error())
    }
}

impl<W: Write> PointSink for PointWriter<W> {
    fn save(&mut self, point: Complex<f64>) -> io::Result<()> {
        let mut record = [0u8; RECORD_SIZE];
        record[..8].copy_from_slice(&point.re.to_le_bytes());
        record[8..].copy_from_slice(&point.im.to_le_bytes());
        self.out.write_all(&record)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Reads records from one byte stream.
pub struct PointReader<R: Read> {
    input: R,
    skipped: usize,
    finished: bool,
}

impl<R: Read> PointReader<R> {
    /// Wrap a byte stream.
    pub fn new(input: R) -> PointReader<R> {
        PointReader {
            input,
            skipped: 0,
            finished: false,
        }
    }

    /// How many malformed records have been passed over so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    // Like read_exact, but tells a clean end of stream apart from a
    // partial record.
    fn fill(&mut self, record: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < record.len() {
            match self.input.read(&mut record[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }
}

fn decode(record: &[u8; RECORD_SIZE]) -> Option<Complex<f64>> {
    let mut re = [0u8; 8];
    let mut im = [0u8; 8];
    re.copy_from_slice(&record[..8]);
    im.copy_from_slice(&record[8..]);
    let point = Complex::new(f64::from_le_bytes(re), f64::from_le_bytes(im));
    if point.re.is_finite() && point.im.is_finite() {
        Some(point)
    } else {
        None
    }
}

impl<R: Read> Iterator for PointReader<R> {
    type Item = Complex<f64>;

    fn next(&mut self) -> Option<Complex<f64>> {
        let mut record = [0u8; RECORD_SIZE];
        while !self.finished {
            match self.fill(&mut record) {
                Ok(RECORD_SIZE) => match decode(&record) {
                    Some(point) => return Some(point),
                    None => {
                        debug!("skipping a record that is not a finite point");
                        self.skipped += 1;
                    }
                },
                Ok(0) => self.finished = true,
                Ok(n) => {
                    debug!("skipping a truncated record of {} bytes", n);
                    self.skipped += 1;
                    self.finished = true;
                }
                Err(err) => {
                    warn!("stopped reading points: {}", err);
                    self.finished = true;
                }
            }
        }
        None
    }
}

/// Shell-style matching of a file name: `*` matches any run of
/// characters, `?` exactly one, everything else itself.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Every regular file in `directory` whose name matches `pattern`, in
/// lexicographic order.
pub fn matching_files<P: AsRef<Path>>(directory: P, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let matched = match entry.file_name().to_str() {
            Some(name) => wildcard_match(pattern, name),
            None => false,
        };
        if matched {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Several point files read back to back as one sequence.
pub struct PointFiles {
    pending: VecDeque<PathBuf>,
    current: Option<PointReader<BufReader<File>>>,
    skipped: usize,
}

impl PointFiles {
    /// Read the given files, in order.
    pub fn new(files: Vec<PathBuf>) -> PointFiles {
        PointFiles {
            pending: files.into_iter().collect(),
            current: None,
            skipped: 0,
        }
    }

    /// Read every file in `directory` matching `pattern`.
    pub fn matching<P: AsRef<Path>>(directory: P, pattern: &str) -> io::Result<PointFiles> {
        let files = matching_files(directory.as_ref(), pattern)?;
        if files.is_empty() {
            warn!(
                "no point files match '{}' in {}",
                pattern,
                directory.as_ref().display()
            );
        }
        Ok(PointFiles::new(files))
    }

    /// Malformed records skipped in the files finished so far.
    pub fn skipped(&self) -> usize {
        self.skipped + self.current.as_ref().map_or(0, |reader| reader.skipped())
    }
}

impl Iterator for PointFiles {
    type Item = Complex<f64>;

    fn next(&mut self) -> Option<Complex<f64>> {
        loop {
            if let Some(point) = self.current.as_mut().and_then(|reader| reader.next()) {
                return Some(point);
            }
            if let Some(reader) = self.current.take() {
                self.skipped += reader.skipped();
            }
            let path = self.pending.pop_front()?;
            match File::open(&path) {
                Ok(file) => {
                    debug!("reading points from {}", path.display());
                    self.current = Some(PointReader::new(BufReader::new(file)));
                }
                Err(err) => warn!("could not open {}: {}", path.display(), err),
            }
        }
    }
}
