// File and stdin handling for the outer interpreter and the explicit
// file-I/O primitives. Mirrors the teacher's `FileHandle`/`FType`/
// `FileMode` shape, reworked so open/create/read/write all return
// `io::Result` instead of swallowing errors behind an `Option`.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl FileMode {
    /// spec.md ss4.5: `r/o w/o r/w` constants handed to `open-file`.
    pub fn from_fam(fam: i64) -> FileMode {
        match fam {
            1 => FileMode::WriteOnly,
            -1 => FileMode::ReadWrite,
            _ => FileMode::ReadOnly,
        }
    }
}

#[derive(Debug)]
pub enum FType {
    Stdin,
    File(File),
    BReader(BufReader<File>),
}

#[derive(Debug)]
pub struct FileHandle {
    pub source: FType,
    pub mode: FileMode,
    pub position: u64,
    pub size: u64,
}

impl FileHandle {
    pub fn stdin() -> FileHandle {
        FileHandle {
            source: FType::Stdin,
            mode: FileMode::ReadOnly,
            position: 0,
            size: 0,
        }
    }

    /// `open-file`/`include`: open an existing file. Read-only opens get
    /// a buffered reader (the common, line-at-a-time path); write-only
    /// and read-write open the raw file for `write-file`.
    pub fn open(path: &Path, mode: FileMode) -> io::Result<FileHandle> {
        let size = std::fs::metadata(path)?.len();
        let source = match mode {
            FileMode::ReadOnly => FType::BReader(BufReader::new(File::open(path)?)),
            FileMode::WriteOnly | FileMode::ReadWrite => {
                let file = OpenOptions::new().read(true).write(true).open(path)?;
                FType::File(file)
            }
        };
        Ok(FileHandle {
            source,
            mode,
            position: 0,
            size,
        })
    }

    /// `create-file`: open for writing, truncating or creating as needed.
    pub fn create(path: &Path) -> io::Result<FileHandle> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(FileHandle {
            source: FType::File(file),
            mode: FileMode::ReadWrite,
            position: 0,
            size: 0,
        })
    }

    /// Reads one line, stripping the trailing newline. `None` on EOF or
    /// a read error (stdin never returns `None` except at real EOF).
    pub fn get_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = match &mut self.source {
            FType::Stdin => {
                io::stdout().flush().ok();
                io::stdin().read_line(&mut line)
            }
            FType::BReader(br) => br.read_line(&mut line),
            FType::File(_) => return None,
        };
        match read {
            Ok(0) => None,
            Ok(n) => {
                self.position += n as u64;
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Some(line)
            }
            Err(_) => None,
        }
    }

    /// `key`: one raw byte. Blocks for input the same way the teacher's
    /// version does; there's no portable unbuffered terminal read
    /// without a separate crate, which spec.md's scope excludes.
    pub fn read_char(&mut self) -> Option<char> {
        let mut buf = [0u8; 1];
        let n = match &mut self.source {
            FType::Stdin => io::stdin().lock().read(&mut buf),
            FType::BReader(br) => br.read(&mut buf),
            FType::File(f) => f.read(&mut buf),
        };
        match n {
            Ok(1) => {
                self.position += 1;
                Some(buf[0] as char)
            }
            _ => None,
        }
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        match &mut self.source {
            FType::File(f) => {
                f.write_all(s.as_bytes())?;
                self.position += s.len() as u64;
                if self.position > self.size {
                    self.size = self.position;
                }
                Ok(())
            }
            FType::Stdin => {
                print!("{s}");
                Ok(())
            }
            FType::BReader(_) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file opened read-only",
            )),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.source {
            FType::File(f) => f.flush(),
            FType::Stdin => io::stdout().flush(),
            FType::BReader(_) => Ok(()),
        }
    }

    /// Reads the whole remaining file into one string (`slurp-file`).
    pub fn slurp(&mut self) -> io::Result<String> {
        let mut out = String::new();
        match &mut self.source {
            FType::File(f) => {
                f.read_to_string(&mut out)?;
            }
            FType::BReader(br) => {
                br.read_to_string(&mut out)?;
            }
            FType::Stdin => {}
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn create_then_reopen_roundtrips() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("fifth-test-{}.txt", std::process::id()));
        {
            let mut fh = FileHandle::create(&path).unwrap();
            fh.write_str("hello\nworld\n").unwrap();
            fh.flush().unwrap();
        }
        let mut fh = FileHandle::open(&path, FileMode::ReadOnly).unwrap();
        assert_eq!(fh.get_line().as_deref(), Some("hello"));
        assert_eq!(fh.get_line().as_deref(), Some("world"));
        assert_eq!(fh.get_line(), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn slurp_reads_whole_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("fifth-test-slurp-{}.txt", std::process::id()));
        let mut f = File::create(&path).unwrap();
        write!(f, "abc\ndef").unwrap();
        drop(f);
        let mut fh = FileHandle::open(&path, FileMode::ReadOnly).unwrap();
        assert_eq!(fh.slurp().unwrap(), "abc\ndef");
        std::fs::remove_file(&path).ok();
    }
}
