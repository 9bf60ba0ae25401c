//! Summarizing many DDF files into a resumable ledger
//!
//! The ledger is a comma-separated file with one row per input. Rows are
//! written as soon as each file has been attempted, so an interrupted run
//! can be resumed by counting the rows already present and skipping that
//! many inputs.
use crate::error::{Error, Result};
use crate::model::Summary;
use crate::parser::ddf;
use crate::source::{self, Fetch, Location};
use std::fs::{read_dir, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Column names of the ledger, without the optional leading `group`
pub const COLUMNS: [&str; 11] = [
    "filename",
    "PCtimeFrom",
    "PCtimeTo",
    "SonartimeFrom",
    "SonartimeTo",
    "duration",
    "framerate",
    "nBeams",
    "nSamples",
    "windowStart",
    "windowLength",
];

/// One file to summarize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Group label, when inputs come from several directories
    pub group: Option<String>,
    /// File name reported in the ledger
    pub filename: String,
    /// Where to read the file from
    pub location: Location,
}

/// An ordered list of files to summarize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    /// The files, in processing order
    pub entries: Vec<Input>,
    /// Whether the ledger carries a `group` column
    pub grouped: bool,
}

impl Inputs {
    /// Resolve a command-line input description into a list of files
    ///
    /// `source` may be a CSV file with a `filename` column (resolved
    /// against `base_url`), a single file, a directory, or a path ending
    /// in a wildcard pattern such as `data/*.ddf`, which is matched
    /// recursively under its parent directory.
    pub fn collect(source: &str, base_url: &str) -> Result<Inputs> {
        let path = Path::new(source);
        if path.is_file() {
            if path.extension().map_or(false, |e| e == "csv") {
                return from_csv(path, base_url);
            }
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.to_string());
            return Ok(Inputs {
                entries: vec![Input {
                    group: None,
                    filename,
                    location: Location::Local(path.to_path_buf()),
                }],
                grouped: false,
            });
        }

        let (root, pattern) = if path.is_dir() {
            (path.to_path_buf(), "*".to_string())
        } else {
            let pattern = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::Input(format!("cannot interpret {}", source)))?;
            let root = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (root, pattern)
        };

        let mut found = Vec::new();
        if root.is_dir() {
            walk(&root, &pattern, &mut found)?;
        }
        if found.is_empty() {
            return Err(Error::Input(format!(
                "input file or folder does not exist: {}",
                source
            )));
        }
        found.sort();

        let mut entries: Vec<Input> = found
            .into_iter()
            .map(|p| {
                let group = p
                    .strip_prefix(&root)
                    .ok()
                    .and_then(Path::parent)
                    .map(|g| g.display().to_string())
                    .filter(|g| !g.is_empty())
                    .unwrap_or_else(|| ".".to_string());
                let filename = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Input {
                    group: Some(group),
                    filename,
                    location: Location::Local(p),
                }
            })
            .collect();

        let grouped = entries
            .windows(2)
            .any(|pair| pair[0].group != pair[1].group);
        if !grouped {
            for e in entries.iter_mut() {
                e.group = None;
            }
        }

        Ok(Inputs { entries, grouped })
    }
}

fn from_csv(path: &Path, base_url: &str) -> Result<Inputs> {
    let f = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in f.lines() {
        let fields = split_fields(&line?);
        if fields.iter().any(|f| !f.is_empty()) {
            lines.push(fields);
        }
    }

    let mut rows = lines.into_iter();
    let header = rows.next().unwrap_or_default();
    let filename_col = header
        .iter()
        .position(|c| c == "filename")
        .ok_or_else(|| Error::Input("input csv must have column 'filename'".to_string()))?;
    let group_col = header.iter().position(|c| c == "group");

    let mut entries = Vec::new();
    for (n, fields) in rows.enumerate() {
        let filename = fields
            .get(filename_col)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| Error::Input(format!("row {} has no filename", n + 1)))?;
        entries.push(Input {
            group: group_col.map(|i| fields.get(i).cloned().unwrap_or_default()),
            filename: filename.clone(),
            location: Location::Remote(format!("{}{}", base_url, filename)),
        });
    }

    Ok(Inputs {
        entries,
        grouped: group_col.is_some(),
    })
}

/// Split one CSV line into trimmed fields
///
/// Fields may be wrapped in double quotes, with `""` standing for a quote.
/// An unquoted `#` starts a comment that runs to the end of the line.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            '#' if !quoted => break,
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

fn walk(dir: &Path,pattern: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, pattern, found)?;
        } else if path
            .file_name()
            .map_or(false, |n| wildcard_match(pattern, &n.to_string_lossy()))
        {
            found.push(path);
        }
    }
    Ok(())
}

/// Match `name` against a pattern where `*` is any run and `?` any one character
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

/// An append-only ledger file
pub struct Ledger {
    writer: File,
    grouped: bool,
}

impl Ledger {
    /// Open the ledger at `path`, creating it with a header if needed
    ///
    /// Returns the ledger together with the number of data rows it already
    /// holds. Callers pass that count to [`run`] to resume where a previous
    /// run stopped.
    pub fn open<P: AsRef<Path>>(path: P, grouped: bool) -> Result<(Ledger, usize)> {
        let path = path.as_ref();
        let existing = if path.is_file() {
            BufReader::new(File::open(path)?).lines().count()
        } else {
            0
        };

        if existing > 0 {
            let done = existing - 1;
            log::info!(
                "{} already exists! {} files already processed, skipping to remaining files.",
                path.display(),
                done
            );
            let writer = OpenOptions::new().append(true).open(path)?;
            return Ok((Ledger { writer, grouped }, done));
        }

        let mut writer = File::create(path)?;
        let mut header = COLUMNS.join(",");
        if grouped {
            header = format!("group,{}", header);
        }
        writeln!(writer, "{}", header)?;
        Ok((Ledger { writer, grouped }, 0))
    }

    fn write_row(&mut self, input: &Input, fields: &[String]) -> Result<()> {
        let mut row = Vec::with_capacity(fields.len() + 2);
        if self.grouped {
            row.push(input.group.clone().unwrap_or_default());
        }
        row.push(input.filename.clone());
        row.extend_from_slice(fields);
        writeln!(self.writer, "{}", row.join(","))?;
        self.writer.flush()?;
        Ok(())
    }

    /// Append the summary of `input`
    pub fn write_summary(&mut self, input: &Input, summary: &Summary) -> Result<()> {
        self.write_row(input, &summary.fields())
    }

    /// Append a row with blank summary fields for a file that failed
    pub fn write_failure(&mut self, input: &Input) -> Result<()> {
        self.write_row(input, &vec![String::new(); COLUMNS.len() - 1])
    }
}

/// Counts from a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// Inputs skipped because the ledger already covered them
    pub skipped: usize,
    /// Inputs summarized
    pub succeeded: usize,
    /// Inputs that failed to decode and got a blank row
    pub failed: usize,
}

/// Summarize every input after the first `resume` ones into `ledger`
///
/// A file that cannot be fetched or decoded gets a blank row and the run
/// moves on. Only failures to write the ledger itself stop the run.
pub fn run<F: Fetch + ?Sized>(
    inputs: &Inputs,
    ledger: &mut Ledger,
    resume: usize,
    fetcher: &F,
) -> Result<Report> {
    let mut report = Report {
        skipped: resume.min(inputs.entries.len()),
        ..Report::default()
    };
    let total = inputs.entries.len();

    for (n, input) in inputs.entries.iter().enumerate().skip(resume) {
        log::info!("[{}/{}] {}", n + 1, total, input.filename);
        let res = source::open(&input.location, fetcher).and_then(ddf::decode_summary);
        match res {
            Ok(summary) => {
                ledger.write_summary(input, &summary)?;
                report.succeeded += 1;
            }
            Err(e) => {
                log::warn!("{}: {}", input.location, e);
                ledger.write_failure(input)?;
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
