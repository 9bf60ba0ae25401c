//! Opening local and remote DDF files
//!
//! Decoding needs to seek, so remote files are fetched into memory in
//! full before parsing starts.
use crate::error::{Error, Result, Unavailable};
use binrw::io::BufReader;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;

/// Where a DDF file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A file on the local filesystem
    Local(PathBuf),
    /// A file served over HTTP(S)
    Remote(String),
}

impl Location {
    /// Interpret a command-line argument as a path or URL
    pub fn parse(s: &str) -> Self {
        if s.starts_with("https://") || s.starts_with("http://") {
            Location::Remote(s.to_string())
        } else {
            Location::Local(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Settings for fetching remote files
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Prefix turned into a download URL by appending a file name
    pub base_url: String,
    /// Time allowed for a whole request
    pub timeout: Duration,
}

impl FetchConfig {
    /// The default archive download endpoint
    pub const DEFAULT_BASE_URL: &'static str = "https://data.oceannetworks.ca/AdFile?filename=";
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Something that can download the body of a URL
pub trait Fetch {
    /// Return the full body of `url`
    ///
    /// Implementations report a missing or unreachable resource as
    /// [`Error::SourceUnavailable`].
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetch files over HTTP
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the timeout from `config`
    pub fn new(config: &FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        HttpFetcher { agent }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(Error::unavailable(url, Unavailable::Status(code)))
            }
            Err(e) => return Err(Error::unavailable(url, Unavailable::Transport(e.to_string()))),
        };
        if response.status() != 200 {
            return Err(Error::unavailable(url, Unavailable::Status(response.status())));
        }
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| Error::unavailable(url, Unavailable::Transport(e.to_string())))?;
        if body.is_empty() {
            return Err(Error::unavailable(url, Unavailable::EmptyBody));
        }
        log::debug!("fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// A seekable byte stream over a local file or a fetched body
pub enum Stream {
    /// A buffered local file
    File(BufReader<std::fs::File>),
    /// A file held in memory
    Memory(Cursor<Vec<u8>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::File(r) => r.read(buf),
            Stream::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Stream::File(r) => r.seek(pos),
            Stream::Memory(r) => r.seek(pos),
        }
    }
}

/// Open a stream at `location`
///
/// Local paths must name an existing regular file. Remote locations are
/// downloaded in full through `fetcher`.
pub fn open<F: Fetch + ?Sized>(location: &Location, fetcher: &F) -> Result<Stream> {
    match location {
        Location::Local(path) => {
            if !path.is_file() {
                return Err(Error::unavailable(
                    path.display().to_string(),
                    Unavailable::NotFound,
                ));
            }
            let f = std::fs::File::open(path)?;
            Ok(Stream::File(BufReader::new(f)))
        }
        Location::Remote(url) => {
            let body = fetcher.fetch(url)?;
            if body.is_empty() {
                return Err(Error::unavailable(url.as_str(), Unavailable::EmptyBody));
            }
            Ok(Stream::Memory(Cursor::new(body)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Canned(Vec<u8>);

    impl Fetch for Canned {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn parse_locations() {
        assert_eq!(
            Location::parse("https://example.org/a.ddf"),
            Location::Remote("https://example.org/a.ddf".to_string())
        );
        assert_eq!(
            Location::parse("data/a.ddf"),
            Location::Local(PathBuf::from("data/a.ddf"))
        );
    }

    #[test]
    fn missing_local_file() {
        let loc = Location::Local(PathBuf::from("no/such/file.ddf"));
        match open(&loc, &Canned(vec![])) {
            Err(Error::SourceUnavailable { reason, .. }) => assert_eq!(reason, Unavailable::NotFound),
            _ => panic!("expected SourceUnavailable"),
        }
    }

    #[test]
    fn empty_remote_body() {
        let loc = Location::Remote("https://example.org/a.ddf".to_string());
        match open(&loc, &Canned(vec![])) {
            Err(Error::SourceUnavailable { reason, .. }) => assert_eq!(reason, Unavailable::EmptyBody),
            _ => panic!("expected SourceUnavailable"),
        }
    }

    #[test]
    fn remote_body_is_seekable() {
        let loc = Location::Remote("https://example.org/a.ddf".to_string());
        let mut s = open(&loc, &Canned(b"DDF\x03".to_vec())).unwrap();
        s.seek(SeekFrom::Start(3)).unwrap();
        let mut b = [0u8; 1];
        s.read_exact(&mut b).unwrap();
        assert_eq!(b[0], 3);
    }
}
