use crate::format::{CrackFormat, JohnOrder};
use crate::ldap::DirectoryConfig;
use clap::{Parser, ValueEnum};
use log::warn;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Hashcat,
    John,
    Kerberoast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JohnOrderArg {
    EdataFirst,
    ChecksumFirst,
}

impl From<JohnOrderArg> for JohnOrder {
    fn from(arg: JohnOrderArg) -> Self {
        match arg {
            JohnOrderArg::EdataFirst => JohnOrder::EdataFirst,
            JohnOrderArg::ChecksumFirst => JohnOrder::ChecksumFirst,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "spnroast",
    version,
    about = "Request Kerberos service tickets for SPNs and format them for offline cracking"
)]
pub struct Args {
    /// SPNs to roast (service/host[:port]); read from stdin when none are given
    pub spns: Vec<String>,

    /// File with one SPN per line
    #[arg(short = 'i', long, value_name = "FILE")]
    pub spn_file: Option<PathBuf>,

    /// Crack format; without it the raw records are written as CSV
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Field order of John lines
    #[arg(long, value_enum, default_value = "edata-first")]
    pub john_order: JohnOrderArg,

    /// Write the result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Credential cache (defaults to KRB5CCNAME, then /tmp/krb5cc_<uid>)
    #[arg(long, value_name = "FILE")]
    pub ccache: Option<PathBuf>,

    /// kvno binary used to request tickets
    #[arg(long, default_value = crate::kerberos::acquire::DEFAULT_KVNO)]
    pub kvno: String,

    /// Only read tickets already in the credential cache
    #[arg(long)]
    pub no_request: bool,

    /// Parallel ticket requests
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Look up each SPN's owner in the Global Catalog
    #[arg(short, long, requires = "dc")]
    pub resolve: bool,

    /// Domain controller hosting the Global Catalog
    #[arg(long, value_name = "HOST")]
    pub dc: Option<String>,

    #[arg(short, long, default_value = "")]
    pub username: String,

    #[arg(short, long, default_value = "")]
    pub password: String,

    #[arg(short, long, default_value = "")]
    pub domain: String,

    /// LDAPS (port 3269)
    #[arg(short, long)]
    pub secure: bool,

    /// Bind to the directory with the Kerberos ticket cache (GSSAPI)
    #[arg(short, long)]
    pub kerberos: bool,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn crack_format(&self) -> Option<CrackFormat> {
        self.format.map(|f| match f {
            FormatArg::Hashcat => CrackFormat::Hashcat,
            FormatArg::John => CrackFormat::John(self.john_order.into()),
            FormatArg::Kerberoast => CrackFormat::Kerberoast,
        })
    }

    /// `None` when resolution is off for the batch.
    pub fn directory_config(&self) -> Result<Option<DirectoryConfig>, String> {
        if !self.resolve {
            return Ok(None);
        }
        let dc_host = self.dc.clone().ok_or("--resolve needs --dc")?;
        if !self.kerberos && (self.username.is_empty() || self.domain.is_empty()) {
            return Err("--resolve needs -u and -d, or -k".to_string());
        }

        Ok(Some(DirectoryConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            domain: self.domain.clone(),
            dc_host,
            secure_ldaps: self.secure,
            kerberos: self.kerberos,
        }))
    }

    /// SPN source: positional arguments, then `--spn-file`, then stdin.
    pub fn spn_source(&self) -> io::Result<Vec<String>> {
        if !self.spns.is_empty() {
            return Ok(self.spns.clone());
        }

        match &self.spn_file {
            Some(path) => read_spns(BufReader::new(File::open(path)?)),
            None => read_spns(io::stdin().lock()),
        }
    }
}

/// Trimmed, non-empty, non-comment lines. A line that is not UTF-8 is
/// skipped with a warning; only I/O errors end the read.
pub fn read_spns<R: BufRead>(mut reader: R) -> io::Result<Vec<String>> {
    let mut spns = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(_) => {
                warn!(
                    "Ignoring SPN line {}: not valid UTF-8 ({})",
                    line_no,
                    String::from_utf8_lossy(&buf).trim()
                );
                continue;
            }
        };
        if !line.is_empty() && !line.starts_with('#') {
            spns.push(line.to_string());
        }
    }
    Ok(spns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("spnroast").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_read_spns() {
        let input = "HTTP/a\n\n  # comment\n  MSSQLSvc/db:1433  \r\ncifs/fs01";
        let spns = read_spns(input.as_bytes()).unwrap();
        assert_eq!(spns, vec!["HTTP/a", "MSSQLSvc/db:1433", "cifs/fs01"]);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_input() {
        let input: &[u8] = b"HTTP/a\nHTTP/\xff\xfebad\nHTTP/c\nHTTP/d\n";
        let spns = read_spns(input).unwrap();
        assert_eq!(spns, vec!["HTTP/a", "HTTP/c", "HTTP/d"]);
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_read_error_is_reported() {
        let err = read_spns(BufReader::new(FailingReader)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(parse(&["HTTP/a"]).crack_format(), None);
        assert_eq!(
            parse(&["-f", "hashcat", "HTTP/a"]).crack_format(),
            Some(CrackFormat::Hashcat)
        );
        assert_eq!(
            parse(&["-f", "john", "HTTP/a"]).crack_format(),
            Some(CrackFormat::John(JohnOrder::EdataFirst))
        );
        assert_eq!(
            parse(&["-f", "john", "--john-order", "checksum-first", "HTTP/a"]).crack_format(),
            Some(CrackFormat::John(JohnOrder::ChecksumFirst))
        );
        assert_eq!(
            parse(&["--format", "kerberoast"]).crack_format(),
            Some(CrackFormat::Kerberoast)
        );
    }

    #[test]
    fn test_directory_config() {
        assert!(parse(&["HTTP/a"]).directory_config().unwrap().is_none());

        let config = parse(&["-r", "--dc", "dc01", "-u", "auditor", "-p", "pw", "-d", "corp.local"])
            .directory_config()
            .unwrap()
            .unwrap();
        assert_eq!(config.dc_host, "dc01");
        assert!(!config.secure_ldaps);

        assert!(parse(&["-r", "--dc", "dc01"]).directory_config().is_err());
        assert!(parse(&["-r", "--dc", "dc01", "-k"]).directory_config().is_ok());
        assert!(Args::try_parse_from(["spnroast", "-r"]).is_err());
    }

    #[test]
    fn test_positional_spns_win() {
        let args = parse(&["HTTP/a", "HTTP/b"]);
        let spns = args.spn_source().unwrap();
        assert_eq!(spns, vec!["HTTP/a", "HTTP/b"]);
        assert_eq!(args.workers, 1);
        assert_eq!(args.kvno, "kvno");
    }
}
