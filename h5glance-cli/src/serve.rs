//! A single-page HTTP server for previewing the HTML view.
//!
//! Only `GET /` is answered; the document is rendered afresh for every
//! request so reloading the page picks up changes to the file.

use crate::error::CliError;
use h5glance::HtmlTreeRenderer;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// How long to wait after binding before opening the browser.
pub const BROWSER_DELAY: Duration = Duration::from_millis(500);

/// Serves the HTML view of one file on an ephemeral localhost port.
pub struct PreviewServer {
    listener: TcpListener,
    file: PathBuf,
}

impl PreviewServer {
    /// Bind to a free port on the loopback interface.
    pub fn bind(file: &Path) -> Result<Self, CliError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        Ok(Self {
            listener,
            file: file.to_path_buf(),
        })
    }

    /// The port the server is listening on.
    pub fn port(&self) -> Result<u16, CliError> {
        Ok(self.listener.local_addr()?.port())
    }

    /// The address to open in a browser.
    pub fn url(&self) -> Result<String, CliError> {
        Ok(format!("http://localhost:{}/", self.port()?))
    }

    /// Answer requests until the process is stopped.
    pub fn run(&self) -> Result<(), CliError> {
        loop {
            if let Err(e) = self.serve_one() {
                log::warn!("request failed: {e}");
            }
        }
    }

    /// Accept and answer a single request.
    pub fn serve_one(&self) -> Result<(), CliError> {
        let (stream, peer) = self.listener.accept()?;
        log::debug!("connection from {peer}");
        self.handle(stream)?;
        Ok(())
    }

    fn handle(&self, stream: TcpStream) -> io::Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;

        // Drain the headers; the request has no body we care about.
        let mut header = String::new();
        while reader.read_line(&mut header)? > 0 && !header.trim().is_empty() {
            header.clear();
        }

        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        log::debug!("{method} {target}");

        let mut out = stream;
        if method != "GET" {
            return write_response(&mut out, "501 Not Implemented", "text/plain", b"Unsupported method\n");
        }
        if target != "/" {
            return write_response(&mut out, "404 Not Found", "text/plain", b"Not Found\n");
        }

        match HtmlTreeRenderer::new().render_file(&self.file) {
            Ok(document) => write_response(
                &mut out,
                "200 OK",
                "text/html; charset=utf-8",
                document.as_bytes(),
            ),
            Err(e) => {
                log::warn!("cannot render {}: {e}", self.file.display());
                let body = format!("Cannot render {}: {e}\n", self.file.display());
                write_response(&mut out, "500 Internal Server Error", "text/plain", body.as_bytes())
            }
        }
    }
}

fn write_response<W: Write>(out: &mut W, status: &str, content_type: &str, body: &[u8]) -> io::Result<()> {
    write!(
        out,
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    out.write_all(body)?;
    out.flush()
}

/// Open `url` in the default browser after `delay`, on a background thread.
pub fn open_browser_later(url: String, delay: Duration) {
    thread::spawn(move || {
        thread::sleep(delay);
        let (program, args) = browser_command();
        let status = Command::new(program)
            .args(args)
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => log::debug!("opened {url} with {program}"),
            Ok(s) => log::warn!("{program} exited with {s}; open {url} manually"),
            Err(e) => log::warn!("cannot run {program}: {e}; open {url} manually"),
        }
    });
}

fn browser_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(windows) {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}
