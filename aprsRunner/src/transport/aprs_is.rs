//! APRS-IS client session.
//!
//! The exchange on connect is:
//!
//! ```text
//! S: # aprsc 2.1.14-g5e22b37
//! C: user N0CALL pass 12345 vers aprsrunner 0.1.0
//! S: # logresp N0CALL verified, server T2TEST
//! ```
//!
//! after which packets are written one per line, CR LF terminated.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::constants::{CONNECT_TIMEOUT_SECS, SOFTWARE_NAME, SOFTWARE_VERSION};
use crate::transport::error::{TransportError, TransportResult};
use crate::utils::traits::Transport;

#[derive(Debug, Clone, PartialEq)]
pub struct AprsIsSettings {
    pub host: String,
    pub port: u16,
    pub callsign: String,
    pub passcode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Verified,
    Unverified,
    Unknown,
}

pub fn login_line(callsign: &str, passcode: &str) -> String {
    format!("user {} pass {} vers {} {}\r\n", callsign, passcode, SOFTWARE_NAME, SOFTWARE_VERSION)
}

/// Classify the server's `# logresp` line.
pub fn parse_login_response(line: &str) -> LoginStatus {
    let mut words = line.trim_start_matches('#').split_whitespace();
    if words.next() != Some("logresp") {
        return LoginStatus::Unknown;
    }
    match words.nth(1).map(|w| w.trim_end_matches(',')) {
        Some("verified") => LoginStatus::Verified,
        Some("unverified") => LoginStatus::Unverified,
        _ => LoginStatus::Unknown,
    }
}

pub struct AprsIsTransport {
    settings: AprsIsSettings,
    stream: Option<TcpStream>,
}

impl AprsIsTransport {
    pub fn new(settings: AprsIsSettings) -> Self {
        Self { settings, stream: None }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn open_stream(&self) -> TransportResult<TcpStream> {
        let address = format!("{}:{}", self.settings.host, self.settings.port);
        let connect_failed = |source| TransportError::ConnectFailed { address: address.clone(), source };

        let mut last_error = None;
        for addr in address.to_socket_addrs().map_err(connect_failed)? {
            match TcpStream::connect_timeout(&addr, Duration::from_secs(CONNECT_TIMEOUT_SECS)) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(connect_failed(last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        })))
    }

    fn log_in(&self, stream: &mut TcpStream) -> TransportResult<()> {
        stream.set_read_timeout(Some(Duration::from_secs(CONNECT_TIMEOUT_SECS)))?;
        let mut reader = BufReader::new(stream.try_clone()?);

        let banner = read_server_line(&mut reader)?;
        debug!("Server: {}", banner);

        stream.write_all(login_line(&self.settings.callsign, &self.settings.passcode).as_bytes())?;
        stream.flush()?;

        let response = read_server_line(&mut reader)?;
        debug!("Server: {}", response);
        match parse_login_response(&response) {
            LoginStatus::Verified => {}
            LoginStatus::Unverified => {
                warn!("APRS-IS login for {} is unverified, packets may be dropped", self.settings.callsign)
            }
            LoginStatus::Unknown => warn!("Unexpected login response: {}", response),
        }

        stream.set_read_timeout(None)?;
        Ok(())
    }
}

fn read_server_line<R: BufRead>(reader: &mut R) -> TransportResult<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(TransportError::LoginFailed {
            details: "server closed the connection".to_string(),
        });
    }
    Ok(line.trim_end().to_string())
}

impl Transport for AprsIsTransport {
    fn connect(&mut self) -> TransportResult<()> {
        info!(
            "Connecting to APRS-IS {}:{} as {}...",
            self.settings.host, self.settings.port, self.settings.callsign
        );
        let mut stream = self.open_stream()?;
        self.log_in(&mut stream)?;
        self.stream = Some(stream);
        info!("Connected to APRS-IS");
        Ok(())
    }

    fn send(&mut self, packet: &str) -> TransportResult<()> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(packet.as_bytes())?;
        stream.write_all(b"\r\n")?;
        stream.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("APRS-IS session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_login_line() {
        let line = login_line("N0CALL", "12345");
        assert!(line.starts_with("user N0CALL pass 12345 vers aprsrunner "));
        assert!(line.ends_with("\r\n"));
    }

    #[test]
    fn test_parse_login_response() {
        assert_eq!(parse_login_response("# logresp N0CALL verified, server T2TEST"), LoginStatus::Verified);
        assert_eq!(parse_login_response("# logresp N0CALL unverified, server T2TEST"), LoginStatus::Unverified);
        assert_eq!(parse_login_response("# aprsc 2.1.14"), LoginStatus::Unknown);
        assert_eq!(parse_login_response(""), LoginStatus::Unknown);
    }

    #[test]
    fn test_send_without_connect_fails() {
        let mut transport = AprsIsTransport::new(AprsIsSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            callsign: "N0CALL".to_string(),
            passcode: "-1".to_string(),
        });
        assert!(matches!(transport.send("x"), Err(TransportError::NotConnected)));
        transport.close();
    }

    #[test]
    fn test_session_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(b"# test server 1.0\r\n").unwrap();

            let mut reader = BufReader::new(socket.try_clone().unwrap());
            let mut login = String::new();
            reader.read_line(&mut login).unwrap();
            socket.write_all(b"# logresp N0CALL verified, server TEST\r\n").unwrap();

            let mut rest = String::new();
            reader.read_to_string(&mut rest).unwrap();
            (login, rest)
        });

        let mut transport = AprsIsTransport::new(AprsIsSettings {
            host: "127.0.0.1".to_string(),
            port,
            callsign: "N0CALL".to_string(),
            passcode: "12345".to_string(),
        });
        transport.connect().unwrap();
        assert!(transport.is_connected());
        transport.send("N0CALL>APRS,TCPIP*:;DOG      _070905z").unwrap();
        transport.close();
        assert!(!transport.is_connected());

        let (login, rest) = server.join().unwrap();
        assert!(login.starts_with("user N0CALL pass 12345 "));
        assert_eq!(rest, "N0CALL>APRS,TCPIP*:;DOG      _070905z\r\n");
    }

    #[test]
    fn test_server_hangup_during_login() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            drop(socket);
        });

        let mut transport = AprsIsTransport::new(AprsIsSettings {
            host: "127.0.0.1".to_string(),
            port,
            callsign: "N0CALL".to_string(),
            passcode: "12345".to_string(),
        });
        let result = transport.connect();
        server.join().unwrap();
        assert!(result.is_err());
        assert!(!transport.is_connected());
    }
}
