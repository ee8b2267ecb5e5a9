//! Byte-stream connections: plain TCP for `http`, rustls TLS for the rest.
//!
//! # Design
//! A `Connection` is owned by exactly one exchange. Dropping it closes the
//! socket, so every exit path (errors, abandoned redirect hops, released
//! bodies) releases the connection without explicit cleanup. The TLS
//! handshake is driven to completion inside `open` so handshake failures
//! surface as `HttpError::Connect` rather than as a later write error.
//!
//! Certificates are verified against the platform trust store.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, OnceLock};

use log::{debug, warn};
use rustls::pki_types::ServerName;
use rustls::{ClientConnection, RootCertStore, StreamOwned};

use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::target::Target;

/// An open byte stream to the server named by a `Target`.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Connection {
    /// Dial `target`, performing the TLS handshake for non-`http` schemes.
    pub fn open(target: &Target, config: &ClientConfig) -> Result<Self, HttpError> {
        let authority = target.authority();
        let socket = connect_tcp(&authority, config).map_err(|e| connect_error(target, e))?;
        if !target.is_tls() {
            debug!("connected to {authority}");
            return Ok(Connection::Plain(socket));
        }
        let tls = shared_tls_config().map_err(|e| connect_error(target, e))?;
        Self::handshake(target, socket, tls)
    }

    /// Run the TLS handshake for `target` over an already connected socket.
    pub(crate) fn handshake(
        target: &Target,
        mut socket: TcpStream,
        tls: Arc<rustls::ClientConfig>,
    ) -> Result<Self, HttpError> {
        let server_name = ServerName::try_from(target.server_name().to_string())
            .map_err(|e| HttpError::url(&target.to_string(), e.to_string()))?;
        let mut session = ClientConnection::new(tls, server_name)
            .map_err(|e| connect_error(target, io::Error::other(e)))?;
        while session.is_handshaking() {
            session
                .complete_io(&mut socket)
                .map_err(|e| connect_error(target, e))?;
        }
        debug!(
            "TLS session established with {} ({:?})",
            target.authority(),
            session.protocol_version()
        );
        Ok(Connection::Tls(Box::new(StreamOwned::new(session, socket))))
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, Connection::Tls(_))
    }
}

fn connect_error(target: &Target, source: io::Error) -> HttpError {
    HttpError::Connect {
        authority: target.authority(),
        source,
    }
}

fn connect_tcp(authority: &str, config: &ClientConfig) -> io::Result<TcpStream> {
    let socket = match config.connect_timeout() {
        None => TcpStream::connect(authority)?,
        Some(limit) => {
            let mut last_err = None;
            let mut connected = None;
            for addr in authority.to_socket_addrs()? {
                match TcpStream::connect_timeout(&addr, limit) {
                    Ok(socket) => {
                        connected = Some(socket);
                        break;
                    }
                    Err(e) => last_err = Some(e),
                }
            }
            match connected {
                Some(socket) => socket,
                None => {
                    return Err(last_err.unwrap_or_else(|| {
                        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
                    }))
                }
            }
        }
    };
    socket.set_read_timeout(config.read_timeout())?;
    socket.set_write_timeout(config.write_timeout())?;
    Ok(socket)
}

/// Process-wide TLS settings: ring crypto, platform root certificates, no
/// client authentication. Built once and shared by every TLS connection.
fn shared_tls_config() -> io::Result<Arc<rustls::ClientConfig>> {
    static CONFIG: OnceLock<Result<Arc<rustls::ClientConfig>, rustls::Error>> = OnceLock::new();
    CONFIG
        .get_or_init(|| client_config(root_store()).map(Arc::new))
        .clone()
        .map_err(io::Error::other)
}

fn client_config(roots: RootCertStore) -> Result<rustls::ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    Ok(rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth())
}

/// Trust anchors from the platform store. The bundled Mozilla roots are used
/// only when the platform provides none (e.g. a bare container).
fn root_store() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!("platform certificate source unavailable: {err}");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!("loaded {added} platform root certificates, skipped {ignored}");
    if roots.is_empty() {
        warn!("platform trust store is empty, falling back to bundled webpki roots");
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    roots
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.read(buf),
            Connection::Tls(stream) => match stream.read(buf) {
                // Servers that close without close_notify are common with
                // `Connection: close`; treat it as a normal end of stream.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
                other => other,
            },
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.write(buf),
            Connection::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Plain(stream) => stream.flush(),
            Connection::Tls(stream) => stream.flush(),
        }
    }
}
