use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tokio::{
    fs::OpenOptions,
    io::{AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time,
};

use crate::error::TransportError;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// An open byte channel to the printer.
#[async_trait]
pub trait PrinterConnection: Send {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    async fn flush(&mut self) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait PrinterTransport: Send + Sync {
    fn describe(&self) -> String;

    async fn connect(&self) -> Result<Box<dyn PrinterConnection>, TransportError>;
}

/// Connection over anything that accepts bytes: a device node or a socket.
pub struct StreamConnection<W> {
    writer: W,
}

impl<W> StreamConnection<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> PrinterConnection for StreamConnection<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.writer
            .write_all(bytes)
            .await
            .map_err(|err| TransportError::Write {
                message: err.to_string(),
            })
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.writer
            .flush()
            .await
            .map_err(|err| TransportError::Write {
                message: err.to_string(),
            })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer
            .shutdown()
            .await
            .map_err(|err| TransportError::Write {
                message: format!("close failed: {err}"),
            })
    }
}

/// Character device such as `/dev/rfcomm0` or `/dev/usb/lp0`.
#[derive(Debug, Clone)]
pub struct DevicePrinterTransport {
    path: PathBuf,
    connect_timeout: Duration,
}

impl DevicePrinterTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl PrinterTransport for DevicePrinterTransport {
    fn describe(&self) -> String {
        format!("device {}", self.path.display())
    }

    async fn connect(&self) -> Result<Box<dyn PrinterConnection>, TransportError> {
        let mut options = OpenOptions::new();
        options.write(true);
        let file = time::timeout(self.connect_timeout, options.open(&self.path))
            .await
            .map_err(|_| TransportError::Connect {
                message: format!("timed out opening {}", self.path.display()),
            })?
            .map_err(|err| TransportError::Connect {
                message: format!("{}: {err}", self.path.display()),
            })?;
        Ok(Box::new(StreamConnection::new(file)))
    }
}

/// Raw network printer (usually port 9100).
#[derive(Debug, Clone)]
pub struct TcpPrinterTransport {
    address: String,
    connect_timeout: Duration,
}

impl TcpPrinterTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl PrinterTransport for TcpPrinterTransport {
    fn describe(&self) -> String {
        format!("tcp {}", self.address)
    }

    async fn connect(&self) -> Result<Box<dyn PrinterConnection>, TransportError> {
        let stream = time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| TransportError::Connect {
                message: format!("timed out connecting to {}", self.address),
            })?
            .map_err(|err| TransportError::Connect {
                message: format!("{}: {err}", self.address),
            })?;
        Ok(Box::new(StreamConnection::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use tokio::{io::AsyncReadExt, net::TcpListener};

    use super::*;

    #[tokio::test]
    async fn tcp_transport_delivers_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let transport = TcpPrinterTransport::new(address);
        let mut connection = transport.connect().await.unwrap();
        connection.write(b"hola\n").await.unwrap();
        connection.flush().await.unwrap();
        connection.close().await.unwrap();
        drop(connection);

        assert_eq!(server.await.unwrap(), b"hola\n");
    }

    #[tokio::test]
    async fn device_transport_writes_to_node() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let transport = DevicePrinterTransport::new(device.path());

        let mut connection = transport.connect().await.unwrap();
        connection.write(b"ticket").await.unwrap();
        connection.close().await.unwrap();

        assert_eq!(std::fs::read(device.path()).unwrap(), b"ticket");
    }

    #[tokio::test]
    async fn device_transport_honours_connect_timeout() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let transport =
            DevicePrinterTransport::new(device.path()).with_connect_timeout(Duration::from_secs(1));

        let mut connection = transport.connect().await.unwrap();
        connection.write(b"ok").await.unwrap();
        connection.flush().await.unwrap();
        connection.close().await.unwrap();

        assert_eq!(std::fs::read(device.path()).unwrap(), b"ok");
    }

    #[tokio::test]
    async fn unreachable_tcp_printer_fails_to_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let transport =
            TcpPrinterTransport::new(address).with_connect_timeout(Duration::from_millis(500));
        assert!(matches!(
            transport.connect().await,
            Err(TransportError::Connect { .. })
        ));
    }

    #[tokio::test]
    async fn missing_device_fails_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let transport = DevicePrinterTransport::new(dir.path().join("rfcomm9"));

        assert!(matches!(
            transport.connect().await,
            Err(TransportError::Connect { .. })
        ));
    }
}
