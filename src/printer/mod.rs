//! Receipt printing over ESC/POS byte channels.

pub mod dispatcher;
pub mod frame;
pub mod transport;

pub use dispatcher::{PrintDispatcher, PrintJob, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use transport::{
    DevicePrinterTransport, PrinterConnection, PrinterTransport, StreamConnection,
    TcpPrinterTransport, DEFAULT_CONNECT_TIMEOUT,
};
