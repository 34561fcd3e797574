//! Minimal in-process SMTP server for exercising the API end to end.
//!
//! Speaks just enough of the protocol for a client to connect,
//! authenticate, and deliver: greeting, EHLO, AUTH PLAIN/LOGIN, MAIL,
//! RCPT, DATA, NOOP, RSET, QUIT. STARTTLS is never advertised, so an
//! opportunistic-TLS client stays on plaintext.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

/// How the mock reacts to commands beyond the handshake.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Reply `535` to every AUTH attempt.
    pub reject_auth: bool,
    /// Recipients to reply `550` to on RCPT.
    pub rejected_recipients: Vec<String>,
}

pub struct MockSmtpServer {
    address: SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl MockSmtpServer {
    /// Bind to an ephemeral local port and start accepting sessions.
    pub async fn start(behavior: MockBehavior) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let behavior = Arc::new(behavior);

        let accept_loop = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let behavior = Arc::clone(&behavior);
                tokio::spawn(async move {
                    let _ = serve_session(stream, &behavior).await;
                });
            }
        });

        Ok(Self {
            address,
            accept_loop,
        })
    }

    /// The host the client should dial. Always loopback.
    pub fn host(&self) -> String {
        self.address.ip().to_string()
    }

    pub const fn port(&self) -> u16 {
        self.address.port()
    }
}

impl Drop for MockSmtpServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve_session(stream: TcpStream, behavior: &MockBehavior) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half.write_all(b"220 mock.test ESMTP ready\r\n").await?;

    while let Some(line) = lines.next_line().await? {
        let command = line.to_ascii_uppercase();

        if command.starts_with("EHLO") {
            write_half
                .write_all(b"250-mock.test\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n")
                .await?;
        } else if command.starts_with("HELO") {
            write_half.write_all(b"250 mock.test\r\n").await?;
        } else if command.starts_with("AUTH") {
            if behavior.reject_auth {
                write_half
                    .write_all(b"535 5.7.8 Authentication credentials invalid\r\n")
                    .await?;
            } else {
                write_half
                    .write_all(b"235 2.7.0 Authentication successful\r\n")
                    .await?;
            }
        } else if command.starts_with("MAIL") {
            write_half.write_all(b"250 2.1.0 OK\r\n").await?;
        } else if command.starts_with("RCPT") {
            if behavior
                .rejected_recipients
                .iter()
                .any(|recipient| command.contains(&recipient.to_ascii_uppercase()))
            {
                write_half
                    .write_all(b"550 5.1.1 Mailbox unavailable\r\n")
                    .await?;
            } else {
                write_half.write_all(b"250 2.1.5 OK\r\n").await?;
            }
        } else if command.starts_with("DATA") {
            write_half
                .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                .await?;
            while let Some(data_line) = lines.next_line().await? {
                if data_line == "." {
                    break;
                }
            }
            write_half.write_all(b"250 2.0.0 Queued\r\n").await?;
        } else if command.starts_with("NOOP") || command.starts_with("RSET") {
            write_half.write_all(b"250 2.0.0 OK\r\n").await?;
        } else if command.starts_with("QUIT") {
            write_half.write_all(b"221 2.0.0 Bye\r\n").await?;
            break;
        } else {
            write_half
                .write_all(b"502 5.5.2 Command not recognized\r\n")
                .await?;
        }
    }

    Ok(())
}
