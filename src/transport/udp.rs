// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a UDP subscription which only delivers the newest datagram.
use crate::exception::AdmittanceException;
use crate::transport::Subscription;
use crate::AdmittanceResult;
use mio::net::UdpSocket;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

const SOCKET: Token = Token(0);
const MAX_DATAGRAM_SIZE: usize = 65_507;

fn transport_exception(channel: &str, error: io::Error) -> AdmittanceException {
    AdmittanceException::TransportException {
        message: format!("{}: {}", channel, error),
    }
}

/// Receives measurement messages of one channel on a UDP socket.
///
/// Datagrams which queued up in the socket between two receives are skipped,
/// only the newest one is delivered.
pub struct UdpSubscription {
    channel: String,
    udp_socket: UdpSocket,
    poll_read: Poll,
    events: Events,
    buffer: Vec<u8>,
}

impl UdpSubscription {
    /// Binds a socket for `channel` to `address`. Use port 0 to let the OS choose a port.
    pub fn bind(channel: &str, address: SocketAddr) -> AdmittanceResult<UdpSubscription> {
        let mut udp_socket =
            UdpSocket::bind(address).map_err(|e| transport_exception(channel, e))?;
        let poll_read = Poll::new().map_err(|e| transport_exception(channel, e))?;
        poll_read
            .registry()
            .register(&mut udp_socket, SOCKET, Interest::READABLE)
            .map_err(|e| transport_exception(channel, e))?;
        Ok(UdpSubscription {
            channel: channel.to_string(),
            udp_socket,
            poll_read,
            events: Events::with_capacity(1),
            buffer: vec![0; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> AdmittanceResult<SocketAddr> {
        self.udp_socket
            .local_addr()
            .map_err(|e| transport_exception(&self.channel, e))
    }

    fn drain(&mut self) -> AdmittanceResult<Option<Vec<u8>>> {
        let mut newest = None;
        loop {
            match self.udp_socket.recv_from(&mut self.buffer) {
                Ok((read_bytes, _)) => newest = Some(self.buffer[..read_bytes].to_vec()),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(newest),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(transport_exception(&self.channel, e)),
            }
        }
    }
}

impl Subscription for UdpSubscription {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn receive_timeout(&mut self, timeout: Duration) -> AdmittanceResult<Option<Vec<u8>>> {
        // readiness is edge triggered, so the socket has to be empty before polling
        if let Some(payload) = self.drain()? {
            return Ok(Some(payload));
        }
        match self.poll_read.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(None),
            Err(e) => return Err(transport_exception(&self.channel, e)),
        }
        if self.events.is_empty() {
            return Ok(None);
        }
        self.drain()
    }
}
