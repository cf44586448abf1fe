use super::{parse_commands, TelemetryFrame};
use crate::control::Command;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Largest command datagram accepted.
const MAX_DATAGRAM: usize = 1024;

/// Telemetry exchange with a single ground station over UDP.
#[derive(Debug)]
pub struct TelemetryLink {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl TelemetryLink {
    /// Bind to `local` and publish to `peer`.
    pub async fn bind(local: SocketAddr, peer: SocketAddr) -> crate::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        log::info!(
            "telemetry bound to {} publishing to {}",
            socket.local_addr()?,
            peer
        );
        Ok(Self { socket, peer })
    }

    pub fn local_addr(&self) -> crate::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one frame as a single datagram.
    pub async fn send(&self, frame: &TelemetryFrame) -> crate::Result<()> {
        self.socket
            .send_to(frame.encode().as_bytes(), self.peer)
            .await?;
        Ok(())
    }

    /// Wait for the next datagram from any sender and parse its commands.
    pub async fn recv_commands(&self) -> crate::Result<Vec<Command>> {
        let mut buf = [0; MAX_DATAGRAM];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        let payload = String::from_utf8_lossy(&buf[..len]);
        let commands: Vec<_> = parse_commands(&payload).collect();
        log::trace!("{} commands from {}", commands.len(), from);
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[tokio::test]
    async fn loopback() {
        let station = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let link = TelemetryLink::bind(
            "127.0.0.1:0".parse().unwrap(),
            station.local_addr().unwrap(),
        )
        .await
        .unwrap();

        let frame = TelemetryFrame {
            time: 0.25,
            ..TelemetryFrame::default()
        };
        link.send(&frame).await.unwrap();

        let mut buf = [0; MAX_DATAGRAM * 2];
        let (len, _) = station.recv_from(&mut buf).await.unwrap();
        let received = std::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(received, frame.encode());

        station
            .send_to(b"throttle 70\nroll 60\n", link.local_addr().unwrap())
            .await
            .unwrap();
        let commands = link.recv_commands().await.unwrap();
        assert_eq!(commands.len(), 2);
        match commands[..] {
            [Command::Throttle(throttle), Command::Roll(roll)] => {
                assert_abs_diff_eq!(throttle, 0.7, epsilon = 1e-6);
                assert_abs_diff_eq!(roll, 0.1, epsilon = 1e-6);
            }
            _ => panic!("unexpected commands {commands:?}"),
        }
    }
}
