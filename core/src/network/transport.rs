//! Raw ICMP transport.
//!
//! One layer-3 channel per prober. The blocking pnet receiver lives on its own
//! thread and hands every classified datagram to whichever probe registered
//! for it, through a oneshot channel.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use pnet::packet::Packet;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::transport::{self, TransportChannelType, TransportReceiver, TransportSender};
use sweepr_protocols::icmp::{self, EchoKey, EchoOutcome};
use tokio::sync::oneshot;
use tracing::{debug, trace};

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer3(IpNextHeaderProtocols::Icmp);
/// Upper bound on how long the listener blocks before re-checking shutdown.
const LISTEN_TICK: Duration = Duration::from_millis(50);

type PendingMap = Arc<Mutex<HashMap<EchoKey, oneshot::Sender<EchoOutcome>>>>;

pub struct IcmpHandle {
    tx: Mutex<TransportSender>,
    pending: PendingMap,
    running: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

/// Opens the raw socket and starts the listener thread.
///
/// Fails with the OS error when the process may not open raw sockets.
pub fn start_icmp_capture() -> io::Result<IcmpHandle> {
    let (tx, rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, CHANNEL_TYPE_ICMP)?;
    let pending: PendingMap = Arc::default();
    let running: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
    let listener = spawn_listener(rx, pending.clone(), running.clone());

    Ok(IcmpHandle {
        tx: Mutex::new(tx),
        pending,
        running,
        listener: Some(listener),
    })
}

fn spawn_listener(mut rx: TransportReceiver, pending: PendingMap, running: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut iterator = transport::ipv4_packet_iter(&mut rx);
        while running.load(Ordering::Relaxed) {
            match iterator.next_with_timeout(LISTEN_TICK) {
                Ok(Some((packet, _))) => dispatch(&pending, packet.packet()),
                Ok(None) => {}
                Err(e) => {
                    debug!("icmp receive failed: {e}");
                    std::thread::sleep(LISTEN_TICK);
                }
            }
        }
    })
}

fn dispatch(pending: &PendingMap, bytes: &[u8]) {
    let Some((key, outcome)) = icmp::classify(bytes) else {
        return;
    };
    let waiter = match pending.lock() {
        Ok(mut map) => map.remove(&key),
        Err(_) => None,
    };
    if let Some(waiter) = waiter {
        trace!("{} answered sequence {} with {outcome:?}", key.target, key.sequence);
        let _ = waiter.send(outcome);
    }
}

impl IcmpHandle {
    /// Registers interest in `key`. Must happen before the request is sent.
    pub fn register(&self, key: EchoKey) -> io::Result<oneshot::Receiver<EchoOutcome>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().map_err(|_| poisoned())?.insert(key, tx);
        Ok(rx)
    }

    pub fn unregister(&self, key: &EchoKey) {
        if let Ok(mut map) = self.pending.lock() {
            map.remove(key);
        }
    }

    pub fn send_to(&self, datagram: &[u8], target: Ipv4Addr) -> io::Result<usize> {
        let packet = Ipv4Packet::new(datagram)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "truncated ipv4 datagram"))?;
        let mut tx = self.tx.lock().map_err(|_| poisoned())?;
        tx.send_to(packet, IpAddr::V4(target))
    }
}

impl Drop for IcmpHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(listener) = self.listener.take() {
            let _ = listener.join();
        }
    }
}

fn poisoned() -> io::Error {
    io::Error::other("icmp channel lock poisoned")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
