use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{error, info, warn};
use std::io::{self, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

// One emulator command line and where to report whether a client got it
struct LinkRequest {
    line: String,
    delivered: Sender<bool>,
}

/// Handle to the console link thread
pub struct ConsoleLink {
    tx: Sender<LinkRequest>,
}

impl ConsoleLink {
    /// Writes `line` to the connected emulator, waiting for the result
    ///
    /// False when no client is connected, the write failed or the link
    /// thread is gone.
    pub fn deliver(&self, line: &str) -> bool {
        let (delivered, result) = bounded(1);
        let request = LinkRequest {
            line: line.to_string(),
            delivered,
        };
        if self.tx.send(request).is_err() {
            return false;
        }
        result.recv().unwrap_or(false)
    }
}

// Takes the newest pending connection, if any, as the client
fn accept_pending(listener: &TcpListener, client: &mut Option<TcpStream>) {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!("Console link could not configure {}: {}", peer, e);
                    continue;
                }
                info!("Console link connected to {}", peer);
                *client = Some(stream);
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(e) => {
                warn!("Console link accept failed: {}", e);
                return;
            }
        }
    }
}

fn serve(listener: TcpListener, rx: Receiver<LinkRequest>) {
    if let Err(e) = listener.set_nonblocking(true) {
        error!("Console link could not poll for clients: {}", e);
        return;
    }

    let mut client: Option<TcpStream> = None;
    for request in rx.iter() {
        accept_pending(&listener, &mut client);

        let delivered = match client.as_mut() {
            Some(stream) => match stream.write_all(format!("{}\n", request.line).as_bytes()) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Console link dropped \"{}\": {}", request.line, e);
                    client = None;
                    false
                }
            },
            None => false,
        };
        let _reply = request.delivered.send(delivered);
    }
}

fn link_thread(rx: Receiver<LinkRequest>, addr: &str) {
    let listener = match TcpListener::bind(addr) {
        Ok(listener) => listener,
        Err(e) => {
            error!("Console link could not listen on {}: {}", addr, e);
            return;
        }
    };
    info!("Console link listening on {}", addr);
    serve(listener, rx);
}

/// Starts the console link thread listening on `addr`
pub fn console_link(addr: &str) -> ConsoleLink {
    let (tx, rx) = unbounded();
    let addr = addr.to_string();

    let spawned = thread::Builder::new()
        .name("console-link".to_string())
        .spawn(move || link_thread(rx, &addr));
    if let Err(e) = spawned {
        error!("Failed to start the console link thread: {}", e);
    }
    ConsoleLink { tx }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A link served from an already bound listener
    pub fn link_on(listener: TcpListener) -> ConsoleLink {
        let (tx, rx) = unbounded();
        thread::spawn(move || serve(listener, rx));
        ConsoleLink { tx }
    }
}
