use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;
use waywire_conn::{IpcStream, Listener};
use waywire_transport::scm::close_all;
use waywire_transport::{socket_path, DisplaySocket};

use crate::cmd::MonitorArgs;
use crate::exit::{conn_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

type Active = Arc<Mutex<Option<IpcStream>>>;

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let path = match args.path {
        Some(path) => path,
        None => socket_path().map_err(|err| transport_error("no socket path", err))?,
    };
    let listener = Listener::bind(&path).map_err(|err| conn_error("bind failed", err))?;
    info!(path = %listener.path().display(), "monitoring");

    let running = Arc::new(AtomicBool::new(true));
    let active: Active = Arc::new(Mutex::new(None));
    install_ctrlc_handler(running.clone(), active.clone(), path.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let mut conn = listener
            .accept()
            .map_err(|err| conn_error("accept failed", err))?;
        if !admit(&running, &active, conn.transport().try_clone().ok()) {
            break;
        }

        loop {
            let message = match conn.read_message() {
                Ok(message) => message,
                Err(err) if err.is_disconnect() => break,
                Err(err) => return Err(conn_error("receive failed", err)),
            };
            print_message(&message, format);
            close_all(message.fds().iter().copied());

            printed = printed.saturating_add(1);
            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
        set_active(&active, None);
        info!("client disconnected");
    }
    Ok(SUCCESS)
}

fn set_active(active: &Active, stream: Option<IpcStream>) {
    if let Ok(mut slot) = active.lock() {
        *slot = stream;
    }
}

/// Publish the accepted client, then report whether monitoring continues.
///
/// The stream is published before `running` is checked, so an interrupt
/// either sees it and shuts it down or has already cleared `running`.
fn admit(running: &AtomicBool, active: &Active, stream: Option<IpcStream>) -> bool {
    set_active(active, stream);
    running.load(Ordering::SeqCst)
}

/// Stop the loop and unblock whichever call is waiting: the current
/// client's read is shut down, and a pending accept is woken by a
/// throwaway connection.
fn interrupt(running: &AtomicBool, active: &Active, path: &Path) {
    running.store(false, Ordering::SeqCst);
    let stream = active.lock().ok().and_then(|mut slot| slot.take());
    match stream {
        Some(stream) => {
            let _ = stream.shutdown();
        }
        None => wake(path),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, active: Active, path: PathBuf) -> CliResult<()> {
    ctrlc::set_handler(move || interrupt(&running, &active, &path))
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn wake(path: &Path) {
    let _ = DisplaySocket::connect(path);
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn missing_path() -> PathBuf {
        PathBuf::from(format!("/tmp/waywire-monitor-absent-{}", std::process::id()))
    }

    #[test]
    fn interrupt_before_publish_stops_admission() {
        let running = AtomicBool::new(true);
        let active: Active = Arc::new(Mutex::new(None));
        let (server, _client) = IpcStream::pair().unwrap();

        interrupt(&running, &active, &missing_path());
        assert!(!admit(&running, &active, Some(server)));
    }

    #[test]
    fn interrupt_after_publish_shuts_down_client_stream() {
        let running = AtomicBool::new(true);
        let active: Active = Arc::new(Mutex::new(None));
        let (server, _client) = IpcStream::pair().unwrap();
        let mut reader = server.try_clone().unwrap();

        assert!(admit(&running, &active, Some(server)));
        interrupt(&running, &active, &missing_path());

        assert!(!running.load(Ordering::SeqCst));
        assert!(active.lock().unwrap().is_none());
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
