//! In-process stand-in for wpa_supplicant's control interface.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempfile::TempDir;
use wifictl::transport::SessionOptions;
use wifictl::wpa::WpaDriver;

pub const SCAN_RESULTS: &str = "bssid / frequency / signal level / flags / ssid\n\
    14:4d:67:14:1e:44\t2412\t-67\t[WPA2-PSK-CCMP][WPS][ESS]\tTOTOLINK N302RE\n\
    ac:9e:17:31:85:fc\t2437\t-63\t[WPA2-PSK-CCMP][WPS][ESS]\tEvan\n\
    0c:80:63:2b:0d:a8\t2417\t-79\t[WPA2-PSK-CCMP][WPS][ESS]\tKevin_H2\n\
    78:32:1b:63:96:05\t2422\t-91\t[WPA-PSK-CCMP][WPA2-PSK-CCMP][ESS]\tjoyfulness\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answers like wpa_supplicant.
    Normal,
    /// Answers PING with something other than PONG.
    NoPong,
    /// Completes the handshake, then never replies again.
    MuteAfterHandshake,
    /// Answers PING with an empty datagram.
    EmptyPong,
    /// Answers PING with a stray reply first, then PONG.
    LatePong,
    /// Holds every STATUS reply back for the given delay.
    SlowStatus(Duration),
}

#[derive(Debug, Default)]
pub struct State {
    pub networks: BTreeMap<u32, BTreeMap<String, String>>,
    pub next_id: u32,
    pub wpa_state: String,
    /// Ids whose GET_NETWORK queries are answered with FAIL.
    pub fail_ids: HashSet<u32>,
    /// SELECT_NETWORK does not lead to COMPLETED.
    pub never_complete: bool,
    /// Commands answered with FAIL instead of their usual reply.
    pub rejected: HashSet<String>,
    pub commands: Vec<String>,
}

pub struct FakeSupplicant {
    dir: TempDir,
    pub state: Arc<Mutex<State>>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl FakeSupplicant {
    pub fn start(ifaces: &[&str]) -> Self {
        Self::start_with(ifaces, Behavior::Normal)
    }

    pub fn start_with(ifaces: &[&str], behavior: Behavior) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ctrl")).unwrap();
        std::fs::create_dir(dir.path().join("local")).unwrap();

        let state = Arc::new(Mutex::new(State {
            wpa_state: "DISCONNECTED".to_string(),
            ..Default::default()
        }));
        let stop = Arc::new(AtomicBool::new(false));

        let threads = ifaces
            .iter()
            .map(|iface| {
                let sock = UnixDatagram::bind(dir.path().join("ctrl").join(iface)).unwrap();
                sock.set_read_timeout(Some(Duration::from_millis(20))).unwrap();
                let state = Arc::clone(&state);
                let stop = Arc::clone(&stop);
                thread::spawn(move || serve(sock, behavior, state, stop))
            })
            .collect();

        Self {
            dir,
            state,
            stop,
            threads,
        }
    }

    pub fn ctrl_dir(&self) -> PathBuf {
        self.dir.path().join("ctrl")
    }

    pub fn socket_dir(&self) -> PathBuf {
        self.dir.path().join("local")
    }

    pub fn driver(&self) -> WpaDriver {
        self.driver_with(SessionOptions {
            handshake_retries: 3,
            handshake_timeout: Some(Duration::from_millis(50)),
            reply_timeout: Some(Duration::from_secs(2)),
        })
    }

    pub fn driver_with(&self, options: SessionOptions) -> WpaDriver {
        WpaDriver::new(self.ctrl_dir(), self.socket_dir(), options)
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn network_count(&self) -> usize {
        self.state.lock().unwrap().networks.len()
    }
}

impl Drop for FakeSupplicant {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

fn serve(sock: UnixDatagram, behavior: Behavior, state: Arc<Mutex<State>>, stop: Arc<AtomicBool>) {
    let mut buf = vec![0u8; 4096];
    let mut handshaken = false;

    while !stop.load(Ordering::SeqCst) {
        let (n, addr) = match sock.recv_from(&mut buf) {
            Ok(received) => received,
            Err(_) => continue,
        };
        let Some(peer) = addr.as_pathname().map(Path::to_path_buf) else {
            continue;
        };
        let cmd = String::from_utf8_lossy(&buf[..n]).into_owned();

        let reply = match behavior {
            Behavior::NoPong if cmd == "PING" => Some("HELLO\n".to_string()),
            Behavior::EmptyPong if cmd == "PING" => Some(String::new()),
            Behavior::LatePong if cmd == "PING" => {
                let _ = sock.send_to(b"HELLO\n", &peer);
                Some(handle(&cmd, &mut state.lock().unwrap()))
            }
            Behavior::MuteAfterHandshake if handshaken => None,
            Behavior::SlowStatus(delay) if cmd == "STATUS" => {
                thread::sleep(delay);
                Some(handle(&cmd, &mut state.lock().unwrap()))
            }
            _ => Some(handle(&cmd, &mut state.lock().unwrap())),
        };
        if cmd == "PING" {
            handshaken = true;
        }

        if let Some(reply) = reply {
            let _ = sock.send_to(reply.as_bytes(), &peer);
        }
    }
}

fn handle(cmd: &str, state: &mut State) -> String {
    state.commands.push(cmd.to_string());
    if state.rejected.contains(cmd) {
        return "FAIL\n".to_string();
    }

    let ok = || "OK\n".to_string();
    let fail = || "FAIL\n".to_string();
    let parts: Vec<&str> = cmd.splitn(4, ' ').collect();

    match parts.as_slice() {
        ["PING"] => "PONG\n".to_string(),
        ["SCAN"] => ok(),
        ["SCAN_RESULTS"] => SCAN_RESULTS.to_string(),
        ["DISCONNECT"] => {
            state.wpa_state = "DISCONNECTED".to_string();
            ok()
        }
        ["STATUS"] => format!("address=00:0c:43:32:43:ce\nwpa_state={}\n", state.wpa_state),
        ["LIST_NETWORKS"] => {
            let mut reply = "network id / ssid / bssid / flags\n".to_string();
            for (id, fields) in &state.networks {
                let ssid = fields.get("ssid").map(|s| s.trim_matches('"')).unwrap_or_default();
                reply.push_str(&format!("{}\t{}\tany\t[DISABLED]\n", id, ssid));
            }
            reply
        }
        ["ADD_NETWORK"] => {
            let id = state.next_id;
            state.next_id += 1;
            state.networks.insert(id, BTreeMap::new());
            format!("{}\n", id)
        }
        ["SELECT_NETWORK", id] => match id.parse::<u32>() {
            Ok(id) if state.networks.contains_key(&id) => {
                if !state.never_complete {
                    state.wpa_state = "COMPLETED".to_string();
                }
                ok()
            }
            _ => fail(),
        },
        ["REMOVE_NETWORK", "all"] => {
            state.networks.clear();
            ok()
        }
        ["REMOVE_NETWORK", id] => match id.parse::<u32>() {
            Ok(id) if state.networks.remove(&id).is_some() => ok(),
            _ => fail(),
        },
        ["SET_NETWORK", id, field, value] => match id.parse::<u32>() {
            Ok(id) => match state.networks.get_mut(&id) {
                Some(fields) => {
                    fields.insert(field.to_string(), value.to_string());
                    ok()
                }
                None => fail(),
            },
            Err(_) => fail(),
        },
        ["GET_NETWORK", id, field] => {
            let Ok(id) = id.parse::<u32>() else {
                return fail();
            };
            if state.fail_ids.contains(&id) {
                return fail();
            }
            let Some(fields) = state.networks.get(&id) else {
                return fail();
            };
            match (*field, fields.get(*field)) {
                ("psk", _) => fail(),
                (_, Some(value)) => value.clone(),
                ("key_mgmt", None) => "WPA-PSK WPA-EAP".to_string(),
                ("proto", None) => "WPA RSN".to_string(),
                ("pairwise", None) => "CCMP TKIP".to_string(),
                _ => fail(),
            }
        }
        _ => "UNKNOWN COMMAND\n".to_string(),
    }
}
