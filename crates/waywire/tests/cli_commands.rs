#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use waywire_conn::{dial_path, Connection, Message, ObjectId};

const PROTOCOL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<protocol name="demo">
  <interface name="wl_counter" version="2">
    <description summary="counts things">
      A counter object.
    </description>
    <request name="bump">
      <arg name="amount" type="uint"/>
    </request>
    <event name="value">
      <arg name="total" type="uint"/>
    </event>
    <request name="reset"/>
  </interface>
</protocol>"#;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/waywire-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("file should be writable");
    path
}

fn waywire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_waywire"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn wait_for_dial(path: &Path, timeout: Duration) -> Connection {
    let start = Instant::now();
    loop {
        if let Ok(conn) = dial_path(path) {
            return conn;
        }
        if start.elapsed() >= timeout {
            panic!("dial timeout");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn generate_renders_template_to_stdout() {
    let dir = unique_temp_dir("generate");
    let protocol = write_file(&dir, "demo.xml", PROTOCOL);
    let template = write_file(
        &dir,
        "list.txt.j2",
        "{% for i in protocol.interfaces %}{% for m in i.requests %}\
{{ const_name(i.name, m.name) }}={{ m.opcode }}\n{% endfor %}{% endfor %}",
    );

    let output = waywire()
        .arg("generate")
        .arg(&template)
        .arg(&protocol)
        .arg("--trim-prefix")
        .arg("wl_")
        .output()
        .expect("generate should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "COUNTER_BUMP=0\nCOUNTER_RESET=1\n"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_builtin_template_emits_rust() {
    let dir = unique_temp_dir("builtin");
    let protocol = write_file(&dir, "demo.xml", PROTOCOL);

    let output = waywire()
        .arg("generate")
        .arg("builtin:rust")
        .arg(&protocol)
        .arg("--trim-prefix")
        .arg("wl_")
        .output()
        .expect("generate should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pub struct Counter(pub ObjectId);"));
    assert!(stdout.contains("pub fn bump<T: FdTransport>"));
    assert!(stdout.contains("pub enum CounterEvent"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_missing_protocol_exits_66() {
    let dir = unique_temp_dir("missing");
    let template = write_file(&dir, "t.j2", "{{ protocol.name }}");

    let output = waywire()
        .arg("generate")
        .arg(&template)
        .arg(dir.join("absent.xml"))
        .output()
        .expect("generate should run");

    assert_eq!(output.status.code(), Some(66));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load protocol"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_unknown_wire_type_exits_65() {
    let dir = unique_temp_dir("unknown-type");
    let protocol = write_file(
        &dir,
        "bad.xml",
        r#"<protocol name="p"><interface name="i" version="1">
<request name="r"><arg name="a" type="float"/></request>
</interface></protocol>"#,
    );
    let template = write_file(&dir, "t.j2", "{{ protocol.name }}");

    let output = waywire()
        .arg("generate")
        .arg(&template)
        .arg(&protocol)
        .output()
        .expect("generate should run");

    assert_eq!(output.status.code(), Some(65));
    assert!(String::from_utf8_lossy(&output.stderr).contains("float"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_json_lists_opcodes() {
    let dir = unique_temp_dir("inspect");
    let protocol = write_file(&dir, "demo.xml", PROTOCOL);

    let output = waywire()
        .arg("--format")
        .arg("json")
        .arg("inspect")
        .arg(&protocol)
        .output()
        .expect("inspect should run");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect output should be JSON");
    let iface = &value["interfaces"][0];
    assert_eq!(iface["name"], "wl_counter");
    assert_eq!(iface["requests"][1]["name"], "reset");
    assert_eq!(iface["requests"][1]["opcode"], 1);
    assert_eq!(iface["events"][0]["kind"], "event");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_prints_received_headers() {
    let dir = unique_temp_dir("monitor");
    let sock_path = dir.join("wayland-test");

    let child = waywire()
        .arg("--format")
        .arg("json")
        .arg("monitor")
        .arg(&sock_path)
        .arg("--count")
        .arg("2")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("monitor should start");

    let mut conn = wait_for_dial(&sock_path, Duration::from_secs(3));
    let mut first = Message::new(ObjectId::DISPLAY, 1);
    first.write_object_id(ObjectId::new(2)).unwrap();
    conn.write_message(&first).unwrap();
    let mut second = Message::new(ObjectId::new(2), 0);
    second.write_string("hi").unwrap();
    conn.write_message(&second).unwrap();

    let output = child.wait_with_output().expect("monitor should exit");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["object"], 1);
    assert_eq!(lines[0]["opcode"], 1);
    assert_eq!(lines[0]["size"], 4);
    assert_eq!(lines[1]["object"], 2);
    assert_eq!(lines[1]["size"], 8);
    assert_eq!(lines[1]["fds"], 0);

    drop(conn);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn envinfo_reports_socket_resolution() {
    let output = waywire()
        .arg("--format")
        .arg("json")
        .arg("envinfo")
        .env("XDG_RUNTIME_DIR", "/run/user/4242")
        .env("WAYLAND_DISPLAY", "wayland-7")
        .output()
        .expect("envinfo should run");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("envinfo output should be JSON");
    assert_eq!(value["socket"]["path"], "/run/user/4242/wayland-7");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}
