use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

/// In-memory `/api/persons` backend, one request per connection.
struct FakeBackend {
    base_url: String,
}

#[derive(Default)]
struct BackendState {
    persons: Vec<Value>,
    next_id: u64,
}

impl FakeBackend {
    fn start(seed: Vec<(&str, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind backend");
        let addr = listener.local_addr().expect("backend addr");
        let mut state = BackendState {
            next_id: 1,
            ..BackendState::default()
        };
        for (name, number) in seed {
            let id = format!("id{}", state.next_id);
            state.next_id += 1;
            state
                .persons
                .push(json!({ "_id": id, "name": name, "phoneNumbers": [number] }));
        }
        let state = Arc::new(Mutex::new(state));
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                serve(stream, &state);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
        }
    }
}

fn serve(stream: TcpStream, state: &Mutex<BackendState>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    let _ = reader.read_exact(&mut body);
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let (status, reply) = route(&method, &path, payload, &mut state.lock().expect("state"));
    let reply = reply.map(|value| value.to_string()).unwrap_or_default();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.len(),
        reply
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
}

fn route(
    method: &str,
    path: &str,
    payload: Value,
    state: &mut BackendState,
) -> (&'static str, Option<Value>) {
    let not_found = || ("404 Not Found", Some(json!({ "error": "Contact not found" })));
    let id = path.strip_prefix("/api/persons/").map(str::to_string);
    match (method, id) {
        ("GET", None) => ("200 OK", Some(Value::Array(state.persons.clone()))),
        ("POST", None) => {
            let id = format!("id{}", state.next_id);
            state.next_id += 1;
            let person = json!({
                "_id": id,
                "name": payload["name"],
                "phoneNumbers": payload["phoneNumbers"],
            });
            state.persons.push(person.clone());
            ("201 Created", Some(person))
        }
        ("PUT", Some(id)) => match state.persons.iter_mut().find(|p| p["_id"] == id.as_str()) {
            Some(person) => {
                person["name"] = payload["name"].clone();
                person["phoneNumbers"] = payload["phoneNumbers"].clone();
                ("200 OK", Some(person.clone()))
            }
            None => not_found(),
        },
        ("DELETE", Some(id)) => {
            let before = state.persons.len();
            state.persons.retain(|p| p["_id"] != id.as_str());
            if state.persons.len() == before {
                not_found()
            } else {
                ("204 No Content", None)
            }
        }
        _ => ("404 Not Found", Some(json!({ "error": "unknown endpoint" }))),
    }
}

fn phonebook(backend: &FakeBackend, home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("phonebook");
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env_remove("PHONEBOOK_API_URL")
        .env_remove("PHONEBOOK_API_TOKEN")
        .args(["--base-url", &backend.base_url]);
    cmd
}

fn run_json(backend: &FakeBackend, home: &TempDir, args: &[&str]) -> Value {
    let output = phonebook(backend, home)
        .arg("--json")
        .args(args)
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("parse json")
}

#[test]
fn cli_add_list_update_delete_flow() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![("Arto Hellas", "040-123456")]);

    let created = run_json(
        &backend,
        &home,
        &["add", "--name", "Ada Lovelace", "--number", "39-445 32523"],
    );
    assert_eq!(created["name"], "Ada Lovelace");
    assert_eq!(created["phoneNumbers"], json!(["39-44532523"]));
    let id = created["id"].as_str().expect("id").to_string();

    let list = run_json(&backend, &home, &["list"]);
    assert_eq!(list.as_array().expect("array").len(), 2);

    let filtered = run_json(&backend, &home, &["list", "--filter", "ADA"]);
    let filtered = filtered.as_array().expect("array");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "Ada Lovelace");

    let updated = run_json(&backend, &home, &["update", &id, "--number", "040-7654321"]);
    assert_eq!(updated["phoneNumbers"], json!(["040-7654321"]));

    run_json(&backend, &home, &["delete", &id, "--yes"]);
    let list = run_json(&backend, &home, &["list"]);
    assert_eq!(list.as_array().expect("array").len(), 1);
}

#[test]
fn cli_rejects_invalid_number_with_input_exit_code() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![]);

    let output = phonebook(&backend, &home)
        .args(["add", "--name", "Ada", "--number", "0912345678"])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("Invalid format"), "stderr: {stderr}");
}

#[test]
fn cli_duplicate_number_is_a_conflict() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![("Alice", "09-1234567")]);

    let output = phonebook(&backend, &home)
        .args(["add", "--name", "Bob", "--number", "09-123 4567"])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("Number already registered to Alice"), "stderr: {stderr}");

    let list = run_json(&backend, &home, &["list"]);
    assert_eq!(list.as_array().expect("array").len(), 1);
}

#[test]
fn cli_delete_unknown_id_is_not_found() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![]);

    let output = phonebook(&backend, &home)
        .args(["delete", "missing", "--yes"])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_delete_without_confirmation_keeps_contact() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![("Alice", "09-1234567")]);

    let output = phonebook(&backend, &home)
        .args(["delete", "id1"])
        .write_stdin("n\n")
        .output()
        .expect("run command");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("deletion cancelled"));

    let list = run_json(&backend, &home, &["list"]);
    assert_eq!(list.as_array().expect("array").len(), 1);
}

#[test]
fn cli_update_prompts_for_number() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![("Alice", "09-1234567")]);

    let output = phonebook(&backend, &home)
        .args(["update", "id1"])
        .write_stdin("040-7654321\n")
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("Update number for Alice [09-1234567]"));
    assert!(stdout.contains("Updated Alice's number"));
}

#[test]
fn cli_reports_unreachable_server() {
    let home = TempDir::new().expect("temp dir");
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    fs_write_config(&home, "[retry]\nmax_retries = 0\n");

    let output = cargo_bin_cmd!("phonebook")
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("PHONEBOOK_API_TOKEN")
        .env("PHONEBOOK_API_URL", format!("http://{addr}"))
        .arg("list")
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("Server connection failed"), "stderr: {stderr}");
}

#[test]
fn shell_session_adds_filters_and_reports() {
    let home = TempDir::new().expect("temp dir");
    let backend = FakeBackend::start(vec![("Arto Hellas", "040-123456")]);

    let output = phonebook(&backend, &home)
        .arg("shell")
        .write_stdin(
            "add Dan Abramov 12-43234345\nadd Dan Abramov 12-43234345\nfilter dan\nupdate id2\nquit\n",
        )
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("1 contacts loaded"));
    assert!(stdout.contains("[success] Added Dan Abramov"));
    assert!(stdout.contains("[warning] Dan Abramov with this number already exists"));
    assert!(stdout.contains("id2  Dan Abramov  12-43234345"));
    assert!(stdout.contains("update cancelled"));
}

fn fs_write_config(home: &TempDir, contents: &str) {
    let dir = home.path().join("phonebook");
    std::fs::create_dir_all(&dir).expect("config dir");
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(&path, perms).expect("chmod");
    }
}
