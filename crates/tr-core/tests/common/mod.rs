//! Test log builder: maintains a live process table the way the strace
//! converter does, so every keyframe it emits is consistent with the
//! incremental events around it.

use serde_json::{json, Map, Value};

/// Events that carry a full `p_table` in the converter's output.
const KEYFRAME_EVENTS: &[&str] = &["add_proc", "close_proc", "open_fd", "close_fd", "accept"];

#[derive(Default)]
pub struct LogBuilder {
    lines: Vec<String>,
    p_table: Map<String, Value>,
    clock: u32,
}

impl LogBuilder {
    pub fn new() -> LogBuilder {
        LogBuilder::default()
    }

    pub fn build(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    fn emit(&mut self, event: Value) {
        let name = event["name"].as_str().unwrap().to_string();
        let time = format!("00:00:{:02}.{:03}", self.clock / 1000, self.clock % 1000);
        self.clock += 1;
        let p_table = if KEYFRAME_EVENTS.contains(&name.as_str()) {
            Value::Object(self.p_table.clone())
        } else {
            Value::Null
        };
        let line = json!({ "time": time, "event": event, "p_table": p_table });
        self.lines.push(line.to_string());
    }

    fn proc_mut(&mut self, pid: i32) -> Option<&mut Map<String, Value>> {
        self.p_table
            .get_mut(&pid.to_string())
            .and_then(Value::as_object_mut)
    }

    fn fd_mut(&mut self, pid: i32, fd: i32) -> Option<&mut Map<String, Value>> {
        self.proc_mut(pid)?
            .get_mut("fd_table")?
            .as_object_mut()?
            .get_mut(&fd.to_string())
            .and_then(Value::as_object_mut)
    }

    /// The fd entry only if it is a socket; bind/listen/connect/accept on
    /// anything else never make it into a real trace.
    fn sock_mut(&mut self, pid: i32, fd: i32) -> Option<&mut Map<String, Value>> {
        match self.fd_mut(pid, fd) {
            Some(f) if f["class"] == "SSocket" => Some(f),
            _ => None,
        }
    }

    pub fn add_proc(&mut self, pid: i32, ppid: i32) {
        if self.p_table.contains_key(&pid.to_string()) {
            return;
        }
        let mut fd_table = Map::new();
        for fd in 0..3 {
            fd_table.insert(
                fd.to_string(),
                json!({ "class": "SStd", "fd": fd, "r": 0, "w": 0 }),
            );
        }
        self.p_table.insert(
            pid.to_string(),
            json!({
                "ppid": ppid,
                "pid": pid,
                "name": "postgres",
                "memory": 0,
                "fd_table": fd_table,
            }),
        );
        self.emit(json!({ "name": "add_proc", "pid": pid, "ppid": ppid }));
    }

    pub fn close_proc(&mut self, pid: i32) {
        if self.p_table.remove(&pid.to_string()).is_none() {
            return;
        }
        self.emit(json!({ "name": "close_proc", "pid": pid }));
    }

    /// Track a new descriptor; refuses live fds (the kernel never hands
    /// out a number that is still open).
    fn insert_fd(&mut self, pid: i32, fd: i32, snapshot: Value) -> bool {
        match self.proc_mut(pid).and_then(|p| p["fd_table"].as_object_mut()) {
            Some(table) if !table.contains_key(&fd.to_string()) => {
                table.insert(fd.to_string(), snapshot);
                true
            }
            _ => false,
        }
    }

    pub fn open_file(&mut self, pid: i32, fd: i32, target: &str) {
        let snap = json!({
            "class": "SFile", "fd": fd, "target": target, "flag": "O_RDWR",
            "r": 0, "w": 0,
        });
        if self.insert_fd(pid, fd, snap) {
            self.emit(json!({ "name": "open_fd", "pid": pid, "fd": fd }));
        }
    }

    pub fn open_socket(&mut self, pid: i32, fd: i32, domain: &str) {
        let snap = json!({
            "class": "SSocket", "fd": fd, "domain": domain,
            "stype": "SOCK_STREAM", "protocol": "IPPROTO_IP",
            "r": 0, "w": 0, "is_out": null, "family": null,
            "bind": null, "target": null,
        });
        if self.insert_fd(pid, fd, snap) {
            self.emit(json!({ "name": "open_fd", "pid": pid, "fd": fd }));
        }
    }

    pub fn open_pipe(&mut self, pid: i32, fd: i32) {
        let snap = json!({ "class": "SPipe", "fd": fd, "r": 0, "w": 0 });
        if self.insert_fd(pid, fd, snap) {
            self.emit(json!({ "name": "open_fd", "pid": pid, "fd": fd }));
        }
    }

    /// Accept on `src`: a fresh socket fd cloned from the listener with
    /// reset counters and inbound direction, converter-style.
    pub fn accept(&mut self, pid: i32, src: i32, fd: i32) {
        let Some(listener) = self.sock_mut(pid, src).map(|f| Value::Object(f.clone())) else {
            return;
        };
        let mut snap = listener;
        snap["fd"] = json!(fd);
        snap["is_out"] = json!(false);
        snap["r"] = json!(0);
        snap["w"] = json!(0);
        if self.insert_fd(pid, fd, snap) {
            self.emit(json!({ "name": "accept", "pid": pid, "src": src, "fd": fd }));
        }
    }

    pub fn close_fd(&mut self, pid: i32, fd: i32) {
        let removed = self
            .proc_mut(pid)
            .and_then(|p| p["fd_table"].as_object_mut())
            .and_then(|t| t.remove(&fd.to_string()));
        if removed.is_some() {
            self.emit(json!({ "name": "close_fd", "pid": pid, "fd": fd }));
        }
    }

    pub fn read_fd(&mut self, pid: i32, fd: i32, len: i64) {
        let Some(f) = self.fd_mut(pid, fd) else { return };
        let r = f["r"].as_i64().unwrap_or(0) + len;
        f.insert("r".to_string(), json!(r));
        self.emit(json!({ "name": "read_fd", "pid": pid, "fd": fd, "content": null, "len": len }));
    }

    pub fn write_fd(&mut self, pid: i32, fd: i32, len: i64) {
        let Some(f) = self.fd_mut(pid, fd) else { return };
        let w = f["w"].as_i64().unwrap_or(0) + len;
        f.insert("w".to_string(), json!(w));
        self.emit(json!({ "name": "write_fd", "pid": pid, "fd": fd, "content": null, "len": len }));
    }

    pub fn bind(&mut self, pid: i32, fd: i32, family: &str, addr: &str) {
        let Some(f) = self.sock_mut(pid, fd) else { return };
        f.insert("family".to_string(), json!(family));
        f.insert("bind".to_string(), json!(addr));
        self.emit(json!({ "name": "bind", "pid": pid, "fd": fd, "family": family, "bind": addr }));
    }

    pub fn listen(&mut self, pid: i32, fd: i32) {
        let Some(f) = self.sock_mut(pid, fd) else { return };
        f.insert("is_out".to_string(), json!(false));
        self.emit(json!({ "name": "listen", "pid": pid, "fd": fd }));
    }

    pub fn connect(&mut self, pid: i32, fd: i32, family: &str, target: &str) {
        let Some(f) = self.sock_mut(pid, fd) else { return };
        f.insert("family".to_string(), json!(family));
        f.insert("target".to_string(), json!(target));
        f.insert("is_out".to_string(), json!(true));
        self.emit(
            json!({ "name": "connect", "pid": pid, "fd": fd, "family": family, "target": target }),
        );
    }

    pub fn manip_mem(&mut self, pid: i32, amount: i64) {
        let Some(p) = self.proc_mut(pid) else { return };
        let memory = p["memory"].as_i64().unwrap_or(0) + amount;
        p.insert("memory".to_string(), json!(memory));
        self.emit(
            json!({ "name": "manip_mem", "pid": pid, "addr": "0x7f0000000000", "amount": amount }),
        );
    }
}
