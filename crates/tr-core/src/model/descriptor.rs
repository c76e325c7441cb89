//! Open descriptor state and display rendering.

use tr_common::Fd;
use tr_log::FdSnapshot;

/// Render a byte count: plain integer below 1 KiB, otherwise KiB with two
/// decimals and a `K` suffix.
pub fn size_text(v: i64) -> String {
    if v < 1024 {
        v.to_string()
    } else {
        format!("{:.2}K", v as f64 / 1024.0)
    }
}

/// Coarse descriptor class, exposed to state sinks so renderers can pick
/// a representation without inspecting the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorClass {
    File,
    Socket,
    Std,
    Epoll,
    Pipe,
}

/// Mutable socket detail. The creation triple is fixed; the remaining
/// fields start unset and are only ever overwritten with concrete values
/// (bind/connect/listen never clear anything).
#[derive(Debug, Clone, PartialEq)]
pub struct SocketInfo {
    pub domain: String,
    pub stype: String,
    pub protocol: String,
    pub is_out: Option<bool>,
    pub family: Option<String>,
    pub bind: Option<String>,
    pub target: Option<String>,
}

/// Kind-specific payload. Immutable discriminant after creation: no trace
/// event changes a descriptor's kind in place.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorKind {
    /// The open flag stays on the wire type; display only names the path.
    File { target: String },
    Socket(SocketInfo),
    Std,
    Epoll,
    Pipe,
}

/// One open file descriptor/socket belonging to a process.
///
/// Identity is `(pid, fd)`; the pid half lives with the owning process.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub fd: Fd,
    pub bytes_read: i64,
    pub bytes_written: i64,
    kind: DescriptorKind,
}

impl Descriptor {
    /// Build a descriptor from its keyframe snapshot, counters included.
    pub fn from_snapshot(snap: &FdSnapshot) -> Descriptor {
        match snap {
            FdSnapshot::SFile {
                fd, target, r, w, ..
            } => Descriptor {
                fd: *fd,
                bytes_read: *r,
                bytes_written: *w,
                kind: DescriptorKind::File {
                    target: target.clone(),
                },
            },
            FdSnapshot::SSocket {
                fd,
                domain,
                stype,
                protocol,
                r,
                w,
                is_out,
                family,
                bind,
                target,
            } => Descriptor {
                fd: *fd,
                bytes_read: *r,
                bytes_written: *w,
                kind: DescriptorKind::Socket(SocketInfo {
                    domain: domain.clone(),
                    stype: stype.clone(),
                    protocol: protocol.clone(),
                    is_out: *is_out,
                    family: family.clone(),
                    bind: bind.clone(),
                    target: target.clone(),
                }),
            },
            FdSnapshot::SStd { fd, r, w } => Descriptor {
                fd: *fd,
                bytes_read: *r,
                bytes_written: *w,
                kind: DescriptorKind::Std,
            },
            FdSnapshot::SEpoll { fd, r, w } => Descriptor {
                fd: *fd,
                bytes_read: *r,
                bytes_written: *w,
                kind: DescriptorKind::Epoll,
            },
            FdSnapshot::SPipe { fd, r, w } => Descriptor {
                fd: *fd,
                bytes_read: *r,
                bytes_written: *w,
                kind: DescriptorKind::Pipe,
            },
        }
    }

    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    pub fn class(&self) -> DescriptorClass {
        match self.kind {
            DescriptorKind::File { .. } => DescriptorClass::File,
            DescriptorKind::Socket(_) => DescriptorClass::Socket,
            DescriptorKind::Std => DescriptorClass::Std,
            DescriptorKind::Epoll => DescriptorClass::Epoll,
            DescriptorKind::Pipe => DescriptorClass::Pipe,
        }
    }

    /// Add read/write byte deltas. Existence of the descriptor is the
    /// caller's concern; a missed lookup is ignored upstream, not here.
    pub fn apply_counter_delta(&mut self, r: i64, w: i64) {
        self.bytes_read += r;
        self.bytes_written += w;
    }

    /// Overwrite the present socket fields, leaving absent ones untouched.
    /// Returns false (untouched) for non-socket descriptors.
    pub fn apply_socket_update(
        &mut self,
        family: Option<&str>,
        bind: Option<&str>,
        target: Option<&str>,
        is_out: Option<bool>,
    ) -> bool {
        let DescriptorKind::Socket(ref mut sock) = self.kind else {
            return false;
        };
        if let Some(family) = family {
            sock.family = Some(family.to_string());
        }
        if let Some(bind) = bind {
            sock.bind = Some(bind.to_string());
        }
        if let Some(target) = target {
            sock.target = Some(target.to_string());
        }
        if is_out.is_some() {
            sock.is_out = is_out;
        }
        true
    }

    /// Human-readable summary: `(fd) <description> r: <size> w: <size>`.
    ///
    /// Sockets show their domain until a bind or connect names an address,
    /// then switch to `family address` plus the direction once known.
    pub fn render(&self) -> String {
        let desc = match &self.kind {
            DescriptorKind::File { target, .. } => target.clone(),
            DescriptorKind::Socket(sock) => {
                if sock.target.is_some() || sock.bind.is_some() {
                    let mut desc = sock.family.clone().unwrap_or_default();
                    if let Some(target) = &sock.target {
                        desc.push(' ');
                        desc.push_str(target);
                    } else if let Some(bind) = &sock.bind {
                        desc.push(' ');
                        desc.push_str(bind);
                    }
                    match sock.is_out {
                        Some(true) => desc.push_str(" (out)"),
                        Some(false) => desc.push_str(" (in)"),
                        None => {}
                    }
                    desc
                } else {
                    sock.domain.clone()
                }
            }
            DescriptorKind::Std => "std".to_string(),
            DescriptorKind::Epoll => "epoll".to_string(),
            DescriptorKind::Pipe => "pipe".to_string(),
        };
        format!(
            "({}) {} r: {} w: {}",
            self.fd,
            desc,
            size_text(self.bytes_read),
            size_text(self.bytes_written)
        )
    }
}
