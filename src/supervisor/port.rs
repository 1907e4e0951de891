// src/supervisor/port.rs
// Port-based force-kill: resolves the pid(s) listening on a TCP port by
// reading /proc/net/tcp{,6} (inode -> socket -> pid), the same technique
// `lsof`/`fuser` use, since sysinfo exposes processes but not sockets.

use std::collections::HashSet;
use std::fs;

use sysinfo::{Pid, System};

/// Returns every pid with an open listening socket on `port`.
pub fn pids_listening_on(port: u16) -> Vec<i32> {
    let inodes = listening_inodes(port);
    if inodes.is_empty() {
        return Vec::new();
    }

    let mut pids = Vec::new();
    if let Ok(proc_entries) = fs::read_dir("/proc") {
        for entry in proc_entries.flatten() {
            let Some(pid_str) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Ok(pid) = pid_str.parse::<i32>() else {
                continue;
            };
            if pid_has_any_inode(pid, &inodes) {
                pids.push(pid);
            }
        }
    }
    pids
}

fn listening_inodes(port: u16) -> HashSet<u64> {
    let mut inodes = HashSet::new();
    for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
        if let Ok(content) = fs::read_to_string(path) {
            for line in content.lines().skip(1) {
                let fields: Vec<&str> = line.split_whitespace().collect();
                // fields[1] = local_address:port (hex), fields[3] = st (0A = LISTEN), fields[9] = inode
                if fields.len() < 10 {
                    continue;
                }
                let Some(local) = fields[1].split(':').nth(1) else {
                    continue;
                };
                let Ok(local_port) = u16::from_str_radix(local, 16) else {
                    continue;
                };
                if local_port != port || fields[3] != "0A" {
                    continue;
                }
                if let Ok(inode) = fields[9].parse::<u64>() {
                    inodes.insert(inode);
                }
            }
        }
    }
    inodes
}

fn pid_has_any_inode(pid: i32, inodes: &HashSet<u64>) -> bool {
    let fd_dir = format!("/proc/{pid}/fd");
    let Ok(entries) = fs::read_dir(&fd_dir) else {
        return false;
    };
    for entry in entries.flatten() {
        if let Ok(target) = fs::read_link(entry.path()) {
            if let Some(name) = target.to_str() {
                if let Some(inode_str) = name.strip_prefix("socket:[").and_then(|s| s.strip_suffix(']')) {
                    if let Ok(inode) = inode_str.parse::<u64>() {
                        if inodes.contains(&inode) {
                            return true;
                        }
                    }
                }
            }
        }
    }
    false
}

/// Kills `pid` and every descendant found in the current process tree.
pub fn kill_with_children(pid: i32) {
    let mut system = System::new_all();
    system.refresh_all();

    let mut to_kill = vec![pid];
    let mut frontier = vec![Pid::from(pid as usize)];

    while let Some(parent) = frontier.pop() {
        for (child_pid, process) in system.processes() {
            if process.parent() == Some(parent) {
                to_kill.push(child_pid.as_u32() as i32);
                frontier.push(*child_pid);
            }
        }
    }

    for target in to_kill {
        unsafe {
            libc::kill(target, libc::SIGKILL);
        }
    }
}
