pub type Pid = u16;

/// Size of the host's process table. Valid pids are `0..MAX_PROCESSES`.
pub const MAX_PROCESSES: Pid = 50;

#[inline]
pub const fn is_valid_pid(pid: Pid) -> bool {
    pid < MAX_PROCESSES
}
