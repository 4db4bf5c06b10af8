//! Simulated system commands: process table, identity, time, and small
//! numeric utilities. Nothing here touches the real host.

use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use tangelo_types::error::{Result, TangeloError};
use tangelo_vfs::FileSystem;

use crate::interpreter::{Command, ShellOutput, ShellRegistry};

fn usage_err(msg: impl Into<String>) -> TangeloError {
    TangeloError::Shell(msg.into())
}

/// Output ceiling for `yes`.
const YES_LIMIT: usize = 20;

/// Output ceiling for `seq`.
const SEQ_LIMIT: i64 = 1000;

/// Longest accepted `sleep` duration in seconds.
const SLEEP_LIMIT: u64 = 10;

/// Largest number `factor` will decompose. Trial division past this point
/// takes long enough to stall the caller.
const FACTOR_LIMIT: u64 = 1_000_000_000_000;

// ---------------------------------------------------------------------------
// ps / kill
// ---------------------------------------------------------------------------

struct Ps;

impl Command for Ps {
    fn name(&self) -> &str {
        "ps"
    }

    fn description(&self) -> &str {
        "List processes"
    }

    fn usage(&self) -> &str {
        "ps"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let mut out = String::from("  PID CMD");
        for p in fs.processes() {
            out.push_str(&format!("\n{:>5} {}", p.pid, p.name));
        }
        Ok(ShellOutput::Text(out))
    }
}

struct Kill;

impl Command for Kill {
    fn name(&self) -> &str {
        "kill"
    }

    fn description(&self) -> &str {
        "Terminate a process"
    }

    fn usage(&self) -> &str {
        "kill <pid>"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [pid] = args else {
            return Err(usage_err("kill: usage: kill <pid>"));
        };
        let pid: u32 = pid
            .parse()
            .map_err(|_| usage_err(format!("kill: invalid pid: '{pid}'")))?;
        if pid == 1 {
            return Err(usage_err("kill: (1) - Operation not permitted"));
        }
        if !fs.kill_process(pid) {
            return Err(usage_err(format!("kill: ({pid}) - No such process")));
        }
        Ok(ShellOutput::text(""))
    }
}

// ---------------------------------------------------------------------------
// ping / uptime / identity
// ---------------------------------------------------------------------------

struct Ping;

impl Command for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Pretend to ping a host"
    }

    fn usage(&self) -> &str {
        "ping <host>"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let [host] = args else {
            return Err(usage_err("ping: usage: ping <host>"));
        };
        let mut rng = rand::thread_rng();
        let mut out = format!("PING {host} 56(84) bytes of data.");
        for seq in 1..=4 {
            let ms: f64 = rng.gen_range(8.0..60.0);
            out.push_str(&format!(
                "\n64 bytes from {host}: icmp_seq={seq} ttl=64 time={ms:.1} ms"
            ));
        }
        out.push_str(&format!(
            "\n--- {host} ping statistics ---\n4 packets transmitted, 4 received, 0% packet loss"
        ));
        Ok(ShellOutput::Text(out))
    }
}

struct Uptime;

impl Command for Uptime {
    fn name(&self) -> &str {
        "uptime"
    }

    fn description(&self) -> &str {
        "Show session uptime"
    }

    fn usage(&self) -> &str {
        "uptime"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let secs = fs.uptime_secs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        let clock = Utc::now().format("%H:%M:%S");
        Ok(ShellOutput::Text(format!(
            "{clock} up {h:02}:{m:02}:{s:02}, 1 user, load average: 0.00, 0.01, 0.05"
        )))
    }
}

struct Whoami;

impl Command for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }

    fn description(&self) -> &str {
        "Print the current user"
    }

    fn usage(&self) -> &str {
        "whoami"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        Ok(ShellOutput::Text(fs.username()))
    }
}

struct Who;

impl Command for Who {
    fn name(&self) -> &str {
        "who"
    }

    fn description(&self) -> &str {
        "Show who is logged in"
    }

    fn usage(&self) -> &str {
        "who"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let login = chrono::DateTime::<Utc>::from_timestamp(fs.uptime_start(), 0)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        Ok(ShellOutput::Text(format!("{:<8} tty1         {login}", fs.username())))
    }
}

struct Id;

impl Command for Id {
    fn name(&self) -> &str {
        "id"
    }

    fn description(&self) -> &str {
        "Print user and group ids"
    }

    fn usage(&self) -> &str {
        "id"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let user = fs.username();
        Ok(ShellOutput::Text(format!(
            "uid=1000({user}) gid=1000({user}) groups=1000({user})"
        )))
    }
}

struct Hostname;

impl Command for Hostname {
    fn name(&self) -> &str {
        "hostname"
    }

    fn description(&self) -> &str {
        "Show or set the hostname"
    }

    fn usage(&self) -> &str {
        "hostname [name]"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        match args {
            [] => Ok(ShellOutput::text(fs.hostname())),
            [name] => {
                fs.set_hostname(name);
                Ok(ShellOutput::text(""))
            },
            _ => Err(usage_err("hostname: usage: hostname [name]")),
        }
    }
}

// ---------------------------------------------------------------------------
// date / cal / sleep
// ---------------------------------------------------------------------------

struct Date;

impl Command for Date {
    fn name(&self) -> &str {
        "date"
    }

    fn description(&self) -> &str {
        "Print the current date and time"
    }

    fn usage(&self) -> &str {
        "date"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, _args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        Ok(ShellOutput::Text(
            Utc::now().format("%a %b %e %H:%M:%S UTC %Y").to_string(),
        ))
    }
}

fn month_calendar(year: i32, month: u32) -> Option<String> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let days = NaiveDate::from_ymd_opt(ny, nm, 1)?
        .signed_duration_since(first)
        .num_days() as u32;
    let offset = first.weekday().num_days_from_sunday();

    let title = format!("{} {year}", first.format("%B"));
    let mut out = format!("{title:^20}\nSu Mo Tu We Th Fr Sa\n");
    let mut line = "   ".repeat(offset as usize);
    for day in 1..=days {
        line.push_str(&format!("{day:>2} "));
        if (offset + day) % 7 == 0 {
            out.push_str(line.trim_end());
            out.push('\n');
            line.clear();
        }
    }
    if !line.trim().is_empty() {
        out.push_str(line.trim_end());
    }
    Some(out.trim_end().to_string())
}

struct Cal;

impl Command for Cal {
    fn name(&self) -> &str {
        "cal"
    }

    fn description(&self) -> &str {
        "Show a month calendar"
    }

    fn usage(&self) -> &str {
        "cal [month year]"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let (year, month) = match args {
            [] => {
                let today = Utc::now().date_naive();
                (today.year(), today.month())
            },
            [m, y] => {
                let month = m
                    .parse()
                    .ok()
                    .filter(|&m| (1..=12).contains(&m))
                    .ok_or_else(|| usage_err(format!("cal: invalid month: '{m}'")))?;
                let year = y
                    .parse()
                    .map_err(|_| usage_err(format!("cal: invalid year: '{y}'")))?;
                (year, month)
            },
            _ => return Err(usage_err("cal: usage: cal [month year]")),
        };
        month_calendar(year, month)
            .map(ShellOutput::Text)
            .ok_or_else(|| usage_err("cal: date out of range".to_string()))
    }
}

struct Sleep;

impl Command for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    fn description(&self) -> &str {
        "Pretend to sleep for a few seconds"
    }

    fn usage(&self) -> &str {
        "sleep <seconds>"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let [secs] = args else {
            return Err(usage_err("sleep: usage: sleep <seconds>"));
        };
        let n: u64 = secs
            .parse()
            .map_err(|_| usage_err(format!("sleep: invalid time interval: '{secs}'")))?;
        if n > SLEEP_LIMIT {
            return Err(usage_err(format!(
                "sleep: duration must be between 0 and {SLEEP_LIMIT} seconds"
            )));
        }
        // The pause is simulated; blocking a shared event loop for real
        // would stall every other session.
        Ok(ShellOutput::Text(format!("slept for {n} seconds")))
    }
}

// ---------------------------------------------------------------------------
// seq / factor / yes
// ---------------------------------------------------------------------------

struct Seq;

impl Command for Seq {
    fn name(&self) -> &str {
        "seq"
    }

    fn description(&self) -> &str {
        "Print a sequence of numbers"
    }

    fn usage(&self) -> &str {
        "seq [first] <last>"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let parse = |s: &str| -> Result<i64> {
            s.parse()
                .map_err(|_| usage_err(format!("seq: invalid number: '{s}'")))
        };
        let (first, last) = match args {
            [last] => (1, parse(last)?),
            [first, last] => (parse(first)?, parse(last)?),
            _ => return Err(usage_err("seq: usage: seq [first] <last>")),
        };
        if last < first {
            return Ok(ShellOutput::text(""));
        }
        // checked_sub: the span itself can overflow i64 for extreme bounds.
        let fits = last.checked_sub(first).is_some_and(|span| span < SEQ_LIMIT);
        if !fits {
            return Err(usage_err(format!("seq: range too large (max {SEQ_LIMIT} numbers)")));
        }
        let lines: Vec<String> = (first..=last).map(|n| n.to_string()).collect();
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut d = 2;
    while d * d <= n {
        while n % d == 0 {
            factors.push(d);
            n /= d;
        }
        d += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

struct Factor;

impl Command for Factor {
    fn name(&self) -> &str {
        "factor"
    }

    fn description(&self) -> &str {
        "Print the prime factors of each number"
    }

    fn usage(&self) -> &str {
        "factor <number>..."
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        if args.is_empty() {
            return Err(usage_err("factor: usage: factor <number>..."));
        }
        let mut lines = Vec::with_capacity(args.len());
        for &arg in args {
            let n: u64 = arg
                .parse()
                .map_err(|_| usage_err(format!("factor: '{arg}' is not a valid positive integer")))?;
            if n > FACTOR_LIMIT {
                return Err(usage_err(format!("factor: '{arg}' is too large")));
            }
            let factors: Vec<String> =
                prime_factors(n).iter().map(|f| f.to_string()).collect();
            lines.push(format!("{n}: {}", factors.join(" ")));
        }
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

struct Yes;

impl Command for Yes {
    fn name(&self) -> &str {
        "yes"
    }

    fn description(&self) -> &str {
        "Repeat a string (bounded)"
    }

    fn usage(&self) -> &str {
        "yes [text]"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let text = if args.is_empty() {
            "y".to_string()
        } else {
            args.join(" ")
        };
        Ok(ShellOutput::Text(vec![text; YES_LIMIT].join("\n")))
    }
}

// ---------------------------------------------------------------------------
// basename / dirname / echo
// ---------------------------------------------------------------------------

struct Basename;

impl Command for Basename {
    fn name(&self) -> &str {
        "basename"
    }

    fn description(&self) -> &str {
        "Strip the directory part of a path"
    }

    fn usage(&self) -> &str {
        "basename <path>"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("basename: usage: basename <path>"));
        };
        Ok(ShellOutput::text(tangelo_vfs::basename(path)))
    }
}

struct Dirname;

impl Command for Dirname {
    fn name(&self) -> &str {
        "dirname"
    }

    fn description(&self) -> &str {
        "Strip the final component of a path"
    }

    fn usage(&self) -> &str {
        "dirname <path>"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("dirname: usage: dirname <path>"));
        };
        let dir = tangelo_vfs::dirname(path);
        Ok(ShellOutput::text(if dir.is_empty() { "." } else { dir }))
    }
}

struct Echo;

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Print its arguments"
    }

    fn usage(&self) -> &str {
        "echo [text]..."
    }

    fn category(&self) -> &str {
        "system"
    }

    fn execute(&self, args: &[&str], _fs: &mut FileSystem) -> Result<ShellOutput> {
        Ok(ShellOutput::Text(args.join(" ")))
    }
}

/// Install the simulated system command set.
pub fn register_system_commands(reg: &mut ShellRegistry) {
    reg.register(Box::new(Ps));
    reg.register(Box::new(Kill));
    reg.register(Box::new(Ping));
    reg.register(Box::new(Uptime));
    reg.register(Box::new(Whoami));
    reg.register(Box::new(Who));
    reg.register(Box::new(Id));
    reg.register(Box::new(Hostname));
    reg.register(Box::new(Date));
    reg.register(Box::new(Cal));
    reg.register(Box::new(Sleep));
    reg.register(Box::new(Seq));
    reg.register(Box::new(Factor));
    reg.register(Box::new(Yes));
    reg.register(Box::new(Basename));
    reg.register(Box::new(Dirname));
    reg.register(Box::new(Echo));
}

#[cfg(test)]
mod tests {
    use super::{month_calendar, prime_factors};
    use crate::builtin_registry;
    use crate::interpreter::ShellOutput;
    use tangelo_vfs::FileSystem;

    fn exec(fs: &mut FileSystem, line: &str) -> String {
        match builtin_registry().execute(line, fs) {
            ShellOutput::Text(t) => t,
            ShellOutput::Download { filename, .. } => panic!("unexpected download: {filename}"),
        }
    }

    #[test]
    fn echo_joins_arguments() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "echo hi"), "hi");
        assert_eq!(exec(&mut fs, "echo one two  three"), "one two three");
        assert_eq!(exec(&mut fs, "echo"), "");
    }

    #[test]
    fn factor_decomposes() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "factor 28"), "28: 2 2 7");
        assert_eq!(exec(&mut fs, "factor 13"), "13: 13");
        assert_eq!(exec(&mut fs, "factor 12 9"), "12: 2 2 3\n9: 3 3");
        assert_eq!(
            exec(&mut fs, "factor banana"),
            "factor: 'banana' is not a valid positive integer"
        );
        assert_eq!(
            exec(&mut fs, "factor 99999999999999999"),
            "factor: '99999999999999999' is too large"
        );
    }

    #[test]
    fn prime_factors_edge_values() {
        assert!(prime_factors(0).is_empty());
        assert!(prime_factors(1).is_empty());
        assert_eq!(prime_factors(2), vec![2]);
        assert_eq!(prime_factors(360), vec![2, 2, 2, 3, 3, 5]);
    }

    #[test]
    fn ps_and_kill() {
        let mut fs = FileSystem::new();
        let out = exec(&mut fs, "ps");
        assert!(out.starts_with("  PID CMD"));
        assert!(out.contains("init"));
        assert_eq!(exec(&mut fs, "kill 42"), "");
        assert!(!exec(&mut fs, "ps").contains("sshd"));
        assert_eq!(exec(&mut fs, "kill 42"), "kill: (42) - No such process");
        assert_eq!(exec(&mut fs, "kill 1"), "kill: (1) - Operation not permitted");
        assert_eq!(exec(&mut fs, "kill abc"), "kill: invalid pid: 'abc'");
    }

    #[test]
    fn ping_is_fake_but_shaped_right() {
        let mut fs = FileSystem::new();
        let out = exec(&mut fs, "ping example.com");
        assert!(out.starts_with("PING example.com"));
        assert_eq!(out.matches("icmp_seq=").count(), 4);
        assert!(out.ends_with("0% packet loss"));
    }

    #[test]
    fn identity_commands() {
        let mut fs = FileSystem::for_user("alice");
        assert_eq!(exec(&mut fs, "whoami"), "alice");
        assert!(exec(&mut fs, "id").contains("uid=1000(alice)"));
        assert!(exec(&mut fs, "who").contains("alice"));
    }

    #[test]
    fn hostname_get_and_set() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "hostname"), "tangelo");
        exec(&mut fs, "hostname box1");
        assert_eq!(exec(&mut fs, "hostname"), "box1");
    }

    #[test]
    fn uptime_shape() {
        let mut fs = FileSystem::new();
        let out = exec(&mut fs, "uptime");
        assert!(out.contains("up 00:00:"));
        assert!(out.ends_with("load average: 0.00, 0.01, 0.05"));
    }

    #[test]
    fn sleep_bounds() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "sleep 3"), "slept for 3 seconds");
        assert_eq!(exec(&mut fs, "sleep 0"), "slept for 0 seconds");
        assert_eq!(
            exec(&mut fs, "sleep 11"),
            "sleep: duration must be between 0 and 10 seconds"
        );
        assert_eq!(
            exec(&mut fs, "sleep soon"),
            "sleep: invalid time interval: 'soon'"
        );
    }

    #[test]
    fn seq_ranges() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "seq 3"), "1\n2\n3");
        assert_eq!(exec(&mut fs, "seq 5 7"), "5\n6\n7");
        assert_eq!(exec(&mut fs, "seq 7 5"), "");
        assert_eq!(
            exec(&mut fs, "seq 1 5000"),
            "seq: range too large (max 1000 numbers)"
        );
    }

    #[test]
    fn seq_extreme_bounds_are_rejected() {
        // The span between the bounds does not fit in i64.
        let mut fs = FileSystem::new();
        assert_eq!(
            exec(&mut fs, "seq -9223372036854775808 9223372036854775807"),
            "seq: range too large (max 1000 numbers)"
        );
    }

    #[test]
    fn yes_is_bounded() {
        let mut fs = FileSystem::new();
        let out = exec(&mut fs, "yes");
        assert_eq!(out.lines().count(), 20);
        assert!(out.lines().all(|l| l == "y"));
        let out = exec(&mut fs, "yes sure thing");
        assert!(out.lines().all(|l| l == "sure thing"));
    }

    #[test]
    fn path_helpers() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "basename /a/b/c.txt"), "c.txt");
        assert_eq!(exec(&mut fs, "dirname /a/b/c.txt"), "/a/b");
        assert_eq!(exec(&mut fs, "dirname c.txt"), ".");
    }

    #[test]
    fn calendar_layout() {
        // August 2026 starts on a Saturday and has 31 days.
        let cal = month_calendar(2026, 8).unwrap();
        let lines: Vec<&str> = cal.lines().collect();
        assert_eq!(lines[0].trim(), "August 2026");
        assert_eq!(lines[1], "Su Mo Tu We Th Fr Sa");
        assert!(lines[2].ends_with(" 1"));
        assert!(cal.contains("30 31"));
    }

    #[test]
    fn calendar_february_leap() {
        let cal = month_calendar(2024, 2).unwrap();
        assert!(cal.contains("29"));
        assert!(!cal.contains("30"));
        let cal = month_calendar(2023, 2).unwrap();
        assert!(!cal.contains("29"));
    }

    #[test]
    fn date_shape() {
        let mut fs = FileSystem::new();
        let out = exec(&mut fs, "date");
        assert!(out.contains("UTC"));
    }
}
