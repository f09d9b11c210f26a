//! Built-in command handlers
//!
//! All output is synthetic. Figures that also appear in the banner
//! (hostname, OS, kernel, usage percentages) come from the same
//! identity and profile so the session stays self-consistent.

use super::{CommandContext, Invocation, Outcome};
use crate::types::OutputLine;

const HOME_DIR: &str = "/root";
const BAR_WIDTH: usize = 20;

pub(super) fn ls(inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    if !inv.has_flag('l') {
        return Outcome::line(OutputLine::data(
            "app  backups  logs  scripts  config.yaml  docker-compose.yml",
        ));
    }

    let user = ctx.identity.username.as_str();
    let entries: [(&str, u32, u32, &str, &str); 11] = [
        ("drwx------", 6, 4096, "Jan 15 10:30", "."),
        ("drwxr-xr-x", 19, 4096, "Jan 10 08:12", ".."),
        ("-rw-------", 1, 1024, "Jan 15 10:29", ".bash_history"),
        ("-rw-r--r--", 1, 3106, "Oct 15  2021", ".bashrc"),
        ("drwx------", 2, 4096, "Jan 10 08:15", ".ssh"),
        ("drwxr-xr-x", 4, 4096, "Jan 14 16:42", "app"),
        ("drwxr-xr-x", 2, 4096, "Jan 12 09:03", "backups"),
        ("drwxr-xr-x", 2, 4096, "Jan 15 10:30", "logs"),
        ("drwxr-xr-x", 2, 4096, "Jan 11 14:20", "scripts"),
        ("-rw-r--r--", 1, 512, "Jan 13 11:05", "config.yaml"),
        ("-rw-r--r--", 1, 845, "Jan 13 11:07", "docker-compose.yml"),
    ];

    let mut lines = vec![OutputLine::data("total 48")];
    lines.extend(entries.iter().map(|(mode, links, size, date, name)| {
        OutputLine::data(format!(
            "{} {:>2} {} {} {:>5} {} {}",
            mode, links, user, user, size, date, name
        ))
    }));
    Outcome::lines(lines)
}

pub(super) fn pwd(_inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    Outcome::line(OutputLine::data(HOME_DIR))
}

pub(super) fn whoami(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    Outcome::line(OutputLine::data(ctx.identity.username.clone()))
}

pub(super) fn clear(_inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    Outcome::clear()
}

pub(super) fn date(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    Outcome::line(OutputLine::data(
        ctx.now.format("%a %b %e %H:%M:%S %Y").to_string(),
    ))
}

pub(super) fn uname(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    Outcome::line(OutputLine::data(ctx.profile.uname()))
}

pub(super) fn htop(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    let metrics = ctx.identity.metrics();
    let profile = ctx.profile;
    let user = ctx.identity.username.as_str();
    let mem_used_mb = used_of(profile.memory_mb(), metrics.memory_percent);

    let mut lines: Vec<OutputLine> = (0..profile.cpu_cores)
        .map(|core| {
            OutputLine::data(format!(
                "  {:>2}[{}{:>6.1}%]",
                core,
                bar(metrics.cpu_percent),
                metrics.cpu_percent
            ))
        })
        .collect();
    lines.push(OutputLine::data(format!(
        "  Mem[{}{}M/{}M]",
        bar(metrics.memory_percent),
        mem_used_mb,
        profile.memory_mb()
    )));
    lines.push(OutputLine::data(format!("  Swp[{}0K/0K]", bar(0.0))));
    lines.push(OutputLine::data(format!(
        "  Tasks: 42, 87 thr; 1 running   Uptime: {} hours",
        metrics.uptime_hours
    )));
    lines.push(OutputLine::blank());
    lines.push(OutputLine::info(
        "    PID USER       PRI  NI  VIRT   RES   SHR S CPU% MEM%   TIME+  Command",
    ));
    let procs: [(u32, &str, &str, &str, &str, char, &str); 5] = [
        (1, "root", "164M", "11M", "8196", 'S', "/sbin/init"),
        (412, "root", "15M", "9012", "7680", 'S', "sshd: /usr/sbin/sshd -D"),
        (587, "root", "1.2G", "44M", "30M", 'S', "/usr/bin/dockerd"),
        (1337, user, "8976", "5120", "3412", 'S', "-bash"),
        (1402, user, "9812", "4096", "3200", 'R', "htop"),
    ];
    lines.extend(procs.iter().map(|(pid, owner, virt, res, shr, state, cmd)| {
        OutputLine::data(format!(
            "  {:>5} {:<10} 20   0 {:>5} {:>5} {:>5} {}  0.0  0.3  0:00.42 {}",
            pid, owner, virt, res, shr, state, cmd
        ))
    }));
    Outcome::lines(lines)
}

pub(super) fn ps(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    let user = ctx.identity.username.as_str();
    let rows: [(&str, u32, &str, &str, u32, u32, &str, &str, &str, &str, &str); 7] = [
        ("root", 1, "0.0", "0.3", 167744, 11264, "?", "Ss", "08:12", "0:02", "/sbin/init"),
        ("root", 412, "0.0", "0.2", 15420, 9012, "?", "Ss", "08:12", "0:00", "sshd: /usr/sbin/sshd -D"),
        ("root", 587, "0.1", "1.1", 1245692, 45312, "?", "Ssl", "08:12", "0:15", "/usr/bin/dockerd"),
        ("root", 901, "0.0", "0.5", 55228, 20480, "?", "Ss", "08:13", "0:01", "nginx: master process /usr/sbin/nginx"),
        ("www-data", 902, "0.0", "0.3", 55760, 12800, "?", "S", "08:13", "0:00", "nginx: worker process"),
        (user, 1337, "0.0", "0.1", 8976, 5120, "pts/0", "Ss", "10:30", "0:00", "-bash"),
        (user, 1402, "0.0", "0.0", 10072, 3328, "pts/0", "R+", "10:31", "0:00", "ps aux"),
    ];

    let mut lines = vec![OutputLine::info(
        "USER         PID %CPU %MEM     VSZ    RSS TTY      STAT START   TIME COMMAND",
    )];
    lines.extend(rows.iter().map(
        |(owner, pid, cpu, mem, vsz, rss, tty, stat, start, time, cmd)| {
            OutputLine::data(format!(
                "{:<10} {:>5} {:>4} {:>4} {:>7} {:>6} {:<8} {:<4} {:<5} {:>6} {}",
                owner, pid, cpu, mem, vsz, rss, tty, stat, start, time, cmd
            ))
        },
    ));
    Outcome::lines(lines)
}

pub(super) fn df(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    let profile = ctx.profile;
    let disk_percent = ctx.identity.disk_usage_percent;
    let total = f64::from(profile.disk_gb);
    let used = total * disk_percent.clamp(0.0, 100.0) / 100.0;
    let shm = f64::from(profile.memory_gb) / 2.0;

    Outcome::lines(vec![
        OutputLine::info("Filesystem      Size  Used Avail Use% Mounted on"),
        OutputLine::data(format!(
            "/dev/sda1       {:>4} {:>5} {:>5} {:>3.0}% /",
            format!("{}G", profile.disk_gb),
            format!("{:.1}G", used),
            format!("{:.1}G", total - used),
            disk_percent
        )),
        OutputLine::data(format!(
            "tmpfs           {:>4} {:>5} {:>5}   0% /dev/shm",
            format!("{:.1}G", shm),
            "0",
            format!("{:.1}G", shm)
        )),
        OutputLine::data("tmpfs           5.0M     0  5.0M   0% /run/lock"),
        OutputLine::data("/dev/sda15      105M  6.1M   99M   6% /boot/efi"),
    ])
}

pub(super) fn free(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    let total = ctx.profile.memory_mb();
    let used = used_of(total, ctx.identity.memory_usage_percent);
    let buff_cache = (total / 10).min(total - used);
    let free = total - used - buff_cache;

    Outcome::lines(vec![
        OutputLine::info(
            "               total        used        free      shared  buff/cache   available",
        ),
        OutputLine::data(format!(
            "Mem:     {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}",
            total,
            used,
            free,
            12,
            buff_cache,
            free + buff_cache
        )),
        OutputLine::data(format!(
            "Swap:    {:>11} {:>11} {:>11}",
            0, 0, 0
        )),
    ])
}

pub(super) fn cat(inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    match inv.first_arg() {
        Some("/etc/os-release") => os_release(ctx),
        Some(file) => Outcome::line(OutputLine::error(format!(
            "cat: {}: No such file or directory",
            file
        ))),
        None => Outcome::line(OutputLine::error("cat: missing file operand")),
    }
}

fn os_release(ctx: &CommandContext<'_>) -> Outcome {
    let profile = ctx.profile;
    let home_url = match profile.os_id() {
        "debian" => "https://www.debian.org/",
        _ => "https://www.ubuntu.com/",
    };
    Outcome::lines(vec![
        OutputLine::data(format!("PRETTY_NAME=\"{}\"", profile.pretty_name())),
        OutputLine::data(format!("NAME=\"{}\"", profile.os_name)),
        OutputLine::data(format!("VERSION_ID=\"{}\"", profile.version_id())),
        OutputLine::data(format!("VERSION=\"{}\"", profile.os_version)),
        OutputLine::data(format!("VERSION_CODENAME={}", profile.codename)),
        OutputLine::data(format!("ID={}", profile.os_id())),
        OutputLine::data(format!("HOME_URL=\"{}\"", home_url)),
    ])
}

pub(super) fn mkdir(inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    match inv.first_arg() {
        Some(dir) => Outcome::line(OutputLine::success(format!(
            "Directory '{}' created",
            dir
        ))),
        None => Outcome::line(OutputLine::error("mkdir: missing operand")),
    }
}

pub(super) fn touch(inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    match inv.first_arg() {
        Some(file) => Outcome::line(OutputLine::success(format!("File '{}' created", file))),
        None => Outcome::line(OutputLine::error("touch: missing file operand")),
    }
}

pub(super) fn echo(inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    Outcome::line(OutputLine::data(inv.rest))
}

pub(super) fn history(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    Outcome::lines(
        ctx.history
            .iter()
            .enumerate()
            .map(|(i, entry)| OutputLine::data(format!("{:>5}  {}", i + 1, entry)))
            .collect(),
    )
}

pub(super) fn cd(inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    let target = inv.first_arg().unwrap_or("~");
    Outcome::line(OutputLine::info(format!("Changed directory to {}", target)))
}

pub(super) fn exit(_inv: &Invocation<'_>, ctx: &CommandContext<'_>) -> Outcome {
    Outcome::terminate_with(vec![
        OutputLine::info("logout"),
        OutputLine::info(format!("Connection to {} closed.", ctx.identity.host)),
    ])
}

pub(super) fn not_found(inv: &Invocation<'_>, _ctx: &CommandContext<'_>) -> Outcome {
    Outcome::line(OutputLine::error(format!(
        "bash: {}: command not found",
        inv.verb
    )))
}

/// `[|||||     ]` meter, `BAR_WIDTH` cells wide
fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "|".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

fn used_of(total: u64, percent: f64) -> u64 {
    ((total as f64) * percent.clamp(0.0, 100.0) / 100.0).round() as u64
}
