use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Everything the normalizer knows about one head command: its curated
/// subcommands, the flags it preserves verbatim, and the flags whose
/// argument is a free-text message (`<msg>`, §4.1).
pub struct HeadSpec {
    pub subcommands: &'static [&'static str],
    pub known_flags: &'static [&'static str],
    pub message_flags: &'static [&'static str],
}

/// Curated head-token table (§4.1). Small and closed by design: an
/// unrecognized head command still normalizes (every other token not
/// matching a slot pattern becomes `<arg>`), it just doesn't get
/// subcommand-aware flag handling.
pub static HEAD_TABLE: Lazy<HashMap<&'static str, HeadSpec>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "git",
        HeadSpec {
            subcommands: &[
                "status", "add", "commit", "push", "pull", "fetch", "checkout", "branch",
                "merge", "rebase", "log", "diff", "stash", "clone", "reset", "tag", "remote",
                "init", "cherry-pick", "show", "restore", "switch",
            ],
            known_flags: &["-a", "-m", "-am", "--force", "-f", "--all", "-u", "--set-upstream"],
            message_flags: &["-m", "--message"],
        },
    );
    m.insert(
        "npm",
        HeadSpec {
            subcommands: &["install", "run", "test", "start", "build", "ci", "publish", "update"],
            known_flags: &["--save", "--save-dev", "-D", "-g", "--global"],
            message_flags: &[],
        },
    );
    m.insert(
        "pnpm",
        HeadSpec {
            subcommands: &["install", "run", "test", "build", "add", "remove", "update"],
            known_flags: &["-D", "-g", "--filter"],
            message_flags: &[],
        },
    );
    m.insert(
        "yarn",
        HeadSpec {
            subcommands: &["install", "add", "remove", "run", "build", "test", "start"],
            known_flags: &["-D", "--dev"],
            message_flags: &[],
        },
    );
    m.insert(
        "go",
        HeadSpec {
            subcommands: &["build", "test", "run", "vet", "fmt", "mod", "get", "install"],
            known_flags: &["-v", "-race", "-run"],
            message_flags: &[],
        },
    );
    m.insert(
        "pip",
        HeadSpec {
            subcommands: &["install", "uninstall", "freeze", "list", "show"],
            known_flags: &["-r", "--upgrade", "-U", "-e"],
            message_flags: &[],
        },
    );
    m.insert(
        "pytest",
        HeadSpec {
            subcommands: &[],
            known_flags: &["-v", "-x", "-k", "--lf", "--ff", "-s"],
            message_flags: &[],
        },
    );
    m.insert(
        "docker",
        HeadSpec {
            subcommands: &[
                "build", "run", "ps", "exec", "logs", "compose", "pull", "push", "stop", "rm",
                "images",
            ],
            known_flags: &["-it", "-d", "--rm", "-v", "-p", "--name"],
            message_flags: &[],
        },
    );
    m.insert(
        "make",
        HeadSpec {
            subcommands: &[],
            known_flags: &["-j", "-k", "-n"],
            message_flags: &[],
        },
    );
    m.insert(
        "cargo",
        HeadSpec {
            subcommands: &[
                "build", "run", "test", "check", "clippy", "fmt", "add", "publish", "install",
                "bench", "doc",
            ],
            known_flags: &["--release", "-v", "--all-features", "-p"],
            message_flags: &[],
        },
    );
    m.insert(
        "brew",
        HeadSpec {
            subcommands: &["install", "uninstall", "update", "upgrade", "list", "search"],
            known_flags: &["--cask", "-v"],
            message_flags: &[],
        },
    );
    m.insert(
        "apt",
        HeadSpec {
            subcommands: &["install", "remove", "update", "upgrade", "search", "list"],
            known_flags: &["-y", "--fix-broken"],
            message_flags: &[],
        },
    );
    m
});

/// All message-bearing flags across every head, flattened for quick
/// lookup when the head itself isn't known yet.
pub static ALL_MESSAGE_FLAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HEAD_TABLE
        .values()
        .flat_map(|spec| spec.message_flags.iter().copied())
        .collect()
});

pub fn lookup(head: &str) -> Option<&'static HeadSpec> {
    HEAD_TABLE.get(head)
}
