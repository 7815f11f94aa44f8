//! Translation of the `key=value` / bare-word invocation style into `pull` flags.

use std::ffi::OsString;

const SUBCOMMANDS: &[&str] = &["pull", "locate", "classify", "help"];

fn translate(token: &str) -> Option<Vec<String>> {
    let flag = |name: &str, value: &str| Some(vec![name.to_string(), value.to_string()]);
    if let Some((key, value)) = token.split_once('=') {
        return match key {
            "distro" => flag("--distro", value),
            "config" => flag("--config", value),
            "pkg" => flag("--pkg", value),
            "out" => flag("--output-dir", value),
            _ => None,
        };
    }
    // Downloads never ask for confirmation, so `prompt` is accepted and dropped.
    if token == "prompt" {
        return Some(Vec::new());
    }
    let single = match token {
        "all" => "--all",
        "amd" => "--dump-amd",
        "other" => "--dump-other",
        "verbose" => "--verbose",
        _ => return None,
    };
    Some(vec![single.to_string()])
}

/// Rewrites `pkgpuller distro=ub24 amd` into `pkgpuller pull --distro ub24 --dump-amd`.
///
/// Only applies when the first argument is a legacy token; anything else is passed through
/// unchanged so clap reports it. A leading bare `help` maps to `pull --help`.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() < 2 {
        return args;
    }

    let first = args[1].to_string_lossy().into_owned();
    if first == "help" && args.len() == 2 {
        return vec![args.remove(0), "pull".into(), "--help".into()];
    }
    if SUBCOMMANDS.contains(&first.as_str()) || translate(&first).is_none() {
        return args;
    }

    let mut normalized = Vec::with_capacity(args.len() + 4);
    let mut rest = args.into_iter();
    normalized.extend(rest.next());
    normalized.push(OsString::from("pull"));
    for arg in rest {
        match arg.to_str().and_then(translate) {
            Some(translated) => normalized.extend(translated.into_iter().map(OsString::from)),
            None if arg == "help" => normalized.push(OsString::from("--help")),
            None => normalized.push(arg),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(args: &[&str]) -> Vec<String> {
        normalize_legacy_args(args.iter().copied())
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_translates_legacy_tokens() {
        assert_eq!(
            normalize(&["pkgpuller", "all", "out=/srv/pkgs", "amd"]),
            vec!["pkgpuller", "pull", "--all", "--output-dir", "/srv/pkgs", "--dump-amd"]
        );
    }

    #[test]
    fn test_prompt_is_accepted_and_dropped() {
        assert_eq!(
            normalize(&["pkgpuller", "distro=ub24", "prompt", "amd"]),
            vec!["pkgpuller", "pull", "--distro", "ub24", "--dump-amd"]
        );
    }

    #[test]
    fn test_leaves_subcommands_alone() {
        let args = ["pkgpuller", "pull", "--distro", "ub24"];
        assert_eq!(normalize(&args), args.to_vec());

        let args = ["pkgpuller", "-v", "locate", "-d", "el9"];
        assert_eq!(normalize(&args), args.to_vec());
    }

    #[test]
    fn test_bare_help() {
        assert_eq!(
            normalize(&["pkgpuller", "help"]),
            vec!["pkgpuller", "pull", "--help"]
        );
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        assert_eq!(
            normalize(&["pkgpuller", "distro=el10", "frobnicate"]),
            vec!["pkgpuller", "pull", "--distro", "el10", "frobnicate"]
        );
        assert_eq!(normalize(&["pkgpuller", "flavor=x"]), vec!["pkgpuller", "flavor=x"]);
    }
}
