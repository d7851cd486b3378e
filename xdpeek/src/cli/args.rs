//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "xdpeek",
    version,
    about = "Print a live trace of IPv4 packets arriving on a network interface",
    after_help = "\
EXAMPLES:
    sudo xdpeek                              Trace eth0
    sudo xdpeek --iface lo --payload         Trace loopback, show payload text
    sudo xdpeek --object ./xdpeek.o          Use an explicit eBPF object"
)]
pub struct Args {
    /// Network interface to attach to
    #[arg(short, long, default_value = "eth0")]
    pub iface: String,

    /// Capture up to 128 payload bytes and print them as text
    #[arg(long)]
    pub payload: bool,

    /// Path to the compiled eBPF object (defaults to the xtask build output)
    #[arg(long, value_name = "PATH")]
    pub object: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["xdpeek"]).unwrap();
        assert_eq!(args.iface, "eth0");
        assert!(!args.payload);
        assert!(args.object.is_none());
        assert!(!args.quiet);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "xdpeek", "--iface", "lo", "--payload", "--object", "/tmp/x.o", "-q",
        ])
        .unwrap();
        assert_eq!(args.iface, "lo");
        assert!(args.payload);
        assert_eq!(args.object, Some(PathBuf::from("/tmp/x.o")));
        assert!(args.quiet);
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = Args::try_parse_from(["xdpeek", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
