//! Shell completions command

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;

pub fn run(shell: Shell) -> Result<()> {
    write_completions(shell, &mut io::stdout())
}

fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_mention_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("cmatch"));
        assert!(script.contains("lookup"));
        assert!(script.contains("normalize"));
    }
}
