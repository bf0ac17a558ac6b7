use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::config::Config;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "config",
            "Show or change settings",
            "config [key [value]]",
            cmd_config,
        ),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            output_section("Configuration");
            for key in Config::KEYS {
                io::print_info(format!("  {:<17}{}", key, context.config.get(key)?));
            }
            io::print_hint("Currency and rate changes apply on next start.");
            Ok(())
        }
        [key] => {
            io::print_info(context.config.get(key)?);
            Ok(())
        }
        [key, value] => {
            context.config.set(key, value)?;
            context.persist_config()?;
            if *key == "color" {
                crate::cli::output::set_color(context.config.color);
            }
            io::print_success(format!("Set {} = {}", key, context.config.get(key)?));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: config [key [value]]".into(),
        )),
    }
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output_section(format!("trip_ledger {}", meta.version));
    io::print_info(format!(
        "  Build hash : {} ({})",
        meta.git_hash, meta.git_status
    ));
    io::print_info(format!("  Built at   : {}", meta.timestamp));
    io::print_info(format!("  Target     : {}", meta.target));
    io::print_info(format!("  Profile    : {}", meta.profile));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
