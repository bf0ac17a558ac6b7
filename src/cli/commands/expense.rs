use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::errors::LedgerError;
use crate::ledger::{parse_amount, parse_date, NewExpense, RecordId};
use crate::report::{render_daily_summary, render_detail_table};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            "Record an expense",
            "add <amount> <category> [description...] [--date YYYY-MM-DD]",
            cmd_add,
        ),
        CommandEntry::new("list", "Show expenses, newest first", "list", cmd_list)
            .with_aliases(&["ls"]),
        CommandEntry::new(
            "summary",
            "Show daily totals by category",
            "summary",
            cmd_summary,
        ),
        CommandEntry::new(
            "delete",
            "Delete an expense by list row or id",
            "delete <row|id>",
            cmd_delete,
        )
        .with_aliases(&["rm"]),
        CommandEntry::new(
            "clear",
            "Delete every expense",
            "clear [--yes]",
            cmd_clear,
        ),
    ]
}

#[derive(Debug, PartialEq, Eq)]
struct AddArgs<'a> {
    amount: &'a str,
    category: &'a str,
    description: String,
    date: Option<&'a str>,
}

fn parse_add_args<'a>(args: &[&'a str]) -> Result<AddArgs<'a>, CommandError> {
    let mut positional = Vec::new();
    let mut date = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == "--date" {
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments("`--date` needs a YYYY-MM-DD value".into())
            })?;
            date = Some(*value);
        } else if let Some(value) = arg.strip_prefix("--date=") {
            date = Some(value);
        } else {
            positional.push(*arg);
        }
    }

    match positional.as_slice() {
        [amount, category, rest @ ..] => Ok(AddArgs {
            amount: *amount,
            category: *category,
            description: rest.join(" "),
            date,
        }),
        _ => Err(CommandError::InvalidArguments(
            "usage: add <amount> <category> [description...] [--date YYYY-MM-DD]".into(),
        )),
    }
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_add_args(args)?;
    let mut draft = NewExpense::new(parse_amount(parsed.amount)?, parsed.category);
    if let Some(date) = parsed.date {
        draft = draft.on(parse_date(date)?);
    }
    if !parsed.description.trim().is_empty() {
        draft = draft.described(parsed.description);
    }

    let id = context.ledger.add(draft)?;
    if let Some(record) = context.ledger.get(id) {
        io::print_success(format!(
            "Added {} {} on {} [{}]",
            context.money(record.amount),
            record.category,
            record.date,
            id.short()
        ));
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let rows = context.ledger.view().rows;
    let rendered = render_detail_table(&rows, &context.home_currency(), context.report_options());
    io::print_info(rendered);
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Daily summary");
    let summary = context.ledger.compute_summary();
    io::print_info(render_daily_summary(
        &summary,
        &context.home_currency(),
        context.report_options(),
    ));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [target] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: delete <row|id>".into(),
        ));
    };

    let removed = match target.parse::<usize>() {
        Ok(0) => {
            return Err(CommandError::InvalidArguments(
                "rows are numbered from 1".into(),
            ))
        }
        Ok(row) if target.len() < MIN_ID_PREFIX || row <= context.ledger.len() => {
            context.ledger.delete_at(row - 1)?
        }
        _ => {
            let id = resolve_id(context, target)?;
            context.ledger.delete(id)?
        }
    };

    io::print_success(format!(
        "Deleted {} {} on {}",
        context.money(removed.amount),
        removed.category,
        removed.date
    ));
    Ok(())
}

/// Shortest id prefix accepted by `delete`; shorter numbers are row numbers.
const MIN_ID_PREFIX: usize = 4;

/// Accepts a full id or an unambiguous prefix of one.
fn resolve_id(context: &ShellContext, raw: &str) -> Result<RecordId, CommandError> {
    if let Ok(id) = RecordId::parse(raw) {
        return Ok(id);
    }
    let needle = raw.trim().to_ascii_lowercase().replace('-', "");
    if needle.len() < MIN_ID_PREFIX {
        return Err(LedgerError::NotFound(raw.to_string()).into());
    }
    let matches: Vec<RecordId> = context
        .ledger
        .records()
        .iter()
        .map(|record| record.id)
        .filter(|id| id.to_string().replace('-', "").starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(LedgerError::NotFound(raw.to_string()).into()),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{}` matches {} expenses; use more characters",
            raw,
            matches.len()
        ))),
    }
}

fn cmd_clear(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if context.ledger.is_empty() {
        io::print_info("Nothing to clear.");
        return Ok(());
    }
    let forced = args.iter().any(|arg| matches!(*arg, "--yes" | "-y"));
    if !forced {
        if context.mode() == CliMode::Script {
            return Err(CommandError::InvalidArguments(
                "`clear` needs `--yes` in script mode".into(),
            ));
        }
        let prompt = format!("Delete all {} expenses?", context.ledger.len());
        if !context.confirm(&prompt)? {
            io::print_info("Clear cancelled.");
            return Ok(());
        }
    }

    let removed = context.ledger.clear()?;
    io::print_success(format!("Cleared {} expenses.", removed));
    Ok(())
}
