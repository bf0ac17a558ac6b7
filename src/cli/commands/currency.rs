use rust_decimal::Decimal;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::currency::{format_number, RATE_FRACTION_DIGITS};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "rate",
            "Show or set the exchange rate",
            "rate [new-rate]",
            cmd_rate,
        ),
        CommandEntry::new(
            "convert",
            "Convert a home-currency amount",
            "convert <amount>",
            cmd_convert,
        ),
    ]
}

fn cmd_rate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (from, to) = context.rates.pair();
    let locale = context.number_locale();
    let quote = |rate: Decimal| {
        format!(
            "1 {} = {} {}",
            from.as_str(),
            format_number(&locale, rate, RATE_FRACTION_DIGITS),
            to.as_str()
        )
    };
    match args {
        [] => {
            io::print_info(quote(context.rates.rate()));
            Ok(())
        }
        [raw] => {
            let rate = context.rates.set_rate(raw)?;
            io::print_success(format!("Saved rate: {}", quote(rate)));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments("usage: rate [new-rate]".into())),
    }
}

fn cmd_convert(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: convert <amount>".into(),
        ));
    }
    let conversion = context.rates.convert_input(&args.join(""))?;
    io::print_info(conversion.display_in(&context.number_locale()));
    Ok(())
}
