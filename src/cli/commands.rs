//! Command handlers and the default registry.

use recur_core::{Execution, SweepOutcome, SweepReport, TemplateRequest};
use recur_domain::{Displayable, RecurringTemplate};
use rust_decimal::Decimal;

use crate::cli::{
    args::{parse_amount, parse_date, parse_flow, parse_period, parse_uuid, ParsedArgs},
    context::{CliContext, CommandError, CommandResult},
    output,
    registry::{CommandEntry, CommandRegistry},
};
use crate::utils::build_info;

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for entry in [
        CommandEntry::new("help", "Show available commands", "help [COMMAND]", cmd_help),
        CommandEntry::new(
            "version",
            "Show build information",
            "version [--format json]",
            cmd_version,
        ),
        CommandEntry::new(
            "sweep",
            "Execute every due template for all owners",
            "sweep [YYYY-MM-DD] [--format json]",
            cmd_sweep,
        ),
        CommandEntry::new(
            "templates",
            "List an owner's templates by next due date",
            "templates <OWNER> [--active true]",
            cmd_templates,
        ),
        CommandEntry::new(
            "show",
            "Show one template",
            "show <OWNER> <TEMPLATE>",
            cmd_show,
        ),
        CommandEntry::new(
            "add-account",
            "Create an account",
            "add-account <OWNER> <NAME> [OPENING_BALANCE]",
            cmd_add_account,
        ),
        CommandEntry::new(
            "add-category",
            "Create a category",
            "add-category <OWNER> <NAME> <INCOME|EXPENSE>",
            cmd_add_category,
        ),
        CommandEntry::new(
            "accounts",
            "List an owner's accounts and balances",
            "accounts <OWNER>",
            cmd_accounts,
        ),
        CommandEntry::new(
            "add-template",
            "Create a recurring template",
            "add-template <OWNER> <ACCOUNT> <CATEGORY> <AMOUNT> <INCOME|EXPENSE> <PERIOD> <START> <DESCRIPTION> [--end DATE] [--notes TEXT]",
            cmd_add_template,
        ),
        CommandEntry::new(
            "update",
            "Replace a template's fields",
            "update <OWNER> <TEMPLATE> <ACCOUNT> <CATEGORY> <AMOUNT> <INCOME|EXPENSE> <PERIOD> <START> <DESCRIPTION> [--end DATE] [--notes TEXT]",
            cmd_update,
        ),
        CommandEntry::new(
            "execute",
            "Execute a template now",
            "execute <OWNER> <TEMPLATE>",
            cmd_execute,
        ),
        CommandEntry::new(
            "toggle",
            "Activate or pause a template",
            "toggle <OWNER> <TEMPLATE>",
            cmd_toggle,
        ),
        CommandEntry::new(
            "delete",
            "Delete a template, keeping its transactions",
            "delete <OWNER> <TEMPLATE>",
            cmd_delete,
        ),
        CommandEntry::new(
            "history",
            "List transactions generated by a template",
            "history <OWNER> <TEMPLATE>",
            cmd_history,
        ),
        CommandEntry::new("backup", "Write a ledger backup", "backup [NOTE]", cmd_backup),
        CommandEntry::new("backups", "List ledger backups", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Restore the ledger from a backup",
            "restore <BACKUP>",
            cmd_restore,
        ),
    ] {
        registry.register(entry);
    }
    registry
}

fn cmd_help(context: &mut CliContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let entry = context
            .registry
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
        output::line(format!("{}\n  {}", entry.usage, entry.description));
        return Ok(());
    }
    output::section("Commands");
    for entry in context.registry.list() {
        output::line(format!("  {:<14} {}", entry.name, entry.description));
    }
    output::line("  exit           Leave script mode");
    Ok(())
}

fn cmd_version(_context: &mut CliContext, args: &[&str]) -> CommandResult {
    let build = build_info::current();
    if wants_json(&ParsedArgs::parse(args)?)? {
        output::line(serde_json::to_string_pretty(&build)?);
        return Ok(());
    }
    output::line(format!("recurring_core_cli {}", build.short()));
    output::line(format!("built {} for {} ({})", build.timestamp, build.target, build.profile));
    output::line(build.rustc);
    Ok(())
}

fn cmd_sweep(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let json = wants_json(&parsed)?;
    let today = match parsed.positional.first() {
        Some(raw) => parse_date(raw)?,
        None => context.app.today(),
    };
    let report = context.app.sweep(today)?;
    if json {
        output::line(serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_templates(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("templates");
    let parsed = ParsedArgs::parse(args)?;
    let owner = parse_uuid("owner", parsed.required(0, usage)?)?;
    let active_only = matches!(parsed.option("active"), Some("true" | "yes" | "1"));
    let templates = if active_only {
        context.app.templates().list_active(owner)?
    } else {
        context.app.templates().list(owner)?
    };
    if templates.is_empty() {
        output::info("No recurring templates.");
        return Ok(());
    }
    for template in &templates {
        output::line(template_row(template));
    }
    Ok(())
}

fn cmd_show(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (owner, id) = owner_and_template(context, "show", args)?;
    let template = context.app.templates().get(id, owner)?;
    output::section(template.display_label());
    output::line(format!("id:          {}", template.id));
    output::line(format!("status:      {}", status_label(&template)));
    output::line(format!("start:       {}", template.start_date));
    output::line(format!(
        "end:         {}",
        template
            .end_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".into())
    ));
    output::line(format!("next due:    {}", template.next_due_date));
    output::line(format!("account:     {}", template.account_id));
    output::line(format!("category:    {}", template.category_id));
    if let Some(notes) = &template.notes {
        output::line(format!("notes:       {notes}"));
    }
    Ok(())
}

fn cmd_add_account(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("add-account");
    let owner = parse_uuid("owner", args.first().ok_or_else(|| CommandError::usage(usage))?)?;
    let name = args.get(1).ok_or_else(|| CommandError::usage(usage))?;
    let opening = match args.get(2) {
        Some(raw) => parse_amount(raw)?,
        None => Decimal::ZERO,
    };
    let account = context.app.add_account(owner, name, opening)?;
    output::success(format!("Account created: {}", account.id));
    Ok(())
}

fn cmd_add_category(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("add-category");
    if args.len() < 3 {
        return Err(CommandError::usage(usage));
    }
    let owner = parse_uuid("owner", args[0])?;
    let kind = parse_flow(args[2])?;
    let category = context.app.add_category(owner, args[1], kind)?;
    output::success(format!("Category created: {}", category.id));
    Ok(())
}

fn cmd_accounts(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("accounts");
    let owner = parse_uuid("owner", args.first().ok_or_else(|| CommandError::usage(usage))?)?;
    let accounts = context.app.accounts(owner)?;
    if accounts.is_empty() {
        output::info("No accounts.");
    }
    for account in accounts {
        output::line(format!("{}  {:<20} {}", account.id, account.name, account.balance));
    }
    Ok(())
}

fn cmd_add_template(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("add-template");
    let parsed = ParsedArgs::parse(args)?;
    let owner = parse_uuid("owner", parsed.required(0, usage)?)?;
    let request = template_request(&parsed, 1, usage)?;
    let template = context.app.templates().create(owner, request)?;
    output::success(format!(
        "Template created (next due {}): {}",
        template.next_due_date, template.id
    ));
    Ok(())
}

fn cmd_update(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("update");
    let parsed = ParsedArgs::parse(args)?;
    let owner = parse_uuid("owner", parsed.required(0, usage)?)?;
    let id = parse_uuid("template", parsed.required(1, usage)?)?;
    let request = template_request(&parsed, 2, usage)?;
    let template = context.app.templates().update(id, owner, request)?;
    output::success(format!(
        "Template updated (next due {}): {}",
        template.next_due_date, template.id
    ));
    Ok(())
}

fn cmd_execute(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (owner, id) = owner_and_template(context, "execute", args)?;
    let execution = context.app.templates().execute_now(id, owner)?;
    print_execution(&execution);
    Ok(())
}

fn cmd_toggle(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (owner, id) = owner_and_template(context, "toggle", args)?;
    let template = context.app.templates().toggle(id, owner)?;
    output::success(format!("Template {} is now {}", template.id, status_label(&template)));
    Ok(())
}

fn cmd_delete(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (owner, id) = owner_and_template(context, "delete", args)?;
    context.app.templates().delete(id, owner)?;
    output::success(format!("Template deleted: {id}"));
    Ok(())
}

fn cmd_history(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (owner, id) = owner_and_template(context, "history", args)?;
    let transactions = context.app.templates().history(id, owner)?;
    if transactions.is_empty() {
        output::info("No transactions yet.");
    }
    for txn in transactions {
        output::line(format!(
            "{}  {}  {:>12}  {}",
            txn.executed_on,
            txn.id,
            txn.signed_amount().to_string(),
            txn.description
        ));
    }
    Ok(())
}

fn cmd_backup(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let backup = context.app.backup(note.as_deref())?;
    output::success(format!("Backup written: {}", backup.id));
    Ok(())
}

fn cmd_backups(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let backups = context.app.list_backups()?;
    if backups.is_empty() {
        output::info("No backups.");
    }
    for backup in backups {
        output::line(backup.id);
    }
    Ok(())
}

fn cmd_restore(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let usage = context.usage_of("restore");
    let id = args.first().ok_or_else(|| CommandError::usage(usage))?;
    context.app.restore_backup(id)?;
    output::success(format!("Ledger restored from {id}"));
    Ok(())
}

fn wants_json(parsed: &ParsedArgs<'_>) -> Result<bool, CommandError> {
    match parsed.option("format") {
        None | Some("text") => Ok(false),
        Some("json") => Ok(true),
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown format `{other}`, expected text or json"
        ))),
    }
}

fn owner_and_template(
    context: &CliContext,
    command: &str,
    args: &[&str],
) -> Result<(uuid::Uuid, uuid::Uuid), CommandError> {
    let usage = context.usage_of(command);
    if args.len() < 2 {
        return Err(CommandError::usage(usage));
    }
    Ok((parse_uuid("owner", args[0])?, parse_uuid("template", args[1])?))
}

/// Reads `<ACCOUNT> <CATEGORY> <AMOUNT> <FLOW> <PERIOD> <START> <DESCRIPTION>` starting at
/// positional `offset`.
fn template_request(
    parsed: &ParsedArgs<'_>,
    offset: usize,
    usage: &str,
) -> Result<TemplateRequest, CommandError> {
    let field = |index: usize| parsed.required(offset + index, usage);
    Ok(TemplateRequest {
        account_id: parse_uuid("account", field(0)?)?,
        category_id: parse_uuid("category", field(1)?)?,
        amount: parse_amount(field(2)?)?,
        flow: parse_flow(field(3)?)?,
        period: parse_period(field(4)?)?,
        start_date: parse_date(field(5)?)?,
        description: field(6)?.to_string(),
        end_date: parsed.option("end").map(parse_date).transpose()?,
        notes: parsed.option("notes").map(str::to_string),
    })
}

fn status_label(template: &RecurringTemplate) -> &'static str {
    if template.active {
        "active"
    } else {
        "inactive"
    }
}

fn template_row(template: &RecurringTemplate) -> String {
    format!(
        "{}  {:<24} {:>10} {:<7}  {:<7}  next {}  {}",
        template.id,
        template.description,
        template.amount.to_string(),
        template.flow.to_string(),
        template.period.to_string(),
        template.next_due_date,
        status_label(template)
    )
}

fn print_execution(execution: &Execution) {
    output::success(format!(
        "Executed {} for {} -> transaction {}",
        execution.template.description, execution.previous_due_date, execution.transaction.id
    ));
    output::line(format!("  account balance: {}", execution.account_balance));
    if execution.deactivated() {
        output::line("  template reached its end date and was deactivated");
    } else {
        output::line(format!("  next due: {}", execution.template.next_due_date));
    }
}

fn print_report(report: &SweepReport) {
    output::section(format!("Sweep {} ({})", report.run_date, report.policy));
    for item in &report.items {
        let template = item
            .template_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into());
        match &item.outcome {
            SweepOutcome::Executed {
                transaction_id,
                due_date,
                next_due_date,
                deactivated,
            } => {
                let next = if *deactivated {
                    "deactivated".to_string()
                } else {
                    format!("next due {next_due_date}")
                };
                output::success(format!(
                    "{template} due {due_date} -> transaction {transaction_id} ({next})"
                ));
            }
            SweepOutcome::Failed { kind, message } => {
                output::error(format!("{template} failed [{kind}]: {message}"));
            }
        }
    }
    if report.is_clean() {
        output::info(report);
    } else {
        output::warning(report);
    }
}
